//! Connection session handler
//!
//! The thin shell around the core: one task per accepted connection
//! reads newline-terminated lines, classifies each through the command
//! interpreter, and forwards registry commands. A separate write task
//! drains the session's outbound channel into the socket, so delivery
//! to this client never runs on the registry task.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::command::Command;
use crate::config::Config;
use crate::error::AppError;
use crate::registry::RegistryCommand;
use crate::types::SessionId;

/// Outbound line buffer per connection; once full, further lines are
/// dropped (best-effort delivery to slow readers)
const OUTBOUND_BUFFER_SIZE: usize = 64;

/// Handle a new TCP connection
///
/// Registers the session, runs the read loop until `/bye`, end of
/// stream, or a read error, then deregisters. The registry owns the
/// only sender for the outbound channel, so leaving ends the write
/// task and closes the socket.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<RegistryCommand>,
    config: Arc<Config>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let id = SessionId::new();
    info!("Session {} connected from {}", id, peer_addr);

    let (read_half, write_half) = stream.into_split();

    // Channel for registry -> connection lines
    let (line_tx, mut line_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER_SIZE);

    // Spawn write task (outbound lines -> socket)
    tokio::spawn(async move {
        let mut writer = write_half;
        while let Some(line) = line_rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                debug!("Socket write failed, ending write task");
                break;
            }
        }
        let _ = writer.shutdown().await;
        debug!("Write task ended");
    });

    // Register with the registry
    if cmd_tx
        .send(RegistryCommand::Join { id, sender: line_tx })
        .await
        .is_err()
    {
        error!("Failed to register session {} - registry closed", id);
        return Err(AppError::ChannelSend);
    }

    // Read loop (socket lines -> RegistryCommand)
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(cmd) = command_to_registry(id, Command::parse(&line, &config)) else {
                    debug!("Session {} said bye", id);
                    break;
                };
                if cmd_tx.send(cmd).await.is_err() {
                    debug!("Registry closed, ending read loop for {}", id);
                    break;
                }
            }
            Ok(None) => {
                debug!("Session {} reached end of stream", id);
                break;
            }
            Err(e) => {
                debug!("Read error for {}: {}", id, e);
                break;
            }
        }
    }

    // Deregister; idempotent on the registry side
    let _ = cmd_tx.send(RegistryCommand::Leave { id }).await;

    info!("Session {} disconnected", id);

    Ok(())
}

/// Convert a parsed Command to a RegistryCommand
///
/// `Bye` maps to `None`: it terminates the read loop rather than
/// reaching the registry as a routed operation.
fn command_to_registry(id: SessionId, cmd: Command) -> Option<RegistryCommand> {
    match cmd {
        Command::Bye => None,
        Command::List => Some(RegistryCommand::List { id }),
        Command::Help => Some(RegistryCommand::Help { id }),
        Command::Rename(requested) => Some(RegistryCommand::Rename { id, requested }),
        Command::Whisper { target, body } => Some(RegistryCommand::Whisper { id, target, body }),
        Command::Unrecognised(line) => Some(RegistryCommand::Unrecognised { id, line }),
        Command::Chat(text) => Some(RegistryCommand::Chat { id, text }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::time::Duration;
    use tokio::io::{AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_bye_terminates_instead_of_routing() {
        assert!(command_to_registry(SessionId::new(), Command::Bye).is_none());
    }

    #[test]
    fn test_commands_map_to_registry_operations() {
        let id = SessionId::new();
        assert!(matches!(
            command_to_registry(id, Command::Rename("amy".to_string())),
            Some(RegistryCommand::Rename { requested, .. }) if requested == "amy"
        ));
        assert!(matches!(
            command_to_registry(
                id,
                Command::Whisper {
                    target: "bob".to_string(),
                    body: "hi".to_string(),
                }
            ),
            Some(RegistryCommand::Whisper { target, body, .. })
                if target == "bob" && body == "hi"
        ));
        assert!(matches!(
            command_to_registry(id, Command::Chat("hello".to_string())),
            Some(RegistryCommand::Chat { text, .. }) if text == "hello"
        ));
    }

    /// Spin up a real listener + registry and run two clients end to end.
    #[tokio::test]
    async fn test_two_clients_chat_over_loopback() {
        let config = Arc::new(Config::default());
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        tokio::spawn(Registry::new(config.clone(), "welcome".to_string(), cmd_rx).run());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept_config = config.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                tokio::spawn(handle_connection(
                    stream,
                    cmd_tx.clone(),
                    accept_config.clone(),
                ));
            }
        });

        let mut amy = BufReader::new(TcpStream::connect(addr).await.unwrap()).lines();
        // Banner arrives once amy is registered
        read_until(&mut amy, "welcome").await;
        read_until(&mut amy, "anonymous1 has connected").await;

        let mut bob = BufReader::new(TcpStream::connect(addr).await.unwrap()).lines();
        read_until(&mut bob, "anonymous2 has connected").await;

        bob.get_mut()
            .write_all(b"hello there\r\n")
            .await
            .unwrap();
        read_until(&mut amy, "anonymous2: hello there").await;

        // /bye frees the username and announces the departure
        bob.get_mut().write_all(b"/bye\r\n").await.unwrap();
        read_until(&mut amy, "anonymous2 has disconnected").await;
    }

    async fn read_until(
        lines: &mut tokio::io::Lines<BufReader<TcpStream>>,
        expected: &str,
    ) {
        let deadline = tokio::time::timeout(Duration::from_secs(5), async {
            while let Ok(Some(line)) = lines.next_line().await {
                if line == expected {
                    return true;
                }
            }
            false
        });
        assert!(deadline.await.unwrap_or(false), "never saw '{expected}'");
    }
}
