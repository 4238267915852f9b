//! Session struct definition
//!
//! Represents one connected client inside the registry: its stable
//! identity, current username, and the channel feeding its write task.

use tokio::sync::mpsc;

use crate::types::SessionId;

/// Connected session information
///
/// The registry owns one of these per live connection. The `sender` side
/// of the outbound channel is the opaque write endpoint; the matching
/// receiver is drained by the connection's write task.
#[derive(Debug)]
pub struct Session {
    /// Stable identifier for this session
    pub id: SessionId,
    /// Current username, unique among live sessions
    pub username: String,
    /// Registry → connection outbound line channel
    pub sender: mpsc::Sender<String>,
}

impl Session {
    /// Create a new session under its initial (default) username
    pub fn new(id: SessionId, username: String, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            username,
            sender,
        }
    }

    /// Queue a line for this session's write task, fire-and-forget
    ///
    /// Best-effort by design: a full or closed channel drops the line.
    /// A slow reader therefore never blocks the registry or delivery to
    /// other recipients.
    pub fn send_line(&self, line: String) {
        let _ = self.sender.try_send(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_send_line() {
        let (tx, mut rx) = mpsc::channel(32);
        let session = Session::new(SessionId::new(), "anonymous1".to_string(), tx);

        session.send_line("hello\r\n".to_string());

        assert_eq!(rx.recv().await.unwrap(), "hello\r\n");
    }

    #[tokio::test]
    async fn test_send_line_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(32);
        drop(rx);
        let session = Session::new(SessionId::new(), "anonymous1".to_string(), tx);

        // Must not panic or report the failure
        session.send_line("hello\r\n".to_string());
    }

    #[tokio::test]
    async fn test_send_line_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let session = Session::new(SessionId::new(), "anonymous1".to_string(), tx);

        session.send_line("first\r\n".to_string());
        session.send_line("second\r\n".to_string());

        assert_eq!(rx.recv().await.unwrap(), "first\r\n");
        assert!(rx.try_recv().is_err());
    }
}
