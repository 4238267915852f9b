//! Scope-based message delivery
//!
//! Given the live-session set and one routed message, selects the
//! audience and queues the terminated line on each recipient's outbound
//! channel. Writes are independent and best-effort: one stalled or gone
//! recipient never delays or fails delivery to the rest.

use std::collections::HashMap;

use crate::message::{RoutedMessage, Scope};
use crate::session::Session;
use crate::types::SessionId;

/// Deliver one message to every session its scope selects
///
/// The session map is the registry's state at a single consistent
/// instant, so the recipient set can never observe a half-applied
/// mutation. Appends `terminator` to the body before queuing.
pub fn deliver(sessions: &HashMap<SessionId, Session>, msg: &RoutedMessage, terminator: &str) {
    let line = format!("{}{}", msg.body, terminator);
    for session in sessions.values() {
        let selected = match &msg.scope {
            Scope::All => true,
            Scope::SenderOnly => session.username == msg.origin,
            Scope::AllExceptSender => session.username != msg.origin,
            Scope::Targeted { target } => session.username == *target,
        };
        if selected {
            session.send_line(line.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Scope;
    use tokio::sync::mpsc;

    fn make_sessions(
        usernames: &[&str],
    ) -> (HashMap<SessionId, Session>, Vec<(String, mpsc::Receiver<String>)>) {
        let mut sessions = HashMap::new();
        let mut receivers = Vec::new();
        for username in usernames {
            let (tx, rx) = mpsc::channel(32);
            let id = SessionId::new();
            sessions.insert(id, Session::new(id, username.to_string(), tx));
            receivers.push((username.to_string(), rx));
        }
        (sessions, receivers)
    }

    fn received(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(line) = rx.try_recv() {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn test_all_scope_includes_origin() {
        let (sessions, mut receivers) = make_sessions(&["amy", "bob", "zoe"]);
        let msg = RoutedMessage::new("amy", Scope::All, "amy has connected");

        deliver(&sessions, &msg, "\r\n");

        for (_, rx) in receivers.iter_mut() {
            assert_eq!(received(rx), vec!["amy has connected\r\n".to_string()]);
        }
    }

    #[tokio::test]
    async fn test_sender_only_hits_exactly_the_origin() {
        let (sessions, mut receivers) = make_sessions(&["amy", "bob"]);
        let msg = RoutedMessage::new("amy", Scope::SenderOnly, "just for you");

        deliver(&sessions, &msg, "\r\n");

        for (username, rx) in receivers.iter_mut() {
            let lines = received(rx);
            if username == "amy" {
                assert_eq!(lines.len(), 1);
            } else {
                assert!(lines.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_all_except_sender_hits_everyone_else() {
        let (sessions, mut receivers) = make_sessions(&["amy", "bob", "zoe"]);
        let msg = RoutedMessage::new("amy", Scope::AllExceptSender, "amy: hi");

        deliver(&sessions, &msg, "\r\n");

        let mut hit = 0;
        for (username, rx) in receivers.iter_mut() {
            let lines = received(rx);
            if username == "amy" {
                assert!(lines.is_empty());
            } else {
                hit += lines.len();
            }
        }
        assert_eq!(hit, sessions.len() - 1);
    }

    #[tokio::test]
    async fn test_targeted_hits_only_the_target() {
        let (sessions, mut receivers) = make_sessions(&["amy", "bob", "zoe"]);
        let msg = RoutedMessage::new(
            "amy",
            Scope::Targeted {
                target: "bob".to_string(),
            },
            "amy whispers: hi",
        );

        deliver(&sessions, &msg, "\r\n");

        for (username, rx) in receivers.iter_mut() {
            let lines = received(rx);
            if username == "bob" {
                assert_eq!(lines, vec!["amy whispers: hi\r\n".to_string()]);
            } else {
                assert!(lines.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_gone_recipient_does_not_stop_delivery() {
        let (sessions, mut receivers) = make_sessions(&["amy", "bob", "zoe"]);
        // Simulate bob's write task being gone
        let bob_rx = receivers.remove(1).1;
        drop(bob_rx);

        let msg = RoutedMessage::new("amy", Scope::All, "still flowing");
        deliver(&sessions, &msg, "\r\n");

        for (_, rx) in receivers.iter_mut() {
            assert_eq!(received(rx).len(), 1);
        }
    }
}
