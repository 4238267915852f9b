//! Routed message definitions
//!
//! A `RoutedMessage` is created once per outgoing event, consumed by the
//! router, and discarded. The audience is a closed `Scope` enum so the
//! router's match is exhaustive and compiler-checked.

/// Audience-selection rule for an outgoing message
///
/// `SenderOnly` and `AllExceptSender` match against the message origin;
/// `Targeted` carries its own explicit target username (whisper delivery).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every live session, the origin included
    All,
    /// Only sessions whose username equals the origin (0 or 1)
    SenderOnly,
    /// Every live session except those whose username equals the origin
    AllExceptSender,
    /// Exactly the session holding the target username
    Targeted { target: String },
}

/// One outgoing event, not yet terminator-appended
#[derive(Debug, Clone)]
pub struct RoutedMessage {
    /// Username of the sender at the time the event was produced
    pub origin: String,
    /// Who receives it
    pub scope: Scope,
    /// Formatted text body
    pub body: String,
}

impl RoutedMessage {
    pub fn new(origin: impl Into<String>, scope: Scope, body: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            scope,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targeted_scope_carries_target() {
        let msg = RoutedMessage::new(
            "amy",
            Scope::Targeted {
                target: "bob".to_string(),
            },
            "amy whispers: hi",
        );
        assert_eq!(msg.origin, "amy");
        match msg.scope {
            Scope::Targeted { target } => assert_eq!(target, "bob"),
            _ => panic!("Wrong variant"),
        }
    }
}
