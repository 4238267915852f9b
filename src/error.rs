//! Error types for the chat relay
//!
//! Defines application-level errors and config-load errors.
//! Uses thiserror for ergonomic error definitions.
//!
//! Registry-policy failures (username taken, bad whisper target) are not
//! errors at this level: they are reported back to the offending sender
//! as formatted notices and never propagate.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal setup errors (bind, config) and internal channel failures.
/// Per-recipient delivery errors are swallowed at the delivery site by
/// design and never appear here.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal at startup; session-fatal inside a read loop)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file failed validation
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Channel send error (fatal - registry actor gone)
    #[error("Channel send error")]
    ChannelSend,
}

/// Configuration validation errors
///
/// Raised at load time so a bad template never reaches the routing path.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A message template is missing one of its required placeholders
    #[error("template '{template}' is missing required placeholder '{{{placeholder}}}'")]
    MissingPlaceholder {
        template: &'static str,
        placeholder: &'static str,
    },

    /// The command and whisper prefixes must differ and be non-empty
    #[error("invalid prefix configuration: {0}")]
    InvalidPrefix(String),

    /// Only TCP is supported as a transport
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),
}
