//! Text-line Chat Relay Library
//!
//! A TCP chat relay: clients send newline-terminated commands or
//! messages, and the server routes each message to a computed audience
//! (everyone, the sender only, everyone except the sender, or one
//! targeted user) while maintaining a live directory of usernames.
//!
//! # Features
//! - Auto-assigned default usernames with live rename (`/username`)
//! - Sorted user directory (`/list`)
//! - Whispers to a single named recipient (`@name message`)
//! - Join/leave announcements
//! - Configurable prefixes, terminators, and message templates
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Registry` is the central actor owning the live-session set
//! - Each connection has a `handler` task communicating with the registry
//! - No locks needed - all state access goes through message passing
//! - Outbound writes run on per-connection write tasks, fire-and-forget
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{Config, Registry, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(Config::default());
//!     let welcome = config.load_banner().unwrap();
//!     let listener = TcpListener::bind("127.0.0.1:6000").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(Registry::new(config.clone(), welcome, cmd_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, cmd_tx.clone(), config.clone()));
//!     }
//! }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use command::Command;
pub use config::Config;
pub use error::{AppError, ConfigError};
pub use handler::handle_connection;
pub use message::{RoutedMessage, Scope};
pub use registry::{Registry, RegistryCommand, RenameError};
pub use session::Session;
pub use types::SessionId;
