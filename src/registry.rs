//! Registry actor implementation
//!
//! The central actor that owns all shared state: the live-session set and
//! the default-username counter. Uses the Actor pattern with mpsc
//! channels for message passing, so every mutation and every
//! consistency-sensitive read (the user-list snapshot, the whisper
//! target lookup, the rename in-use check) is serialized through one
//! task. No locks: correctness comes from single-writer access.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::message::{RoutedMessage, Scope};
use crate::router;
use crate::session::Session;
use crate::types::SessionId;

/// Commands sent from connection handlers to the registry actor
#[derive(Debug)]
pub enum RegistryCommand {
    /// New connection accepted; `sender` feeds its write task
    Join {
        id: SessionId,
        sender: mpsc::Sender<String>,
    },
    /// Connection finished (/bye, EOF, or read error)
    Leave { id: SessionId },
    /// `/username <new>` request (argument already stripped)
    Rename { id: SessionId, requested: String },
    /// `/list` request
    List { id: SessionId },
    /// `/help` request
    Help { id: SessionId },
    /// Whisper to one named user
    Whisper {
        id: SessionId,
        target: String,
        body: String,
    },
    /// Plain chat line
    Chat { id: SessionId, text: String },
    /// Unknown command or malformed whisper; carries the offending line
    Unrecognised { id: SessionId, line: String },
}

/// Why a rename was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameError {
    /// Another live session already holds the requested name
    UsernameTaken,
    /// Empty, or begins with the command-prefix symbol
    InvalidUsername,
}

/// The registry actor
///
/// Sole owner and sole mutator of the live-session set. Every handler
/// runs to completion on the actor task before the next command is
/// taken, so interleavings like "check name free / install rename"
/// cannot race.
pub struct Registry {
    /// All live sessions: SessionId -> Session
    sessions: HashMap<SessionId, Session>,
    /// Count of sessions ever joined; default usernames are unique by
    /// construction because this only grows
    join_counter: u64,
    config: Arc<Config>,
    /// Banner text served on join and via /help
    welcome: String,
    /// Command receiver channel
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl Registry {
    /// Create a new registry with the given command receiver
    pub fn new(
        config: Arc<Config>,
        welcome: String,
        receiver: mpsc::Receiver<RegistryCommand>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            join_counter: 0,
            config,
            welcome,
            receiver,
        }
    }

    /// Run the registry event loop
    ///
    /// Continuously receives and processes commands until all senders
    /// are dropped.
    pub async fn run(mut self) {
        info!("Registry started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Registry shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Join { id, sender } => self.handle_join(id, sender),
            RegistryCommand::Leave { id } => self.handle_leave(id),
            RegistryCommand::Rename { id, requested } => self.handle_rename(id, requested),
            RegistryCommand::List { id } => self.handle_list(id),
            RegistryCommand::Help { id } => self.handle_help(id),
            RegistryCommand::Whisper { id, target, body } => self.handle_whisper(id, target, body),
            RegistryCommand::Chat { id, text } => self.handle_chat(id, text),
            RegistryCommand::Unrecognised { id, line } => self.handle_unrecognised(id, line),
        }
    }

    /// Install a new session under the next default username
    ///
    /// Always succeeds. The join announcement is `All`-scope, so the
    /// joiner sees its own arrival (and learns its assigned name).
    fn handle_join(&mut self, id: SessionId, sender: mpsc::Sender<String>) {
        self.join_counter += 1;
        let username = format!("{}{}", self.config.default_username_prefix, self.join_counter);
        info!("Session {} joined as '{}'", id, username);

        let session = Session::new(id, username.clone(), sender);
        // Greet before announcing, so the banner is the first line seen
        session.send_line(format!(
            "{}{}",
            self.config.info_notice(&self.welcome),
            self.config.line_terminator
        ));
        self.sessions.insert(id, session);

        let notice = self.config.connected_notice(&username);
        self.broadcast(RoutedMessage::new(username, Scope::All, notice));
        debug!("Total sessions: {}", self.sessions.len());
    }

    /// Remove a session and announce the departure
    ///
    /// Idempotent: an id already absent is a no-op and must not
    /// double-broadcast. Dropping the session closes its outbound
    /// channel, which ends the write task and closes the socket. The
    /// announcement goes out after removal, so the leaver never
    /// receives it and its username is free for reuse immediately.
    fn handle_leave(&mut self, id: SessionId) {
        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        info!("Session {} left as '{}'", id, session.username);

        let notice = self.config.disconnected_notice(&session.username);
        let username = session.username.clone();
        drop(session);

        self.broadcast(RoutedMessage::new(username, Scope::All, notice));
        debug!("Total sessions: {}", self.sessions.len());
    }

    /// Validate and apply a rename, announcing the outcome
    ///
    /// Success is announced to everyone; failure only to the sender,
    /// whose username stays unchanged.
    fn handle_rename(&mut self, id: SessionId, requested: String) {
        let Some(old) = self.username_of(id) else {
            return;
        };

        match self.try_rename(id, &requested) {
            Ok(()) => {
                info!("Session {} renamed '{}' -> '{}'", id, old, requested);
                let notice = self.config.rename_notice(&old, &requested);
                self.broadcast(RoutedMessage::new(requested, Scope::All, notice));
            }
            Err(reason) => {
                debug!(
                    "Session {} rename '{}' -> '{}' refused: {:?}",
                    id, old, requested, reason
                );
                let notice = self.config.rename_failed_notice(&old, &requested);
                self.broadcast(RoutedMessage::new(old, Scope::SenderOnly, notice));
            }
        }
    }

    /// Policy check + atomic username swap
    ///
    /// Runs entirely on the actor task, so "is this name free" and
    /// "install the rename" cannot interleave with another mutation.
    fn try_rename(&mut self, id: SessionId, requested: &str) -> Result<(), RenameError> {
        if requested.is_empty() || requested.starts_with(&self.config.command_prefix) {
            return Err(RenameError::InvalidUsername);
        }
        let taken = self
            .sessions
            .values()
            .any(|s| s.id != id && s.username == requested);
        if taken {
            return Err(RenameError::UsernameTaken);
        }
        if let Some(session) = self.sessions.get_mut(&id) {
            session.username = requested.to_string();
        }
        Ok(())
    }

    /// Send the sorted user list back to the requester
    fn handle_list(&mut self, id: SessionId) {
        let Some(username) = self.username_of(id) else {
            return;
        };
        let listing = format_user_list(&self.snapshot());
        let notice = self.config.info_notice(&listing);
        self.broadcast(RoutedMessage::new(username, Scope::SenderOnly, notice));
    }

    /// Send the welcome banner back to the requester
    fn handle_help(&mut self, id: SessionId) {
        let Some(username) = self.username_of(id) else {
            return;
        };
        let notice = self.config.info_notice(&self.welcome);
        self.broadcast(RoutedMessage::new(username, Scope::SenderOnly, notice));
    }

    /// Route a whisper to its target, or a failure notice to the sender
    fn handle_whisper(&mut self, id: SessionId, target: String, body: String) {
        let Some(sender) = self.username_of(id) else {
            return;
        };
        if self.lookup(&target) {
            let notice = self.config.whisper_notice(&sender, &body);
            self.broadcast(RoutedMessage::new(
                sender,
                Scope::Targeted { target },
                notice,
            ));
        } else {
            let notice = self.config.whisper_failed_notice(&target);
            self.broadcast(RoutedMessage::new(sender, Scope::SenderOnly, notice));
        }
    }

    /// Relay a plain chat line to everyone but the sender
    fn handle_chat(&mut self, id: SessionId, text: String) {
        let Some(username) = self.username_of(id) else {
            return;
        };
        let notice = self.config.chat_notice(&username, &text);
        self.broadcast(RoutedMessage::new(username, Scope::AllExceptSender, notice));
    }

    /// Echo an unknown command back to its sender
    fn handle_unrecognised(&mut self, id: SessionId, line: String) {
        let Some(username) = self.username_of(id) else {
            return;
        };
        let notice = self.config.unrecognised_notice(&username, &line);
        self.broadcast(RoutedMessage::new(username, Scope::SenderOnly, notice));
    }

    /// Deliver one message against the current session set
    ///
    /// The set cannot change while this runs, so the recipient subset is
    /// computed from a single consistent instant.
    fn broadcast(&self, msg: RoutedMessage) {
        router::deliver(&self.sessions, &msg, &self.config.line_terminator);
        debug!("Routed {:?} message: {}", msg.scope, msg.body);
    }

    /// Current username of a session, if it is still live
    fn username_of(&self, id: SessionId) -> Option<String> {
        self.sessions.get(&id).map(|s| s.username.clone())
    }

    /// True iff some live session currently holds exactly `username`
    fn lookup(&self, username: &str) -> bool {
        self.sessions.values().any(|s| s.username == username)
    }

    /// Sorted copy of all live usernames at one consistent instant
    fn snapshot(&self) -> Vec<String> {
        let mut usernames: Vec<String> =
            self.sessions.values().map(|s| s.username.clone()).collect();
        usernames.sort();
        usernames
    }
}

/// Format a sorted username list as `UserList:{a, b, c} Total:[N]`
fn format_user_list(usernames: &[String]) -> String {
    format!(
        "UserList:{{{}}} Total:[{}]",
        usernames.join(", "),
        usernames.len()
    )
}
