//! Command interpreter
//!
//! Classifies one incoming line as a server command, a whisper, or plain
//! chat. Stateless across lines: parsing needs only the configured prefix
//! symbols, so it runs on the connection task and the registry actor only
//! ever sees already-classified commands.

use crate::config::Config;

/// Result of classifying one incoming line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/bye` - terminate the session
    Bye,
    /// `/list` - request the sorted user list
    List,
    /// `/help` - request the welcome banner
    Help,
    /// `/username <new>` - request a rename (argument already stripped)
    Rename(String),
    /// `<whisper-prefix><target> <body>` - private message
    Whisper { target: String, body: String },
    /// Command-prefixed line with an unknown token or a malformed whisper
    Unrecognised(String),
    /// Anything else - plain chat text
    Chat(String),
}

impl Command {
    /// Classify a raw incoming line
    ///
    /// Strips the configured CR/LF strings first; dispatch then follows
    /// the prefix symbols: command prefix, whisper prefix, plain chat.
    pub fn parse(raw: &str, config: &Config) -> Self {
        let line = config.strip_terminators(raw);

        if let Some(rest) = line.strip_prefix(&config.command_prefix) {
            let mut tokens = rest.split_whitespace();
            return match tokens.next() {
                Some("bye") => Command::Bye,
                Some("list") => Command::List,
                Some("help") => Command::Help,
                Some("username") => {
                    // Requested names may not carry the default prefix,
                    // so a rename can never shadow a generated username.
                    let requested = tokens
                        .next()
                        .unwrap_or_default()
                        .replace(&config.default_username_prefix, "");
                    Command::Rename(requested)
                }
                _ => Command::Unrecognised(line),
            };
        }

        if line.starts_with(&config.whisper_prefix) {
            // Shape check: a space past the prefix (non-empty target) and
            // at least two characters after it. The body may be empty;
            // an empty whisper still routes through target lookup.
            let prefix_len = config.whisper_prefix.len();
            if let Some(space) = line.find(' ') {
                if space > prefix_len && line.len() > prefix_len + 2 {
                    return Command::Whisper {
                        target: line[prefix_len..space].to_string(),
                        body: line[space + 1..].to_string(),
                    };
                }
            }
            return Command::Unrecognised(line);
        }

        Command::Chat(line)
    }
}
