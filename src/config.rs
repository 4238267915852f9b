//! Server configuration
//!
//! All user-facing text lives here as message templates with named
//! `{placeholder}` substitutions, loaded from a JSON file. Templates are
//! validated at load time: a template missing a required placeholder is a
//! startup error, so the routing path never formats against a broken
//! template.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, ConfigError};

/// Built-in welcome text, used when no banner file is configured
const DEFAULT_WELCOME: &str = "Welcome to the chat relay!\n\
    Commands: /bye /list /help /username <name>\n\
    Whisper with @<username> <message>";

/// Relay configuration
///
/// Every field has a default so the server runs without a config file.
/// Message templates use named placeholders; see the `*_notice` methods
/// for the substitutions each template supports.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// Listen port (overridable with the --port flag)
    pub port: u16,
    /// Bind address
    pub addr: String,
    /// Transport kind; only "tcp" is supported
    pub transport: String,
    /// Carriage-return string stripped from incoming lines
    pub cr: String,
    /// Line-feed string stripped from incoming lines
    pub lf: String,
    /// Terminator appended to every outgoing line
    pub line_terminator: String,
    /// Prefix for auto-generated usernames ("anonymous" -> "anonymous1")
    pub default_username_prefix: String,
    /// Leading symbol marking a line as a server command
    pub command_prefix: String,
    /// Leading symbol marking a line as a whisper
    pub whisper_prefix: String,
    /// Optional banner file sent on connect and via /help
    pub banner_path: Option<PathBuf>,

    /// Join announcement; takes {username}
    pub connected_msg: String,
    /// Leave announcement; takes {username}
    pub disconnected_msg: String,
    /// Informational reply (/list, /help); takes {text}
    pub info_msg: String,
    /// Plain chat line; takes {username} and {text}
    pub chat_msg: String,
    /// Rename announcement; takes {old} and {new}
    pub rename_msg: String,
    /// Rename failure notice; takes {old} and {new}
    pub rename_failed_msg: String,
    /// Whisper delivery; takes {username} (the sender) and {text}
    pub whisper_msg: String,
    /// Whisper failure notice; takes {target}
    pub whisper_failed_msg: String,
    /// Unknown command notice; takes {username} and {line}
    pub unrecognised_msg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 6000,
            addr: "0.0.0.0".to_string(),
            transport: "tcp".to_string(),
            cr: "\r".to_string(),
            lf: "\n".to_string(),
            line_terminator: "\r\n".to_string(),
            default_username_prefix: "anonymous".to_string(),
            command_prefix: "/".to_string(),
            whisper_prefix: "@".to_string(),
            banner_path: None,
            connected_msg: "{username} has connected".to_string(),
            disconnected_msg: "{username} has disconnected".to_string(),
            info_msg: "{text}".to_string(),
            chat_msg: "{username}: {text}".to_string(),
            rename_msg: "{old} changed their username to {new}".to_string(),
            rename_failed_msg: "{old} could not change their username to {new}".to_string(),
            whisper_msg: "{username} whispers: {text}".to_string(),
            whisper_failed_msg: "{target} is not connected".to_string(),
            unrecognised_msg: "{username}, unrecognised command: {line}".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate prefixes, transport, and template placeholders
    ///
    /// Returns the first problem found; called by `load` and by `main`
    /// for the built-in defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport != "tcp" {
            return Err(ConfigError::UnsupportedTransport(self.transport.clone()));
        }
        if self.command_prefix.is_empty() {
            return Err(ConfigError::InvalidPrefix(
                "command_prefix must not be empty".to_string(),
            ));
        }
        if self.whisper_prefix.is_empty() {
            return Err(ConfigError::InvalidPrefix(
                "whisper_prefix must not be empty".to_string(),
            ));
        }
        if self.command_prefix == self.whisper_prefix {
            return Err(ConfigError::InvalidPrefix(
                "command_prefix and whisper_prefix must differ".to_string(),
            ));
        }

        // Required placeholders per message kind
        let required: [(&'static str, &str, &[&'static str]); 9] = [
            ("connected_msg", &self.connected_msg, &["username"]),
            ("disconnected_msg", &self.disconnected_msg, &["username"]),
            ("info_msg", &self.info_msg, &["text"]),
            ("chat_msg", &self.chat_msg, &["username", "text"]),
            ("rename_msg", &self.rename_msg, &["old", "new"]),
            ("rename_failed_msg", &self.rename_failed_msg, &["old", "new"]),
            ("whisper_msg", &self.whisper_msg, &["username", "text"]),
            ("whisper_failed_msg", &self.whisper_failed_msg, &["target"]),
            ("unrecognised_msg", &self.unrecognised_msg, &["username", "line"]),
        ];
        for (name, template, placeholders) in required {
            for &placeholder in placeholders {
                if !template.contains(&format!("{{{placeholder}}}")) {
                    return Err(ConfigError::MissingPlaceholder {
                        template: name,
                        placeholder,
                    });
                }
            }
        }
        Ok(())
    }

    /// Read the welcome banner, falling back to the built-in text
    pub fn load_banner(&self) -> Result<String, AppError> {
        match &self.banner_path {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => Ok(DEFAULT_WELCOME.to_string()),
        }
    }

    /// Remove the configured CR/LF strings from an incoming line
    pub fn strip_terminators(&self, line: &str) -> String {
        line.replace(&self.cr, "").replace(&self.lf, "")
    }

    pub fn connected_notice(&self, username: &str) -> String {
        render(&self.connected_msg, &[("username", username)])
    }

    pub fn disconnected_notice(&self, username: &str) -> String {
        render(&self.disconnected_msg, &[("username", username)])
    }

    pub fn info_notice(&self, text: &str) -> String {
        render(&self.info_msg, &[("text", text)])
    }

    pub fn chat_notice(&self, username: &str, text: &str) -> String {
        render(&self.chat_msg, &[("username", username), ("text", text)])
    }

    pub fn rename_notice(&self, old: &str, new: &str) -> String {
        render(&self.rename_msg, &[("old", old), ("new", new)])
    }

    pub fn rename_failed_notice(&self, old: &str, new: &str) -> String {
        render(&self.rename_failed_msg, &[("old", old), ("new", new)])
    }

    pub fn whisper_notice(&self, sender: &str, text: &str) -> String {
        render(&self.whisper_msg, &[("username", sender), ("text", text)])
    }

    pub fn whisper_failed_notice(&self, target: &str) -> String {
        render(&self.whisper_failed_msg, &[("target", target)])
    }

    pub fn unrecognised_notice(&self, username: &str, line: &str) -> String {
        render(&self.unrecognised_msg, &[("username", username), ("line", line)])
    }
}

/// Substitute `{name}` placeholders with their values
fn render(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let config = Config {
            rename_msg: "{old} kept their name".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingPlaceholder {
                template: "rename_msg",
                placeholder: "new",
            }
        ));
    }

    #[test]
    fn test_equal_prefixes_rejected() {
        let config = Config {
            whisper_prefix: "/".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_non_tcp_transport_rejected() {
        let config = Config {
            transport: "udp".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedTransport(_))
        ));
    }

    #[test]
    fn test_notice_rendering() {
        let config = Config::default();
        assert_eq!(config.connected_notice("amy"), "amy has connected");
        assert_eq!(config.chat_notice("amy", "hello"), "amy: hello");
        assert_eq!(
            config.rename_notice("anonymous1", "amy"),
            "anonymous1 changed their username to amy"
        );
    }

    #[test]
    fn test_strip_terminators() {
        let config = Config::default();
        assert_eq!(config.strip_terminators("hello\r\n"), "hello");
        assert_eq!(config.strip_terminators("hello"), "hello");
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"port": 7000, "whisper_prefix": "!"}"#).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.whisper_prefix, "!");
        assert_eq!(config.command_prefix, "/");
        assert!(config.validate().is_ok());
    }
}
