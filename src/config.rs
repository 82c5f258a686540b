/// Notifier configuration.
///
/// Mirrors what the notification source hands over: the connection scalars
/// plus the raw room and user CSVs. Loaded from a TOML file; the binary may
/// override individual fields from the command line before validating.
/// Validation is the one place this crate fails fast: a session is never
/// attempted against a config that cannot possibly deliver.
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::irc::session::SessionParams;
use crate::irc::target::{self, Target};

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration for one IRC notification endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// IRC server hostname.
    pub server: String,
    pub port: u16,
    pub nick: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Wrap the connection in TLS.
    #[serde(default)]
    pub ssl: bool,
    /// Comma-separated channels; the `#` sigil is optional.
    #[serde(default)]
    pub room: String,
    /// Comma-separated nicks to message directly.
    #[serde(default)]
    pub user: String,
    /// Send PRIVMSG to channels without JOIN/PART framing.
    #[serde(default)]
    pub without_join: bool,
    /// Wall-clock budget for one dispatch session.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Configuration problems, surfaced before any session is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("server must not be empty")]
    MissingServer,

    #[error("port must not be zero")]
    InvalidPort,

    #[error("nick must not be empty")]
    MissingNick,

    #[error("configure at least one room or user")]
    NoTargets,
}

impl NotifyConfig {
    /// Read a config file. Validation is separate so the caller can apply
    /// command-line overrides in between.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Fail fast on a config that cannot deliver anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::MissingServer);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.nick.trim().is_empty() {
            return Err(ConfigError::MissingNick);
        }
        if self.targets().is_empty() {
            return Err(ConfigError::NoTargets);
        }
        Ok(())
    }

    /// The resolved delivery targets, channels before users.
    pub fn targets(&self) -> Vec<Target> {
        target::resolve(&self.room, &self.user)
    }

    /// Connection parameters for the dispatch engine.
    pub fn session_params(&self) -> SessionParams {
        SessionParams {
            host: self.server.clone(),
            port: self.port,
            nick: self.nick.clone(),
            password: self.password.clone(),
            use_tls: self.ssl,
            skip_join: self.without_join,
            deadline: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> NotifyConfig {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn minimal_config_with_defaults() {
        let config = parse(
            r#"
            server = "irc.example.net"
            port = 6667
            nick = "bot"
            room = "ops"
            "#,
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.password, None);
        assert!(!config.ssl);
        assert!(!config.without_join);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.targets(), vec![Target::Channel("#ops".into())]);
    }

    #[test]
    fn session_params_carry_everything_over() {
        let config = parse(
            r#"
            server = "irc.example.net"
            port = 6697
            nick = "bot"
            password = "sekrit"
            ssl = true
            room = "ops"
            without_join = true
            timeout_secs = 5
            "#,
        );
        let params = config.session_params();
        assert_eq!(params.host, "irc.example.net");
        assert_eq!(params.port, 6697);
        assert_eq!(params.nick, "bot");
        assert_eq!(params.password.as_deref(), Some("sekrit"));
        assert!(params.use_tls);
        assert!(params.skip_join);
        assert_eq!(params.deadline, Duration::from_secs(5));
    }

    #[test]
    fn user_only_config_is_valid() {
        let config = parse(
            r#"
            server = "irc.example.net"
            port = 6667
            nick = "bot"
            user = "carol, dave"
            "#,
        );
        assert!(config.validate().is_ok());
        assert_eq!(
            config.targets(),
            vec![Target::User("carol".into()), Target::User("dave".into())]
        );
    }

    #[test]
    fn rejects_missing_targets() {
        let config = parse(
            r#"
            server = "irc.example.net"
            port = 6667
            nick = "bot"
            "#,
        );
        assert!(matches!(config.validate(), Err(ConfigError::NoTargets)));
    }

    #[test]
    fn rejects_blank_server_and_nick() {
        let mut config = parse(
            r#"
            server = " "
            port = 6667
            nick = "bot"
            room = "ops"
            "#,
        );
        assert!(matches!(config.validate(), Err(ConfigError::MissingServer)));

        config.server = "irc.example.net".into();
        config.nick = "".into();
        assert!(matches!(config.validate(), Err(ConfigError::MissingNick)));
    }

    #[test]
    fn rejects_zero_port() {
        let config = parse(
            r#"
            server = "irc.example.net"
            port = 0
            nick = "bot"
            room = "ops"
            "#,
        );
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort)));
    }
}
