/// IRC message model, client-side.
///
/// Implements the RFC 2812 line format the engine needs:
///   [`:`prefix SPACE] command [SPACE params] [SPACE `:`trailing]
///
/// Middle parameters and the trailing parameter are kept apart so that
/// serialization reproduces the exact line shapes the protocol expects:
/// `NICK bot` carries no colon, `PRIVMSG #ops :it broke` always does.
/// Lines are CR-LF terminated on the wire; parsing operates on the content
/// without the terminator.
use std::fmt;

/// A single IRC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Optional source (server name or `nick!user@host`).
    pub prefix: Option<String>,
    /// The command (`PRIVMSG`, `PING`) or numeric reply (`001`, `433`).
    pub command: String,
    /// Middle parameters, none of which may contain a space.
    pub params: Vec<String>,
    /// The final `:`-prefixed parameter, which may contain spaces.
    pub trailing: Option<String>,
}

/// Errors that can occur during message parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty message")]
    Empty,
    #[error("prefix present but missing command")]
    MissingCommand,
}

impl Message {
    /// Build an outbound message with middle parameters only.
    pub fn cmd(command: impl Into<String>, params: &[&str]) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params: params.iter().map(|p| (*p).to_owned()).collect(),
            trailing: None,
        }
    }

    /// Build an outbound message whose last parameter is a trailing one.
    pub fn with_trailing(
        command: impl Into<String>,
        params: &[&str],
        trailing: impl Into<String>,
    ) -> Self {
        Self {
            trailing: Some(trailing.into()),
            ..Self::cmd(command, params)
        }
    }

    /// Parse one IRC message from a line (without the `\r\n` terminator).
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let input = input.trim_end_matches(['\r', '\n']);
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let (prefix, rest) = match input.strip_prefix(':') {
            Some(rest) => {
                // Prefix runs until the first space.
                let (prefix, rest) =
                    rest.split_once(' ').ok_or(ParseError::MissingCommand)?;
                (Some(prefix.to_owned()), rest)
            }
            None => (None, input),
        };

        // The trailing parameter starts at the first ` :` and runs to the
        // end of the line, spaces included.
        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing.to_owned())),
            None => (rest, None),
        };

        let mut words = head.split_ascii_whitespace();
        let command = words.next().ok_or(ParseError::MissingCommand)?.to_owned();
        let params = words.map(str::to_owned).collect();

        Ok(Message {
            prefix,
            command,
            params,
            trailing,
        })
    }

    /// Serialize to the IRC wire format (without the `\r\n` terminator).
    pub fn to_wire(&self) -> String {
        let mut out = String::new();

        if let Some(prefix) = &self.prefix {
            out.push(':');
            out.push_str(prefix);
            out.push(' ');
        }

        out.push_str(&self.command);

        for param in &self.params {
            out.push(' ');
            out.push_str(param);
        }

        if let Some(trailing) = &self.trailing {
            out.push_str(" :");
            out.push_str(trailing);
        }

        out
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}
