/// Single-shot dispatch session: registration handshake, keepalive,
/// nickname-collision retry, fan-out delivery, and teardown.
///
/// The whole session runs under one absolute deadline armed when the
/// connection opens. If the server never acknowledges registration before
/// the deadline, delivery is skipped and the session still quits and closes
/// cleanly; a notification that cannot be delivered in time is dropped, not
/// retried.
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use super::message::Message;
use super::target::Target;
use super::transport::Transport;
use super::DispatchError;

/// Numeric replies accepted as the ready signal: the startup class
/// (RPL_WELCOME through RPL_MYINFO). End-of-MOTD (376) would guarantee a
/// fully completed handshake but is not sent by every server, so the
/// startup class is matched instead.
const WELCOME_NUMERICS: [&str; 4] = ["001", "002", "003", "004"];

/// ERR_NICKNAMEINUSE.
const NICK_IN_USE_NUMERIC: &str = "433";

/// Realname sent in the USER line.
const REALNAME: &str = "Sentry IRC bot";

/// Connection parameters for one dispatch session.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub host: String,
    pub port: u16,
    /// Requested nickname. The session may switch to a suffixed variant if
    /// the server reports a collision.
    pub nick: String,
    pub password: Option<String>,
    pub use_tls: bool,
    /// Deliver to channels without JOIN/PART framing.
    pub skip_join: bool,
    /// Total wall-clock budget for the session.
    pub deadline: Duration,
}

/// Protocol phases of a session, in order of traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Registering,
    JoinReady,
    Delivering,
    Quitting,
    Closed,
}

/// How a session ended. Logged by [`dispatch`]; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Registration succeeded and the notice went to this many targets.
    Delivered(usize),
    /// The deadline fired before the server acknowledged registration.
    DeadlineExpired,
}

/// Deliver `notice` to every target, best effort.
///
/// Never returns an error: IRC notification is a side channel, so connect,
/// timeout, and write failures are logged and swallowed. Configuration
/// validation happens before this point.
pub async fn dispatch(params: &SessionParams, targets: &[Target], notice: &str) {
    let mut session = match Session::open(params, targets, notice).await {
        Ok(session) => session,
        Err(err) => {
            warn!(host = %params.host, port = params.port, %err, "notification dropped");
            return;
        }
    };

    match session.run().await {
        Ok(Outcome::Delivered(count)) => {
            info!(host = %params.host, targets = count, "notification delivered");
        }
        Ok(Outcome::DeadlineExpired) => {
            warn!(host = %params.host, "server never became ready, notification dropped");
        }
        Err(err) => {
            warn!(host = %params.host, %err, "notification dropped");
        }
    }
}

/// State for one in-flight session. Owns exactly one transport connection
/// and closes it exactly once, on every exit path.
struct Session<'a> {
    transport: Transport,
    params: &'a SessionParams,
    targets: &'a [Target],
    notice: &'a str,
    /// Current nickname; reassigned on collision. Server replies are always
    /// matched against this, never the originally requested nick.
    nick: String,
    state: SessionState,
}

impl<'a> Session<'a> {
    async fn open(
        params: &'a SessionParams,
        targets: &'a [Target],
        notice: &'a str,
    ) -> Result<Session<'a>, DispatchError> {
        let transport =
            Transport::connect(&params.host, params.port, params.use_tls, params.deadline)
                .await?;
        Ok(Session {
            transport,
            params,
            targets,
            notice,
            nick: params.nick.clone(),
            state: SessionState::Connecting,
        })
    }

    /// Run the session to completion. Whatever happens inside, the tail is
    /// always the same: QUIT if the socket still accepts it, drain, close.
    async fn run(&mut self) -> Result<Outcome, DispatchError> {
        let result = self.drive().await;

        self.state = SessionState::Quitting;
        if self.transport.send(Message::cmd("QUIT", &[])).await.is_ok() {
            self.transport.drain().await;
        }

        self.transport.close().await;
        self.state = SessionState::Closed;

        result
    }

    async fn drive(&mut self) -> Result<Outcome, DispatchError> {
        self.register().await?;

        // The single deadline-aware read loop.
        while self.state == SessionState::Registering {
            match self.transport.read().await {
                Ok(msg) => self.handle_line(msg).await?,
                Err(DispatchError::Timeout) => {
                    // Ready never arrived. Not an error: skip delivery and
                    // let the teardown in `run` disconnect cleanly.
                    return Ok(Outcome::DeadlineExpired);
                }
                Err(err) => return Err(err),
            }
        }

        self.state = SessionState::Delivering;
        let delivered = self.deliver().await?;
        Ok(Outcome::Delivered(delivered))
    }

    /// Send the registration burst: PASS (if configured), USER, NICK.
    async fn register(&mut self) -> Result<(), DispatchError> {
        if let Some(password) = &self.params.password {
            self.transport
                .send(Message::cmd("PASS", &[password.as_str()]))
                .await?;
        }
        let nick = self.nick.as_str();
        let user = Message::with_trailing("USER", &[nick, nick, nick], REALNAME);
        self.transport.send(user).await?;
        self.transport.send(Message::cmd("NICK", &[nick])).await?;
        self.state = SessionState::Registering;
        Ok(())
    }

    /// React to one inbound line while registering. Unmatched lines are
    /// discarded.
    async fn handle_line(&mut self, msg: Message) -> Result<(), DispatchError> {
        if is_welcome(&msg, &self.nick) {
            debug!(nick = %self.nick, "registered");
            self.state = SessionState::JoinReady;
        } else if let Some(token) = ping_token(&msg) {
            self.transport.send(Message::cmd("PONG", &[token])).await?;
        } else if is_nick_collision(&msg, &self.nick) {
            self.nick = collision_nick(&self.nick);
            debug!(nick = %self.nick, "nickname in use, retrying");
            let retry = Message::cmd("NICK", &[self.nick.as_str()]);
            self.transport.send(retry).await?;
        }
        Ok(())
    }

    /// Fan the notice out to every target, channels then users, in resolved
    /// order. A write failure aborts the remainder: a severed connection
    /// cannot deliver to anyone else.
    async fn deliver(&mut self) -> Result<usize, DispatchError> {
        let mut delivered = 0;

        for target in self.targets {
            match target {
                Target::Channel(channel) => {
                    let channel = channel.as_str();
                    if !self.params.skip_join {
                        self.transport.send(Message::cmd("JOIN", &[channel])).await?;
                    }
                    self.transport
                        .send(Message::with_trailing("PRIVMSG", &[channel], self.notice))
                        .await?;
                    if !self.params.skip_join {
                        self.transport.send(Message::cmd("PART", &[channel])).await?;
                    }
                }
                Target::User(user) => {
                    self.transport
                        .send(Message::with_trailing("PRIVMSG", &[user.as_str()], self.notice))
                        .await?;
                }
            }
            delivered += 1;
        }

        Ok(delivered)
    }
}

/// True when `msg` is a registration-success numeric addressed to `nick`.
fn is_welcome(msg: &Message, nick: &str) -> bool {
    WELCOME_NUMERICS.contains(&msg.command.as_str())
        && msg.params.first().is_some_and(|target| target == nick)
}

/// The keepalive token to echo back, if `msg` is a server PING.
fn ping_token(msg: &Message) -> Option<&str> {
    if msg.command != "PING" {
        return None;
    }
    msg.trailing
        .as_deref()
        .or_else(|| msg.params.first().map(String::as_str))
}

/// True when `msg` reports that the nickname we just requested is taken.
fn is_nick_collision(msg: &Message, nick: &str) -> bool {
    msg.command == NICK_IN_USE_NUMERIC && msg.params.iter().any(|p| p == nick)
}

/// Pick a replacement nickname after a collision. Any mutation would do;
/// the numeric suffix keeps the result recognizable in channel logs.
fn collision_nick(nick: &str) -> String {
    format!("{nick}{}", rand::thread_rng().gen_range(1000..2000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Message {
        Message::parse(line).unwrap()
    }

    // ── Welcome matching ─────────────────────────────────────────

    #[test]
    fn welcome_matches_each_startup_numeric() {
        for numeric in ["001", "002", "003", "004"] {
            let line = format!(":irc.example.net {numeric} bot :hello");
            assert!(is_welcome(&parsed(&line), "bot"), "numeric {numeric}");
        }
    }

    #[test]
    fn welcome_requires_the_current_nick() {
        let msg = parsed(":irc.example.net 001 someoneelse :Welcome");
        assert!(!is_welcome(&msg, "bot"));
    }

    #[test]
    fn welcome_matches_renamed_nick() {
        // After a collision rename, replies for the old nick must not count.
        let msg = parsed(":irc.example.net 001 bot1234 :Welcome");
        assert!(!is_welcome(&msg, "bot"));
        assert!(is_welcome(&msg, "bot1234"));
    }

    #[test]
    fn welcome_rejects_other_numerics() {
        assert!(!is_welcome(&parsed(":irc.example.net 005 bot :ISUPPORT"), "bot"));
        assert!(!is_welcome(&parsed(":irc.example.net 376 bot :End of MOTD"), "bot"));
    }

    // ── Keepalive ────────────────────────────────────────────────

    #[test]
    fn ping_token_from_trailing() {
        assert_eq!(ping_token(&parsed("PING :abc123")), Some("abc123"));
    }

    #[test]
    fn ping_token_from_middle_param() {
        assert_eq!(ping_token(&parsed("PING abc123")), Some("abc123"));
    }

    #[test]
    fn non_ping_has_no_token() {
        assert_eq!(ping_token(&parsed("NOTICE bot :hi")), None);
    }

    // ── Collision handling ───────────────────────────────────────

    #[test]
    fn collision_matches_attempted_nick() {
        let msg = parsed(":irc.example.net 433 * bot :Nickname is already in use");
        assert!(is_nick_collision(&msg, "bot"));
        assert!(!is_nick_collision(&msg, "other"));
    }

    #[test]
    fn collision_nick_appends_numeric_suffix() {
        let renamed = collision_nick("bot");
        let suffix: u32 = renamed.strip_prefix("bot").unwrap().parse().unwrap();
        assert!((1000..2000).contains(&suffix));
    }
}
