//! Best-effort IRC notification dispatch.
//!
//! One call, one connection, one deadline: the engine connects to an IRC
//! server, registers, fans a single formatted notice out to the configured
//! channels and users, and disconnects. Delivery is a side channel, so
//! transport and protocol failures are logged and swallowed rather than
//! surfaced to the caller. Only configuration problems fail fast, before a
//! connection is ever attempted.

pub mod config;
pub mod irc;
pub mod notice;

pub use config::{ConfigError, NotifyConfig};
pub use irc::session::{dispatch, SessionParams};
pub use irc::target::Target;
