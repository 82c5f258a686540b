/// IRC client protocol engine: wire model, line codec, transport with a
/// session-wide deadline, target resolution, and the dispatch state machine.
use std::io;

pub mod codec;
pub mod message;
pub mod session;
pub mod target;
pub mod transport;

use codec::CodecError;

/// Everything that can go wrong inside one dispatch session.
///
/// None of these reach the caller of [`session::dispatch`]; they exist so
/// the internals stay testable and the logs stay precise.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("connection failed: {0}")]
    Connect(#[source] io::Error),

    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),

    #[error("session deadline exceeded")]
    Timeout,

    #[error("write failed: {0}")]
    Write(#[source] CodecError),

    #[error("read failed: {0}")]
    Read(#[source] CodecError),

    #[error("connection closed")]
    Closed,
}
