/// Connection transport: one TCP (optionally TLS) stream framed into IRC
/// messages, bounded by a single absolute deadline.
///
/// The deadline is armed once, when the connection is opened, and shared by
/// the connect itself and every subsequent read. It is never reset, so a
/// slow or silent server cannot hold a session open past its budget while
/// normal multi-round-trip negotiation still fits comfortably inside it.
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tokio_rustls::rustls;
use tokio_rustls::TlsConnector;
use tokio_stream::StreamExt;
use tokio_util::codec::Framed;
use tracing::debug;

use super::codec::IrcCodec;
use super::message::Message;
use super::DispatchError;

/// The underlying byte stream, plain or TLS-wrapped.
enum IrcStream {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncRead for IrcStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for IrcStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// One IRC connection plus the session deadline.
///
/// `close` is idempotent; after it, `send` and `read` report
/// [`DispatchError::Closed`].
pub struct Transport {
    framed: Option<Framed<IrcStream, IrcCodec>>,
    deadline: Instant,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("open", &self.framed.is_some())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Transport {
    /// Open a connection to `host:port`, arming the session deadline.
    ///
    /// TLS wrapping uses the webpki root set with default certificate
    /// checking; the engine encrypts if asked and adds no policy of its own.
    pub async fn connect(
        host: &str,
        port: u16,
        use_tls: bool,
        budget: Duration,
    ) -> Result<Self, DispatchError> {
        let deadline = Instant::now() + budget;
        let addr = format!("{host}:{port}");

        let tcp = timeout_at(deadline, TcpStream::connect(&addr))
            .await
            .map_err(|_| DispatchError::Timeout)?
            .map_err(DispatchError::Connect)?;

        let stream = if use_tls {
            let roots = rustls::RootCertStore::from_iter(
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
            );
            let config = rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            let connector = TlsConnector::from(Arc::new(config));
            let server_name = rustls::pki_types::ServerName::try_from(host.to_owned())
                .map_err(|e| {
                    DispatchError::Tls(io::Error::new(io::ErrorKind::InvalidInput, e))
                })?;
            let tls = timeout_at(deadline, connector.connect(server_name, tcp))
                .await
                .map_err(|_| DispatchError::Timeout)?
                .map_err(DispatchError::Tls)?;
            IrcStream::Tls(Box::new(tls))
        } else {
            IrcStream::Plain(tcp)
        };

        debug!(addr, tls = use_tls, "transport connected");
        Ok(Self {
            framed: Some(Framed::new(stream, IrcCodec)),
            deadline,
        })
    }

    /// Write one message, CR-LF terminated, flushing to the socket.
    pub async fn send(&mut self, message: Message) -> Result<(), DispatchError> {
        let framed = self.framed.as_mut().ok_or(DispatchError::Closed)?;
        framed.send(message).await.map_err(DispatchError::Write)
    }

    /// Read the next inbound message, bounded by the session deadline.
    pub async fn read(&mut self) -> Result<Message, DispatchError> {
        let deadline = self.deadline;
        let framed = self.framed.as_mut().ok_or(DispatchError::Closed)?;
        match timeout_at(deadline, framed.next()).await {
            Err(_) => Err(DispatchError::Timeout),
            Ok(None) => Err(DispatchError::Closed),
            Ok(Some(Err(err))) => Err(DispatchError::Read(err)),
            Ok(Some(Ok(msg))) => Ok(msg),
        }
    }

    /// Discard inbound data until EOF, a read error, or the deadline.
    ///
    /// Best-effort flush after QUIT so the peer observes a clean disconnect.
    pub async fn drain(&mut self) {
        let deadline = self.deadline;
        let Some(framed) = self.framed.as_mut() else {
            return;
        };
        while let Ok(Some(Ok(_))) = timeout_at(deadline, framed.next()).await {}
    }

    /// Shut the stream down. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut framed) = self.framed.take() {
            if let Err(err) = framed.get_mut().shutdown().await {
                debug!(%err, "shutdown after session");
            }
        }
    }
}
