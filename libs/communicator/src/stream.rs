//! A stream that might or might not be wrapped in TLS, so the rest of the
//! connection-handling code doesn't need to care which.

use rustls::pki_types::CertificateDer;
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    net::TcpStream,
};

/// Either a plain TCP stream or one wrapped in a TLS session.
pub enum MaybeTlsStream {
    /// No TLS.
    Plain(TcpStream),
    /// This side dialed out and is the TLS client.
    TlsClient(Box<tokio_rustls::client::TlsStream<TcpStream>>),
    /// This side accepted and is the TLS server.
    TlsServer(Box<tokio_rustls::server::TlsStream<TcpStream>>),
}

impl MaybeTlsStream {
    /// The peer's leaf certificate, if this is a TLS session that has
    /// completed its handshake. `None` for a plain connection.
    pub fn peer_leaf_certificate(&self) -> Option<CertificateDer<'static>> {
        let certs = match self {
            MaybeTlsStream::Plain(_) => return None,
            MaybeTlsStream::TlsClient(stream) => stream.get_ref().1.peer_certificates(),
            MaybeTlsStream::TlsServer(stream) => stream.get_ref().1.peer_certificates(),
        };
        certs.and_then(|certs| certs.first().cloned())
    }
}

impl AsyncRead for MaybeTlsStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            MaybeTlsStream::TlsClient(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
            MaybeTlsStream::TlsServer(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTlsStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            MaybeTlsStream::TlsClient(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
            MaybeTlsStream::TlsServer(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_flush(cx),
            MaybeTlsStream::TlsClient(s) => Pin::new(s.as_mut()).poll_flush(cx),
            MaybeTlsStream::TlsServer(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            MaybeTlsStream::TlsClient(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
            MaybeTlsStream::TlsServer(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
