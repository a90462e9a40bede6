//! Remote peer abstraction and the TCP transport

use crate::protocol::{Envelope, ProtocolError, Reply, Request};

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use thiserror::Error;

/// Error talking to the remote peer
///
/// All of these are transient from the caller's point of view: the request may be
/// retried later.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum PeerError {
    #[error("i/o error: {0}")]
    Io(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection closed by peer")]
    Closed,
    #[error("cannot resolve address {0:?}")]
    BadAddress(String),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<io::Error> for PeerError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => PeerError::Timeout,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe => PeerError::Closed,
            _ => PeerError::Io(e.to_string()),
        }
    }
}

/// Request/response channel to the match authority
pub trait Peer {
    /// Sends a single request and waits for its reply
    fn call(&mut self, request: &Request) -> Result<String, PeerError>;

    /// Attaches the user id to all the subsequent requests
    fn set_user(&mut self, user: &str);
}

impl<P: Peer + ?Sized> Peer for &mut P {
    fn call(&mut self, request: &Request) -> Result<String, PeerError> {
        (**self).call(request)
    }

    fn set_user(&mut self, user: &str) {
        (**self).set_user(user)
    }
}

impl<P: Peer + ?Sized> Peer for Box<P> {
    fn call(&mut self, request: &Request) -> Result<String, PeerError> {
        (**self).call(request)
    }

    fn set_user(&mut self, user: &str) {
        (**self).set_user(user)
    }
}

/// Peer over TCP
///
/// Each request opens a fresh connection, writes one JSON envelope followed by a newline
/// and reads one JSON reply line back.
#[derive(Debug, Clone)]
pub struct TcpPeer {
    addr: String,
    timeout: Duration,
    user: Option<String>,
}

impl TcpPeer {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> TcpPeer {
        TcpPeer {
            addr: addr.into(),
            timeout,
            user: None,
        }
    }

    #[inline]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn resolve(&self) -> Result<SocketAddr, PeerError> {
        self.addr
            .to_socket_addrs()
            .map_err(|_| PeerError::BadAddress(self.addr.clone()))?
            .next()
            .ok_or_else(|| PeerError::BadAddress(self.addr.clone()))
    }
}

impl Peer for TcpPeer {
    fn call(&mut self, request: &Request) -> Result<String, PeerError> {
        let addr = self.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut line = Envelope::new(request, self.user.as_deref()).to_json()?;
        line.push('\n');
        (&stream).write_all(line.as_bytes())?;
        (&stream).flush()?;

        let mut reader = BufReader::new(&stream);
        let mut reply = String::new();
        if reader.read_line(&mut reply)? == 0 {
            return Err(PeerError::Closed);
        }
        let reply = Reply::from_json(reply.trim_end())?;
        debug!("{} -> {:?}", request, reply.response);
        Ok(reply.response)
    }

    fn set_user(&mut self, user: &str) {
        self.user = Some(user.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors() {
        let e = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert_eq!(PeerError::from(e), PeerError::Timeout);
        let e = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(PeerError::from(e), PeerError::Closed);
        let e = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(PeerError::from(e), PeerError::Io(_)));
    }

    #[test]
    fn test_bad_address() {
        let mut peer = TcpPeer::new("not an address", Duration::from_millis(10));
        assert_eq!(
            peer.call(&Request::Status),
            Err(PeerError::BadAddress("not an address".into()))
        );
        peer.set_user("guest_1");
        assert_eq!(peer.user(), Some("guest_1"));
    }
}
