// Listener module
// TCP listeners with address reuse, or a Unix domain socket

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use tokio::net::{TcpListener, TcpStream};

#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};

use crate::config::ListenAddr;

/// Create a `TcpListener` with `SO_REUSEPORT` and `SO_REUSEADDR` enabled.
///
/// A restarted server can bind again while the previous socket is still in
/// `TIME_WAIT`.
pub fn create_reusable_listener(addr: std::net::SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

/// A bound listener of either kind
pub enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

/// An accepted connection
pub enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Listener {
    pub fn bind(addr: &ListenAddr) -> io::Result<Self> {
        match addr {
            ListenAddr::Tcp(addr) => create_reusable_listener(*addr).map(Self::Tcp),
            #[cfg(unix)]
            ListenAddr::Unix(path) => UnixListener::bind(path).map(Self::Unix),
            #[cfg(not(unix))]
            ListenAddr::Unix(path) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("Unix sockets are not available on this platform: {path}"),
            )),
        }
    }

    /// Accept the next connection together with the peer address; Unix
    /// peers are reported as an empty string.
    pub async fn accept(&self) -> io::Result<(Stream, String)> {
        match self {
            Self::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok((Stream::Tcp(stream), peer.to_string()))
            }
            #[cfg(unix)]
            Self::Unix(listener) => {
                let (stream, _) = listener.accept().await?;
                Ok((Stream::Unix(stream), String::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_listener_accepts() {
        let listener = Listener::bind(&ListenAddr::Tcp("127.0.0.1:0".parse().unwrap())).unwrap();
        let Listener::Tcp(ref tcp) = listener else {
            panic!("expected tcp listener");
        };
        let addr = tcp.local_addr().unwrap();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (_, peer) = listener.accept().await.unwrap();
        client.await.unwrap();
        assert!(peer.starts_with("127.0.0.1:"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unix_listener_accepts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.sock");
        let path_str = path.to_string_lossy().to_string();

        let listener = Listener::bind(&ListenAddr::Unix(path_str)).unwrap();
        let client = tokio::spawn(async move { UnixStream::connect(path).await.unwrap() });
        let (_, peer) = listener.accept().await.unwrap();
        client.await.unwrap();
        assert!(peer.is_empty());
    }
}
