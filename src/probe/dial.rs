//! Dial capability abstraction.
//!
//! The probe engine never opens sockets directly; it goes through these
//! traits, with the real implementations backed by tokio and the test
//! implementations scripted. The method set is deliberately narrow: a TCP
//! probe only needs to connect and hang up, a UDP probe additionally needs
//! its local endpoint, one datagram out, and one datagram in.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpStream, UdpSocket};

/// Capability to open a TCP connection.
#[async_trait]
pub trait TcpDial: Send + Sync {
    /// Connection handle. Dropping it closes the connection.
    type Stream: Send;

    /// Attempt a connection to `addr`.
    async fn dial(&self, addr: SocketAddr) -> io::Result<Self::Stream>;
}

/// The surface of a connected UDP socket that a probe uses.
#[async_trait]
pub trait UdpProbeSocket: Send {
    /// Local endpoint the socket is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Send one datagram to the connected peer.
    async fn send(&self, payload: &[u8]) -> io::Result<usize>;

    /// Receive one datagram from the connected peer.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Capability to open a connected UDP socket.
#[async_trait]
pub trait UdpDial: Send + Sync {
    /// Socket handle. Dropping it releases the socket.
    type Socket: UdpProbeSocket;

    /// Open a socket directed at `addr`.
    async fn dial(&self, addr: SocketAddr) -> io::Result<Self::Socket>;
}

/// Real TCP dialer over the tokio socket API.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetTcpDial;

#[async_trait]
impl TcpDial for NetTcpDial {
    type Stream = TcpStream;

    async fn dial(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }
}

/// Real UDP dialer: bind the wildcard address, then connect to the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetUdpDial;

#[async_trait]
impl UdpDial for NetUdpDial {
    type Socket = UdpSocket;

    async fn dial(&self, addr: SocketAddr) -> io::Result<UdpSocket> {
        let local: SocketAddr = if addr.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        Ok(socket)
    }
}

#[async_trait]
impl UdpProbeSocket for UdpSocket {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }

    async fn send(&self, payload: &[u8]) -> io::Result<usize> {
        UdpSocket::send(self, payload).await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        UdpSocket::recv(self, buf).await
    }
}
