//! UDP 传输实现
//!
//! 绑定 `0.0.0.0:0`（系统分配端口）并 `connect` 到控制器，之后只接收来自
//! 控制器地址的数据报。

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::{Transport, TransportError};

/// UDP 数据报上限（IPv4 负载）
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// socket 当前的读模式，避免每次接收都重复设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    NonBlocking,
    Timeout(Duration),
}

/// 连接到控制器的 UDP socket
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
    read_mode: Option<ReadMode>,
}

impl UdpTransport {
    /// 绑定本地临时端口并连接到 `remote`
    pub fn connect(remote: SocketAddr) -> Result<Self, TransportError> {
        let local: SocketAddr = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(remote)?;
        info!(
            "UDP transport connected: {} -> {}",
            socket.local_addr()?,
            remote
        );
        Ok(Self {
            socket,
            remote,
            read_mode: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    fn set_read_mode(&mut self, mode: ReadMode) -> io::Result<()> {
        if self.read_mode == Some(mode) {
            return Ok(());
        }
        match mode {
            ReadMode::NonBlocking => self.socket.set_nonblocking(true)?,
            ReadMode::Timeout(timeout) => {
                self.socket.set_nonblocking(false)?;
                self.socket.set_read_timeout(Some(timeout))?;
            }
        }
        self.read_mode = Some(mode);
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        if datagram.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::DatagramTooLarge {
                size: datagram.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        // 非阻塞模式下发送缓冲区满同样视为丢包，由重传处理
        match self.socket.send(datagram) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!("UDP send would block, treating as lost datagram");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn receive_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        let mode = if timeout.is_zero() {
            ReadMode::NonBlocking
        } else {
            ReadMode::Timeout(timeout)
        };
        self.set_read_mode(mode)?;

        match self.socket.recv(buf) {
            Ok(len) => Ok(len),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Err(TransportError::Timeout)
            }
            // 对端端口不可达（ICMP）在已连接 UDP 上表现为 ConnectionRefused，
            // 与丢包等价
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                trace!("UDP peer {} unreachable", self.remote);
                Err(TransportError::Timeout)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        debug!("UDP transport to {} released", self.remote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_pair() -> (UdpTransport, UdpSocket) {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let transport = UdpTransport::connect(peer.local_addr().unwrap()).unwrap();
        (transport, peer)
    }

    #[test]
    fn test_send_and_receive_loopback() {
        let (mut transport, peer) = loopback_pair();
        transport.send(&[1, 2, 3]).unwrap();

        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[1, 2, 3]);

        peer.send_to(&[9, 8], from).unwrap();
        let len = transport
            .receive_timeout(&mut buf, Duration::from_millis(500))
            .unwrap();
        assert_eq!(&buf[..len], &[9, 8]);
    }

    #[test]
    fn test_receive_timeout() {
        let (mut transport, _peer) = loopback_pair();
        let mut buf = [0u8; 16];
        let result = transport.receive_timeout(&mut buf, Duration::from_millis(5));
        assert!(matches!(result, Err(TransportError::Timeout)));
    }

    #[test]
    fn test_try_receive_empty() {
        let (mut transport, _peer) = loopback_pair();
        let mut buf = [0u8; 16];
        assert!(transport.try_receive(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_datagram_too_large() {
        let (mut transport, _peer) = loopback_pair();
        let datagram = vec![0u8; MAX_DATAGRAM_SIZE + 1];
        assert!(matches!(
            transport.send(&datagram),
            Err(TransportError::DatagramTooLarge { .. })
        ));
    }
}
