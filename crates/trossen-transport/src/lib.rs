//! # Trossen Transport
//!
//! 主机与控制器之间的数据报传输层。
//!
//! - [`Transport`]：数据报收发抽象（真实 UDP / 测试 Mock）
//! - [`UdpTransport`]：绑定本地临时端口并连接到控制器的 UDP socket
//! - [`RequestClient`]：请求/响应关联与有界重传
//!
//! 同一时刻只允许一个未完成请求（`&mut self`），响应通过 indicator 关联。

pub mod client;
pub mod udp;

pub use client::{ClientStats, RequestClient};
pub use udp::UdpTransport;

use std::time::Duration;

use thiserror::Error;
use trossen_protocol::{CommandIndicator, ProtocolError};

/// 传输层错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 单次接收超时（重传引擎内部使用）
    #[error("Read timeout")]
    Timeout,

    /// 所有重传均未收到匹配的响应
    #[error("No response to {indicator:?} after {attempts} attempts")]
    RetriesExhausted {
        indicator: CommandIndicator,
        attempts: u32,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Datagram too large: {size} bytes (max {max})")]
    DatagramTooLarge { size: usize, max: usize },
}

/// 数据报传输抽象
///
/// 实现者只负责收发原始数据报，不关心帧格式与重传。
pub trait Transport {
    /// 发送一个完整的数据报
    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError>;

    /// 在 `timeout` 内接收一个数据报，返回写入 `buf` 的字节数
    ///
    /// 超时返回 [`TransportError::Timeout`]。`timeout` 为 0 时不阻塞。
    fn receive_timeout(&mut self, buf: &mut [u8], timeout: Duration)
    -> Result<usize, TransportError>;

    /// 非阻塞接收，没有待读数据时返回 `Ok(None)`
    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        match self.receive_timeout(buf, Duration::ZERO) {
            Ok(len) => Ok(Some(len)),
            Err(TransportError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        (**self).send(datagram)
    }

    fn receive_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        (**self).receive_timeout(buf, timeout)
    }

    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        (**self).try_receive(buf)
    }
}
