//! 请求/响应重传引擎
//!
//! 每次请求：
//! 1. 清空接收队列中的陈旧数据报
//! 2. 发送请求
//! 3. 在超时内等待 indicator 匹配的响应，不匹配或无法解析的数据报直接丢弃
//! 4. 超时则原样重发，直到达到最大尝试次数

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};
use trossen_protocol::{MAX_RETRANSMISSION_ATTEMPTS, Request, Response, TIMEOUT};

use crate::udp::MAX_DATAGRAM_SIZE;
use crate::{Transport, TransportError};

/// 单次请求最多丢弃的陈旧数据报数量
const MAX_DRAIN: usize = 1024;

/// 累计统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// 已完成的请求数
    pub requests: u64,
    /// 重传次数（不含首次发送）
    pub retransmissions: u64,
    /// 丢弃的数据报数（陈旧 / 不匹配 / 无法解析）
    pub discarded: u64,
    /// 重传耗尽的请求数
    pub exhausted: u64,
}

/// 带有界重传的请求客户端
pub struct RequestClient<T> {
    transport: T,
    timeout: Duration,
    max_attempts: u32,
    rx_buf: Vec<u8>,
    stats: ClientStats,
}

impl<T: Transport> RequestClient<T> {
    /// 使用默认超时（1 ms）和最大尝试次数（100）
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, TIMEOUT, MAX_RETRANSMISSION_ATTEMPTS)
    }

    /// `max_attempts` 至少为 1
    pub fn with_policy(transport: T, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            transport,
            timeout,
            max_attempts: max_attempts.max(1),
            rx_buf: vec![0u8; MAX_DATAGRAM_SIZE],
            stats: ClientStats::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// 发送请求并等待匹配的响应
    pub fn request(&mut self, request: &Request) -> Result<Response, TransportError> {
        let indicator = request.indicator();
        let datagram = request.encode();
        self.drain()?;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                self.stats.retransmissions += 1;
                trace!("Retransmitting {:?} (attempt {})", indicator, attempt);
            }
            self.transport.send(&datagram)?;

            if let Some(response) = self.await_response(request)? {
                self.stats.requests += 1;
                if attempt > 1 {
                    debug!("{:?} answered after {} attempts", indicator, attempt);
                }
                return Ok(response);
            }
        }

        self.stats.exhausted += 1;
        warn!(
            "No response to {:?} after {} attempts ({:?} each)",
            indicator, self.max_attempts, self.timeout
        );
        Err(TransportError::RetriesExhausted {
            indicator,
            attempts: self.max_attempts,
        })
    }

    /// 在一个超时窗口内等待匹配的响应，超时返回 `Ok(None)`
    fn await_response(&mut self, request: &Request) -> Result<Option<Response>, TransportError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let len = match self.transport.receive_timeout(&mut self.rx_buf, remaining) {
                Ok(len) => len,
                Err(TransportError::Timeout) => return Ok(None),
                Err(e) => return Err(e),
            };
            match Response::parse(&self.rx_buf[..len]) {
                Ok(response) if response.indicator == request.indicator() => {
                    return Ok(Some(response));
                }
                Ok(response) => {
                    self.stats.discarded += 1;
                    trace!(
                        "Discarding response {:?} while waiting for {:?}",
                        response.indicator,
                        request.indicator()
                    );
                }
                Err(e) => {
                    self.stats.discarded += 1;
                    debug!("Discarding malformed datagram ({} bytes): {}", len, e);
                }
            }
        }
    }

    /// 丢弃接收队列中已有的数据报（上一次请求的迟到响应等）
    fn drain(&mut self) -> Result<(), TransportError> {
        for _ in 0..MAX_DRAIN {
            match self.transport.try_receive(&mut self.rx_buf)? {
                Some(len) => {
                    self.stats.discarded += 1;
                    trace!("Drained stale datagram ({} bytes)", len);
                }
                None => return Ok(()),
            }
        }
        Ok(())
    }
}
