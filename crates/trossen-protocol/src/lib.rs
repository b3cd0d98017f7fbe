//! # Trossen Protocol
//!
//! 机械臂控制器 UDP 指令协议定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `ids`: 指令标识符（indicator）定义
//! - `constants`: 协议常量定义
//! - `types`: 模式、型号、错误状态等枚举，以及关节输入/输出
//! - `properties`: 质量属性、关节特性、限位、PID 等配置结构体
//! - `control`: 请求帧构建
//! - `feedback`: 响应帧解析
//! - `config`: 配置项的值编码/解码
//! - `end_effector`: 标准末端执行器参数
//!
//! ## 帧格式
//!
//! - 请求：`[indicator: u8, payload...]`
//! - 响应：`[indicator: u8, status: u8, payload...]`
//!
//! 所有多字节字段均为小端字节序，浮点数在线上为 `f32`，公开 API 使用 `f64`。

pub mod config;
pub mod constants;
pub mod control;
pub mod end_effector;
pub mod feedback;
pub mod ids;
pub mod properties;
pub mod types;

// 重新导出常用类型
pub use config::*;
pub use constants::*;
pub use control::*;
pub use end_effector::*;
pub use feedback::*;
pub use ids::*;
pub use properties::*;
pub use types::*;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::TryFromPrimitive;
use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Empty datagram")]
    EmptyDatagram,

    #[error("Unexpected indicator: expected {expected}, got {actual}")]
    UnexpectedIndicator { expected: u8, actual: u8 },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },
}

/// 把线上字节解码为 `#[repr(u8)]` 枚举
pub fn decode_enum<T>(field: &str, value: u8) -> Result<T, ProtocolError>
where
    T: TryFromPrimitive<Primitive = u8>,
{
    T::try_from_primitive(value).map_err(|_| ProtocolError::InvalidValue {
        field: field.to_string(),
        value,
    })
}

/// 检查剩余字节数是否恰好为 `expected`
pub(crate) fn ensure_len(buf: &impl Buf, expected: usize) -> Result<(), ProtocolError> {
    if buf.remaining() != expected {
        return Err(ProtocolError::InvalidLength {
            expected,
            actual: buf.remaining(),
        });
    }
    Ok(())
}

/// 写入一个 `f64`（线上为小端 `f32`）
pub(crate) fn put_real(buf: &mut impl BufMut, value: f64) {
    buf.put_f32_le(value as f32);
}

/// 读出一个 `f64`（线上为小端 `f32`），调用方保证长度足够
pub(crate) fn get_real(buf: &mut impl Buf) -> f64 {
    buf.get_f32_le() as f64
}

/// 主机发往控制器的请求帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    indicator: CommandIndicator,
    payload: BytesMut,
}

impl Request {
    /// 创建空负载的请求
    pub fn new(indicator: CommandIndicator) -> Self {
        Self {
            indicator,
            payload: BytesMut::new(),
        }
    }

    pub fn indicator(&self) -> CommandIndicator {
        self.indicator
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// 负载写入端，供 `control` 模块构建帧
    pub(crate) fn payload_mut(&mut self) -> &mut BytesMut {
        &mut self.payload
    }

    /// 编码为完整数据报
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + self.payload.len());
        buf.put_u8(self.indicator.into());
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }

    /// 从数据报解析请求（控制器侧 / 测试用）
    pub fn decode(datagram: &[u8]) -> Result<Self, ProtocolError> {
        let (&first, rest) = datagram.split_first().ok_or(ProtocolError::EmptyDatagram)?;
        Ok(Self {
            indicator: decode_enum("CommandIndicator", first)?,
            payload: BytesMut::from(rest),
        })
    }
}

/// 控制器返回的响应帧
///
/// `status` 是控制器报告的错误状态字节：
/// - 握手、运动和读取输出的响应携带控制器锁存的错误状态
/// - 配置读写的响应只携带该次配置操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub indicator: CommandIndicator,
    pub status: u8,
    pub payload: Bytes,
}

impl Response {
    /// 头部长度：indicator + status
    pub const HEADER_LEN: usize = 2;

    pub fn new(indicator: CommandIndicator, status: ErrorState, payload: impl Into<Bytes>) -> Self {
        Self {
            indicator,
            status: status.into(),
            payload: payload.into(),
        }
    }

    /// 解析数据报
    pub fn parse(datagram: &[u8]) -> Result<Self, ProtocolError> {
        if datagram.len() < Self::HEADER_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: Self::HEADER_LEN,
                actual: datagram.len(),
            });
        }
        Ok(Self {
            indicator: decode_enum("CommandIndicator", datagram[0])?,
            status: datagram[1],
            payload: Bytes::copy_from_slice(&datagram[Self::HEADER_LEN..]),
        })
    }

    /// 解码状态字节
    pub fn error_state(&self) -> Result<ErrorState, ProtocolError> {
        decode_enum("ErrorState", self.status)
    }

    /// 校验响应与请求的 indicator 一致
    pub fn expect_indicator(&self, expected: CommandIndicator) -> Result<(), ProtocolError> {
        if self.indicator != expected {
            return Err(ProtocolError::UnexpectedIndicator {
                expected: expected.into(),
                actual: self.indicator.into(),
            });
        }
        Ok(())
    }

    /// 编码为完整数据报（控制器侧 / 测试用）
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::HEADER_LEN + self.payload.len());
        buf.put_u8(self.indicator.into());
        buf.put_u8(self.status);
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encode_prepends_indicator() {
        let mut request = Request::new(CommandIndicator::SetConfiguration);
        request.payload_mut().put_u8(7);
        assert_eq!(request.encode().as_ref(), &[4, 7]);
    }

    #[test]
    fn test_request_decode() {
        let request = Request::decode(&[5, 9]).unwrap();
        assert_eq!(request.indicator(), CommandIndicator::GetConfiguration);
        assert_eq!(request.payload(), &[9]);

        assert_eq!(Request::decode(&[]), Err(ProtocolError::EmptyDatagram));
        assert!(matches!(
            Request::decode(&[42]),
            Err(ProtocolError::InvalidValue { value: 42, .. })
        ));
    }

    #[test]
    fn test_response_parse() {
        let response = Response::parse(&[2, 0, 1, 2, 3]).unwrap();
        assert_eq!(response.indicator, CommandIndicator::GetJointOutputs);
        assert_eq!(response.error_state().unwrap(), ErrorState::None);
        assert_eq!(response.payload.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_response_parse_too_short() {
        let result = Response::parse(&[2]);
        assert_eq!(
            result,
            Err(ProtocolError::InvalidLength {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_response_unknown_status() {
        let response = Response::parse(&[0, 200]).unwrap();
        assert!(response.error_state().is_err());
    }

    #[test]
    fn test_response_expect_indicator() {
        let response = Response::new(CommandIndicator::GetLog, ErrorState::None, Bytes::new());
        assert!(response.expect_indicator(CommandIndicator::GetLog).is_ok());
        assert_eq!(
            response.expect_indicator(CommandIndicator::Handshake),
            Err(ProtocolError::UnexpectedIndicator {
                expected: 0,
                actual: 6
            })
        );
    }

    #[test]
    fn test_response_encode_layout() {
        let response = Response::new(
            CommandIndicator::Handshake,
            ErrorState::InputDiscontinuous,
            vec![7u8],
        );
        assert_eq!(response.encode().as_ref(), &[0, 16, 7]);
    }

    #[test]
    fn test_real_is_f32_little_endian() {
        let mut buf = BytesMut::new();
        put_real(&mut buf, 1.5);
        assert_eq!(buf.as_ref(), &1.5f32.to_le_bytes());
        let mut bytes = buf.freeze();
        assert_eq!(get_real(&mut bytes), 1.5);
    }
}
