//! 响应帧解析
//!
//! 解析函数只检查 indicator 与负载格式，状态字节的语义由驱动层处理。

use bytes::{Buf, Bytes, BytesMut};

use crate::config::ConfigurationValue;
use crate::constants::JOINT_OUTPUT_SIZE;
use crate::ids::CommandIndicator;
use crate::types::{ConfigurationAddress, JointOutput};
use crate::{ProtocolError, Response, decode_enum, ensure_len, get_real, put_real};

impl JointOutput {
    pub fn write(&self, buf: &mut BytesMut) {
        put_real(buf, self.position);
        put_real(buf, self.velocity);
        put_real(buf, self.effort);
        put_real(buf, self.external_effort);
    }

    fn read(buf: &mut impl Buf) -> Self {
        Self {
            position: get_real(buf),
            velocity: get_real(buf),
            effort: get_real(buf),
            external_effort: get_real(buf),
        }
    }
}

/// 握手响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeFeedback {
    pub num_joints: u8,
}

impl TryFrom<&Response> for HandshakeFeedback {
    type Error = ProtocolError;

    fn try_from(response: &Response) -> Result<Self, Self::Error> {
        response.expect_indicator(CommandIndicator::Handshake)?;
        let mut buf = response.payload.as_ref();
        ensure_len(&buf, 1)?;
        Ok(Self {
            num_joints: buf.get_u8(),
        })
    }
}

/// 关节输出响应（`SetJointInputs` 与 `GetJointOutputs` 共用）
#[derive(Debug, Clone, PartialEq)]
pub struct JointOutputsFeedback {
    pub outputs: Vec<JointOutput>,
}

impl JointOutputsFeedback {
    pub fn parse(response: &Response, num_joints: usize) -> Result<Self, ProtocolError> {
        match response.indicator {
            CommandIndicator::SetJointInputs | CommandIndicator::GetJointOutputs => {}
            other => {
                return Err(ProtocolError::UnexpectedIndicator {
                    expected: CommandIndicator::GetJointOutputs.into(),
                    actual: other.into(),
                });
            }
        }
        let mut buf = response.payload.as_ref();
        ensure_len(&buf, num_joints * JOINT_OUTPUT_SIZE)?;
        let outputs = (0..num_joints).map(|_| JointOutput::read(&mut buf)).collect();
        Ok(Self { outputs })
    }

    /// 编码负载（控制器侧 / 测试用）
    pub fn encode(outputs: &[JointOutput]) -> Bytes {
        let mut buf = BytesMut::with_capacity(outputs.len() * JOINT_OUTPUT_SIZE);
        for output in outputs {
            output.write(&mut buf);
        }
        buf.freeze()
    }
}

/// 读配置响应：`[address, value...]`
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationFeedback {
    pub value: ConfigurationValue,
}

impl ConfigurationFeedback {
    pub fn parse(
        response: &Response,
        expected: ConfigurationAddress,
        num_joints: usize,
    ) -> Result<Self, ProtocolError> {
        response.expect_indicator(CommandIndicator::GetConfiguration)?;
        let (&address, value) = response
            .payload
            .split_first()
            .ok_or(ProtocolError::InvalidLength {
                expected: 1,
                actual: 0,
            })?;
        let address: ConfigurationAddress = decode_enum("ConfigurationAddress", address)?;
        if address != expected {
            return Err(ProtocolError::ParseError(format!(
                "configuration address mismatch: expected {expected:?}, got {address:?}"
            )));
        }
        Ok(Self {
            value: ConfigurationValue::decode(address, value, num_joints)?,
        })
    }

    /// 编码负载（控制器侧 / 测试用）
    pub fn encode(value: &ConfigurationValue) -> Bytes {
        let encoded = value.encode();
        let mut buf = BytesMut::with_capacity(1 + encoded.len());
        buf.extend_from_slice(&[value.address().into()]);
        buf.extend_from_slice(&encoded);
        buf.freeze()
    }
}

/// 诊断日志响应（UTF-8 文本，非法字节按替换字符处理）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFeedback {
    pub text: String,
}

impl TryFrom<&Response> for LogFeedback {
    type Error = ProtocolError;

    fn try_from(response: &Response) -> Result<Self, Self::Error> {
        response.expect_indicator(CommandIndicator::GetLog)?;
        // 固定长度缓冲区可能在多字节字符中间截断，非法字节替换为 U+FFFD
        let text = String::from_utf8_lossy(&response.payload);
        Ok(Self {
            text: text.trim_end_matches('\0').to_string(),
        })
    }
}
