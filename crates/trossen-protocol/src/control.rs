//! 请求帧构建
//!
//! 每条指令一个结构体，通过 `to_request()` 转换为 [`Request`]。

use bytes::{Buf, BufMut};

use crate::config::ConfigurationValue;
use crate::constants::JOINT_INPUT_SIZE;
use crate::ids::CommandIndicator;
use crate::types::{ConfigurationAddress, JointInput, Mode, Model};
use crate::{ProtocolError, Request, decode_enum, ensure_len, get_real, put_real};

impl JointInput {
    /// 写入线上格式：`mode: u8` + 3 个 `f32`，未使用的槽位填 0
    pub fn write(&self, buf: &mut impl BufMut) {
        let (a, b, c) = match *self {
            JointInput::Idle => (0.0, 0.0, 0.0),
            JointInput::Position {
                position,
                feedforward_velocity,
                feedforward_acceleration,
            } => (position, feedforward_velocity, feedforward_acceleration),
            JointInput::Velocity {
                velocity,
                feedforward_acceleration,
            } => (velocity, feedforward_acceleration, 0.0),
            JointInput::ExternalEffort { effort } | JointInput::Effort { effort } => {
                (effort, 0.0, 0.0)
            }
        };
        buf.put_u8(self.mode().into());
        put_real(buf, a);
        put_real(buf, b);
        put_real(buf, c);
    }

    /// 读取线上格式，调用方保证至少有 [`JOINT_INPUT_SIZE`] 字节
    pub fn read(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        let mode: Mode = decode_enum("Mode", buf.get_u8())?;
        let a = get_real(buf);
        let b = get_real(buf);
        let c = get_real(buf);
        Ok(match mode {
            Mode::Idle => JointInput::Idle,
            Mode::Position => JointInput::Position {
                position: a,
                feedforward_velocity: b,
                feedforward_acceleration: c,
            },
            Mode::Velocity => JointInput::Velocity {
                velocity: a,
                feedforward_acceleration: b,
            },
            Mode::ExternalEffort => JointInput::ExternalEffort { effort: a },
            Mode::Effort => JointInput::Effort { effort: a },
        })
    }
}

/// 握手指令
///
/// 上报主机期望的型号，控制器返回关节数。
#[derive(Debug, Clone, Copy)]
pub struct HandshakeCommand {
    pub model: Model,
}

impl HandshakeCommand {
    pub fn new(model: Model) -> Self {
        Self { model }
    }

    pub fn to_request(self) -> Request {
        let mut request = Request::new(CommandIndicator::Handshake);
        request.payload_mut().put_u8(self.model.into());
        request
    }
}

/// 下发所有关节输入
#[derive(Debug, Clone, Copy)]
pub struct JointInputsCommand<'a> {
    pub inputs: &'a [JointInput],
}

impl<'a> JointInputsCommand<'a> {
    pub fn new(inputs: &'a [JointInput]) -> Self {
        Self { inputs }
    }

    pub fn to_request(self) -> Request {
        let mut request = Request::new(CommandIndicator::SetJointInputs);
        let payload = request.payload_mut();
        payload.reserve(self.inputs.len() * JOINT_INPUT_SIZE);
        for input in self.inputs {
            input.write(payload);
        }
        request
    }

    /// 解析负载（控制器侧 / 测试用）
    pub fn parse(payload: &[u8], num_joints: usize) -> Result<Vec<JointInput>, ProtocolError> {
        let mut buf = payload;
        ensure_len(&buf, num_joints * JOINT_INPUT_SIZE)?;
        (0..num_joints).map(|_| JointInput::read(&mut buf)).collect()
    }
}

/// 读取关节输出
#[derive(Debug, Clone, Copy, Default)]
pub struct GetJointOutputsCommand;

impl GetJointOutputsCommand {
    pub fn to_request(self) -> Request {
        Request::new(CommandIndicator::GetJointOutputs)
    }
}

/// 将当前位置设为零点
#[derive(Debug, Clone, Copy, Default)]
pub struct SetHomeCommand;

impl SetHomeCommand {
    pub fn to_request(self) -> Request {
        Request::new(CommandIndicator::SetHome)
    }
}

/// 写配置项：`[address, value...]`
#[derive(Debug, Clone)]
pub struct SetConfigurationCommand {
    pub value: ConfigurationValue,
}

impl SetConfigurationCommand {
    pub fn new(value: ConfigurationValue) -> Self {
        Self { value }
    }

    pub fn to_request(&self) -> Request {
        let mut request = Request::new(CommandIndicator::SetConfiguration);
        let payload = request.payload_mut();
        payload.put_u8(self.value.address().into());
        payload.extend_from_slice(&self.value.encode());
        request
    }
}

/// 读配置项：`[address]`
#[derive(Debug, Clone, Copy)]
pub struct GetConfigurationCommand {
    pub address: ConfigurationAddress,
}

impl GetConfigurationCommand {
    pub fn new(address: ConfigurationAddress) -> Self {
        Self { address }
    }

    pub fn to_request(self) -> Request {
        let mut request = Request::new(CommandIndicator::GetConfiguration);
        request.payload_mut().put_u8(self.address.into());
        request
    }
}

/// 读取控制器诊断日志
#[derive(Debug, Clone, Copy, Default)]
pub struct GetLogCommand;

impl GetLogCommand {
    pub fn to_request(self) -> Request {
        Request::new(CommandIndicator::GetLog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_command() {
        let request = HandshakeCommand::new(Model::VxaiV0Left).to_request();
        assert_eq!(request.encode().as_ref(), &[0, 2]);
    }

    #[test]
    fn test_joint_inputs_layout() {
        let inputs = [
            JointInput::Position {
                position: 1.0,
                feedforward_velocity: 2.0,
                feedforward_acceleration: 3.0,
            },
            JointInput::Velocity {
                velocity: 4.0,
                feedforward_acceleration: 5.0,
            },
            JointInput::Effort { effort: 6.0 },
            JointInput::Idle,
        ];
        let request = JointInputsCommand::new(&inputs).to_request();
        let payload = request.payload();
        assert_eq!(payload.len(), 4 * JOINT_INPUT_SIZE);

        assert_eq!(payload[0], 1);
        assert_eq!(&payload[1..5], &1.0f32.to_le_bytes());
        assert_eq!(&payload[9..13], &3.0f32.to_le_bytes());

        assert_eq!(payload[13], 2);
        assert_eq!(&payload[14..18], &4.0f32.to_le_bytes());
        assert_eq!(&payload[18..22], &5.0f32.to_le_bytes());
        assert_eq!(&payload[22..26], &[0; 4]);

        assert_eq!(payload[26], 4);
        assert_eq!(payload[39], 0);

        let parsed = JointInputsCommand::parse(payload, 4).unwrap();
        assert_eq!(parsed, inputs);
    }

    #[test]
    fn test_joint_inputs_parse_wrong_length() {
        assert!(JointInputsCommand::parse(&[0; 12], 1).is_err());
        assert!(JointInputsCommand::parse(&[9; 13], 1).is_err());
    }

    #[test]
    fn test_configuration_commands() {
        let request = GetConfigurationCommand::new(ConfigurationAddress::Modes).to_request();
        assert_eq!(request.encode().as_ref(), &[5, 8]);

        let request = SetConfigurationCommand::new(ConfigurationValue::JointMode {
            joint_index: 2,
            mode: Mode::Effort,
        })
        .to_request();
        assert_eq!(request.encode().as_ref(), &[4, 8, 2, 4]);
    }

    #[test]
    fn test_empty_commands() {
        assert_eq!(GetJointOutputsCommand.to_request().encode().as_ref(), &[2]);
        assert_eq!(SetHomeCommand.to_request().encode().as_ref(), &[3]);
        assert_eq!(GetLogCommand.to_request().encode().as_ref(), &[6]);
    }
}
