//! 已配置的控制器会话
//!
//! `configure()` 成功后才存在。持有传输层（socket）、关节数、
//! 本地镜像的关节模式、最近一次下发的输入和最近一次收到的输出。
//! 会话被 drop 时 socket 随之释放。

use smallvec::smallvec;
use tracing::{debug, info, warn};
use trossen_protocol::{
    ConfigEffect, ConfigurationAddress, ConfigurationFeedback, ConfigurationValue, EndEffector,
    ErrorState, GetConfigurationCommand, GetJointOutputsCommand, GetLogCommand, HandshakeCommand,
    HandshakeFeedback, JointInput, JointInputsCommand, JointOutput, JointOutputsFeedback,
    LogFeedback, Mode, Model, Request, Response, SetConfigurationCommand,
};
use trossen_transport::{ClientStats, RequestClient, Transport};

use crate::fault::FaultMonitor;
use crate::validation::{self, JointScope};
use crate::{DriverError, JointVec};

/// 从 [`ConfigurationValue`] 中取出指定变体
macro_rules! expect_value {
    ($value:expr, $variant:ident) => {
        match $value {
            ::trossen_protocol::ConfigurationValue::$variant(inner) => Ok(inner),
            other => Err($crate::DriverError::Protocol(
                ::trossen_protocol::ProtocolError::ParseError(format!(
                    "expected {} value, got {:?}",
                    stringify!($variant),
                    other.address()
                )),
            )),
        }
    };
}
pub(crate) use expect_value;

pub(crate) type BoxedTransport = Box<dyn Transport + Send>;

pub(crate) struct Session {
    client: RequestClient<BoxedTransport>,
    pub(crate) model: Model,
    pub(crate) num_joints: usize,
    /// 控制器确认过的关节模式
    pub(crate) modes: JointVec<Mode>,
    /// 最近一次成功下发的输入（部分范围指令的“保持”来源）
    pub(crate) inputs: JointVec<JointInput>,
    /// 最近一次收到的输出
    pub(crate) outputs: JointVec<JointOutput>,
    pub(crate) fault: FaultMonitor,
}

impl Session {
    /// 握手、检查错误状态、上传末端执行器、同步模式与输出
    pub(crate) fn open(
        mut client: RequestClient<BoxedTransport>,
        model: Model,
        end_effector: EndEffector,
        clear_error: bool,
    ) -> Result<Self, DriverError> {
        // 握手响应的状态字节不作为故障处理，错误状态在下面单独读取
        let response = client.request(&HandshakeCommand::new(model).to_request())?;
        let num_joints = HandshakeFeedback::try_from(&response)?.num_joints as usize;
        if num_joints != model.num_joints() {
            return Err(DriverError::ModelMismatch {
                model,
                expected: model.num_joints(),
                actual: num_joints,
            });
        }
        debug!("Handshake ok: {} with {} joints", model, num_joints);

        let mut session = Self {
            client,
            model,
            num_joints,
            modes: smallvec![Mode::Idle; num_joints],
            inputs: smallvec![JointInput::Idle; num_joints],
            outputs: smallvec![JointOutput::default(); num_joints],
            fault: FaultMonitor::new(),
        };

        session.check_error_state(clear_error)?;
        session.set_configuration(ConfigurationValue::EndEffector(end_effector))?;
        session.read_modes()?;
        session.refresh_outputs()?;
        session.inputs = session
            .modes
            .iter()
            .zip(&session.outputs)
            .map(|(&mode, output)| JointInput::hold(mode, output.position))
            .collect();

        Ok(session)
    }

    fn check_error_state(&mut self, clear_error: bool) -> Result<(), DriverError> {
        let state = self.read_error_state()?;
        if !state.is_fault() {
            return Ok(());
        }
        if clear_error {
            info!("Clearing pre-existing controller error: {:?}", state);
            self.set_configuration(ConfigurationValue::ErrorState(ErrorState::None))?;
            return Ok(());
        }
        let detail = self.fetch_log().unwrap_or_else(|e| {
            warn!("Failed to fetch controller log: {}", e);
            String::new()
        });
        Err(DriverError::Controller { state, detail })
    }

    pub(crate) fn stats(&self) -> ClientStats {
        self.client.stats()
    }

    /// 发送请求并检查状态字节，非 `None` 时锁存故障
    pub(crate) fn exchange(&mut self, request: &Request) -> Result<Response, DriverError> {
        let response = self.client.request(request)?;
        let state = response.error_state()?;
        if state.is_fault() {
            let detail = self.fetch_log().unwrap_or_else(|e| {
                warn!("Failed to fetch controller log: {}", e);
                String::new()
            });
            return Err(self.fault.latch(state, detail));
        }
        Ok(response)
    }

    /// 读取控制器诊断日志（带外请求，不检查状态）
    pub(crate) fn fetch_log(&mut self) -> Result<String, DriverError> {
        let response = self.client.request(&GetLogCommand.to_request())?;
        Ok(LogFeedback::try_from(&response)?.text)
    }

    /// 读配置（每次都是新的往返，不缓存）
    pub(crate) fn get_configuration(
        &mut self,
        address: ConfigurationAddress,
    ) -> Result<ConfigurationValue, DriverError> {
        let response = self.exchange(&GetConfigurationCommand::new(address).to_request())?;
        let feedback = ConfigurationFeedback::parse(&response, address, self.num_joints)?;
        Ok(feedback.value)
    }

    /// 写配置，返回生效时机
    pub(crate) fn set_configuration(
        &mut self,
        value: ConfigurationValue,
    ) -> Result<ConfigEffect, DriverError> {
        let address = value.address();
        self.exchange(&SetConfigurationCommand::new(value).to_request())?;
        let effect = address.effect();
        match effect {
            ConfigEffect::AfterPowerCycle => {
                info!(
                    "{:?} written, takes effect after the controller is power-cycled",
                    address
                );
            }
            ConfigEffect::Immediate => debug!("{:?} written", address),
        }
        Ok(effect)
    }

    pub(crate) fn read_error_state(&mut self) -> Result<ErrorState, DriverError> {
        let value = self.get_configuration(ConfigurationAddress::ErrorState)?;
        expect_value!(value, ErrorState)
    }

    /// 从控制器读取模式并更新本地镜像
    pub(crate) fn read_modes(&mut self) -> Result<Vec<Mode>, DriverError> {
        let value = self.get_configuration(ConfigurationAddress::Modes)?;
        let modes = expect_value!(value, Modes)?;
        for (joint, (&read, held)) in modes.iter().zip(self.modes.iter_mut()).enumerate() {
            if *held != read {
                debug!("Joint {} mode {:?} (was {:?})", joint, read, held);
                *held = read;
                self.inputs[joint] = JointInput::hold(read, self.outputs[joint].position);
            }
        }
        Ok(modes)
    }

    /// 设置单个关节的模式，控制器确认后才更新本地镜像
    pub(crate) fn set_mode(&mut self, joint: usize, mode: Mode) -> Result<(), DriverError> {
        validation::check_joint(joint, self.num_joints)?;
        self.set_configuration(ConfigurationValue::JointMode {
            joint_index: joint as u8,
            mode,
        })?;
        self.modes[joint] = mode;
        self.inputs[joint] = JointInput::hold(mode, self.outputs[joint].position);
        Ok(())
    }

    /// 设置作用范围内所有关节的模式（每个关节一次往返）
    pub(crate) fn set_scope_modes(
        &mut self,
        scope: JointScope,
        mode: Mode,
    ) -> Result<(), DriverError> {
        for joint in scope.range(self.num_joints) {
            self.set_mode(joint, mode)?;
        }
        Ok(())
    }

    /// 下发完整指令
    ///
    /// 故障状态、长度与模式检查都在发送前完成。
    pub(crate) fn send_inputs(&mut self, inputs: &[JointInput]) -> Result<(), DriverError> {
        self.fault.ensure_motion_allowed()?;
        validation::check_inputs(&self.modes, inputs)?;
        let response = self.exchange(&JointInputsCommand::new(inputs).to_request())?;
        let feedback = JointOutputsFeedback::parse(&response, self.num_joints)?;
        self.outputs = feedback.outputs.into_iter().collect();
        self.inputs = inputs.iter().copied().collect();
        Ok(())
    }

    pub(crate) fn refresh_outputs(&mut self) -> Result<(), DriverError> {
        let response = self.exchange(&GetJointOutputsCommand.to_request())?;
        let feedback = JointOutputsFeedback::parse(&response, self.num_joints)?;
        self.outputs = feedback.outputs.into_iter().collect();
        Ok(())
    }

    /// 所有关节切换到空闲（`cleanup` 使用）
    pub(crate) fn idle_all(&mut self) -> Result<(), DriverError> {
        self.set_scope_modes(JointScope::All, Mode::Idle)
    }
}
