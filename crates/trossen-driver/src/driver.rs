//! 驱动门面
//!
//! [`TrossenArmDriver`] 负责生命周期（`configure` / `cleanup` / `Drop`），
//! 并对外提供运动、模式、输出与错误相关的 API。
//!
//! 所有 IO 方法都需要 `&mut self`：同一实例不能并发调用，
//! 多台机械臂请为每个控制器创建独立实例。

use std::net::{IpAddr, SocketAddr};

use tracing::{info, warn};
use trossen_protocol::{
    ConfigurationValue, EndEffector, ErrorState, JointInput, JointOutput, Mode, Model,
    SetHomeCommand,
};
use trossen_transport::{ClientStats, RequestClient, Transport, UdpTransport};

use crate::fault::Fault;
use crate::session::Session;
use crate::validation::{self, JointScope};
use crate::{DriverConfig, DriverError, JointVec};

/// 机械臂驱动
///
/// # 生命周期
///
/// - 构造后处于未配置状态，除 `configure()` 外的 IO 方法返回 [`DriverError::NotConfigured`]
/// - `configure()` 失败时，已建立的 socket 随局部会话一起释放
/// - `cleanup()` 让所有关节进入空闲并释放 socket，可重复调用
/// - `Drop` 时若仍处于配置状态，自动执行 `cleanup()`
pub struct TrossenArmDriver {
    config: DriverConfig,
    session: Option<Session>,
}

impl Default for TrossenArmDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl TrossenArmDriver {
    pub fn new() -> Self {
        Self::with_config(DriverConfig::default())
    }

    pub fn with_config(config: DriverConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 连接并配置控制器
    ///
    /// # 参数
    /// - `model`: 机械臂型号，决定关节数
    /// - `end_effector`: 末端执行器质量属性，配置时上传
    /// - `address`: 控制器 IP 地址（端口固定为 [`DriverConfig::port`]）
    /// - `clear_error`: 是否清除控制器上已存在的故障；为 `false` 时已有故障会直接返回错误
    ///
    /// 已配置时会先执行 `cleanup()`。
    pub fn configure(
        &mut self,
        model: Model,
        end_effector: EndEffector,
        address: &str,
        clear_error: bool,
    ) -> Result<(), DriverError> {
        self.cleanup();
        let ip: IpAddr = address
            .trim()
            .parse()
            .map_err(|_| DriverError::InvalidAddress(address.to_string()))?;
        let transport = UdpTransport::connect(SocketAddr::new(ip, self.config.port))?;
        self.configure_with_transport(model, end_effector, Box::new(transport), clear_error)
    }

    /// 使用自定义传输配置（测试 Mock、非 UDP 链路等）
    pub fn configure_with_transport(
        &mut self,
        model: Model,
        end_effector: EndEffector,
        transport: Box<dyn Transport + Send>,
        clear_error: bool,
    ) -> Result<(), DriverError> {
        self.cleanup();
        let client =
            RequestClient::with_policy(transport, self.config.timeout, self.config.max_attempts);
        let session = Session::open(client, model, end_effector, clear_error)?;
        info!(
            "Driver configured: {} ({} joints)",
            model, session.num_joints
        );
        self.session = Some(session);
        Ok(())
    }

    /// 所有关节进入空闲并释放传输层
    ///
    /// 未配置时为空操作。空闲失败只记录日志，socket 仍会释放。
    pub fn cleanup(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(e) = session.idle_all() {
            warn!("Failed to idle joints during cleanup: {}. Releasing anyway.", e);
        }
        info!("Driver cleaned up ({})", session.model);
    }

    pub fn is_configured(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn session(&self) -> Result<&Session, DriverError> {
        self.session.as_ref().ok_or(DriverError::NotConfigured)
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut Session, DriverError> {
        self.session.as_mut().ok_or(DriverError::NotConfigured)
    }

    pub fn get_num_joints(&self) -> Result<usize, DriverError> {
        Ok(self.session()?.num_joints)
    }

    pub fn get_model(&self) -> Result<Model, DriverError> {
        Ok(self.session()?.model)
    }

    /// 传输层统计（重传次数等）
    pub fn transport_stats(&self) -> Result<ClientStats, DriverError> {
        Ok(self.session()?.stats())
    }

    // ------------------------------------------------------------------
    // 运动指令
    // ------------------------------------------------------------------

    /// 下发所有关节的输入，每个变体必须与关节的配置模式一致
    pub fn set_joint_inputs(&mut self, inputs: &[JointInput]) -> Result<(), DriverError> {
        let session = self.session_mut()?;
        session.fault.ensure_motion_allowed()?;
        validation::check_len(JointScope::All, session.num_joints, inputs.len())?;
        session.send_inputs(inputs)
    }

    /// 对作用范围内的关节下发同一模式的指令，其余关节保持上一次的输入
    ///
    /// 前馈项缺省为 0；速度模式忽略前馈速度。
    fn set_scope(
        &mut self,
        scope: JointScope,
        mode: Mode,
        values: &[f64],
        feedforward_velocities: Option<&[f64]>,
        feedforward_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        let session = self.session_mut()?;
        session.fault.ensure_motion_allowed()?;
        validation::check_len(scope, session.num_joints, values.len())?;
        validation::check_feedforward(
            scope,
            session.num_joints,
            "feedforward velocities",
            feedforward_velocities,
        )?;
        validation::check_feedforward(
            scope,
            session.num_joints,
            "feedforward accelerations",
            feedforward_accelerations,
        )?;
        validation::check_scope_mode(&session.modes, scope, mode)?;

        let inputs: JointVec<JointInput> = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let feedforward_velocity = feedforward_velocities.map_or(0.0, |v| v[i]);
                let feedforward_acceleration = feedforward_accelerations.map_or(0.0, |a| a[i]);
                match mode {
                    Mode::Idle => JointInput::Idle,
                    Mode::Position => JointInput::Position {
                        position: value,
                        feedforward_velocity,
                        feedforward_acceleration,
                    },
                    Mode::Velocity => JointInput::Velocity {
                        velocity: value,
                        feedforward_acceleration,
                    },
                    Mode::ExternalEffort => JointInput::ExternalEffort { effort: value },
                    Mode::Effort => JointInput::Effort { effort: value },
                }
            })
            .collect();
        let merged = validation::merge_inputs(&session.inputs, scope, &inputs);
        session.send_inputs(&merged)
    }

    /// 所有关节的目标位置，可附带前馈速度/加速度
    pub fn set_all_positions(
        &mut self,
        positions: &[f64],
        feedforward_velocities: Option<&[f64]>,
        feedforward_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        self.set_scope(
            JointScope::All,
            Mode::Position,
            positions,
            feedforward_velocities,
            feedforward_accelerations,
        )
    }

    pub fn set_arm_positions(
        &mut self,
        positions: &[f64],
        feedforward_velocities: Option<&[f64]>,
        feedforward_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        self.set_scope(
            JointScope::Arm,
            Mode::Position,
            positions,
            feedforward_velocities,
            feedforward_accelerations,
        )
    }

    pub fn set_gripper_position(
        &mut self,
        position: f64,
        feedforward_velocity: Option<f64>,
        feedforward_acceleration: Option<f64>,
    ) -> Result<(), DriverError> {
        self.set_scope(
            JointScope::Gripper,
            Mode::Position,
            &[position],
            feedforward_velocity.as_ref().map(std::slice::from_ref),
            feedforward_acceleration.as_ref().map(std::slice::from_ref),
        )
    }

    /// 所有关节的目标速度，可附带前馈加速度
    pub fn set_all_velocities(
        &mut self,
        velocities: &[f64],
        feedforward_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        self.set_scope(
            JointScope::All,
            Mode::Velocity,
            velocities,
            None,
            feedforward_accelerations,
        )
    }

    pub fn set_arm_velocities(
        &mut self,
        velocities: &[f64],
        feedforward_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        self.set_scope(
            JointScope::Arm,
            Mode::Velocity,
            velocities,
            None,
            feedforward_accelerations,
        )
    }

    pub fn set_gripper_velocity(
        &mut self,
        velocity: f64,
        feedforward_acceleration: Option<f64>,
    ) -> Result<(), DriverError> {
        self.set_scope(
            JointScope::Gripper,
            Mode::Velocity,
            &[velocity],
            None,
            feedforward_acceleration.as_ref().map(std::slice::from_ref),
        )
    }

    pub fn set_all_efforts(&mut self, efforts: &[f64]) -> Result<(), DriverError> {
        self.set_scope(JointScope::All, Mode::Effort, efforts, None, None)
    }

    pub fn set_arm_efforts(&mut self, efforts: &[f64]) -> Result<(), DriverError> {
        self.set_scope(JointScope::Arm, Mode::Effort, efforts, None, None)
    }

    pub fn set_gripper_effort(&mut self, effort: f64) -> Result<(), DriverError> {
        self.set_scope(JointScope::Gripper, Mode::Effort, &[effort], None, None)
    }

    pub fn set_all_external_efforts(&mut self, efforts: &[f64]) -> Result<(), DriverError> {
        self.set_scope(JointScope::All, Mode::ExternalEffort, efforts, None, None)
    }

    pub fn set_arm_external_efforts(&mut self, efforts: &[f64]) -> Result<(), DriverError> {
        self.set_scope(JointScope::Arm, Mode::ExternalEffort, efforts, None, None)
    }

    pub fn set_gripper_external_effort(&mut self, effort: f64) -> Result<(), DriverError> {
        self.set_scope(JointScope::Gripper, Mode::ExternalEffort, &[effort], None, None)
    }

    /// 将当前位置标定为零点
    pub fn set_home(&mut self) -> Result<(), DriverError> {
        let session = self.session_mut()?;
        session.fault.ensure_motion_allowed()?;
        session.exchange(&SetHomeCommand.to_request())?;
        info!("Home position set");
        Ok(())
    }

    // ------------------------------------------------------------------
    // 模式
    // ------------------------------------------------------------------

    /// 设置每个关节的模式（每个关节一次配置往返）
    pub fn set_joint_modes(&mut self, modes: &[Mode]) -> Result<(), DriverError> {
        let session = self.session_mut()?;
        validation::check_len(JointScope::All, session.num_joints, modes.len())?;
        for (joint, &mode) in modes.iter().enumerate() {
            session.set_mode(joint, mode)?;
        }
        Ok(())
    }

    pub fn set_all_modes(&mut self, mode: Mode) -> Result<(), DriverError> {
        self.session_mut()?.set_scope_modes(JointScope::All, mode)
    }

    pub fn set_arm_modes(&mut self, mode: Mode) -> Result<(), DriverError> {
        self.session_mut()?.set_scope_modes(JointScope::Arm, mode)
    }

    pub fn set_gripper_mode(&mut self, mode: Mode) -> Result<(), DriverError> {
        self.session_mut()?.set_scope_modes(JointScope::Gripper, mode)
    }

    /// 从控制器读取所有关节的模式
    pub fn get_modes(&mut self) -> Result<Vec<Mode>, DriverError> {
        self.session_mut()?.read_modes()
    }

    // ------------------------------------------------------------------
    // 输出
    // ------------------------------------------------------------------

    /// 向控制器请求最新输出
    pub fn request_joint_outputs(&mut self) -> Result<Vec<JointOutput>, DriverError> {
        let session = self.session_mut()?;
        session.refresh_outputs()?;
        Ok(session.outputs.to_vec())
    }

    /// 最近一次收到的输出（不做 IO）
    pub fn get_joint_outputs(&self) -> Result<Vec<JointOutput>, DriverError> {
        Ok(self.session()?.outputs.to_vec())
    }

    fn map_outputs(&self, field: fn(&JointOutput) -> f64) -> Result<Vec<f64>, DriverError> {
        Ok(self.session()?.outputs.iter().map(field).collect())
    }

    pub fn get_positions(&self) -> Result<Vec<f64>, DriverError> {
        self.map_outputs(|o| o.position)
    }

    pub fn get_velocities(&self) -> Result<Vec<f64>, DriverError> {
        self.map_outputs(|o| o.velocity)
    }

    pub fn get_efforts(&self) -> Result<Vec<f64>, DriverError> {
        self.map_outputs(|o| o.effort)
    }

    pub fn get_external_efforts(&self) -> Result<Vec<f64>, DriverError> {
        self.map_outputs(|o| o.external_effort)
    }

    /// 最近一次下发的输入
    pub fn get_joint_inputs(&self) -> Result<Vec<JointInput>, DriverError> {
        Ok(self.session()?.inputs.to_vec())
    }

    // ------------------------------------------------------------------
    // 错误状态
    // ------------------------------------------------------------------

    /// 已锁存的故障
    pub fn get_fault(&self) -> Result<Option<Fault>, DriverError> {
        Ok(self.session()?.fault.fault().cloned())
    }

    /// 清除控制器错误状态，确认后解除本地锁存
    pub fn reset_error_state(&mut self) -> Result<(), DriverError> {
        let session = self.session_mut()?;
        session.set_configuration(ConfigurationValue::ErrorState(ErrorState::None))?;
        session.fault.clear();
        Ok(())
    }

    /// 读取控制器错误状态与诊断日志
    pub fn get_error_information(&mut self) -> Result<String, DriverError> {
        let session = self.session_mut()?;
        let state = session.read_error_state()?;
        let log = session.fetch_log()?;
        if log.is_empty() {
            Ok(state.description().to_string())
        } else {
            Ok(format!("{}: {}", state.description(), log))
        }
    }
}

impl Drop for TrossenArmDriver {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("TrossenArmDriver dropped while configured, cleaning up");
            self.cleanup();
        }
    }
}
