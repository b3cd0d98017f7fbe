//! 协议枚举类型与关节输入/输出

/// 关节控制模式
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    num_enum::TryFromPrimitive,
    num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum Mode {
    /// 空闲：关节不受控，保持上电制动
    #[default]
    Idle = 0,
    /// 位置模式
    Position = 1,
    /// 速度模式
    Velocity = 2,
    /// 外力模式：指令为末端外力对应的关节力矩
    ExternalEffort = 3,
    /// 力矩模式
    Effort = 4,
}

/// IP 获取方式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum IpMethod {
    Manual = 0,
    Dhcp = 1,
}

/// 机械臂型号
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum Model {
    WxaiV0 = 0,
    VxaiV0Right = 1,
    VxaiV0Left = 2,
}

impl Model {
    /// 关节总数（6 个臂关节 + 夹爪）
    pub fn num_joints(self) -> usize {
        match self {
            Model::WxaiV0 | Model::VxaiV0Right | Model::VxaiV0Left => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Model::WxaiV0 => "wxai_v0",
            Model::VxaiV0Right => "vxai_v0_right",
            Model::VxaiV0Left => "vxai_v0_left",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 控制器错误状态
///
/// 非 `None` 状态会被控制器锁存，直到主机显式清除。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum ErrorState {
    None = 0,
    UdpInitFailed = 1,
    CanInitFailed = 2,
    JointCommandFailed = 3,
    JointFeedbackFailed = 4,
    JointEnableFailed = 5,
    JointDisableFailed = 6,
    JointSetHomeFailed = 7,
    JointDisabledUnexpectedly = 8,
    JointOverheated = 9,
    InvalidMode = 10,
    InvalidCommand = 11,
    InvalidCommandSize = 12,
    InvalidConfigurationAddress = 13,
    InvalidPendingCommand = 14,
    InputModeMismatch = 15,
    InputDiscontinuous = 16,
}

impl ErrorState {
    pub fn is_fault(self) -> bool {
        self != ErrorState::None
    }

    /// 面向用户的错误描述
    pub fn description(self) -> &'static str {
        match self {
            ErrorState::None => "No error",
            ErrorState::UdpInitFailed => "Controller's UDP interface failed to initialize",
            ErrorState::CanInitFailed => "Controller's CAN interface failed to initialize",
            ErrorState::JointCommandFailed => "Controller failed to send a command to a joint",
            ErrorState::JointFeedbackFailed => "Controller failed to receive feedback from a joint",
            ErrorState::JointEnableFailed => "Failed to enable a joint",
            ErrorState::JointDisableFailed => "Failed to disable a joint",
            ErrorState::JointSetHomeFailed => "Failed to set the home position of a joint",
            ErrorState::JointDisabledUnexpectedly => "A joint was disabled unexpectedly",
            ErrorState::JointOverheated => "A joint overheated",
            ErrorState::InvalidMode => "Invalid mode received",
            ErrorState::InvalidCommand => "Invalid command indicator received",
            ErrorState::InvalidCommandSize => "Command with unexpected size received",
            ErrorState::InvalidConfigurationAddress => "Invalid configuration address received",
            ErrorState::InvalidPendingCommand => "Invalid pending command",
            ErrorState::InputModeMismatch => {
                "Joint inputs with modes different from the configured modes received"
            }
            ErrorState::InputDiscontinuous => "Discontinuous joint inputs received",
        }
    }
}

impl std::fmt::Display for ErrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// 配置项地址
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum ConfigurationAddress {
    FactoryResetFlag = 0,
    IpMethod = 1,
    ManualIp = 2,
    Dns = 3,
    Gateway = 4,
    Subnet = 5,
    JointCharacteristics = 6,
    ErrorState = 7,
    Modes = 8,
    EndEffector = 9,
    ContinuityFactors = 10,
    JointLimits = 11,
    MotorParameters = 12,
    AlgorithmParameter = 13,
}

/// 配置写入的生效时机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEffect {
    /// 立即生效
    Immediate,
    /// 下次上电后生效
    AfterPowerCycle,
}

impl ConfigurationAddress {
    pub fn effect(self) -> ConfigEffect {
        match self {
            ConfigurationAddress::FactoryResetFlag
            | ConfigurationAddress::IpMethod
            | ConfigurationAddress::ManualIp
            | ConfigurationAddress::Dns
            | ConfigurationAddress::Gateway
            | ConfigurationAddress::Subnet => ConfigEffect::AfterPowerCycle,
            ConfigurationAddress::JointCharacteristics
            | ConfigurationAddress::ErrorState
            | ConfigurationAddress::Modes
            | ConfigurationAddress::EndEffector
            | ConfigurationAddress::ContinuityFactors
            | ConfigurationAddress::JointLimits
            | ConfigurationAddress::MotorParameters
            | ConfigurationAddress::AlgorithmParameter => ConfigEffect::Immediate,
        }
    }
}

/// 单个关节的输入
///
/// 每个变体对应一种 [`Mode`]，下发时必须与关节当前配置的模式一致。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum JointInput {
    #[default]
    Idle,
    Position {
        position: f64,
        feedforward_velocity: f64,
        feedforward_acceleration: f64,
    },
    Velocity {
        velocity: f64,
        feedforward_acceleration: f64,
    },
    ExternalEffort {
        effort: f64,
    },
    Effort {
        effort: f64,
    },
}

impl JointInput {
    /// 纯位置指令（前馈为 0）
    pub fn position(position: f64) -> Self {
        JointInput::Position {
            position,
            feedforward_velocity: 0.0,
            feedforward_acceleration: 0.0,
        }
    }

    pub fn velocity(velocity: f64) -> Self {
        JointInput::Velocity {
            velocity,
            feedforward_acceleration: 0.0,
        }
    }

    /// 输入的模式标签
    pub fn mode(&self) -> Mode {
        match self {
            JointInput::Idle => Mode::Idle,
            JointInput::Position { .. } => Mode::Position,
            JointInput::Velocity { .. } => Mode::Velocity,
            JointInput::ExternalEffort { .. } => Mode::ExternalEffort,
            JointInput::Effort { .. } => Mode::Effort,
        }
    }

    /// 保持指令：位置模式保持在给定位置，其余模式输出为 0
    pub fn hold(mode: Mode, position: f64) -> Self {
        match mode {
            Mode::Idle => JointInput::Idle,
            Mode::Position => JointInput::position(position),
            Mode::Velocity => JointInput::velocity(0.0),
            Mode::ExternalEffort => JointInput::ExternalEffort { effort: 0.0 },
            Mode::Effort => JointInput::Effort { effort: 0.0 },
        }
    }
}

/// 单个关节的输出（测量值）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointOutput {
    pub position: f64,
    pub velocity: f64,
    pub effort: f64,
    pub external_effort: f64,
}
