//! 指令标识符定义
//!
//! 每个请求和响应的第一个字节都是 indicator，用于请求/响应关联。

/// 请求指令标识符
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    num_enum::TryFromPrimitive,
    num_enum::IntoPrimitive,
)]
#[repr(u8)]
pub enum CommandIndicator {
    /// 握手：上报型号，返回关节数
    Handshake = 0,
    /// 下发所有关节输入，返回关节输出
    SetJointInputs = 1,
    /// 读取关节输出
    GetJointOutputs = 2,
    /// 将当前位置设为零点
    SetHome = 3,
    /// 写配置项
    SetConfiguration = 4,
    /// 读配置项
    GetConfiguration = 5,
    /// 读取控制器诊断日志
    GetLog = 6,
}

impl CommandIndicator {
    /// 该指令的响应状态是否反映控制器锁存的错误状态
    ///
    /// 配置读写的响应状态只表示该次配置操作的结果。
    pub fn reports_latched_state(self) -> bool {
        match self {
            CommandIndicator::Handshake
            | CommandIndicator::SetJointInputs
            | CommandIndicator::GetJointOutputs
            | CommandIndicator::SetHome => true,
            CommandIndicator::SetConfiguration
            | CommandIndicator::GetConfiguration
            | CommandIndicator::GetLog => false,
        }
    }
}
