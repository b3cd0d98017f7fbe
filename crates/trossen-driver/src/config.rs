//! 驱动运行参数

use std::time::Duration;

use trossen_protocol::{MAX_RETRANSMISSION_ATTEMPTS, PORT, TIMEOUT};

/// 驱动运行参数
///
/// 默认值与控制器固件约定一致，一般只在测试或特殊网络环境下修改。
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// 控制器 UDP 端口
    pub port: u16,
    /// 单次响应等待超时
    pub timeout: Duration,
    /// 单个请求的最大尝试次数（含首次发送）
    pub max_attempts: u32,
    /// `move_*_to` 的指令下发周期
    pub control_period: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            port: PORT,
            timeout: TIMEOUT,
            max_attempts: MAX_RETRANSMISSION_ATTEMPTS,
            control_period: Duration::from_millis(2),
        }
    }
}
