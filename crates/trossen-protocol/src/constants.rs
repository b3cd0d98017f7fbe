//! 协议常量定义

use std::time::Duration;

/// 控制器监听的 UDP 端口
pub const PORT: u16 = 50000;

/// 等待单次响应的超时（微秒）
pub const TIMEOUT_US: u64 = 1000;

/// 等待单次响应的超时
pub const TIMEOUT: Duration = Duration::from_micros(TIMEOUT_US);

/// 最大重传次数（含首次发送）
pub const MAX_RETRANSMISSION_ATTEMPTS: u32 = 100;

/// 力矩修正系数允许范围
pub const EFFORT_CORRECTION_MIN: f64 = 0.2;
pub const EFFORT_CORRECTION_MAX: f64 = 5.0;

/// 单个 `f32` 在线上的字节数
pub const REAL_SIZE: usize = 4;

/// 单个关节输入：mode + 3 个 f32
pub const JOINT_INPUT_SIZE: usize = 1 + 3 * REAL_SIZE;

/// 单个关节输出：position / velocity / effort / external_effort
pub const JOINT_OUTPUT_SIZE: usize = 4 * REAL_SIZE;

/// 单个关节特性：5 个 f32
pub const JOINT_CHARACTERISTIC_SIZE: usize = 5 * REAL_SIZE;

/// 单个连杆：mass + inertia[9] + xyz[3] + rpy[3]
pub const LINK_SIZE: usize = 16 * REAL_SIZE;

/// 末端执行器：3 个连杆 + 两个手指偏移 + 力限缩放系数
pub const END_EFFECTOR_SIZE: usize = 3 * LINK_SIZE + 3 * REAL_SIZE;

/// 单个关节限位：7 个 f32
pub const JOINT_LIMIT_SIZE: usize = 7 * REAL_SIZE;

/// 单个电机参数：位置环 PID + 速度环 PID
pub const MOTOR_PARAMETER_SIZE: usize = 8 * REAL_SIZE;

/// 算法参数：1 个 f32
pub const ALGORITHM_PARAMETER_SIZE: usize = REAL_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(JOINT_INPUT_SIZE, 13);
        assert_eq!(JOINT_OUTPUT_SIZE, 16);
        assert_eq!(END_EFFECTOR_SIZE, 204);
        assert_eq!(TIMEOUT, Duration::from_millis(1));
    }
}
