//! 错误状态机
//!
//! 控制器响应中的状态字节非 `None` 时，驱动进入故障状态并锁存该故障：
//! 之后所有运动指令在本地被拒绝（不产生数据报），直到调用方显式清除
//! （`reset_error_state()`，或 `cleanup()` 后以 `clear_error = true` 重新 `configure()`）。
//!
//! 驱动不会自动清除故障。

use tracing::{error, info};
use trossen_protocol::ErrorState;

use crate::DriverError;

/// 已锁存的故障
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub state: ErrorState,
    /// 控制器诊断日志（获取失败时为空）
    pub detail: String,
}

impl Fault {
    pub fn to_error(&self) -> DriverError {
        DriverError::Controller {
            state: self.state,
            detail: self.detail.clone(),
        }
    }
}

/// 故障锁存器
#[derive(Debug, Default)]
pub struct FaultMonitor {
    fault: Option<Fault>,
}

impl FaultMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// 运动指令的前置检查，不做 IO
    pub fn ensure_motion_allowed(&self) -> Result<(), DriverError> {
        match &self.fault {
            Some(fault) => Err(fault.to_error()),
            None => Ok(()),
        }
    }

    /// 锁存故障并返回对应错误
    ///
    /// 已处于故障状态时保留最先锁存的故障。
    pub fn latch(&mut self, state: ErrorState, detail: String) -> DriverError {
        if let Some(existing) = &self.fault {
            error!(
                "Controller reported {:?} while already faulted with {:?}",
                state, existing.state
            );
            return existing.to_error();
        }
        error!("Controller fault latched: {:?}: {}", state, detail);
        self.fault.insert(Fault { state, detail }).to_error()
    }

    /// 清除故障（仅在控制器确认清除后调用）
    pub fn clear(&mut self) {
        if let Some(fault) = self.fault.take() {
            info!("Controller fault {:?} cleared", fault.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initially_clear() {
        let monitor = FaultMonitor::new();
        assert!(!monitor.is_faulted());
        assert!(monitor.ensure_motion_allowed().is_ok());
    }

    #[test]
    fn test_latch_rejects_motion_with_same_fault() {
        let mut monitor = FaultMonitor::new();
        let error = monitor.latch(ErrorState::InputDiscontinuous, "joint 5".to_string());
        assert_eq!(error.error_state(), Some(ErrorState::InputDiscontinuous));

        for _ in 0..3 {
            let error = monitor.ensure_motion_allowed().unwrap_err();
            match error {
                DriverError::Controller { state, detail } => {
                    assert_eq!(state, ErrorState::InputDiscontinuous);
                    assert_eq!(detail, "joint 5");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_first_fault_is_kept() {
        let mut monitor = FaultMonitor::new();
        monitor.latch(ErrorState::JointOverheated, String::new());
        let error = monitor.latch(ErrorState::InputModeMismatch, String::new());
        assert_eq!(error.error_state(), Some(ErrorState::JointOverheated));
        assert_eq!(
            monitor.fault().map(|f| f.state),
            Some(ErrorState::JointOverheated)
        );
    }

    #[test]
    fn test_clear() {
        let mut monitor = FaultMonitor::new();
        monitor.latch(ErrorState::JointOverheated, String::new());
        monitor.clear();
        assert!(monitor.ensure_motion_allowed().is_ok());
        // 重复清除无副作用
        monitor.clear();
        assert!(!monitor.is_faulted());
    }
}
