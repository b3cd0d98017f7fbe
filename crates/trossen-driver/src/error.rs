//! 驱动层错误类型定义

use thiserror::Error;
use trossen_protocol::{ErrorState, Model, ProtocolError};
use trossen_transport::TransportError;

use crate::validation::ValidationError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 通信失败（重传耗尽、socket 错误）
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 本地校验失败，没有发送任何数据报
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 控制器报告的故障，`detail` 来自控制器诊断日志
    #[error("Controller error: {state} ({detail})")]
    Controller { state: ErrorState, detail: String },

    /// 尚未调用 `configure()`
    #[error("Driver not configured, call configure() first")]
    NotConfigured,

    /// 握手返回的关节数与型号不符
    #[error("Model mismatch: {model} has {expected} joints, controller reports {actual}")]
    ModelMismatch {
        model: Model,
        expected: usize,
        actual: usize,
    },

    /// 控制器地址无法解析
    #[error("Invalid controller address: {0}")]
    InvalidAddress(String),

    /// 配置文档读写失败
    #[error("Configuration document error: {0:#}")]
    Document(#[from] anyhow::Error),
}

impl DriverError {
    /// 控制器故障类型（若是控制器故障）
    pub fn error_state(&self) -> Option<ErrorState> {
        match self {
            DriverError::Controller { state, .. } => Some(*state),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DriverError::Validation(_))
    }
}
