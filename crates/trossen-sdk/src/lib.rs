//! Trossen SDK - Trossen 机械臂 Rust SDK
//!
//! 通过 UDP 与机械臂控制器通信的主机侧驱动。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 帧格式、配置项编码/解码
//! - **传输层** (`transport`): UDP 数据报收发、请求/响应关联与重传
//! - **驱动层** (`driver`): 生命周期、模式/输入校验、错误状态机、轨迹下发
//! - **工具层** (`tools`): 配置文档（TOML）
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use trossen_sdk::prelude::*;
//!
//! # fn main() -> Result<(), DriverError> {
//! trossen_sdk::init_logging();
//!
//! let mut driver = TrossenArmDriver::new();
//! driver.configure(Model::WxaiV0, EndEffector::WXAI_V0_BASE, "192.168.1.2", false)?;
//! driver.set_all_modes(Mode::Position)?;
//! driver.move_all_to(2.0, &[0.0; 7], None, None)?;
//! driver.cleanup();
//! # Ok(())
//! # }
//! ```

pub use trossen_driver as driver;
pub use trossen_protocol as protocol;
pub use trossen_tools as tools;
pub use trossen_transport as transport;

pub mod prelude;

pub use driver::{DriverConfig, DriverError, TrossenArmDriver};
pub use protocol::{EndEffector, ErrorState, JointInput, JointOutput, Mode, Model};

use tracing_subscriber::EnvFilter;

/// 默认日志过滤指令（`RUST_LOG` 未设置、为空或无法解析时生效）
pub const DEFAULT_LOG_DIRECTIVE: &str = "trossen=info";

/// 初始化日志
///
/// - 安装 `tracing_subscriber::fmt`，过滤规则来自 `RUST_LOG`，
///   未设置时使用 [`DEFAULT_LOG_DIRECTIVE`]
/// - 通过 `tracing-log` 桥接 `log` crate 的记录
///
/// 重复调用无副作用（已安装的全局订阅者保持不变）。
pub fn init_logging() {
    let _ = tracing_log::LogTracer::builder()
        .with_max_level(log::LevelFilter::Trace)
        .init();

    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(env.as_deref()))
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}

fn log_filter(env_directives: Option<&str>) -> EnvFilter {
    match env_directives.map(str::trim) {
        Some(directives) if !directives.is_empty() => EnvFilter::try_new(directives)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
        _ => EnvFilter::new(DEFAULT_LOG_DIRECTIVE),
    }
}
