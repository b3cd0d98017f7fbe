//! # Trossen Driver
//!
//! 机械臂驱动层，包括：
//! - 生命周期管理（`configure` / `cleanup` / `Drop`）
//! - 模式与输入校验（发送前本地检查，失败不产生任何数据报）
//! - 错误状态机（控制器报告的故障会被锁存，运动指令在本地被拒绝）
//! - 配置项读写代理
//! - 五次 Hermite 插值与定周期轨迹下发
//!
//! # 使用场景
//!
//! ```rust,no_run
//! use trossen_driver::TrossenArmDriver;
//! use trossen_protocol::{EndEffector, Mode, Model};
//!
//! # fn main() -> Result<(), trossen_driver::DriverError> {
//! let mut driver = TrossenArmDriver::new();
//! driver.configure(Model::WxaiV0, EndEffector::WXAI_V0_BASE, "192.168.1.2", false)?;
//! driver.set_arm_modes(Mode::Position)?;
//! driver.move_arm_to(2.0, &[0.0, 1.05, 0.5, 0.0, 0.0, 0.0], None, None)?;
//! driver.cleanup();
//! # Ok(())
//! # }
//! ```

mod config;
mod driver;
mod error;
pub mod fault;
pub mod interpolate;
mod motion;
mod session;
mod store;
pub mod validation;

pub use config::DriverConfig;
pub use driver::TrossenArmDriver;
pub use error::DriverError;
pub use fault::{Fault, FaultMonitor};
pub use interpolate::QuinticHermiteInterpolator;
pub use validation::{JointScope, ValidationError};

/// 关节向量：7 关节内不分配堆内存
pub type JointVec<T> = smallvec::SmallVec<[T; 8]>;
