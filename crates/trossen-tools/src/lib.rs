//! # Trossen Tools - 共享数据结构
//!
//! **依赖原则**: 只依赖 `trossen-protocol`，不依赖 `trossen-driver`
//!
//! ## 包含模块
//!
//! - `configuration` - 控制器配置文档（TOML 持久化）

pub mod configuration;

// 重新导出常用类型
pub use configuration::{CONFIGURATION_VERSION, ConfigurationDocument};
