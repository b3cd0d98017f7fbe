//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use trossen_sdk::prelude::*;
//! ```

// 驱动层
pub use crate::driver::{DriverConfig, DriverError, Fault, JointScope, TrossenArmDriver};

// 协议层类型
pub use crate::protocol::{
    AlgorithmParameter, ConfigEffect, EndEffector, ErrorState, IpMethod, JointCharacteristic,
    JointInput, JointLimit, JointOutput, Mode, Model, MotorParameter,
};

// 配置文档
pub use crate::tools::ConfigurationDocument;
