//! # 控制器配置文档
//!
//! 控制器可持久化配置的完整快照，以 TOML 保存。每个配置地址对应一个键，
//! 错误状态与关节模式属于运行时状态，不在文档中。
//!
//! ```toml
//! version = 1
//! factory_reset_flag = false
//! ip_method = "manual"
//! manual_ip = "192.168.1.2"
//! dns = "8.8.8.8"
//! gateway = "192.168.1.1"
//! subnet = "255.255.255.0"
//! continuity_factors = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
//!
//! [[joint_characteristics]]
//! effort_correction = 1.0
//! # ...
//! ```

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use trossen_protocol::{
    AlgorithmParameter, EndEffector, IpMethod, JointCharacteristic, JointLimit, MotorParameter,
};

/// 当前文档格式版本
pub const CONFIGURATION_VERSION: u32 = 1;

/// 控制器配置文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDocument {
    /// 文档格式版本
    pub version: u32,
    pub factory_reset_flag: bool,
    pub ip_method: IpMethod,
    pub manual_ip: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub subnet: Ipv4Addr,
    pub joint_characteristics: Vec<JointCharacteristic>,
    pub end_effector: EndEffector,
    pub continuity_factors: Vec<f64>,
    pub joint_limits: Vec<JointLimit>,
    pub motor_parameters: Vec<MotorParameter>,
    pub algorithm_parameter: AlgorithmParameter,
}

impl ConfigurationDocument {
    /// 检查关节相关字段的长度
    pub fn validate(&self, num_joints: usize) -> Result<()> {
        if self.version != CONFIGURATION_VERSION {
            anyhow::bail!("不支持的配置文档版本: {}", self.version);
        }
        let lengths = [
            ("joint_characteristics", self.joint_characteristics.len()),
            ("continuity_factors", self.continuity_factors.len()),
            ("joint_limits", self.joint_limits.len()),
            ("motor_parameters", self.motor_parameters.len()),
        ];
        for (field, len) in lengths {
            if len != num_joints {
                anyhow::bail!("{} 长度为 {}，期望 {}（关节数）", field, len, num_joints);
            }
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置文档失败")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: Self = toml::from_str(content).context("解析配置文档失败")?;
        if document.version != CONFIGURATION_VERSION {
            anyhow::bail!("不支持的配置文档版本: {}", document.version);
        }
        Ok(document)
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("写入配置文件失败: {}", path.as_ref().display()))?;
        Ok(())
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("读取配置文件失败: {}", path.as_ref().display()))?;
        Self::from_toml_str(&content)
    }
}
