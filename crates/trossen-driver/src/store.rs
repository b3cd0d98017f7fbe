//! 配置项读写代理
//!
//! 每个读取都是一次新的往返（不缓存）；每个写入返回 [`ConfigEffect`]，
//! 网络相关字段与出厂重置标志需要控制器重新上电才生效。
//!
//! 配置写入在故障状态下仍然允许（清除错误本身就是一次配置写入）。

use std::net::Ipv4Addr;
use std::path::Path;

use tracing::info;
use trossen_protocol::{
    AlgorithmParameter, ConfigEffect, ConfigurationAddress, ConfigurationValue, EndEffector,
    ErrorState, IpMethod, JointCharacteristic, JointLimit, MotorParameter,
};
use trossen_tools::{CONFIGURATION_VERSION, ConfigurationDocument};

use crate::session::expect_value;
use crate::validation::{self, JointScope};
use crate::{DriverError, TrossenArmDriver};

/// 对关节特性逐项读-改-写时使用的字段访问器
type CharacteristicField = fn(&mut JointCharacteristic) -> &mut f64;

impl TrossenArmDriver {
    fn read_value(&mut self, address: ConfigurationAddress) -> Result<ConfigurationValue, DriverError> {
        self.session_mut()?.get_configuration(address)
    }

    fn write_value(&mut self, value: ConfigurationValue) -> Result<ConfigEffect, DriverError> {
        self.session_mut()?.set_configuration(value)
    }

    fn check_joint_count(&self, actual: usize) -> Result<(), DriverError> {
        validation::check_len(JointScope::All, self.get_num_joints()?, actual)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // 网络与出厂重置（重新上电后生效）
    // ------------------------------------------------------------------

    pub fn get_factory_reset_flag(&mut self) -> Result<bool, DriverError> {
        let value = self.read_value(ConfigurationAddress::FactoryResetFlag)?;
        expect_value!(value, FactoryResetFlag)
    }

    pub fn set_factory_reset_flag(&mut self, flag: bool) -> Result<ConfigEffect, DriverError> {
        self.write_value(ConfigurationValue::FactoryResetFlag(flag))
    }

    pub fn get_ip_method(&mut self) -> Result<IpMethod, DriverError> {
        let value = self.read_value(ConfigurationAddress::IpMethod)?;
        expect_value!(value, IpMethod)
    }

    pub fn set_ip_method(&mut self, method: IpMethod) -> Result<ConfigEffect, DriverError> {
        self.write_value(ConfigurationValue::IpMethod(method))
    }

    pub fn get_manual_ip(&mut self) -> Result<Ipv4Addr, DriverError> {
        let value = self.read_value(ConfigurationAddress::ManualIp)?;
        expect_value!(value, ManualIp)
    }

    pub fn set_manual_ip(&mut self, ip: Ipv4Addr) -> Result<ConfigEffect, DriverError> {
        self.write_value(ConfigurationValue::ManualIp(ip))
    }

    pub fn get_dns(&mut self) -> Result<Ipv4Addr, DriverError> {
        let value = self.read_value(ConfigurationAddress::Dns)?;
        expect_value!(value, Dns)
    }

    pub fn set_dns(&mut self, dns: Ipv4Addr) -> Result<ConfigEffect, DriverError> {
        self.write_value(ConfigurationValue::Dns(dns))
    }

    pub fn get_gateway(&mut self) -> Result<Ipv4Addr, DriverError> {
        let value = self.read_value(ConfigurationAddress::Gateway)?;
        expect_value!(value, Gateway)
    }

    pub fn set_gateway(&mut self, gateway: Ipv4Addr) -> Result<ConfigEffect, DriverError> {
        self.write_value(ConfigurationValue::Gateway(gateway))
    }

    pub fn get_subnet(&mut self) -> Result<Ipv4Addr, DriverError> {
        let value = self.read_value(ConfigurationAddress::Subnet)?;
        expect_value!(value, Subnet)
    }

    pub fn set_subnet(&mut self, subnet: Ipv4Addr) -> Result<ConfigEffect, DriverError> {
        self.write_value(ConfigurationValue::Subnet(subnet))
    }

    // ------------------------------------------------------------------
    // 关节特性
    // ------------------------------------------------------------------

    pub fn get_joint_characteristics(&mut self) -> Result<Vec<JointCharacteristic>, DriverError> {
        let value = self.read_value(ConfigurationAddress::JointCharacteristics)?;
        expect_value!(value, JointCharacteristics)
    }

    /// 写入关节特性，力矩修正系数与摩擦过渡速度在本地校验
    pub fn set_joint_characteristics(
        &mut self,
        characteristics: &[JointCharacteristic],
    ) -> Result<ConfigEffect, DriverError> {
        self.check_joint_count(characteristics.len())?;
        validation::check_joint_characteristics(characteristics)?;
        self.write_value(ConfigurationValue::JointCharacteristics(
            characteristics.to_vec(),
        ))
    }

    fn get_characteristic(
        &mut self,
        field: CharacteristicField,
    ) -> Result<Vec<f64>, DriverError> {
        Ok(self
            .get_joint_characteristics()?
            .iter_mut()
            .map(|c| *field(c))
            .collect())
    }

    /// 读-改-写单个字段，其余字段保持控制器当前值
    fn set_characteristic(
        &mut self,
        field: CharacteristicField,
        values: &[f64],
    ) -> Result<ConfigEffect, DriverError> {
        self.check_joint_count(values.len())?;
        let mut characteristics = self.get_joint_characteristics()?;
        for (c, &value) in characteristics.iter_mut().zip(values) {
            *field(c) = value;
        }
        self.set_joint_characteristics(&characteristics)
    }

    pub fn get_effort_corrections(&mut self) -> Result<Vec<f64>, DriverError> {
        self.get_characteristic(|c| &mut c.effort_correction)
    }

    /// 设置力矩修正系数，每个值必须在 [0.2, 5.0] 内
    pub fn set_effort_corrections(&mut self, values: &[f64]) -> Result<ConfigEffect, DriverError> {
        self.check_joint_count(values.len())?;
        validation::check_effort_corrections(values)?;
        self.set_characteristic(|c| &mut c.effort_correction, values)
    }

    pub fn get_friction_transition_velocities(&mut self) -> Result<Vec<f64>, DriverError> {
        self.get_characteristic(|c| &mut c.friction_transition_velocity)
    }

    pub fn set_friction_transition_velocities(
        &mut self,
        values: &[f64],
    ) -> Result<ConfigEffect, DriverError> {
        self.set_characteristic(|c| &mut c.friction_transition_velocity, values)
    }

    pub fn get_friction_constant_terms(&mut self) -> Result<Vec<f64>, DriverError> {
        self.get_characteristic(|c| &mut c.friction_constant_term)
    }

    pub fn set_friction_constant_terms(&mut self, values: &[f64]) -> Result<ConfigEffect, DriverError> {
        self.set_characteristic(|c| &mut c.friction_constant_term, values)
    }

    pub fn get_friction_coulomb_coefs(&mut self) -> Result<Vec<f64>, DriverError> {
        self.get_characteristic(|c| &mut c.friction_coulomb_coef)
    }

    pub fn set_friction_coulomb_coefs(&mut self, values: &[f64]) -> Result<ConfigEffect, DriverError> {
        self.set_characteristic(|c| &mut c.friction_coulomb_coef, values)
    }

    pub fn get_friction_viscous_coefs(&mut self) -> Result<Vec<f64>, DriverError> {
        self.get_characteristic(|c| &mut c.friction_viscous_coef)
    }

    pub fn set_friction_viscous_coefs(&mut self, values: &[f64]) -> Result<ConfigEffect, DriverError> {
        self.set_characteristic(|c| &mut c.friction_viscous_coef, values)
    }

    // ------------------------------------------------------------------
    // 末端执行器
    // ------------------------------------------------------------------

    pub fn get_end_effector(&mut self) -> Result<EndEffector, DriverError> {
        let value = self.read_value(ConfigurationAddress::EndEffector)?;
        expect_value!(value, EndEffector)
    }

    pub fn set_end_effector(&mut self, end_effector: EndEffector) -> Result<ConfigEffect, DriverError> {
        validation::check_end_effector(&end_effector)?;
        self.write_value(ConfigurationValue::EndEffector(end_effector))
    }

    /// 夹爪力矩上限缩放系数（末端执行器的 `t_max_factor`）
    pub fn get_gripper_force_limit_scaling_factor(&mut self) -> Result<f64, DriverError> {
        Ok(self.get_end_effector()?.t_max_factor)
    }

    pub fn set_gripper_force_limit_scaling_factor(
        &mut self,
        factor: f64,
    ) -> Result<ConfigEffect, DriverError> {
        validation::check_force_limit_factor(factor)?;
        let mut end_effector = self.get_end_effector()?;
        end_effector.t_max_factor = factor;
        self.set_end_effector(end_effector)
    }

    // ------------------------------------------------------------------
    // 连续性、限位、电机与算法参数
    // ------------------------------------------------------------------

    pub fn get_continuity_factors(&mut self) -> Result<Vec<f64>, DriverError> {
        let value = self.read_value(ConfigurationAddress::ContinuityFactors)?;
        expect_value!(value, ContinuityFactors)
    }

    /// 每个系数必须为正
    pub fn set_continuity_factors(&mut self, factors: &[f64]) -> Result<ConfigEffect, DriverError> {
        self.check_joint_count(factors.len())?;
        validation::check_continuity_factors(factors)?;
        self.write_value(ConfigurationValue::ContinuityFactors(factors.to_vec()))
    }

    pub fn get_joint_limits(&mut self) -> Result<Vec<JointLimit>, DriverError> {
        let value = self.read_value(ConfigurationAddress::JointLimits)?;
        expect_value!(value, JointLimits)
    }

    pub fn set_joint_limits(&mut self, limits: &[JointLimit]) -> Result<ConfigEffect, DriverError> {
        self.check_joint_count(limits.len())?;
        validation::check_joint_limits(limits)?;
        self.write_value(ConfigurationValue::JointLimits(limits.to_vec()))
    }

    pub fn get_motor_parameters(&mut self) -> Result<Vec<MotorParameter>, DriverError> {
        let value = self.read_value(ConfigurationAddress::MotorParameters)?;
        expect_value!(value, MotorParameters)
    }

    pub fn set_motor_parameters(
        &mut self,
        parameters: &[MotorParameter],
    ) -> Result<ConfigEffect, DriverError> {
        self.check_joint_count(parameters.len())?;
        validation::check_motor_parameters(parameters)?;
        self.write_value(ConfigurationValue::MotorParameters(parameters.to_vec()))
    }

    pub fn get_algorithm_parameter(&mut self) -> Result<AlgorithmParameter, DriverError> {
        let value = self.read_value(ConfigurationAddress::AlgorithmParameter)?;
        expect_value!(value, AlgorithmParameter)
    }

    pub fn set_algorithm_parameter(
        &mut self,
        parameter: AlgorithmParameter,
    ) -> Result<ConfigEffect, DriverError> {
        validation::check_algorithm_parameter(&parameter)?;
        self.write_value(ConfigurationValue::AlgorithmParameter(parameter))
    }

    /// 控制器当前错误状态（新的往返，不使用本地锁存）
    pub fn get_error_state(&mut self) -> Result<ErrorState, DriverError> {
        self.session_mut()?.read_error_state()
    }

    // ------------------------------------------------------------------
    // 配置文档
    // ------------------------------------------------------------------

    /// 读取所有可持久化配置项
    pub fn snapshot_configuration(&mut self) -> Result<ConfigurationDocument, DriverError> {
        Ok(ConfigurationDocument {
            version: CONFIGURATION_VERSION,
            factory_reset_flag: self.get_factory_reset_flag()?,
            ip_method: self.get_ip_method()?,
            manual_ip: self.get_manual_ip()?,
            dns: self.get_dns()?,
            gateway: self.get_gateway()?,
            subnet: self.get_subnet()?,
            joint_characteristics: self.get_joint_characteristics()?,
            end_effector: self.get_end_effector()?,
            continuity_factors: self.get_continuity_factors()?,
            joint_limits: self.get_joint_limits()?,
            motor_parameters: self.get_motor_parameters()?,
            algorithm_parameter: self.get_algorithm_parameter()?,
        })
    }

    /// 写入文档中的所有配置项
    ///
    /// 先整体校验，再逐项写入；任何一项校验失败都不会产生数据报。
    /// 写入中途失败（通信或控制器拒绝）时已写入的项不会回滚。
    pub fn apply_configuration(&mut self, document: &ConfigurationDocument) -> Result<(), DriverError> {
        document.validate(self.get_num_joints()?)?;
        validation::check_joint_characteristics(&document.joint_characteristics)?;
        validation::check_end_effector(&document.end_effector)?;
        validation::check_continuity_factors(&document.continuity_factors)?;
        validation::check_joint_limits(&document.joint_limits)?;
        validation::check_motor_parameters(&document.motor_parameters)?;
        validation::check_algorithm_parameter(&document.algorithm_parameter)?;

        self.set_factory_reset_flag(document.factory_reset_flag)?;
        self.set_ip_method(document.ip_method)?;
        self.set_manual_ip(document.manual_ip)?;
        self.set_dns(document.dns)?;
        self.set_gateway(document.gateway)?;
        self.set_subnet(document.subnet)?;
        self.set_joint_characteristics(&document.joint_characteristics)?;
        self.set_end_effector(document.end_effector)?;
        self.set_continuity_factors(&document.continuity_factors)?;
        self.set_joint_limits(&document.joint_limits)?;
        self.set_motor_parameters(&document.motor_parameters)?;
        self.set_algorithm_parameter(document.algorithm_parameter)?;
        Ok(())
    }

    /// 读取当前配置并保存为 TOML
    pub fn save_configs_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DriverError> {
        let document = self.snapshot_configuration()?;
        document.save(path.as_ref())?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// 从 TOML 加载配置并写入控制器
    pub fn load_configs_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DriverError> {
        let document = ConfigurationDocument::load(path.as_ref())?;
        self.apply_configuration(&document)?;
        info!("Configuration loaded from {}", path.as_ref().display());
        Ok(())
    }
}
