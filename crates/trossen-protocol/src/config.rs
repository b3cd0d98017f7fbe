//! 配置项的值编码/解码
//!
//! 每个 [`ConfigurationAddress`] 对应一种定长负载。关节相关的配置项长度与
//! 关节数成正比，因此解码时需要传入关节数。
//!
//! `Modes` 是唯一读写不对称的配置项：读取返回所有关节的模式，写入每次只
//! 设置一个关节 `[joint_index, mode]`。

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::properties::Record;
use crate::types::*;
use crate::{
    AlgorithmParameter, EndEffector, JointCharacteristic, JointLimit, MotorParameter,
    ProtocolError, REAL_SIZE, decode_enum, ensure_len, get_real, put_real,
};

/// 配置项的值
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationValue {
    /// 下次启动时是否恢复出厂配置
    FactoryResetFlag(bool),
    IpMethod(IpMethod),
    ManualIp(Ipv4Addr),
    Dns(Ipv4Addr),
    Gateway(Ipv4Addr),
    Subnet(Ipv4Addr),
    JointCharacteristics(Vec<JointCharacteristic>),
    ErrorState(ErrorState),
    /// 读取：所有关节的模式
    Modes(Vec<Mode>),
    /// 写入：单个关节的模式
    JointMode { joint_index: u8, mode: Mode },
    EndEffector(EndEffector),
    /// 每个关节的连续性阈值缩放系数
    ContinuityFactors(Vec<f64>),
    JointLimits(Vec<JointLimit>),
    MotorParameters(Vec<MotorParameter>),
    AlgorithmParameter(AlgorithmParameter),
}

impl ConfigurationValue {
    pub fn address(&self) -> ConfigurationAddress {
        match self {
            ConfigurationValue::FactoryResetFlag(_) => ConfigurationAddress::FactoryResetFlag,
            ConfigurationValue::IpMethod(_) => ConfigurationAddress::IpMethod,
            ConfigurationValue::ManualIp(_) => ConfigurationAddress::ManualIp,
            ConfigurationValue::Dns(_) => ConfigurationAddress::Dns,
            ConfigurationValue::Gateway(_) => ConfigurationAddress::Gateway,
            ConfigurationValue::Subnet(_) => ConfigurationAddress::Subnet,
            ConfigurationValue::JointCharacteristics(_) => {
                ConfigurationAddress::JointCharacteristics
            }
            ConfigurationValue::ErrorState(_) => ConfigurationAddress::ErrorState,
            ConfigurationValue::Modes(_) | ConfigurationValue::JointMode { .. } => {
                ConfigurationAddress::Modes
            }
            ConfigurationValue::EndEffector(_) => ConfigurationAddress::EndEffector,
            ConfigurationValue::ContinuityFactors(_) => ConfigurationAddress::ContinuityFactors,
            ConfigurationValue::JointLimits(_) => ConfigurationAddress::JointLimits,
            ConfigurationValue::MotorParameters(_) => ConfigurationAddress::MotorParameters,
            ConfigurationValue::AlgorithmParameter(_) => ConfigurationAddress::AlgorithmParameter,
        }
    }

    /// 编码值（不含地址字节）
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            ConfigurationValue::FactoryResetFlag(flag) => buf.put_u8(u8::from(*flag)),
            ConfigurationValue::IpMethod(method) => buf.put_u8((*method).into()),
            ConfigurationValue::ManualIp(ip)
            | ConfigurationValue::Dns(ip)
            | ConfigurationValue::Gateway(ip)
            | ConfigurationValue::Subnet(ip) => buf.put_slice(&ip.octets()),
            ConfigurationValue::JointCharacteristics(values) => write_records(&mut buf, values),
            ConfigurationValue::ErrorState(state) => buf.put_u8((*state).into()),
            ConfigurationValue::Modes(modes) => {
                for &mode in modes {
                    buf.put_u8(mode.into());
                }
            }
            ConfigurationValue::JointMode { joint_index, mode } => {
                buf.put_u8(*joint_index);
                buf.put_u8((*mode).into());
            }
            ConfigurationValue::EndEffector(end_effector) => end_effector.write(&mut buf),
            ConfigurationValue::ContinuityFactors(factors) => {
                for &factor in factors {
                    put_real(&mut buf, factor);
                }
            }
            ConfigurationValue::JointLimits(values) => write_records(&mut buf, values),
            ConfigurationValue::MotorParameters(values) => write_records(&mut buf, values),
            ConfigurationValue::AlgorithmParameter(parameter) => parameter.write(&mut buf),
        }
        buf.freeze()
    }

    /// 解码读取到的值
    ///
    /// `Modes` 解码为所有关节的模式列表。
    pub fn decode(
        address: ConfigurationAddress,
        payload: &[u8],
        num_joints: usize,
    ) -> Result<Self, ProtocolError> {
        let mut buf = payload;
        let value = match address {
            ConfigurationAddress::FactoryResetFlag => {
                ensure_len(&buf, 1)?;
                ConfigurationValue::FactoryResetFlag(decode_flag(buf.get_u8())?)
            }
            ConfigurationAddress::IpMethod => {
                ensure_len(&buf, 1)?;
                ConfigurationValue::IpMethod(decode_enum("IpMethod", buf.get_u8())?)
            }
            ConfigurationAddress::ManualIp => ConfigurationValue::ManualIp(decode_ip(buf)?),
            ConfigurationAddress::Dns => ConfigurationValue::Dns(decode_ip(buf)?),
            ConfigurationAddress::Gateway => ConfigurationValue::Gateway(decode_ip(buf)?),
            ConfigurationAddress::Subnet => ConfigurationValue::Subnet(decode_ip(buf)?),
            ConfigurationAddress::JointCharacteristics => {
                ConfigurationValue::JointCharacteristics(read_records(buf, num_joints)?)
            }
            ConfigurationAddress::ErrorState => {
                ensure_len(&buf, 1)?;
                ConfigurationValue::ErrorState(decode_enum("ErrorState", buf.get_u8())?)
            }
            ConfigurationAddress::Modes => {
                ensure_len(&buf, num_joints)?;
                let modes = buf
                    .iter()
                    .map(|&byte| decode_enum("Mode", byte))
                    .collect::<Result<Vec<Mode>, _>>()?;
                ConfigurationValue::Modes(modes)
            }
            ConfigurationAddress::EndEffector => {
                ensure_len(&buf, EndEffector::SIZE)?;
                ConfigurationValue::EndEffector(EndEffector::read(&mut buf))
            }
            ConfigurationAddress::ContinuityFactors => {
                ensure_len(&buf, num_joints * REAL_SIZE)?;
                let factors = (0..num_joints).map(|_| get_real(&mut buf)).collect();
                ConfigurationValue::ContinuityFactors(factors)
            }
            ConfigurationAddress::JointLimits => {
                ConfigurationValue::JointLimits(read_records(buf, num_joints)?)
            }
            ConfigurationAddress::MotorParameters => {
                ConfigurationValue::MotorParameters(read_records(buf, num_joints)?)
            }
            ConfigurationAddress::AlgorithmParameter => {
                ensure_len(&buf, AlgorithmParameter::SIZE)?;
                ConfigurationValue::AlgorithmParameter(AlgorithmParameter::read(&mut buf))
            }
        };
        Ok(value)
    }

    /// 解码写入请求中的值（控制器侧 / 测试用）
    ///
    /// 与 [`decode`](Self::decode) 的区别仅在于 `Modes` 解码为单关节写入。
    pub fn decode_write(
        address: ConfigurationAddress,
        payload: &[u8],
        num_joints: usize,
    ) -> Result<Self, ProtocolError> {
        if address != ConfigurationAddress::Modes {
            return Self::decode(address, payload, num_joints);
        }
        let mut buf = payload;
        ensure_len(&buf, 2)?;
        let joint_index = buf.get_u8();
        let mode = decode_enum("Mode", buf.get_u8())?;
        Ok(ConfigurationValue::JointMode { joint_index, mode })
    }
}

fn decode_flag(byte: u8) -> Result<bool, ProtocolError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(ProtocolError::InvalidValue {
            field: "FactoryResetFlag".to_string(),
            value,
        }),
    }
}

fn decode_ip(mut buf: &[u8]) -> Result<Ipv4Addr, ProtocolError> {
    ensure_len(&buf, 4)?;
    let mut octets = [0u8; 4];
    buf.copy_to_slice(&mut octets);
    Ok(Ipv4Addr::from(octets))
}

fn write_records<R: Record>(buf: &mut BytesMut, records: &[R]) {
    for record in records {
        record.write(buf);
    }
}

fn read_records<R: Record>(mut buf: &[u8], num_joints: usize) -> Result<Vec<R>, ProtocolError> {
    ensure_len(&buf, num_joints * R::SIZE)?;
    Ok((0..num_joints).map(|_| R::read(&mut buf)).collect())
}
