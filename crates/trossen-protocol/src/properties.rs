//! 配置结构体：质量属性、关节特性、限位、PID 与算法参数
//!
//! 这些结构体在线上都是定长的 `f32` 序列，通过 [`Record`] 统一编解码。

use crate::constants::*;
use crate::{get_real, put_real};
use bytes::{Buf, BufMut};

/// 定长线上记录
pub(crate) trait Record: Sized {
    /// 线上字节数
    const SIZE: usize;

    fn write(&self, buf: &mut impl BufMut);

    /// 调用方保证 `buf` 至少有 `SIZE` 字节
    fn read(buf: &mut impl Buf) -> Self;
}

fn put_reals(buf: &mut impl BufMut, values: &[f64]) {
    for &value in values {
        put_real(buf, value);
    }
}

fn get_reals<const N: usize>(buf: &mut impl Buf) -> [f64; N] {
    let mut values = [0.0; N];
    for value in values.iter_mut() {
        *value = get_real(buf);
    }
    values
}

/// 连杆质量属性
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    /// 质量（kg）
    pub mass: f64,
    /// 相对质心坐标系的惯量矩阵（kg·m²，行优先 3×3）
    pub inertia: [f64; 9],
    /// 质心坐标系相对连杆坐标系的位置（m）
    pub origin_xyz: [f64; 3],
    /// 质心坐标系相对连杆坐标系的姿态（rad）
    pub origin_rpy: [f64; 3],
}

impl Record for Link {
    const SIZE: usize = LINK_SIZE;

    fn write(&self, buf: &mut impl BufMut) {
        put_real(buf, self.mass);
        put_reals(buf, &self.inertia);
        put_reals(buf, &self.origin_xyz);
        put_reals(buf, &self.origin_rpy);
    }

    fn read(buf: &mut impl Buf) -> Self {
        Self {
            mass: get_real(buf),
            inertia: get_reals(buf),
            origin_xyz: get_reals(buf),
            origin_rpy: get_reals(buf),
        }
    }
}

/// 末端执行器质量属性
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndEffector {
    pub palm: Link,
    pub finger_left: Link,
    pub finger_right: Link,
    /// home 位姿下掌心到左滑块中心的偏移（m）
    pub offset_finger_left: f64,
    /// home 位姿下掌心到右滑块中心的偏移（m）
    pub offset_finger_right: f64,
    /// 夹爪力限缩放系数，立即生效，断电后恢复默认
    pub t_max_factor: f64,
}

impl Record for EndEffector {
    const SIZE: usize = END_EFFECTOR_SIZE;

    fn write(&self, buf: &mut impl BufMut) {
        self.palm.write(buf);
        self.finger_left.write(buf);
        self.finger_right.write(buf);
        put_real(buf, self.offset_finger_left);
        put_real(buf, self.offset_finger_right);
        put_real(buf, self.t_max_factor);
    }

    fn read(buf: &mut impl Buf) -> Self {
        Self {
            palm: Link::read(buf),
            finger_left: Link::read(buf),
            finger_right: Link::read(buf),
            offset_finger_left: get_real(buf),
            offset_finger_right: get_real(buf),
            t_max_factor: get_real(buf),
        }
    }
}

/// 关节特性（持久化在控制器中）
///
/// - `effort_correction`：电机力矩单位与 Nm/N 的映射系数，范围 [0.2, 5.0]
/// - `friction_transition_velocity`：静摩擦到动摩擦的过渡速度，必须 > 0
/// - 其余三项为摩擦模型系数：常数项、库仑系数、粘滞系数
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointCharacteristic {
    pub effort_correction: f64,
    pub friction_transition_velocity: f64,
    pub friction_constant_term: f64,
    pub friction_coulomb_coef: f64,
    pub friction_viscous_coef: f64,
}

impl Default for JointCharacteristic {
    fn default() -> Self {
        Self {
            effort_correction: 1.0,
            friction_transition_velocity: 0.1,
            friction_constant_term: 0.0,
            friction_coulomb_coef: 0.0,
            friction_viscous_coef: 0.0,
        }
    }
}

impl Record for JointCharacteristic {
    const SIZE: usize = JOINT_CHARACTERISTIC_SIZE;

    fn write(&self, buf: &mut impl BufMut) {
        put_reals(
            buf,
            &[
                self.effort_correction,
                self.friction_transition_velocity,
                self.friction_constant_term,
                self.friction_coulomb_coef,
                self.friction_viscous_coef,
            ],
        );
    }

    fn read(buf: &mut impl Buf) -> Self {
        let [a, b, c, d, e] = get_reals::<5>(buf);
        Self {
            effort_correction: a,
            friction_transition_velocity: b,
            friction_constant_term: c,
            friction_coulomb_coef: d,
            friction_viscous_coef: e,
        }
    }
}

/// 关节限位
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointLimit {
    pub position_min: f64,
    pub position_max: f64,
    pub position_tolerance: f64,
    pub velocity_max: f64,
    pub velocity_tolerance: f64,
    pub effort_max: f64,
    pub effort_tolerance: f64,
}

impl Record for JointLimit {
    const SIZE: usize = JOINT_LIMIT_SIZE;

    fn write(&self, buf: &mut impl BufMut) {
        put_reals(
            buf,
            &[
                self.position_min,
                self.position_max,
                self.position_tolerance,
                self.velocity_max,
                self.velocity_tolerance,
                self.effort_max,
                self.effort_tolerance,
            ],
        );
    }

    fn read(buf: &mut impl Buf) -> Self {
        let [a, b, c, d, e, f, g] = get_reals::<7>(buf);
        Self {
            position_min: a,
            position_max: b,
            position_tolerance: c,
            velocity_max: d,
            velocity_tolerance: e,
            effort_max: f,
            effort_tolerance: g,
        }
    }
}

/// PID 参数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidParameter {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// 积分限幅
    pub imax: f64,
}

/// 电机参数：位置环与速度环
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorParameter {
    pub position: PidParameter,
    pub velocity: PidParameter,
}

impl Record for MotorParameter {
    const SIZE: usize = MOTOR_PARAMETER_SIZE;

    fn write(&self, buf: &mut impl BufMut) {
        for pid in [&self.position, &self.velocity] {
            put_reals(buf, &[pid.kp, pid.ki, pid.kd, pid.imax]);
        }
    }

    fn read(buf: &mut impl Buf) -> Self {
        let mut read_pid = || {
            let [kp, ki, kd, imax] = get_reals::<4>(buf);
            PidParameter { kp, ki, kd, imax }
        };
        let position = read_pid();
        let velocity = read_pid();
        Self { position, velocity }
    }
}

/// 算法参数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmParameter {
    /// 奇异位形判定阈值
    pub singularity_threshold: f64,
}

impl Record for AlgorithmParameter {
    const SIZE: usize = ALGORITHM_PARAMETER_SIZE;

    fn write(&self, buf: &mut impl BufMut) {
        put_real(buf, self.singularity_threshold);
    }

    fn read(buf: &mut impl Buf) -> Self {
        Self {
            singularity_threshold: get_real(buf),
        }
    }
}
