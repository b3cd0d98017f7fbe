//! 模式与输入校验
//!
//! 纯函数，不做任何 IO。所有检查都在发送数据报之前完成，
//! 任意一项失败即整条指令被拒绝，不会部分下发。

use std::ops::Range;

use thiserror::Error;
use trossen_protocol::{
    AlgorithmParameter, EFFORT_CORRECTION_MAX, EFFORT_CORRECTION_MIN, EndEffector,
    JointCharacteristic, JointInput, JointLimit, Link, Mode, MotorParameter, PidParameter,
};

use crate::JointVec;

/// 本地校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{what}: expected {expected} values, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Mode mismatch on joint {joint}: configured {configured:?}, command requires {commanded:?}")]
    ModeMismatch {
        joint: usize,
        configured: Mode,
        commanded: Mode,
    },

    #[error("Goal time must be finite and positive, got {0}")]
    InvalidGoalTime(f64),

    #[error("{field} of joint {joint} is not finite: {value}")]
    NotFinite {
        field: &'static str,
        joint: usize,
        value: f64,
    },

    #[error("{field} of joint {joint} out of range: {value} (allowed [{min}, {max}])")]
    OutOfRange {
        field: &'static str,
        joint: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} of joint {joint} must be positive, got {value}")]
    NotPositive {
        field: &'static str,
        joint: usize,
        value: f64,
    },

    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidParameter { field: &'static str, value: f64 },

    #[error("Joint index {index} out of range ({num_joints} joints)")]
    InvalidJoint { index: usize, num_joints: usize },
}

/// 指令作用的关节范围
///
/// 最后一个关节为夹爪，其余为臂关节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointScope {
    All,
    Arm,
    Gripper,
}

impl JointScope {
    pub fn range(self, num_joints: usize) -> Range<usize> {
        let gripper = num_joints.saturating_sub(1);
        match self {
            JointScope::All => 0..num_joints,
            JointScope::Arm => 0..gripper,
            JointScope::Gripper => gripper..num_joints,
        }
    }

    pub fn len(self, num_joints: usize) -> usize {
        self.range(num_joints).len()
    }

    fn label(self) -> &'static str {
        match self {
            JointScope::All => "all joints",
            JointScope::Arm => "arm joints",
            JointScope::Gripper => "gripper",
        }
    }
}

/// 检查向量长度是否等于作用范围内的关节数
pub fn check_len(
    scope: JointScope,
    num_joints: usize,
    actual: usize,
) -> Result<(), ValidationError> {
    let expected = scope.len(num_joints);
    if actual != expected {
        return Err(ValidationError::LengthMismatch {
            what: scope.label(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// 可选的前馈项若给出，长度必须与作用范围一致
pub fn check_feedforward(
    scope: JointScope,
    num_joints: usize,
    what: &'static str,
    values: Option<&[f64]>,
) -> Result<(), ValidationError> {
    let Some(values) = values else {
        return Ok(());
    };
    let expected = scope.len(num_joints);
    if values.len() != expected {
        return Err(ValidationError::LengthMismatch {
            what,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

/// 检查作用范围内每个关节的配置模式都等于 `commanded`
pub fn check_scope_mode(
    modes: &[Mode],
    scope: JointScope,
    commanded: Mode,
) -> Result<(), ValidationError> {
    for joint in scope.range(modes.len()) {
        if modes[joint] != commanded {
            return Err(ValidationError::ModeMismatch {
                joint,
                configured: modes[joint],
                commanded,
            });
        }
    }
    Ok(())
}

/// 检查完整指令的每个变体与对应关节的配置模式一致
pub fn check_inputs(modes: &[Mode], inputs: &[JointInput]) -> Result<(), ValidationError> {
    check_len(JointScope::All, modes.len(), inputs.len())?;
    for (joint, (input, &configured)) in inputs.iter().zip(modes).enumerate() {
        if input.mode() != configured {
            return Err(ValidationError::ModeMismatch {
                joint,
                configured,
                commanded: input.mode(),
            });
        }
    }
    check_inputs_finite(inputs)
}

fn check_inputs_finite(inputs: &[JointInput]) -> Result<(), ValidationError> {
    for (joint, input) in inputs.iter().enumerate() {
        match *input {
            JointInput::Idle => {}
            JointInput::Position {
                position,
                feedforward_velocity,
                feedforward_acceleration,
            } => {
                check_finite("position", joint, position)?;
                check_finite("feedforward velocity", joint, feedforward_velocity)?;
                check_finite("feedforward acceleration", joint, feedforward_acceleration)?;
            }
            JointInput::Velocity {
                velocity,
                feedforward_acceleration,
            } => {
                check_finite("velocity", joint, velocity)?;
                check_finite("feedforward acceleration", joint, feedforward_acceleration)?;
            }
            JointInput::ExternalEffort { effort } | JointInput::Effort { effort } => {
                check_finite("effort", joint, effort)?;
            }
        }
    }
    Ok(())
}

fn check_finite(field: &'static str, joint: usize, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, joint, value });
    }
    Ok(())
}

/// 检查一组数值均为有限值
pub fn check_values_finite(field: &'static str, values: &[f64]) -> Result<(), ValidationError> {
    for (joint, &value) in values.iter().enumerate() {
        check_finite(field, joint, value)?;
    }
    Ok(())
}

/// 检查轨迹时长与可选的终端速度/加速度
pub fn check_move(
    goal_time: f64,
    positions: usize,
    velocities: Option<&[f64]>,
    accelerations: Option<&[f64]>,
) -> Result<(), ValidationError> {
    if !goal_time.is_finite() || goal_time <= 0.0 {
        return Err(ValidationError::InvalidGoalTime(goal_time));
    }
    for (what, values) in [
        ("goal velocities", velocities),
        ("goal accelerations", accelerations),
    ] {
        if let Some(values) = values {
            if values.len() != positions {
                return Err(ValidationError::LengthMismatch {
                    what,
                    expected: positions,
                    actual: values.len(),
                });
            }
            check_values_finite(what, values)?;
        }
    }
    Ok(())
}

/// 检查关节索引
pub fn check_joint(index: usize, num_joints: usize) -> Result<(), ValidationError> {
    if index >= num_joints {
        return Err(ValidationError::InvalidJoint { index, num_joints });
    }
    Ok(())
}

/// 检查力矩修正系数范围 [0.2, 5.0]
pub fn check_effort_corrections(values: &[f64]) -> Result<(), ValidationError> {
    for (joint, &value) in values.iter().enumerate() {
        check_finite("effort correction", joint, value)?;
        if !(EFFORT_CORRECTION_MIN..=EFFORT_CORRECTION_MAX).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "effort correction",
                joint,
                value,
                min: EFFORT_CORRECTION_MIN,
                max: EFFORT_CORRECTION_MAX,
            });
        }
    }
    Ok(())
}

/// 检查关节特性
pub fn check_joint_characteristics(
    characteristics: &[JointCharacteristic],
) -> Result<(), ValidationError> {
    let corrections: JointVec<f64> = characteristics
        .iter()
        .map(|c| c.effort_correction)
        .collect();
    check_effort_corrections(&corrections)?;

    for (joint, c) in characteristics.iter().enumerate() {
        check_finite(
            "friction transition velocity",
            joint,
            c.friction_transition_velocity,
        )?;
        if c.friction_transition_velocity <= 0.0 {
            return Err(ValidationError::NotPositive {
                field: "friction transition velocity",
                joint,
                value: c.friction_transition_velocity,
            });
        }
        check_finite("friction constant term", joint, c.friction_constant_term)?;
        check_finite("friction coulomb coef", joint, c.friction_coulomb_coef)?;
        check_finite("friction viscous coef", joint, c.friction_viscous_coef)?;
    }
    Ok(())
}

/// 连续性系数：有限且为正
pub fn check_continuity_factors(factors: &[f64]) -> Result<(), ValidationError> {
    check_values_finite("continuity factor", factors)?;
    if let Some((joint, &value)) = factors.iter().enumerate().find(|(_, f)| **f <= 0.0) {
        return Err(ValidationError::NotPositive {
            field: "continuity factor",
            joint,
            value,
        });
    }
    Ok(())
}

/// 夹爪力矩上限缩放系数，0 表示不出力
pub fn check_force_limit_factor(factor: f64) -> Result<(), ValidationError> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(ValidationError::InvalidParameter {
            field: "gripper force limit scaling factor",
            value: factor,
        });
    }
    Ok(())
}

fn check_parameter(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidParameter { field, value });
    }
    Ok(())
}

fn check_link(field: &'static str, link: &Link) -> Result<(), ValidationError> {
    std::iter::once(link.mass)
        .chain(link.inertia)
        .chain(link.origin_xyz)
        .chain(link.origin_rpy)
        .try_for_each(|value| check_parameter(field, value))
}

/// 末端执行器：所有质量属性有限，力矩缩放系数非负
pub fn check_end_effector(end_effector: &EndEffector) -> Result<(), ValidationError> {
    check_link("end effector palm", &end_effector.palm)?;
    check_link("end effector left finger", &end_effector.finger_left)?;
    check_link("end effector right finger", &end_effector.finger_right)?;
    check_parameter("end effector finger offset", end_effector.offset_finger_left)?;
    check_parameter("end effector finger offset", end_effector.offset_finger_right)?;
    check_force_limit_factor(end_effector.t_max_factor)
}

pub fn check_joint_limits(limits: &[JointLimit]) -> Result<(), ValidationError> {
    for (joint, limit) in limits.iter().enumerate() {
        for value in [
            limit.position_min,
            limit.position_max,
            limit.position_tolerance,
            limit.velocity_max,
            limit.velocity_tolerance,
            limit.effort_max,
            limit.effort_tolerance,
        ] {
            check_finite("joint limit", joint, value)?;
        }
    }
    Ok(())
}

pub fn check_motor_parameters(parameters: &[MotorParameter]) -> Result<(), ValidationError> {
    let gains = |pid: &PidParameter| [pid.kp, pid.ki, pid.kd, pid.imax];
    for (joint, parameter) in parameters.iter().enumerate() {
        for value in gains(&parameter.position)
            .into_iter()
            .chain(gains(&parameter.velocity))
        {
            check_finite("motor parameter", joint, value)?;
        }
    }
    Ok(())
}

pub fn check_algorithm_parameter(parameter: &AlgorithmParameter) -> Result<(), ValidationError> {
    check_parameter("singularity threshold", parameter.singularity_threshold)
}

/// 合成完整指令：作用范围内使用新输入，其余关节沿用上一次下发的输入
pub fn merge_inputs(
    held: &[JointInput],
    scope: JointScope,
    inputs: &[JointInput],
) -> JointVec<JointInput> {
    let mut merged: JointVec<JointInput> = held.iter().copied().collect();
    for (slot, input) in merged[scope.range(held.len())].iter_mut().zip(inputs) {
        *slot = *input;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 7;

    #[test]
    fn test_scope_ranges() {
        assert_eq!(JointScope::All.range(N), 0..7);
        assert_eq!(JointScope::Arm.range(N), 0..6);
        assert_eq!(JointScope::Gripper.range(N), 6..7);
        assert_eq!(JointScope::Gripper.len(N), 1);
    }

    #[test]
    fn test_check_len() {
        assert!(check_len(JointScope::Arm, N, 6).is_ok());
        assert_eq!(
            check_len(JointScope::Arm, N, 7),
            Err(ValidationError::LengthMismatch {
                what: "arm joints",
                expected: 6,
                actual: 7
            })
        );
        assert!(check_len(JointScope::All, N, 6).is_err());
    }

    #[test]
    fn test_check_scope_mode() {
        let mut modes = vec![Mode::Position; N];
        modes[6] = Mode::Effort;
        assert!(check_scope_mode(&modes, JointScope::Arm, Mode::Position).is_ok());
        assert_eq!(
            check_scope_mode(&modes, JointScope::All, Mode::Position),
            Err(ValidationError::ModeMismatch {
                joint: 6,
                configured: Mode::Effort,
                commanded: Mode::Position
            })
        );
        assert!(check_scope_mode(&modes, JointScope::Gripper, Mode::Effort).is_ok());
    }

    #[test]
    fn test_check_inputs_mode_mismatch() {
        let modes = vec![Mode::Position, Mode::Velocity];
        let inputs = [JointInput::position(0.1), JointInput::position(0.2)];
        assert_eq!(
            check_inputs(&modes, &inputs),
            Err(ValidationError::ModeMismatch {
                joint: 1,
                configured: Mode::Velocity,
                commanded: Mode::Position
            })
        );
        let inputs = [JointInput::position(0.1), JointInput::velocity(0.2)];
        assert!(check_inputs(&modes, &inputs).is_ok());
    }

    #[test]
    fn test_check_inputs_not_finite() {
        let modes = vec![Mode::Effort];
        let inputs = [JointInput::Effort { effort: f64::NAN }];
        assert!(matches!(
            check_inputs(&modes, &inputs),
            Err(ValidationError::NotFinite { joint: 0, .. })
        ));
    }

    #[test]
    fn test_check_move() {
        assert!(check_move(2.0, 6, None, None).is_ok());
        assert_eq!(
            check_move(0.0, 6, None, None),
            Err(ValidationError::InvalidGoalTime(0.0))
        );
        assert!(check_move(-1.0, 6, None, None).is_err());
        assert!(check_move(f64::INFINITY, 6, None, None).is_err());
        assert!(check_move(1.0, 6, Some(&[0.0; 5][..]), None).is_err());
        assert!(check_move(1.0, 6, Some(&[0.0; 6][..]), Some(&[0.0; 6][..])).is_ok());
    }

    #[test]
    fn test_effort_correction_range() {
        assert!(check_effort_corrections(&[0.2, 1.0, 5.0]).is_ok());
        assert!(matches!(
            check_effort_corrections(&[1.0, 0.19]),
            Err(ValidationError::OutOfRange { joint: 1, .. })
        ));
        assert!(check_effort_corrections(&[5.01]).is_err());
        assert!(check_effort_corrections(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_joint_characteristics() {
        let valid = JointCharacteristic::default();
        assert!(check_joint_characteristics(&[valid; N]).is_ok());

        let stuck = JointCharacteristic {
            friction_transition_velocity: 0.0,
            ..valid
        };
        assert!(matches!(
            check_joint_characteristics(&[valid, stuck]),
            Err(ValidationError::NotPositive { joint: 1, .. })
        ));

        let weak = JointCharacteristic {
            effort_correction: 0.1,
            ..valid
        };
        assert!(matches!(
            check_joint_characteristics(&[weak]),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_check_feedforward() {
        assert!(check_feedforward(JointScope::Arm, N, "feedforward velocities", None).is_ok());
        assert!(
            check_feedforward(JointScope::Arm, N, "feedforward velocities", Some(&[0.0; 6][..]))
                .is_ok()
        );
        assert_eq!(
            check_feedforward(
                JointScope::Gripper,
                N,
                "feedforward accelerations",
                Some(&[0.0; 2][..])
            ),
            Err(ValidationError::LengthMismatch {
                what: "feedforward accelerations",
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_continuity_factors() {
        assert!(check_continuity_factors(&[1.0, 0.5, 4.0]).is_ok());
        assert!(matches!(
            check_continuity_factors(&[1.0, 0.0]),
            Err(ValidationError::NotPositive { joint: 1, .. })
        ));
        assert!(matches!(
            check_continuity_factors(&[f64::INFINITY]),
            Err(ValidationError::NotFinite { joint: 0, .. })
        ));
    }

    #[test]
    fn test_force_limit_factor_accepts_zero() {
        assert!(check_force_limit_factor(0.0).is_ok());
        assert!(check_force_limit_factor(2.5).is_ok());
        assert!(check_force_limit_factor(-0.1).is_err());
        assert!(check_force_limit_factor(f64::NAN).is_err());
    }

    #[test]
    fn test_end_effector_and_parameters() {
        assert!(check_end_effector(&EndEffector::WXAI_V0_BASE).is_ok());

        let mut broken = EndEffector::WXAI_V0_BASE;
        broken.finger_left.inertia[4] = f64::NAN;
        assert!(matches!(
            check_end_effector(&broken),
            Err(ValidationError::InvalidParameter { .. })
        ));

        let mut limits = [JointLimit::default(); 3];
        limits[2].effort_max = f64::INFINITY;
        assert!(matches!(
            check_joint_limits(&limits),
            Err(ValidationError::NotFinite { joint: 2, .. })
        ));

        let mut motors = [MotorParameter::default(); 2];
        assert!(check_motor_parameters(&motors).is_ok());
        motors[1].velocity.ki = f64::NAN;
        assert!(matches!(
            check_motor_parameters(&motors),
            Err(ValidationError::NotFinite { joint: 1, .. })
        ));

        assert!(
            check_algorithm_parameter(&AlgorithmParameter {
                singularity_threshold: f64::NAN
            })
            .is_err()
        );
    }

    #[test]
    fn test_merge_inputs_holds_other_segment() {
        let held = [
            JointInput::position(0.1),
            JointInput::position(0.2),
            JointInput::Effort { effort: 1.5 },
        ];
        let merged = merge_inputs(&held, JointScope::Arm, &[JointInput::position(0.9); 2]);
        assert_eq!(merged[0], JointInput::position(0.9));
        assert_eq!(merged[1], JointInput::position(0.9));
        assert_eq!(merged[2], JointInput::Effort { effort: 1.5 });

        let merged = merge_inputs(
            &held,
            JointScope::Gripper,
            &[JointInput::Effort { effort: -1.0 }],
        );
        assert_eq!(merged[0], JointInput::position(0.1));
        assert_eq!(merged[2], JointInput::Effort { effort: -1.0 });
    }

    #[test]
    fn test_check_joint() {
        assert!(check_joint(6, N).is_ok());
        assert_eq!(
            check_joint(7, N),
            Err(ValidationError::InvalidJoint {
                index: 7,
                num_joints: 7
            })
        );
    }
}
