//! 标准末端执行器参数
//!
//! 与出厂夹爪的标定数据一致。`t_max_factor` 为夹爪力限缩放系数的默认值。

use crate::properties::{EndEffector, Link};

const ORIGIN_RPY_ZERO: [f64; 3] = [0.0, 0.0, 0.0];

/// base / follower 变体共用的手指连杆
const FINGER_LEFT: Link = Link {
    mass: 0.07618477,
    inertia: [
        0.00002759,
        -0.00000495,
        -0.00000052,
        -0.00000495,
        0.00003194,
        0.00000327,
        -0.00000052,
        0.00000327,
        0.00003791,
    ],
    origin_xyz: [0.00780825, -0.00528697, -0.00368479],
    origin_rpy: ORIGIN_RPY_ZERO,
};

const FINGER_RIGHT: Link = Link {
    mass: 0.07618477,
    inertia: [
        0.00002759,
        0.00000495,
        -0.00000275,
        0.00000495,
        0.00003194,
        0.00000203,
        -0.00000275,
        0.00000203,
        0.00003791,
    ],
    origin_xyz: [0.00780824, 0.00528691, 0.00221090],
    origin_rpy: ORIGIN_RPY_ZERO,
};

const EMPTY_LINK: Link = Link {
    mass: 0.0,
    inertia: [0.0; 9],
    origin_xyz: [0.0; 3],
    origin_rpy: ORIGIN_RPY_ZERO,
};

impl EndEffector {
    /// WXAI V0 基础款
    pub const WXAI_V0_BASE: EndEffector = EndEffector {
        palm: Link {
            mass: 0.51498747,
            inertia: [
                0.00056037, 5.1e-7, -9e-8, 5.1e-7, 0.00045167, -4e-8, -9e-8, -4e-8, 0.00081937,
            ],
            origin_xyz: [0.04399695, -0.00000761, 0.00001510],
            origin_rpy: ORIGIN_RPY_ZERO,
        },
        finger_left: FINGER_LEFT,
        finger_right: FINGER_RIGHT,
        offset_finger_left: 0.02165,
        offset_finger_right: -0.02165,
        t_max_factor: 1.0,
    };

    /// WXAI V0 主臂（示教端）款
    pub const WXAI_V0_LEADER: EndEffector = EndEffector {
        palm: Link {
            mass: 0.58782068,
            inertia: [
                0.00106679, 4.9e-7, 6.518e-5, 4.9e-7, 0.00096664, -1.5e-7, 6.518e-5, -1.5e-7,
                0.00084059,
            ],
            origin_xyz: [0.04260435, -0.00000564, -0.00961530],
            origin_rpy: ORIGIN_RPY_ZERO,
        },
        finger_left: Link {
            mass: 0.07230515,
            inertia: [
                0.00004429, 2.1e-6, 8.6e-7, 2.1e-6, 0.00003181, -3.39e-6, 8.6e-7, -3.39e-6,
                0.00001895,
            ],
            origin_xyz: [0.00203592, -0.00158698, -0.01124986],
            origin_rpy: ORIGIN_RPY_ZERO,
        },
        finger_right: Link {
            mass: 0.07230515,
            inertia: [
                0.00005161, -2.1e-6, -2.28e-6, -2.1e-6, 0.00003913, 7.97e-6, -2.28e-6, 7.97e-6,
                0.00001895,
            ],
            origin_xyz: [0.00203592, 0.00158689, -0.00503780],
            origin_rpy: ORIGIN_RPY_ZERO,
        },
        offset_finger_left: 0.01485,
        offset_finger_right: -0.01485,
        t_max_factor: 0.5,
    };

    /// WXAI V0 从臂（执行端）款
    pub const WXAI_V0_FOLLOWER: EndEffector = EndEffector {
        palm: Link {
            mass: 0.63463466,
            inertia: [
                0.00086891,
                -0.00000024,
                0.00004879,
                -0.00000024,
                0.00075399,
                0.00001658,
                0.00004879,
                0.00001658,
                0.00088386,
            ],
            origin_xyz: [0.04550951, 0.00050636, 0.00947036],
            origin_rpy: ORIGIN_RPY_ZERO,
        },
        finger_left: FINGER_LEFT,
        finger_right: FINGER_RIGHT,
        offset_finger_left: 0.02165,
        offset_finger_right: -0.02165,
        t_max_factor: 1.0,
    };

    /// 未安装夹爪
    pub const NO_GRIPPER: EndEffector = EndEffector {
        palm: EMPTY_LINK,
        finger_left: EMPTY_LINK,
        finger_right: EMPTY_LINK,
        offset_finger_left: 0.0,
        offset_finger_right: 0.0,
        t_max_factor: 1.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingers_are_symmetric() {
        for end_effector in [
            EndEffector::WXAI_V0_BASE,
            EndEffector::WXAI_V0_LEADER,
            EndEffector::WXAI_V0_FOLLOWER,
        ] {
            assert_eq!(
                end_effector.offset_finger_left,
                -end_effector.offset_finger_right
            );
            assert_eq!(end_effector.finger_left.mass, end_effector.finger_right.mass);
        }
    }

    #[test]
    fn test_leader_force_limit_default() {
        assert_eq!(EndEffector::WXAI_V0_LEADER.t_max_factor, 0.5);
        assert_eq!(EndEffector::WXAI_V0_BASE.t_max_factor, 1.0);
    }
}
