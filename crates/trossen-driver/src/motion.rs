//! 定周期轨迹下发
//!
//! `move_*_to` 为目标关节各建立一个五次 Hermite 插值器，从当前测量位置
//! 平滑过渡到目标位置，按 `control_period` 的绝对时间锚点下发
//! 位置 + 前馈速度/加速度，最后一帧发送精确的目标值。
//!
//! 调用期间阻塞调用方；任何一帧失败（包括控制器报告的故障）立即中止。

use std::time::Instant;

use tracing::{debug, warn};
use trossen_protocol::{JointInput, Mode};

use crate::interpolate::QuinticHermiteInterpolator;
use crate::validation::{self, JointScope};
use crate::{DriverError, JointVec, TrossenArmDriver};

impl TrossenArmDriver {
    /// 臂关节平滑运动到目标位置
    ///
    /// # 参数
    /// - `goal_time`: 轨迹时长（秒），必须为正
    /// - `goal_positions`: 臂关节目标位置
    /// - `goal_velocities` / `goal_accelerations`: 终端速度/加速度，缺省为 0
    ///
    /// 非位置模式的臂关节会先切换到 [`Mode::Position`]，夹爪保持上一次的输入。
    pub fn move_arm_to(
        &mut self,
        goal_time: f64,
        goal_positions: &[f64],
        goal_velocities: Option<&[f64]>,
        goal_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        self.move_scope_to(
            JointScope::Arm,
            goal_time,
            goal_positions,
            goal_velocities,
            goal_accelerations,
        )
    }

    /// 所有关节（含夹爪）平滑运动到目标位置
    pub fn move_all_to(
        &mut self,
        goal_time: f64,
        goal_positions: &[f64],
        goal_velocities: Option<&[f64]>,
        goal_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        self.move_scope_to(
            JointScope::All,
            goal_time,
            goal_positions,
            goal_velocities,
            goal_accelerations,
        )
    }

    /// 夹爪平滑运动到目标位置，终端静止
    pub fn move_gripper_to(&mut self, goal_time: f64, goal_position: f64) -> Result<(), DriverError> {
        self.move_scope_to(JointScope::Gripper, goal_time, &[goal_position], None, None)
    }

    fn move_scope_to(
        &mut self,
        scope: JointScope,
        goal_time: f64,
        goal_positions: &[f64],
        goal_velocities: Option<&[f64]>,
        goal_accelerations: Option<&[f64]>,
    ) -> Result<(), DriverError> {
        let period = self.config().control_period;
        let session = self.session_mut()?;

        // 1. 本地校验（不产生任何数据报）
        session.fault.ensure_motion_allowed()?;
        validation::check_len(scope, session.num_joints, goal_positions.len())?;
        validation::check_move(
            goal_time,
            goal_positions.len(),
            goal_velocities,
            goal_accelerations,
        )?;
        validation::check_values_finite("goal position", goal_positions)?;

        // 2. 目标关节切换到位置模式
        let range = scope.range(session.num_joints);
        for joint in range.clone() {
            if session.modes[joint] != Mode::Position {
                debug!("Switching joint {} to position mode for trajectory", joint);
                session.set_mode(joint, Mode::Position)?;
            }
        }

        // 3. 以测量位置为起点，上一次下发的前馈项为起始导数
        session.refresh_outputs()?;
        let interpolators: JointVec<QuinticHermiteInterpolator> = range
            .clone()
            .enumerate()
            .map(|(i, joint)| {
                let (dy0, ddy0) = match session.inputs[joint] {
                    JointInput::Position {
                        feedforward_velocity,
                        feedforward_acceleration,
                        ..
                    } => (feedforward_velocity, feedforward_acceleration),
                    _ => (0.0, 0.0),
                };
                let mut interp = QuinticHermiteInterpolator::new();
                interp.compute_coefficients(
                    0.0,
                    goal_time,
                    session.outputs[joint].position,
                    goal_positions[i],
                    dy0,
                    goal_velocities.map_or(0.0, |v| v[i]),
                    ddy0,
                    goal_accelerations.map_or(0.0, |a| a[i]),
                );
                interp
            })
            .collect();

        let sample = |t: f64| -> JointVec<JointInput> {
            interpolators
                .iter()
                .map(|interp| JointInput::Position {
                    position: interp.y(t),
                    feedforward_velocity: interp.dy(t),
                    feedforward_acceleration: interp.ddy(t),
                })
                .collect()
        };

        // 4. 定周期下发（绝对时间锚点，消除累积漂移）
        let start = Instant::now();
        let mut next_tick = start;
        let mut ticks: u64 = 0;
        loop {
            let t = start.elapsed().as_secs_f64();
            if t >= goal_time {
                break;
            }
            next_tick += period;

            let merged = validation::merge_inputs(&session.inputs, scope, &sample(t));
            session.send_inputs(&merged)?;
            ticks += 1;

            let now = Instant::now();
            if next_tick > now {
                spin_sleep::sleep(next_tick - now);
            } else {
                warn!(
                    "Control loop overrun: tick took {:?}, expected {:?}. Skipping sleep to catch up.",
                    now.duration_since(next_tick - period),
                    period
                );
                next_tick = now;
            }
        }

        // 5. 精确终点
        let goal: JointVec<JointInput> = goal_positions
            .iter()
            .enumerate()
            .map(|(i, &position)| JointInput::Position {
                position,
                feedforward_velocity: goal_velocities.map_or(0.0, |v| v[i]),
                feedforward_acceleration: goal_accelerations.map_or(0.0, |a| a[i]),
            })
            .collect();
        let merged = validation::merge_inputs(&session.inputs, scope, &goal);
        session.send_inputs(&merged)?;
        debug!(
            "Trajectory finished: {} ticks over {:.3}s",
            ticks + 1,
            goal_time
        );
        Ok(())
    }
}
