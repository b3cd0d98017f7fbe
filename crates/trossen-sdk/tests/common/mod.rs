//! 集成测试公共设施
#![allow(dead_code)]

pub mod mock_controller;

use std::time::Duration;

use trossen_sdk::prelude::*;

pub use mock_controller::{ControllerState, MockController};

/// 关节数（所有型号均为 6 + 夹爪）
pub const NUM_JOINTS: usize = 7;

/// 回环测试用的驱动配置
///
/// 超时放宽到 50ms，避免测试机负载导致的无谓重传。
pub fn loopback_config(port: u16) -> DriverConfig {
    DriverConfig {
        port,
        timeout: Duration::from_millis(50),
        max_attempts: 20,
        ..DriverConfig::default()
    }
}

/// 启动模拟控制器并完成配置
pub fn configured_driver() -> (MockController, TrossenArmDriver) {
    let mock = MockController::spawn(NUM_JOINTS);
    let mut driver = TrossenArmDriver::with_config(loopback_config(mock.port()));
    driver
        .configure(Model::WxaiV0, EndEffector::WXAI_V0_BASE, "127.0.0.1", false)
        .expect("configure against mock controller");
    (mock, driver)
}

pub fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (joint, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "joint {joint}: {a} != {e} (tolerance {tolerance})"
        );
    }
}

/// 经过一次 f32 线上编码后的末端执行器（控制器实际保存的值）
pub fn wire_end_effector(end_effector: EndEffector) -> EndEffector {
    use trossen_sdk::protocol::{ConfigurationAddress, ConfigurationValue};

    let encoded = ConfigurationValue::EndEffector(end_effector).encode();
    match ConfigurationValue::decode(ConfigurationAddress::EndEffector, &encoded, NUM_JOINTS) {
        Ok(ConfigurationValue::EndEffector(decoded)) => decoded,
        other => panic!("unexpected decode result: {other:?}"),
    }
}
