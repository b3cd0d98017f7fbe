//! 错误恢复演示
//!
//! 故意发送一个跳变过大的位置指令，观察控制器锁存 `InputDiscontinuous`，
//! 之后的运动指令在本地被拒绝；清理并以 `clear_error = true` 重新配置后恢复。
//!
//! # 运行
//!
//! ```bash
//! cargo run --example error_recovery -- --ip 192.168.1.2
//! ```

use clap::Parser;
use trossen_sdk::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "error_recovery")]
#[command(about = "演示故障锁存与清除")]
struct Args {
    /// 控制器 IP 地址
    #[arg(long, default_value = "192.168.1.2")]
    ip: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    trossen_sdk::init_logging();
    let args = Args::parse();

    let mut driver = TrossenArmDriver::new();
    driver.configure(Model::WxaiV0, EndEffector::WXAI_V0_BASE, &args.ip, true)?;
    driver.set_arm_modes(Mode::Position)?;

    let mut target = driver.get_positions()?;
    target.truncate(6);
    target[0] += 1.0;

    println!("▶️  发送跳变 1.0 rad 的位置指令...");
    match driver.set_arm_positions(&target, None, None) {
        Ok(()) => println!("   控制器接受了该指令（连续性阈值较大）"),
        Err(e) => println!("   ❌ {}", e),
    }

    if let Some(fault) = driver.get_fault()? {
        println!("   已锁存故障: {:?}", fault.state);
        if let Err(e) = driver.set_arm_positions(&[0.0; 6], None, None) {
            println!("   后续指令被本地拒绝: {}", e);
        }
        println!("   诊断信息: {}", driver.get_error_information()?);

        println!("\n🔄 清理并重新配置...");
        driver.cleanup();
        driver.configure(Model::WxaiV0, EndEffector::WXAI_V0_BASE, &args.ip, true)?;
        println!("   故障: {:?}", driver.get_fault()?);
    }

    driver.cleanup();
    Ok(())
}
