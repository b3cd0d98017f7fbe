//! 配置与清理演示
//!
//! 连接控制器、读取关节输出、把臂关节平滑移动到目标位置后再回到零位，
//! 最后让所有关节进入空闲并释放 socket。
//!
//! # 运行
//!
//! ```bash
//! cargo run --example configure_cleanup -- --ip 192.168.1.2
//! ```

use clap::Parser;
use trossen_sdk::prelude::*;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "configure_cleanup")]
#[command(about = "配置控制器、执行一段轨迹并清理")]
struct Args {
    /// 控制器 IP 地址
    #[arg(long, default_value = "192.168.1.2")]
    ip: String,

    /// 轨迹时长（秒）
    #[arg(long, default_value = "2.0")]
    goal_time: f64,

    /// 末端执行器：base / leader / follower
    #[arg(long, default_value = "base")]
    end_effector: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    trossen_sdk::init_logging();
    let args = Args::parse();

    let end_effector = match args.end_effector.as_str() {
        "leader" => EndEffector::WXAI_V0_LEADER,
        "follower" => EndEffector::WXAI_V0_FOLLOWER,
        _ => EndEffector::WXAI_V0_BASE,
    };

    println!("🤖 Trossen SDK - Configure / Cleanup Demo");
    println!("========================================\n");

    let mut driver = TrossenArmDriver::new();
    driver.configure(Model::WxaiV0, end_effector, &args.ip, false)?;
    println!("✅ 已连接: {} 个关节", driver.get_num_joints()?);

    let outputs = driver.request_joint_outputs()?;
    for (joint, output) in outputs.iter().enumerate() {
        println!(
            "   J{}: 位置 {:+.4} rad | 速度 {:+.4} rad/s | 力矩 {:+.4}",
            joint + 1,
            output.position,
            output.velocity,
            output.effort
        );
    }

    println!("\n▶️  移动到目标位姿...");
    driver.set_arm_modes(Mode::Position)?;
    driver.move_arm_to(args.goal_time, &[0.0, 1.05, 0.5, 0.0, 0.0, 0.0], None, None)?;
    println!("   位置: {:?}", driver.get_positions()?);

    println!("▶️  回到零位...");
    driver.move_arm_to(args.goal_time, &[0.0; 6], None, None)?;

    driver.cleanup();
    println!("\n✅ 已清理，所有关节空闲");
    Ok(())
}
