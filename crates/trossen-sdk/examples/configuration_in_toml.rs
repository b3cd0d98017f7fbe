//! 配置文档演示
//!
//! 读取控制器的全部可持久化配置并保存为 TOML，或从 TOML 写回控制器。
//! 网络相关字段写入后需要重新上电才生效。
//!
//! # 运行
//!
//! ```bash
//! # 保存
//! cargo run --example configuration_in_toml -- --ip 192.168.1.2 save controller.toml
//! # 加载
//! cargo run --example configuration_in_toml -- --ip 192.168.1.2 load controller.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use trossen_sdk::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "configuration_in_toml")]
#[command(about = "保存 / 加载控制器配置")]
struct Args {
    /// 控制器 IP 地址
    #[arg(long, default_value = "192.168.1.2")]
    ip: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 读取当前配置并保存
    Save { path: PathBuf },
    /// 从文件加载并写入控制器
    Load { path: PathBuf },
    /// 打印当前配置
    Show,
}

fn main() -> anyhow::Result<()> {
    trossen_sdk::init_logging();
    let args = Args::parse();

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let mut driver = TrossenArmDriver::new();
    driver.configure(Model::WxaiV0, EndEffector::WXAI_V0_BASE, &args.ip, false)?;

    match args.command {
        Command::Save { path } => {
            driver.save_configs_to_file(&path)?;
            println!("✅ 已保存到 {}", path.display());
        },
        Command::Load { path } => {
            if interrupted.load(Ordering::SeqCst) {
                println!("⚠️  已中断，未写入");
            } else {
                driver.load_configs_from_file(&path)?;
                println!("✅ 已从 {} 加载（网络设置重新上电后生效）", path.display());
            }
        },
        Command::Show => {
            let document = driver.snapshot_configuration()?;
            println!("{}", document.to_toml_string()?);
        },
    }

    driver.cleanup();
    Ok(())
}
