use anyhow::{Context, Result};
use clap::Parser;

use nova_ocr::utils::logging;
use nova_ocr::{App, Cli, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置：默认值 < 文件 < 环境变量 < 命令行
    let mut config = Config::load(cli.config.as_deref()).context("加载配置失败")?;
    cli.apply_overrides(&mut config);

    // 初始化日志
    logging::init(&config.logging.level, config.log_file().as_deref())?;

    // 初始化并运行应用
    let _stats = App::initialize(config, &cli).await?.run().await?;

    Ok(())
}
