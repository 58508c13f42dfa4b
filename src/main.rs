use anyhow::{Context, Result};
use quizzical::utils::logging;
use quizzical::{Config, QuizApp};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    QuizApp::initialize(config)?.run().await
}
