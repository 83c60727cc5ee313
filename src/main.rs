use anyhow::Result;

use quiz_auto_submit::{api, utils, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（默认值 ← config.toml ← 环境变量）
    let config = Config::load();

    // 初始化日志
    utils::logging::init(config.verbose_logging);
    utils::logging::init_log_file(&config.output_log_file)?;
    utils::logging::log_startup(&config);

    // 启动 HTTP 服务
    api::serve(config).await?;

    Ok(())
}
