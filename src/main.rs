use std::process::ExitCode;

use ip_jurisdiction_lookup::config::Config;
use ip_jurisdiction_lookup::orchestrator::{exit_code_for, App};
use ip_jurisdiction_lookup::utils::logging;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置
    let config_path = std::env::var("IPJ_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = match Config::load(&config_path).and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 配置加载失败 ({}): {}", config_path, e);
            return ExitCode::from(1);
        }
    };

    // 初始化日志
    if let Err(e) = logging::init(&config) {
        eprintln!("❌ {:#}", e);
        return ExitCode::from(1);
    }
    logging::log_startup(&config);

    // 初始化并运行应用
    let result = match App::initialize(config) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        error!("❌ {}", e);
    }

    ExitCode::from(exit_code_for(&result))
}
