pub mod connection;
pub mod headless;

pub use connection::connect_to_browser;
pub use headless::launch_browser;

use crate::config::Config;
use crate::infrastructure::ChromeSession;
use anyhow::Result;

/// 按配置启动或连接浏览器
///
/// 设置了调试端口时连接已运行的浏览器，否则新启动一个。
pub async fn open_session(config: &Config) -> Result<ChromeSession> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port, config.timing.cdp_request_timeout()).await,
        None => launch_browser(config).await,
    }
}
