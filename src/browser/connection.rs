use std::time::Duration;

use anyhow::Result;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::infrastructure::ChromeSession;

/// 连接到已启动的浏览器
pub async fn connect_to_browser(port: u16, request_timeout: Duration) -> Result<ChromeSession> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let handler_config = HandlerConfig {
        request_timeout,
        ..Default::default()
    };
    let (browser, handler) = Browser::connect_with_config(&browser_url, handler_config).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    let session = ChromeSession::start(browser, handler);

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(session)
}
