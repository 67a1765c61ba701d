use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::infrastructure::ChromeSession;

/// 启动浏览器
pub async fn launch_browser(config: &Config) -> Result<ChromeSession> {
    info!(
        "🚀 启动浏览器 ({})...",
        if config.headless { "无头模式" } else { "有界面模式" }
    );

    let request_timeout = config.timing.cdp_request_timeout();
    debug!("控制请求超时: {}ms", request_timeout.as_millis());

    let mut builder = BrowserConfig::builder()
        .window_size(1280, 720)
        .request_timeout(request_timeout)
        .args(vec![
        "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
        "--disable-dev-shm-usage", // 防止共享内存不足
        "--disable-infobars",
    ]);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        debug!("浏览器路径: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    let session = ChromeSession::start(browser, handler);

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    info!("✅ 浏览器已就绪");
    Ok(session)
}
