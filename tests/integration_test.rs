use ip_jurisdiction_lookup::browser::open_session;
use ip_jurisdiction_lookup::config::Config;
use ip_jurisdiction_lookup::infrastructure::{BrowserSession, PageDriver, ScopedPage, StepExecutor, WaitOptions};
use std::time::Duration;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_primary_site_reachable() {
    // 加载配置
    let config = Config::load("config.toml").expect("加载配置失败");

    // 启动浏览器
    let session = open_session(&config).await.expect("启动浏览器失败");

    let scoped = ScopedPage::open(&session, "smoke").await.expect("打开页面失败");
    let executor = StepExecutor::new(scoped.page());
    executor
        .navigate(&config.primary.url, Duration::from_millis(config.timing.navigation_timeout_ms))
        .await
        .expect("打开主查询站点失败");
    executor
        .wait_for_element(
            &config.primary.input_selector,
            WaitOptions::visible(Duration::from_millis(config.timing.element_timeout_ms)),
        )
        .await
        .expect("找不到输入框");
    scoped.release().await;

    session.close().await.expect("关闭浏览器失败");
}

#[tokio::test]
#[ignore]
async fn test_browser_launch() {
    let config = Config::default().with_env_overrides().expect("环境变量解析失败");

    let result = open_session(&config).await;

    assert!(result.is_ok(), "应该能够成功启动浏览器");
    result.unwrap().close().await.expect("关闭浏览器失败");
}

#[tokio::test]
#[ignore]
async fn test_click_waits_for_delayed_navigation() {
    let config = Config::default().with_env_overrides().expect("环境变量解析失败");
    let session = open_session(&config).await.expect("启动浏览器失败");

    let scoped = ScopedPage::open(&session, "navigation").await.expect("打开页面失败");
    let executor = StepExecutor::new(scoped.page());
    executor
        .navigate(
            "data:text/html,<button id='go' onclick=\"setTimeout(() => location.href = 'about:blank', 500)\">go</button>",
            Duration::from_secs(10),
        )
        .await
        .expect("打开测试页面失败");

    // 跳转在点击 500ms 后才开始，必须等到新页面加载完才返回
    executor
        .click_and_await_navigation("#go", Duration::from_secs(10))
        .await
        .expect("等待跳转失败");
    let still_on_old_page = scoped.page().element_present("#go", false).await.expect("查询元素失败");
    assert!(!still_on_old_page);

    scoped.release().await;
    session.close().await.expect("关闭浏览器失败");
}

#[test]
fn test_load_missing_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.primary.result_selector, "#lbAddr");
    assert_eq!(config.sentinel, "해외IP.");
}

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
spreadsheet_id = "abc"
screenshot_folder_id = "def"
job_sheet = "Jobs"

[columns]
artifact_link = 10
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.job_sheet, "Jobs");
    assert_eq!(config.columns.artifact_link, Some(10));
    assert!(config.validate().is_ok());
}
