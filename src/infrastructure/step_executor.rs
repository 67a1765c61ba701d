//! 步骤执行器 - 基础设施层
//!
//! 在单个受控页面上提供导航、等待、输入、点击、取值几种原语。
//! 每个原语都接受显式超时，内部不重试，重试策略由调用方决定。

use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

use crate::error::{StepError, StepResult};
use crate::infrastructure::page::PageDriver;

/// 元素等待轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 元素等待选项
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub visible: bool,
    pub timeout: Duration,
}

impl WaitOptions {
    pub fn visible(timeout: Duration) -> Self {
        Self {
            visible: true,
            timeout,
        }
    }

    pub fn attached(timeout: Duration) -> Self {
        Self {
            visible: false,
            timeout,
        }
    }
}

/// 步骤执行器
///
/// 职责：
/// - 借用一个页面，不负责它的生命周期
/// - 把超时转换为 `ElementNotFound` / `NavigationTimeout`
/// - 不认识具体站点
pub struct StepExecutor<'a> {
    page: &'a dyn PageDriver,
}

impl<'a> StepExecutor<'a> {
    pub fn new(page: &'a dyn PageDriver) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &'a dyn PageDriver {
        self.page
    }

    /// 导航到 URL
    pub async fn navigate(&self, url: &str, limit: Duration) -> StepResult<()> {
        debug!("导航到: {}", url);
        match timeout(limit, self.page.goto(url)).await {
            Ok(result) => result,
            Err(_) => Err(StepError::NavigationTimeout {
                target: url.to_string(),
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }

    /// 等待元素出现
    ///
    /// 页面跳转期间脚本执行上下文会被销毁，这类非致命的页面错误按“尚未出现”处理继续轮询；
    /// 致命会话错误立即返回。
    pub async fn wait_for_element(&self, selector: &str, options: WaitOptions) -> StepResult<()> {
        let deadline = Instant::now() + options.timeout;
        let not_found = || StepError::ElementNotFound {
            selector: selector.to_string(),
            timeout_ms: options.timeout.as_millis() as u64,
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, self.page.element_present(selector, options.visible)).await {
                Ok(Ok(true)) => {
                    debug!("元素已就绪: {}", selector);
                    return Ok(());
                }
                Ok(Ok(false)) => {}
                Ok(Err(e)) if matches!(e, StepError::Page(_)) && !e.is_fatal_session() => {
                    debug!("查询元素 {} 暂时失败，继续等待: {}", selector, e);
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(not_found()),
            }

            if Instant::now() >= deadline {
                return Err(not_found());
            }
            sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now()))).await;
        }
    }

    /// 清空后填写输入框
    pub async fn fill_field(&self, selector: &str, value: &str) -> StepResult<()> {
        self.page.clear_and_type(selector, value).await?;
        debug!("已填写 {}: {}", selector, value);
        Ok(())
    }

    /// 点击并等待页面跳转完成
    pub async fn click_and_await_navigation(&self, selector: &str, limit: Duration) -> StepResult<()> {
        match timeout(limit, self.page.click_and_wait_navigation(selector)).await {
            Ok(result) => result,
            Err(_) => Err(StepError::NavigationTimeout {
                target: format!("点击 {} 后的跳转", selector),
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }

    /// 读取元素文本
    pub async fn extract_text(&self, selector: &str) -> StepResult<String> {
        self.page
            .text_content(selector)
            .await?
            .ok_or_else(|| StepError::ElementNotFound {
                selector: selector.to_string(),
                timeout_ms: 0,
            })
    }

    /// 关闭可能出现的弹窗
    ///
    /// 弹窗不存在是常见情况，不视为错误，返回 `Ok(false)`。
    pub async fn dismiss_popup_if_present(&self, selector: &str, limit: Duration) -> StepResult<bool> {
        match self
            .wait_for_element(selector, WaitOptions::visible(limit))
            .await
        {
            Ok(()) => {}
            Err(StepError::ElementNotFound { .. }) => {
                info!("未出现弹窗（正常情况）");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        match self.page.click(selector).await {
            Ok(()) => {
                info!("弹窗已关闭");
                Ok(true)
            }
            Err(StepError::ElementNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 读取渲染后的整页 HTML
    pub async fn page_markup(&self) -> StepResult<String> {
        self.page.content().await
    }

    /// 固定等待
    pub async fn settle(&self, duration: Duration) {
        if !duration.is_zero() {
            debug!("等待 {}ms", duration.as_millis());
            sleep(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 第 N 次查询后元素才出现的页面
    struct LatePage {
        appear_after: usize,
        polls: AtomicUsize,
        hang_navigation: bool,
        session_lost: bool,
        /// 前几次查询返回的页面错误
        transient_errors: usize,
    }

    impl LatePage {
        fn new(appear_after: usize) -> Self {
            Self {
                appear_after,
                polls: AtomicUsize::new(0),
                hang_navigation: false,
                session_lost: false,
                transient_errors: 0,
            }
        }
    }

    #[async_trait]
    impl PageDriver for LatePage {
        async fn goto(&self, _url: &str) -> StepResult<()> {
            if self.hang_navigation {
                futures::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn element_present(&self, _selector: &str, _visible: bool) -> StepResult<bool> {
            if self.session_lost {
                return Err(StepError::Session("Target closed".to_string()));
            }
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n < self.transient_errors {
                return Err(StepError::Page("Execution context was destroyed".to_string()));
            }
            Ok(n >= self.appear_after)
        }

        async fn clear_and_type(&self, _selector: &str, _value: &str) -> StepResult<()> {
            Ok(())
        }

        async fn click(&self, _selector: &str) -> StepResult<()> {
            Ok(())
        }

        async fn click_and_wait_navigation(&self, _selector: &str) -> StepResult<()> {
            futures::future::pending::<()>().await;
            Ok(())
        }

        async fn text_content(&self, selector: &str) -> StepResult<Option<String>> {
            Ok((selector == "#lbAddr").then(|| "서울특별시".to_string()))
        }

        async fn content(&self) -> StepResult<String> {
            Ok(String::new())
        }

        async fn screenshot(&self, _path: &Path, _full_page: bool) -> StepResult<()> {
            Ok(())
        }

        async fn close(&self) -> StepResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_wait_for_element_polls_until_present() {
        let page = LatePage::new(2);
        let executor = StepExecutor::new(&page);
        tokio_test::assert_ok!(
            executor
                .wait_for_element("#txtAddr", WaitOptions::visible(Duration::from_secs(2)))
                .await
        );
        assert!(page.polls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_wait_for_element_survives_context_reset() {
        let mut page = LatePage::new(2);
        page.transient_errors = 1;
        let executor = StepExecutor::new(&page);
        tokio_test::assert_ok!(
            executor
                .wait_for_element("#lbAddr", WaitOptions::attached(Duration::from_secs(2)))
                .await
        );
        assert!(page.polls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_wait_for_element_transient_errors_until_deadline() {
        let mut page = LatePage::new(usize::MAX);
        page.transient_errors = usize::MAX;
        let executor = StepExecutor::new(&page);
        let err = executor
            .wait_for_element("#lbAddr", WaitOptions::attached(Duration::from_millis(150)))
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ElementNotFound { timeout_ms: 150, .. }));
        assert!(page.polls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_wait_for_element_times_out_as_not_found() {
        let page = LatePage::new(usize::MAX);
        let executor = StepExecutor::new(&page);
        let err = executor
            .wait_for_element("#lbAddr", WaitOptions::attached(Duration::from_millis(150)))
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ElementNotFound { timeout_ms: 150, .. }));
    }

    #[tokio::test]
    async fn test_navigation_timeout() {
        let mut page = LatePage::new(0);
        page.hang_navigation = true;
        let executor = StepExecutor::new(&page);
        let err = executor
            .navigate("https://example.com", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::NavigationTimeout { .. }));
    }

    #[tokio::test]
    async fn test_click_navigation_timeout() {
        let page = LatePage::new(0);
        let executor = StepExecutor::new(&page);
        let err = executor
            .click_and_await_navigation("#btnAddr2", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("#btnAddr2"));
    }

    #[tokio::test]
    async fn test_dismiss_popup_absent_is_ok() {
        let page = LatePage::new(usize::MAX);
        let executor = StepExecutor::new(&page);
        let dismissed = executor
            .dismiss_popup_if_present(".popup_close", Duration::from_millis(120))
            .await
            .unwrap();
        assert!(!dismissed);
    }

    #[tokio::test]
    async fn test_dismiss_popup_propagates_session_errors() {
        let mut page = LatePage::new(0);
        page.session_lost = true;
        let executor = StepExecutor::new(&page);
        let err = executor
            .dismiss_popup_if_present(".popup_close", Duration::from_millis(120))
            .await
            .unwrap_err();
        assert!(err.is_fatal_session());
    }

    #[tokio::test]
    async fn test_extract_text_missing_element() {
        let page = LatePage::new(0);
        let executor = StepExecutor::new(&page);
        assert_eq!(executor.extract_text("#lbAddr").await.unwrap(), "서울특별시");
        let err = executor.extract_text("#other").await.unwrap_err();
        assert!(matches!(err, StepError::ElementNotFound { .. }));
    }
}
