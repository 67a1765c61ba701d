//! 基于 chromiumoxide 的页面与会话实现

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventFrameNavigated, EventLoadEventFired,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{StepError, StepResult};
use crate::infrastructure::page::{BrowserSession, PageDriver};

/// chromiumoxide 页面
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 当前文档是否已加载完成；上下文正在切换时视为未完成
    async fn document_complete(&self) -> bool {
        self.eval::<bool>("document.readyState === 'complete'".to_string())
            .await
            .unwrap_or(false)
    }

    /// 执行 JS 并反序列化结果
    async fn eval<T: serde::de::DeserializeOwned>(&self, js_code: String) -> StepResult<T> {
        let result = self.page.evaluate(js_code).await?;
        result
            .into_value()
            .map_err(|e| StepError::Page(format!("脚本结果解析失败: {}", e)))
    }
}

/// 选择器转为 JS 字符串字面量
fn js_selector(selector: &str) -> StepResult<String> {
    serde_json::to_string(selector).map_err(|e| StepError::Page(e.to_string()))
}

fn not_found(selector: &str) -> StepError {
    StepError::ElementNotFound {
        selector: selector.to_string(),
        timeout_ms: 0,
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str) -> StepResult<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn element_present(&self, selector: &str, visible: bool) -> StepResult<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                if (!{}) return true;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.visibility !== 'hidden' && style.display !== 'none'
                    && rect.width > 0 && rect.height > 0;
            }})()
            "#,
            js_selector(selector)?,
            visible
        );
        self.eval(js_code).await
    }

    async fn clear_and_type(&self, selector: &str, value: &str) -> StepResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const input = document.querySelector({});
                if (!input) return false;
                input.value = '';
                return true;
            }})()
            "#,
            js_selector(selector)?
        );
        let found: bool = self.eval(js_code).await?;
        if !found {
            return Err(not_found(selector));
        }

        let element = self.page.find_element(selector).await?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> StepResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.click();
                return true;
            }})()
            "#,
            js_selector(selector)?
        );
        let clicked: bool = self.eval(js_code).await?;
        if clicked {
            Ok(())
        } else {
            Err(not_found(selector))
        }
    }

    async fn click_and_wait_navigation(&self, selector: &str) -> StepResult<()> {
        if !self.element_present(selector, false).await? {
            return Err(not_found(selector));
        }

        // 点击前订阅主框架跳转事件，跳转不会在订阅之前发生
        let mut navigated = self.page.event_listener::<EventFrameNavigated>().await?;
        match self.click(selector).await {
            Ok(()) => {}
            Err(e) if matches!(e, StepError::Page(_)) && !e.is_fatal_session() => {
                debug!("点击脚本在跳转中返回错误，继续等待跳转: {}", e);
            }
            Err(e) => return Err(e),
        }

        loop {
            match navigated.next().await {
                Some(event) if event.frame.parent_id.is_none() => break,
                Some(_) => continue,
                None => return Err(StepError::Session("Session closed: 页面事件流已结束".to_string())),
            }
        }
        debug!("主框架已跳转");

        // 先订阅再检查，加载完成事件不会漏掉
        let mut loaded = self.page.event_listener::<EventLoadEventFired>().await?;
        if self.document_complete().await {
            return Ok(());
        }
        match loaded.next().await {
            Some(_) => Ok(()),
            None => Err(StepError::Session("Session closed: 页面事件流已结束".to_string())),
        }
    }

    async fn text_content(&self, selector: &str) -> StepResult<Option<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                return el ? (el.textContent || '').trim() : null;
            }})()
            "#,
            js_selector(selector)?
        );
        self.eval(js_code).await
    }

    async fn content(&self) -> StepResult<String> {
        Ok(self.page.content().await?)
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> StepResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn close(&self) -> StepResult<()> {
        self.page.clone().close().await?;
        Ok(())
    }
}

/// chromiumoxide 浏览器会话
///
/// 持有 Browser 和后台事件循环；事件循环退出时通过 watch 通道通知上层。
pub struct ChromeSession {
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    lost_rx: watch::Receiver<Option<String>>,
}

impl ChromeSession {
    /// 接管 Browser 并在后台处理浏览器事件
    pub fn start(browser: Browser, mut handler: Handler) -> Self {
        let (lost_tx, lost_rx) = watch::channel(None);

        let handler_task = tokio::spawn(async move {
            let reason = loop {
                match handler.next().await {
                    Some(Ok(())) => continue,
                    Some(Err(e)) => {
                        error!("浏览器事件循环出错: {}", e);
                        break format!("Protocol error: {}", e);
                    }
                    None => break "Session closed: 浏览器事件循环已结束".to_string(),
                }
            };
            let _ = lost_tx.send(Some(reason));
        });

        Self {
            browser: Mutex::new(Some(browser)),
            handler_task: Mutex::new(Some(handler_task)),
            lost_rx,
        }
    }

    /// 等待会话意外断开，返回断开原因
    pub async fn wait_lost(&self) -> String {
        let mut rx = self.lost_rx.clone();
        let reason = match rx.wait_for(|reason| reason.is_some()).await {
            Ok(reason) => reason.clone().unwrap_or_default(),
            Err(_) => "Session closed: 通知通道已关闭".to_string(),
        };
        reason
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn open_page(&self) -> StepResult<Arc<dyn PageDriver>> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| StepError::Session("Session closed".to_string()))?;
        let page = browser.new_page("about:blank").await?;
        Ok(Arc::new(ChromePage::new(page)))
    }

    async fn close(&self) -> StepResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        match browser.pages().await {
            Ok(pages) => {
                debug!("关闭 {} 个页面", pages.len());
                for page in pages {
                    if let Err(e) = page.close().await {
                        warn!("⚠️ 页面关闭失败: {}", e);
                    }
                }
            }
            Err(e) => warn!("⚠️ 获取页面列表失败: {}", e),
        }

        let result = browser.close().await;
        if let Err(e) = browser.wait().await {
            debug!("等待浏览器进程退出失败: {}", e);
        }
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        result?;
        info!("浏览器已关闭");
        Ok(())
    }
}
