//! 受控页面与浏览器会话的抽象
//!
//! 上层只依赖这里的 trait，具体实现见 `chrome` 模块。

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::StepResult;

/// 单个受控页面
///
/// 所有方法都不带超时，也不重试；超时由 `StepExecutor` 控制。
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定 URL 并等待加载完成
    async fn goto(&self, url: &str) -> StepResult<()>;

    /// 元素当前是否存在（`visible` 为真时还要求可见）
    async fn element_present(&self, selector: &str, visible: bool) -> StepResult<bool>;

    /// 清空输入框后输入内容
    async fn clear_and_type(&self, selector: &str, value: &str) -> StepResult<()>;

    /// 点击元素
    async fn click(&self, selector: &str) -> StepResult<()>;

    /// 同时发起点击和导航等待，直到页面跳转完成
    async fn click_and_wait_navigation(&self, selector: &str) -> StepResult<()>;

    /// 元素的文本内容（已去除首尾空白），元素不存在时返回 None
    async fn text_content(&self, selector: &str) -> StepResult<Option<String>>;

    /// 当前渲染后的完整 HTML
    async fn content(&self) -> StepResult<String>;

    /// 截图并保存到指定路径
    async fn screenshot(&self, path: &Path, full_page: bool) -> StepResult<()>;

    /// 关闭页面
    async fn close(&self) -> StepResult<()>;
}

/// 浏览器会话
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 打开新页面
    async fn open_page(&self) -> StepResult<Arc<dyn PageDriver>>;

    /// 关闭所有页面和会话本身
    async fn close(&self) -> StepResult<()>;
}

/// 作用域内的页面
///
/// 通过 `release` 显式关闭；如果因为提前返回或 panic 没有调用，
/// 在 drop 时把关闭操作交给当前运行时完成。
pub struct ScopedPage {
    page: Arc<dyn PageDriver>,
    label: &'static str,
    released: bool,
}

impl ScopedPage {
    /// 从会话中打开页面
    pub async fn open(session: &dyn BrowserSession, label: &'static str) -> StepResult<Self> {
        let page = session.open_page().await?;
        debug!("页面已打开: {}", label);
        Ok(Self {
            page,
            label,
            released: false,
        })
    }

    pub fn page(&self) -> &dyn PageDriver {
        self.page.as_ref()
    }

    /// 关闭页面，失败只记录日志
    pub async fn release(mut self) {
        self.released = true;
        match self.page.close().await {
            Ok(()) => debug!("页面已关闭: {}", self.label),
            Err(e) => warn!("⚠️ 页面关闭失败 ({}): {}", self.label, e),
        }
    }
}

impl Drop for ScopedPage {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let page = Arc::clone(&self.page);
        let label = self.label;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = page.close().await {
                    warn!("⚠️ 页面关闭失败 ({}): {}", label, e);
                }
            });
        } else {
            warn!("⚠️ 无运行时，页面未能关闭: {}", label);
        }
    }
}

/// 会话拆除守卫
///
/// 无论正常结束、致命错误还是中断，拆除只会执行一次，且不会向外抛错。
pub struct SessionGuard {
    session: Arc<dyn BrowserSession>,
    closed: AtomicBool,
}

impl SessionGuard {
    pub fn new(session: Arc<dyn BrowserSession>) -> Self {
        Self {
            session,
            closed: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &dyn BrowserSession {
        self.session.as_ref()
    }

    /// 关闭会话（幂等）
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("会话已关闭，忽略重复拆除");
            return;
        }
        match self.session.close().await {
            Ok(()) => info!("🛑 浏览器会话已关闭"),
            Err(e) => warn!("⚠️ 关闭浏览器会话失败: {}", e),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
