//! 基础设施层
//!
//! 持有稀缺资源（浏览器会话、页面），只向上暴露能力

pub mod chrome;
pub mod page;
pub mod step_executor;

pub use chrome::{ChromePage, ChromeSession};
pub use page::{BrowserSession, PageDriver, ScopedPage, SessionGuard};
pub use step_executor::{StepExecutor, WaitOptions};
