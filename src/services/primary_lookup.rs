//! 主查询流程 - 业务能力层
//!
//! 固定步骤：打开站点 → 关弹窗 → 输入 IP → 提交 → 读取地址。

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{Config, PrimarySite, Timing};
use crate::error::StepResult;
use crate::infrastructure::{PageDriver, StepExecutor, WaitOptions};
use crate::models::AutomationOutcome;
use crate::services::ArtifactCapture;

/// 一次查询的结果和截图
#[derive(Debug)]
pub struct LookupReport {
    pub outcome: AutomationOutcome,
    /// 已上传截图的远端 ID
    pub artifact_id: Option<String>,
}

/// 主查询
pub struct PrimaryLookup {
    site: PrimarySite,
    timing: Timing,
    capture: Arc<ArtifactCapture>,
}

impl PrimaryLookup {
    pub fn new(config: &Config, capture: Arc<ArtifactCapture>) -> Self {
        Self {
            site: config.primary.clone(),
            timing: config.timing.clone(),
            capture,
        }
    }

    /// 在给定页面上查询 IP
    ///
    /// 成功截图标记 `primary`，失败截图标记 `primary_error`。
    pub async fn run(&self, page: &dyn PageDriver, ip_address: &str) -> LookupReport {
        match self.steps(page, ip_address).await {
            Ok(location_text) => {
                info!("✓ 主查询结果: {}", location_text);
                let artifact_id = self.capture.capture(page, ip_address, "primary").await;
                LookupReport {
                    outcome: AutomationOutcome::Located { location_text },
                    artifact_id,
                }
            }
            Err(error) => {
                warn!("⚠️ 主查询失败: {}", error);
                let artifact_id = if error.is_fatal_session() {
                    None
                } else {
                    self.capture.capture(page, ip_address, "primary_error").await
                };
                LookupReport {
                    outcome: AutomationOutcome::Failed { error },
                    artifact_id,
                }
            }
        }
    }

    async fn steps(&self, page: &dyn PageDriver, ip_address: &str) -> StepResult<String> {
        let executor = StepExecutor::new(page);
        let t = &self.timing;
        let ms = Duration::from_millis;

        executor.navigate(&self.site.url, ms(t.navigation_timeout_ms)).await?;
        executor.settle(ms(t.initial_settle_ms)).await;
        executor
            .dismiss_popup_if_present(&self.site.popup_close_selector, ms(t.popup_timeout_ms))
            .await?;

        executor
            .wait_for_element(&self.site.input_selector, WaitOptions::visible(ms(t.element_timeout_ms)))
            .await?;
        executor.fill_field(&self.site.input_selector, ip_address).await?;

        executor
            .wait_for_element(&self.site.submit_selector, WaitOptions::visible(ms(t.element_timeout_ms)))
            .await?;
        executor.settle(ms(t.short_delay_ms)).await;
        executor
            .click_and_await_navigation(&self.site.submit_selector, ms(t.navigation_timeout_ms))
            .await?;
        executor.settle(ms(t.result_settle_ms)).await;

        executor
            .wait_for_element(&self.site.result_selector, WaitOptions::visible(ms(t.result_timeout_ms)))
            .await?;
        executor.settle(ms(t.short_delay_ms)).await;
        executor.extract_text(&self.site.result_selector).await
    }
}
