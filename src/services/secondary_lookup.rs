//! 交叉核对流程 - 业务能力层
//!
//! 只按页面文字做子串匹配（区分大小写），不解析结构。

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{Config, SecondarySite, Timing};
use crate::error::StepResult;
use crate::infrastructure::{PageDriver, StepExecutor, WaitOptions};
use crate::models::AutomationOutcome;
use crate::services::{ArtifactCapture, LookupReport};

/// 交叉核对
pub struct SecondaryLookup {
    site: SecondarySite,
    timing: Timing,
    capture: Arc<ArtifactCapture>,
}

impl SecondaryLookup {
    pub fn new(config: &Config, capture: Arc<ArtifactCapture>) -> Self {
        Self {
            site: config.secondary.clone(),
            timing: config.timing.clone(),
            capture,
        }
    }

    /// 按页面文字归类：先看海外标记，再看移动网络标记
    pub fn classify_markup(&self, markup: &str, result_text: Option<String>) -> AutomationOutcome {
        let contains_any = |markers: &[String]| markers.iter().any(|m| !m.is_empty() && markup.contains(m.as_str()));

        if contains_any(&self.site.overseas_markers) {
            AutomationOutcome::Overseas
        } else if contains_any(&self.site.mobile_markers) {
            AutomationOutcome::Mobile
        } else {
            AutomationOutcome::Located {
                location_text: result_text.unwrap_or_default(),
            }
        }
    }

    pub async fn run(&self, page: &dyn PageDriver, ip_address: &str) -> LookupReport {
        match self.steps(page, ip_address).await {
            Ok(outcome) => {
                info!("✓ 交叉核对结果: {}", outcome.label());
                let artifact_id = self.capture.capture(page, ip_address, "secondary").await;
                LookupReport { outcome, artifact_id }
            }
            Err(error) => {
                warn!("⚠️ 交叉核对失败: {}", error);
                let artifact_id = if error.is_fatal_session() {
                    None
                } else {
                    self.capture.capture(page, ip_address, "secondary_error").await
                };
                LookupReport {
                    outcome: AutomationOutcome::Failed { error },
                    artifact_id,
                }
            }
        }
    }

    async fn steps(&self, page: &dyn PageDriver, ip_address: &str) -> StepResult<AutomationOutcome> {
        let executor = StepExecutor::new(page);
        let t = &self.timing;
        let ms = Duration::from_millis;

        executor.navigate(&self.site.url, ms(t.navigation_timeout_ms)).await?;
        executor
            .wait_for_element(&self.site.input_selector, WaitOptions::visible(ms(t.element_timeout_ms)))
            .await?;
        executor.fill_field(&self.site.input_selector, ip_address).await?;
        executor
            .click_and_await_navigation(&self.site.submit_selector, ms(t.navigation_timeout_ms))
            .await?;
        executor.settle(ms(t.result_settle_ms)).await;

        let markup = executor.page_markup().await?;
        let result_text = match &self.site.result_selector {
            Some(selector) => page.text_content(selector).await?,
            None => None,
        };
        Ok(self.classify_markup(&markup, result_text))
    }
}
