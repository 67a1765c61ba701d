//! 单行处理流程 - 流程层
//!
//! 核心职责：定义"一行 IP"的查询顺序
//!
//! 流程顺序：
//! 1. 交叉核对（启用时）→ 海外 / 移动网络直接结束
//! 2. 主查询 → 结果归类
//!
//! 每个查询使用独立页面，结束时无论成功失败都会关闭。

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{file_view_link, BlobStore};
use crate::config::Config;
use crate::error::StepError;
use crate::infrastructure::{BrowserSession, ScopedPage};
use crate::models::AutomationOutcome;
use crate::services::{
    ArtifactCapture, ClassifiedLocation, LookupReport, PrimaryLookup, ResultClassifier, SecondaryLookup,
};
use crate::workflow::row_ctx::RowCtx;

/// 单行处理结论
#[derive(Debug)]
pub enum RowVerdict {
    /// 交叉核对判定为海外 / 移动网络
    Status(AutomationOutcome),
    /// 主查询没有可用地址
    Sentinel { artifact_link: Option<String> },
    /// 主查询得到地址，等待管辖查找
    Address {
        location_text: String,
        artifact_link: Option<String>,
    },
    /// 任一查询失败
    Failed(StepError),
}

/// 单行处理流程
///
/// - 决定先查哪个站点、何时提前结束
/// - 只借用会话，不持有浏览器
/// - 不写表格，不做管辖查找
pub struct RowFlow {
    primary: PrimaryLookup,
    secondary: Option<SecondaryLookup>,
    classifier: ResultClassifier,
}

impl RowFlow {
    pub fn new(config: &Config, blob: Arc<dyn BlobStore>) -> Self {
        let capture = Arc::new(ArtifactCapture::from_config(config, blob));
        Self {
            primary: PrimaryLookup::new(config, Arc::clone(&capture)),
            secondary: config
                .secondary
                .enabled
                .then(|| SecondaryLookup::new(config, Arc::clone(&capture))),
            classifier: ResultClassifier::from_config(config),
        }
    }

    pub fn classifier(&self) -> &ResultClassifier {
        &self.classifier
    }

    pub async fn run(&self, session: &dyn BrowserSession, ctx: &RowCtx) -> RowVerdict {
        // ========== 流程 1: 交叉核对 ==========
        if let Some(secondary) = &self.secondary {
            info!("{} 🔍 交叉核对 {}", ctx, ctx.ip_address);
            let report = match ScopedPage::open(session, "secondary").await {
                Ok(scoped) => {
                    let report = secondary.run(scoped.page(), &ctx.ip_address).await;
                    scoped.release().await;
                    report
                }
                Err(e) => return self.failed(ctx, e),
            };

            match report.outcome {
                AutomationOutcome::Located { .. } => {}
                AutomationOutcome::Failed { error } => return self.failed(ctx, error),
                status => {
                    info!("{} 交叉核对判定为{}，跳过主查询", ctx, status.label());
                    return RowVerdict::Status(status);
                }
            }
        }

        // ========== 流程 2: 主查询 ==========
        info!("{} 🔍 主查询 {}", ctx, ctx.ip_address);
        let LookupReport { outcome, artifact_id } = match ScopedPage::open(session, "primary").await {
            Ok(scoped) => {
                let report = self.primary.run(scoped.page(), &ctx.ip_address).await;
                scoped.release().await;
                report
            }
            Err(e) => return self.failed(ctx, e),
        };
        let artifact_link = artifact_id.as_deref().map(file_view_link);

        match outcome {
            AutomationOutcome::Located { location_text } => match self.classifier.classify(&location_text) {
                ClassifiedLocation::Address(location_text) => RowVerdict::Address {
                    location_text,
                    artifact_link,
                },
                ClassifiedLocation::Sentinel(_) => {
                    info!("{} 主查询没有可用地址，记为标记文本", ctx);
                    RowVerdict::Sentinel { artifact_link }
                }
            },
            AutomationOutcome::Failed { error } => self.failed(ctx, error),
            status => RowVerdict::Status(status),
        }
    }

    fn failed(&self, ctx: &RowCtx, error: StepError) -> RowVerdict {
        if error.is_fatal_session() {
            error!("{} ❌ 致命会话错误: {}", ctx, error);
        } else {
            warn!("{} ⚠️ 查询失败: {}", ctx, error);
        }
        RowVerdict::Failed(error)
    }
}
