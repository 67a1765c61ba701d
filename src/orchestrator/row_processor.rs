//! 行处理器 - 编排层
//!
//! 从续跑起点开始逐行处理，每行的写回完成后才开始下一行。
//! 普通失败写入错误列后继续；致命会话错误写入错误列后中止整个运行。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clients::{BlobStore, TabularStore};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::BrowserSession;
use crate::models::job_row::row_width;
use crate::models::{cell_range, find_resume_point, row_range, JobRow, JurisdictionRecord, RowUpdate};
use crate::services::jurisdiction_resolver;
use crate::utils::logging::{log_resume_point, log_row_start, truncate_text};
use crate::workflow::{RowCtx, RowFlow, RowVerdict};

/// 错误列前缀
pub const ERROR_PREFIX: &str = "ERROR: ";

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    /// 查到地址的行
    pub located: usize,
    /// 查到地址但没有匹配到管辖的行
    pub unmatched: usize,
    /// 写入标记文本的行（海外 / 移动网络 / 无地址）
    pub status: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunStats {
    pub fn written(&self) -> usize {
        self.located + self.status
    }
}

/// 行处理器
pub struct RowProcessor {
    config: Arc<Config>,
    store: Arc<dyn TabularStore>,
    flow: RowFlow,
    records: Vec<JurisdictionRecord>,
}

impl RowProcessor {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn TabularStore>,
        blob: Arc<dyn BlobStore>,
        records: Vec<JurisdictionRecord>,
    ) -> Self {
        let flow = RowFlow::new(&config, blob);
        Self {
            config,
            store,
            flow,
            records,
        }
    }

    /// 处理所有行
    ///
    /// 只有致命会话错误和错误列写入失败会返回 `Err`。
    pub async fn run(&self, session: &dyn BrowserSession, rows: &[JobRow]) -> AppResult<RunStats> {
        let marker = self.config.marker_field;
        let mut stats = RunStats {
            total: rows.len(),
            ..Default::default()
        };

        let Some(start) = find_resume_point(rows, marker) else {
            info!("✓ 所有行都已处理，无需继续");
            stats.skipped = rows.len();
            return Ok(stats);
        };
        log_resume_point(start, rows[start].row_number);
        stats.skipped += start;

        for row in &rows[start..] {
            if !row.is_eligible(marker) {
                debug!("[行 {}] 已处理或没有 IP，跳过", row.row_number);
                stats.skipped += 1;
                continue;
            }
            self.process_row(session, row, &mut stats).await?;
        }

        Ok(stats)
    }

    async fn process_row(&self, session: &dyn BrowserSession, row: &JobRow, stats: &mut RunStats) -> AppResult<()> {
        let ctx = RowCtx::from(row);
        log_row_start(&ctx);

        match self.flow.run(session, &ctx).await {
            RowVerdict::Status(outcome) => {
                let update = self.sentinel_update(None);
                if self.write_update(row, &ctx, &update, stats).await? {
                    stats.status += 1;
                    info!("{} ✓ {}: 已写入 {}", ctx, outcome.label(), update.location);
                }
                self.cooldown(&ctx).await;
            }
            RowVerdict::Sentinel { artifact_link } => {
                let update = self.sentinel_update(artifact_link);
                if self.write_update(row, &ctx, &update, stats).await? {
                    stats.status += 1;
                    info!("{} ✓ 已写入 {}", ctx, update.location);
                }
            }
            RowVerdict::Address {
                location_text,
                artifact_link,
            } => {
                let station = jurisdiction_resolver::resolve(&location_text, &self.records);
                match station {
                    Some(station) => info!("{} ✓ 管辖: {}", ctx, station),
                    None => warn!("{} ⚠️ 没有匹配的管辖: {}", ctx, truncate_text(&location_text, 40)),
                }
                let update = RowUpdate {
                    jurisdiction: station.unwrap_or_default().to_string(),
                    location: location_text,
                    artifact_link,
                };
                if self.write_update(row, &ctx, &update, stats).await? {
                    stats.located += 1;
                    if station.is_none() {
                        stats.unmatched += 1;
                    }
                }
            }
            RowVerdict::Failed(step_error) => {
                self.record_failure(row, &ctx, &step_error.to_string(), stats).await?;
                if step_error.is_fatal_session() {
                    return Err(AppError::aborted(row.row_number, step_error.to_string()));
                }
            }
        }
        Ok(())
    }

    fn sentinel_update(&self, artifact_link: Option<String>) -> RowUpdate {
        let sentinel = self.flow.classifier().sentinel().to_string();
        RowUpdate {
            jurisdiction: sentinel.clone(),
            location: sentinel,
            artifact_link,
        }
    }

    /// 整行写回结果；写入失败时改为记录错误，返回是否写入成功
    async fn write_update(
        &self,
        row: &JobRow,
        ctx: &RowCtx,
        update: &RowUpdate,
        stats: &mut RunStats,
    ) -> AppResult<bool> {
        let layout = &self.config.columns;
        let range = row_range(&self.config.job_sheet, 0, row_width(layout) - 1, row.row_number);
        let cells = row.write_back_cells(update, layout);

        match self
            .store
            .write_range(&self.config.spreadsheet_id, &range, vec![cells])
            .await
        {
            Ok(()) => {
                debug!("{} 已写回 {}", ctx, range);
                Ok(true)
            }
            Err(e) => {
                let message = format!("结果写回失败: {}", e);
                self.record_failure(row, ctx, &message, stats).await?;
                Ok(false)
            }
        }
    }

    /// 只写错误列，其他列保持不变
    async fn record_failure(&self, row: &JobRow, ctx: &RowCtx, message: &str, stats: &mut RunStats) -> AppResult<()> {
        stats.failed += 1;
        let range = cell_range(&self.config.job_sheet, self.config.columns.error, row.row_number);
        let cell = format!("{}{}", ERROR_PREFIX, message);

        self.store
            .write_range(&self.config.spreadsheet_id, &range, vec![vec![cell]])
            .await
            .map_err(|e| {
                error!("{} ❌ 错误信息写入失败: {}", ctx, e);
                AppError::Store(e)
            })?;
        warn!("{} ❌ 已记录错误: {}", ctx, message);
        Ok(())
    }

    async fn cooldown(&self, ctx: &RowCtx) {
        let cooldown = Duration::from_millis(self.config.timing.status_cooldown_ms);
        if !cooldown.is_zero() {
            debug!("{} 冷却 {}ms", ctx, cooldown.as_millis());
            tokio::time::sleep(cooldown).await;
        }
    }
}

