//! 运行驱动 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：读取授权信息，创建表格和文件存储客户端
//! 2. **数据加载**：整体读取参考表和任务表
//! 3. **资源管理**：唯一持有浏览器会话的模块，结束时只拆除一次
//! 4. **中断处理**：Ctrl+C 或浏览器断开时有序退出

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::browser;
use crate::clients::{BlobStore, DriveClient, GoogleAuth, SheetsClient, TabularStore};
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, StepError};
use crate::infrastructure::SessionGuard;
use crate::models::job_row::row_width;
use crate::models::{column_letter, find_resume_point, load_jurisdiction_records, JobRow, JurisdictionRecord};
use crate::orchestrator::row_processor::{RowProcessor, RunStats};
use crate::utils::logging::{log_rows_loaded, print_final_stats};

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    store: Arc<dyn TabularStore>,
    blob: Arc<dyn BlobStore>,
}

impl App {
    /// 初始化应用
    ///
    /// 授权文件缺失在这里直接失败，此时还没有修改任何行。
    pub fn initialize(config: Config) -> AppResult<Self> {
        let http = reqwest::Client::new();
        let auth = Arc::new(GoogleAuth::from_files(
            http.clone(),
            &config.credentials_path,
            &config.token_path,
        )?);

        Ok(Self::with_stores(
            config,
            Arc::new(SheetsClient::new(http.clone(), Arc::clone(&auth))),
            Arc::new(DriveClient::new(http, auth)),
        ))
    }

    /// 使用指定的存储实现
    pub fn with_stores(config: Config, store: Arc<dyn TabularStore>, blob: Arc<dyn BlobStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            blob,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunStats> {
        let records = self.load_records().await?;
        let rows = self.load_rows().await?;
        log_rows_loaded(rows.len(), records.len());

        if find_resume_point(&rows, self.config.marker_field).is_none() {
            info!("✓ 没有待处理的行，不启动浏览器");
            let stats = RunStats {
                total: rows.len(),
                skipped: rows.len(),
                ..Default::default()
            };
            print_final_stats(&stats, &self.config.output_log_file);
            return Ok(stats);
        }

        let chrome = Arc::new(
            browser::open_session(&self.config)
                .await
                .map_err(|e| AppError::Other(format!("浏览器启动失败: {:#}", e)))?,
        );
        let guard = SessionGuard::new(chrome.clone());
        let processor = RowProcessor::new(
            Arc::clone(&self.config),
            Arc::clone(&self.store),
            Arc::clone(&self.blob),
            records,
        );

        let shutdown = async {
            tokio::select! {
                Ok(()) = tokio::signal::ctrl_c() => AppError::Interrupted,
                reason = chrome.wait_lost() => AppError::Step(StepError::Session(reason)),
            }
        };

        let result = drive(&guard, &processor, &rows, shutdown).await;
        if let Ok(stats) = &result {
            print_final_stats(stats, &self.config.output_log_file);
        }
        result
    }

    async fn load_records(&self) -> AppResult<Vec<JurisdictionRecord>> {
        info!("📁 正在读取参考表 {}", self.config.reference_range);
        let raw = self
            .store
            .read_range(&self.config.spreadsheet_id, &self.config.reference_range)
            .await?;
        let records = load_jurisdiction_records(&raw, &self.config.reference_columns);
        if records.is_empty() {
            return Err(ConfigError::EmptyReferenceTable(self.config.reference_range.clone()).into());
        }
        Ok(records)
    }

    async fn load_rows(&self) -> AppResult<Vec<JobRow>> {
        let range = format!(
            "{}!A{}:{}",
            self.config.job_sheet,
            self.config.job_first_row,
            column_letter(row_width(&self.config.columns) - 1)
        );
        info!("📁 正在读取任务表 {}", range);
        let raw = self.store.read_range(&self.config.spreadsheet_id, &range).await?;

        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(index, cells)| JobRow::from_cells(index, self.config.job_first_row, cells, &self.config.columns))
            .collect())
    }
}

/// 在会话上处理所有行，并与中断信号竞争
///
/// 无论正常结束、致命错误还是中断，会话都会在返回前拆除且只拆除一次。
pub async fn drive<F>(guard: &SessionGuard, processor: &RowProcessor, rows: &[JobRow], shutdown: F) -> AppResult<RunStats>
where
    F: Future<Output = AppError>,
{
    let result = tokio::select! {
        result = processor.run(guard.session(), rows) => result,
        reason = shutdown => Err(reason),
    };

    match &result {
        Ok(_) => info!("✓ 所有行处理完毕"),
        Err(AppError::Interrupted) => warn!("🛑 收到中断信号，正在关闭浏览器..."),
        Err(e) => error!("❌ 运行中止: {}", e),
    }

    guard.shutdown().await;
    result
}

/// 错误对应的进程退出码
pub fn exit_code_for(result: &AppResult<RunStats>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(AppError::Interrupted) => 130,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&Ok(RunStats::default())), 0);
        assert_eq!(exit_code_for(&Err(AppError::Interrupted)), 130);
        assert_eq!(exit_code_for(&Err(AppError::aborted(5, "Target closed"))), 1);
    }
}
