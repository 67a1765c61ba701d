//! 截图留档 - 业务能力层
//!
//! 截图 → 上传 → 删除本地文件。任何一步失败都只记日志，返回 `None`。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clients::BlobStore;
use crate::config::Config;
use crate::error::{StepError, StepResult};
use crate::infrastructure::PageDriver;

const PNG_MIME: &str = "image/png";

/// 暂存的本地截图
///
/// drop 时删除文件，上传成功或失败都不会留下本地文件。
struct StagedFile {
    path: PathBuf,
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("已删除本地截图: {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️ 删除本地截图失败 ({}): {}", self.path.display(), e),
        }
    }
}

/// 截图留档服务
pub struct ArtifactCapture {
    blob: Arc<dyn BlobStore>,
    staging_dir: PathBuf,
    folder_id: String,
}

impl ArtifactCapture {
    pub fn new(blob: Arc<dyn BlobStore>, staging_dir: impl Into<PathBuf>, folder_id: impl Into<String>) -> Self {
        Self {
            blob,
            staging_dir: staging_dir.into(),
            folder_id: folder_id.into(),
        }
    }

    pub fn from_config(config: &Config, blob: Arc<dyn BlobStore>) -> Self {
        Self::new(blob, &config.staging_dir, config.screenshot_folder_id.clone())
    }

    /// 截图并上传，返回远端文件 ID
    pub async fn capture(&self, page: &dyn PageDriver, ip_address: &str, tag: &str) -> Option<String> {
        let file_name = artifact_file_name(ip_address, tag, chrono::Local::now());
        match self.try_capture(page, &file_name).await {
            Ok(file_id) => {
                info!("📸 截图已上传: {} → {}", file_name, file_id);
                Some(file_id)
            }
            Err(e) => {
                warn!("⚠️ 截图留档失败 ({}): {}", file_name, e);
                None
            }
        }
    }

    async fn try_capture(&self, page: &dyn PageDriver, file_name: &str) -> StepResult<String> {
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|source| io_error(&self.staging_dir, source))?;

        let staged = StagedFile {
            path: self.staging_dir.join(file_name),
        };
        page.screenshot(&staged.path, true).await?;

        let bytes = tokio::fs::read(&staged.path)
            .await
            .map_err(|source| io_error(&staged.path, source))?;

        self.blob
            .upload(bytes, file_name, &self.folder_id, PNG_MIME)
            .await
            .map_err(|e| StepError::Page(format!("上传失败: {}", e)))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StepError {
    StepError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// `{ip}_{tag}_{YYYYMMDD_HHmmss}.png`，IP 中的分隔符替换为下划线
pub fn artifact_file_name<Tz>(ip_address: &str, tag: &str, at: chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let safe_ip: String = ip_address
        .trim()
        .chars()
        .map(|c| if matches!(c, '.' | ':' | '/' | '\\') { '_' } else { c })
        .collect();
    format!("{}_{}_{}.png", safe_ip, tag, at.format("%Y%m%d_%H%M%S"))
}
