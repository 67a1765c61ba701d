//! 外部存储客户端
//!
//! 表格存储和文件存储只通过下面两个 trait 使用，具体实现基于 Google REST API。

pub mod auth;
pub mod drive;
pub mod sheets;

pub use auth::GoogleAuth;
pub use drive::DriveClient;
pub use sheets::SheetsClient;

use async_trait::async_trait;

use crate::error::StoreError;

/// 表格存储
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// 读取范围内的所有行
    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, StoreError>;

    /// 以 RAW 模式写入范围（不做公式计算和类型转换）
    async fn write_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), StoreError>;
}

/// 文件存储
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 上传文件，返回远端文件 ID
    async fn upload(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        parent_folder_id: &str,
        mime_type: &str,
    ) -> Result<String, StoreError>;
}

/// 远端文件的查看链接
pub fn file_view_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/view", file_id)
}
