//! Google Sheets 客户端
//!
//! 只实现按范围读取和 RAW 模式写入两种调用

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::clients::{GoogleAuth, TabularStore};
use crate::error::StoreError;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// 表格客户端
pub struct SheetsClient {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    base_url: String,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, auth: Arc<GoogleAuth>) -> Self {
        Self {
            http,
            auth,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// 构建 `{base}/{id}/values/{range}`，范围中的表名和 `!` 会被转义
    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| StoreError::Other(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Other(format!("无效的 API 地址: {}", self.base_url)))?
            .push(spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }
}

/// 单元格值统一转为字符串
fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(range, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadResponse {
                endpoint: range.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| StoreError::request_failed(range, e))?;
        debug!("读取 {}: {} 行", range, value_range.values.len());

        Ok(value_range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), StoreError> {
        let mut url = self.values_url(spreadsheet_id, range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let token = self.auth.access_token().await?;

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(range, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadResponse {
                endpoint: range.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        debug!("写入 {} 完成", range);
        Ok(())
    }
}
