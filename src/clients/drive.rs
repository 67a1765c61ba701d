//! Google Drive 客户端
//!
//! 以 multipart 方式一次上传元数据和内容，文件直接落在目标文件夹

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::clients::{BlobStore, GoogleAuth};
use crate::error::StoreError;

const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v3/files";

#[derive(Debug, Deserialize)]
struct FileResource {
    id: Option<String>,
}

/// 文件存储客户端
pub struct DriveClient {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, auth: Arc<GoogleAuth>) -> Self {
        Self { http, auth }
    }

    async fn check(response: reqwest::Response, endpoint: &str) -> Result<FileResource, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::request_failed(endpoint, e))
    }
}

/// 拼接 `multipart/related` 请求体：第一段是 JSON 元数据，第二段是文件内容
fn related_body(metadata: &serde_json::Value, bytes: &[u8], mime_type: &str, boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn boundary() -> String {
    format!("ipj_upload_{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[async_trait]
impl BlobStore for DriveClient {
    /// 一次请求上传内容并放入目标文件夹
    async fn upload(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        parent_folder_id: &str,
        mime_type: &str,
    ) -> Result<String, StoreError> {
        let token = self.auth.access_token().await?;

        let metadata = json!({
            "name": display_name,
            "mimeType": mime_type,
            "parents": [parent_folder_id],
        });
        let boundary = boundary();
        let body = related_body(&metadata, &bytes, mime_type, &boundary);

        let response = self
            .http
            .post(UPLOAD_ENDPOINT)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(&token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(UPLOAD_ENDPOINT, e))?;
        let file_id = Self::check(response, UPLOAD_ENDPOINT)
            .await?
            .id
            .ok_or_else(|| StoreError::MissingField {
                endpoint: UPLOAD_ENDPOINT.to_string(),
                field: "id".to_string(),
            })?;
        debug!("文件已上传: {} → {}", display_name, file_id);

        Ok(file_id)
    }
}
