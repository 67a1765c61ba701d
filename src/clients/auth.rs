//! Google OAuth 令牌管理
//!
//! 读取 credentials.json / token.json，过期时用 refresh_token 换取新令牌

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::AuthError;

/// 提前刷新的余量（毫秒）
const EXPIRY_MARGIN_MS: i64 = 60_000;

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

/// OAuth 客户端信息
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// 令牌文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// 过期时间（Unix 毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl StoredToken {
    /// 是否已过期（留出余量）
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expiry_date
            .is_some_and(|expiry| expiry - EXPIRY_MARGIN_MS <= now_ms)
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Google 授权
pub struct GoogleAuth {
    http: reqwest::Client,
    secret: ClientSecret,
    token: Mutex<StoredToken>,
    token_path: PathBuf,
}

impl GoogleAuth {
    /// 从凭据文件和令牌文件加载
    ///
    /// 任一文件缺失都是启动期致命错误，不进入交互式授权流程。
    pub fn from_files(
        http: reqwest::Client,
        credentials_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Result<Self, AuthError> {
        let credentials_path = credentials_path.as_ref();
        let token_path = token_path.as_ref();

        let credentials: CredentialsFile = read_json(credentials_path)
            .map_err(|e| e.unwrap_or_else(|| AuthError::CredentialsNotFound(credentials_path.display().to_string())))?;
        let secret = credentials
            .installed
            .or(credentials.web)
            .ok_or_else(|| AuthError::MalformedCredentials(credentials_path.display().to_string()))?;

        let token: StoredToken = read_json(token_path)
            .map_err(|e| e.unwrap_or_else(|| AuthError::TokenNotFound(token_path.display().to_string())))?;

        info!("✓ 已加载授权信息: {}", token_path.display());
        Ok(Self {
            http,
            secret,
            token: Mutex::new(token),
            token_path: token_path.to_path_buf(),
        })
    }

    /// 获取可用的访问令牌，必要时刷新
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut token = self.token.lock().await;
        let now_ms = chrono::Utc::now().timestamp_millis();

        if token.is_expired(now_ms) {
            let Some(refresh_token) = token.refresh_token.clone() else {
                warn!("⚠️ 访问令牌已过期且没有 refresh_token，继续使用旧令牌");
                return Ok(token.access_token.clone());
            };
            let refreshed = self.refresh(&refresh_token).await?;
            token.access_token = refreshed.access_token;
            token.expiry_date = refreshed.expires_in.map(|secs| now_ms + secs * 1000);
            self.persist(&token).await;
        }

        Ok(token.access_token.clone())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        debug!("正在刷新访问令牌");
        let response = self
            .http
            .post(&self.secret.token_uri)
            .form(&[
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(format!("status={}, body={}", status, body)));
        }

        let refreshed = response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        info!("✓ 访问令牌已刷新");
        Ok(refreshed)
    }

    /// 写回令牌文件，失败只记录日志
    async fn persist(&self, token: &StoredToken) {
        let result = match serde_json::to_string(token) {
            Ok(json) => tokio::fs::write(&self.token_path, json).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            warn!("⚠️ 保存令牌文件失败 ({}): {}", self.token_path.display(), e);
        }
    }
}

/// 读取 JSON 文件；文件不存在时返回 `Err(None)`
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Option<AuthError>> {
    let content = std::fs::read_to_string(path).map_err(|_| None)?;
    serde_json::from_str(&content).map_err(|source| {
        Some(AuthError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
    })
}
