use thiserror::Error;

/// 控制通道失效的错误特征
///
/// 错误信息包含任意一项即视为会话已不可用，整个运行需要中止。
pub const FATAL_SESSION_SIGNATURES: &[&str] = &[
    "Protocol error",
    "No target with given id found",
    "Attempted to use detached Frame",
    "Target closed",
    "Session closed",
    "Session with given id not found",
];

/// 判断错误信息是否命中致命会话特征
pub fn matches_fatal_signature(message: &str) -> bool {
    FATAL_SESSION_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 页面自动化步骤错误
    #[error("自动化错误: {0}")]
    Step(#[from] StepError),
    /// 表格 / 文件存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 授权错误
    #[error("授权错误: {0}")]
    Auth(#[from] AuthError),
    /// 致命会话错误导致运行中止
    #[error("第 {row} 行发生致命会话错误，运行中止: {message}")]
    Aborted { row: usize, message: String },
    /// 操作员中断
    #[error("收到中断信号，运行中止")]
    Interrupted,
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 页面自动化步骤错误
///
/// 所有步骤原语只返回这一种错误，由调用方决定记录还是中止。
#[derive(Debug, Error)]
pub enum StepError {
    /// 等待超时后仍未找到元素
    #[error("元素未找到: {selector} (等待 {timeout_ms}ms)")]
    ElementNotFound { selector: String, timeout_ms: u64 },
    /// 页面导航超时
    #[error("导航超时: {target} ({timeout_ms}ms)")]
    NavigationTimeout { target: String, timeout_ms: u64 },
    /// 控制协议连接已不可用
    #[error("Protocol error: {0}")]
    Session(String),
    /// 其他页面操作失败
    #[error("页面操作失败: {0}")]
    Page(String),
    /// 本地文件操作失败
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StepError {
    /// 是否为致命会话错误
    pub fn is_fatal_session(&self) -> bool {
        match self {
            StepError::Session(_) => true,
            other => matches_fatal_signature(&other.to_string()),
        }
    }
}

/// 表格 / 文件存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 返回错误响应
    #[error("返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 获取访问令牌失败
    #[error("{0}")]
    Auth(#[from] AuthError),
    /// 响应缺少必需字段
    #[error("响应缺少字段 {field} ({endpoint})")]
    MissingField { endpoint: String, field: String },
    /// 其他存储错误
    #[error("{0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必填项为空
    #[error("配置项 {0} 不能为空")]
    MissingValue(String),
    /// 输出列冲突
    #[error("输出列 {column} 被 {first} 和 {second} 同时占用")]
    ColumnConflict {
        column: usize,
        first: String,
        second: String,
    },
    /// 参考表为空
    #[error("参考表 {0} 没有数据")]
    EmptyReferenceTable(String),
}

/// 授权错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 凭据文件不存在
    #[error("找不到凭据文件: {0}")]
    CredentialsNotFound(String),
    /// 令牌文件不存在
    #[error("找不到令牌文件: {0}")]
    TokenNotFound(String),
    /// 文件内容无法解析
    #[error("无法解析 {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 凭据缺少 installed / web 段
    #[error("凭据文件 {0} 缺少 installed 或 web 配置段")]
    MalformedCredentials(String),
    /// 刷新令牌失败
    #[error("刷新访问令牌失败: {0}")]
    RefreshFailed(String),
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for StepError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        let message = err.to_string();
        match err {
            CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
                StepError::Session(message)
            }
            _ if matches_fatal_signature(&message) => StepError::Session(message),
            _ => StepError::Page(message),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建致命中止错误
    pub fn aborted(row: usize, message: impl Into<String>) -> Self {
        AppError::Aborted {
            row,
            message: message.into(),
        }
    }

    /// 是否属于需要整体拆除的致命错误
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Step(e) => e.is_fatal_session(),
            AppError::Aborted { .. } | AppError::Interrupted => true,
            _ => false,
        }
    }
}

impl StoreError {
    /// 创建请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        StoreError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 步骤结果类型
pub type StepResult<T> = Result<T, StepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_variant_is_fatal() {
        let err = StepError::Session("websocket closed".to_string());
        assert!(err.is_fatal_session());
        assert!(AppError::from(err).is_fatal());
    }

    #[test]
    fn test_element_not_found_is_recoverable() {
        let err = StepError::ElementNotFound {
            selector: "#lbAddr".to_string(),
            timeout_ms: 60000,
        };
        assert!(!err.is_fatal_session());
        assert!(err.to_string().contains("#lbAddr"));
    }

    #[test]
    fn test_page_error_with_signature_is_fatal() {
        let err = StepError::Page("No target with given id found".to_string());
        assert!(err.is_fatal_session());

        let err = StepError::Page("Attempted to use detached Frame 'A1B2'".to_string());
        assert!(err.is_fatal_session());
    }

    #[test]
    fn test_signature_match_is_case_sensitive() {
        assert!(matches_fatal_signature("Protocol error (Runtime.callFunctionOn)"));
        assert!(!matches_fatal_signature("protocol error"));
    }

    #[test]
    fn test_store_error_is_not_fatal() {
        let err = AppError::Store(StoreError::Other("quota".to_string()));
        assert!(!err.is_fatal());
    }
}
