use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 浏览器控制请求超时相对最长单步超时的余量
const CDP_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// 判断行是否已处理时检查的输出列
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerField {
    /// 地址信息列
    Location,
    /// 管辖警察署列
    Jurisdiction,
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 表格 ID
    pub spreadsheet_id: String,
    /// 任务表名称
    pub job_sheet: String,
    /// 任务表数据起始行（表头之后）
    pub job_first_row: usize,
    /// 参考表读取范围（含表名）
    pub reference_range: String,
    /// 截图上传的目标文件夹 ID
    pub screenshot_folder_id: String,
    /// OAuth 客户端凭据文件
    pub credentials_path: String,
    /// OAuth 令牌文件
    pub token_path: String,
    /// 截图本地暂存目录
    pub staging_dir: String,
    /// 判断"已处理"所用的列
    pub marker_field: MarkerField,
    /// 无法定位时写入的标记文本
    pub sentinel: String,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径（为空时自动查找）
    pub chrome_executable: Option<String>,
    /// 已启动浏览器的调试端口，设置后连接该浏览器而不是新启动
    pub browser_debug_port: Option<u16>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    pub columns: ColumnLayout,
    pub reference_columns: ReferenceColumns,
    pub primary: PrimarySite,
    pub secondary: SecondarySite,
    pub timing: Timing,
}

/// 任务表列索引（从 0 开始）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub ip_address: usize,
    pub title: usize,
    pub company: usize,
    pub jurisdiction: usize,
    pub capture_timestamp: usize,
    pub final_jurisdiction: usize,
    /// 截图链接列，未设置时不写入
    pub artifact_link: Option<usize>,
    pub location: usize,
    pub error: usize,
}

/// 参考表列索引（相对 reference_range 起始列）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReferenceColumns {
    pub station: usize,
    pub jurisdiction: usize,
    pub admin_unit: usize,
}

/// 主查询站点
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PrimarySite {
    pub url: String,
    pub popup_close_selector: String,
    pub input_selector: String,
    pub submit_selector: String,
    pub result_selector: String,
    /// 结果中出现即视为"未找到"的文字
    pub not_found_marker: String,
}

/// 交叉核对站点
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SecondarySite {
    pub enabled: bool,
    pub url: String,
    pub input_selector: String,
    pub submit_selector: String,
    /// 国内 IP 时读取的结果区域，为空则只做文字匹配
    pub result_selector: Option<String>,
    pub overseas_markers: Vec<String>,
    pub mobile_markers: Vec<String>,
}

/// 超时与等待时间（毫秒）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub navigation_timeout_ms: u64,
    pub element_timeout_ms: u64,
    pub result_timeout_ms: u64,
    pub popup_timeout_ms: u64,
    pub initial_settle_ms: u64,
    pub short_delay_ms: u64,
    pub result_settle_ms: u64,
    pub status_cooldown_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            job_sheet: "시트1".to_string(),
            job_first_row: 2,
            reference_range: "DB!B:F".to_string(),
            screenshot_folder_id: String::new(),
            credentials_path: "credentials.json".to_string(),
            token_path: "token.json".to_string(),
            staging_dir: "screenshots".to_string(),
            marker_field: MarkerField::Location,
            sentinel: "해외IP.".to_string(),
            headless: false,
            chrome_executable: None,
            browser_debug_port: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            columns: ColumnLayout::default(),
            reference_columns: ReferenceColumns::default(),
            primary: PrimarySite::default(),
            secondary: SecondarySite::default(),
            timing: Timing::default(),
        }
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            ip_address: 0,
            title: 1,
            company: 2,
            jurisdiction: 3,
            capture_timestamp: 4,
            final_jurisdiction: 5,
            artifact_link: Some(7),
            location: 8,
            error: 9,
        }
    }
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            station: 0,
            jurisdiction: 3,
            admin_unit: 4,
        }
    }
}

impl Default for PrimarySite {
    fn default() -> Self {
        Self {
            url: "https://www.mylocation.co.kr/".to_string(),
            popup_close_selector: ".popup_close".to_string(),
            input_selector: "#txtAddr".to_string(),
            submit_selector: "#btnAddr2".to_string(),
            result_selector: "#lbAddr".to_string(),
            not_found_marker: "찾을 수 없습니다".to_string(),
        }
    }
}

impl Default for SecondarySite {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://whois.kisa.or.kr/kor/main.jsp".to_string(),
            input_selector: "#sWord".to_string(),
            submit_selector: "#btnSearch".to_string(),
            result_selector: None,
            overseas_markers: vec!["국내에서 관리되는 IP가 아닙니다.".to_string()],
            mobile_markers: vec!["이동통신".to_string()],
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 60_000,
            element_timeout_ms: 10_000,
            result_timeout_ms: 60_000,
            popup_timeout_ms: 5_000,
            initial_settle_ms: 5_000,
            short_delay_ms: 1_000,
            result_settle_ms: 2_000,
            status_cooldown_ms: 5_000,
        }
    }
}

impl Timing {
    /// 浏览器控制请求的超时
    ///
    /// 比最长的单步超时多留 30 秒，单步超时总是先触发。
    pub fn cdp_request_timeout(&self) -> Duration {
        let longest = [
            self.navigation_timeout_ms,
            self.element_timeout_ms,
            self.result_timeout_ms,
            self.popup_timeout_ms,
        ]
        .into_iter()
        .max()
        .unwrap_or_default();
        Duration::from_millis(longest) + CDP_TIMEOUT_MARGIN
    }
}

impl Config {
    /// 从 TOML 文件加载配置，再用环境变量覆盖
    ///
    /// 文件不存在时使用默认值。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let base = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_toml_str(&content, &path.display().to_string())?
        } else {
            Self::default()
        };

        base.with_env_overrides()
    }

    /// 解析 TOML 文本
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: origin.to_string(),
            source,
        })
    }

    /// 环境变量覆盖
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let mut config = self;
        if let Ok(v) = std::env::var("SPREADSHEET_ID") {
            config.spreadsheet_id = v;
        }
        if let Ok(v) = std::env::var("SCREENSHOT_FOLDER_ID") {
            config.screenshot_folder_id = v;
        }
        if let Ok(v) = std::env::var("CHROME_EXECUTABLE") {
            config.chrome_executable = Some(v);
        }
        if let Ok(v) = std::env::var("BROWSER_DEBUG_PORT") {
            let port = v.parse().map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: "BROWSER_DEBUG_PORT".to_string(),
                value: v.clone(),
                expected_type: "u16".to_string(),
            })?;
            config.browser_debug_port = Some(port);
        }
        if let Some(v) = parse_bool_env("HEADLESS")? {
            config.headless = v;
        }
        if let Some(v) = parse_bool_env("VERBOSE_LOGGING")? {
            config.verbose_logging = v;
        }
        Ok(config)
    }

    /// 校验必填项和列配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("spreadsheet_id".to_string()));
        }
        if self.screenshot_folder_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("screenshot_folder_id".to_string()));
        }
        if self.sentinel.trim().is_empty() {
            return Err(ConfigError::MissingValue("sentinel".to_string()));
        }

        let mut owned: Vec<(usize, &str)> = vec![
            (self.columns.ip_address, "ip_address"),
            (self.columns.jurisdiction, "jurisdiction"),
            (self.columns.location, "location"),
            (self.columns.error, "error"),
        ];
        if let Some(link) = self.columns.artifact_link {
            owned.push((link, "artifact_link"));
        }
        for (i, (column, name)) in owned.iter().enumerate() {
            if let Some((_, other)) = owned[..i].iter().find(|(c, _)| c == column) {
                return Err(ConfigError::ColumnConflict {
                    column: *column,
                    first: other.to_string(),
                    second: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool_env(var_name: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: "bool".to_string(),
            }),
        Err(_) => Ok(None),
    }
}
