//! 测试用的内存实现：浏览器会话、页面、表格存储、文件存储

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ip_jurisdiction_lookup::clients::{BlobStore, TabularStore};
use ip_jurisdiction_lookup::config::{Config, Timing};
use ip_jurisdiction_lookup::error::{StepError, StepResult, StoreError};
use ip_jurisdiction_lookup::infrastructure::{BrowserSession, PageDriver};
use ip_jurisdiction_lookup::models::JobRow;

/// 某个 IP 在两个站点上的表现
#[derive(Debug, Clone, Default)]
pub struct IpScript {
    /// 主查询结果；为 None 时结果元素永远不出现
    pub address: Option<String>,
    /// 交叉核对页面内容
    pub whois_markup: String,
    /// 输入 IP 后控制通道断开
    pub fatal: bool,
}

impl IpScript {
    pub fn located(address: &str) -> Self {
        Self {
            address: Some(address.to_string()),
            whois_markup: "<td>주식회사 케이티</td>".to_string(),
            fatal: false,
        }
    }
}

/// 所有页面共享的记录
#[derive(Default)]
pub struct Journal {
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub session_closes: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
    pub typed: Mutex<Vec<String>>,
}

pub struct FakeSession {
    script: Arc<HashMap<String, IpScript>>,
    pub journal: Arc<Journal>,
}

impl FakeSession {
    pub fn new(script: Vec<(&str, IpScript)>) -> Self {
        Self {
            script: Arc::new(script.into_iter().map(|(ip, s)| (ip.to_string(), s)).collect()),
            journal: Arc::new(Journal::default()),
        }
    }

    pub fn typed(&self) -> Vec<String> {
        self.journal.typed.lock().unwrap().clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.journal.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn open_page(&self) -> StepResult<Arc<dyn PageDriver>> {
        self.journal.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakePage {
            script: Arc::clone(&self.script),
            journal: Arc::clone(&self.journal),
            current_ip: Mutex::new(None),
        }))
    }

    async fn close(&self) -> StepResult<()> {
        self.journal.session_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakePage {
    script: Arc<HashMap<String, IpScript>>,
    journal: Arc<Journal>,
    current_ip: Mutex<Option<String>>,
}

impl FakePage {
    fn current(&self) -> Option<IpScript> {
        let ip = self.current_ip.lock().unwrap().clone()?;
        self.script.get(&ip).cloned()
    }

    fn check_session(&self) -> StepResult<()> {
        match self.current() {
            Some(script) if script.fatal => Err(StepError::Session("Target closed".to_string())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> StepResult<()> {
        self.journal.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn element_present(&self, selector: &str, _visible: bool) -> StepResult<bool> {
        self.check_session()?;
        Ok(match selector {
            ".popup_close" => false,
            "#lbAddr" => self.current().is_some_and(|s| s.address.is_some()),
            _ => true,
        })
    }

    async fn clear_and_type(&self, _selector: &str, value: &str) -> StepResult<()> {
        self.journal.typed.lock().unwrap().push(value.to_string());
        *self.current_ip.lock().unwrap() = Some(value.to_string());
        Ok(())
    }

    async fn click(&self, _selector: &str) -> StepResult<()> {
        self.check_session()
    }

    async fn click_and_wait_navigation(&self, _selector: &str) -> StepResult<()> {
        self.check_session()
    }

    async fn text_content(&self, selector: &str) -> StepResult<Option<String>> {
        self.check_session()?;
        Ok(match selector {
            "#lbAddr" => self.current().and_then(|s| s.address),
            _ => None,
        })
    }

    async fn content(&self) -> StepResult<String> {
        self.check_session()?;
        Ok(self.current().map(|s| s.whois_markup).unwrap_or_default())
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> StepResult<()> {
        std::fs::write(path, b"\x89PNG").map_err(|source| StepError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    async fn close(&self) -> StepResult<()> {
        self.journal.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 记录所有写入的表格
#[derive(Default)]
pub struct FakeStore {
    pub writes: Mutex<Vec<(String, Vec<Vec<String>>)>>,
    /// 写入这些范围时返回错误
    pub failing_ranges: Vec<String>,
}

impl FakeStore {
    pub fn writes(&self) -> Vec<(String, Vec<Vec<String>>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_to(&self, range: &str) -> Option<Vec<String>> {
        self.writes()
            .into_iter()
            .find(|(r, _)| r == range)
            .and_then(|(_, rows)| rows.into_iter().next())
    }
}

#[async_trait]
impl TabularStore for FakeStore {
    async fn read_range(&self, _spreadsheet_id: &str, _range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        Ok(Vec::new())
    }

    async fn write_range(
        &self,
        _spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), StoreError> {
        if self.failing_ranges.iter().any(|r| r == range) {
            return Err(StoreError::Other(format!("write rejected: {}", range)));
        }
        self.writes.lock().unwrap().push((range.to_string(), rows));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBlob {
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl BlobStore for FakeBlob {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        display_name: &str,
        _parent_folder_id: &str,
        _mime_type: &str,
    ) -> Result<String, StoreError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(display_name.to_string());
        Ok(format!("blob-{}", uploads.len()))
    }
}

/// 所有等待为 0、超时很短的配置
pub fn test_config(staging_dir: &Path, secondary: bool) -> Config {
    let mut config = Config {
        spreadsheet_id: "sheet-1".to_string(),
        screenshot_folder_id: "folder-1".to_string(),
        staging_dir: staging_dir.display().to_string(),
        ..Config::default()
    };
    config.secondary.enabled = secondary;
    config.timing = Timing {
        navigation_timeout_ms: 500,
        element_timeout_ms: 100,
        result_timeout_ms: 100,
        popup_timeout_ms: 0,
        initial_settle_ms: 0,
        short_delay_ms: 0,
        result_settle_ms: 0,
        status_cooldown_ms: 0,
    };
    config
}

/// 按 (IP, 位置列) 构建任务行，行号从 2 开始
pub fn job_rows(config: &Config, rows: &[(&str, &str)]) -> Vec<JobRow> {
    rows.iter()
        .enumerate()
        .map(|(index, (ip, location))| {
            let mut cells = vec![String::new(); 9];
            cells[config.columns.ip_address] = ip.to_string();
            cells[config.columns.title] = format!("제목 {}", index);
            cells[config.columns.location] = location.to_string();
            JobRow::from_cells(index, config.job_first_row, cells, &config.columns)
        })
        .collect()
}
