//! 结果归类 - 业务能力层

use crate::config::{Config, PrimarySite};

/// 主查询返回文字的归类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLocation {
    /// 可用于管辖查找的地址
    Address(String),
    /// 无法定位，写入标记文本
    Sentinel(String),
}

/// 结果归类器
///
/// 文字为空、全是空白或包含"未找到"提示时替换为标记文本，否则原样返回。
#[derive(Debug, Clone)]
pub struct ResultClassifier {
    sentinel: String,
    not_found_marker: String,
}

impl ResultClassifier {
    pub fn new(sentinel: impl Into<String>, not_found_marker: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
            not_found_marker: not_found_marker.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let PrimarySite { not_found_marker, .. } = &config.primary;
        Self::new(config.sentinel.clone(), not_found_marker.clone())
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// 最终写入位置列的文字
    pub fn final_location(&self, raw: &str) -> String {
        match self.classify(raw) {
            ClassifiedLocation::Address(text) | ClassifiedLocation::Sentinel(text) => text,
        }
    }

    pub fn classify(&self, raw: &str) -> ClassifiedLocation {
        let not_found = !self.not_found_marker.is_empty() && raw.contains(&self.not_found_marker);
        if raw.trim().is_empty() || not_found || raw == self.sentinel {
            ClassifiedLocation::Sentinel(self.sentinel.clone())
        } else {
            ClassifiedLocation::Address(raw.to_string())
        }
    }
}
