//! 行处理上下文
//!
//! 封装"我正在处理表格第几行、哪个 IP"这一信息

use std::fmt::Display;

use crate::models::JobRow;

/// 行处理上下文
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 数据区内的序号（从 0 开始）
    pub index: usize,

    /// 表格中的实际行号（仅用于日志和写回范围）
    pub row_number: usize,

    pub ip_address: String,
}

impl RowCtx {
    pub fn new(index: usize, row_number: usize, ip_address: impl Into<String>) -> Self {
        Self {
            index,
            row_number,
            ip_address: ip_address.into(),
        }
    }
}

impl From<&JobRow> for RowCtx {
    fn from(row: &JobRow) -> Self {
        Self::new(row.index, row.row_number, row.ip_address.clone())
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[行 {}]", self.row_number)
    }
}
