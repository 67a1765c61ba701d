//! 任务表中的一行

use crate::config::{ColumnLayout, MarkerField};

/// 任务行
///
/// 每次运行整体读取一次，只通过单次回写修改，不会删除。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    /// 数据区内的序号（从 0 开始）
    pub index: usize,
    /// 表格中的实际行号
    pub row_number: usize,
    pub ip_address: String,
    pub title: String,
    pub company: String,
    pub assigned_jurisdiction: Option<String>,
    pub capture_timestamp: Option<String>,
    pub final_jurisdiction: Option<String>,
    pub location_text: Option<String>,
    pub error_message: Option<String>,
    /// 原始单元格，回写时原样带回非输出列
    cells: Vec<String>,
}

/// 成功处理后的回写内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub jurisdiction: String,
    pub location: String,
    pub artifact_link: Option<String>,
}

impl JobRow {
    /// 从表格原始单元格构建
    pub fn from_cells(index: usize, first_row: usize, cells: Vec<String>, layout: &ColumnLayout) -> Self {
        let text = |column: usize| cells.get(column).cloned().unwrap_or_default();
        let optional = |column: usize| cells.get(column).filter(|v| !v.is_empty()).cloned();

        Self {
            index,
            row_number: first_row + index,
            ip_address: text(layout.ip_address).trim().to_string(),
            title: text(layout.title),
            company: text(layout.company),
            assigned_jurisdiction: optional(layout.jurisdiction),
            capture_timestamp: optional(layout.capture_timestamp),
            final_jurisdiction: optional(layout.final_jurisdiction),
            location_text: optional(layout.location),
            error_message: optional(layout.error),
            cells,
        }
    }

    /// 标记列是否已填写（空白视为未填写）
    pub fn is_processed(&self, marker: MarkerField) -> bool {
        let value = match marker {
            MarkerField::Location => &self.location_text,
            MarkerField::Jurisdiction => &self.assigned_jurisdiction,
        };
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    /// 是否需要处理：有 IP 且标记列为空
    pub fn is_eligible(&self, marker: MarkerField) -> bool {
        !self.ip_address.is_empty() && !self.is_processed(marker)
    }

    /// 生成整行回写的单元格
    ///
    /// 非输出列保持原值，错误列清空。
    pub fn write_back_cells(&self, update: &RowUpdate, layout: &ColumnLayout) -> Vec<String> {
        let mut cells = self.cells.clone();
        cells.resize(row_width(layout), String::new());

        cells[layout.jurisdiction] = update.jurisdiction.clone();
        cells[layout.location] = update.location.clone();
        cells[layout.error] = String::new();
        if let (Some(column), Some(link)) = (layout.artifact_link, &update.artifact_link) {
            cells[column] = link.clone();
        }
        cells
    }
}

/// 回写范围宽度（覆盖所有已配置列）
pub fn row_width(layout: &ColumnLayout) -> usize {
    [
        layout.ip_address,
        layout.title,
        layout.company,
        layout.jurisdiction,
        layout.capture_timestamp,
        layout.final_jurisdiction,
        layout.artifact_link.unwrap_or(0),
        layout.location,
        layout.error,
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
        + 1
}

/// 查找续跑起点：第一行标记列为空的行
///
/// 之前的行不做任何检查直接跳过。
pub fn find_resume_point(rows: &[JobRow], marker: MarkerField) -> Option<usize> {
    rows.iter().position(|row| !row.is_processed(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, cells: &[&str]) -> JobRow {
        JobRow::from_cells(
            index,
            2,
            cells.iter().map(|c| c.to_string()).collect(),
            &ColumnLayout::default(),
        )
    }

    fn with_location(index: usize, location: &str) -> JobRow {
        row(index, &["1.1.1.1", "", "", "", "", "", "", "", location])
    }

    #[test]
    fn test_resume_point_skips_filled_prefix() {
        let rows = vec![
            with_location(0, "서울"),
            with_location(1, "부산"),
            with_location(2, ""),
            with_location(3, "대구"),
            with_location(4, ""),
        ];
        assert_eq!(find_resume_point(&rows, MarkerField::Location), Some(2));
        assert!(!rows[3].is_eligible(MarkerField::Location));
        assert!(rows[4].is_eligible(MarkerField::Location));
    }

    #[test]
    fn test_resume_point_none_when_all_filled() {
        let rows = vec![with_location(0, "서울"), with_location(1, "해외IP.")];
        assert_eq!(find_resume_point(&rows, MarkerField::Location), None);
    }

    #[test]
    fn test_whitespace_marker_is_unprocessed() {
        let r = with_location(0, "   ");
        assert!(!r.is_processed(MarkerField::Location));
        assert!(r.is_eligible(MarkerField::Location));
    }

    #[test]
    fn test_marker_field_selects_column() {
        let r = row(0, &["1.1.1.1", "t", "c", "강남경찰서"]);
        assert!(r.is_processed(MarkerField::Jurisdiction));
        assert!(!r.is_processed(MarkerField::Location));
    }

    #[test]
    fn test_missing_ip_is_not_eligible() {
        let r = row(0, &["  ", "t", "c"]);
        assert!(!r.is_eligible(MarkerField::Location));
        assert_eq!(r.row_number, 2);
    }

    #[test]
    fn test_write_back_preserves_passthrough() {
        let r = row(
            3,
            &["8.8.8.8", "제목", "회사", "", "2024-01-01", "최종", "문서", "", "", "ERROR: old"],
        );
        let cells = r.write_back_cells(
            &RowUpdate {
                jurisdiction: "강남경찰서".to_string(),
                location: "서울특별시 강남구 역삼동".to_string(),
                artifact_link: None,
            },
            &ColumnLayout::default(),
        );

        assert_eq!(cells.len(), 10);
        assert_eq!(cells[1], "제목");
        assert_eq!(cells[3], "강남경찰서");
        assert_eq!(cells[4], "2024-01-01");
        assert_eq!(cells[5], "최종");
        assert_eq!(cells[6], "문서");
        assert_eq!(cells[8], "서울특별시 강남구 역삼동");
        assert_eq!(cells[9], "");
    }

    #[test]
    fn test_write_back_pads_short_rows() {
        let r = row(0, &["8.8.8.8"]);
        let cells = r.write_back_cells(
            &RowUpdate {
                jurisdiction: "해외IP.".to_string(),
                location: "해외IP.".to_string(),
                artifact_link: Some("https://drive.google.com/file/d/x/view".to_string()),
            },
            &ColumnLayout::default(),
        );
        assert_eq!(cells.len(), 10);
        assert_eq!(cells[0], "8.8.8.8");
        assert_eq!(cells[7], "https://drive.google.com/file/d/x/view");
    }
}
