//! 管辖警察署参考表

use crate::config::ReferenceColumns;

/// 参考表中的一条记录
///
/// 每次运行加载一次，之后只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionRecord {
    /// 警察署名称
    pub station_name: String,
    /// 行政单位说明（包含 읍/면/동/리 或 시/군/구 等标记）
    pub admin_unit: String,
    /// 管辖区域（列举所覆盖的地名）
    pub jurisdiction_text: String,
}

impl JurisdictionRecord {
    pub fn new(
        station_name: impl Into<String>,
        admin_unit: impl Into<String>,
        jurisdiction_text: impl Into<String>,
    ) -> Self {
        Self {
            station_name: station_name.into(),
            admin_unit: admin_unit.into(),
            jurisdiction_text: jurisdiction_text.into(),
        }
    }
}

/// 从参考表原始行构建记录
///
/// 警察署名称或管辖区域为空的行会被忽略。
pub fn load_jurisdiction_records(rows: &[Vec<String>], columns: &ReferenceColumns) -> Vec<JurisdictionRecord> {
    rows.iter()
        .filter_map(|row| {
            let cell = |i: usize| row.get(i).map(|v| v.trim()).unwrap_or_default();
            let station = cell(columns.station);
            let jurisdiction = cell(columns.jurisdiction);
            if station.is_empty() || jurisdiction.is_empty() {
                return None;
            }
            Some(JurisdictionRecord::new(station, cell(columns.admin_unit), jurisdiction))
        })
        .collect()
}
