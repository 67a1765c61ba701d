//! 管辖查找 - 业务能力层
//!
//! 纯函数：地址文字 + 参考表 → 警察署名称。
//! 先按 읍/면/동/리 精确匹配，找不到再按 구/군/시 粗匹配，都是首个命中即返回。

use std::sync::LazyLock;

use regex::Regex;

use crate::models::JurisdictionRecord;

/// 细粒度行政单位后缀
const FINE_MARKERS: [char; 4] = ['읍', '면', '동', '리'];

/// 粗粒度行政单位后缀（按优先级排列）
const COARSE_MARKERS: [char; 3] = ['구', '군', '시'];

static TRAILING_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*\)\s*$").expect("trailing paren regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// 末尾的 읍/면/동/리 单位，后面允许跟数字番地
static FINE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+(?:읍|면|동|리))\s*(?:\d.*)?$").expect("fine token regex")
});

static COARSE_TOKENS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    COARSE_MARKERS
        .iter()
        .map(|marker| Regex::new(&format!(r"(\S+{})", marker)).expect("coarse token regex"))
        .collect()
});

/// 规范化地址：去掉末尾括号说明（从第一个左括号到结尾），合并空白
pub fn normalize(location_text: &str) -> String {
    let stripped = TRAILING_PAREN.replace(location_text.trim(), "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// 提取细粒度单位（如 `역삼동`）
pub fn fine_token(normalized: &str) -> Option<&str> {
    FINE_TOKEN
        .captures(normalized)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// 按 구、군、시 的顺序提取粗粒度单位
pub fn coarse_tokens(normalized: &str) -> impl Iterator<Item = &str> {
    COARSE_TOKENS.iter().filter_map(move |re| {
        re.captures(normalized)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    })
}

fn covers_any(admin_unit: &str, markers: &[char]) -> bool {
    admin_unit.chars().any(|c| markers.contains(&c))
}

fn find_station<'r>(records: &'r [JurisdictionRecord], token: &str, markers: &[char]) -> Option<&'r str> {
    records
        .iter()
        .find(|record| covers_any(&record.admin_unit, markers) && record.jurisdiction_text.contains(token))
        .map(|record| record.station_name.as_str())
}

/// 查找地址所属的警察署
///
/// 没有命中返回 `None`，这不是错误。
pub fn resolve<'r>(location_text: &str, records: &'r [JurisdictionRecord]) -> Option<&'r str> {
    let normalized = normalize(location_text);

    if let Some(token) = fine_token(&normalized) {
        if let Some(station) = find_station(records, token, &FINE_MARKERS) {
            return Some(station);
        }
    }

    let station = coarse_tokens(&normalized).find_map(|token| find_station(records, token, &COARSE_MARKERS));
    station
}
