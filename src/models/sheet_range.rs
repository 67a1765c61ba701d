//! 表格范围地址（"表名!列行:列行"）

/// 列索引（从 0 开始）转换为列字母
///
/// 0 → A, 25 → Z, 26 → AA
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 单行范围
pub fn row_range(sheet: &str, first_column: usize, last_column: usize, row_number: usize) -> String {
    format!(
        "{}!{}{}:{}{}",
        sheet,
        column_letter(first_column),
        row_number,
        column_letter(last_column),
        row_number
    )
}

/// 单元格范围
pub fn cell_range(sheet: &str, column: usize, row_number: usize) -> String {
    format!("{}!{}{}", sheet, column_letter(column), row_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(9), "J");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn test_ranges() {
        assert_eq!(row_range("시트1", 0, 9, 5), "시트1!A5:J5");
        assert_eq!(cell_range("시트1", 9, 12), "시트1!J12");
    }
}
