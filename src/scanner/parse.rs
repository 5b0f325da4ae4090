//! ファイル名・フォルダ名の分類
//!
//! 命名規則: `{product}_{lot}_{x}-{wafer}-...{.ext}`
//! 直上フォルダ名は測定条件（例: "25C"）。

/// ファイル名から取り出した識別子
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub product_id: String,
    pub lot_id: String,
    pub wafer_id: String,
}

/// `_` 区切りのトークン数
pub fn token_count(file_name: &str) -> usize {
    file_name.split('_').count()
}

/// ファイル名を分類。トークン不足なら None
pub fn parse_file_name(file_name: &str) -> Option<ParsedName> {
    let mut tokens = file_name.split('_');
    let product_id = tokens.next()?;
    let lot_id = tokens.next()?;
    let wafer_token = tokens.next()?;
    let wafer_id = wafer_token.split('-').nth(1)?;

    Some(ParsedName {
        product_id: product_id.to_string(),
        lot_id: lot_id.to_string(),
        wafer_id: wafer_id.to_string(),
    })
}

/// フォルダ名から温度を取り出す（末尾の単位文字を1つ除去）
///
/// "25C" → 25, "-40C" → -40, "room" → None
pub fn parse_temperature(folder_name: &str) -> Option<i32> {
    let trimmed = folder_name.trim();
    let numeric = trimmed
        .strip_suffix(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed);
    numeric.parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_name() {
        let parsed = parse_file_name("A_L1_W-01-x.png").unwrap();
        assert_eq!(parsed.product_id, "A");
        assert_eq!(parsed.lot_id, "L1");
        assert_eq!(parsed.wafer_id, "01");
    }

    #[test]
    fn test_parse_file_name_extra_tokens() {
        let parsed = parse_file_name("PRD_LOT9_S-12-map_extra.png").unwrap();
        assert_eq!(parsed.lot_id, "LOT9");
        assert_eq!(parsed.wafer_id, "12");
    }

    #[test]
    fn test_parse_file_name_too_few_tokens() {
        assert!(parse_file_name("A_L1.png").is_none());
        assert!(parse_file_name("plain.png").is_none());
        // 3番目のトークンに '-' が無い
        assert!(parse_file_name("A_L1_W01.png").is_none());
    }

    #[test]
    fn test_token_count() {
        assert_eq!(token_count("A_L1_W-01-x.png"), 3);
        assert_eq!(token_count("plain.png"), 1);
        assert_eq!(token_count("a_b_c_d_e.png"), 5);
    }

    #[test]
    fn test_parse_temperature() {
        assert_eq!(parse_temperature("25C"), Some(25));
        assert_eq!(parse_temperature("-40C"), Some(-40));
        assert_eq!(parse_temperature("125"), Some(125));
        assert_eq!(parse_temperature("A"), None);
        assert_eq!(parse_temperature("room"), None);
    }
}
