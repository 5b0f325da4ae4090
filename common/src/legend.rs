//! 凡例テキスト生成
//!
//! 配置順と識別属性（ウェハ番号・ロット/ウェハ・条件フォルダ）を対応付ける
//! キャプション文字列を組み立てる。

/// 凡例の見出し
pub const LEGEND_HEADER: &str = "Legend:";

/// 条件比較凡例の1項目の幅（中央揃え）
pub const PIVOT_CELL_WIDTH: usize = 13;

/// ロット別ページのタイトル: "{key}: {n} wafer images"
pub fn lot_title(key: &str, item_count: usize) -> String {
    format!("{}: {} wafer images", key, item_count)
}

/// ファイル名からウェハ番号ラベルを取り出す
///
/// `-` 区切りの末尾から2番目を2桁ゼロ埋めする。数値でなければ "00"。
/// 例: "P_L1_W-07-x.png" → "07"
pub fn wafer_label(file_name: &str) -> String {
    let tokens: Vec<&str> = file_name.split('-').collect();
    let number = if tokens.len() >= 2 {
        tokens[tokens.len() - 2].trim().parse::<u32>().unwrap_or(0)
    } else {
        0
    };
    format!("{:02}", number)
}

/// ロット別ページの凡例（グリッド1行 = 凡例1行）
#[derive(Debug, Clone)]
pub struct LotLegend {
    text: String,
}

impl Default for LotLegend {
    fn default() -> Self {
        Self::new()
    }
}

impl LotLegend {
    pub fn new() -> Self {
        Self {
            text: format!("{}\n", LEGEND_HEADER),
        }
    }

    /// 配置した画像のラベルを現在行に追加
    pub fn push_label(&mut self, label: &str) {
        self.text.push(' ');
        self.text.push_str(label);
    }

    /// 行を閉じる
    pub fn end_row(&mut self) {
        self.text.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// 条件比較ページの凡例
///
/// ページ内の配置順に、行キー（ロット::ウェハ）と上段/下段の条件名を並べる。
/// ページ境界で `take()` して次ページ用にクリアする。
#[derive(Debug, Clone, Default)]
pub struct PivotLegend {
    headers: Vec<String>,
    first_row: Vec<String>,
    second_row: Vec<String>,
}

impl PivotLegend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_header(&mut self, row_key: &str) {
        self.headers.push(row_key.to_string());
    }

    pub fn push_first(&mut self, column: &str) {
        self.first_row.push(column.to_string());
    }

    pub fn push_second(&mut self, column: &str) {
        self.second_row.push(column.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.first_row.is_empty() && self.second_row.is_empty()
    }

    pub fn render(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            LEGEND_HEADER,
            centered_line(&self.headers),
            centered_line(&self.first_row),
            centered_line(&self.second_row),
        )
    }

    /// 描画して中身をクリア
    pub fn take(&mut self) -> String {
        let text = self.render();
        *self = Self::default();
        text
    }
}

fn centered_line(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("{:^width$}", v, width = PIVOT_CELL_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wafer_label() {
        assert_eq!(wafer_label("A_L1_W-01-x.png"), "01");
        assert_eq!(wafer_label("A_L1_W-7-x.png"), "07");
        assert_eq!(wafer_label("A_L1_W-12-x.png"), "12");
        // 数値でない場合は00
        assert_eq!(wafer_label("A_L1_W-ab-x.png"), "00");
        assert_eq!(wafer_label("noseparator.png"), "00");
    }

    #[test]
    fn test_lot_title() {
        assert_eq!(lot_title("A::L1", 2), "A::L1: 2 wafer images");
    }

    #[test]
    fn test_lot_legend_rows() {
        let mut legend = LotLegend::new();
        legend.push_label("01");
        legend.push_label("02");
        legend.end_row();
        legend.push_label("03");
        legend.end_row();
        assert_eq!(legend.as_str(), "Legend:\n 01 02\n 03\n");
    }

    #[test]
    fn test_pivot_legend_centered() {
        let mut legend = PivotLegend::new();
        legend.push_header("L1::01");
        legend.push_first("A");
        legend.push_second("B");
        let text = legend.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Legend:");
        assert_eq!(lines[1], "   L1::01    ");
        assert_eq!(lines[2], "      A      ");
        assert_eq!(lines[3], "      B      ");
    }

    #[test]
    fn test_pivot_legend_take_clears() {
        let mut legend = PivotLegend::new();
        legend.push_header("L1::01");
        legend.push_first("A");
        let _ = legend.take();
        assert!(legend.is_empty());
    }
}
