//! 検査画像レコードとページモデルの型定義
//!
//! - ImageRecord: ファイル名から分類した1画像分の属性
//! - LotKey: ロット別ページのキー（フォルダ × ロット）
//! - Page: スライド1枚分の配置指示（画像配置 + 凡例テキスト）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 検出された画像1枚分のレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// 直上フォルダ名（測定条件）
    pub folder_name: String,
    pub file_name: String,
    pub file_path: PathBuf,

    /// ファイル名の `_` 区切りトークン数（除外判定用）
    pub token_count: usize,

    /// フォルダ名から末尾の単位文字を除いた温度（数値でなければ None）
    #[serde(default)]
    pub temperature: Option<i32>,

    pub product_id: String,
    pub lot_id: String,
    pub wafer_id: String,
}

/// ロット別ページのキー
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LotKey {
    pub folder_name: String,
    pub lot_id: String,
}

impl LotKey {
    pub fn new(folder_name: impl Into<String>, lot_id: impl Into<String>) -> Self {
        Self {
            folder_name: folder_name.into(),
            lot_id: lot_id.into(),
        }
    }
}

impl fmt::Display for LotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.folder_name, self.lot_id)
    }
}

/// ページ上に配置する画像（座標・幅はcm、左上原点）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedImage {
    pub path: PathBuf,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// 凡例・タイトル用のテキストボックス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendBlock {
    pub text: String,
    /// フォントサイズ（pt）
    pub font_size: f32,
    /// ボックス左上座標（cm）
    pub x: f32,
    pub y: f32,
    /// ボックスサイズ（cm）。描画側は収まるようにフォントを縮める
    pub width: f32,
    pub height: f32,
    /// 等幅フォントで描画するか（凡例は桁揃えのため等幅）
    pub monospace: bool,
}

/// スライド1枚分の配置指示
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    /// ログ・ダンプ用の識別名
    pub name: String,
    pub images: Vec<PlacedImage>,
    pub legends: Vec<LegendBlock>,
}

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_key_display() {
        let key = LotKey::new("25C", "L1");
        assert_eq!(key.to_string(), "25C::L1");
    }

    #[test]
    fn test_lot_key_orders_by_folder_then_lot() {
        let mut keys = vec![
            LotKey::new("B", "L1"),
            LotKey::new("A", "L2"),
            LotKey::new("A", "L1"),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["A::L1", "A::L2", "B::L1"]);
    }

    #[test]
    fn test_page_json_shape() {
        let mut page = Page::new("A::L1");
        page.images.push(PlacedImage {
            path: PathBuf::from("a.png"),
            x: 1.0,
            y: 2.0,
            width: 3.0,
        });
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["name"], "A::L1");
        assert_eq!(json["images"][0]["width"], 3.0);
        assert!(json["legends"].as_array().unwrap().is_empty());
    }
}
