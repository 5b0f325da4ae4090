use crate::error::{Result, WaferDeckError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use wafer_deck_common::layout::{LayoutGrid, PIVOT_ROWS_PER_PAGE, SLIDE_HEIGHT_CM, SLIDE_WIDTH_CM};

/// レポート生成設定
///
/// 読み込み時に `validate()` で検証し、以降は不変として扱う。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// フォルダ名ホワイトリスト
    pub input_validation: BTreeSet<String>,
    /// ファイル名トークン数の上限（これ未満のみ採用）
    pub throwaway_threshold: usize,

    /// 切り抜き対象とする元画像サイズ (幅, 高さ) px
    pub original_image_size: (u32, u32),
    /// 切り抜き範囲 (left, upper, right, lower) px
    pub crop_coords: (u32, u32, u32, u32),
    /// 配置前に切り抜き正規化を行うか
    pub normalize_images: bool,

    /// ページ原点（cm）
    pub coor_x_origin: f32,
    pub coor_y_origin: f32,

    /// ロット別ページのタイトル・凡例フォントサイズ（pt）
    pub wafer_id_text_size: f32,
    /// 条件比較ページの凡例フォントサイズ（pt）
    pub wafer_id_single_txtbox_text_size_pt: f32,

    /// タイトルボックス（cm）
    pub wafer_id_textbox_width_cm: f32,
    pub wafer_id_textbox_height_cm: f32,
    pub wafer_id_text_y_offset_cm: f32,

    /// ロット別凡例の原点からのオフセット（cm）
    pub wafer_id_legend_x_offset_cm: f32,
    pub wafer_id_legend_y_offset_cm: f32,

    /// 条件比較ページの画像幅・ステップ（cm）
    pub wafer_id_single_size_width_cm: f32,
    /// 条件比較凡例の原点からのオフセット（cm）
    pub wafer_id_single_txtbox_loc_offset_x_cm: f32,
    pub wafer_id_single_txtbox_loc_offset_y_cm: f32,

    /// ロット別ページのステップ・画像幅（cm）
    pub lot_step_x_cm: f32,
    pub lot_step_y_cm: f32,
    pub lot_image_width_cm: f32,

    pub pivot_rows_per_page: usize,
    /// 比較する2条件（省略時はピボットの先頭2列）
    pub comparison_columns: Option<(String, String)>,

    /// スライドサイズ（cm）
    pub page_width_cm: f32,
    pub page_height_cm: f32,

    /// 検出パターン（例: "*.png"）
    pub file_pattern: String,

    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
    pub debug_mode: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input_validation: ["-40C", "25C", "85C"].iter().map(|s| s.to_string()).collect(),
            throwaway_threshold: 4,
            original_image_size: (1280, 960),
            crop_coords: (160, 0, 1120, 960),
            normalize_images: true,
            coor_x_origin: 1.0,
            coor_y_origin: 2.5,
            wafer_id_text_size: 12.0,
            wafer_id_single_txtbox_text_size_pt: 10.0,
            wafer_id_textbox_width_cm: 12.0,
            wafer_id_textbox_height_cm: 1.0,
            wafer_id_text_y_offset_cm: -1.5,
            wafer_id_legend_x_offset_cm: 24.0,
            wafer_id_legend_y_offset_cm: 0.0,
            wafer_id_single_size_width_cm: 6.0,
            wafer_id_single_txtbox_loc_offset_x_cm: 0.0,
            wafer_id_single_txtbox_loc_offset_y_cm: 13.0,
            lot_step_x_cm: 3.0,
            lot_step_y_cm: 3.0,
            lot_image_width_cm: 3.0,
            pivot_rows_per_page: PIVOT_ROWS_PER_PAGE,
            comparison_columns: None,
            page_width_cm: SLIDE_WIDTH_CM,
            page_height_cm: SLIDE_HEIGHT_CM,
            file_pattern: "*.png".into(),
            input_dir: None,
            output_dir: None,
            debug_dir: None,
            debug_mode: false,
        }
    }
}

/// 切り抜き正規化のパラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSpec {
    pub original_size: (u32, u32),
    pub left: u32,
    pub upper: u32,
    pub right: u32,
    pub lower: u32,
}

impl CropSpec {
    /// 切り抜き後のサイズ。矩形が反転・空なら Config
    pub fn target_size(&self) -> Result<(u32, u32)> {
        match (self.right.checked_sub(self.left), self.lower.checked_sub(self.upper)) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(config_err(format!(
                "crop_coords が不正です: ({}, {}, {}, {})",
                self.left, self.upper, self.right, self.lower
            ))),
        }
    }
}

impl ReportConfig {
    /// 設定を読み込む。`path` 省略時は既定パス、ファイルが無ければ既定値
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.is_file() {
                    return Err(WaferDeckError::Config(format!(
                        "設定ファイルが見つかりません: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => Self::config_path()?,
        };

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: ReportConfig = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "configuration loaded");
            config
        } else {
            tracing::debug!("no configuration file, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| WaferDeckError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("wafer-deck").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_validation.is_empty() {
            return Err(config_err("input_validation が空です"));
        }
        if self.throwaway_threshold < 1 {
            return Err(config_err("throwaway_threshold は1以上にしてください"));
        }

        let (left, upper, right, lower) = self.crop_coords;
        let (orig_w, orig_h) = self.original_image_size;
        if right <= left || lower <= upper {
            return Err(config_err(format!("crop_coords が不正です: {:?}", self.crop_coords)));
        }
        if right > orig_w || lower > orig_h {
            return Err(config_err(format!(
                "crop_coords {:?} が original_image_size {:?} の範囲外です",
                self.crop_coords, self.original_image_size
            )));
        }

        let positive = [
            ("wafer_id_text_size", self.wafer_id_text_size),
            ("wafer_id_single_txtbox_text_size_pt", self.wafer_id_single_txtbox_text_size_pt),
            ("wafer_id_single_size_width_cm", self.wafer_id_single_size_width_cm),
            ("lot_step_x_cm", self.lot_step_x_cm),
            ("lot_step_y_cm", self.lot_step_y_cm),
            ("lot_image_width_cm", self.lot_image_width_cm),
            ("page_width_cm", self.page_width_cm),
            ("page_height_cm", self.page_height_cm),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(*v > 0.0)) {
            return Err(config_err(format!("{} は正の値にしてください: {}", name, value)));
        }

        if self.pivot_rows_per_page == 0 {
            return Err(config_err("pivot_rows_per_page は1以上にしてください"));
        }
        if let Some((first, second)) = &self.comparison_columns {
            if first == second {
                return Err(config_err("comparison_columns に同じ条件が指定されています"));
            }
        }

        self.file_extension()?;
        Ok(())
    }

    /// 表示用JSON
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 検出パターンから拡張子を取り出す（"*.png" → "png"）
    pub fn file_extension(&self) -> Result<String> {
        let ext = self
            .file_pattern
            .strip_prefix("*.")
            .unwrap_or(&self.file_pattern)
            .trim_start_matches('.');
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(config_err(format!("file_pattern が不正です: {}", self.file_pattern)));
        }
        Ok(ext.to_string())
    }

    pub fn crop_spec(&self) -> CropSpec {
        let (left, upper, right, lower) = self.crop_coords;
        CropSpec {
            original_size: self.original_image_size,
            left,
            upper,
            right,
            lower,
        }
    }

    /// ロット別ページのグリッド
    pub fn lot_grid(&self) -> LayoutGrid {
        LayoutGrid::new(
            self.coor_x_origin,
            self.coor_y_origin,
            self.lot_step_x_cm,
            self.lot_step_y_cm,
            self.lot_image_width_cm,
        )
    }

    /// 条件比較ページのグリッド（ステップ = 画像幅）
    pub fn pivot_grid(&self) -> LayoutGrid {
        let size = self.wafer_id_single_size_width_cm;
        LayoutGrid::new(self.coor_x_origin, self.coor_y_origin, size, size, size)
            .with_rows_per_page(self.pivot_rows_per_page)
    }

    /// 入力フォルダ: 引数 > 設定
    pub fn resolve_input_dir(&self, arg: Option<&Path>) -> Result<PathBuf> {
        arg.map(Path::to_path_buf)
            .or_else(|| self.input_dir.clone())
            .ok_or_else(|| config_err("入力フォルダが指定されていません"))
    }

    /// 出力フォルダ: 引数 > 設定 > カレント
    pub fn resolve_output_dir(&self, arg: Option<&Path>) -> PathBuf {
        arg.map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn config_err(message: impl Into<String>) -> WaferDeckError {
    WaferDeckError::Config(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ReportConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "input_validation": ["A", "B"], "throwaway_threshold": 6 }"#;
        let config: ReportConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.throwaway_threshold, 6);
        assert!(config.input_validation.contains("A"));
        assert_eq!(config.file_pattern, "*.png");
        assert!(config.normalize_images);
    }

    #[test]
    fn test_tuple_fields_from_json_arrays() {
        let json = r#"{ "original_image_size": [100, 80], "crop_coords": [10, 0, 90, 80] }"#;
        let config: ReportConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.crop_spec().target_size().unwrap(), (80, 80));
    }

    #[test]
    fn test_pretty_json_reloads() {
        let config = ReportConfig::default();
        let json = config.to_pretty_json().unwrap();
        assert!(json.contains("\"throwaway_threshold\": 4"));
        let reloaded: ReportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.crop_coords, config.crop_coords);
        assert_eq!(reloaded.input_validation, config.input_validation);
    }

    #[test]
    fn test_inverted_crop_rect_rejected() {
        let spec = ReportConfig {
            crop_coords: (12, 0, 2, 10),
            ..Default::default()
        }
        .crop_spec();
        assert!(matches!(spec.target_size(), Err(WaferDeckError::Config(_))));

        let empty = ReportConfig {
            crop_coords: (5, 3, 5, 10),
            ..Default::default()
        }
        .crop_spec();
        assert!(matches!(empty.target_size(), Err(WaferDeckError::Config(_))));
    }

    #[test]
    fn test_empty_whitelist_rejected() {
        let config = ReportConfig {
            input_validation: BTreeSet::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(WaferDeckError::Config(_))));
    }

    #[test]
    fn test_crop_outside_original_rejected() {
        let config = ReportConfig {
            original_image_size: (100, 100),
            crop_coords: (0, 0, 120, 50),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let inverted = ReportConfig {
            original_image_size: (100, 100),
            crop_coords: (50, 0, 40, 50),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_non_positive_width_rejected() {
        let config = ReportConfig {
            lot_image_width_cm: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lot_image_width_cm"));
    }

    #[test]
    fn test_file_extension() {
        let mut config = ReportConfig::default();
        assert_eq!(config.file_extension().unwrap(), "png");
        config.file_pattern = "jpg".into();
        assert_eq!(config.file_extension().unwrap(), "jpg");
        config.file_pattern = "*.p*g".into();
        assert!(config.file_extension().is_err());
    }

    #[test]
    fn test_identical_comparison_columns_rejected() {
        let config = ReportConfig {
            comparison_columns: Some(("A".into(), "A".into())),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pivot_grid_uses_single_size() {
        let config = ReportConfig::default();
        let grid = config.pivot_grid();
        assert_eq!(grid.dx, 6.0);
        assert_eq!(grid.dy, 6.0);
        assert_eq!(grid.image_width, 6.0);
        assert_eq!(grid.rows_per_page, 4);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let result = ReportConfig::load(Some(Path::new("/nonexistent/wafer-deck.json")));
        assert!(matches!(result, Err(WaferDeckError::Config(_))));
    }
}
