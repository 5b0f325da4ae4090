pub mod pdf;
pub mod excel;

use crate::config::ReportConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use wafer_deck_common::Page;

pub use pdf::PdfSink;

/// 出力形式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Pdf,
    /// 配置指示をJSONで出力（画像は埋め込まない）
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use pdf or json", s)),
        }
    }
}

/// 構成済みページを永続化する出力先
///
/// 渡された順序のままページを追加する。
pub trait ReportSink {
    fn write(&mut self, pages: &[Page]) -> Result<PathBuf>;
}

/// タイムスタンプ文字列（YYYYMMDD_HHMMSS）
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// 出力ファイル名: output-<timestamp>.<ext>
pub fn output_file_name(timestamp: &str, extension: &str) -> String {
    format!("output-{}.{}", timestamp, extension)
}

fn prepare_output_path(output_dir: &Path, extension: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    Ok(output_dir.join(output_file_name(&timestamp(), extension)))
}

/// 配置指示をJSONで書き出す
pub struct JsonSink {
    output_dir: PathBuf,
}

impl JsonSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ReportSink for JsonSink {
    fn write(&mut self, pages: &[Page]) -> Result<PathBuf> {
        let output_path = prepare_output_path(&self.output_dir, ExportFormat::Json.extension())?;
        let json = serde_json::to_string_pretty(pages)?;
        std::fs::write(&output_path, json)?;
        Ok(output_path)
    }
}

/// 形式に応じた出力先を作る
pub fn sink_for(format: ExportFormat, output_dir: &Path, config: &ReportConfig) -> Box<dyn ReportSink> {
    match format {
        ExportFormat::Pdf => Box::new(PdfSink::new(output_dir, config)),
        ExportFormat::Json => Box::new(JsonSink::new(output_dir)),
    }
}
