use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaferDeckError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("入力フォルダが不正です: {0}")]
    InvalidPath(String),

    #[error("対象画像が0件です（input_validation / throwaway_threshold の設定を確認してください）: {0}")]
    EmptyCatalog(String),

    #[error("フォルダを走査できません: {}: {reason}", path.display())]
    CatalogScan { path: PathBuf, reason: String },

    #[error("ピボットのセルが重複しています: lot={lot} wafer={wafer} folder={folder}")]
    AmbiguousPivot {
        lot: String,
        wafer: String,
        folder: String,
    },

    #[error("画像にアクセスできません: {}: {reason}", path.display())]
    ImageAccess { path: PathBuf, reason: String },

    #[error("別の処理が同じフォルダで実行中です（ロック: {0}）")]
    Busy(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),
}

impl From<rust_xlsxwriter::XlsxError> for WaferDeckError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        WaferDeckError::ExcelGeneration(e.to_string())
    }
}

impl WaferDeckError {
    pub fn image_access(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        WaferDeckError::ImageAccess {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WaferDeckError>;
