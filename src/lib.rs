//! wafer-deck
//!
//! 検査画像フォルダを命名規則で分類し、ロット別・条件比較の2種類の
//! グリッドページにレイアウトして文書へ出力する。

pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod export;
pub mod grouping;
pub mod pipeline;
pub mod scanner;

pub use config::ReportConfig;
pub use error::{Result, WaferDeckError};
pub use scanner::FileCatalog;
pub use wafer_deck_common::{ImageRecord, LayoutGrid, LegendBlock, LotKey, Page, PlacedImage};
