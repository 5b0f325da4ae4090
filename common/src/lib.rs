//! wafer-deck Common Library
//!
//! I/Oを伴わない共有部品: 画像レコード・ページモデル、グリッド配置計算、凡例生成

pub mod types;
pub mod layout;
pub mod legend;

pub use types::{ImageRecord, LegendBlock, LotKey, Page, PlacedImage};
pub use layout::{cm_to_pt, LayoutGrid, Point};
pub use legend::{lot_title, wafer_label, LotLegend, PivotLegend};
