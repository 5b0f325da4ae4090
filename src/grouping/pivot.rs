//! 条件比較用ピボット表
//!
//! 行: (ロット, ウェハ) 昇順、列: カタログに現れたフォルダ名（昇順）。
//! ホワイトリストではなく実データの列集合を使う。

use crate::error::{Result, WaferDeckError};
use crate::scanner::FileCatalog;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// ピボット表の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRow {
    pub lot_id: String,
    pub wafer_id: String,
    /// 列順に対応するセル（該当レコードが無ければ None）
    pub cells: Vec<Option<PathBuf>>,
}

impl PivotRow {
    /// 凡例用の行キー "{lot}::{wafer}"
    pub fn key(&self) -> String {
        format!("{}::{}", self.lot_id, self.wafer_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    columns: Vec<String>,
    rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    /// (行数, 列数)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_index(&self, folder_name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == folder_name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Path> {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .and_then(|c| c.as_deref())
    }
}

/// カタログをピボットする。同一セルに複数レコードがあれば AmbiguousPivot
pub fn as_pivot(catalog: &FileCatalog) -> Result<PivotTable> {
    let columns: Vec<String> = catalog
        .records()
        .iter()
        .map(|r| r.folder_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows: BTreeMap<(String, String), Vec<Option<PathBuf>>> = BTreeMap::new();
    for record in catalog.records() {
        let col = columns
            .iter()
            .position(|c| *c == record.folder_name)
            .unwrap_or_default();
        let cells = rows
            .entry((record.lot_id.clone(), record.wafer_id.clone()))
            .or_insert_with(|| vec![None; columns.len()]);

        if cells[col].is_some() {
            return Err(WaferDeckError::AmbiguousPivot {
                lot: record.lot_id.clone(),
                wafer: record.wafer_id.clone(),
                folder: record.folder_name.clone(),
            });
        }
        cells[col] = Some(record.file_path.clone());
    }

    let rows = rows
        .into_iter()
        .map(|((lot_id, wafer_id), cells)| PivotRow {
            lot_id,
            wafer_id,
            cells,
        })
        .collect();

    Ok(PivotTable { columns, rows })
}
