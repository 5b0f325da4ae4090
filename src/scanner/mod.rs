pub mod parse;

use crate::config::ReportConfig;
use crate::error::{Result, WaferDeckError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use wafer_deck_common::ImageRecord;

/// 1回のスキャンで得た画像レコード集合
///
/// 構築後は不変。フィルタ後に0件なら構築に失敗する。
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
    records: Vec<ImageRecord>,
}

impl FileCatalog {
    /// フォルダを再帰的にスキャンして分類・フィルタする
    pub fn scan(
        root: &Path,
        extension: &str,
        whitelist: &BTreeSet<String>,
        throwaway_threshold: usize,
    ) -> Result<Self> {
        if !root.is_dir() {
            return Err(WaferDeckError::InvalidPath(root.display().to_string()));
        }
        tracing::debug!(root = %root.display(), extension, "scanning input folder");

        let mut discovered = 0usize;
        let mut records = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            // 走査エラーはカタログ構築の失敗
            let entry = entry.map_err(|e| WaferDeckError::CatalogScan {
                path: e.path().unwrap_or(root).to_path_buf(),
                reason: e.to_string(),
            })?;
            let path = entry.path();

            if !path.is_file() || !has_extension(path, extension) {
                continue;
            }
            discovered += 1;

            if let Some(record) = classify(path, whitelist, throwaway_threshold) {
                records.push(record);
            }
        }

        tracing::info!(
            discovered,
            retained = records.len(),
            "catalog scan finished"
        );

        if records.is_empty() {
            return Err(WaferDeckError::EmptyCatalog(root.display().to_string()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            records,
        })
    }

    /// 設定のホワイトリスト・閾値・検出パターンでスキャン
    pub fn from_config(root: &Path, config: &ReportConfig) -> Result<Self> {
        let extension = config.file_extension()?;
        Self::scan(
            root,
            &extension,
            &config.input_validation,
            config.throwaway_threshold,
        )
    }

    /// 分類済みレコードから構築（スキャン済みデータの再利用・テスト用）
    pub fn from_records(root: impl Into<PathBuf>, records: Vec<ImageRecord>) -> Result<Self> {
        let root = root.into();
        if records.is_empty() {
            return Err(WaferDeckError::EmptyCatalog(root.display().to_string()));
        }
        Ok(Self { root, records })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (製品, 温度, ロット, ウェハ) 順
    pub fn sorted_by_lot(&self) -> Vec<&ImageRecord> {
        let mut sorted: Vec<&ImageRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            a.product_id
                .cmp(&b.product_id)
                .then(a.temperature.cmp(&b.temperature))
                .then(a.lot_id.cmp(&b.lot_id))
                .then(a.wafer_id.cmp(&b.wafer_id))
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        sorted
    }

    /// (製品, ロット, ウェハ, 温度) 順
    pub fn sorted_by_temperature(&self) -> Vec<&ImageRecord> {
        let mut sorted: Vec<&ImageRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            a.product_id
                .cmp(&b.product_id)
                .then(a.lot_id.cmp(&b.lot_id))
                .then(a.wafer_id.cmp(&b.wafer_id))
                .then(a.temperature.cmp(&b.temperature))
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        sorted
    }

    /// ロット × フォルダの画像枚数集計
    pub fn summary(&self) -> CatalogSummary {
        let folders: BTreeSet<&str> = self.records.iter().map(|r| r.folder_name.as_str()).collect();
        let folders: Vec<String> = folders.into_iter().map(String::from).collect();

        let mut counts: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for record in &self.records {
            let row = counts
                .entry(record.lot_id.clone())
                .or_insert_with(|| vec![0; folders.len()]);
            if let Some(col) = folders.iter().position(|f| *f == record.folder_name) {
                row[col] += 1;
            }
        }

        CatalogSummary {
            folders,
            rows: counts.into_iter().collect(),
        }
    }
}

/// 拡張子の一致判定（大文字小文字を区別しない）
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// 1ファイルを分類。ホワイトリスト外・閾値以上・命名規則不一致は None
fn classify(path: &Path, whitelist: &BTreeSet<String>, throwaway_threshold: usize) -> Option<ImageRecord> {
    let folder_name = path.parent()?.file_name()?.to_string_lossy().to_string();
    let file_name = path.file_name()?.to_string_lossy().to_string();

    if !whitelist.contains(&folder_name) {
        return None;
    }

    let token_count = parse::token_count(&file_name);
    if token_count >= throwaway_threshold {
        tracing::debug!(file_name = %file_name, token_count, "dropped by throwaway threshold");
        return None;
    }

    let Some(parsed) = parse::parse_file_name(&file_name) else {
        tracing::debug!(file_name = %file_name, "file name does not follow naming convention");
        return None;
    };

    Some(ImageRecord {
        temperature: parse::parse_temperature(&folder_name),
        folder_name,
        file_name,
        file_path: path.to_path_buf(),
        token_count,
        product_id: parsed.product_id,
        lot_id: parsed.lot_id,
        wafer_id: parsed.wafer_id,
    })
}

/// 検出結果の集計表（行: ロット、列: フォルダ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSummary {
    pub folders: Vec<String>,
    pub rows: Vec<(String, Vec<usize>)>,
}

impl CatalogSummary {
    pub fn total(&self) -> usize {
        self.rows.iter().flat_map(|(_, counts)| counts.iter()).sum()
    }

    pub fn count(&self, lot_id: &str, folder_name: &str) -> usize {
        let Some(col) = self.folders.iter().position(|f| f == folder_name) else {
            return 0;
        };
        self.rows
            .iter()
            .find(|(lot, _)| lot == lot_id)
            .map(|(_, counts)| counts[col])
            .unwrap_or(0)
    }
}

impl fmt::Display for CatalogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lot_width = self
            .rows
            .iter()
            .map(|(lot, _)| lot.len())
            .chain(std::iter::once("lot_id".len()))
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = self.folders.iter().map(|name| name.len().max(3)).collect();

        write!(f, "{:<width$}", "lot_id", width = lot_width)?;
        for (name, w) in self.folders.iter().zip(&widths) {
            write!(f, "  {:>width$}", name, width = *w)?;
        }
        writeln!(f)?;

        for (lot, counts) in &self.rows {
            write!(f, "{:<width$}", lot, width = lot_width)?;
            for (count, w) in counts.iter().zip(&widths) {
                write!(f, "  {:>width$}", count, width = *w)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
