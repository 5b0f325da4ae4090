//! グルーピングモジュール
//!
//! カタログから2種類の射影を作る。
//! - ロット別: (フォルダ, ロット) ごとにウェハ番号順のパス列
//! - 条件比較: (ロット, ウェハ) を行、フォルダを列とするピボット表

pub mod pivot;

pub use pivot::{as_pivot, PivotRow, PivotTable};

use crate::scanner::FileCatalog;
use std::collections::BTreeMap;
use std::path::PathBuf;
use wafer_deck_common::{ImageRecord, LotKey};

/// ロット別グループ（キー昇順）
pub type LotGroups = BTreeMap<LotKey, Vec<PathBuf>>;

/// (フォルダ, ロット) で1パスにグルーピングし、各グループをウェハ番号順に並べる
///
/// ウェハ番号は固定桁ゼロ埋め前提で文字列比較する。
pub fn by_lot(catalog: &FileCatalog) -> LotGroups {
    let mut grouped: BTreeMap<LotKey, Vec<&ImageRecord>> = BTreeMap::new();
    for record in catalog.records() {
        grouped
            .entry(LotKey::new(&record.folder_name, &record.lot_id))
            .or_default()
            .push(record);
    }

    grouped
        .into_iter()
        .map(|(key, mut records)| {
            records.sort_by(|a, b| {
                a.wafer_id
                    .cmp(&b.wafer_id)
                    .then_with(|| a.file_path.cmp(&b.file_path))
            });
            let paths = records.into_iter().map(|r| r.file_path.clone()).collect();
            (key, paths)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    pub(crate) fn record(folder: &str, lot: &str, wafer: &str) -> ImageRecord {
        let file_name = format!("P_{}_W-{}-x.png", lot, wafer);
        ImageRecord {
            folder_name: folder.to_string(),
            file_path: Path::new("/data").join(folder).join(&file_name),
            file_name,
            token_count: 3,
            temperature: None,
            product_id: "P".to_string(),
            lot_id: lot.to_string(),
            wafer_id: wafer.to_string(),
        }
    }

    #[test]
    fn test_by_lot_groups_and_sorts() {
        let catalog = FileCatalog::from_records(
            "/data",
            vec![
                record("A", "L1", "03"),
                record("B", "L1", "01"),
                record("A", "L1", "01"),
                record("A", "L2", "02"),
            ],
        )
        .unwrap();

        let groups = by_lot(&catalog);
        let keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["A::L1", "A::L2", "B::L1"]);

        let a_l1 = &groups[&LotKey::new("A", "L1")];
        let names: Vec<&str> = a_l1
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["P_L1_W-01-x.png", "P_L1_W-03-x.png"]);
    }

    #[test]
    fn test_by_lot_members_match_key() {
        let catalog = FileCatalog::from_records(
            "/data",
            vec![
                record("A", "L1", "02"),
                record("B", "L2", "01"),
                record("A", "L2", "05"),
                record("A", "L1", "01"),
            ],
        )
        .unwrap();

        for (key, paths) in by_lot(&catalog) {
            for path in &paths {
                let rec = catalog
                    .records()
                    .iter()
                    .find(|r| &r.file_path == path)
                    .unwrap();
                assert_eq!(rec.folder_name, key.folder_name);
                assert_eq!(rec.lot_id, key.lot_id);
            }
        }
    }

    #[test]
    fn test_by_lot_is_deterministic() {
        let forward = vec![record("A", "L1", "02"), record("A", "L1", "01")];
        let reverse = vec![record("A", "L1", "01"), record("A", "L1", "02")];
        let a = by_lot(&FileCatalog::from_records("/data", forward).unwrap());
        let b = by_lot(&FileCatalog::from_records("/data", reverse).unwrap());
        assert_eq!(a, b);
    }
}
