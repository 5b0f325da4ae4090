//! ピボット表のExcelダンプ（デバッグ用）
//!
//! 1行目: lot_id, wafer_id, 条件フォルダ列。欠損セルは空欄。

use crate::error::Result;
use crate::grouping::PivotTable;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

pub const PIVOT_SHEET_NAME: &str = "single_wafers";

/// ピボット表をワークブックとして保存
pub fn write_pivot_workbook(table: &PivotTable, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(PIVOT_SHEET_NAME)?;

    worksheet.write_string_with_format(0, 0, "lot_id", &header)?;
    worksheet.write_string_with_format(0, 1, "wafer_id", &header)?;
    for (c, column) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, (c + 2) as u16, column.as_str(), &header)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let excel_row = (r + 1) as u32;
        worksheet.write_string(excel_row, 0, row.lot_id.as_str())?;
        worksheet.write_string(excel_row, 1, row.wafer_id.as_str())?;
        for (c, cell) in row.cells.iter().enumerate() {
            if let Some(path) = cell {
                let text = path.display().to_string();
                worksheet.write_string(excel_row, (c + 2) as u16, text.as_str())?;
            }
        }
    }

    workbook.save(output_path)?;
    Ok(())
}

/// デバッグフォルダへ single_wafers-<timestamp>.xlsx を出力
pub fn dump_pivot(table: &PivotTable, debug_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(debug_dir)?;
    let output_path = debug_dir.join(format!("{}-{}.xlsx", PIVOT_SHEET_NAME, super::timestamp()));
    write_pivot_workbook(table, &output_path)?;
    tracing::info!(path = %output_path.display(), "pivot table dumped");
    Ok(output_path)
}
