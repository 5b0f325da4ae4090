//! スライド構成モジュール
//!
//! グルーピング結果とグリッド配置から、ページ単位の配置指示（Page）を作る。
//! 失敗はページ単位: 1ページの失敗は呼び出し側で捕捉してスキップできる。

pub mod crop;

pub use crop::{normalize_catalog, normalize_image, CropOutcome, CropReport};

use crate::config::{CropSpec, ReportConfig};
use crate::error::{Result, WaferDeckError};
use crate::grouping::{LotGroups, PivotTable};
use std::ops::Range;
use std::path::{Path, PathBuf};
use wafer_deck_common::{
    lot_title, wafer_label, LayoutGrid, LegendBlock, LotKey, LotLegend, Page, PivotLegend,
    PlacedImage,
};

/// 凡例ボックスの既定サイズ（cm）
const LEGEND_BOX_CM: f32 = 3.0;

/// ページ単位の構成結果
pub type PageResult = Result<Page>;

pub struct SlideComposer<'a> {
    config: &'a ReportConfig,
    lot_grid: LayoutGrid,
    pivot_grid: LayoutGrid,
    crop: Option<CropSpec>,
    dry_run: bool,
}

impl<'a> SlideComposer<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self {
            config,
            lot_grid: config.lot_grid(),
            pivot_grid: config.pivot_grid(),
            crop: config.normalize_images.then(|| config.crop_spec()),
            dry_run: false,
        }
    }

    /// 配置前の切り抜きを行わない
    pub fn without_normalization(mut self) -> Self {
        self.crop = None;
        self
    }

    /// 画像ファイルを変更しない（切り抜きは判定のみ）
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    // ============================================
    // ロット別ページ
    // ============================================

    /// 1グループ = 1ページ
    pub fn compose_lot_page(&self, key: &LotKey, paths: &[PathBuf]) -> PageResult {
        let cfg = self.config;
        let grid = &self.lot_grid;
        let name = key.to_string();
        let mut page = Page::new(&name);

        page.legends.push(LegendBlock {
            text: lot_title(&name, paths.len()),
            font_size: cfg.wafer_id_text_size,
            x: grid.x0,
            y: grid.y0 + cfg.wafer_id_text_y_offset_cm,
            width: cfg.wafer_id_textbox_width_cm,
            height: cfg.wafer_id_textbox_height_cm,
            monospace: false,
        });

        let mut legend = LotLegend::new();
        for (k, row) in grid.chunk_rows(paths).into_iter().enumerate() {
            for (j, cell) in row.into_iter().enumerate() {
                // 最終行の埋め草
                let Some(path) = cell else { continue };

                self.prepare_image(path)?;
                let pos = grid.lot_position(k, j);
                page.images.push(PlacedImage {
                    path: path.clone(),
                    x: pos.x,
                    y: pos.y,
                    width: grid.image_width,
                });
                legend.push_label(&wafer_label(&file_name_of(path)));
                tracing::debug!(image = %path.display(), row = k, column = j, "placed");
            }
            legend.end_row();
        }

        page.legends.push(LegendBlock {
            text: legend.into_text(),
            font_size: cfg.wafer_id_text_size,
            x: grid.x0 + cfg.wafer_id_legend_x_offset_cm,
            y: grid.y0 + cfg.wafer_id_legend_y_offset_cm,
            width: LEGEND_BOX_CM,
            height: LEGEND_BOX_CM,
            monospace: true,
        });

        tracing::info!(page = %name, images = page.images.len(), "lot page composed");
        Ok(page)
    }

    pub fn compose_lot_pages(&self, groups: &LotGroups) -> Vec<PageResult> {
        groups
            .iter()
            .map(|(key, paths)| self.compose_lot_page(key, paths))
            .collect()
    }

    // ============================================
    // 条件比較ページ
    // ============================================

    /// 比較する列のインデックス（最大2列）
    ///
    /// 設定があればその2条件、無ければ表の先頭2列。
    pub fn comparison_columns(&self, table: &PivotTable) -> Result<Vec<usize>> {
        match &self.config.comparison_columns {
            Some((first, second)) => [first, second]
                .iter()
                .map(|name| {
                    table.column_index(name).ok_or_else(|| {
                        WaferDeckError::Config(format!(
                            "comparison_columns の {} がデータに存在しません（検出: {:?}）",
                            name,
                            table.columns()
                        ))
                    })
                })
                .collect(),
            None => Ok((0..table.columns().len().min(2)).collect()),
        }
    }

    /// 改ページ単位の行範囲
    pub fn pivot_page_chunks(&self, table: &PivotTable) -> Vec<Range<usize>> {
        self.pivot_grid.pivot_page_breaks(table.rows().len())
    }

    /// 行範囲 `rows` を1ページに配置し、凡例をページ境界で書き出す
    pub fn compose_pivot_page(
        &self,
        table: &PivotTable,
        columns: &[usize],
        rows: Range<usize>,
    ) -> PageResult {
        let cfg = self.config;
        let grid = &self.pivot_grid;
        let page_rows = table.rows().get(rows.clone()).unwrap_or_default();

        let name = match (page_rows.first(), page_rows.last()) {
            (Some(first), Some(last)) => format!("{}..{}", first.key(), last.key()),
            _ => String::from("empty"),
        };
        let mut page = Page::new(&name);
        let mut legend = PivotLegend::new();

        for (slot, row) in page_rows.iter().enumerate() {
            let row_key = row.key();

            for (c, &col) in columns.iter().enumerate() {
                let folder = &table.columns()[col];
                match row.cells.get(col).and_then(|cell| cell.as_ref()) {
                    Some(path) => {
                        self.prepare_image(path)?;
                        let pos = grid.pivot_position(slot, c);
                        page.images.push(PlacedImage {
                            path: path.clone(),
                            x: pos.x,
                            y: pos.y,
                            width: grid.image_width,
                        });
                    }
                    None => {
                        tracing::warn!(row = %row_key, folder = %folder, "no image for pivot cell");
                    }
                }

                if c == 0 {
                    legend.push_header(&row_key);
                    legend.push_first(folder);
                } else {
                    legend.push_second(folder);
                }
            }

            tracing::info!(
                row = %row_key,
                slot,
                present = columns.iter().filter(|&&col| table.cell(rows.start + slot, col).is_some()).count(),
                "pivot row placed"
            );
        }

        page.legends.push(LegendBlock {
            text: legend.take(),
            font_size: cfg.wafer_id_single_txtbox_text_size_pt,
            x: grid.x0 + cfg.wafer_id_single_txtbox_loc_offset_x_cm,
            y: grid.y0 + cfg.wafer_id_single_txtbox_loc_offset_y_cm,
            // 1項目 = 1スロットなので、ページ内の全スロット幅に渡る
            width: grid.dx * grid.rows_per_page as f32,
            height: LEGEND_BOX_CM,
            monospace: true,
        });

        Ok(page)
    }

    /// 全行を改ページしながら構成する。列解決の失敗は全体を中断
    pub fn compose_pivot_pages(&self, table: &PivotTable) -> Result<Vec<PageResult>> {
        let columns = self.comparison_columns(table)?;
        Ok(self
            .pivot_page_chunks(table)
            .into_iter()
            .map(|rows| self.compose_pivot_page(table, &columns, rows))
            .collect())
    }

    /// 配置前の確認: 正規化（有効時）またはファイル存在確認
    fn prepare_image(&self, path: &Path) -> Result<()> {
        match &self.crop {
            Some(spec) => crop::normalize_image(path, spec, self.dry_run).map(|_| ()),
            None if path.is_file() => Ok(()),
            None => Err(WaferDeckError::image_access(path, "ファイルが存在しません")),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
