//! グリッド配置モジュール
//!
//! cm基準・左上原点の座標計算（Source of Truth）
//! ロット別ページの正方グリッドと、条件比較ページの2段組配置を扱う。
//! 状態を持たない純粋な計算のみで、失敗しない。

use std::ops::Range;

// ============================================
// 変換係数・既定値
// ============================================

/// cm → pt変換 (1cm = 72/2.54 pt ≈ 28.35pt)
pub const CM_TO_PT: f32 = 72.0 / 2.54;

/// 16:9スライドサイズ（cm）
pub const SLIDE_WIDTH_CM: f32 = 33.867;
pub const SLIDE_HEIGHT_CM: f32 = 19.05;

/// 条件比較ページ1枚あたりの行数
pub const PIVOT_ROWS_PER_PAGE: usize = 4;

/// cm → pt 変換
#[inline]
pub fn cm_to_pt(cm: f32) -> f32 {
    cm * CM_TO_PT
}

/// 配置座標（cm）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

// ============================================
// レイアウト設定構造体
// ============================================

/// グリッド配置ポリシー
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutGrid {
    /// 原点X（cm）
    pub x0: f32,
    /// 原点Y（cm、上から）
    pub y0: f32,
    /// 列ステップ（cm）
    pub dx: f32,
    /// 行ステップ（cm）
    pub dy: f32,
    /// 画像の固定幅（cm）
    pub image_width: f32,
    /// 1ページあたりの比較行数
    pub rows_per_page: usize,
}

impl LayoutGrid {
    pub fn new(x0: f32, y0: f32, dx: f32, dy: f32, image_width: f32) -> Self {
        Self {
            x0,
            y0,
            dx,
            dy,
            image_width,
            rows_per_page: PIVOT_ROWS_PER_PAGE,
        }
    }

    pub fn with_rows_per_page(mut self, rows_per_page: usize) -> Self {
        self.rows_per_page = rows_per_page;
        self
    }

    /// 正方グリッドの列数: ceil(sqrt(n))
    ///
    /// 浮動小数の丸め誤差を避けるため整数で求める（c*c >= n となる最小のc）。
    pub fn columns_for(item_count: usize) -> usize {
        let mut columns = (item_count as f64).sqrt() as usize;
        while columns * columns < item_count {
            columns += 1;
        }
        while columns > 0 && (columns - 1) * (columns - 1) >= item_count {
            columns -= 1;
        }
        columns
    }

    /// 列数ごとに行へ分割。最終行の不足分は None で埋める
    pub fn chunk_rows<'a, T>(&self, items: &'a [T]) -> Vec<Vec<Option<&'a T>>> {
        let columns = Self::columns_for(items.len());
        if columns == 0 {
            return Vec::new();
        }

        items
            .chunks(columns)
            .map(|chunk| {
                let mut row: Vec<Option<&T>> = chunk.iter().map(Some).collect();
                row.resize(columns, None);
                row
            })
            .collect()
    }

    /// ロット別ページ: 行k・列jの左上座標
    pub fn lot_position(&self, row: usize, column: usize) -> Point {
        Point {
            x: self.x0 + column as f32 * self.dx,
            y: self.y0 + row as f32 * self.dy,
        }
    }

    /// 条件比較ページ: ページ内スロットsの比較列cの左上座標
    ///
    /// 1列目は上段、2列目はその直下。スロットが進むごとに右へ1ステップ。
    pub fn pivot_position(&self, slot: usize, column: usize) -> Point {
        Point {
            x: self.x0 + slot as f32 * self.dx,
            y: self.y0 + column as f32 * self.dy,
        }
    }

    /// 条件比較ページの改ページ位置（行インデックス範囲のリスト）
    ///
    /// カウンタが `rows_per_page` に達するか最終行で改ページする。
    pub fn pivot_page_breaks(&self, row_count: usize) -> Vec<Range<usize>> {
        let per_page = self.rows_per_page.max(1);
        (0..row_count)
            .step_by(per_page)
            .map(|start| start..(start + per_page).min(row_count))
            .collect()
    }
}
