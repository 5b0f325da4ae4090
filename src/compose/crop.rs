//! 切り抜き正規化
//!
//! 画像サイズが元画像サイズと完全一致する場合だけ指定範囲で切り抜き、
//! 同じパスへ上書き保存する。切り抜き済みの画像はサイズが変わるので
//! 再実行しても何もしない。

use crate::config::CropSpec;
use crate::error::{Result, WaferDeckError};
use crate::scanner::FileCatalog;
use std::path::{Path, PathBuf};

/// 1画像の正規化結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropOutcome {
    /// 切り抜いて上書きした
    Cropped { width: u32, height: u32 },
    /// 元画像サイズと一致しないため何もしなかった
    Skipped { width: u32, height: u32 },
    /// ドライラン: 切り抜き対象
    WouldCrop,
}

/// 画像を正規化する。ファイルが無い・読めない場合は ImageAccess、
/// 切り抜き矩形が不正なら Config
pub fn normalize_image(path: &Path, spec: &CropSpec, dry_run: bool) -> Result<CropOutcome> {
    let (crop_w, crop_h) = spec.target_size()?;

    if !path.is_file() {
        return Err(WaferDeckError::image_access(path, "ファイルが存在しません"));
    }

    let (width, height) =
        image::image_dimensions(path).map_err(|e| WaferDeckError::image_access(path, e))?;

    if (width, height) != spec.original_size {
        tracing::debug!(
            image = %display_name(path),
            width,
            height,
            "skip crop, non-original image"
        );
        return Ok(CropOutcome::Skipped { width, height });
    }

    if dry_run {
        return Ok(CropOutcome::WouldCrop);
    }

    let img = image::open(path).map_err(|e| WaferDeckError::image_access(path, e))?;
    let cropped = img.crop_imm(spec.left, spec.upper, crop_w, crop_h);
    cropped
        .save(path)
        .map_err(|e| WaferDeckError::image_access(path, e))?;

    tracing::info!(image = %display_name(path), crop_w, crop_h, "cropped and overwrote image");
    Ok(CropOutcome::Cropped {
        width: cropped.width(),
        height: cropped.height(),
    })
}

/// カタログ全体の正規化集計
#[derive(Debug, Clone, Default)]
pub struct CropReport {
    pub cropped: usize,
    pub skipped: usize,
    pub would_crop: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl CropReport {
    pub fn total(&self) -> usize {
        self.cropped + self.skipped + self.would_crop + self.failed.len()
    }
}

/// カタログ内の全画像を正規化する（失敗は集計して続行）
pub fn normalize_catalog(catalog: &FileCatalog, spec: &CropSpec, dry_run: bool) -> CropReport {
    let mut report = CropReport::default();

    for record in catalog.records() {
        match normalize_image(&record.file_path, spec, dry_run) {
            Ok(CropOutcome::Cropped { .. }) => report.cropped += 1,
            Ok(CropOutcome::Skipped { .. }) => report.skipped += 1,
            Ok(CropOutcome::WouldCrop) => report.would_crop += 1,
            Err(e) => {
                tracing::error!(image = %record.file_path.display(), error = %e, "crop failed");
                report.failed.push((record.file_path.clone(), e.to_string()));
            }
        }
    }
    report
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
