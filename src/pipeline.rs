//! レポート生成パイプライン
//!
//! scan → group → layout → compose → sink を同期的に1スレッドで実行する。
//! ページ単位で失敗を扱い、strict でなければ失敗ページをスキップして続行する。

use crate::compose::{PageResult, SlideComposer};
use crate::config::ReportConfig;
use crate::error::{Result, WaferDeckError};
use crate::export::{excel, ReportSink};
use crate::grouping::{as_pivot, by_lot};
use crate::scanner::FileCatalog;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use wafer_deck_common::Page;

/// 生成するレポートの種類
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportKind {
    /// ロット別ページのみ
    Lots,
    /// 条件比較ページのみ
    Pivot,
    /// ロット別 → 条件比較の順で両方
    #[default]
    Both,
}

impl ReportKind {
    fn includes_lots(&self) -> bool {
        matches!(self, ReportKind::Lots | ReportKind::Both)
    }

    fn includes_pivot(&self) -> bool {
        matches!(self, ReportKind::Pivot | ReportKind::Both)
    }
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub kind: ReportKind,
    /// 最初のページ失敗で全体を中断する
    pub strict: bool,
    /// 画像・出力ファイルを変更しない
    pub dry_run: bool,
    /// 配置前の切り抜き正規化
    pub normalize: bool,
    /// ピボット表のダンプ先（None なら出力しない）
    pub debug_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            kind: ReportKind::Both,
            strict: false,
            dry_run: false,
            normalize: true,
            debug_dir: None,
        }
    }
}

impl RunOptions {
    pub fn from_config(kind: ReportKind, config: &ReportConfig) -> Self {
        Self {
            kind,
            normalize: config.normalize_images,
            debug_dir: config.debug_dir.clone().filter(|_| config.debug_mode),
            ..Default::default()
        }
    }
}

/// スキップしたページ
#[derive(Debug)]
pub struct PageFailure {
    pub page: String,
    pub error: WaferDeckError,
}

/// 構成結果
#[derive(Debug, Default)]
pub struct ComposedReport {
    pub pages: Vec<Page>,
    pub failures: Vec<PageFailure>,
    pub pivot_dump: Option<PathBuf>,
}

impl ComposedReport {
    fn accept(&mut self, name: String, result: PageResult, strict: bool) -> Result<()> {
        match result {
            Ok(page) => self.pages.push(page),
            Err(error) if strict => return Err(error),
            Err(error) => {
                tracing::error!(page = %name, error = %error, "page skipped");
                self.failures.push(PageFailure { page: name, error });
            }
        }
        Ok(())
    }
}

/// 進捗通知: (完了ページ数, 総ページ数, ページ名)
pub type ProgressFn<'a> = dyn FnMut(usize, usize, &str) + 'a;

/// カタログからページ列を構成する
///
/// カタログ・グルーピング段階の失敗は常に中断。ページ単位の失敗は options.strict に従う。
pub fn compose_report(
    catalog: &FileCatalog,
    config: &ReportConfig,
    options: &RunOptions,
    progress: &mut ProgressFn<'_>,
) -> Result<ComposedReport> {
    let mut composer = SlideComposer::new(config).dry_run(options.dry_run);
    if options.normalize {
        // 不正な切り抜き矩形は全ページで失敗するので先に中断する
        config.crop_spec().target_size()?;
    } else {
        composer = composer.without_normalization();
    }

    let groups = if options.kind.includes_lots() {
        by_lot(catalog)
    } else {
        Default::default()
    };

    let pivot = if options.kind.includes_pivot() {
        let table = as_pivot(catalog)?;
        let columns = composer.comparison_columns(&table)?;
        let chunks = composer.pivot_page_chunks(&table);
        Some((table, columns, chunks))
    } else {
        None
    };

    let total = groups.len() + pivot.as_ref().map(|(_, _, chunks)| chunks.len()).unwrap_or(0);
    let mut report = ComposedReport::default();
    let mut done = 0;

    for (key, paths) in &groups {
        let name = key.to_string();
        tracing::info!(page = done, group = %name, images = paths.len(), "lot run");
        report.accept(name.clone(), composer.compose_lot_page(key, paths), options.strict)?;
        done += 1;
        progress(done, total, &name);
    }

    if let Some((table, columns, chunks)) = &pivot {
        if let (Some(dir), false) = (&options.debug_dir, options.dry_run) {
            report.pivot_dump = Some(excel::dump_pivot(table, dir)?);
        }

        for (i, rows) in chunks.iter().enumerate() {
            let name = format!("single{:03}", i);
            let result = composer.compose_pivot_page(table, columns, rows.clone());
            report.accept(name.clone(), result, options.strict)?;
            done += 1;
            progress(done, total, &name);
        }
    }

    Ok(report)
}

/// 実行結果
#[derive(Debug)]
pub struct RunOutcome {
    pub catalog_size: usize,
    pub report: ComposedReport,
    /// 永続化した文書（ドライラン時は None）
    pub output: Option<PathBuf>,
}

/// 入力フォルダからレポートを生成して出力先へ書き出す
pub fn run(
    input_dir: &Path,
    config: &ReportConfig,
    options: &RunOptions,
    sink: &mut dyn ReportSink,
    progress: &mut ProgressFn<'_>,
) -> Result<RunOutcome> {
    // 切り抜きで画像を書き換えるため、同じフォルダへの同時実行を防ぐ
    let _guard = if options.dry_run {
        None
    } else {
        Some(RunGuard::acquire(input_dir)?)
    };

    let catalog = FileCatalog::from_config(input_dir, config)?;
    tracing::info!(records = catalog.len(), "file catalog constructed");

    let report = compose_report(&catalog, config, options, progress)?;

    let output = if options.dry_run {
        None
    } else if report.pages.is_empty() {
        return Err(WaferDeckError::PdfGeneration(format!(
            "全ページの構成に失敗しました（{}ページ）",
            report.failures.len()
        )));
    } else {
        Some(sink.write(&report.pages)?)
    };

    Ok(RunOutcome {
        catalog_size: catalog.len(),
        report,
        output,
    })
}

/// ロット別レポート
pub fn lot_report(
    input_dir: &Path,
    config: &ReportConfig,
    options: &RunOptions,
    sink: &mut dyn ReportSink,
    progress: &mut ProgressFn<'_>,
) -> Result<RunOutcome> {
    let options = RunOptions {
        kind: ReportKind::Lots,
        ..options.clone()
    };
    run(input_dir, config, &options, sink, progress)
}

/// 条件比較レポート
pub fn pivot_report(
    input_dir: &Path,
    config: &ReportConfig,
    options: &RunOptions,
    sink: &mut dyn ReportSink,
    progress: &mut ProgressFn<'_>,
) -> Result<RunOutcome> {
    let options = RunOptions {
        kind: ReportKind::Pivot,
        ..options.clone()
    };
    run(input_dir, config, &options, sink, progress)
}

// ============================================
// 同時実行ガード
// ============================================

/// 入力フォルダ単位の排他ロック
///
/// ロックファイルに OS のアドバイザリロックを掛ける。Drop かプロセス終了で解除され、
/// 異常終了で残ったロックファイルは次回の取得を妨げない。
#[derive(Debug)]
pub struct RunGuard {
    lock_path: PathBuf,
    file: File,
}

impl RunGuard {
    pub const LOCK_FILE: &'static str = ".wafer-deck.lock";

    pub fn acquire(input_dir: &Path) -> Result<Self> {
        if !input_dir.is_dir() {
            return Err(WaferDeckError::InvalidPath(input_dir.display().to_string()));
        }

        let lock_path = input_dir.join(Self::LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(lock = %lock_path.display(), "run guard acquired");
                Ok(Self { lock_path, file })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(WaferDeckError::Busy(lock_path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.lock_path.display(), error = %e, "failed to release run guard");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let guard = RunGuard::acquire(dir.path()).unwrap();
        assert_eq!(guard.lock_path(), dir.path().join(RunGuard::LOCK_FILE));

        let second = RunGuard::acquire(dir.path());
        assert!(matches!(second, Err(WaferDeckError::Busy(_))));

        drop(guard);
        assert!(RunGuard::acquire(dir.path()).is_ok());
    }

    #[test]
    fn test_guard_ignores_leftover_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        // 異常終了でロックファイルだけが残った状態
        std::fs::write(dir.path().join(RunGuard::LOCK_FILE), b"").unwrap();

        let guard = RunGuard::acquire(dir.path());
        assert!(guard.is_ok());
    }

    #[test]
    fn test_guard_invalid_dir() {
        let result = RunGuard::acquire(Path::new("/nonexistent/input"));
        assert!(matches!(result, Err(WaferDeckError::InvalidPath(_))));
    }

    #[test]
    fn test_report_kind_flags() {
        assert!(ReportKind::Both.includes_lots() && ReportKind::Both.includes_pivot());
        assert!(ReportKind::Lots.includes_lots() && !ReportKind::Lots.includes_pivot());
        assert!(!ReportKind::Pivot.includes_lots() && ReportKind::Pivot.includes_pivot());
    }

    #[test]
    fn test_options_debug_dir_requires_debug_mode() {
        let config = ReportConfig {
            debug_dir: Some(PathBuf::from("/tmp/debug")),
            debug_mode: false,
            ..Default::default()
        };
        assert!(RunOptions::from_config(ReportKind::Both, &config).debug_dir.is_none());

        let enabled = ReportConfig {
            debug_mode: true,
            ..config
        };
        assert!(RunOptions::from_config(ReportKind::Both, &enabled).debug_dir.is_some());
    }
}
