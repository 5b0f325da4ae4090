use crate::export::ExportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wafer-deck")]
#[command(about = "ウェハ検査画像を分類し、ロット別/条件比較スライドを生成するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定ファイル（デフォルト: ~/.config/wafer-deck/config.json）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を検出してロット × 条件の枚数を表示
    Detect {
        /// 入力フォルダ（省略時は設定の input_dir）
        folder: Option<PathBuf>,
    },

    /// ロット別ページのみ生成
    Lots(ReportArgs),

    /// 条件比較ページのみ生成
    Pivot(ReportArgs),

    /// ロット別・条件比較の両方を1文書に生成
    Run(ReportArgs),

    /// 切り抜き正規化のみ実行
    Crop {
        /// 入力フォルダ（省略時は設定の input_dir）
        folder: Option<PathBuf>,

        /// ドライラン（対象を数えるだけで画像を変更しない）
        #[arg(long)]
        dry_run: bool,
    },

    /// 有効な設定（既定値で補完済み）をJSONで表示
    Config,
}

#[derive(Args, Clone, Debug)]
pub struct ReportArgs {
    /// 入力フォルダ（省略時は設定の input_dir）
    pub folder: Option<PathBuf>,

    /// 出力フォルダ（省略時は設定の output_dir → カレント）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 出力形式 (pdf/json)
    #[arg(short, long, default_value = "pdf")]
    pub format: ExportFormat,

    /// 1ページでも失敗したら中断
    #[arg(long)]
    pub strict: bool,

    /// 配置前の切り抜きを行わない
    #[arg(long)]
    pub no_crop: bool,

    /// ドライラン（画像・文書を変更せず配置指示JSONを標準出力へ）
    #[arg(long)]
    pub dry_run: bool,
}
