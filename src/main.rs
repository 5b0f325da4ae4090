use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use wafer_deck::cli::{Cli, Commands, ReportArgs};
use wafer_deck::compose::normalize_catalog;
use wafer_deck::config::ReportConfig;
use wafer_deck::export::sink_for;
use wafer_deck::pipeline::{self, ReportKind, RunGuard, RunOptions};
use wafer_deck::scanner::FileCatalog;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ReportConfig::load(cli.config.as_deref()).context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Detect { folder } => {
            println!("🔍 wafer-deck - 画像検出\n");
            let input_dir = config.resolve_input_dir(folder.as_deref())?;
            let catalog = FileCatalog::from_config(&input_dir, &config)?;
            let summary = catalog.summary();
            println!("{}", summary);
            println!("✔ {}枚の画像を検出: {}", summary.total(), input_dir.display());
        }

        Commands::Lots(args) => report(&config, ReportKind::Lots, args)?,
        Commands::Pivot(args) => report(&config, ReportKind::Pivot, args)?,
        Commands::Run(args) => report(&config, ReportKind::Both, args)?,

        Commands::Crop { folder, dry_run } => {
            println!("✂ wafer-deck - 切り抜き正規化{}\n", if dry_run { " (ドライラン)" } else { "" });
            let input_dir = config.resolve_input_dir(folder.as_deref())?;
            let _guard = if dry_run { None } else { Some(RunGuard::acquire(&input_dir)?) };

            let catalog = FileCatalog::from_config(&input_dir, &config)?;
            let result = normalize_catalog(&catalog, &config.crop_spec(), dry_run);

            println!("  対象: {}枚", result.total());
            if dry_run {
                println!("  切り抜き対象: {}枚", result.would_crop);
            } else {
                println!("  切り抜き: {}枚", result.cropped);
            }
            println!("  スキップ（サイズ不一致）: {}枚", result.skipped);

            if !result.failed.is_empty() {
                for (path, reason) in &result.failed {
                    eprintln!("  ✖ {}: {}", path.display(), reason);
                }
                bail!("{}枚の画像を処理できませんでした", result.failed.len());
            }
            println!("\n✅ 完了");
        }

        Commands::Config => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => ReportConfig::config_path()?,
            };
            println!("設定ファイル: {}", path.display());
            println!("{}", config.to_pretty_json()?);
        }
    }

    Ok(())
}

fn report(config: &ReportConfig, kind: ReportKind, args: ReportArgs) -> anyhow::Result<()> {
    let label = match kind {
        ReportKind::Lots => "ロット別",
        ReportKind::Pivot => "条件比較",
        ReportKind::Both => "一括",
    };
    eprintln!("🚀 wafer-deck - {}レポート\n", label);

    let input_dir = config.resolve_input_dir(args.folder.as_deref())?;
    let output_dir = config.resolve_output_dir(args.output.as_deref());

    let mut options = RunOptions::from_config(kind, config);
    options.strict = args.strict;
    options.dry_run = args.dry_run;
    if args.no_crop {
        options.normalize = false;
    }
    if config.debug_mode && options.debug_dir.is_none() {
        options.debug_dir = Some(output_dir.join("debug"));
    }

    let mut sink = sink_for(args.format, &output_dir, config);

    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    let mut progress = |done: usize, total: usize, name: &str| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
        bar.set_message(name.to_string());
    };

    let outcome = match kind {
        ReportKind::Lots => pipeline::lot_report(&input_dir, config, &options, sink.as_mut(), &mut progress),
        ReportKind::Pivot => pipeline::pivot_report(&input_dir, config, &options, sink.as_mut(), &mut progress),
        ReportKind::Both => pipeline::run(&input_dir, config, &options, sink.as_mut(), &mut progress),
    };
    bar.finish_and_clear();
    let outcome = outcome.with_context(|| format!("レポート生成に失敗しました: {}", input_dir.display()))?;

    eprintln!("✔ {}枚の画像を分類", outcome.catalog_size);
    eprintln!("✔ {}ページを構成", outcome.report.pages.len());
    for failure in &outcome.report.failures {
        eprintln!("  ⚠ {} をスキップ: {}", failure.page, failure.error);
    }
    if let Some(dump) = &outcome.report.pivot_dump {
        eprintln!("✔ ピボット表: {}", dump.display());
    }

    match &outcome.output {
        Some(path) => eprintln!("✔ 出力: {}", path.display()),
        None => println!("{}", serde_json::to_string_pretty(&outcome.report.pages)?),
    }

    eprintln!("\n✅ 完了");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,wafer_deck=debug"
    } else {
        "warn,wafer_deck=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
