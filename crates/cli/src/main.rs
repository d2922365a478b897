use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use shotstamp_core::{
    app_paths, load_config, spawn_batch, BatchEvent, CancelToken, RenameConfig, TaskOutcome,
    TaskStatus,
};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Parser)]
#[command(name = "shotstamp-cli")]
#[command(about = "写真の撮影日時からファイル名を一括リネームします")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[arg(long)]
    pattern: Option<String>,
    #[arg(long = "ext")]
    extensions: Vec<String>,
    #[arg(long, default_value_t = false)]
    recursive: bool,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let app_config = load_config()?;
    let pattern = args.pattern.unwrap_or(app_config.timestamp_pattern);
    let extensions = if args.extensions.is_empty() {
        app_config.accepted_extensions
    } else {
        args.extensions
    };
    let config = RenameConfig::new(pattern, extensions)?;

    let candidates =
        collect_candidates(&args.inputs, &config, args.recursive, args.include_hidden)?;
    if candidates.is_empty() {
        anyhow::bail!("対象ファイルがありません");
    }

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.request())
            .context("Ctrl-Cハンドラを登録できませんでした")?;
    }

    let total = candidates.len() as u64;
    let table = matches!(args.output, OutputFormat::Table);
    let handle = spawn_batch(candidates, config, cancel)?;

    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    for event in &handle.events {
        match event {
            BatchEvent::TaskFinished { outcome } => {
                if table {
                    progress.println(outcome_line(&outcome));
                }
            }
            BatchEvent::Progress { processed, .. } => progress.set_position(processed as u64),
            BatchEvent::Finished { .. } => {}
        }
    }
    let run = handle.join()?;
    progress.finish_and_clear();

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        OutputFormat::Table => {
            if run.cancelled {
                eprintln!(
                    "キャンセルされました: 残り{}件は未処理です",
                    run.total - run.processed
                );
            }
            eprintln!(
                "リネーム完了: {}件 / スキップ {}件 / 失敗 {}件",
                run.summary.renamed, run.summary.skipped, run.summary.failed
            );
        }
    }

    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn outcome_line(outcome: &TaskOutcome) -> String {
    match outcome.status {
        TaskStatus::Renamed => format!(
            "{} -> {}",
            outcome.source_path.display(),
            outcome
                .target_path
                .as_deref()
                .unwrap_or(Path::new("?"))
                .display()
        ),
        TaskStatus::Skipped => format!("{} (変更なし)", outcome.source_path.display()),
        TaskStatus::Failed => format!(
            "{} (失敗: {})",
            outcome.source_path.display(),
            outcome.error_detail.as_deref().unwrap_or("不明なエラー")
        ),
        TaskStatus::Pending => format!("{} (未処理)", outcome.source_path.display()),
    }
}

fn collect_candidates(
    inputs: &[PathBuf],
    config: &RenameConfig,
    recursive: bool,
    include_hidden: bool,
) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            collect_from_dir(input, config, recursive, include_hidden, &mut out)?;
        } else if input.is_file() {
            if config.accepts(input) {
                out.push(input.clone());
            }
        } else {
            anyhow::bail!("入力が存在しません: {}", input.display());
        }
    }
    Ok(out)
}

fn collect_from_dir(
    root: &Path,
    config: &RenameConfig,
    recursive: bool,
    include_hidden: bool,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if is_hidden(path) && !include_hidden {
                continue;
            }
            if config.accepts(path) {
                out.push(path.to_path_buf());
            }
        }
    } else {
        let mut files = Vec::new();
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if is_hidden(&path) && !include_hidden {
                continue;
            }
            if config.accepts(&path) {
                files.push(path);
            }
        }
        files.sort();
        out.extend(files);
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
