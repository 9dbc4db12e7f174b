//! etfscreen CLI — download and clean the etfdb.com screener.
//!
//! Commands:
//! - `download` — fetch the requested tabs, merge, clean, and write or preview
//! - `tabs` — list the screener tabs that can be requested

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use etfscreen_core::source::{EtfDbSource, RetryPolicy, TracingObserver};
use etfscreen_core::table::{write_table, MergeKey, OutputFormat};
use etfscreen_core::{clean_table, fetch_raw_table, ScreenerConfig, Tab};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "etfscreen",
    about = "etfscreen — download and clean ETF screener data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch screener tabs, merge them into one table, and clean it.
    Download {
        /// Path to a TOML config file. Flags below override it.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rows requested per tab.
        #[arg(long)]
        per_page: Option<u32>,

        /// Selection mode forwarded to the screener (`data` or `meta`).
        #[arg(long)]
        only: Option<String>,

        /// Comma-separated tabs to fetch. Defaults to all twelve.
        #[arg(long, value_delimiter = ',', value_parser = parse_tab)]
        tabs: Vec<Tab>,

        /// How rows of later tabs are matched to earlier ones (default: position).
        #[arg(long, value_enum)]
        merge_key: Option<MergeKeyArg>,

        /// Retry failed requests immediately and forever.
        #[arg(long, default_value_t = false)]
        unbounded_retry: bool,

        /// Skip cleaning and emit the merged table as text.
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Write the table here instead of printing a preview.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format. Guessed from the output extension when omitted.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// List the screener tabs.
    Tabs,
}

#[derive(Clone, Copy, ValueEnum)]
enum MergeKeyArg {
    Symbol,
    Position,
}

impl From<MergeKeyArg> for MergeKey {
    fn from(arg: MergeKeyArg) -> Self {
        match arg {
            MergeKeyArg::Symbol => MergeKey::Symbol,
            MergeKeyArg::Position => MergeKey::Position,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Parquet,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Parquet => OutputFormat::Parquet,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn parse_tab(s: &str) -> Result<Tab, String> {
    s.trim().parse().map_err(|e| format!("{e}"))
}

/// Command-line overrides applied on top of the config file.
struct Overrides {
    per_page: Option<u32>,
    only: Option<String>,
    tabs: Vec<Tab>,
    merge_key: Option<MergeKey>,
}

impl Overrides {
    fn apply(self, config: &mut ScreenerConfig) {
        if let Some(per_page) = self.per_page {
            config.per_page = per_page;
        }
        if let Some(only) = self.only {
            config.only = only;
        }
        if !self.tabs.is_empty() {
            config.tabs = self.tabs;
        }
        if let Some(merge_key) = self.merge_key {
            config.merge_key = merge_key;
        }
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).with_target(false).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            config,
            per_page,
            only,
            tabs,
            merge_key,
            unbounded_retry,
            raw,
            output,
            format,
        } => {
            let overrides = Overrides {
                per_page,
                only,
                tabs,
                merge_key: merge_key.map(MergeKey::from),
            };
            let config = build_config(config.as_deref(), overrides)?;
            run_download(
                &config,
                unbounded_retry,
                raw,
                output.as_deref(),
                format.map(OutputFormat::from),
            )
        }
        Commands::Tabs => {
            for tab in Tab::ALL {
                println!("{tab}");
            }
            Ok(())
        }
    }
}

fn build_config(path: Option<&Path>, overrides: Overrides) -> Result<ScreenerConfig> {
    let mut config = match path {
        Some(path) => ScreenerConfig::load(path)?,
        None => ScreenerConfig::default(),
    };
    overrides.apply(&mut config);
    if config.per_page == 0 {
        anyhow::bail!("--per-page must be positive");
    }
    Ok(config)
}

fn run_download(
    config: &ScreenerConfig,
    unbounded_retry: bool,
    raw: bool,
    output: Option<&Path>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let policy = if unbounded_retry {
        RetryPolicy::unbounded_immediate()
    } else {
        config.retry_policy()
    };
    let source = EtfDbSource::new()?
        .endpoint(config.endpoint.clone())
        .retry_policy(policy);
    let observer = TracingObserver;
    let request = config.request();

    tracing::info!(
        tabs = request.tabs.len(),
        per_page = request.per_page,
        "starting screener download"
    );

    let table = fetch_raw_table(&source, &request, &observer).context("download failed")?;
    let mut df = if raw {
        table.to_dataframe()?
    } else {
        clean_table(table, &config.clean).context("cleaning failed")?
    };

    match output {
        Some(path) => {
            let format = resolve_format(path, format)?;
            write_table(&mut df, path, format)?;
            println!(
                "Wrote {} rows x {} columns to {}",
                df.height(),
                df.width(),
                path.display()
            );
        }
        None => print_preview(&df),
    }
    Ok(())
}

fn resolve_format(path: &Path, format: Option<OutputFormat>) -> Result<OutputFormat> {
    format
        .or_else(|| OutputFormat::from_path(path))
        .with_context(|| {
            format!(
                "cannot tell the output format of {}; pass --format",
                path.display()
            )
        })
}

fn print_preview(df: &DataFrame) {
    let (rows, cols) = df.shape();
    println!();
    println!("=== Screener Table ===");
    println!("Rows:    {rows}");
    println!("Columns: {cols}");
    println!();
    println!("{}", df.head(Some(10)));
}
