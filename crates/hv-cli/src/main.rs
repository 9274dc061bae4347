use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use hv_cli::commands::{self, RunContext};
use hv_cli::settings::{self, FlagOverrides};

#[derive(Parser)]
#[command(name = "heliofits")]
#[command(about = "Helioviewer closest-image downloader (FITS / PNG)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download header + image for each date and write FITS files
    Fits {
        #[command(flatten)]
        sel: Selection,

        /// Do not keep the raw header markup next to the FITS file
        #[arg(long, default_value_t = false)]
        no_header_txt: bool,
    },

    /// Download PNG images into png/<YYYY-MM-DD>/ folders
    Png {
        #[command(flatten)]
        sel: Selection,
    },

    /// Print the known source catalog
    Sources,
}

#[derive(Args)]
struct Selection {
    /// Helioviewer sourceId (e.g. 18 = HMI Int)
    #[arg(long, conflicts_with = "source", required_unless_present = "source")]
    source_id: Option<i64>,

    /// Catalog key instead of an id (e.g. SDO_AIA_1600)
    #[arg(long)]
    source: Option<String>,

    /// Requested date, YYYY-MM-DDTHH:MM:SSZ. Repeatable.
    #[arg(long = "date", required = true)]
    dates: Vec<String>,

    /// Output root directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip dates whose closest image is further away than this
    #[arg(long)]
    max_delta_seconds: Option<f64>,

    /// Append skipped/failed dates to this file
    #[arg(long)]
    failed_log: Option<PathBuf>,

    /// Dates processed at once
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    config_paths: Vec<String>,
}

impl Selection {
    fn flags(&self, no_header_txt: bool) -> FlagOverrides {
        FlagOverrides {
            out: self.out.clone(),
            no_header_txt,
            max_delta_seconds: self.max_delta_seconds,
            failed_log: self.failed_log.clone(),
            max_concurrency: self.max_concurrency,
        }
    }

    fn context(&self, no_header_txt: bool) -> Result<RunContext> {
        let settings = settings::load(&self.config_paths, &self.flags(no_header_txt))?;
        let source_id = commands::select_source(self.source_id, self.source.as_deref())?;
        tracing::info!(
            source_id,
            dates = self.dates.len(),
            base_url = %settings.base_url,
            config_hash = %settings.config_hash,
            max_concurrency = settings.max_concurrency,
            "heliofits run"
        );
        Ok(RunContext::new(&settings, source_id))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Fits { sel, no_header_txt } => {
            let ctx = sel.context(no_header_txt)?;
            let res = commands::fits::run(&ctx, &sel.dates).await;
            print_json(&res)?;
        }

        Commands::Png { sel } => {
            let ctx = sel.context(false)?;
            let res = commands::png::run(&ctx, &sel.dates).await;
            print_json(&res)?;
        }

        Commands::Sources => {
            print_json(&commands::sources::catalog())?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(v: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(v).context("summary serialize failed")?;
    println!("{s}");
    Ok(())
}

/// Logs go to stderr; stdout carries only the JSON summary.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
