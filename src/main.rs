use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use il_case_panel::config::Config;
use il_case_panel::export::{write_panel, ExportFormat};
use il_case_panel::logging;
use il_case_panel::{SelectorOptions, SourceKind, SourceSelector};

#[derive(Parser)]
#[command(name = "il-case-panel")]
#[command(about = "Builds as-of case-count panels from Israeli COVID-19 feeds")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to $IL_PANEL_CONFIG, then built-in settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a feed and export its as-of panel
    Panel {
        /// Feed to use: national, regional or severe
        #[arg(long)]
        source: SourceKind,
        /// Backtest reference date (YYYY-MM-DD); rows from this day on are hidden.
        /// Defaults to today
        #[arg(long)]
        run_date: Option<NaiveDate>,
        /// Replace `total` with the configured constant instead of the published denominator
        #[arg(long)]
        no_normalize_denominator: bool,
        /// Keep only the country-wide aggregate rows
        #[arg(long)]
        national_only: bool,
        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the configured sources and their endpoints
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    // Hold the guard so the file writer flushes on exit
    let _log_guard = logging::init_logging(&config.logging).context("initializing logging")?;

    match cli.command {
        Commands::Panel {
            source,
            run_date,
            no_normalize_denominator,
            national_only,
            format,
            output,
        } => {
            let run_date = run_date.unwrap_or_else(|| Utc::now().date_naive());
            let options = SelectorOptions {
                normalize_denominator: !no_normalize_denominator,
                include_regions: !national_only,
            };
            info!(%source, %run_date, ?options, "building panel");

            let selector = SourceSelector::over_http(&config)?;
            let panel = match selector.load(source, run_date, options).await {
                Ok(panel) => panel,
                Err(e) => {
                    error!("Panel build failed: {}", e);
                    return Err(e)
                        .with_context(|| format!("building {} panel as of {}", source, run_date));
                }
            };

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating output file {}", path.display()))?;
                    write_panel(&panel, format, BufWriter::new(file))?;
                    info!(rows = panel.len(), path = %path.display(), "panel written");
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    write_panel(&panel, format, &mut handle)?;
                    handle.flush()?;
                }
            }
        }
        Commands::Sources => {
            for kind in SourceKind::ALL {
                println!("{:<10} {}", kind.as_str(), config.sources.url_for(kind));
            }
            println!(
                "regional resource_id={} page_limit={} max_pages={}",
                config.sources.regional.resource_id,
                config.sources.regional.page_limit,
                config.sources.regional.max_pages
            );
        }
    }

    Ok(())
}
