use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pivot_udx::command::{SessionFile, run_session};
use pivot_udx::logging;
use pivot_udx::shared::config::PivotConfig;
use pivot_udx::shared::response::{ArrowRenderer, JsonRenderer, Renderer};
use tracing::info;

#[derive(Parser)]
#[command(name = "pivot_udx")]
#[command(about = "Row-to-column pivot transform driven by a catalog query", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one pivot session described by a JSON file.
    Run {
        /// Session file: input schema, parameters, catalog and partitions.
        session: PathBuf,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Write output here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Arrow,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init()?;

    match args.command {
        Command::Run {
            session,
            format,
            output,
        } => {
            let file = SessionFile::load(&session)
                .with_context(|| format!("loading {}", session.display()))?;
            let result = run_session(&file, PivotConfig::from_app_config())?;

            let mut renderer: Box<dyn Renderer> = match format {
                OutputFormat::Json => Box::new(JsonRenderer),
                OutputFormat::Arrow => Box::new(ArrowRenderer::new()),
            };
            let bytes = renderer.render(&result.columns, &result.rows)?;

            match output {
                Some(path) => fs::write(&path, &bytes)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => io::stdout().lock().write_all(&bytes)?,
            }
            info!(rows = result.rows.len(), "Pivot output written");
        }
    }
    Ok(())
}
