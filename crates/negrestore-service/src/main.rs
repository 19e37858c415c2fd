//! `negrestore`: run the restoration service or process files directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use negrestore_core::CorrectionParams;
use negrestore_service::{ImageStore, ServiceConfig, logging, server};

/// Negative Restore - turn scanned color negatives into positives
#[derive(Parser)]
#[command(name = "negrestore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the WebSocket service
    Serve {
        /// Listen address (overrides NEGRESTORE_ADDR)
        #[arg(long)]
        addr: Option<String>,
        /// Storage root (overrides NEGRESTORE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Correction parameters as JSON (overrides NEGRESTORE_PARAMS)
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Restore a single file; the output extension picks PNG or JPEG
    Process {
        input: PathBuf,
        output: PathBuf,
        /// Correction parameters as JSON
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Run one retention pass over the store and exit
    Sweep {
        /// Storage root (overrides NEGRESTORE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print the default correction parameters as JSON
    Params,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Serve {
            addr,
            data_dir,
            params,
        } => {
            let mut config = ServiceConfig::default();
            if let Some(addr) = addr {
                config.addr = addr;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if params.is_some() {
                config.params_path = params;
            }
            serve(config)
        }
        Commands::Process {
            input,
            output,
            params,
        } => {
            let params = load_params(params.as_deref())?;
            negrestore_core::process_file(&input, &output, &params)
                .with_context(|| format!("failed to restore {}", input.display()))
        }
        Commands::Sweep { data_dir } => {
            let mut config = ServiceConfig::default();
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            let store = ImageStore::open(&config, CorrectionParams::default())?;
            let report = store.sweep_now();
            tracing::info!(
                removed = report.removed.len(),
                failed = report.failed,
                "sweep finished"
            );
            if report.failed > 0 {
                anyhow::bail!("{} entries could not be swept", report.failed);
            }
            Ok(())
        }
        Commands::Params => {
            println!("{}", CorrectionParams::default().to_json_pretty());
            Ok(())
        }
    }
}

fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let params = load_params(config.params_path.as_deref())?;
    let store = Arc::new(ImageStore::open(&config, params)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime
        .block_on(server::serve(&config, store))
        .with_context(|| format!("server on {} stopped", config.addr))
}

fn load_params(path: Option<&Path>) -> anyhow::Result<CorrectionParams> {
    match path {
        Some(path) => CorrectionParams::load(path)
            .with_context(|| format!("invalid parameter file {}", path.display())),
        None => Ok(CorrectionParams::default()),
    }
}
