use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

use sensor_scan::config;
use sensor_scan::display::TerminalDisplay;
use sensor_scan::formats::{format_type_items, BarcodeFormat};
use sensor_scan::model::Outcome;
use sensor_scan::processor::ScanResultProcessor;
use sensor_scan::registrar::SensorRegistrar;
use sensor_scan::scanner::{LineScanner, PresetScanner, ScanRequest, Scanner, ScanningMode};
use sensor_scan::session::ScanSession;
use sensor_scan::store::{RealtimeDbClient, RealtimeStore};

#[derive(Debug, Parser)]
#[command(author, version, about = "Flag scanned sensors as used in the realtime database")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan codes given with --payload, or read decoder output from stdin
    Scan {
        /// Scanned payload; may be repeated. Reads stdin when omitted
        #[arg(long = "payload")]
        payloads: Vec<String>,

        /// Scanning mode (defaults to the configured one)
        #[arg(long, value_enum)]
        mode: Option<ScanningMode>,

        /// Accept only these formats; may be repeated
        #[arg(long = "format", value_enum)]
        formats: Vec<BarcodeFormat>,

        /// Keep scanning until stdin ends
        #[arg(long)]
        repeat: bool,
    },
    /// Create a new sensor record under a generated key
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List the known barcode formats
    Formats,
    /// Print an example configuration
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Formats => {
            for name in format_type_items() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::ExampleConfig => {
            print!("{}", config::example());
            Ok(())
        }
        Command::Register { name, description } => {
            let cfg = config::load(Some(&args.config))?;
            let store = connect(&cfg)?;
            let registrar = SensorRegistrar::new(store, cfg.store.sensors_path.clone());
            let key = registrar.create_sensor(&name, &description).await;
            println!("{}", key);
            Ok(())
        }
        Command::Scan {
            payloads,
            mode,
            formats,
            repeat,
        } => {
            let cfg = config::load(Some(&args.config))?;
            let store = connect(&cfg)?;

            let mut request = cfg.scanner.request();
            if let Some(mode) = mode {
                request.mode = mode;
            }
            if !formats.is_empty() {
                request.formats = formats;
            }

            let scanner: Arc<dyn Scanner> = if payloads.is_empty() {
                Arc::new(LineScanner::new(BufReader::new(tokio::io::stdin())))
            } else {
                Arc::new(PresetScanner::new(payloads))
            };
            run_scans(&cfg, store, scanner, request, repeat).await
        }
    }
}

fn connect(cfg: &config::Config) -> Result<Arc<dyn RealtimeStore>> {
    let client = RealtimeDbClient::from_config(&cfg.store)
        .context("failed to set up realtime database client")?;
    info!(?client, path = %cfg.store.sensors_path, "store client ready");
    Ok(Arc::new(client))
}

async fn run_scans(
    cfg: &config::Config,
    store: Arc<dyn RealtimeStore>,
    scanner: Arc<dyn Scanner>,
    request: ScanRequest,
    repeat: bool,
) -> Result<()> {
    let processor = ScanResultProcessor::from_config(store, cfg);
    let display = Arc::new(TerminalDisplay::new(cfg.app.language));
    let session = ScanSession::new(scanner, processor, display, request);

    let mut failed = false;
    loop {
        let outcome = session.scan_once().await?;
        failed |= matches!(outcome.outcome, Outcome::Failure(_));
        if !repeat || session.scanner_exhausted() {
            break;
        }
    }
    if failed {
        anyhow::bail!("at least one status update failed");
    }
    Ok(())
}
