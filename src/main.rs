//! # DirectSlip CLI
//!
//! ## Usage
//!
//! ```bash
//! # Serve the HTTP API
//! directslip --config directslip.json serve
//!
//! # Print the built-in test receipt
//! directslip --config directslip.json test-print
//!
//! # Health-check the printer and show its status
//! directslip status
//!
//! # Any command without hardware: directives are logged instead
//! directslip --dry-run serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use directslip::{
    Config, DirectslipError, FaxJob, FaxService, PrinterConnection, SubmitError,
    config::BackendKind,
    driver::{Backend, DummyBackend, UsblpBackend},
    server,
};

/// DirectSlip - remote fax on a receipt printer
#[derive(Parser, Debug)]
#[command(name = "directslip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON); defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the dummy backend regardless of the configuration
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Override the configured listen address
        #[arg(long)]
        listen: Option<String>,
    },
    /// Print the built-in test receipt
    TestPrint,
    /// Health-check the printer and print its status
    Status,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), DirectslipError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.dry_run {
        config.printer.backend = BackendKind::Dummy;
    }

    init_tracing(&config.log_level);
    dump_config(&config);

    match config.printer.backend {
        BackendKind::Dummy => dispatch(cli.command, config, DummyBackend::new()),
        BackendKind::Usblp => {
            let mut backend = UsblpBackend::new().with_read_timeout(config.printer.status_timeout());
            if let Some(path) = &config.printer.device_path {
                backend = backend.with_device_path(path);
            }
            dispatch(cli.command, config, backend)
        }
    }
}

fn dispatch<B: Backend>(command: Commands, config: Config, backend: B) -> Result<(), DirectslipError> {
    info!(backend = backend.name(), printer = %config.printer.ident(), "using printer");

    match command {
        Commands::Serve { listen } => {
            let listen_addr = listen.unwrap_or_else(|| config.listen_addr.clone());
            let service = FaxService::start(&config, backend)?;

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(service, &listen_addr))
        }
        Commands::TestPrint => {
            let mut printer = connect(&config, backend);
            let health = printer.ensure_ready()?;
            if !health.is_ready() {
                return Err(SubmitError::PrinterNotReady(health).into());
            }

            let job = FaxJob::test_job()?;
            printer.print(&job.render())?;
            println!("Test receipt printed");
            Ok(())
        }
        Commands::Status => {
            let mut printer = connect(&config, backend);
            let status = printer.status()?;
            println!("{}", status);
            Ok(())
        }
    }
}

fn connect<B: Backend>(config: &Config, backend: B) -> PrinterConnection<B> {
    PrinterConnection::new(backend, config.printer.ident()).with_boot_delay(config.printer.boot_delay())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("directslip={},tower_http={}", level, level)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn dump_config(config: &Config) {
    debug!("Config:");
    for (key, value) in config.entries() {
        if key != "users" {
            debug!("  {:32} {}", key, value);
        }
    }
    debug!("Users:");
    for user in &config.users {
        debug!("  {}", user);
    }
}
