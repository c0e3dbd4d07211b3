//! cgstatd - Control-group statistics collector daemon.
//!
//! Expands rule-declared path patterns into control-group directories,
//! parses the control files found there and prints one record per line
//! to stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use cgstat::collector::{Accumulator, CgroupCollector, RealFs};
use cgstat::config::Config;
use cgstat::model::{FieldMap, TagMap};

/// Control-group statistics collector daemon.
#[derive(Parser)]
#[command(name = "cgstatd", about = "Control-group statistics collector daemon", version)]
struct Args {
    /// Path to the rules file.
    #[arg(short, long, default_value = "cgstat.toml")]
    config: PathBuf,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Gather once and exit.
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("cgstatd={}", level).parse().unwrap())
        .add_directive(format!("cgstat={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Sink that prints one line per record to stdout:
/// `<unix timestamp> <measurement> <tags> <fields>`.
struct PrintAccumulator;

impl Accumulator for PrintAccumulator {
    fn add_fields(&mut self, measurement: &str, fields: FieldMap, tags: TagMap) {
        let tags = tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        let fields = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        println!("{} {} {} {}", Utc::now().timestamp(), measurement, tags, fields);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("cgstatd {} starting", env!("CARGO_PKG_VERSION"));

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load rules from {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Loaded {} rules from {}",
        config.rules.len(),
        args.config.display()
    );

    let collector = match CgroupCollector::from_config(RealFs::new(), &config) {
        Ok(collector) => collector,
        Err(e) => {
            error!("Invalid rules: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut acc = PrintAccumulator;

    if args.once {
        return match collector.gather(&mut acc) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Gather failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let interval = Duration::from_secs(args.interval);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");

    while running.load(Ordering::SeqCst) {
        match collector.gather(&mut acc) {
            Ok(()) => debug!("Gather cycle complete"),
            Err(e) => error!("Gather failed: {}", e),
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
