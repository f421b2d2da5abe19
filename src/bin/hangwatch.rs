//! Hangwatch - health monitor demo
//!
//! Runs a simulated primary thread that renders frames and drains probes,
//! blocks it once to provoke a hang, and logs what the monitor reports.
//!
//! Usage:
//!   hangwatch [--hang-ms <MS>] [--duration-ms <MS>] [--release <NAME>]
//!
//! Running with `--crash` exits before startup completes, so the next run
//! reports the crash.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use runtime_health::logging::{LogOutput, LoggingConfig, LoggingSystem};
use runtime_health::{
    main_queue, AnrListener, AnrStoppedResult, HangType, HealthConfig, HealthMonitor, Result,
};

/// Command line arguments
struct Args {
    /// Configuration file
    config: Option<PathBuf>,
    /// Startup attempt key
    release: String,
    /// When the simulated hang starts, in milliseconds
    hang_at_ms: u64,
    /// How long the primary thread blocks
    hang_ms: u64,
    /// Total run time
    duration_ms: u64,
    /// Exit before completing startup
    crash: bool,
    /// Forget previous startup attempts first
    reset: bool,
    /// Enable verbose logging
    verbose: bool,
}

impl Args {
    fn parse() -> std::result::Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            config: None,
            release: "demo".to_string(),
            hang_at_ms: 1000,
            hang_ms: 3000,
            duration_ms: 8000,
            crash: false,
            reset: false,
            verbose: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    parsed.config = args.next().map(PathBuf::from);
                }
                "--release" | "-r" => {
                    parsed.release = args.next().ok_or("--release needs a value")?;
                }
                "--hang-at-ms" => {
                    parsed.hang_at_ms = parse_ms(args.next(), "--hang-at-ms")?;
                }
                "--hang-ms" => {
                    parsed.hang_ms = parse_ms(args.next(), "--hang-ms")?;
                }
                "--duration-ms" | "-d" => {
                    parsed.duration_ms = parse_ms(args.next(), "--duration-ms")?;
                }
                "--crash" => {
                    parsed.crash = true;
                }
                "--reset" => {
                    parsed.reset = true;
                }
                "--verbose" | "-v" => {
                    parsed.verbose = true;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("Unknown argument: {}", arg));
                }
            }
        }

        Ok(parsed)
    }
}

fn parse_ms(value: Option<String>, flag: &str) -> std::result::Result<u64, String> {
    value
        .ok_or(format!("{} needs a value", flag))?
        .parse()
        .map_err(|_| format!("Invalid {} value", flag))
}

fn print_help() {
    println!(
        r#"Hangwatch - Runtime Health Monitor Demo

USAGE:
    hangwatch [OPTIONS]

OPTIONS:
    -c, --config <PATH>        JSON configuration file
    -r, --release <NAME>       Startup attempt key (default: demo)
        --hang-at-ms <MS>      When the simulated hang starts (default: 1000)
        --hang-ms <MS>         How long the primary thread blocks (default: 3000)
    -d, --duration-ms <MS>     Total run time (default: 8000)
        --crash                Exit before startup completes
        --reset                Forget previous startup attempts first
    -v, --verbose              Enable verbose logging
    -h, --help                 Print this help message
"#
    );
}

/// Logs every notification it receives
struct LogListener;

impl AnrListener for LogListener {
    fn anr_detected(&self, hang_type: HangType) {
        tracing::warn!("anr_detected: {}", hang_type);
    }

    fn anr_stopped(&self, result: AnrStoppedResult) {
        tracing::info!(
            "anr_stopped: {} after {:?}",
            result.hang_type,
            result.duration
        );
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => HealthConfig::load(path)?,
        None => HealthConfig::default(),
    };

    if args.verbose {
        config.logging = LoggingConfig::verbose();
    }
    config.logging.output = LogOutput::Console;
    let _logging = LoggingSystem::init(&config.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("hangwatch-monitor")
        .enable_all()
        .build()?;

    let (probe, mut queue) = main_queue();
    let monitor = HealthMonitor::with_file_store(config, Arc::new(probe), runtime.handle().clone())?
        .with_crash_callback(|key| {
            tracing::warn!("Previous run of {} crashed during startup", key);
        });

    if args.reset {
        monitor.watchdog().reset();
    }

    let outcome = monitor.watchdog().begin_startup(&args.release);
    tracing::info!("Startup check for {}: {:?}", args.release, outcome);

    if args.crash {
        tracing::error!("Exiting before startup completes");
        std::process::exit(70);
    }

    let listener = Arc::new(LogListener);
    let id = monitor.anr().add(&listener);
    monitor.watchdog().finish_startup(&args.release);

    // Simulated primary thread
    let frame_interval = monitor.config().frames.ideal_frame_interval();
    let started = Instant::now();
    let hang_at = started + Duration::from_millis(args.hang_at_ms);
    let run_until = started + Duration::from_millis(args.duration_ms);
    let mut hung = false;

    while Instant::now() < run_until {
        queue.run_pending();
        monitor.frames().record_frame(Instant::now());

        if !hung && Instant::now() >= hang_at {
            hung = true;
            tracing::info!("Blocking primary thread for {}ms", args.hang_ms);
            std::thread::sleep(Duration::from_millis(args.hang_ms));
            continue;
        }

        std::thread::sleep(frame_interval);
    }

    let stats = monitor.frames().stats();
    tracing::info!(
        "Frames: {} total, {} slow, {} frozen",
        stats.total,
        stats.slow,
        stats.frozen
    );

    monitor.anr().remove(id);
    drop(monitor);
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("hangwatch failed: {}", e);
        std::process::exit(1);
    }
}
