//! Pulse CLI - Command-line interface for Pulse Series
//!
//! Commands:
//! - render: Run a metric's raw records through the pipeline
//! - summary: Build the activity/sleep/resting-HR headline summary
//! - config: Print the effective configuration
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

use pulse_series::daily::TargetInfo;
use pulse_series::metrics::{parse_ndjson_records, parse_records};
use pulse_series::timestamp::parse_timestamp;
use pulse_series::{
    Config, Metric, MetricSeries, SeriesError, SeriesProcessor, TimeRange, PRODUCER_NAME,
    PULSE_VERSION,
};

/// Pulse - Gap-aware time-series normalization for wearable dashboards
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = PULSE_VERSION)]
#[command(about = "Resample and bridge wearable time series for charting", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run raw metric records through the pipeline
    Render {
        /// Metric to process (heart_rate, hrv, stress, blood_oxygen)
        #[arg(short, long)]
        metric: Metric,

        /// Window in days (1, 3, 7, 10, 30)
        #[arg(short, long, default_value = "1")]
        range: TimeRange,

        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// End of the window (defaults to the current time)
        #[arg(long)]
        now: Option<String>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build the period summary from activity, sleep and heart-rate records
    Summary {
        /// Activity records (JSON array)
        #[arg(long)]
        activity: Option<PathBuf>,

        /// Sleep records (JSON array)
        #[arg(long)]
        sleep: Option<PathBuf>,

        /// Heart-rate records (JSON array)
        #[arg(long)]
        heart_rate: Option<PathBuf>,

        /// Goal targets (JSON object)
        #[arg(long)]
        targets: Option<PathBuf>,

        /// Window in days (1, 3, 7, 10, 30)
        #[arg(short, long, default_value = "1")]
        range: TimeRange,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Configuration file to merge over the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Configuration file to check
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One chart point per line
    Ndjson,
    /// Full series as compact JSON
    Json,
    /// Full series as pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Render {
            metric,
            range,
            input,
            output,
            input_format,
            output_format,
            now,
            config,
        } => cmd_render(
            metric,
            range,
            &input,
            &output,
            input_format,
            output_format,
            now.as_deref(),
            config.as_deref(),
        ),

        Commands::Summary {
            activity,
            sleep,
            heart_rate,
            targets,
            range,
            pretty,
        } => cmd_summary(
            activity.as_deref(),
            sleep.as_deref(),
            heart_rate.as_deref(),
            targets.as_deref(),
            range,
            pretty,
        ),

        Commands::Config { config } => cmd_config(config.as_deref()),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_render(
    metric: Metric,
    range: TimeRange,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    now: Option<&str>,
    config: Option<&Path>,
) -> Result<(), PulseCliError> {
    let processor = SeriesProcessor::with_config(load_config(config)?)?;
    let now = resolve_now(now)?;

    let input_data = read_input(input)?;
    let records = match input_format {
        InputFormat::Json => parse_records(&input_data)?,
        InputFormat::Ndjson => parse_ndjson_records(&input_data)?,
    };

    tracing::info!(%metric, %range, records = records.len(), %now, "rendering series");
    let series = processor.process_records(metric, &records, range, now);

    write_output(output, &format_series(&series, &output_format)?)
}

fn cmd_summary(
    activity: Option<&Path>,
    sleep: Option<&Path>,
    heart_rate: Option<&Path>,
    targets: Option<&Path>,
    range: TimeRange,
    pretty: bool,
) -> Result<(), PulseCliError> {
    let read_or_empty = |path: Option<&Path>| -> Result<String, PulseCliError> {
        match path {
            Some(p) => read_input(p),
            None => Ok("[]".to_string()),
        }
    };

    let targets: TargetInfo = match targets {
        Some(p) => serde_json::from_str(&read_input(p)?)?,
        None => TargetInfo::default(),
    };

    let summary = SeriesProcessor::new().summarize(
        &read_or_empty(activity)?,
        &read_or_empty(sleep)?,
        &read_or_empty(heart_rate)?,
        &targets,
        range,
    )?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{}", rendered);
    Ok(())
}

fn cmd_config(config: Option<&Path>) -> Result<(), PulseCliError> {
    let config = load_config(config)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "pulse_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Pulse version {}", PULSE_VERSION),
    });

    match config {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: format!("Config file {} does not exist, defaults apply", path.display()),
        }),
        Some(path) => match Config::load_validated(path) {
            Ok(cfg) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (pass-through below {} samples, display offset {} min)",
                    cfg.resample.passthrough_max_samples, cfg.display.utc_offset_minutes
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "No config file given, defaults apply".to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input for render)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (render can read from -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<Config, PulseCliError> {
    match path {
        Some(p) => Ok(Config::load_validated(p)?),
        None => Ok(Config::default()),
    }
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>, PulseCliError> {
    match raw {
        Some(s) => parse_timestamp(s, chrono::Offset::fix(&Utc))
            .ok_or_else(|| PulseCliError::InvalidNow(s.to_string())),
        None => Ok(Utc::now()),
    }
}

fn read_input(path: &Path) -> Result<String, PulseCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &Path, data: &str) -> Result<(), PulseCliError> {
    if path.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(path, data)?;
    }
    Ok(())
}

fn format_series(series: &MetricSeries, format: &OutputFormat) -> Result<String, PulseCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for point in &series.points {
                lines.push(serde_json::to_string(point)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(series)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(series)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Series(SeriesError),
    Json(serde_json::Error),
    InvalidNow(String),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<SeriesError> for PulseCliError {
    fn from(e: SeriesError) -> Self {
        PulseCliError::Series(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Series(e) => {
                let (code, hint) = match &e {
                    SeriesError::ConfigRead { .. }
                    | SeriesError::ConfigParse { .. }
                    | SeriesError::ConfigSerialize(_)
                    | SeriesError::ConfigValidation(_) => {
                        ("CONFIG_ERROR", "Run 'pulse doctor --config <path>' for details")
                    }
                    _ => ("INPUT_ERROR", "Ensure input is a JSON array of metric records"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::InvalidNow(raw) => CliError {
                code: "INVALID_NOW".to_string(),
                message: format!("Cannot parse --now value '{}'", raw),
                hint: Some("Use RFC 3339, e.g. 2024-01-15T12:00:00Z".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
