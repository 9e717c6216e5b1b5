//! voice-bench entry point.
//!
//! One command: run a batch inference pass described by a config file.
//! Optional flags override logging and sampling settings without editing
//! the file. Exit is zero only after results are fully written.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;
use voice_bench::config::{ConfigOverrides, RunConfig};
use voice_bench::logging::{init_logging, LogConfig, LogFormat};
use voice_bench::pipeline::{self, RunError};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        None => {
            print_usage();
            ExitCode::from(EXIT_CONFIG)
        }
        Some("help" | "--help" | "-h") => {
            print_usage();
            ExitCode::SUCCESS
        }
        Some("version" | "--version" | "-V") => {
            println!("voice-bench {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(_) => run_cli(&args),
    }
}

struct CliArgs {
    config_path: PathBuf,
    log: LogConfig,
    overrides: ConfigOverrides,
    model_path: Option<PathBuf>,
}

fn run_cli(args: &[String]) -> ExitCode {
    let cli = match parse_args(args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Run 'voice-bench help' for usage.");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = init_logging(&cli.log) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(EXIT_CONFIG);
    }

    let config = match RunConfig::load(&cli.config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load config: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let config = if cli.overrides.is_empty() {
        config
    } else {
        match config.with_overrides(&cli.overrides) {
            Ok(config) => config,
            Err(e) => {
                error!("invalid override: {e}");
                return ExitCode::from(EXIT_CONFIG);
            }
        }
    };

    match pipeline::run(&config, cli.model_path) {
        Ok(_path) => ExitCode::SUCCESS,
        Err(e @ (RunError::Config(_) | RunError::Prompts(_))) => {
            error!("{e}");
            ExitCode::from(EXIT_CONFIG)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut config_path: Option<PathBuf> = None;
    let mut log = LogConfig::default();
    let mut overrides = ConfigOverrides::default();
    let mut model_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--log-level" => {
                log.level = value_for(args, i, "--log-level")?.to_string();
                i += 2;
            }
            "--log-file" => {
                log.output_path = Some(PathBuf::from(value_for(args, i, "--log-file")?));
                i += 2;
            }
            "--log-json" => {
                log.format = LogFormat::Json;
                i += 1;
            }
            "--temperature" => {
                overrides.temperature = Some(parse_value(args, i, "--temperature")?);
                i += 2;
            }
            "--max-new-tokens" => {
                overrides.max_new_tokens = Some(parse_value(args, i, "--max-new-tokens")?);
                i += 2;
            }
            "-n" | "--samples" => {
                let flag = args[i].clone();
                overrides.n = Some(parse_value(args, i, &flag)?);
                i += 2;
            }
            "--gpus" => {
                overrides.gpus = Some(parse_value(args, i, "--gpus")?);
                i += 2;
            }
            "--model-path" => {
                model_path = Some(PathBuf::from(value_for(args, i, "--model-path")?));
                i += 2;
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {other}"));
            }
            other => {
                if config_path.is_some() {
                    return Err(format!("Unexpected argument: {other}"));
                }
                config_path = Some(PathBuf::from(other));
                i += 1;
            }
        }
    }

    let config_path = config_path.ok_or_else(|| "Missing config file path".to_string())?;
    Ok(CliArgs {
        config_path,
        log,
        overrides,
        model_path,
    })
}

fn value_for<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(|s| s.as_str())
        .ok_or_else(|| format!("Missing value for {flag}"))
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let raw = value_for(args, i, flag)?;
    raw.parse()
        .map_err(|_| format!("Invalid value for {flag}: {raw}"))
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "voice-bench - Offline batch inference harness v{version}

USAGE:
    voice-bench <CONFIG> [OPTIONS]

ARGS:
    <CONFIG>  Path to a TOML run configuration file

OPTIONS:
    --log-level LEVEL    Log level filter (default: info)
    --log-file PATH      Write logs to a file instead of stderr
    --log-json           JSON structured log output
    --temperature T      Override sampling temperature
    --max-new-tokens N   Override max generated tokens per sample
    -n, --samples N      Override samples per prompt
    --gpus N             Override device count
    --model-path PATH    Local GGUF weights path (defaults to model_name)
    -h, --help           Show this help message
    -V, --version        Show version information

EXAMPLES:
    voice-bench run.toml
    voice-bench run.toml --temperature 0.7 -n 2
    voice-bench run.toml --log-level debug --log-file run.log

EXIT CODES:
    0  Results fully written
    1  Generation or write failure
    2  Configuration, input, or usage error
"
    );
}
