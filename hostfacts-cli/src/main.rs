mod formatter;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use formatter::{format_failure, format_json, format_text};
use hostfacts_core::{FactRunner, ProbeConfig};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hostfacts")]
#[command(version)]
#[command(about = "Read-only probe reporting sudo users, time sync, DNS and IPv6 settings", long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<String>,

    /// Seconds before an external command is abandoned
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Check mode; accepted for compatibility, the probe never changes anything
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// JSON with pretty printing
    JsonPretty,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "hostfacts=warn",
        1 => "hostfacts=info",
        _ => "hostfacts=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if cli.check {
        debug!("check mode requested; probe is read-only either way");
    }

    let config = ProbeConfig::new().with_command_timeout(Duration::from_secs(cli.timeout));
    let report = FactRunner::with_config(config).run()?;

    let output = match cli.format {
        OutputFormat::Text => format_text(&report),
        OutputFormat::Json => format_json(&report, false)?,
        OutputFormat::JsonPretty => format_json(&report, true)?,
    };

    if let Some(path) = &cli.output {
        std::fs::write(path, output).with_context(|| format!("failed to write {}", path))?;
    } else {
        print!("{}", output);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !FactRunner::is_root() {
        warn!("not running as root; sudoers and bootloader files may be unreadable");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", format_failure(&e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["hostfacts", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_timeout_defaults_and_overrides() {
        let cli = Cli::try_parse_from(["hostfacts"]).unwrap();
        assert_eq!(cli.timeout, 10);
        let cli = Cli::try_parse_from(["hostfacts", "--timeout", "3", "--check"]).unwrap();
        assert_eq!(cli.timeout, 3);
        assert!(cli.check);
    }
}
