use std::env;
use std::time::Duration;

use tracsat_core::error::{CoreError, Domain, ErrorKind, Result};

pub const DEFAULT_RUN_MS: u64 = 1000;
pub const DEFAULT_READY_TARGET: &str = "net.ready";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long the subsystems run before shutdown.
    pub run_for: Duration,
    /// Deadline for the demo halt; `None` waits indefinitely.
    pub halt_timeout: Option<Duration>,
    pub ready_target: String,
    pub halt_demo: bool,
    pub log_filter: String,
}

impl Config {
    pub fn from_args() -> Result<Self> {
        Self::from_args_iter(env::args())
    }

    /// Environment first (`TRACSAT_*`), then command-line flags on top.
    /// The first item is the program name and is skipped.
    pub fn from_args_iter<I, S>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut run_ms = match env::var("TRACSAT_RUN_MS") {
            Ok(value) => parse_ms("TRACSAT_RUN_MS", &value)?,
            Err(_) => DEFAULT_RUN_MS,
        };
        let mut halt_timeout_ms = match env::var("TRACSAT_HALT_TIMEOUT_MS") {
            Ok(value) => Some(parse_ms("TRACSAT_HALT_TIMEOUT_MS", &value)?),
            Err(_) => None,
        };
        let mut ready_target =
            env::var("TRACSAT_READY_TARGET").unwrap_or_else(|_| DEFAULT_READY_TARGET.to_string());
        let mut halt_demo = env::var("TRACSAT_HALT_DEMO")
            .ok()
            .and_then(parse_bool)
            .unwrap_or(true);
        let mut log_filter =
            env::var("TRACSAT_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        let mut args = iter.into_iter();
        let _ = args.next();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            match arg {
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                "--run-ms" => {
                    run_ms = parse_ms(arg, &value_for(arg, &mut args)?)?;
                }
                "--halt-timeout-ms" => {
                    halt_timeout_ms = Some(parse_ms(arg, &value_for(arg, &mut args)?)?);
                }
                "--ready-target" => {
                    ready_target = value_for(arg, &mut args)?;
                }
                "--log-filter" => {
                    log_filter = value_for(arg, &mut args)?;
                }
                "--no-halt-demo" => {
                    halt_demo = false;
                }
                _ if arg.starts_with("--run-ms=") => {
                    run_ms = parse_ms("--run-ms", &arg["--run-ms=".len()..])?;
                }
                _ if arg.starts_with("--halt-timeout-ms=") => {
                    halt_timeout_ms = Some(parse_ms(
                        "--halt-timeout-ms",
                        &arg["--halt-timeout-ms=".len()..],
                    )?);
                }
                _ if arg.starts_with("--ready-target=") => {
                    ready_target = arg["--ready-target=".len()..].to_string();
                }
                _ if arg.starts_with("--log-filter=") => {
                    log_filter = arg["--log-filter=".len()..].to_string();
                }
                _ => {}
            }
        }

        if ready_target.is_empty() {
            return Err(invalid("--ready-target", "must not be empty"));
        }

        Ok(Self {
            run_for: Duration::from_millis(run_ms),
            halt_timeout: halt_timeout_ms.map(Duration::from_millis),
            ready_target,
            halt_demo,
            log_filter,
        })
    }
}

fn print_usage() {
    println!(
        "tracsat_controller [--run-ms <ms>] [--halt-timeout-ms <ms>] [--ready-target <name>] [--log-filter <filter>] [--no-halt-demo]"
    );
}

/// Value of a `--flag value` pair; a trailing flag is an error.
fn value_for<I, S>(key: &str, args: &mut I) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    args.next()
        .map(|value| value.as_ref().to_string())
        .ok_or_else(|| invalid(key, "missing value"))
}

fn parse_ms(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, &format!("expected milliseconds, got {value:?}")))
}

fn parse_bool(value: String) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, why: &str) -> CoreError {
    CoreError::error()
        .domain(Domain::Config)
        .kind(ErrorKind::InvalidArgument)
        .msgf(format_args!("{key}: {why}"))
        .build()
}
