use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use cobot_client::{Client, ClientError, Command as ControllerCommand, DEFAULT_SPEED};
use tracing::debug;

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod angles;
pub mod ready;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for the controller to report that it is powered on.
    Ready(ReadyArgs),
    /// Read or write joint angles.
    Angles(AnglesArgs),
    /// Send a single frame.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Where the controller is and how long to wait for it.
#[derive(Debug, Clone)]
pub struct Target {
    pub tcp: Option<String>,
    pub serial: Option<PathBuf>,
    pub baud: u32,
    pub timeout: String,
}

impl Target {
    pub fn timeout(&self) -> CliResult<Duration> {
        parse_duration(&self.timeout)
    }
}

pub async fn run(command: Command, target: &Target, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ready(args) => ready::run(args, target, format).await,
        Command::Angles(args) => angles::run(args, target, format).await,
        Command::Send(args) => send::run(args, target, format).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct ReadyArgs {}

#[derive(Args, Debug)]
pub struct AnglesArgs {
    #[command(subcommand)]
    pub command: AnglesCommand,
}

#[derive(Subcommand, Debug)]
pub enum AnglesCommand {
    /// Print the six joint angles in degrees.
    Get,
    /// Move all six joints.
    Set(AnglesSetArgs),
}

#[derive(Args, Debug)]
pub struct AnglesSetArgs {
    /// Target angles in degrees, joint 1 first.
    #[arg(
        value_name = "DEG",
        num_args = 6,
        required = true,
        allow_negative_numbers = true
    )]
    pub angles: Vec<f64>,
    /// Movement speed, 0-100.
    #[arg(
        long,
        default_value_t = DEFAULT_SPEED,
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub speed: u8,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Command name (e.g. get-angles) or identifier (e.g. 0x20).
    pub command: String,
    /// Payload as hex bytes (e.g. "03E8" or "03 E8").
    #[arg(long)]
    pub data: Option<String>,
    /// Wait for the reply and print it.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the controller connection named by `--tcp` or `--serial`.
pub async fn connect(target: &Target) -> CliResult<Client> {
    let timeout = target.timeout()?;
    match (&target.tcp, &target.serial) {
        (Some(addr), _) => {
            let client = tokio::time::timeout(timeout, cobot_client::connect(addr))
                .await
                .map_err(|_| {
                    CliError::new(
                        crate::exit::TIMEOUT,
                        format!("connect to {addr} timed out after {timeout:?}"),
                    )
                })?
                .map_err(|err| client_error("connect failed", err))?;
            Ok(client)
        }
        (None, Some(path)) => open_serial(path, target.baud),
        (None, None) => Err(CliError::new(
            USAGE,
            "no controller given: pass --tcp ADDR or --serial PATH",
        )),
    }
}

#[cfg(feature = "serial")]
fn open_serial(path: &std::path::Path, baud: u32) -> CliResult<Client> {
    cobot_client::open_serial(path, baud).map_err(|err| client_error("open failed", err))
}

#[cfg(not(feature = "serial"))]
fn open_serial(path: &std::path::Path, _baud: u32) -> CliResult<Client> {
    Err(CliError::new(
        USAGE,
        format!(
            "cannot open {}: built without serial support",
            path.display()
        ),
    ))
}

/// Await a controller operation, failing with [`ClientError::Timeout`] once
/// `timeout` passes.
pub async fn within<T>(
    timeout: Duration,
    command: ControllerCommand,
    operation: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| ClientError::Timeout { command, timeout })?
}

/// Close the connection. Failures here do not change the exit status.
pub async fn disconnect(client: Client) {
    if let Err(err) = client.shutdown().await {
        debug!(error = %err, "shutdown failed");
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
