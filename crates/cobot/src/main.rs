mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use cobot_transport::DEFAULT_BAUD_RATE;

use crate::cmd::{Command, Target};
use crate::exit::{CliError, INTERNAL, INTERRUPTED};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cobot", version, about = "myCobot controller CLI")]
struct Cli {
    /// Controller TCP bridge, HOST or HOST:PORT (default port 9000).
    #[arg(long, value_name = "ADDR", global = true, env = "COBOT_TCP", conflicts_with = "serial")]
    tcp: Option<String>,

    /// Controller serial device, e.g. /dev/ttyUSB0 or COM3.
    #[arg(long, value_name = "PATH", global = true, env = "COBOT_SERIAL")]
    serial: Option<PathBuf>,

    /// Serial baud rate.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    baud: u32,

    /// Time limit for each command (e.g. 5s, 500ms).
    #[arg(long, value_name = "DUR", default_value = "5s", global = true)]
    timeout: String,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let target = Target {
        tcp: cli.tcp,
        serial: cli.serial,
        baud: cli.baud,
        timeout: cli.timeout,
    };

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))
        .and_then(|runtime| {
            runtime.block_on(async {
                tokio::select! {
                    result = cmd::run(cli.command, &target, format) => result,
                    Ok(()) = tokio::signal::ctrl_c() => {
                        Err(CliError::new(INTERRUPTED, "interrupted"))
                    }
                }
            })
        });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::AnglesCommand;

    #[test]
    fn parses_angles_set_with_negative_values() {
        let cli = Cli::try_parse_from([
            "cobot", "--tcp", "10.0.0.5", "angles", "set", "10", "-5.25", "0", "0", "0", "0",
            "--speed", "30",
        ])
        .expect("angles set args should parse");

        assert_eq!(cli.tcp.as_deref(), Some("10.0.0.5"));
        match cli.command {
            Command::Angles(args) => match args.command {
                AnglesCommand::Set(set) => {
                    assert_eq!(set.angles, vec![10.0, -5.25, 0.0, 0.0, 0.0, 0.0]);
                    assert_eq!(set.speed, 30);
                }
                other => panic!("unexpected angles command: {other:?}"),
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn angles_set_requires_six_values() {
        let result = Cli::try_parse_from(["cobot", "angles", "set", "1", "2", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_tcp_and_serial_together() {
        let err = Cli::try_parse_from([
            "cobot",
            "--tcp",
            "10.0.0.5",
            "--serial",
            "/dev/ttyUSB0",
            "ready",
        ])
        .expect_err("conflicting targets should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "cobot",
            "--serial",
            "/dev/ttyUSB0",
            "--baud",
            "1000000",
            "send",
            "get-angles",
            "--wait",
        ])
        .expect("send args should parse");

        assert_eq!(cli.baud, 1_000_000);
        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.command, "get-angles");
                assert!(args.wait);
                assert!(args.data.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cobot",
            "ready",
            "--tcp",
            "arm.local:9000",
            "--timeout",
            "3s",
        ])
        .expect("ready args should parse");
        assert!(matches!(cli.command, Command::Ready(_)));
        assert_eq!(cli.timeout, "3s");
    }
}
