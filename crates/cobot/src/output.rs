use std::fmt::Write as _;
use std::io::IsTerminal;

use clap::ValueEnum;
use cobot_client::JointAngles;
use cobot_frame::command_name;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReadyOutput {
    powered_on: bool,
    elapsed_ms: u64,
}

#[derive(Serialize)]
struct AnglesOutput<'a> {
    angles: &'a [f64],
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    command: &'a str,
    id: u8,
    payload_size: usize,
    payload: String,
}

pub fn print_ready(elapsed_ms: u64, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ReadyOutput {
            powered_on: true,
            elapsed_ms,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["POWERED ON", "ELAPSED"]);
            table.add_row(vec!["yes".to_string(), format!("{elapsed_ms} ms")]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("powered_on=true elapsed={elapsed_ms}ms"),
    }
}

pub fn print_angles(angles: &JointAngles, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&AnglesOutput {
            angles: angles.as_array(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["J1", "J2", "J3", "J4", "J5", "J6"]);
            table.add_row(
                angles
                    .as_array()
                    .iter()
                    .map(|angle| format!("{angle:.2}"))
                    .collect::<Vec<_>>(),
            );
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = angles
                .as_array()
                .iter()
                .enumerate()
                .map(|(index, angle)| format!("j{}={angle:.2}", index + 1))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

pub fn print_reply(command: u8, payload: &[u8], format: OutputFormat) {
    let name = command_name(command);
    match format {
        OutputFormat::Json => print_json(&ReplyOutput {
            command: name,
            id: command,
            payload_size: payload.len(),
            payload: hex(payload),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["COMMAND", "ID", "SIZE", "PAYLOAD"]);
            table.add_row(vec![
                name.to_string(),
                format!("0x{command:02X}"),
                payload.len().to_string(),
                hex(payload),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "command={name} (0x{command:02X}) size={} payload={}",
            payload.len(),
            hex(payload)
        ),
    }
}

/// Space-separated uppercase hex, the way the controller docs print frames.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_space_separated() {
        assert_eq!(hex(&[0x03, 0xE8, 0xFD, 0xF3]), "03 E8 FD F3");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn angles_serialize_as_array() {
        let angles = JointAngles::new([10.0, -5.25, 0.0, 0.0, 0.0, 0.0]);
        let json = serde_json::to_string(&AnglesOutput {
            angles: angles.as_array(),
        })
        .unwrap();
        assert_eq!(json, r#"{"angles":[10.0,-5.25,0.0,0.0,0.0,0.0]}"#);
    }
}
