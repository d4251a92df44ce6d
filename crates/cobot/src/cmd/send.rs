use cobot_client::Command as ControllerCommand;

use crate::cmd::{connect, disconnect, within, SendArgs, Target};
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_reply, OutputFormat};

pub async fn run(args: SendArgs, target: &Target, format: OutputFormat) -> CliResult<i32> {
    let command = parse_command(&args.command)?;
    let payload = match &args.data {
        Some(data) => parse_hex(data)?,
        None => Vec::new(),
    };

    let timeout = target.timeout()?;
    let client = connect(target).await?;

    if args.wait {
        let reply = client
            .send_and_wait_timeout(command, &payload, timeout)
            .await
            .map_err(|err| client_error("request failed", err))?;
        print_reply(command.id(), &reply, format);
    } else {
        within(timeout, command, client.send(command, &payload))
            .await
            .map_err(|err| client_error("send failed", err))?;
    }

    disconnect(client).await;
    Ok(SUCCESS)
}

/// Accept a command name (`get-angles`) or identifier (`0x20`, `32`).
fn parse_command(input: &str) -> CliResult<ControllerCommand> {
    let input = input.trim();
    if let Some(command) = ControllerCommand::from_name(&input.to_ascii_lowercase()) {
        return Ok(command);
    }

    let id = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse::<u8>(),
    }
    .map_err(|_| CliError::new(USAGE, format!("unknown command: {input}")))?;

    ControllerCommand::from_id(id).ok_or_else(|| {
        let known = ControllerCommand::ALL
            .iter()
            .map(|command| command.name())
            .collect::<Vec<_>>()
            .join(", ");
        CliError::new(
            USAGE,
            format!("unknown command identifier 0x{id:02X} (known: {known})"),
        )
    })
}

/// Parse hex bytes, ignoring whitespace, `:` and `,` separators.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace() && *byte != b':' && *byte != b',')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            "--data must contain an even number of hex digits",
        ));
    }

    digits
        .chunks_exact(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(high), Some(low)) => Ok(high << 4 | low),
            _ => Err(CliError::new(
                USAGE,
                format!("--data is not valid hex: {input}"),
            )),
        })
        .collect()
}

fn hex_value(digit: u8) -> Option<u8> {
    char::from(digit).to_digit(16).map(|value| value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_by_name_and_id() {
        assert_eq!(
            parse_command("get-angles").unwrap(),
            ControllerCommand::GetAngles
        );
        assert_eq!(
            parse_command("IS-POWER-ON").unwrap(),
            ControllerCommand::IsPowerOn
        );
        assert_eq!(parse_command("0x2B").unwrap(), ControllerCommand::IsMoving);
        assert_eq!(parse_command("32").unwrap(), ControllerCommand::GetAngles);
    }

    #[test]
    fn parse_command_rejects_unknown() {
        assert_eq!(parse_command("0x99").unwrap_err().code, USAGE);
        assert_eq!(parse_command("jump").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_hex_accepts_separators() {
        assert_eq!(parse_hex("03E8").unwrap(), vec![0x03, 0xE8]);
        assert_eq!(parse_hex("03 e8:fd,f3").unwrap(), vec![0x03, 0xE8, 0xFD, 0xF3]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert!(parse_hex("3E8").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("+1").is_err());
    }
}
