use cobot_client::{Command as ControllerCommand, JointAngles, JOINT_COUNT};

use crate::cmd::{connect, disconnect, within, AnglesArgs, AnglesCommand, AnglesSetArgs, Target};
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_angles, OutputFormat};

pub async fn run(args: AnglesArgs, target: &Target, format: OutputFormat) -> CliResult<i32> {
    match args.command {
        AnglesCommand::Get => get(target, format).await,
        AnglesCommand::Set(set) => set_angles(set, target, format).await,
    }
}

async fn get(target: &Target, format: OutputFormat) -> CliResult<i32> {
    let timeout = target.timeout()?;
    let client = connect(target).await?;

    let angles = within(timeout, ControllerCommand::GetAngles, client.get_angles())
        .await
        .map_err(|err| client_error("get angles failed", err))?;

    print_angles(&angles, format);
    disconnect(client).await;
    Ok(SUCCESS)
}

async fn set_angles(args: AnglesSetArgs, target: &Target, format: OutputFormat) -> CliResult<i32> {
    let angles = parse_angles(&args.angles)?;
    // Reject out-of-range input before touching the connection.
    angles
        .encode()
        .map_err(|err| client_error("invalid angles", err))?;

    let timeout = target.timeout()?;
    let client = connect(target).await?;
    within(
        timeout,
        ControllerCommand::SendAngles,
        client.send_angles(&angles, args.speed),
    )
    .await
    .map_err(|err| client_error("send angles failed", err))?;

    print_angles(&angles, format);
    disconnect(client).await;
    Ok(SUCCESS)
}

fn parse_angles(values: &[f64]) -> CliResult<JointAngles> {
    let array: [f64; JOINT_COUNT] = values.try_into().map_err(|_| {
        CliError::new(
            USAGE,
            format!("expected {JOINT_COUNT} angles, got {}", values.len()),
        )
    })?;
    Ok(JointAngles::new(array))
}
