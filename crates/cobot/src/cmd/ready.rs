use std::time::Instant;

use cobot_client::Command as ControllerCommand;

use crate::cmd::{connect, disconnect, within, ReadyArgs, Target};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_ready, OutputFormat};

pub async fn run(_args: ReadyArgs, target: &Target, format: OutputFormat) -> CliResult<i32> {
    let timeout = target.timeout()?;
    let client = connect(target).await?;

    let started = Instant::now();
    within(timeout, ControllerCommand::IsPowerOn, client.wait_for_ready())
        .await
        .map_err(|err| client_error("controller not ready", err))?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    print_ready(elapsed_ms, format);
    disconnect(client).await;
    Ok(SUCCESS)
}
