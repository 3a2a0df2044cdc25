use crate::commands::common::{format_sync_time_lines, CommandContext};
use crate::error::CliError;

pub fn run_status(context: &CommandContext, as_json: bool) -> Result<(), CliError> {
    let state = context.state();
    let times = state.get_all_sync_times();

    if as_json {
        println!("{}", serde_json::to_string_pretty(times)?);
        return Ok(());
    }

    println!("Local context:  {}", context.local_name);
    println!("Remote context: {}", context.remote_name);
    if times.is_empty() {
        println!("No syncs recorded.");
        return Ok(());
    }
    for line in format_sync_time_lines(times) {
        println!("{line}");
    }
    Ok(())
}
