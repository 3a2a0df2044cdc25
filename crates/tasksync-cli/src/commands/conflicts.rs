use tasksync_core::models::SyncConflict;

use crate::commands::common::{format_conflict_lines, CommandContext};
use crate::error::CliError;

/// Logged conflicts, newest first
pub fn list_conflicts(
    context: &CommandContext,
    limit: usize,
) -> Result<Vec<SyncConflict>, CliError> {
    let mut conflicts = context.tracker().read_log()?;
    conflicts.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
    conflicts.truncate(limit);
    Ok(conflicts)
}

pub fn run_conflicts(
    context: &CommandContext,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let conflicts = list_conflicts(context, limit)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&conflicts)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}
