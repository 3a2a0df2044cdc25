use tasksync_core::{SyncDirection, SyncState};

use crate::commands::common::CommandContext;
use crate::error::CliError;

/// Clears one recorded sync time, returning whether anything was recorded
pub fn reset_sync(
    context: &CommandContext,
    source: &str,
    target: &str,
    direction: SyncDirection,
) -> Result<bool, CliError> {
    let key = SyncState::make_context_key(source, target, direction);
    let mut state = context.state();
    Ok(state.clear_last_sync(&key)?)
}

pub fn run_reset(
    context: &CommandContext,
    source: &str,
    target: &str,
    direction: SyncDirection,
) -> Result<(), CliError> {
    let key = SyncState::make_context_key(source, target, direction);
    if reset_sync(context, source, target, direction)? {
        println!("Cleared {key}");
    } else {
        println!("No sync recorded for {key}");
    }
    Ok(())
}
