use tasksync_core::{
    SyncDirection, SyncPullService, SyncPushService, SyncRequest, SyncResult, SyncService,
};

use crate::cli::SyncArgs;
use crate::commands::common::{format_result_lines, CommandContext};
use crate::error::CliError;

/// Source and target context names for a run in `direction`
pub fn sync_pair(context: &CommandContext, direction: SyncDirection) -> (String, String) {
    match direction {
        SyncDirection::Pull => (context.remote_name.clone(), context.local_name.clone()),
        SyncDirection::Push => (context.local_name.clone(), context.remote_name.clone()),
    }
}

pub async fn execute_sync(
    context: &CommandContext,
    direction: SyncDirection,
    args: SyncArgs,
) -> Result<SyncResult, CliError> {
    let (source, target) = sync_pair(context, direction);
    if source == target {
        return Err(CliError::SameContext(source));
    }

    let service = SyncService::new(
        context.open(&source).await?,
        context.open(&target).await?,
        context.state(),
        context.tracker(),
        CommandContext::clock(),
    );

    let mut request = SyncRequest::new(source, target)
        .dry_run(args.dry_run)
        .full_sync(args.full);
    if let Some(strategy) = args.strategy {
        request = request.strategy(strategy.into());
    }

    let result = match direction {
        SyncDirection::Pull => SyncPullService::new(service).pull(&request).await,
        SyncDirection::Push => SyncPushService::new(service).push(&request).await,
    };
    Ok(result)
}

pub async fn run_sync(
    context: &CommandContext,
    direction: SyncDirection,
    args: SyncArgs,
) -> Result<(), CliError> {
    let result = execute_sync(context, direction, args).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let (source, target) = sync_pair(context, direction);
        for line in format_result_lines(&source, &target, &result) {
            println!("{line}");
        }
    }

    if result.success {
        Ok(())
    } else {
        Err(CliError::SyncFailed(direction.as_str()))
    }
}
