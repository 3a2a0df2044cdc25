use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use tasksync_core::models::{ResourceType, TaskCreate, TaskUpdate};
use tasksync_core::sync::{EntityCounts, ItemError};
use tasksync_core::{LocalStore, Repository, SyncDirection, SyncResult};
use tempfile::tempdir;

use crate::cli::{Cli, CompletionShell, Commands, StrategyArg, SyncArgs};
use crate::commands::common::{
    format_conflict_lines, format_result_lines, format_sync_time_lines, resolve_store,
    CommandContext, ResolvedStore,
};
use crate::commands::completions::render_completions;
use crate::commands::conflicts::list_conflicts;
use crate::commands::reset::reset_sync;
use crate::commands::sync::{execute_sync, sync_pair};
use crate::config_profiles::{default_db_path, CliContextsConfig, StorageContext};
use crate::error::CliError;

fn local_context(path: &Path) -> StorageContext {
    StorageContext::Local {
        db_path: Some(path.to_path_buf()),
    }
}

/// Two file-backed contexts: `origin` plays the remote, `replica` the local
fn two_local_contexts(dir: &Path) -> CommandContext {
    let mut config = CliContextsConfig::default();
    config
        .contexts
        .insert("origin".to_string(), local_context(&dir.join("origin.db")));
    config
        .contexts
        .insert("replica".to_string(), local_context(&dir.join("replica.db")));

    CommandContext {
        config,
        state_dir: dir.join("state"),
        local_name: "replica".to_string(),
        remote_name: "origin".to_string(),
    }
}

#[test]
fn parses_sync_flags() {
    let cli = Cli::try_parse_from([
        "tasksync",
        "push",
        "--dry-run",
        "--full",
        "--strategy",
        "remote-wins",
        "--local",
        "laptop",
    ])
    .unwrap();

    assert_eq!(cli.local.as_deref(), Some("laptop"));
    match cli.command {
        Commands::Push(args) => {
            assert!(args.dry_run);
            assert!(args.full);
            assert!(!args.json);
            assert_eq!(args.strategy, Some(StrategyArg::RemoteWins));
        }
        _ => panic!("expected push"),
    }
}

#[test]
fn rejects_unknown_strategy() {
    assert!(Cli::try_parse_from(["tasksync", "pull", "--strategy", "newest"]).is_err());
}

#[test]
fn parses_reset_and_conflicts() {
    let cli = Cli::try_parse_from(["tasksync", "reset", "remote", "local", "pull"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Reset { ref source, ref target, .. } if source == "remote" && target == "local"
    ));

    let cli = Cli::try_parse_from(["tasksync", "conflicts", "-l", "3", "--json"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Conflicts {
            limit: 3,
            json: true
        }
    ));
}

#[test]
fn completions_name_the_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("tasksync"));
}

#[test]
fn resolve_store_fills_defaults_and_token() {
    let mut config = CliContextsConfig::default();
    config.contexts.insert(
        "remote".to_string(),
        StorageContext::Remote {
            base_url: Some("https://tasks.example.com".to_string()),
            token: None,
        },
    );
    config.contexts.insert(
        "broken".to_string(),
        StorageContext::Remote {
            base_url: None,
            token: Some("t".to_string()),
        },
    );

    assert_eq!(
        resolve_store(&config, "remote", Some(" env-token ")).unwrap(),
        ResolvedStore::Remote {
            base_url: "https://tasks.example.com".to_string(),
            token: Some("env-token".to_string()),
        }
    );
    assert_eq!(
        resolve_store(&config, "local", None).unwrap(),
        ResolvedStore::Local(default_db_path())
    );
    assert!(matches!(
        resolve_store(&config, "broken", None),
        Err(CliError::MissingBaseUrl(name)) if name == "broken"
    ));
    assert!(matches!(
        resolve_store(&config, "elsewhere", None),
        Err(CliError::UnknownContext(_))
    ));
}

#[test]
fn sync_pair_follows_direction() {
    let dir = tempdir().unwrap();
    let context = two_local_contexts(dir.path());

    assert_eq!(
        sync_pair(&context, SyncDirection::Pull),
        ("origin".to_string(), "replica".to_string())
    );
    assert_eq!(
        sync_pair(&context, SyncDirection::Push),
        ("replica".to_string(), "origin".to_string())
    );
}

#[test]
fn format_result_lines_renders_counts_and_errors() {
    let result = SyncResult {
        direction: SyncDirection::Pull,
        dry_run: true,
        projects: EntityCounts {
            fetched: 2,
            new: 1,
            unchanged: 1,
            ..EntityCounts::default()
        },
        labels: EntityCounts::default(),
        tasks: EntityCounts {
            fetched: 3,
            updated: 1,
            conflicts: 1,
            ..EntityCounts::default()
        },
        item_errors: vec![ItemError {
            resource_type: ResourceType::Task,
            resource_id: "abc".to_string(),
            message: "boom".to_string(),
        }],
        success: true,
        error: None,
        duration: 0.5,
    };

    let lines = format_result_lines("remote", "local", &result);
    assert_eq!(lines[0], "pull remote -> local (dry run)");
    assert!(lines[2].starts_with("projects"));
    assert!(lines.contains(&"Conflicts: 1".to_string()));
    assert!(lines.contains(&"Item errors: 1".to_string()));
    assert!(lines.contains(&"  task abc: boom".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("Completed in 0.50s"));

    let failed = SyncResult {
        success: false,
        error: Some("Http: connection refused".to_string()),
        item_errors: Vec::new(),
        ..result
    };
    let lines = format_result_lines("remote", "local", &failed);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Failed after 0.50s: Http: connection refused")
    );
}

#[test]
fn format_sync_time_lines_aligns_keys() {
    let mut times = BTreeMap::new();
    times.insert(
        "a:b:pull".to_string(),
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
    );
    times.insert("remote:local:push".to_string(), None);

    assert_eq!(
        format_sync_time_lines(&times),
        vec![
            "a:b:pull           2024-01-02T03:04:05Z".to_string(),
            "remote:local:push  never".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_between_file_contexts_records_state_and_conflicts() {
    let dir = tempdir().unwrap();
    let context = two_local_contexts(dir.path());

    let task = {
        let origin = LocalStore::open(dir.path().join("origin.db")).await.unwrap();
        origin
            .tasks()
            .create(TaskCreate::new("from origin"))
            .await
            .unwrap()
    };

    let first = execute_sync(&context, SyncDirection::Pull, SyncArgs::default())
        .await
        .unwrap();
    assert!(first.success, "{:?}", first.error);
    assert_eq!(first.tasks.new, 1);

    let again = execute_sync(&context, SyncDirection::Pull, SyncArgs::default())
        .await
        .unwrap();
    assert_eq!(again.total_changes(), 0);

    {
        let replica = LocalStore::open(dir.path().join("replica.db"))
            .await
            .unwrap();
        replica
            .tasks()
            .update(
                task.id,
                TaskUpdate {
                    content: Some("edited locally".to_string()),
                    updated_at: Some(task.updated_at + Duration::hours(1)),
                    ..TaskUpdate::default()
                },
            )
            .await
            .unwrap();
    }

    let conflicted = execute_sync(&context, SyncDirection::Pull, SyncArgs::default())
        .await
        .unwrap();
    assert_eq!(conflicted.tasks.conflicts, 1);

    let conflicts = list_conflicts(&context, 10).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].resource_id, task.id.to_string());
    assert!(format_conflict_lines(&conflicts)[0].ends_with("skipped_local_newer"));

    assert_eq!(context.state().get_all_sync_times().len(), 1);
    assert!(reset_sync(&context, "origin", "replica", SyncDirection::Pull).unwrap());
    assert!(!reset_sync(&context, "origin", "replica", SyncDirection::Pull).unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn same_context_on_both_sides_is_rejected() {
    let dir = tempdir().unwrap();
    let context = CommandContext {
        remote_name: "replica".to_string(),
        ..two_local_contexts(dir.path())
    };

    let error = execute_sync(&context, SyncDirection::Push, SyncArgs::default())
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::SameContext(name) if name == "replica"));
}
