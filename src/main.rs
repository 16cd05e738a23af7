use sweepr::cli::{AppConfig, Args};
use sweepr::config::UserConfig;
use sweepr::domain::{
    complete_confirmation, Awaiting, CatalogIndex, ConfirmationResult, DeleteTicket,
    DeletionOutcome, DeletionStatistics, FileTarget, FsDirectoryNode, PendingDeletion, Plan,
    Resolver,
};
use sweepr::worker::SyncDeletionWorker;
use sweepr::{Result, SweeprError};

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Load user configuration
    let user_config = UserConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load user config: {}", e);
        UserConfig::default()
    });

    let config = AppConfig::from_args(args, &user_config);

    match run(&config) {
        Ok(stats) if stats.failed > 0 => std::process::exit(1),
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Resolves every path, settles pending outcomes and prints a summary
fn run(config: &AppConfig) -> Result<DeletionStatistics> {
    let sandbox_root = config.sandbox_root.clone().ok_or_else(|| {
        SweeprError::ConfigError("Could not determine sandbox directory".to_string())
    })?;

    let catalog = Arc::new(match &config.catalog_path {
        Some(path) => CatalogIndex::load(path, true)?,
        None => CatalogIndex::new(true),
    });

    let resolver = Resolver::new(sandbox_root, catalog.clone())
        .with_confirmation_policy(config.confirmation)
        .with_delete_mode(config.delete_mode)
        .with_traversal_limits(config.traversal);

    // Must open before any deletion runs
    let grant = match &config.grant {
        Some(dir) => Some(FsDirectoryNode::open(dir)?),
        None => None,
    };

    // A path that cannot be a target fails on its own; the rest still run
    let parsed: Vec<(&PathBuf, Result<FileTarget>)> = config
        .paths
        .iter()
        .map(|path| (path, FileTarget::new(path.clone())))
        .collect();
    let targets: Vec<FileTarget> = parsed
        .iter()
        .filter_map(|(_, target)| target.as_ref().ok().cloned())
        .collect();

    if config.dry_run {
        println!("[DRY RUN] No files will be deleted");
        for (path, target) in &parsed {
            match target {
                Ok(target) => print_plan(&resolver, target),
                Err(e) => println!("  invalid   {}: {}", path.display(), e),
            }
        }
        return Ok(DeletionStatistics::default());
    }

    let mut outcomes = {
        let worker = SyncDeletionWorker::new(resolver.clone())?;
        worker.resolve_all(targets)
    }
    .into_iter();

    let mut stats = DeletionStatistics::default();
    for (position, (path, target)) in parsed.into_iter().enumerate() {
        let outcome = match target {
            Ok(target) => {
                let outcome = outcomes
                    .next()
                    .unwrap_or_else(|| DeletionOutcome::failed("no outcome from worker"));
                match PendingDeletion::from_outcome(target, position, &outcome) {
                    Some(pending) => {
                        settle(&resolver, &catalog, grant.as_ref(), config, pending, outcome)
                    }
                    None => outcome,
                }
            }
            Err(e) => DeletionOutcome::failed(e.to_string()),
        };
        report(path.display(), &outcome);
        stats.record(&outcome);
    }

    if let Some(path) = &config.catalog_path {
        catalog.save(path)?;
    }

    println!(
        "\n{} deleted, {} failed, {} pending ({} total)",
        stats.deleted, stats.failed, stats.pending, stats.total
    );

    Ok(stats)
}

/// Resume a parked deletion with whatever the command line supplied
fn settle(
    resolver: &Resolver,
    catalog: &CatalogIndex,
    grant: Option<&FsDirectoryNode>,
    config: &AppConfig,
    pending: PendingDeletion,
    outcome: DeletionOutcome,
) -> DeletionOutcome {
    match &pending.awaiting {
        Awaiting::Confirmation {
            ticket,
            affected_items,
        } => {
            let result = ask_authority(
                catalog,
                ticket,
                &pending.target,
                affected_items.len(),
                config.auto_approve,
            );
            complete_confirmation(&pending, result)
        }
        Awaiting::DirectoryGrant => match grant {
            Some(tree) => resolver.delete_with_grant(tree, &pending.target),
            None => outcome,
        },
    }
}

/// Stand-in for the out-of-process confirmation UI: asks on stdin, then lets
/// the catalog carry out or drop the ticket.
fn ask_authority(
    catalog: &CatalogIndex,
    ticket: &DeleteTicket,
    target: &FileTarget,
    items: usize,
    auto_approve: bool,
) -> ConfirmationResult {
    let approved = if auto_approve {
        true
    } else {
        match prompt(&format!(
            "Allow deleting {} ({} index item(s))? [y/N] ",
            target, items
        )) {
            Ok(answer) => answer,
            Err(e) => return ConfirmationResult::AuthorityFailed(e.to_string()),
        }
    };

    if !approved {
        if let Err(e) = catalog.discard_ticket(ticket) {
            tracing::warn!(%ticket, error = %e, "could not discard ticket");
        }
        return ConfirmationResult::Denied;
    }

    match catalog.commit_ticket(ticket) {
        Ok(_) => ConfirmationResult::Approved,
        Err(e) => ConfirmationResult::AuthorityFailed(e.to_string()),
    }
}

fn prompt(question: &str) -> io::Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_plan(resolver: &Resolver, target: &FileTarget) {
    match resolver.plan(target) {
        Plan::Sandbox => println!("  sandbox   {}", target),
        Plan::Index(entry) => println!("  index     {} ({})", target, entry),
        Plan::DirectoryGrant => println!("  grant     {}", target),
    }
}

fn report(target: impl fmt::Display, outcome: &DeletionOutcome) {
    match outcome {
        DeletionOutcome::Deleted => println!("deleted   {}", target),
        DeletionOutcome::NeedsExternalConfirmation { ticket, .. } => {
            println!("awaiting  {} (ticket {})", target, ticket)
        }
        DeletionOutcome::NeedsDirectoryGrant => {
            println!("needs grant {} (rerun with --grant <DIR>)", target)
        }
        DeletionOutcome::Failed { reason } => eprintln!("failed    {}: {}", target, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweepr::domain::{ConfirmationPolicy, DeleteMode, TraversalLimits};
    use std::fs;
    use tempfile::TempDir;

    fn config(sandbox: &std::path::Path, paths: Vec<PathBuf>) -> AppConfig {
        AppConfig {
            paths,
            sandbox_root: Some(sandbox.to_path_buf()),
            catalog_path: None,
            grant: None,
            confirmation: ConfirmationPolicy::Required,
            delete_mode: DeleteMode::Remove,
            traversal: TraversalLimits::default(),
            auto_approve: true,
            dry_run: false,
        }
    }

    #[test]
    fn test_invalid_path_fails_alone() {
        let temp_dir = TempDir::new().unwrap();
        let doc = temp_dir.path().join("doc.txt");
        fs::write(&doc, b"content").unwrap();

        let stats = run(&config(temp_dir.path(), vec![doc.clone(), PathBuf::from("/")])).unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.failed, 1);
        assert!(!doc.exists());
    }

    #[test]
    fn test_unopenable_grant_deletes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let doc = temp_dir.path().join("doc.txt");
        fs::write(&doc, b"content").unwrap();

        let mut config = config(temp_dir.path(), vec![doc.clone()]);
        config.grant = Some(temp_dir.path().join("missing"));

        assert!(run(&config).is_err());
        assert!(doc.exists());
    }
}
