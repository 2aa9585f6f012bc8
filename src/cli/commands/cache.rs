//! Cache command - manage the persistent wheel cache

use crate::cache::{CacheEntry, CacheKey, FsWheelStore, WheelStore};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::commands::{manifest_paths, resolve_project_dir, wheel_store_root};
use crate::config::Config;
use crate::error::WheelwrightResult;
use console::style;
use std::path::PathBuf;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> WheelwrightResult<()> {
    let store = FsWheelStore::new(wheel_store_root(config));

    match args.action {
        CacheAction::List { format } => list_entries(&store, format).await,
        CacheAction::Info { project } => show_project_info(&store, project, config).await,
        CacheAction::Gc { days, dry_run } => gc_entries(&store, config, days, dry_run).await,
        CacheAction::Clear { yes } => clear_entries(&store, yes).await,
    }
}

async fn list_entries(store: &FsWheelStore, format: OutputFormat) -> WheelwrightResult<()> {
    let entries = store.list().await?;

    if entries.is_empty() {
        println!("No cache entries found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_entry_table(&entries),
        OutputFormat::Json => print_entry_json(&entries)?,
        OutputFormat::Plain => print_entry_plain(&entries),
    }

    Ok(())
}

fn print_entry_table(entries: &[CacheEntry]) {
    println!(
        "{:<42} {:>7} {:>10} {:<20}",
        "KEY", "WHEELS", "SIZE", "CREATED"
    );
    println!("{}", "-".repeat(82));

    for entry in entries {
        println!(
            "{:<42} {:>7} {:>10} {:<20}",
            entry.key.to_string(),
            entry.wheel_count,
            format_bytes(entry.size_bytes),
            entry.created_at.format("%Y-%m-%d %H:%M").to_string()
        );
    }

    println!();
    println!("Total: {} entr(ies)", entries.len());
}

fn print_entry_json(entries: &[CacheEntry]) -> WheelwrightResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson {
        key: String,
        path: String,
        wheel_count: usize,
        size_bytes: u64,
        created_at: String,
    }

    let json_entries: Vec<EntryJson> = entries
        .iter()
        .map(|e| EntryJson {
            key: e.key.to_string(),
            path: e.path.display().to_string(),
            wheel_count: e.wheel_count,
            size_bytes: e.size_bytes,
            created_at: e.created_at.to_rfc3339(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_entries)?);
    Ok(())
}

fn print_entry_plain(entries: &[CacheEntry]) {
    for entry in entries {
        println!("{}", entry.key);
    }
}

/// Show the key and hit/miss state for a project's manifests
async fn show_project_info(
    store: &FsWheelStore,
    project: Option<PathBuf>,
    config: &Config,
) -> WheelwrightResult<()> {
    let project_dir = resolve_project_dir(project.as_deref(), config)?;
    println!("Project: {}", project_dir.display());

    let manifests = manifest_paths(&project_dir, config);
    let key = CacheKey::compute(&config.cache.namespace, &manifests)?;

    println!("Manifests:");
    for manifest in &manifests {
        println!("  {} {}", style("•").cyan(), manifest.display());
    }
    println!("Cache key: {}", key);

    match store.get(&key).await? {
        Some(entry) => println!(
            "Status: {} ({} wheels, {})",
            style("hit").green(),
            entry.wheel_count,
            format_bytes(entry.size_bytes)
        ),
        None => {
            println!("Status: {} (build will run)", style("miss").yellow());
            if let Some(near) = store.get_by_prefix(&key.restore_prefix()).await? {
                println!(
                    "Near match: {} from {} (advisory, may be stale)",
                    near.key,
                    near.created_at.format("%Y-%m-%d")
                );
            }
        }
    }

    Ok(())
}

async fn gc_entries(
    store: &FsWheelStore,
    config: &Config,
    days: Option<u32>,
    dry_run: bool,
) -> WheelwrightResult<()> {
    let days = days.unwrap_or(config.cache.gc_days);
    if days == 0 {
        println!("Cache gc disabled (0 days).");
        return Ok(());
    }

    let mut removed = 0;
    for entry in store.list().await? {
        if !entry.is_older_than_days(days) {
            continue;
        }
        if dry_run {
            println!("Would remove {}", entry.key);
        } else {
            store.remove(&entry.key).await?;
            println!("Removed {}", entry.key);
        }
        removed += 1;
    }

    if removed == 0 {
        println!("No entries older than {} day(s).", days);
    } else if dry_run {
        println!("{} entr(ies) would be removed.", removed);
    } else {
        println!("{} entr(ies) removed.", removed);
    }

    Ok(())
}

async fn clear_entries(store: &FsWheelStore, yes: bool) -> WheelwrightResult<()> {
    let entries = store.list().await?;
    if entries.is_empty() {
        println!("No cache entries found.");
        return Ok(());
    }

    if !yes {
        println!(
            "This would remove {} cache entr(ies). Pass --yes to confirm.",
            entries.len()
        );
        return Ok(());
    }

    for entry in &entries {
        store.remove(&entry.key).await?;
    }
    println!("{} Removed {} cache entr(ies)", style("✓").green(), entries.len());

    Ok(())
}

/// Format bytes as human-readable size (e.g., "1.5 GB")
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_scales() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
