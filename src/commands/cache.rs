//! Cache command implementation

use crate::cli::{CacheArgs, CacheSubcommand};
use crate::commands::helpers::Globals;
use crate::download::DownloadManager;
use crate::error::Result;

/// Run the cache command
pub fn run(globals: &Globals, args: &CacheArgs) -> Result<()> {
    let manager = globals.download_manager(false)?;

    if let Some(command) = &args.command {
        match command {
            CacheSubcommand::List => {
                list_cached_artifacts(&manager)?;
                return Ok(());
            }
            CacheSubcommand::Clear(clear_args) => {
                if let Some(digest) = &clear_args.only {
                    manager.remove(digest)?;
                    println!("Removed cached artifact: {digest}");
                } else {
                    manager.clear()?;
                    println!("Cache cleared successfully.");
                }
                return Ok(());
            }
        }
    }

    // Default: show only cache statistics
    show_cache_stats(&manager)
}

fn show_cache_stats(manager: &DownloadManager) -> Result<()> {
    let stats = manager.stats()?;

    println!("Cache Statistics:");
    println!("  Location: {}", manager.cache_dir().display());
    println!("  Artifacts: {}", stats.entries);
    println!("  Size: {}", stats.formatted_size());

    if stats.entries == 0 {
        println!("\nCache is empty.");
    } else {
        println!("\nRun 'appdeck cache list' to list cached artifacts.");
        println!("Run 'appdeck cache clear' to remove everything from the cache.");
        println!("Run 'appdeck cache clear --only <sha256>' to remove a specific artifact.");
    }

    Ok(())
}

fn list_cached_artifacts(manager: &DownloadManager) -> Result<()> {
    let stats = manager.stats()?;

    println!("Cache Statistics:");
    println!("  Location: {}", manager.cache_dir().display());
    println!("  Artifacts: {}", stats.entries);
    println!("  Size: {}", stats.formatted_size());
    println!();

    let entries = manager.entries()?;

    if entries.is_empty() {
        println!("No cached artifacts.");
        return Ok(());
    }

    println!("Cached artifacts ({}):", entries.len());
    for entry in &entries {
        println!("  {} ({})", entry.hash, entry.formatted_size());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn globals(cache_dir: &std::path::Path) -> Globals {
        Globals {
            catalog: PathBuf::from("catalog.json"),
            cache_dir: Some(cache_dir.to_path_buf()),
            state_file: None,
        }
    }

    #[test]
    fn test_stats_on_empty_cache() {
        let temp = TempDir::new().unwrap();
        let args = CacheArgs { command: None };
        assert!(run(&globals(temp.path()), &args).is_ok());
    }

    #[test]
    fn test_list_and_clear() {
        let temp = TempDir::new().unwrap();
        let digest = hash::sha256_bytes(b"artifact");
        std::fs::write(temp.path().join(&digest), b"artifact").unwrap();

        let list_args = CacheArgs {
            command: Some(CacheSubcommand::List),
        };
        assert!(run(&globals(temp.path()), &list_args).is_ok());

        let clear_args = CacheArgs {
            command: Some(CacheSubcommand::Clear(crate::cli::CacheClearArgs {
                only: None,
            })),
        };
        assert!(run(&globals(temp.path()), &clear_args).is_ok());
        assert!(!temp.path().join(&digest).exists());
    }

    #[test]
    fn test_clear_only_missing_artifact_fails() {
        let temp = TempDir::new().unwrap();
        let clear_args = CacheArgs {
            command: Some(CacheSubcommand::Clear(crate::cli::CacheClearArgs {
                only: Some("0".repeat(64)),
            })),
        };
        let result = run(&globals(temp.path()), &clear_args);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("not found in cache")
        );
    }
}
