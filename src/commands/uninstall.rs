//! Uninstall command implementation
//!
//! Checks the state store for installed applications that still depend on
//! the target before doing anything destructive; `--force` overrides that
//! check, `--yes` skips the interactive confirmation.

use console::Style;
use inquire::Confirm;

use crate::cancel::CancelToken;
use crate::cli::UninstallArgs;
use crate::commands::helpers::Globals;
use crate::error::{AppdeckError, Result};
use crate::manager::AppManager;
use crate::progress;
use crate::runner::InstallerRunner;

/// Run the uninstall command
pub fn run(globals: &Globals, args: &UninstallArgs) -> Result<()> {
    let catalog = globals.load_catalog()?;
    let state = globals.open_state()?;
    let downloads = globals.download_manager(false)?;
    let runner = InstallerRunner::new();

    let manager = AppManager::new(&catalog, &state, &downloads, &runner);

    if !args.yes {
        let dependents = manager.installed_dependents(&args.app_id)?;
        if !dependents.is_empty() {
            println!(
                "{} '{}' is still required by: {}",
                Style::new().yellow().bold().apply_to("warning:"),
                args.app_id,
                dependents.join(", ")
            );
        }

        let confirmed = Confirm::new(&format!("Uninstall '{}'?", args.app_id))
            .with_default(false)
            .with_help_message("Press 'y' to confirm, Enter to cancel")
            .prompt()?;

        if !confirmed {
            println!("Uninstall cancelled. No changes were made.");
            return Ok(());
        }
    }

    let pb = progress::spinner(&format!("Uninstalling {}...", args.app_id));
    let result = manager.uninstall(&args.app_id, args.force, &CancelToken::new());
    pb.finish_and_clear();

    match result {
        Ok(()) => {
            println!(
                "{} Uninstalled {}",
                Style::new().green().bold().apply_to("Done."),
                args.app_id
            );
        }
        // A record left by an earlier uninstall can still be purged
        Err(AppdeckError::NotInstalled { .. }) if args.purge => {}
        Err(e) => return Err(e),
    }

    if args.purge {
        if manager.purge(&args.app_id)? {
            println!("Purged state record for {}", args.app_id);
        } else {
            println!("No state record for {}", args.app_id);
        }
    }

    Ok(())
}
