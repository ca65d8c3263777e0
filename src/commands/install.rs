//! Install command implementation
//!
//! The installation process:
//! 1. Load the catalog and open the state store
//! 2. Build the dependency-ordered plan (refusing cycles and blocked steps)
//! 3. For each step: fetch or reuse the verified artifact, run the
//!    installer silently, record the result
//!
//! Execution stops at the first failure; nothing is recorded for a step
//! that failed.

use std::time::Duration;

use console::Style;

use crate::cancel::CancelToken;
use crate::cli::InstallArgs;
use crate::commands::helpers::Globals;
use crate::error::Result;
use crate::manager::{AppManager, InstallHooks, InstallOptions};
use crate::progress;
use crate::runner::InstallerRunner;

/// Run the install command
pub fn run(globals: &Globals, args: &InstallArgs) -> Result<()> {
    let catalog = globals.load_catalog()?;
    let state = globals.open_state()?;
    let downloads = globals.download_manager(args.require_signatures)?;

    let mut runner = InstallerRunner::new();
    if let Some(secs) = args.timeout {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }

    let manager = AppManager::new(&catalog, &state, &downloads, &runner);

    println!(
        "Installing {}",
        Style::new().bold().apply_to(&args.app_id)
    );

    let options = InstallOptions {
        force: args.force,
        skip_dependencies: args.skip_dependencies,
    };

    let download_pb = progress::download_bar();
    let on_step = |meta: &crate::catalog::AppMetadata, index: usize, total: usize| {
        println!(
            "({index}/{total}) {} {}",
            Style::new().cyan().apply_to(&meta.name),
            Style::new().dim().apply_to(&meta.version)
        );
    };

    let report = manager.install(
        &args.app_id,
        options,
        &CancelToken::new(),
        InstallHooks {
            on_step: Some(&on_step),
            download_progress: Some(&download_pb),
        },
    );
    download_pb.finish_and_clear();
    let report = report?;

    for satisfied in &report.already_satisfied {
        println!(
            "  {} {} is already installed at a sufficient version",
            Style::new().dim().apply_to("skipped:"),
            satisfied
        );
    }

    if report.installed.is_empty() {
        println!("Nothing to install.");
    } else {
        println!(
            "{} Installed {} application(s): {}",
            Style::new().green().bold().apply_to("Done."),
            report.installed.len(),
            report.installed.join(", ")
        );
    }

    Ok(())
}
