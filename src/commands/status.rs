//! Status command implementation
//!
//! Reads only the state store: the catalog is not required to report what
//! has been installed.

use console::Style;

use crate::cli::StatusArgs;
use crate::commands::helpers::Globals;
use crate::error::Result;
use crate::state::AppStatus;

/// Run the status command
pub fn run(globals: &Globals, args: &StatusArgs) -> Result<()> {
    let state = globals.open_state()?;

    let records = match &args.app_id {
        Some(app_id) => state.get(app_id)?.into_iter().collect(),
        None => state.list()?,
    };

    if records.is_empty() {
        match &args.app_id {
            Some(app_id) => println!("'{app_id}' has never been installed."),
            None => println!("No applications recorded."),
        }
        return Ok(());
    }

    for record in &records {
        display_record(record, args.detailed);
    }

    let installed = records.iter().filter(|r| r.installed).count();
    println!();
    println!(
        "{} record(s), {} installed",
        records.len(),
        installed
    );

    Ok(())
}

fn display_record(record: &AppStatus, detailed: bool) {
    let marker = if record.installed {
        Style::new().green().apply_to("installed  ")
    } else {
        Style::new().dim().apply_to("uninstalled")
    };

    println!(
        "  [{}] {} {}",
        marker,
        Style::new().bold().apply_to(&record.app_id),
        record.version
    );

    if detailed {
        println!(
            "       {} {}",
            Style::new().dim().apply_to("artifact:"),
            record.installer_path.display()
        );
        if !record.dependencies.is_empty() {
            println!(
                "       {} {}",
                Style::new().dim().apply_to("dependencies:"),
                record.dependencies.join(", ")
            );
        }
        println!(
            "       {} {}",
            Style::new().dim().apply_to("installed at:"),
            record.installed_at.to_rfc3339()
        );
    }
}
