//! Plan command implementation
//!
//! Renders the dependency-ordered install plan for one application without
//! performing any downloads or state changes. Blocked steps and cycles are
//! part of the rendering, not process failures: the point of `plan` is to
//! show WHY something cannot install.

use console::Style;

use crate::cli::PlanArgs;
use crate::commands::helpers::Globals;
use crate::error::Result;
use crate::planner::{InstallPlan, InstallPlanner, PlanAction};

/// Run the plan command
pub fn run(globals: &Globals, args: &PlanArgs) -> Result<()> {
    let catalog = globals.load_catalog()?;
    let state = globals.open_state()?;
    let snapshot = state.snapshot()?;

    let plan = InstallPlanner::new(&catalog, &snapshot).build_install_plan(&args.app_id);
    render(&plan);

    Ok(())
}

fn render(plan: &InstallPlan) {
    println!(
        "Install plan for {}:",
        Style::new().bold().apply_to(&plan.target)
    );

    for (index, step) in plan.steps.iter().enumerate() {
        let tag = match step.action {
            PlanAction::Install => Style::new().green().apply_to("install  "),
            PlanAction::AlreadySatisfied => Style::new().dim().apply_to("satisfied"),
            PlanAction::Blocked => Style::new().red().bold().apply_to("blocked  "),
        };
        println!("  {}. [{}] {}", index + 1, tag, step.app_id);

        if let Some(reason) = &step.reason {
            println!("       {}", Style::new().red().apply_to(reason));
        }
        if !step.dependencies.is_empty() {
            println!(
                "       {} {}",
                Style::new().dim().apply_to("depends on:"),
                step.dependencies.join(", ")
            );
        }
    }

    if !plan.warnings.is_empty() {
        println!();
        for warning in &plan.warnings {
            println!(
                "{} {}",
                Style::new().yellow().bold().apply_to("warning:"),
                warning
            );
        }
    }

    if plan.has_cycle {
        println!();
        println!(
            "{}",
            Style::new()
                .red()
                .bold()
                .apply_to("This plan contains a dependency cycle and cannot be executed.")
        );
    }

    let to_install = plan.install_steps().count();
    println!();
    println!(
        "{} step(s) to execute, {} already satisfied, {} blocked",
        to_install,
        plan.steps
            .iter()
            .filter(|s| s.action == PlanAction::AlreadySatisfied)
            .count(),
        plan.blocked_steps().count()
    );
}
