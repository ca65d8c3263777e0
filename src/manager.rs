//! Orchestration of plan, install, uninstall and status
//!
//! `AppManager` sequences the leaf components (planner, download manager,
//! installer runner, state store) and owns only the execution rules:
//! a cyclic plan is never executed, a blocked plan is never executed
//! (force cannot fabricate missing catalog metadata), steps run strictly
//! in plan order, and a step that fails leaves no state-store record
//! behind for that application.

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::catalog::{AppMetadata, Catalog};
use crate::download::DownloadManager;
use crate::error::{AppdeckError, Result};
use crate::planner::{self, InstallPlan, InstallPlanner, PlanAction};
use crate::runner::InstallerRunner;
use crate::state::{AppStatus, StateStore};

/// Options for one install operation
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Reinstall steps that are already satisfied
    pub force: bool,
    /// Execute only the target's own step
    pub skip_dependencies: bool,
}

/// Outcome summary of one install operation
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Applications installed, in execution order
    pub installed: Vec<String>,
    /// Applications skipped because they were already satisfied
    pub already_satisfied: Vec<String>,
}

/// Progress callback invoked before each executed step
pub type StepObserver<'a> = dyn Fn(&AppMetadata, usize, usize) + 'a;

/// Presentation hooks threaded through an install operation
#[derive(Default)]
pub struct InstallHooks<'a> {
    /// Invoked before each executed step with (metadata, index, total)
    pub on_step: Option<&'a StepObserver<'a>>,
    /// Byte-level progress for each artifact download
    pub download_progress: Option<&'a indicatif::ProgressBar>,
}

/// Orchestrator over the catalog, state store, downloads and runner
pub struct AppManager<'a> {
    catalog: &'a Catalog,
    state: &'a StateStore,
    downloads: &'a DownloadManager,
    runner: &'a InstallerRunner,
}

impl<'a> AppManager<'a> {
    pub fn new(
        catalog: &'a Catalog,
        state: &'a StateStore,
        downloads: &'a DownloadManager,
        runner: &'a InstallerRunner,
    ) -> Self {
        Self {
            catalog,
            state,
            downloads,
            runner,
        }
    }

    /// Build the install plan for a target without side effects
    pub fn plan(&self, app_id: &str) -> Result<InstallPlan> {
        let snapshot = self.state.snapshot()?;
        Ok(InstallPlanner::new(self.catalog, &snapshot).build_install_plan(app_id))
    }

    /// Install an application and (by default) its dependency closure
    pub fn install(
        &self,
        app_id: &str,
        options: InstallOptions,
        cancel: &CancelToken,
        hooks: InstallHooks<'_>,
    ) -> Result<InstallReport> {
        if !self.catalog.contains(app_id) {
            return Err(AppdeckError::AppNotFound {
                app_id: app_id.to_string(),
            });
        }

        let plan = self.plan(app_id)?;

        if plan.has_cycle {
            return Err(AppdeckError::CyclicDependency {
                chain: plan
                    .cycle_diagnostic()
                    .unwrap_or(&plan.target)
                    .to_string(),
            });
        }

        if let Some(blocked) = plan.blocked_steps().next() {
            return Err(AppdeckError::DependencyBlocked {
                app_id: app_id.to_string(),
                reason: blocked
                    .reason
                    .clone()
                    .unwrap_or_else(|| format!("'{}' is blocked", blocked.app_id)),
            });
        }

        let mut report = InstallReport::default();
        let executable: Vec<_> = plan
            .steps
            .iter()
            .filter(|step| {
                if options.skip_dependencies && step.app_id != app_id {
                    return false;
                }
                match step.action {
                    PlanAction::Install => true,
                    PlanAction::AlreadySatisfied => options.force,
                    PlanAction::Blocked => false,
                }
            })
            .collect();

        for step in &plan.steps {
            if step.action == PlanAction::AlreadySatisfied && !options.force {
                report.already_satisfied.push(step.app_id.clone());
            }
        }

        let total = executable.len();
        for (index, step) in executable.into_iter().enumerate() {
            // Blocked steps were rejected above, so the lookup cannot miss
            let metadata =
                self.catalog
                    .lookup(&step.app_id)
                    .ok_or_else(|| AppdeckError::AppNotFound {
                        app_id: step.app_id.clone(),
                    })?;

            if let Some(observer) = hooks.on_step {
                observer(metadata, index + 1, total);
            }

            self.execute_step(metadata, cancel, hooks.download_progress)?;
            report.installed.push(step.app_id.clone());
        }

        Ok(report)
    }

    /// Fetch, verify, run and record one application
    ///
    /// A failure at any stage propagates before `mark_installed`, so no
    /// partial-success record is written for this application.
    fn execute_step(
        &self,
        metadata: &AppMetadata,
        cancel: &CancelToken,
        progress: Option<&indicatif::ProgressBar>,
    ) -> Result<()> {
        debug!(app = %metadata.app_id, "executing install step");

        let artifact = self.downloads.fetch(metadata, cancel, progress)?;
        self.runner.run(metadata, &artifact, cancel)?;

        let closure = planner::dependency_closure(self.catalog, &metadata.app_id);
        self.state
            .mark_installed(&metadata.app_id, &metadata.version, &artifact, closure)?;

        info!(app = %metadata.app_id, version = %metadata.version, "installed");
        Ok(())
    }

    /// Uninstall an application, refusing while installed dependents remain
    pub fn uninstall(&self, app_id: &str, force: bool, cancel: &CancelToken) -> Result<()> {
        let status = self.state.get(app_id)?;
        if !status.is_some_and(|s| s.installed) {
            return Err(AppdeckError::NotInstalled {
                app_id: app_id.to_string(),
            });
        }

        let dependents = self.installed_dependents(app_id)?;
        if !dependents.is_empty() && !force {
            return Err(AppdeckError::HasDependents {
                app_id: app_id.to_string(),
                dependents: dependents.join(", "),
            });
        }

        let metadata = self
            .catalog
            .lookup(app_id)
            .ok_or_else(|| AppdeckError::AppNotFound {
                app_id: app_id.to_string(),
            })?;

        self.runner.run_uninstall(metadata, cancel)?;
        self.state.mark_uninstalled(app_id)?;

        info!(app = %app_id, "uninstalled");
        Ok(())
    }

    /// Hard-delete an application's state record
    ///
    /// Records are audit history: purging is allowed only once the
    /// application is no longer installed. Returns whether a record existed.
    pub fn purge(&self, app_id: &str) -> Result<bool> {
        if self.state.get(app_id)?.is_some_and(|s| s.installed) {
            return Err(AppdeckError::StillInstalled {
                app_id: app_id.to_string(),
            });
        }
        self.state.purge(app_id)
    }

    /// Installed applications whose recorded closure references `app_id`
    pub fn installed_dependents(&self, app_id: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .list()?
            .into_iter()
            .filter(|s| {
                s.installed
                    && s.app_id != app_id
                    && s.dependencies.iter().any(|d| d == app_id)
            })
            .map(|s| s.app_id)
            .collect())
    }

    /// Installation records: one application's, or all of them
    pub fn status(&self, app_id: Option<&str>) -> Result<Vec<AppStatus>> {
        match app_id {
            Some(id) => Ok(self.state.get(id)?.into_iter().collect()),
            None => self.state.list(),
        }
    }
}
