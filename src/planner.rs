//! Install plan construction over the catalog's dependency graph
//!
//! `build_install_plan` walks the dependency graph depth-first and emits
//! steps in post-order, so every dependency appears strictly before its
//! dependents (leaf-to-root). The walk is driven by an explicit frame stack
//! with a separate in-progress set and visited set, keeping cycle detection
//! independent of the call stack.
//!
//! Expected planning conditions are data, not errors: a missing catalog
//! entry becomes a `Blocked` step (siblings still resolve), a cycle sets
//! `has_cycle` and adds a diagnostic naming its members, and an installed
//! application at a sufficient version becomes `AlreadySatisfied` without
//! expanding its dependencies further.

use std::collections::{HashMap, HashSet};

use crate::catalog::Catalog;
use crate::state::AppStatus;
use crate::version;

/// Prefix used for cycle diagnostics in `InstallPlan::warnings`
const CYCLE_WARNING_PREFIX: &str = "dependency cycle detected: ";

/// What the orchestrator should do for one plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Install,
    AlreadySatisfied,
    Blocked,
}

/// One annotated step of an install plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub app_id: String,
    pub action: PlanAction,
    /// Human-readable explanation, set for `Blocked` steps
    pub reason: Option<String>,
    /// Direct dependencies as declared in the catalog
    pub dependencies: Vec<String>,
}

/// Ordered result of one planning call; owned by the caller, never mutated
/// after return
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub target: String,
    /// Steps in leaf-to-root order, each app exactly once
    pub steps: Vec<PlanStep>,
    /// Missing-dependency notices and cycle diagnostics
    pub warnings: Vec<String>,
    pub has_cycle: bool,
}

impl InstallPlan {
    /// The cycle diagnostic, if the walk found one
    pub fn cycle_diagnostic(&self) -> Option<&str> {
        self.warnings
            .iter()
            .find_map(|w| w.strip_prefix(CYCLE_WARNING_PREFIX))
    }

    /// Steps the orchestrator would execute (action == Install)
    pub fn install_steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps
            .iter()
            .filter(|s| s.action == PlanAction::Install)
    }

    pub fn blocked_steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps
            .iter()
            .filter(|s| s.action == PlanAction::Blocked)
    }
}

/// Non-mutating dependency-graph planner
///
/// Pure computation over an immutable catalog and a state snapshot taken at
/// construction; safe to call from multiple threads.
pub struct InstallPlanner<'a> {
    catalog: &'a Catalog,
    installed: &'a HashMap<String, AppStatus>,
}

enum Frame {
    Enter { id: String, via: Option<String> },
    Exit { id: String, dependencies: Vec<String> },
}

impl<'a> InstallPlanner<'a> {
    pub fn new(catalog: &'a Catalog, installed: &'a HashMap<String, AppStatus>) -> Self {
        Self { catalog, installed }
    }

    /// Build the ordered, annotated install plan for one target application
    pub fn build_install_plan(&self, target: &str) -> InstallPlan {
        let mut steps: Vec<PlanStep> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut has_cycle = false;

        let mut visited: HashSet<String> = HashSet::new();
        let mut in_progress: HashSet<String> = HashSet::new();
        // Current root-to-leaf chain, for naming cycle members
        let mut chain: Vec<String> = Vec::new();

        let mut stack = vec![Frame::Enter {
            id: target.to_string(),
            via: None,
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter { id, via } => {
                    if visited.contains(&id) {
                        continue;
                    }

                    if in_progress.contains(&id) {
                        has_cycle = true;
                        warnings.push(format!(
                            "{CYCLE_WARNING_PREFIX}{}",
                            render_cycle(&chain, &id)
                        ));
                        continue;
                    }

                    let Some(meta) = self.catalog.lookup(&id) else {
                        visited.insert(id.clone());
                        let reason = match &via {
                            Some(parent) => format!(
                                "'{id}' is not in the catalog (required by '{parent}')"
                            ),
                            None => format!("'{id}' is not in the catalog"),
                        };
                        warnings.push(reason.clone());
                        steps.push(PlanStep {
                            app_id: id,
                            action: PlanAction::Blocked,
                            reason: Some(reason),
                            dependencies: Vec::new(),
                        });
                        continue;
                    };

                    if self.is_satisfied(&id, &meta.version) {
                        // Trust the recorded install; do not re-verify its
                        // own dependency closure
                        visited.insert(id.clone());
                        steps.push(PlanStep {
                            app_id: id,
                            action: PlanAction::AlreadySatisfied,
                            reason: None,
                            dependencies: meta.dependencies.clone(),
                        });
                        continue;
                    }

                    in_progress.insert(id.clone());
                    chain.push(id.clone());
                    stack.push(Frame::Exit {
                        id: id.clone(),
                        dependencies: meta.dependencies.clone(),
                    });
                    // Reverse so the first declared dependency is processed
                    // first off the stack
                    for dep in meta.dependencies.iter().rev() {
                        stack.push(Frame::Enter {
                            id: dep.clone(),
                            via: Some(id.clone()),
                        });
                    }
                }
                Frame::Exit { id, dependencies } => {
                    in_progress.remove(&id);
                    chain.pop();
                    visited.insert(id.clone());
                    steps.push(PlanStep {
                        app_id: id,
                        action: PlanAction::Install,
                        reason: None,
                        dependencies,
                    });
                }
            }
        }

        InstallPlan {
            target: target.to_string(),
            steps,
            warnings,
            has_cycle,
        }
    }

    fn is_satisfied(&self, app_id: &str, catalog_version: &str) -> bool {
        self.installed
            .get(app_id)
            .is_some_and(|s| s.installed && version::satisfies(&s.version, catalog_version))
    }
}

/// The full transitive dependency closure of an application, excluding the
/// application itself; recorded into the state store at install time.
pub fn dependency_closure(catalog: &Catalog, app_id: &str) -> Vec<String> {
    let mut closure: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(app_id.to_string());

    let mut queue: Vec<String> = catalog
        .lookup(app_id)
        .map(|m| m.dependencies.clone())
        .unwrap_or_default();

    while let Some(dep) = queue.pop() {
        if !seen.insert(dep.clone()) {
            continue;
        }
        if let Some(meta) = catalog.lookup(&dep) {
            queue.extend(meta.dependencies.iter().cloned());
        }
        closure.push(dep);
    }

    closure.sort();
    closure
}

fn render_cycle(chain: &[String], repeat: &str) -> String {
    let start = chain.iter().position(|id| id == repeat).unwrap_or(0);
    let mut members: Vec<&str> = chain[start..].iter().map(String::as_str).collect();
    members.push(repeat);
    members.join(" -> ")
}
