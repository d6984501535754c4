//! Shared plumbing for the plugin commands.

use std::path::Path;

use godspeed_config::Config;
use godspeed_plugins::{OperationReport, PackageOperation, PluginManager, PluginOutcome};
use tracing::debug;

use crate::config_bridge;
use crate::theme::Theme;

/// Build a [`PluginManager`] for `project_root` from the loaded config.
pub(crate) fn build_manager(cfg: &Config, project_root: &Path) -> anyhow::Result<PluginManager> {
    let settings = config_bridge::to_manager_settings(cfg, project_root)?;
    let catalog = config_bridge::load_catalog(cfg)?;
    debug!(
        project = %project_root.display(),
        plugins = catalog.len(),
        "plugin manager ready"
    );
    Ok(PluginManager::new(&settings, catalog))
}

// ---------------------------------------------------------------------------
// Report rendering
// ---------------------------------------------------------------------------

/// One-line summary of what happened to a plugin.
fn outcome_line(operation: PackageOperation, outcome: &PluginOutcome) -> String {
    let contract = outcome.classification.contract();
    let verb = match operation {
        PackageOperation::Add => "Added",
        PackageOperation::Remove => "Removed",
        PackageOperation::Update if outcome.written.is_some() => "Updated and regenerated",
        PackageOperation::Update => "Updated",
    };
    format!(
        "{verb} {} ({}, loader '{}', config '{}')",
        outcome.identity, contract.role, contract.loader_name, contract.config_name
    )
}

/// Print an operation report. Fallbacks and file failures are warnings only.
pub(crate) fn print_report(report: &OperationReport) {
    if report.nothing_selected() {
        println!("{}", Theme::info("No plugins selected"));
        return;
    }

    for outcome in &report.plugins {
        println!("{}", Theme::success(&outcome_line(report.operation, outcome)));

        if let godspeed_plugins::ClassificationResult::Fallback { reason, .. } =
            &outcome.classification
        {
            println!(
                "  {}",
                Theme::warning(&format!("contract inferred from the package name: {reason}"))
            );
        }

        for failure in [&outcome.erased, &outcome.written]
            .into_iter()
            .flatten()
            .flat_map(|r| &r.failures)
        {
            println!(
                "  {}",
                Theme::error(&format!("{}: {}", failure.path.display(), failure.error))
            );
        }
    }

    println!("{}", Theme::separator());
    let count = report.plugins.len();
    let verb = past_tense(report.operation);
    let summary = match &report.install {
        Some(install) => format!("{count} plugin(s) {verb} with {}", install.manager),
        None => format!("{count} plugin(s) {verb}"),
    };
    println!("{}", Theme::dimmed(&summary));

    let fallbacks = report.fallback_count();
    if fallbacks > 0 {
        println!(
            "{}",
            Theme::warning(&format!("{fallbacks} plugin(s) classified by name"))
        );
    }
    let failed = report.artifact_failure_count();
    if failed > 0 {
        println!(
            "{}",
            Theme::warning(&format!("{failed} plugin(s) with file errors"))
        );
    }
}

fn past_tense(operation: PackageOperation) -> &'static str {
    match operation {
        PackageOperation::Add => "added",
        PackageOperation::Remove => "removed",
        PackageOperation::Update => "updated",
    }
}
