use anyhow::Context;
use godspeed_plugins::PluginManager;

use super::helpers::print_report;
use super::select::PromptSelector;
use crate::theme::Theme;

/// Upgrade plugins. Artifacts are regenerated only for changed contracts.
pub(crate) async fn update_plugins(
    manager: &PluginManager,
    identity: Option<&str>,
) -> anyhow::Result<()> {
    println!("{}", Theme::header("Update plugins"));
    let report = manager
        .update(identity, &PromptSelector::new())
        .await
        .context("plugin update failed")?;
    print_report(&report);
    Ok(())
}
