use anyhow::Context;
use godspeed_plugins::PluginManager;

use super::helpers::print_report;
use super::select::PromptSelector;
use crate::theme::Theme;

/// Delete plugin artifacts, then uninstall the packages.
pub(crate) async fn remove_plugins(
    manager: &PluginManager,
    identity: Option<&str>,
) -> anyhow::Result<()> {
    println!("{}", Theme::header("Remove plugins"));
    let report = manager
        .remove(identity, &PromptSelector::new())
        .await
        .context("plugin remove failed")?;
    print_report(&report);
    Ok(())
}
