use anyhow::Context;
use godspeed_plugins::PluginManager;

use super::helpers::print_report;
use super::select::PromptSelector;
use crate::theme::Theme;

/// Install plugins and generate their artifacts.
pub(crate) async fn add_plugins(
    manager: &PluginManager,
    identity: Option<&str>,
) -> anyhow::Result<()> {
    println!("{}", Theme::header("Add plugins"));
    let report = manager
        .add(identity, &PromptSelector::new())
        .await
        .context("plugin add failed")?;
    print_report(&report);
    Ok(())
}
