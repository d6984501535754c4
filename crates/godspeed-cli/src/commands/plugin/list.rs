use anyhow::Context;
use godspeed_plugins::{PluginListing, PluginManager};

use crate::theme::Theme;

/// List catalog plugins with the version each project dependency pins.
pub(crate) fn list_plugins(manager: &PluginManager) -> anyhow::Result<()> {
    let listings = manager.list().context("failed to read project dependencies")?;

    println!("{}", Theme::header("Godspeed Plugins"));
    println!("  {:<56} {:<16} INSTALLED", "IDENTITY", "NAME");
    println!("{}", Theme::separator());
    for listing in &listings {
        println!("  {}", listing_row(listing));
    }

    let installed = listings.iter().filter(|l| l.installed.is_some()).count();
    println!(
        "\n{}",
        Theme::dimmed(&format!(
            "{} plugin(s) in catalog, {installed} installed",
            listings.len()
        ))
    );
    Ok(())
}

fn listing_row(listing: &PluginListing) -> String {
    let installed = listing.installed.as_deref().unwrap_or("-");
    format!(
        "{:<56} {:<16} {installed}",
        listing.descriptor.identity, listing.descriptor.display_name
    )
}
