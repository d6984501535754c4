//! Interactive plugin selection.

use std::io::IsTerminal;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect};
use godspeed_plugins::{
    PackageOperation, PluginDescriptor, PluginError, PluginResult, Selector, filter_rows,
};
use tracing::warn;

use crate::theme::Theme;

/// Search prompt followed by a multi-select over the matching rows.
pub(crate) struct PromptSelector {
    interactive: bool,
}

impl PromptSelector {
    /// Selector that prompts only when stdin is a terminal.
    pub(crate) fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }

    #[cfg(test)]
    fn non_interactive() -> Self {
        Self { interactive: false }
    }
}

fn selection_error(e: dialoguer::Error) -> PluginError {
    PluginError::Selection(e.to_string())
}

/// Row label shown in the multi-select.
fn row_label(descriptor: &PluginDescriptor) -> String {
    if descriptor.display_name.trim().is_empty() {
        return descriptor.identity.clone();
    }
    if descriptor.description.trim().is_empty() {
        format!("{} ({})", descriptor.display_name, descriptor.identity)
    } else {
        format!(
            "{} ({}) - {}",
            descriptor.display_name, descriptor.identity, descriptor.description
        )
    }
}

impl Selector for PromptSelector {
    fn choose(
        &self,
        rows: &[&PluginDescriptor],
        operation: PackageOperation,
    ) -> PluginResult<Vec<String>> {
        if rows.is_empty() {
            let message = match operation {
                PackageOperation::Add => "Every catalog plugin is already installed",
                PackageOperation::Remove | PackageOperation::Update => {
                    "No catalog plugins are installed in this project"
                },
            };
            println!("{}", Theme::info(message));
            return Ok(Vec::new());
        }

        if !self.interactive {
            warn!(%operation, "stdin is not a terminal, skipping plugin selection");
            println!(
                "{}",
                Theme::warning("Not a terminal: pass a plugin name to select it directly")
            );
            return Ok(Vec::new());
        }

        let theme = ColorfulTheme::default();
        let query: String = Input::with_theme(&theme)
            .with_prompt("Search plugins (leave empty to show all)")
            .allow_empty(true)
            .interact_text()
            .map_err(selection_error)?;

        let matches = filter_rows(rows, &query);
        if matches.is_empty() {
            println!(
                "{}",
                Theme::info(&format!("No plugins match '{}'", query.trim()))
            );
            return Ok(Vec::new());
        }

        let labels: Vec<String> = matches.iter().map(|d| row_label(d)).collect();
        let picked = MultiSelect::with_theme(&theme)
            .with_prompt(format!("Select plugins to {operation} (space to toggle)"))
            .items(&labels)
            .interact()
            .map_err(selection_error)?;

        Ok(picked
            .into_iter()
            .filter_map(|i| matches.get(i))
            .map(|d| d.identity.clone())
            .collect())
    }
}
