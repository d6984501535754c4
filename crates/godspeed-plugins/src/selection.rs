//! Plugin selection seam and search filtering.

use crate::catalog::PluginDescriptor;
use crate::error::PluginResult;
use crate::installer::PackageOperation;

/// Chooses which of the offered plugins an operation applies to.
pub trait Selector {
    /// Pick identities from `rows` for `operation`.
    ///
    /// An empty result means "nothing to do" and is not an error.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::Selection` if the selection mechanism itself fails.
    fn choose(
        &self,
        rows: &[&PluginDescriptor],
        operation: PackageOperation,
    ) -> PluginResult<Vec<String>>;
}

/// Rows matching `query` case-insensitively on identity, display name or
/// description. A blank query keeps every row.
#[must_use]
pub fn filter_rows<'a>(rows: &[&'a PluginDescriptor], query: &str) -> Vec<&'a PluginDescriptor> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .copied()
        .filter(|d| {
            d.identity.to_lowercase().contains(&needle)
                || d.display_name.to_lowercase().contains(&needle)
                || d.description.to_lowercase().contains(&needle)
        })
        .collect()
}
