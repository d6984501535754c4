//! Plugin commands: add, remove, update and list.

pub(crate) mod add;
pub(crate) mod helpers;
pub(crate) mod list;
pub(crate) mod remove;
pub(crate) mod select;
pub(crate) mod update;

pub(crate) use add::add_plugins;
pub(crate) use helpers::build_manager;
pub(crate) use list::list_plugins;
pub(crate) use remove::remove_plugins;
pub(crate) use update::update_plugins;
