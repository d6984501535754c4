pub(crate) mod plugin;
