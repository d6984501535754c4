//! Deep merge of TOML value trees.
//!
//! Merging raw [`toml::Value`]s keeps "absent" distinct from "default": a key
//! missing from an overlay never resets the base layer.

/// Deep-merge `overlay` into `base`. Tables merge key by key; any other
/// value (arrays included) replaces the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Set a dotted `path` (e.g. `"logging.level"`) in `root`, creating
/// intermediate tables as needed.
pub fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) {
    let toml::Value::Table(table) = root else {
        return;
    };
    match path.split_once('.') {
        None => {
            table.insert(path.to_owned(), value);
        },
        Some((head, rest)) => {
            if !table.contains_key(head) {
                table.insert(head.to_owned(), toml::Value::Table(toml::map::Map::new()));
            }
            if let Some(child) = table.get_mut(head) {
                set_path(child, rest, value);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_keeps_unset_keys() {
        let mut base = parse("[logging]\nlevel = \"warn\"\nformat = \"compact\"\n");
        deep_merge(&mut base, &parse("[logging]\nlevel = \"debug\"\n"));
        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(base["logging"]["format"].as_str(), Some("compact"));
    }

    #[test]
    fn arrays_replace() {
        let mut base = parse("[plugins]\npackage_managers = [\"pnpm\", \"npm\"]\n");
        deep_merge(&mut base, &parse("[plugins]\npackage_managers = [\"yarn\"]\n"));
        let managers = base["plugins"]["package_managers"].as_array().unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].as_str(), Some("yarn"));
    }

    #[test]
    fn new_sections_are_added() {
        let mut base = parse("[logging]\nlevel = \"warn\"\n");
        deep_merge(&mut base, &parse("[project]\nsource_dir = \"app\"\n"));
        assert_eq!(base["project"]["source_dir"].as_str(), Some("app"));
        assert_eq!(base["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn set_path_creates_tables() {
        let mut root = toml::Value::Table(toml::map::Map::new());
        set_path(&mut root, "plugins.catalog_path", toml::Value::String("c.json".into()));
        assert_eq!(root["plugins"]["catalog_path"].as_str(), Some("c.json"));
    }

    #[test]
    fn set_path_overwrites_leaf() {
        let mut root = parse("[logging]\nlevel = \"warn\"\n");
        set_path(&mut root, "logging.level", toml::Value::String("trace".into()));
        assert_eq!(root["logging"]["level"].as_str(), Some("trace"));
    }
}
