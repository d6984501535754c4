//! Real child processes: a scripted package manager and Node.js introspection.

use std::path::Path;

use godspeed_plugins::{
    ContractLoadError, ContractLoader, NodeContractLoader, PackageInstaller, PackageManager,
    PackageOperation, PackageRunner, PluginError, Role,
};

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn batch(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_owned()).collect()
}

// ---------------------------------------------------------------------------
// Package manager
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn fake_manager(bin: &Path, name: &str, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = bin.join(name);
    write(&path, &format!("#!/bin/sh\nprintf '%s\\n' \"$*\" >> \"$PWD/calls.log\"\n{body}"));
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Prints a line of invalid UTF-8 followed by enough output to fill the pipe.
#[cfg(unix)]
const NOISY: &str = r#"printf 'ok\n\377\376 bad bytes\n'
i=0
while [ "$i" -lt 4000 ]; do echo "progress $i"; i=$((i+1)); done
echo "WARN deprecated subdependency" >&2
exit 0
"#;

#[cfg(unix)]
const BROKEN: &str = r#"echo "ERR_PNPM_FETCH_404 package not found" >&2
exit 3
"#;

#[cfg(unix)]
#[tokio::test]
async fn package_manager_batches() {
    let project = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let calls = project.path().join("calls.log");

    // One child for the whole batch, drained to the end despite bad bytes.
    fake_manager(bin.path(), "pnpm", NOISY);
    let installer =
        PackageInstaller::new(project.path(), vec![PackageManager::Pnpm, PackageManager::Npm])
            .with_search_path(bin.path());
    let outcome = installer
        .run(PackageOperation::Add, &batch(&["@scope/plugins-a", "@scope/plugins-b"]))
        .await
        .unwrap();
    assert_eq!(outcome.manager, PackageManager::Pnpm);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.stderr.contains("WARN deprecated subdependency"));
    assert_eq!(
        std::fs::read_to_string(&calls).unwrap(),
        "add @scope/plugins-a @scope/plugins-b\n"
    );

    // The first manager on the search path wins, with its own subcommand.
    std::fs::remove_file(bin.path().join("pnpm")).unwrap();
    std::fs::remove_file(&calls).unwrap();
    fake_manager(bin.path(), "npm", "exit 0\n");
    let outcome = installer
        .run(PackageOperation::Remove, &batch(&["@scope/plugins-a"]))
        .await
        .unwrap();
    assert_eq!(outcome.manager, PackageManager::Npm);
    assert!(outcome.success());
    assert_eq!(
        std::fs::read_to_string(&calls).unwrap(),
        "uninstall @scope/plugins-a\n"
    );

    // A non-zero exit is reported, and becomes InstallFailed on demand.
    fake_manager(bin.path(), "npm", BROKEN);
    let outcome = installer
        .run(PackageOperation::Update, &batch(&["@scope/plugins-a"]))
        .await
        .unwrap();
    assert_eq!(outcome.exit_code, Some(3));
    match outcome.into_result() {
        Err(PluginError::InstallFailed {
            exit_code, stderr, ..
        }) => {
            assert_eq!(exit_code, Some(3));
            assert_eq!(stderr, "ERR_PNPM_FETCH_404 package not found");
        },
        other => panic!("expected InstallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn no_manager_on_search_path() {
    let project = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let installer = PackageInstaller::new(project.path(), vec![PackageManager::Yarn])
        .with_search_path(bin.path());
    let err = installer
        .run(PackageOperation::Add, &batch(&["@scope/plugins-a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::PackageManagerNotFound { ref tried } if tried == "yarn"));
}

// ---------------------------------------------------------------------------
// Node.js introspection
// ---------------------------------------------------------------------------

const CJS: &str = "@scope/plugins-redis-as-datasource";
const ESM: &str = "@scope/plugins-axios-as-datasource";

fn node_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let modules = dir.path().join("node_modules");

    write(
        &modules.join(CJS).join("package.json"),
        &format!(r#"{{"name": "{CJS}", "version": "1.0.0", "main": "index.js"}}"#),
    );
    write(
        &modules.join(CJS).join("index.js"),
        "module.exports = { SourceType: 'DS', Type: 'redis', DEFAULT_CONFIG: { port: 6379 } };\n",
    );

    write(
        &modules.join(ESM).join("package.json"),
        &format!(
            r#"{{"name": "{ESM}", "version": "1.0.0", "type": "module", "exports": "./index.js"}}"#
        ),
    );
    write(
        &modules.join(ESM).join("index.js"),
        "export const SourceType = 'BOTH';\n\
         export const Type = 'axios';\n\
         export const CONFIG_FILE_NAME = 'api';\n",
    );
    dir
}

#[tokio::test]
async fn node_reads_commonjs_and_esm_contracts() {
    if which::which("node").is_err() {
        eprintln!("node not found in PATH, skipping");
        return;
    }
    let project = node_project();
    let loader = NodeContractLoader::new(project.path(), "node");

    let cjs = loader.load(CJS).await.unwrap();
    assert_eq!(cjs.role, Role::DataSource);
    assert_eq!(cjs.loader_name, "redis");
    assert_eq!(cjs.config_name, "redis");
    assert_eq!(cjs.default_config["port"], 6379);

    let esm = loader.load(ESM).await.unwrap();
    assert_eq!(esm.role, Role::Both);
    assert_eq!(esm.loader_name, "axios");
    assert_eq!(esm.config_name, "api");
    assert!(esm.default_config.is_empty());

    let missing = loader.load("@scope/plugins-absent").await.unwrap_err();
    assert!(matches!(missing, ContractLoadError::LoadFailed(_)), "{missing}");
}
