use figment::Jail;
use qc_config::QConsoleConfig;
use qc_core::enums::ConflictPolicy;

#[test]
fn env_overrides_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".qconsole")?;
        jail.create_file(
            ".qconsole/config.toml",
            r#"
[runs]
conflict_policy = "reject"
"#,
        )?;
        jail.set_env("QCONSOLE_RUNS__CONFLICT_POLICY", "replace");

        let config = QConsoleConfig::load(jail.directory()).expect("config loads");
        assert_eq!(config.runs.conflict_policy, ConflictPolicy::Replace);
        Ok(())
    });
}

#[test]
fn env_sets_asset_root() {
    Jail::expect_with(|jail| {
        jail.set_env("QCONSOLE_MANIFEST__ASSET_ROOT", "/srv/assets");

        let config = QConsoleConfig::load(jail.directory()).expect("config loads");
        assert_eq!(config.manifest.asset_root, "/srv/assets");
        Ok(())
    });
}
