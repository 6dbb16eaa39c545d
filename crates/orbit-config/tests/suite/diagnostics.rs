use orbit_config::{BuiltinsLoadingState, ConfigError, ConfigWarning, OrbitConfig};
use tempfile::NamedTempFile;

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[logging]
levle = "debug"

[dependencies]
builtinz = "dependencies"
"#;

    let (config, diagnostics) =
        OrbitConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.unknown_keys,
        vec!["dependencies.builtinz", "logging.levle", "typo"]
    );
    assert_eq!(config.dependencies.builtins, BuiltinsLoadingState::ClassLoader);
}

#[test]
fn warns_about_empty_core_prefixes() {
    let (_config, diagnostics) = OrbitConfig::load_from_str_with_diagnostics(
        "[dependencies]\ncore_library_prefixes = []\n",
    )
    .unwrap();
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::CoreLibraryPrefixesEmpty]
    );

    let (_config, diagnostics) = OrbitConfig::load_from_str_with_diagnostics(
        "[dependencies]\ncore_library_prefixes = [\"kotlin-stdlib\", \" \"]\n",
    )
    .unwrap();
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::InvalidValue { toml_path, .. }]
            if toml_path == "dependencies.core_library_prefixes[1]"
    ));
}

#[test]
fn warns_about_invalid_logging_directives() {
    let (_config, diagnostics) =
        OrbitConfig::load_from_str_with_diagnostics("[logging]\nlevel = \"orbit.deps=loud\"\n")
            .unwrap();
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { .. }]
    ));
}

#[test]
fn clean_config_has_no_diagnostics() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "[logging]\nlevel = \"debug\"\njson = true\n\n[dependencies]\nbuiltins = \"dependencies\"\n",
    )
    .unwrap();

    let (config, diagnostics) = OrbitConfig::load_from_path_with_diagnostics(file.path()).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert!(config.logging.json);
    assert!(!config.dependencies.builtins.is_from_class_loader());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err =
        OrbitConfig::load_from_path_with_diagnostics(dir.path().join("orbit.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
