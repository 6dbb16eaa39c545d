use std::ffi::OsString;

use orbit_config::{
    discover_config_path, with_config_env_lock, BuiltinsLoadingState, OrbitConfig,
    ORBIT_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_orbit_toml_in_project_dir() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(ORBIT_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("orbit.toml");
        std::fs::write(&config_path, "[dependencies]\nbuiltins = \"dependencies\"\n").unwrap();

        assert_eq!(discover_config_path(dir.path()), Some(config_path.clone()));

        let (config, _) = OrbitConfig::load_from_path_with_diagnostics(&config_path).unwrap();
        assert_eq!(config.dependencies.builtins, BuiltinsLoadingState::Dependencies);
    });
}

#[test]
fn hidden_config_is_a_fallback() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(ORBIT_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let hidden = dir.path().join(".orbit.toml");
        std::fs::write(&hidden, "").unwrap();
        assert_eq!(discover_config_path(dir.path()), Some(hidden.clone()));

        let visible = dir.path().join("orbit.toml");
        std::fs::write(&visible, "").unwrap();
        assert_eq!(discover_config_path(dir.path()), Some(visible));
    });
}

#[test]
fn env_var_overrides_discovery_relative_to_project_dir() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("orbit.toml"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("conf")).unwrap();
        std::fs::write(dir.path().join("conf/custom.toml"), "[logging]\njson = true\n").unwrap();

        let _env = EnvVarGuard::set(ORBIT_CONFIG_ENV_VAR, std::path::Path::new("conf/custom.toml"));
        let path = discover_config_path(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("conf/custom.toml"));
        let (config, _) = OrbitConfig::load_from_path_with_diagnostics(&path).unwrap();
        assert!(config.logging.json);
    });
}

#[test]
fn missing_config_is_not_discovered() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(ORBIT_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();
        assert_eq!(discover_config_path(dir.path()), None);
    });
}
