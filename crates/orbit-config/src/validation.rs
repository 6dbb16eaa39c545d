use crate::diagnostics::{ConfigWarning, ValidationDiagnostics};
use crate::{LoggingConfig, OrbitConfig};

impl OrbitConfig {
    /// Validate semantic invariants for a configuration.
    ///
    /// Validation reports as many problems as possible in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();

        validate_logging(self, &mut out);
        validate_dependencies(self, &mut out);

        out
    }
}

fn validate_logging(config: &OrbitConfig, out: &mut ValidationDiagnostics) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}

fn validate_dependencies(config: &OrbitConfig, out: &mut ValidationDiagnostics) {
    let prefixes = &config.dependencies.core_library_prefixes;
    if prefixes.is_empty() {
        out.warnings.push(ConfigWarning::CoreLibraryPrefixesEmpty);
        return;
    }

    for (idx, prefix) in prefixes.iter().enumerate() {
        if prefix.trim().is_empty() {
            out.warnings.push(ConfigWarning::InvalidValue {
                toml_path: format!("dependencies.core_library_prefixes[{idx}]"),
                message: "prefix must not be empty (it would match every jar)".to_owned(),
            });
        }
    }
}
