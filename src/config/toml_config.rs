use crate::config::ImporterConfig;
use crate::utils::error::{ImporterError, Result};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

impl ImporterConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ImporterError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after substituting `${VAR}` references.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ImporterError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"))
}

/// Unset variables are left as written.
fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use crate::domain::model::MalformedRowPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[origin]
bucket = "incoming"

[destination]
bucket = "processed"
prefix = "cname/"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ImporterConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.origin.prefix, "");
        assert!(!config.origin.decompressive_transcoding);
        assert_eq!(config.destination.prefix, "cname/");
        assert_eq!(config.store.backend, StoreBackend::S3);
        assert_eq!(config.job.timeout_seconds, 900);
        assert_eq!(config.job.malformed_rows, MalformedRowPolicy::Abort);
    }

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[origin]
bucket = "incoming"
prefix = "cname/"
decompressive_transcoding = true

[destination]
bucket = "processed"
prefix = "out/"

[store]
backend = "local"
root = "/var/lib/importer"

[job]
timeout_seconds = 60
malformed_rows = "skip"
"#;

        let config = ImporterConfig::from_toml_str(toml_content).unwrap();
        assert!(config.origin.decompressive_transcoding);
        assert_eq!(config.store.backend, StoreBackend::Local);
        assert_eq!(config.store.root.as_deref(), Some("/var/lib/importer"));
        assert_eq!(config.job.timeout_seconds, 60);
        assert_eq!(config.job.malformed_rows, MalformedRowPolicy::Skip);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("IMPORTER_TEST_ORIGIN_BUCKET", "from-env");

        let toml_content = r#"
[origin]
bucket = "${IMPORTER_TEST_ORIGIN_BUCKET}"

[destination]
bucket = "${IMPORTER_TEST_UNSET_VARIABLE}"
"#;

        let config = ImporterConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.origin.bucket, "from-env");
        assert_eq!(config.destination.bucket, "${IMPORTER_TEST_UNSET_VARIABLE}");

        std::env::remove_var("IMPORTER_TEST_ORIGIN_BUCKET");
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let err = ImporterConfig::from_toml_str("[origin]\nbucket = \"incoming\"\n").unwrap_err();
        assert!(matches!(err, ImporterError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ImporterConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.origin.bucket, "incoming");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ImporterConfig::from_file("/nonexistent/conf.toml").unwrap_err();
        assert!(matches!(err, ImporterError::ConfigError { .. }));
    }
}
