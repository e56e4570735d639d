//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        Self::expand_paths(&mut config);
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    fn expand_paths(config: &mut Config) {
        config.logging.directory = Self::expand_path(&config.logging.directory);
        if let Some(path) = config.catalog.database_path.take() {
            config.catalog.database_path =
                Some(PathBuf::from(Self::expand_path(&path.to_string_lossy())));
        }
    }

    /// Expand shell-style paths (e.g., `~/.cronfleet`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.instance.total, 1);
        assert_eq!(config.notifications.port, 7600);
    }

    #[test]
    fn test_load_fleet_config() {
        let content = r#"
            [instance]
            number = 2
            total = 3

            [catalog]
            base_url = "http://catalog:8080/api"
            database_path = "/var/lib/cronfleet/catalog.db"

            [operations]
            base_url = "http://operations:8080/api"
            timeout_secs = 5
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.instance.number, 2);
        assert_eq!(config.instance.total, 3);
        assert_eq!(
            config.catalog.base_url.as_deref(),
            Some("http://catalog:8080/api")
        );
        assert_eq!(
            config.catalog.database_path,
            Some(PathBuf::from("/var/lib/cronfleet/catalog.db"))
        );
        assert_eq!(config.operations.timeout_secs, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[instance]").unwrap();
        writeln!(file, "number = 3").unwrap();
        writeln!(file, "total = 4").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.instance.number, 3);
        assert_eq!(config.instance.total, 4);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_tilde_paths_are_expanded() {
        let content = r#"
            [catalog]
            database_path = "~/catalog.db"

            [logging]
            directory = "~/logs"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert!(!config.logging.directory.starts_with('~'));
        let db = config.catalog.database_path.unwrap();
        assert!(!db.to_string_lossy().starts_with('~'));
        assert!(db.ends_with("catalog.db"));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("CRONFLEET_TEST_CATALOG_URL", "http://catalog.test");
        }
        let content = "[catalog]\nbase_url = \"${CRONFLEET_TEST_CATALOG_URL}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.catalog.base_url.as_deref(), Some("http://catalog.test"));
        unsafe {
            std::env::remove_var("CRONFLEET_TEST_CATALOG_URL");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_CRONFLEET_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/var/log"), "/var/log");
    }
}
