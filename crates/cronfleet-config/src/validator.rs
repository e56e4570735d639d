//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Timeouts above this many seconds draw a warning.
const LONG_TIMEOUT_SECS: u64 = 300;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error, if any, into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_instance(config, &mut result);
        Self::validate_catalog(config, &mut result);
        Self::validate_operations(config, &mut result);
        Self::validate_notifications(config, &mut result);

        result
    }

    fn validate_instance(config: &Config, result: &mut ValidationResult) {
        let instance = &config.instance;
        if instance.total == 0 {
            result.add_error(ValidationError::new(
                "instance.total",
                "Fleet size must be greater than 0",
            ));
            return;
        }

        if instance.number == 0 || instance.number > instance.total {
            result.add_error(ValidationError::new(
                "instance.number",
                format!(
                    "Instance number {} must be within 1..={}",
                    instance.number, instance.total
                ),
            ));
        }
    }

    fn validate_catalog(config: &Config, result: &mut ValidationResult) {
        let catalog = &config.catalog;
        if catalog.base_url.is_none() && catalog.database_path.is_none() {
            result.add_error(ValidationError::new(
                "catalog",
                "Either catalog.base_url or catalog.database_path must be set",
            ));
        }

        if let Some(ref url) = catalog.base_url {
            Self::check_url("catalog.base_url", url, result);
        }

        if catalog.base_url.is_some() && catalog.database_path.is_none() {
            result.add_warning(ValidationWarning::new(
                "catalog.database_path",
                "Backing store not set, bootstrap will enumerate the REST catalog",
            ));
        }

        Self::check_timeout("catalog.timeout_secs", catalog.timeout_secs, result);
    }

    fn validate_operations(config: &Config, result: &mut ValidationResult) {
        match config.operations.base_url {
            Some(ref url) => Self::check_url("operations.base_url", url, result),
            None => result.add_error(ValidationError::new(
                "operations.base_url",
                "Operation installation service URL is not set",
            )),
        }

        Self::check_timeout(
            "operations.timeout_secs",
            config.operations.timeout_secs,
            result,
        );
    }

    fn validate_notifications(config: &Config, result: &mut ValidationResult) {
        let notifications = &config.notifications;
        if notifications.enabled && notifications.port == 0 {
            result.add_error(ValidationError::new(
                "notifications.port",
                "Port cannot be 0",
            ));
        }

        if notifications.channel_capacity == 0 {
            result.add_error(ValidationError::new(
                "notifications.channel_capacity",
                "channel_capacity must be greater than 0",
            ));
        }
    }

    fn check_url(path: &str, url: &str, result: &mut ValidationResult) {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                path,
                "URL must start with http:// or https://",
            ));
        }
    }

    fn check_timeout(path: &str, secs: u64, result: &mut ValidationResult) {
        if secs == 0 {
            result.add_error(ValidationError::new(path, "Timeout must be greater than 0"));
        } else if secs > LONG_TIMEOUT_SECS {
            result.add_warning(ValidationWarning::new(
                path,
                format!("Timeout of {}s is very long", secs),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
