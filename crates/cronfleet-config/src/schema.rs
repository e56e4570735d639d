//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub instance: InstanceConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub operations: OperationsConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Position of this process in the fleet.
///
/// Fixed at startup. Changing `total` means restarting every instance with
/// the new value at the same time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// 1-based instance number.
    #[serde(default = "default_instance_number")]
    pub number: u32,

    /// Fleet size.
    #[serde(default = "default_total_instances")]
    pub total: u32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            number: default_instance_number(),
            total: default_total_instances(),
        }
    }
}

fn default_instance_number() -> u32 {
    1
}

fn default_total_instances() -> u32 {
    1
}

/// Job catalog access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the REST job catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// SQLite backing store, queried directly at bootstrap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            database_path: None,
            timeout_secs: default_catalog_timeout(),
        }
    }
}

fn default_catalog_timeout() -> u64 {
    10
}

/// Remote operation installation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_operations_timeout")]
    pub timeout_secs: u64,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_operations_timeout(),
        }
    }
}

fn default_operations_timeout() -> u64 {
    30
}

/// Notification ingress and status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Notifications buffered per subscriber before the oldest are dropped.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            host: default_host(),
            port: default_port(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7600
}

fn default_channel_capacity() -> usize {
    1024
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_directory")]
    pub directory: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Rotated log files kept on disk.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            file_prefix: default_file_prefix(),
            max_files: default_max_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "~/.cronfleet/logs".to_string()
}

fn default_file_prefix() -> String {
    "cronfleet".to_string()
}

fn default_max_files() -> usize {
    30
}
