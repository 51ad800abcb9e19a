//! Configuration management for jmxquery
//!
//! Loads a connection and a list of queries from a YAML file:
//!
//! ```yaml
//! connection:
//!   url: service:jmx:rmi:///jndi/rmi://kafka-1:9999/jmxrmi
//!   username: monitor
//!   password: secret
//!   java_path: /usr/lib/jvm/java-17/bin/java
//!   timeout_secs: 5
//! queries:
//!   - object_pattern: kafka.server:type=BrokerTopicMetrics,name=*
//!     attribute: Count
//!     metric_name: kafka_server_{name}_total
//!     metric_labels:
//!       broker: kafka-1
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::connection::{
    ManagementConnection, ProcessExecutor, DEFAULT_JAR_PATH, DEFAULT_RUNTIME_PATH,
};
use crate::query::{Labels, MetricQuery};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// JMX endpoint configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Queries to run on every poll
    #[serde(default)]
    pub queries: Vec<QueryConfig>,
}

/// JMX endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// JMX service URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Optional JMX username
    pub username: Option<String>,

    /// Optional JMX password
    pub password: Option<String>,

    /// Runtime used to launch the executor
    #[serde(default = "default_java_path")]
    pub java_path: PathBuf,

    /// Executor jar
    #[serde(default = "default_jar_path")]
    pub jar_path: PathBuf,

    /// Per-query timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// One configured query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// ObjectName or pattern
    #[serde(alias = "mbean")]
    pub object_pattern: String,

    pub attribute: Option<String>,

    pub attribute_key: Option<String>,

    /// Metric name template
    pub metric_name: Option<String>,

    /// Label templates, kept in file order
    #[serde(default)]
    pub metric_labels: Labels,
}

// Default value functions
fn default_url() -> String {
    "service:jmx:rmi:///jndi/rmi://localhost:9999/jmxrmi".to_string()
}

fn default_java_path() -> PathBuf {
    PathBuf::from(DEFAULT_RUNTIME_PATH)
}

fn default_jar_path() -> PathBuf {
    PathBuf::from(DEFAULT_JAR_PATH)
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            java_path: default_java_path(),
            jar_path: default_jar_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConnectionConfig {
    /// Build a connection that launches the configured executor jar
    pub fn connect(&self) -> ManagementConnection {
        let executor = ProcessExecutor::new(&self.java_path).with_jar(&self.jar_path);

        ManagementConnection::new(&self.url)
            .with_optional_credentials(self.username.clone(), self.password.clone())
            .with_default_timeout(Duration::from_secs(self.timeout_secs))
            .with_executor(executor)
    }
}

impl QueryConfig {
    pub fn to_query(&self) -> MetricQuery {
        let mut query = MetricQuery::new(&self.object_pattern).with_labels(self.metric_labels.clone());

        if let Some(attribute) = &self.attribute {
            query = query.with_attribute(attribute);
        }
        if let Some(key) = &self.attribute_key {
            query = query.with_attribute_key(key);
        }
        if let Some(name) = &self.metric_name {
            query = query.with_metric_name(name);
        }

        query
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Configured queries in file order
    pub fn queries(&self) -> Vec<MetricQuery> {
        self.queries.iter().map(QueryConfig::to_query).collect()
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Connection url must not be empty".to_string(),
            ));
        }

        if self.connection.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        for (index, query) in self.queries.iter().enumerate() {
            query.to_query().validate().map_err(|e| {
                ConfigError::ValidationError(format!("Query at index {}: {}", index, e))
            })?;
        }

        Ok(())
    }
}
