//! jmxquery library
//!
//! This crate queries JMX MBean attributes from a running JVM through an
//! external query executor and decodes the results into typed metric rows.
//!
//! ```ignore
//! use jmxquery::{ManagementConnection, MetricQuery};
//!
//! let connection = ManagementConnection::new("service:jmx:rmi:///jndi/rmi://localhost:9999/jmxrmi");
//! for metric in connection.query(&jmxquery::query::presets::jvm_queries()).await? {
//!     println!("{}", metric);
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod query;

pub use connection::{ManagementConnection, ProcessExecutor, QueryExecutor};
pub use error::{QueryError, QueryResult};
pub use query::{MetricQuery, MetricResult};

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Initialize JSON-formatted logging for log shippers
///
/// # Errors
/// Returns an error if a global subscriber is already installed
pub fn init_json_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
