//! JMX 엔드포인트 연결
//!
//! [`ManagementConnection`] holds the endpoint configuration and runs query
//! batches through a [`QueryExecutor`]. It has no mutable state, so a single
//! instance can be shared (e.g. in an `Arc`) by any number of concurrent polls.
//!
//! # Example
//!
//! ```ignore
//! use jmxquery::connection::ManagementConnection;
//! use jmxquery::query::MetricQuery;
//!
//! let connection = ManagementConnection::new("service:jmx:rmi:///jndi/rmi://localhost:9999/jmxrmi")
//!     .with_credentials("monitor", "secret");
//! let results = connection
//!     .query(&[MetricQuery::new("kafka.server:type=*,name=*PerSec").with_attribute("Count")])
//!     .await?;
//! ```

mod executor;

pub use executor::{
    ExecutorRequest, ProcessExecutor, QueryExecutor, DEFAULT_JAR_PATH, DEFAULT_RUNTIME_PATH,
};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{QueryResult, ValidationError};
use crate::query::{decode_response, encode_batch, MetricQuery, MetricResult};

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection to one JMX endpoint
#[derive(Clone)]
pub struct ManagementConnection {
    endpoint_uri: String,
    username: Option<String>,
    password: Option<String>,
    default_timeout: Duration,
    executor: Arc<dyn QueryExecutor>,
}

impl ManagementConnection {
    /// 새 연결 생성
    ///
    /// Nothing is validated here; an inconsistent configuration surfaces as an
    /// executor failure at query time, or up front via [`Self::validate`].
    pub fn new(endpoint_uri: impl Into<String>) -> Self {
        Self {
            endpoint_uri: endpoint_uri.into(),
            username: None,
            password: None,
            default_timeout: DEFAULT_TIMEOUT,
            executor: Arc::new(ProcessExecutor::default()),
        }
    }

    /// JMX 인증 정보 설정
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set username and password independently, as given
    pub fn with_optional_credentials(
        mut self,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Launch the default executor jar with a specific runtime
    ///
    /// Replaces any executor configured earlier.
    pub fn with_runtime_path(self, runtime_path: impl Into<PathBuf>) -> Self {
        self.with_executor(ProcessExecutor::new(runtime_path))
    }

    pub fn with_executor(mut self, executor: impl QueryExecutor + 'static) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn endpoint_uri(&self) -> &str {
        &self.endpoint_uri
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn executor(&self) -> &dyn QueryExecutor {
        self.executor.as_ref()
    }

    /// Opt-in configuration check
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint_uri.trim().is_empty() {
            return Err(ValidationError::EmptyEndpoint);
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(ValidationError::IncompleteCredentials);
        }
        Ok(())
    }

    /// Run a query batch with the default timeout
    pub async fn query(&self, queries: &[MetricQuery]) -> QueryResult<Vec<MetricResult>> {
        self.query_with_timeout(queries, self.default_timeout).await
    }

    /// Run a query batch
    ///
    /// One executor invocation per call. The call fails as a whole on
    /// timeout, executor failure or an undecodable response; it is never
    /// retried here.
    #[instrument(skip(self, queries), fields(endpoint = %self.endpoint_uri, queries = queries.len()))]
    pub async fn query_with_timeout(
        &self,
        queries: &[MetricQuery],
        timeout: Duration,
    ) -> QueryResult<Vec<MetricResult>> {
        if queries.is_empty() {
            debug!("Empty query batch, skipping executor");
            return Ok(vec![]);
        }

        let batch = encode_batch(queries);
        let request = ExecutorRequest {
            endpoint_uri: &self.endpoint_uri,
            username: self.username.as_deref(),
            password: self.password.as_deref(),
            batch: &batch,
        };

        debug!(batch = %batch, "Sending query batch to executor");

        let output = self.executor.execute(&request, timeout).await?;
        let results = decode_response(&output)?;

        debug!(results = results.len(), "Query batch completed");
        Ok(results)
    }
}

impl fmt::Debug for ManagementConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagementConnection")
            .field("endpoint_uri", &self.endpoint_uri)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("default_timeout", &self.default_timeout)
            .field("executor", &self.executor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requests and answers with a fixed response
    #[derive(Debug)]
    struct FixedExecutor {
        response: QueryResult<String>,
        seen: Mutex<Vec<(String, Option<String>, String, Duration)>>,
    }

    impl FixedExecutor {
        fn ok(json: &str) -> Self {
            Self {
                response: Ok(json.to_string()),
                seen: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for FixedExecutor {
        async fn execute(
            &self,
            request: &ExecutorRequest<'_>,
            timeout: Duration,
        ) -> QueryResult<String> {
            self.seen.lock().unwrap().push((
                request.endpoint_uri.to_string(),
                request.username.map(String::from),
                request.batch.to_string(),
                timeout,
            ));
            match &self.response {
                Ok(json) => Ok(json.clone()),
                Err(_) => Err(QueryError::Timeout(timeout)),
            }
        }
    }

    const URI: &str = "service:jmx:rmi:///jndi/rmi://localhost:9999/jmxrmi";

    #[test]
    fn test_defaults() {
        let connection = ManagementConnection::new(URI);
        assert_eq!(connection.endpoint_uri(), URI);
        assert_eq!(connection.default_timeout(), Duration::from_secs(10));
        assert_eq!(connection.username(), None);
        assert!(connection.validate().is_ok());
    }

    #[test]
    fn test_validate_is_opt_in() {
        let connection = ManagementConnection::new("")
            .with_optional_credentials(Some("admin".to_string()), None);
        assert_eq!(connection.validate(), Err(ValidationError::EmptyEndpoint));

        let connection =
            ManagementConnection::new(URI).with_optional_credentials(Some("admin".to_string()), None);
        assert_eq!(
            connection.validate(),
            Err(ValidationError::IncompleteCredentials)
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let connection = ManagementConnection::new(URI).with_credentials("admin", "secret");
        let debug = format!("{:?}", connection);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_query_encodes_and_decodes() {
        let executor = Arc::new(FixedExecutor::ok(
            r#"[{"mBeanName":"java.lang:type=Threading","attribute":"ThreadCount","attributeType":"Integer","value":17}]"#,
        ));
        let connection = ManagementConnection {
            executor: executor.clone(),
            ..ManagementConnection::new(URI).with_credentials("admin", "secret")
        };

        let queries = [
            MetricQuery::new("java.lang:type=Threading").with_attribute("ThreadCount"),
            MetricQuery::new("java.lang:type=Runtime").with_attribute("Uptime"),
        ];
        let results = tokio_test::block_on(connection.query(&queries)).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value.as_ref().and_then(|v| v.as_f64()), Some(17.0));

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, URI);
        assert_eq!(seen[0].1.as_deref(), Some("admin"));
        assert_eq!(
            seen[0].2,
            "java.lang:type=Threading/ThreadCount;java.lang:type=Runtime/Uptime;"
        );
        assert_eq!(seen[0].3, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_explicit_timeout_is_passed_through() {
        let executor = Arc::new(FixedExecutor::ok("[]"));
        let connection = ManagementConnection {
            executor: executor.clone(),
            ..ManagementConnection::new(URI)
        };

        let results = tokio_test::block_on(
            connection.query_with_timeout(&[MetricQuery::new("*:*")], Duration::from_secs(3)),
        )
        .unwrap();

        assert!(results.is_empty());
        assert_eq!(executor.seen.lock().unwrap()[0].3, Duration::from_secs(3));
    }

    #[test]
    fn test_empty_batch_skips_executor() {
        let executor = Arc::new(FixedExecutor::ok("not json"));
        let connection = ManagementConnection {
            executor: executor.clone(),
            ..ManagementConnection::new(URI)
        };

        let results = tokio_test::block_on(connection.query(&[])).unwrap();
        assert!(results.is_empty());
        assert!(executor.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_decoder_errors_propagate() {
        let connection = ManagementConnection::new(URI)
            .with_executor(FixedExecutor::ok(r#"[{"attribute":"x"}]"#));
        let err = tokio_test::block_on(connection.query(&[MetricQuery::new("a:b=c")])).unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse(_)));

        let connection =
            ManagementConnection::new(URI).with_executor(FixedExecutor::ok("{not json"));
        let err = tokio_test::block_on(connection.query(&[MetricQuery::new("a:b=c")])).unwrap_err();
        assert!(matches!(err, QueryError::ParseError(_)));
    }

    #[test]
    fn test_executor_errors_propagate() {
        let connection = ManagementConnection::new(URI).with_executor(FixedExecutor {
            response: Err(QueryError::Timeout(Duration::ZERO)),
            seen: Mutex::new(vec![]),
        });
        let err = tokio_test::block_on(
            connection.query_with_timeout(&[MetricQuery::new("a:b=c")], Duration::from_millis(5)),
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::Timeout(d) if d == Duration::from_millis(5)));
    }
}
