//! Error types for jmxquery
//!
//! This module defines the error types used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Query 실행 및 응답 처리 에러
#[derive(Error, Debug)]
pub enum QueryError {
    /// Executor가 제한 시간 내에 완료되지 않음
    #[error("Query timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Executor가 실패 상태로 종료됨
    ///
    /// `diagnostic` holds the executor's output exactly as captured.
    #[error("Executor failed{}: {diagnostic}", .status.map(|s| format!(" (exit status {})", s)).unwrap_or_default())]
    ExecutorFailure {
        status: Option<i32>,
        kind: Option<String>,
        diagnostic: String,
    },

    /// Executor 프로세스 실행 실패
    #[error("Failed to launch executor '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 잘못된 JSON
    #[error("JSON parse error: {0}")]
    ParseError(String),

    /// 올바른 JSON이지만 필수 필드 누락 또는 형식 불일치
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// 쿼리 토큰 파싱 실패
    #[error("Invalid query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },
}

impl QueryError {
    /// 스케줄러 수준에서 재시도 가능한 에러인지 확인
    ///
    /// JMX reads are idempotent, so anything caused by the executor run
    /// itself can be retried on the next poll.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueryError::Timeout(_) | QueryError::ExecutorFailure { .. } | QueryError::Launch { .. }
        )
    }

    /// Executor 진단 메시지 추출
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            QueryError::ExecutorFailure { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => QueryError::MalformedResponse(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => {
                QueryError::ParseError(err.to_string())
            }
        }
    }
}

/// Opt-in validation errors
///
/// Construction never validates; these are only produced by explicit
/// `validate()` calls.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Endpoint URI is empty
    #[error("Endpoint URI must not be empty")]
    EmptyEndpoint,

    /// Only one half of the credential pair is set
    #[error("Username and password must be given together")]
    IncompleteCredentials,

    /// Object pattern is empty
    #[error("Object pattern must not be empty")]
    EmptyObjectPattern,

    /// Token contains the batch separator
    #[error("Query token '{0}' contains the batch separator ';'")]
    SeparatorInToken(String),
}

/// Result type alias for query operations
pub type QueryResult<T> = Result<T, QueryError>;
