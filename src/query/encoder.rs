//! Query batch 인코더
//!
//! Joins query tokens into the `;`-terminated batch passed to the executor
//! with `-q`.

use super::metric::MetricQuery;

/// Batch separator; every token is followed by it, including the last
pub const BATCH_SEPARATOR: char = ';';

/// Encode queries into one batch string, preserving input order
///
/// An empty slice encodes to an empty string.
pub fn encode_batch(queries: &[MetricQuery]) -> String {
    let mut batch = String::new();
    for query in queries {
        batch.push_str(&query.to_query_token());
        batch.push(BATCH_SEPARATOR);
    }
    batch
}
