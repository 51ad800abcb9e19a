//! Executor JSON 응답 파서
//!
//! The executor prints a JSON array with one object per matched attribute:
//!
//! ```text
//! [{"mBeanName": "java.lang:type=Memory", "attribute": "HeapMemoryUsage",
//!   "attributeKey": "used", "attributeType": "Long", "value": 52428800}]
//! ```
//!
//! `mBeanName`, `attribute` and `attributeType` are required. A missing or
//! `null` optional field decodes to unset.

use serde::Deserialize;

use super::labels::Labels;
use super::metric::{MetricResult, MetricValue, ValueType};
use crate::error::QueryResult;

/// 내부 파싱용 구조체
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetric {
    #[serde(rename = "mBeanName")]
    mbean_name: String,
    attribute: String,
    attribute_type: ValueType,
    #[serde(default)]
    attribute_key: Option<String>,
    #[serde(default)]
    value: Option<MetricValue>,
    #[serde(default)]
    metric_name: Option<String>,
    #[serde(default)]
    metric_labels: Option<Labels>,
}

impl From<RawMetric> for MetricResult {
    fn from(raw: RawMetric) -> Self {
        MetricResult {
            object_name: raw.mbean_name,
            attribute: raw.attribute,
            attribute_key: raw.attribute_key,
            metric_name: raw.metric_name,
            metric_labels: raw.metric_labels.unwrap_or_default(),
            value: raw.value,
            value_type: raw.attribute_type,
        }
    }
}

/// Decode the executor's JSON array
///
/// Invalid JSON is a [`QueryError::ParseError`](crate::error::QueryError::ParseError);
/// valid JSON of the wrong shape, including a missing required field, is a
/// [`QueryError::MalformedResponse`](crate::error::QueryError::MalformedResponse).
/// Row order follows the array.
pub fn decode_response(json: &str) -> QueryResult<Vec<MetricResult>> {
    let raw: Vec<RawMetric> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(MetricResult::from).collect())
}
