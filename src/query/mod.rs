//! JMX 메트릭 쿼리 모델 및 프로토콜 코덱
//!
//! Builds query tokens for the executor, encodes them into a batch and
//! decodes the JSON rows that come back.
//!
//! # Example
//!
//! ```
//! use jmxquery::query::{decode_response, encode_batch, MetricQuery};
//!
//! let queries = vec![
//!     MetricQuery::new("java.lang:type=Threading").with_attribute("ThreadCount"),
//! ];
//! assert_eq!(encode_batch(&queries), "java.lang:type=Threading/ThreadCount;");
//!
//! let results = decode_response(
//!     r#"[{"mBeanName":"java.lang:type=Threading","attribute":"ThreadCount","attributeType":"Integer","value":42}]"#,
//! )
//! .unwrap();
//! assert_eq!(results[0].to_display_string(), "java.lang:type=Threading/ThreadCount = 42 ( Integer )");
//! ```

mod decoder;
mod encoder;
mod labels;
mod metric;
pub mod presets;
mod template;

pub use decoder::decode_response;
pub use encoder::{encode_batch, BATCH_SEPARATOR};
pub use labels::Labels;
pub use metric::{MetricQuery, MetricResult, MetricValue, ValueType};
pub use template::{has_tokens, replace_tokens, token_table, ObjectName};
