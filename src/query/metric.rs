//! Metric query and result model
//!
//! A [`MetricQuery`] describes one MBean attribute (or wildcard pattern) to
//! fetch. The executor answers with [`MetricResult`] rows carrying the same
//! identity plus the value and its type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::labels::Labels;
use super::template::{has_tokens, replace_tokens, split_unquoted, token_table};
use crate::error::{QueryError, QueryResult, ValidationError};

/// Single MBean attribute query
///
/// Built once and never changed afterwards; the `with_*` methods consume the
/// query and return the updated value.
///
/// # Example
///
/// ```
/// use jmxquery::query::MetricQuery;
///
/// let query = MetricQuery::new("java.lang:type=Memory")
///     .with_attribute("HeapMemoryUsage")
///     .with_attribute_key("used")
///     .with_metric_name("jvm_heap_{attributeKey}")
///     .with_label("area", "heap");
///
/// assert_eq!(
///     query.to_query_token(),
///     "jvm_heap_{attributeKey}<area = heap>==java.lang:type=Memory/HeapMemoryUsage/used"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    object_pattern: String,
    attribute: Option<String>,
    attribute_key: Option<String>,
    metric_name: Option<String>,
    metric_labels: Labels,
}

impl MetricQuery {
    /// Create a query for an ObjectName or ObjectName pattern
    ///
    /// The pattern is not validated; see [`MetricQuery::validate`].
    pub fn new(object_pattern: impl Into<String>) -> Self {
        Self {
            object_pattern: object_pattern.into(),
            attribute: None,
            attribute_key: None,
            metric_name: None,
            metric_labels: Labels::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_attribute_key(mut self, attribute_key: impl Into<String>) -> Self {
        self.attribute_key = Some(attribute_key.into());
        self
    }

    /// Set the metric name template
    pub fn with_metric_name(mut self, metric_name: impl Into<String>) -> Self {
        self.metric_name = Some(metric_name.into());
        self
    }

    /// Append a label (templated values allowed)
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metric_labels.insert(key, value);
        self
    }

    /// Replace all labels
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.metric_labels = labels;
        self
    }

    pub fn object_pattern(&self) -> &str {
        &self.object_pattern
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn attribute_key(&self) -> Option<&str> {
        self.attribute_key.as_deref()
    }

    pub fn metric_name(&self) -> Option<&str> {
        self.metric_name.as_deref()
    }

    pub fn metric_labels(&self) -> &Labels {
        &self.metric_labels
    }

    /// Wire token for this query
    ///
    /// `metricName<k = v,...>==objectPattern/attribute/attributeKey`, with
    /// each part present only when set.
    pub fn to_query_token(&self) -> String {
        let mut token = String::new();

        if let Some(metric_name) = &self.metric_name {
            token.push_str(metric_name);
            if !self.metric_labels.is_empty() {
                token.push('<');
                token.push_str(&self.metric_labels.render(" = ", ","));
                token.push('>');
            }
            token.push_str("==");
        }

        token.push_str(&self.object_pattern);
        push_path(&mut token, self.attribute(), self.attribute_key());

        token
    }

    /// Human-readable identity for logs
    ///
    /// Queries carry no value, so only the name (or path) part is rendered.
    pub fn to_display_string(&self) -> String {
        display_identity(
            self.metric_name(),
            &self.metric_labels,
            &self.object_pattern,
            self.attribute(),
            self.attribute_key(),
        )
    }

    /// Parse a single query token
    ///
    /// Accepts `{metricName}<{labels}>=={mBeanName}/{attribute}/{attributeKey}`
    /// where the name prefix is optional. Label pairs may use `=` or ` = `.
    pub fn parse(token: &str) -> QueryResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid(token, "empty query"));
        }

        let (prefix, path) = match token.find("==") {
            Some(pos) if pos > 0 => (Some(&token[..pos]), &token[pos + 2..]),
            _ => (None, token),
        };

        let mut query = parse_path(path);

        if let Some(prefix) = prefix {
            match prefix.find('<').filter(|pos| *pos > 0) {
                Some(pos) => {
                    query.metric_name = Some(prefix[..pos].to_string());
                    let labels_part = prefix[pos + 1..].trim_end_matches('>');
                    if !labels_part.is_empty() {
                        for label in split_unquoted(labels_part, ',') {
                            let (key, value) = label.split_once('=').ok_or_else(|| {
                                invalid(token, &format!("label '{}' has no '='", label))
                            })?;
                            query.metric_labels.insert(key.trim(), value.trim());
                        }
                    }
                }
                None => query.metric_name = Some(prefix.to_string()),
            }
        }

        Ok(query)
    }

    /// Parse a `;` separated batch, skipping empty tokens
    pub fn parse_batch(batch: &str) -> QueryResult<Vec<Self>> {
        batch
            .split(';')
            .filter(|token| !token.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Opt-in validation
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.object_pattern.trim().is_empty() {
            return Err(ValidationError::EmptyObjectPattern);
        }

        let token = self.to_query_token();
        if token.contains(';') {
            return Err(ValidationError::SeparatorInToken(token));
        }

        Ok(())
    }
}

impl fmt::Display for MetricQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

fn invalid(token: &str, reason: &str) -> QueryError {
    QueryError::InvalidQuery {
        query: token.to_string(),
        reason: reason.to_string(),
    }
}

/// Split `domain:props/attribute/key`, ignoring `/` inside quoted values and
/// in all but the last property
fn parse_path(path: &str) -> MetricQuery {
    let (domain, properties) = match path.find(':') {
        Some(pos) => path.split_at(pos + 1),
        None => ("", path),
    };

    let mut segments = split_unquoted(properties, ',');
    let last = segments.pop().unwrap_or_default();
    let mut parts = split_unquoted(last, '/').into_iter();

    let mut object_pattern = domain.to_string();
    for segment in segments {
        object_pattern.push_str(segment);
        object_pattern.push(',');
    }
    object_pattern.push_str(parts.next().unwrap_or_default());

    let mut query = MetricQuery::new(object_pattern);
    query.attribute = parts.next().filter(|s| !s.is_empty()).map(String::from);
    query.attribute_key = parts.next().filter(|s| !s.is_empty()).map(String::from);
    query
}

fn push_path(out: &mut String, attribute: Option<&str>, attribute_key: Option<&str>) {
    if let Some(attribute) = attribute {
        out.push('/');
        out.push_str(attribute);
    }
    if let Some(key) = attribute_key {
        out.push('/');
        out.push_str(key);
    }
}

fn display_identity(
    metric_name: Option<&str>,
    labels: &Labels,
    object_name: &str,
    attribute: Option<&str>,
    attribute_key: Option<&str>,
) -> String {
    match metric_name {
        Some(name) if labels.is_empty() => name.to_string(),
        Some(name) => format!("{} {{{}}}", name, labels.render(" = ", ", ")),
        None => {
            let mut out = object_name.to_string();
            push_path(&mut out, attribute, attribute_key);
            out
        }
    }
}

/// Attribute value as reported by the executor
///
/// Numbers keep their JSON representation so large `long` counters are not
/// rounded through `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// 불리언 값
    Boolean(bool),
    /// 숫자 값
    Number(serde_json::Number),
    /// 문자열 값
    Text(String),
    /// 배열 또는 객체
    Structured(serde_json::Value),
}

impl MetricValue {
    /// 숫자로 변환 시도
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => n.as_f64(),
            MetricValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 문자열 값 참조
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Boolean(b) => write!(f, "{}", b),
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Structured(v) => write!(f, "{}", v),
        }
    }
}

/// Value classification
///
/// `counter` and `gauge` are recognised case-insensitively; anything else is
/// kept as the executor's attribute type (e.g. `Long`, `CompositeData`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// Monotonically increasing value
    Counter,
    /// Value that can go up and down
    Gauge,
    /// Raw attribute type name
    Attribute(String),
}

impl ValueType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "counter" => ValueType::Counter,
            "gauge" => ValueType::Gauge,
            _ => ValueType::Attribute(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ValueType::Counter => "counter",
            ValueType::Gauge => "gauge",
            ValueType::Attribute(s) => s,
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ValueType::parse(&s))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded metric row
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    /// Concrete ObjectName of the matched MBean
    pub object_name: String,
    pub attribute: String,
    pub attribute_key: Option<String>,
    pub metric_name: Option<String>,
    pub metric_labels: Labels,
    pub value: Option<MetricValue>,
    pub value_type: ValueType,
}

impl MetricResult {
    /// Query that addresses exactly this row
    pub fn to_query(&self) -> MetricQuery {
        MetricQuery {
            object_pattern: self.object_name.clone(),
            attribute: Some(self.attribute.clone()),
            attribute_key: self.attribute_key.clone(),
            metric_name: self.metric_name.clone(),
            metric_labels: self.metric_labels.clone(),
        }
    }

    pub fn to_query_token(&self) -> String {
        self.to_query().to_query_token()
    }

    /// `name {k = v, ...} = value ( type )` or `object/attribute/key = value ( type )`
    ///
    /// An unset value renders as `null`.
    pub fn to_display_string(&self) -> String {
        let identity = display_identity(
            self.metric_name.as_deref(),
            &self.metric_labels,
            &self.object_name,
            Some(&self.attribute),
            self.attribute_key.as_deref(),
        );
        let value = self
            .value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "null".to_string());

        format!("{} = {} ( {} )", identity, value, self.value_type)
    }

    /// Copy with `{token}` placeholders in the name and labels filled in
    ///
    /// The executor normally resolves tokens itself; this covers results that
    /// still carry templates.
    pub fn resolved(&self) -> MetricResult {
        let Some(metric_name) = &self.metric_name else {
            return self.clone();
        };

        let tokens = token_table(
            &self.object_name,
            Some(&self.attribute),
            self.attribute_key.as_deref(),
        );

        MetricResult {
            metric_name: Some(replace_tokens(metric_name, &tokens)),
            metric_labels: self.metric_labels.map_values(|v| {
                if has_tokens(v) {
                    replace_tokens(v, &tokens)
                } else {
                    v.to_string()
                }
            }),
            ..self.clone()
        }
    }
}

impl fmt::Display for MetricResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}
