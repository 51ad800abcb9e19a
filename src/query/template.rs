//! ObjectName 파싱 및 템플릿 토큰 치환
//!
//! Metric names and label values may carry `{token}` placeholders that are
//! filled from the matched MBean: `{attribute}`, `{attributeKey}` and any key
//! property of the ObjectName (e.g. `{type}`, `{name}`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{QueryError, QueryResult};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(.+?)\}").expect("invalid template token regex"));

/// MBean ObjectName 구조
///
/// Key properties keep the order in which they appear in the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    /// 도메인 (예: "java.lang")
    pub domain: String,
    /// 속성 목록 (예: [("type", "Memory")])
    pub properties: Vec<(String, String)>,
}

impl ObjectName {
    /// ObjectName 문자열 파싱
    ///
    /// Commas inside double-quoted values do not separate properties, so
    /// `Tomcat:type=DataSource,name="jdbc/a,b"` yields two properties.
    pub fn parse(s: &str) -> QueryResult<Self> {
        let (domain, rest) = s.split_once(':').ok_or_else(|| QueryError::InvalidQuery {
            query: s.to_string(),
            reason: "ObjectName has no domain separator ':'".to_string(),
        })?;

        let properties = split_unquoted(rest, ',')
            .into_iter()
            .filter_map(|prop| {
                prop.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
            })
            .collect();

        Ok(Self {
            domain: domain.to_string(),
            properties,
        })
    }

    /// 속성 값 조회
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 패턴 여부 (와일드카드 포함)
    pub fn is_pattern(&self) -> bool {
        self.domain.contains(['*', '?'])
            || self
                .properties
                .iter()
                .any(|(k, v)| k == "*" || v.contains(['*', '?']))
    }
}

/// Split on `sep` except where it appears between double quotes
pub(crate) fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);

    parts
}

/// Build the token table for one matched metric
///
/// ObjectName properties win over `attribute`/`attributeKey` when a bean
/// happens to define a property with the same name.
pub fn token_table(
    object_name: &str,
    attribute: Option<&str>,
    attribute_key: Option<&str>,
) -> HashMap<String, String> {
    let mut table = HashMap::new();

    if let Some(attribute) = attribute {
        table.insert("attribute".to_string(), attribute.to_string());
    }
    if let Some(key) = attribute_key {
        table.insert("attributeKey".to_string(), key.to_string());
    }
    if let Ok(name) = ObjectName::parse(object_name) {
        for (k, v) in name.properties {
            table.insert(k, v);
        }
    }

    table
}

/// Replace `{token}` placeholders in `text`
///
/// Unknown tokens are left as written. The rendered text has double quotes
/// removed and spaces replaced with `_`.
pub fn replace_tokens(text: &str, tokens: &HashMap<String, String>) -> String {
    let replaced = TOKEN_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        tokens
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });

    replaced.replace('"', "").replace(' ', "_")
}

/// Whether `text` contains at least one `{token}`
pub fn has_tokens(text: &str) -> bool {
    TOKEN_RE.is_match(text)
}
