use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

/// A single validation rule applied to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Accepted for compatibility; every field already stops at its first failure.
    Bail,
    Required,
    Nullable,
    String,
    Numeric,
    Boolean,
    Array,
    Email,
    Size(usize),
    StartsWith(Vec<String>),
    In(Vec<String>),
    Date,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("unknown rule {0:?}")]
    Unknown(String),
    #[error("rule {rule} needs a parameter")]
    MissingParameter { rule: String },
    #[error("invalid parameter {param:?} for rule {rule}")]
    InvalidParameter { rule: String, param: String },
}

impl Rule {
    /// Short name used as the key suffix for custom messages (`field.name`).
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Bail => "bail",
            Rule::Required => "required",
            Rule::Nullable => "nullable",
            Rule::String => "string",
            Rule::Numeric => "numeric",
            Rule::Boolean => "boolean",
            Rule::Array => "array",
            Rule::Email => "email",
            Rule::Size(_) => "size",
            Rule::StartsWith(_) => "starts_with",
            Rule::In(_) => "in",
            Rule::Date => "date",
        }
    }

    pub fn one_of<I, S>(values: I) -> Rule
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::In(values.into_iter().map(Into::into).collect())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Rule {
        Rule::StartsWith(vec![prefix.into()])
    }

    /// Check a present, non-blank value. `numeric_field` is set when the same
    /// field also carries `Rule::Numeric`, which makes `size` compare values.
    pub(crate) fn check(&self, value: &Value, numeric_field: bool) -> bool {
        match self {
            Rule::Bail | Rule::Nullable => true,
            Rule::Required => !is_empty(Some(value)),
            Rule::String => value.is_string(),
            Rule::Numeric => is_numeric(value),
            Rule::Boolean => is_boolean(value),
            Rule::Array => value.is_array() || value.is_object(),
            Rule::Email => value.as_str().is_some_and(is_email),
            Rule::Size(size) => has_size(value, *size, numeric_field),
            Rule::StartsWith(prefixes) => scalar_string(value)
                .is_some_and(|s| prefixes.iter().any(|prefix| s.starts_with(prefix.as_str()))),
            Rule::In(allowed) => {
                scalar_string(value).is_some_and(|s| allowed.iter().any(|candidate| *candidate == s))
            }
            Rule::Date => value.as_str().is_some_and(is_date),
        }
    }
}

impl FromStr for Rule {
    type Err = RuleParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let (name, param) = match token.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (token, None),
        };

        let list = |param: Option<&str>| -> Result<Vec<String>, RuleParseError> {
            let param = param.ok_or_else(|| RuleParseError::MissingParameter { rule: name.to_owned() })?;
            let param = param.trim().trim_start_matches('{').trim_end_matches('}');
            let values: Vec<String> = param
                .split(',')
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return Err(RuleParseError::MissingParameter { rule: name.to_owned() });
            }
            Ok(values)
        };

        let rule = match name {
            "bail" => Rule::Bail,
            "required" => Rule::Required,
            "nullable" => Rule::Nullable,
            "string" => Rule::String,
            "numeric" => Rule::Numeric,
            "boolean" => Rule::Boolean,
            "array" => Rule::Array,
            "email" => Rule::Email,
            "date" => Rule::Date,
            "size" => {
                let param = param.ok_or_else(|| RuleParseError::MissingParameter { rule: name.to_owned() })?;
                let size = param.trim().parse().map_err(|_| RuleParseError::InvalidParameter {
                    rule: name.to_owned(),
                    param: param.to_owned(),
                })?;
                Rule::Size(size)
            }
            "starts_with" | "starts-with" | "start_with" => Rule::StartsWith(list(param)?),
            "in" | "one_of" | "one-of" => Rule::In(list(param)?),
            other => return Err(RuleParseError::Unknown(other.to_owned())),
        };
        Ok(rule)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Size(size) => write!(f, "size:{size}"),
            Rule::StartsWith(values) | Rule::In(values) => write!(f, "{}:{}", self.name(), values.join(",")),
            other => f.write_str(other.name()),
        }
    }
}

/// Parse a `|`-separated rule list such as `"bail|required|size:3"`.
pub fn parse_rules(list: &str) -> Result<Vec<Rule>, RuleParseError> {
    list.split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}

/// Absent, null, or a string of whitespace.
pub(crate) fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// What `required` rejects: missing values plus empty collections.
pub(crate) fn is_empty(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        other => is_missing(other),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E');
    if s.is_empty() || !s.chars().all(allowed) || !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => parse_numeric(s).is_some(),
        _ => false,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_u64(), Some(0 | 1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1" | "true" | "false"),
        _ => false,
    }
}

fn has_size(value: &Value, size: usize, numeric_field: bool) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(size as f64),
        Value::String(s) if numeric_field => parse_numeric(s) == Some(size as f64),
        Value::String(s) => s.chars().count() == size,
        Value::Array(items) => items.len() == size,
        Value::Object(map) => map.len() == size,
        _ => false,
    }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || local.len() > 64
        || domain.contains('@')
        || s.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let label_ok = |label: &&str| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    };
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic));
    labels.iter().all(label_ok) && tld_ok
}

fn is_date(s: &str) -> bool {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
}
