//! Declarative request validation.
//!
//! # Design
//! A `RuleSet` is an ordered list of `(field, rules)` pairs. Rules for one
//! field run in order and stop at the first failure; every field is checked
//! independently so a report lists each failing field once. Blank values
//! (absent, null, whitespace) are only seen by `required`; every other rule
//! skips them, which lets optional fields carry type rules.
//!
//! `Schema` bundles a rule set (or two, picked by a predicate) with custom
//! messages and is what resource operations hand to the dispatcher.

mod messages;
mod rule;

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value};

pub use messages::CustomMessages;
pub use rule::{parse_rules, Rule, RuleParseError};

/// Request parameters, keyed by field name.
pub type Payload = Map<String, Value>;

/// Field name → messages, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|messages| messages.first()).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(field, messages)| {
                    (field.clone(), Value::Array(messages.iter().cloned().map(Value::String).collect()))
                })
                .collect(),
        )
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    fn push(&mut self, field: &str, message: String) {
        self.0.entry(field.to_owned()).or_default().push(message);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for messages in self.0.values() {
            for message in messages {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationErrors),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(errors) => Err(errors),
        }
    }
}

/// Ordered field rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rules for `name`; repeated names extend the existing list.
    pub fn field<I>(mut self, name: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = Rule>,
    {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => existing.extend(rules),
            None => self.fields.push((name, rules.into_iter().collect())),
        }
        self
    }

    /// Build from `(field, "rule|rule:param")` pairs.
    pub fn parse<'a, I>(pairs: I) -> Result<Self, RuleParseError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .try_fold(RuleSet::new(), |set, (field, list)| Ok(set.field(field, parse_rules(list)?)))
    }

    pub fn rules(&self, field: &str) -> Option<&[Rule]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rules)| rules.as_slice())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.fields.iter().map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }
}

/// Check `payload` against `rules`.
pub fn validate(payload: &Payload, rules: &RuleSet, messages: &CustomMessages) -> ValidationResult {
    let mut errors = ValidationErrors::default();

    for (field, field_rules) in rules.iter() {
        let value = lookup(payload, field);
        let numeric_field = field_rules.contains(&Rule::Numeric);
        let missing = rule::is_missing(value);

        for rule in field_rules {
            let passed = match rule {
                Rule::Bail => true,
                Rule::Nullable if missing => break,
                Rule::Nullable => true,
                Rule::Required => !rule::is_empty(value),
                _ if missing => continue,
                _ => value.is_some_and(|v| rule.check(v, numeric_field)),
            };
            if !passed {
                errors.push(field, messages.render(field, rule, value, numeric_field));
                break;
            }
        }
    }

    if errors.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(errors)
    }
}

/// Resolve `field` in `payload`, following dots into nested objects when the
/// literal key is absent.
pub fn lookup<'a>(payload: &'a Payload, field: &str) -> Option<&'a Value> {
    if let Some(value) = payload.get(field) {
        return Some(value);
    }
    let mut parts = field.split('.');
    let mut current = payload.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// True when every field in `fields` is present and not blank.
pub fn all_present(payload: &Payload, fields: &[&str]) -> bool {
    fields.iter().all(|field| !rule::is_missing(lookup(payload, field)))
}

/// Something that can judge a payload.
pub trait Validator {
    fn validate(&self, payload: &Payload) -> ValidationResult;
}

impl Validator for RuleSet {
    fn validate(&self, payload: &Payload) -> ValidationResult {
        validate(payload, self, &CustomMessages::default())
    }
}

type Predicate = Box<dyn Fn(&Payload) -> bool + Send + Sync>;

enum Rules {
    Fixed(RuleSet),
    Conditional {
        predicate: Predicate,
        when_true: RuleSet,
        when_false: RuleSet,
    },
}

/// Rules plus messages for one operation.
pub struct Schema {
    rules: Rules,
    messages: CustomMessages,
}

impl Schema {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules: Rules::Fixed(rules), messages: CustomMessages::default() }
    }

    /// No rules at all; every payload is valid.
    pub fn none() -> Self {
        Self::new(RuleSet::new())
    }

    /// Pick `when_true` or `when_false` by running `predicate` once per payload.
    pub fn conditional<P>(predicate: P, when_true: RuleSet, when_false: RuleSet) -> Self
    where
        P: Fn(&Payload) -> bool + Send + Sync + 'static,
    {
        Self {
            rules: Rules::Conditional { predicate: Box::new(predicate), when_true, when_false },
            messages: CustomMessages::default(),
        }
    }

    pub fn with_messages(mut self, messages: CustomMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages = self.messages.with(key, template);
        self
    }

    /// The rule set that applies to `payload`.
    pub fn select(&self, payload: &Payload) -> &RuleSet {
        match &self.rules {
            Rules::Fixed(rules) => rules,
            Rules::Conditional { predicate, when_true, when_false } => {
                if predicate(payload) {
                    when_true
                } else {
                    when_false
                }
            }
        }
    }
}

impl Validator for Schema {
    fn validate(&self, payload: &Payload) -> ValidationResult {
        validate(payload, self.select(payload), &self.messages)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Schema");
        match &self.rules {
            Rules::Fixed(rules) => s.field("rules", rules),
            Rules::Conditional { when_true, when_false, .. } => {
                s.field("when_true", when_true).field("when_false", when_false)
            }
        };
        s.field("messages", &self.messages).finish()
    }
}
