use std::collections::HashMap;

use serde_json::Value;

use super::rule::Rule;

/// Per-field, per-rule message overrides keyed by `"field.rule"`.
///
/// Templates may use `:attribute`, `:size` and `:values`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomMessages {
    templates: HashMap<String, String>,
}

impl CustomMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn lookup(&self, field: &str, rule: &Rule) -> Option<&str> {
        let by_name = self.templates.get(&format!("{field}.{}", rule.name()));
        let by_alias = || match rule {
            Rule::In(_) => self.templates.get(&format!("{field}.one_of")),
            _ => None,
        };
        by_name.or_else(by_alias).map(String::as_str)
    }

    /// Message for `field` failing `rule`, preferring a custom template.
    pub(crate) fn render(&self, field: &str, rule: &Rule, value: Option<&Value>, numeric_field: bool) -> String {
        let template = match self.lookup(field, rule) {
            Some(template) => template.to_owned(),
            None => default_template(rule, value, numeric_field).to_owned(),
        };
        fill(&template, field, rule)
    }
}

impl<K, V> FromIterator<(K, V)> for CustomMessages
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            templates: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn default_template(rule: &Rule, value: Option<&Value>, numeric_field: bool) -> &'static str {
    match rule {
        Rule::Required => "The :attribute field is required.",
        Rule::String => "The :attribute field must be a string.",
        Rule::Numeric => "The :attribute field must be a number.",
        Rule::Boolean => "The :attribute field must be true or false.",
        Rule::Array => "The :attribute field must be an array.",
        Rule::Email => "The :attribute field must be a valid email address.",
        Rule::Size(_) => match value {
            Some(Value::Number(_)) => "The :attribute field must be :size.",
            Some(Value::String(_)) if numeric_field => "The :attribute field must be :size.",
            Some(Value::Array(_) | Value::Object(_)) => "The :attribute field must contain :size items.",
            _ => "The :attribute field must be :size characters.",
        },
        Rule::StartsWith(_) => "The :attribute field must start with one of the following: :values.",
        Rule::In(_) => "The selected :attribute is invalid.",
        Rule::Date => "The :attribute field must be a valid date.",
        Rule::Bail | Rule::Nullable => "The :attribute field is invalid.",
    }
}

/// Human-readable attribute name: `first_name` → `first name`.
fn attribute(field: &str) -> String {
    field.replace(['_', '.'], " ")
}

fn fill(template: &str, field: &str, rule: &Rule) -> String {
    let mut message = template.replace(":attribute", &attribute(field));
    match rule {
        Rule::Size(size) => message = message.replace(":size", &size.to_string()),
        Rule::StartsWith(values) | Rule::In(values) => message = message.replace(":values", &values.join(", ")),
        _ => {}
    }
    message
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_messages_humanise_field_names() {
        let messages = CustomMessages::new();
        assert_eq!(
            messages.render("first_name", &Rule::Required, None, false),
            "The first name field is required."
        );
        assert_eq!(
            messages.render("currency", &Rule::Size(3), Some(&json!("NG")), false),
            "The currency field must be 3 characters."
        );
        assert_eq!(
            messages.render("line_items", &Rule::Size(2), Some(&json!([1])), false),
            "The line items field must contain 2 items."
        );
    }

    #[test]
    fn starts_with_lists_prefixes() {
        let rule = Rule::StartsWith(vec!["AUTH_".into(), "PLN_".into()]);
        assert_eq!(
            CustomMessages::new().render("code", &rule, Some(&json!("x")), false),
            "The code field must start with one of the following: AUTH_, PLN_."
        );
    }

    #[test]
    fn custom_template_wins_and_is_filled() {
        let messages = CustomMessages::new().with("risk_action.in", "Pick one of :values for :attribute");
        let rule = Rule::one_of(["default", "deny"]);
        assert_eq!(
            messages.render("risk_action", &rule, Some(&json!("allow")), false),
            "Pick one of default, deny for risk action"
        );
    }

    #[test]
    fn one_of_alias_key_is_honoured() {
        let messages: CustomMessages = [("plan.one_of", "bad plan")].into_iter().collect();
        assert_eq!(messages.render("plan", &Rule::one_of(["a"]), None, false), "bad plan");
    }
}
