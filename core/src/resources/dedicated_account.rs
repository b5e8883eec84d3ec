use super::required_string;
use crate::client::{ApiClient, ResourceRequest};
use crate::operation::Operation;
use crate::transport::Transport;
use crate::validation::{Payload, Rule, RuleSet, Schema};

/// Dedicated virtual accounts. Most inputs are provider options, so bodies
/// are untyped maps checked only for the fields the provider requires.
#[derive(Debug, Clone, Copy)]
pub struct DedicatedAccountApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> DedicatedAccountApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Create an account for an existing customer.
    pub fn create(&self, options: Payload) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("customer", [Rule::Bail, Rule::Required])
                .field("preferred_bank", [Rule::Bail, Rule::Nullable, Rule::String]),
        );
        self.client
            .dispatch(ResourceRequest::post("dedicated_account.create").body(options), &schema)
    }

    /// Create, validate and assign an account in one call.
    pub fn assign(&self, options: Payload) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("email", [Rule::Bail, Rule::Required, Rule::Email])
                .field("first_name", required_string())
                .field("last_name", required_string())
                .field("phone", required_string())
                .field("preferred_bank", required_string())
                .field("country", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(2)]),
        );
        self.client
            .dispatch(ResourceRequest::post("dedicated_account.assign").body(options), &schema)
    }

    /// Filters such as `active` and `currency` travel as query parameters.
    pub fn list(&self, filters: Payload) -> Operation {
        let schema = Schema::new(RuleSet::new().field("active", [Rule::Bail, Rule::Nullable, Rule::Boolean]));
        self.client
            .dispatch(ResourceRequest::get("dedicated_account.list").body(filters), &schema)
    }

    pub fn fetch(&self, id: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("account_id", required_string()));
        let request = ResourceRequest::get("dedicated_account.fetch").path_param_as("account_id", id);
        self.client.dispatch(request, &schema)
    }

    /// Ask the provider to look for new transactions on an account.
    pub fn requery(&self, options: Payload) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("account_number", required_string())
                .field("provider_slug", required_string())
                .field("date", [Rule::Bail, Rule::Nullable, Rule::Date]),
        );
        self.client
            .dispatch(ResourceRequest::get("dedicated_account.requery").body(options), &schema)
    }

    pub fn deactivate(&self, id: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("account_id", required_string()));
        let request = ResourceRequest::delete("dedicated_account.deactivate").path_param_as("account_id", id);
        self.client.dispatch(request, &schema)
    }

    pub fn providers(&self) -> Operation {
        self.client
            .dispatch(ResourceRequest::get("dedicated_account.providers"), &Schema::none())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::http::HttpMethod;
    use crate::operation::ErrorKind;
    use crate::resources::fields;
    use crate::resources::testing::client;

    #[test]
    fn deactivate_is_a_bodiless_delete() {
        let (client, wire) = client();
        assert!(client.dedicated_account().deactivate("41").success());
        let sent = wire.last();
        assert_eq!(sent.method, HttpMethod::Delete);
        assert_eq!(sent.url, "https://api.example.test/dedicated_account/41");
        assert!(sent.body.is_none());
    }

    #[test]
    fn requery_sends_query_and_checks_date() {
        let (client, wire) = client();
        let bad = client.dedicated_account().requery(fields([
            ("account_number", json!("1234567890")),
            ("provider_slug", json!("wema-bank")),
            ("date", json!("yesterday")),
        ]));
        assert_eq!(bad.error_kind(), Some(ErrorKind::Validation));
        assert!(wire.sent().is_empty());

        let ok = client.dedicated_account().requery(fields([
            ("account_number", json!("1234567890")),
            ("provider_slug", json!("wema-bank")),
            ("date", json!("2023-05-30")),
        ]));
        assert!(ok.success());
        assert!(wire.last().query.contains(&("provider_slug".to_owned(), "wema-bank".to_owned())));
    }

    #[test]
    fn assign_lists_missing_fields() {
        let (client, _) = client();
        let op = client.dedicated_account().assign(fields([("email", json!("ada@example.com"))]));
        let errors = op.errors().unwrap();
        for field in ["first_name", "last_name", "phone", "preferred_bank", "country"] {
            assert!(errors.get(field).is_some(), "{field} should be reported");
        }
    }

    #[test]
    fn providers_needs_no_input() {
        let (client, wire) = client();
        assert!(client.dedicated_account().providers().success());
        assert_eq!(wire.last().url, "https://api.example.test/dedicated_account/available_providers");
    }
}
