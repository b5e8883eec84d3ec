use serde_json::json;

use super::{fields, pagination_rules, required_string};
use crate::client::{ApiClient, ResourceRequest};
use crate::operation::Operation;
use crate::transport::Transport;
use crate::types::{NewSubaccount, Pagination};
use crate::validation::{Rule, RuleSet, Schema};

/// Split-payment subaccounts.
#[derive(Debug, Clone, Copy)]
pub struct SubaccountApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

fn subaccount_rules() -> RuleSet {
    RuleSet::new()
        .field("percentage_charge", [Rule::Bail, Rule::Numeric, Rule::Required])
        .field("business_name", [Rule::Bail, Rule::String, Rule::Required])
        .field("settlement_bank", [Rule::Bail, Rule::Numeric, Rule::Required])
        .field("account_number", [Rule::Bail, Rule::Required, Rule::String])
        .field("description", [Rule::Bail, Rule::String, Rule::Nullable])
        .field("primary_contact_email", [Rule::Bail, Rule::Email, Rule::Nullable])
        .field("primary_contact_name", [Rule::Bail, Rule::String, Rule::Nullable])
        .field("primary_contact_phone", [Rule::Bail, Rule::String, Rule::Nullable])
        .field("metadata", [Rule::Bail, Rule::Array, Rule::Nullable])
}

impl<'a, T: Transport> SubaccountApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn create(&self, subaccount: &NewSubaccount) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::post("subaccount.create"),
            subaccount,
            &Schema::new(subaccount_rules()),
        )
    }

    pub fn list(&self, page: Pagination) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::get("subaccount.list"),
            &page,
            &Schema::new(pagination_rules()),
        )
    }

    pub fn fetch(&self, id_or_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("subaccount_id", required_string()));
        let request = ResourceRequest::get("subaccount.fetch").path_param_as("subaccount_id", id_or_code);
        self.client.dispatch(request, &schema)
    }

    pub fn update(&self, id_or_code: &str, subaccount: &NewSubaccount) -> Operation {
        let rules = subaccount_rules().field("subaccount_id", required_string());
        let request = ResourceRequest::put("subaccount.update").path_param_as("subaccount_id", id_or_code);
        self.client.dispatch_typed(request, subaccount, &Schema::new(rules))
    }

    /// Activate (`true`) or deactivate a subaccount.
    pub fn set_active(&self, id_or_code: &str, active: bool) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("subaccount_id", required_string())
                .field("active", [Rule::Bail, Rule::Required, Rule::Boolean]),
        );
        let request = ResourceRequest::put("subaccount.update")
            .path_param_as("subaccount_id", id_or_code)
            .body(fields([("active", json!(active))]));
        self.client.dispatch(request, &schema)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::resources::testing::client;

    fn subaccount() -> NewSubaccount {
        NewSubaccount::new("Sunshine Studios", "044", "0193274682", 18.2)
    }

    #[test]
    fn create_checks_optional_contacts_only_when_given() {
        let (client, wire) = client();
        assert!(client.subaccount().create(&subaccount()).success());
        assert_eq!(wire.last_body()["percentage_charge"], 18.2);

        let mut bad = subaccount();
        bad.primary_contact_email = Some("nope".into());
        let op = client.subaccount().create(&bad);
        assert_eq!(
            op.errors().unwrap(),
            json!({"primary_contact_email": ["The primary contact email field must be a valid email address."]})
        );
    }

    #[test]
    fn settlement_bank_must_be_numeric() {
        let (client, _) = client();
        let op = client.subaccount().create(&NewSubaccount::new("Sunshine", "GTB", "0193274682", 10.0));
        assert_eq!(op.errors().unwrap(), json!({"settlement_bank": ["The settlement bank field must be a number."]}));
    }

    #[test]
    fn set_active_puts_the_flag() {
        let (client, wire) = client();
        assert!(client.subaccount().set_active("ACCT_4hl4xenwpjy5wb", false).success());
        let sent = wire.last();
        assert_eq!(sent.method, HttpMethod::Put);
        assert_eq!(sent.url, "https://api.example.test/subaccount/ACCT_4hl4xenwpjy5wb");
        assert_eq!(wire.last_body(), json!({"active": false}));
    }

    #[test]
    fn update_and_fetch_use_the_code() {
        let (client, wire) = client();
        assert!(client.subaccount().update("ACCT_1", &subaccount()).success());
        assert!(wire.last_body().get("subaccount_id").is_none());
        assert!(client.subaccount().fetch("ACCT_1").success());
        assert_eq!(wire.last().url, "https://api.example.test/subaccount/ACCT_1");
        assert!(client.subaccount().list(Pagination::default()).success());
    }
}
