use serde_json::{json, Value};

use super::{fields, pagination_rules, required_string};
use crate::client::{to_payload, ApiClient, ResourceRequest};
use crate::operation::{Operation, ResultSink};
use crate::transport::Transport;
use crate::types::{CustomerUpdate, IdentityValidation, NewCustomer, Pagination};
use crate::validation::{Rule, RuleSet, Schema};

pub const RISK_ACTIONS: [&str; 2] = ["default", "deny"];

/// Customers on the integration.
#[derive(Debug, Clone, Copy)]
pub struct CustomerApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> CustomerApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn create(&self, customer: &NewCustomer) -> Operation {
        self.client
            .dispatch_typed(ResourceRequest::post("customer.create"), customer, &create_schema())
    }

    pub fn list(&self, page: Pagination) -> Operation {
        let schema = Schema::new(pagination_rules());
        self.client.dispatch_typed(ResourceRequest::get("customer.list"), &page, &schema)
    }

    /// Fetch by email or customer code.
    pub fn fetch(&self, email_or_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("customer_id", required_string()));
        let request = ResourceRequest::get("customer.fetch").path_param_as("customer_id", email_or_code);
        self.client.dispatch(request, &schema)
    }

    pub fn update(&self, customer_code: &str, update: &CustomerUpdate) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("customer_code", [Rule::Bail, Rule::Required])
                .field("first_name", required_string())
                .field("last_name", required_string()),
        );
        let request = ResourceRequest::put("customer.update").path_param_as("customer_code", customer_code);
        self.client.dispatch_typed(request, update, &schema)
    }

    /// Submit an identity check for a customer.
    pub fn validate_identity(&self, customer_code: &str, identity: &IdentityValidation) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("customer_code", [Rule::Bail, Rule::Required])
                .field("first_name", required_string())
                .field("country", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(2)])
                .field("type", [Rule::Bail, Rule::Required, Rule::String, Rule::one_of(["bank_account", "bvn"])])
                .field("bvn", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(11)])
                .field("bank_code", [Rule::Bail, Rule::Required, Rule::Numeric])
                .field("account_number", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(10)]),
        );
        let request = ResourceRequest::post("customer.validate").path_param_as("customer_code", customer_code);
        self.client.dispatch_typed(request, identity, &schema)
    }

    /// Whitelist (`default`) or blacklist (`deny`) a customer.
    pub fn set_risk_action(&self, customer: &str, action: &str) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("customer", [Rule::Bail, Rule::Required])
                .field("risk_action", [Rule::Bail, Rule::Required, Rule::String, Rule::one_of(RISK_ACTIONS)]),
        )
        .message(
            "risk_action.in",
            "The selected risk action value is invalid allowed values are [default | deny]",
        );
        let body = fields([("customer", json!(customer)), ("risk_action", json!(action))]);
        self.client.dispatch(ResourceRequest::post("customer.risk_action").body(body), &schema)
    }

    /// Forget a saved card authorization.
    pub fn deactivate_authorization(&self, authorization_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field(
            "authorization_code",
            [Rule::Bail, Rule::Required, Rule::String, Rule::starts_with("AUTH_")],
        ));
        let body = fields([("authorization_code", Value::from(authorization_code))]);
        self.client
            .dispatch(ResourceRequest::post("customer.deactivate_authorization").body(body), &schema)
    }

    /// Create a customer from an untyped map, e.g. one decoded from a form.
    pub fn create_from(&self, customer: &Value) -> Operation {
        match to_payload(customer) {
            Ok(payload) => self
                .client
                .dispatch(ResourceRequest::post("customer.create").body(payload), &create_schema()),
            Err(error) => {
                let mut operation = Operation::new("customer.create");
                operation.mark_error(error);
                operation
            }
        }
    }
}

fn create_schema() -> Schema {
    Schema::new(
        RuleSet::new()
            .field("first_name", required_string())
            .field("last_name", required_string())
            .field("phone_number", required_string())
            .field("email", [Rule::Bail, Rule::Required, Rule::Email]),
    )
}
