use serde_json::json;

use super::{fields, pagination_rules, required_string};
use crate::client::{ApiClient, ResourceRequest};
use crate::operation::Operation;
use crate::transport::Transport;
use crate::types::{AuthorizationCharge, Pagination, TransactionInit, PLAN_CURRENCIES};
use crate::validation::{all_present, Payload, Rule, RuleSet, Schema};

#[derive(Debug, Clone, Copy)]
pub struct TransactionApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

fn currency_rules() -> [Rule; 4] {
    [Rule::Bail, Rule::Required, Rule::String, Rule::Size(3)]
}

fn authorization_schema() -> Schema {
    Schema::new(
        RuleSet::new()
            .field("amount", [Rule::Bail, Rule::Required, Rule::Numeric])
            .field("email", [Rule::Bail, Rule::Required, Rule::Email])
            .field("currency", currency_rules())
            .field(
                "authorization_code",
                [Rule::Bail, Rule::Required, Rule::String, Rule::starts_with("AUTH_")],
            ),
    )
}

impl<'a, T: Transport> TransactionApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Start a checkout for a fixed amount; `data.authorization_url` is the
    /// page the customer pays on.
    pub fn initialize(&self, init: &TransactionInit) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("amount", [Rule::Bail, Rule::Required, Rule::Numeric])
                .field("email", [Rule::Bail, Rule::Required, Rule::Email])
                .field("currency", currency_rules()),
        );
        self.client
            .dispatch_typed(ResourceRequest::post("transaction.initialize"), init, &schema)
    }

    /// Start a checkout that subscribes the customer to a plan.
    pub fn initialize_from_plan(&self, init: &TransactionInit) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("plan", required_string())
                .field("email", [Rule::Bail, Rule::Required, Rule::Email])
                .field(
                    "currency",
                    [Rule::Bail, Rule::Required, Rule::String, Rule::Size(3), Rule::one_of(PLAN_CURRENCIES)],
                ),
        );
        self.client
            .dispatch_typed(ResourceRequest::post("transaction.initialize"), init, &schema)
    }

    pub fn verify(&self, reference: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("reference", required_string()));
        let request = ResourceRequest::get("transaction.verify").path_param_as("reference", reference);
        self.client.dispatch(request, &schema)
    }

    pub fn list(&self, page: Pagination) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::get("transaction.list"),
            &page,
            &Schema::new(pagination_rules()),
        )
    }

    pub fn fetch(&self, id: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("transaction_id", required_string()));
        let request = ResourceRequest::get("transaction.fetch").path_param_as("transaction_id", id);
        self.client.dispatch(request, &schema)
    }

    /// Charge a reusable authorization.
    pub fn charge_authorization(&self, charge: &AuthorizationCharge) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::post("transaction.charge_authorization"),
            charge,
            &authorization_schema(),
        )
    }

    /// Check that an authorization can cover an amount before charging it.
    pub fn check_authorization(&self, charge: &AuthorizationCharge) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::post("transaction.check_authorization"),
            charge,
            &authorization_schema(),
        )
    }

    pub fn timeline(&self, id_or_reference: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("transaction_id", required_string()));
        let request =
            ResourceRequest::get("transaction.timeline").path_param_as("transaction_id", id_or_reference);
        self.client.dispatch(request, &schema)
    }

    /// Totals over all transactions. A given bound is forwarded and must be a
    /// date; with both, the range is `from..to`.
    pub fn totals(&self, page: Pagination, from: Option<&str>, to: Option<&str>) -> Operation {
        let mut body = fields([("perPage", json!(page.per_page)), ("page", json!(page.page))]);
        for (key, bound) in [("from", from), ("to", to)] {
            if let Some(bound) = bound.filter(|bound| !bound.trim().is_empty()) {
                body.insert(key.to_owned(), json!(bound));
            }
        }

        let paged = RuleSet::new()
            .field("perPage", [Rule::Bail, Rule::Required, Rule::Numeric])
            .field("page", [Rule::Bail, Rule::Required, Rule::Numeric]);
        let schema = Schema::conditional(
            |payload| all_present(payload, &["from", "to"]),
            paged
                .clone()
                .field("from", [Rule::Bail, Rule::Required, Rule::Date])
                .field("to", [Rule::Bail, Rule::Required, Rule::Date]),
            paged
                .field("from", [Rule::Bail, Rule::Nullable, Rule::Date])
                .field("to", [Rule::Bail, Rule::Nullable, Rule::Date]),
        );
        self.client
            .dispatch(ResourceRequest::get("transaction.totals").body(body), &schema)
    }

    /// Export as CSV; the provider answers with a download link.
    pub fn export(&self, filters: Payload) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("from", [Rule::Bail, Rule::Nullable, Rule::Date])
                .field("to", [Rule::Bail, Rule::Nullable, Rule::Date]),
        );
        self.client
            .dispatch(ResourceRequest::get("transaction.export").body(filters), &schema)
    }

    /// Collect what is available on an authorization, down to `at_least`.
    pub fn partial_debit(&self, charge: &AuthorizationCharge) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::post("transaction.partial_debit"),
            charge,
            &authorization_schema(),
        )
    }
}
