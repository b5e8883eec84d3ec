use serde_json::json;

use super::{fields, required_string};
use crate::client::{ApiClient, ResourceRequest};
use crate::operation::Operation;
use crate::transport::Transport;
use crate::types::{NewPlan, PLAN_CURRENCIES, PLAN_INTERVALS};
use crate::validation::{Rule, RuleSet, Schema};

fn per_page(per_page: u32) -> serde_json::Map<String, serde_json::Value> {
    fields([("perPage", json!(per_page))])
}

fn per_page_schema() -> Schema {
    Schema::new(RuleSet::new().field("perPage", [Rule::Bail, Rule::Nullable, Rule::Numeric]))
}

/// Recurring charges against a plan.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> SubscriptionApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Subscribe `customer` to `plan`, optionally on a given card and from a
    /// given start date.
    pub fn create(
        &self,
        customer: &str,
        plan: &str,
        authorization: Option<&str>,
        start_date: Option<&str>,
    ) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("customer", required_string())
                .field("plan", [Rule::Bail, Rule::Required, Rule::String, Rule::starts_with("PLN_")])
                .field(
                    "authorization",
                    [Rule::Bail, Rule::Nullable, Rule::String, Rule::starts_with("AUTH_")],
                )
                .field("start_date", [Rule::Bail, Rule::Nullable, Rule::Date]),
        );
        let mut body = fields([("customer", json!(customer)), ("plan", json!(plan))]);
        if let Some(authorization) = authorization {
            body.insert("authorization".to_owned(), json!(authorization));
        }
        if let Some(start_date) = start_date {
            body.insert("start_date".to_owned(), json!(start_date));
        }
        self.client
            .dispatch(ResourceRequest::post("subscription.create").body(body), &schema)
    }

    pub fn list(&self, page_size: u32) -> Operation {
        self.client.dispatch(
            ResourceRequest::get("subscription.list").body(per_page(page_size)),
            &per_page_schema(),
        )
    }

    pub fn fetch(&self, id_or_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("subscription_id", required_string()));
        let request =
            ResourceRequest::get("subscription.fetch").path_param_as("subscription_id", id_or_code);
        self.client.dispatch(request, &schema)
    }

    /// Re-enable with the code and the token from the subscription email.
    pub fn enable(&self, code: &str, email_token: &str) -> Operation {
        self.toggle("subscription.enable", code, email_token)
    }

    pub fn disable(&self, code: &str, email_token: &str) -> Operation {
        self.toggle("subscription.disable", code, email_token)
    }

    fn toggle(&self, endpoint: &str, code: &str, email_token: &str) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("code", required_string())
                .field("token", required_string()),
        );
        let body = fields([("code", json!(code)), ("token", json!(email_token))]);
        self.client.dispatch(ResourceRequest::post(endpoint).body(body), &schema)
    }
}

/// Subscription plans.
#[derive(Debug, Clone, Copy)]
pub struct PlanApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

fn plan_rules() -> RuleSet {
    RuleSet::new()
        .field("name", required_string())
        .field("amount", [Rule::Bail, Rule::Required, Rule::Numeric])
        .field("interval", [Rule::Bail, Rule::Required, Rule::String, Rule::one_of(PLAN_INTERVALS)])
        .field("description", [Rule::Bail, Rule::Nullable, Rule::String])
        .field("currency", [Rule::Bail, Rule::Nullable, Rule::String, Rule::one_of(PLAN_CURRENCIES)])
}

impl<'a, T: Transport> PlanApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn create(&self, plan: &NewPlan) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::post("subscription.plan.create"),
            plan,
            &Schema::new(plan_rules()),
        )
    }

    pub fn list(&self, page_size: u32) -> Operation {
        self.client.dispatch(
            ResourceRequest::get("subscription.plan.list").body(per_page(page_size)),
            &per_page_schema(),
        )
    }

    pub fn fetch(&self, id_or_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("plan_id", required_string()));
        let request = ResourceRequest::get("subscription.plan.fetch").path_param_as("plan_id", id_or_code);
        self.client.dispatch(request, &schema)
    }

    pub fn update(&self, id_or_code: &str, plan: &NewPlan) -> Operation {
        let rules = plan_rules().field("plan_id", required_string());
        let request = ResourceRequest::put("subscription.plan.update").path_param_as("plan_id", id_or_code);
        self.client.dispatch_typed(request, plan, &Schema::new(rules))
    }
}
