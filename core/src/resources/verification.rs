use serde_json::json;

use super::{fields, required_string};
use crate::client::{ApiClient, ResourceRequest};
use crate::operation::Operation;
use crate::transport::Transport;
use crate::types::AccountValidation;
use crate::validation::{all_present, Payload, Rule, RuleSet, Schema};

pub const ACCOUNT_TYPES: [&str; 2] = ["personal", "business"];
pub const DOCUMENT_TYPES: [&str; 3] = ["identityNumber", "passportNumber", "businessRegistrationNumber"];

/// Bank lookups and account verification.
#[derive(Debug, Clone, Copy)]
pub struct VerificationApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> VerificationApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Supported banks; filters such as `country` or `pay_with_bank_transfer`
    /// go in the query string.
    pub fn banks(&self, filters: Payload) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("country", [Rule::Bail, Rule::Nullable, Rule::String])
                .field("perPage", [Rule::Bail, Rule::Nullable, Rule::Numeric]),
        );
        self.client.dispatch(ResourceRequest::get("misc.banks").body(filters), &schema)
    }

    /// Name on a bank account.
    pub fn resolve_account_number(&self, account_number: &str, bank_code: &str) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("account_number", required_string())
                .field("bank_code", required_string()),
        );
        let query = fields([("account_number", json!(account_number)), ("bank_code", json!(bank_code))]);
        self.client
            .dispatch(ResourceRequest::get("misc.resolve_account_number").body(query), &schema)
    }

    /// Card details from the first six digits.
    pub fn resolve_card_bin(&self, bin: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("bin", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(6)]));
        let request = ResourceRequest::get("misc.resolve_card_bin").path_param_as("bin", bin);
        self.client.dispatch(request, &schema)
    }

    /// Confirm account ownership. Document fields are only checked, and only
    /// sent, when both are supplied.
    pub fn validate_account(&self, account: &AccountValidation) -> Operation {
        let mut account = account.clone();
        let has_document = [&account.document_type, &account.document_number]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if !has_document {
            account.document_type = None;
            account.document_number = None;
        }

        let base = RuleSet::new()
            .field("account_name", required_string())
            .field("account_number", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(10)])
            .field("account_type", [Rule::Bail, Rule::Required, Rule::String, Rule::one_of(ACCOUNT_TYPES)])
            .field("bank_code", required_string())
            .field("country_code", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(2)]);
        let schema = Schema::conditional(
            |payload| all_present(payload, &["document_type", "document_number"]),
            base.clone()
                .field(
                    "document_type",
                    [Rule::Bail, Rule::Required, Rule::String, Rule::one_of(DOCUMENT_TYPES)],
                )
                .field("document_number", required_string()),
            base,
        );
        self.client
            .dispatch_typed(ResourceRequest::post("misc.validate_account"), &account, &schema)
    }
}
