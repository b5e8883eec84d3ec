//! Typed request bodies.
//!
//! # Design
//! Each struct serializes into the JSON object the provider expects; the
//! resource layer turns it into a `Payload` and validates that map, so the
//! rules see exactly what goes on the wire. Optional fields are skipped when
//! unset. `extra` carries provider options this crate does not model.
//! Amounts are in the provider's minor unit (kobo, pesewas, cents).

use serde::Serialize;
use serde_json::Value;

use crate::validation::Payload;

pub const DEFAULT_CURRENCY: &str = "NGN";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

/// Page selection for list endpoints.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(rename = "perPage")]
    pub per_page: u32,
    pub page: u32,
}

impl Pagination {
    pub fn new(per_page: u32, page: u32) -> Self {
        Self { per_page, page }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { per_page: 50, page: 1 }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl NewCustomer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            metadata: None,
        }
    }
}

/// Fields applied by a customer update; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CustomerUpdate {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Identity check submitted for a customer (bank account or BVN).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IdentityValidation {
    pub country: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub bvn: String,
    pub bank_code: String,
    pub account_number: String,
}

/// Body of a transaction initialization, by amount or by plan.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionInit {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub extra: Payload,
}

impl TransactionInit {
    pub fn for_amount(amount: u64, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            amount: Some(amount),
            plan: None,
            currency: default_currency(),
            reference: None,
            extra: Payload::new(),
        }
    }

    pub fn for_plan(plan: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            amount: None,
            plan: Some(plan.into()),
            currency: default_currency(),
            reference: None,
            extra: Payload::new(),
        }
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Charge, check or partially debit a stored card authorization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorizationCharge {
    pub amount: u64,
    pub email: String,
    pub authorization_code: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Minimum amount to collect on a partial debit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_least: Option<u64>,
    #[serde(flatten)]
    pub extra: Payload,
}

impl AuthorizationCharge {
    pub fn new(amount: u64, email: impl Into<String>, authorization_code: impl Into<String>) -> Self {
        Self {
            amount,
            email: email.into(),
            authorization_code: authorization_code.into(),
            currency: default_currency(),
            reference: None,
            at_least: None,
            extra: Payload::new(),
        }
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn at_least(mut self, amount: u64) -> Self {
        self.at_least = Some(amount);
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UssdType {
    #[serde(rename = "type")]
    pub bank: String,
}

/// USSD charge; `ussd.type` is the bank's USSD code.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UssdCharge {
    pub amount: u64,
    pub email: String,
    pub ussd: UssdType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl UssdCharge {
    pub fn new(amount: u64, email: impl Into<String>, bank: impl Into<String>) -> Self {
        Self {
            amount,
            email: email.into(),
            ussd: UssdType { bank: bank.into() },
            reference: None,
            metadata: None,
        }
    }
}

/// A bank account that can receive transfers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BankRecipient {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl BankRecipient {
    pub fn nuban(name: impl Into<String>, account_number: impl Into<String>, bank_code: impl Into<String>) -> Self {
        Self {
            kind: "nuban".to_owned(),
            name: name.into(),
            account_number: account_number.into(),
            bank_code: bank_code.into(),
            currency: default_currency(),
            description: None,
            metadata: None,
        }
    }
}

/// A single transfer out of the integration balance.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransferRequest {
    pub source: String,
    pub amount: u64,
    pub recipient: String,
    pub reason: String,
    pub currency: String,
    /// Generated when left empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl TransferRequest {
    pub fn new(amount: u64, recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: "balance".to_owned(),
            amount,
            recipient: recipient.into(),
            reason: reason.into(),
            currency: default_currency(),
            reference: None,
        }
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Payment request: plain (by `amount`) or product (by `line_items`).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewInvoice {
    pub customer: String,
    pub due_date: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub draft: bool,
    #[serde(flatten)]
    pub extra: Payload,
}

impl NewInvoice {
    pub fn plain(amount: u64, customer: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            due_date: due_date.into(),
            currency: default_currency(),
            amount: Some(amount),
            line_items: None,
            tax: None,
            description: None,
            draft: false,
            extra: Payload::new(),
        }
    }

    pub fn products(customer: impl Into<String>, line_items: Vec<Value>, due_date: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            due_date: due_date.into(),
            currency: default_currency(),
            amount: None,
            line_items: Some(line_items),
            tax: None,
            description: None,
            draft: false,
            extra: Payload::new(),
        }
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewSubaccount {
    pub business_name: String,
    pub settlement_bank: String,
    pub account_number: String,
    pub percentage_charge: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl NewSubaccount {
    pub fn new(
        business_name: impl Into<String>,
        settlement_bank: impl Into<String>,
        account_number: impl Into<String>,
        percentage_charge: f64,
    ) -> Self {
        Self {
            business_name: business_name.into(),
            settlement_bank: settlement_bank.into(),
            account_number: account_number.into(),
            percentage_charge,
            description: None,
            primary_contact_email: None,
            primary_contact_name: None,
            primary_contact_phone: None,
            metadata: None,
        }
    }
}

/// Currencies plans and plan checkouts may be priced in.
pub const PLAN_CURRENCIES: [&str; 4] = ["NGN", "ZAR", "GHS", "USD"];

/// Billing interval accepted by plans.
pub const PLAN_INTERVALS: [&str; 5] = ["daily", "weekly", "monthly", "biannually", "annually"];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewPlan {
    pub name: String,
    pub amount: u64,
    pub interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl NewPlan {
    pub fn new(name: impl Into<String>, amount: u64, interval: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            interval: interval.into(),
            description: None,
            currency: None,
        }
    }
}

/// Account ownership check, optionally backed by an identity document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountValidation {
    pub account_name: String,
    pub account_number: String,
    pub account_type: String,
    pub bank_code: String,
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pagination_uses_provider_key_names() {
        assert_eq!(
            serde_json::to_value(Pagination::default()).unwrap(),
            json!({"perPage": 50, "page": 1})
        );
    }

    #[test]
    fn unset_optionals_are_omitted_and_extras_flattened() {
        let init = TransactionInit::for_amount(50_000, "ada@example.com").with("channels", json!(["card"]));
        assert_eq!(
            serde_json::to_value(init).unwrap(),
            json!({"email": "ada@example.com", "amount": 50000, "currency": "NGN", "channels": ["card"]})
        );
    }

    #[test]
    fn ussd_bank_is_nested() {
        let charge = UssdCharge::new(1000, "a@b.co", "737");
        assert_eq!(serde_json::to_value(charge).unwrap()["ussd"], json!({"type": "737"}));
    }
}
