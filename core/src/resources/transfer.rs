use serde_json::{json, Value};
use uuid::Uuid;

use super::{fields, pagination_rules, precheck, required_string};
use crate::client::{ApiClient, ResourceRequest};
use crate::operation::{Operation, OperationError, ResultSink};
use crate::transport::Transport;
use crate::types::{BankRecipient, Pagination, TransferRequest};
use crate::validation::{Rule, RuleSet, Schema};

fn transfer_rules() -> RuleSet {
    RuleSet::new()
        .field("amount", [Rule::Bail, Rule::Required, Rule::Numeric])
        .field("recipient", [Rule::Bail, Rule::Required, Rule::String, Rule::starts_with("RCP_")])
        .field("reason", required_string())
        .field("currency", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(3)])
}

fn recipient_rules() -> RuleSet {
    RuleSet::new()
        .field("type", required_string())
        .field("name", required_string())
        .field("account_number", required_string())
        .field("bank_code", required_string())
        .field("currency", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(3)])
}

/// Transfers out of the integration balance.
#[derive(Debug, Clone, Copy)]
pub struct TransferApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> TransferApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// `reason` prefixed with the application name, and a reference filled in
    /// when the caller left it empty. A blank reason is left blank.
    pub fn prepare(&self, transfer: &TransferRequest) -> TransferRequest {
        let app_name = &self.client.config().app_name;
        let mut prepared = transfer.clone();
        if !app_name.is_empty()
            && !prepared.reason.trim().is_empty()
            && !prepared.reason.starts_with(app_name.as_str())
        {
            prepared.reason = format!("{app_name}: {}", prepared.reason);
        }
        if prepared.reference.as_deref().map_or(true, str::is_empty) {
            prepared.reference = Some(Uuid::new_v4().to_string());
        }
        prepared
    }

    /// Send one transfer. The caller's values are validated before the
    /// reason is prefixed.
    pub fn initiate(&self, transfer: &TransferRequest) -> Operation {
        let schema = Schema::new(transfer_rules());
        if let Err(rejected) = precheck("transfer.initiate", transfer, &schema) {
            return rejected;
        }
        let prepared = self.prepare(transfer);
        tracing::info!(reference = prepared.reference.as_deref(), amount = prepared.amount, "initiating transfer");
        self.client
            .dispatch_typed(ResourceRequest::post("transfer.initiate"), &prepared, &schema)
    }

    /// Several transfers in one request, all from the balance in `currency`.
    /// Every item is checked like a single transfer.
    pub fn bulk(&self, currency: &str, transfers: &[TransferRequest]) -> Operation {
        let body = |items: Vec<Value>| {
            fields([
                ("source", json!("balance")),
                ("currency", json!(currency)),
                ("transfers", Value::Array(items)),
            ])
        };
        let item = |transfer: &TransferRequest| {
            json!({
                "amount": transfer.amount,
                "recipient": transfer.recipient,
                "reason": transfer.reason,
                "reference": transfer.reference,
            })
        };

        let single = transfer_rules();
        let mut rules = RuleSet::new()
            .field("currency", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(3)])
            .field("transfers", [Rule::Bail, Rule::Required, Rule::Array]);
        for index in 0..transfers.len() {
            for field in ["amount", "recipient", "reason"] {
                if let Some(field_rules) = single.rules(field) {
                    rules = rules.field(format!("transfers.{index}.{field}"), field_rules.to_vec());
                }
            }
        }
        let schema = Schema::new(rules);

        let raw = body(transfers.iter().map(item).collect());
        if let Err(rejected) = precheck("transfer.bulk", &raw, &schema) {
            return rejected;
        }
        let prepared = body(transfers.iter().map(|transfer| item(&self.prepare(transfer))).collect());
        self.client
            .dispatch(ResourceRequest::post("transfer.bulk").body(prepared), &schema)
    }

    pub fn list(&self, page: Pagination) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::get("transfer.list"),
            &page,
            &Schema::new(pagination_rules()),
        )
    }

    pub fn fetch(&self, id_or_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("transfer_id", required_string()));
        let request = ResourceRequest::get("transfer.fetch").path_param_as("transfer_id", id_or_code);
        self.client.dispatch(request, &schema)
    }

    pub fn verify(&self, reference: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("reference", required_string()));
        let request = ResourceRequest::get("transfer.verify").path_param_as("reference", reference);
        self.client.dispatch(request, &schema)
    }

    /// Create a recipient for `account`, then send `amount` to it.
    ///
    /// Returns the recipient operation when that step fails.
    pub fn to_bank_account(&self, account: &BankRecipient, amount: u64, reason: &str) -> Operation {
        let created = RecipientApi::new(self.client).create(account);
        if !created.success() {
            return created;
        }
        let code = created
            .data()
            .and_then(|data| data.get("recipient_code"))
            .and_then(Value::as_str);
        match code {
            Some(code) => {
                let mut transfer = TransferRequest::new(amount, code, reason);
                transfer.currency = account.currency.clone();
                self.initiate(&transfer)
            }
            None => {
                let mut operation = Operation::new("transfer.initiate");
                operation.mark_error(OperationError::Configuration(
                    "recipient response carried no recipient_code".to_owned(),
                ));
                operation
            }
        }
    }
}

/// Transfer recipients.
#[derive(Debug, Clone, Copy)]
pub struct RecipientApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> RecipientApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn create(&self, recipient: &BankRecipient) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::post("transfer.recipient.create"),
            recipient,
            &Schema::new(recipient_rules()),
        )
    }

    pub fn bulk(&self, recipients: &[BankRecipient]) -> Operation {
        let batch = match serde_json::to_value(recipients) {
            Ok(batch) => batch,
            Err(err) => {
                let mut operation = Operation::new("transfer.recipient.bulk");
                operation.mark_error(OperationError::Configuration(err.to_string()));
                return operation;
            }
        };
        let mut rules = RuleSet::new().field("batch", [Rule::Bail, Rule::Required, Rule::Array]);
        for index in 0..recipients.len() {
            for (field, field_rules) in recipient_rules().iter() {
                rules = rules.field(format!("batch.{index}.{field}"), field_rules.to_vec());
            }
        }
        self.client.dispatch(
            ResourceRequest::post("transfer.recipient.bulk").body(fields([("batch", batch)])),
            &Schema::new(rules),
        )
    }

    pub fn list(&self, page: Pagination) -> Operation {
        self.client.dispatch_typed(
            ResourceRequest::get("transfer.recipient.list"),
            &page,
            &Schema::new(pagination_rules()),
        )
    }

    pub fn fetch(&self, id_or_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("recipient_code", required_string()));
        let request =
            ResourceRequest::get("transfer.recipient.fetch").path_param_as("recipient_code", id_or_code);
        self.client.dispatch(request, &schema)
    }

    pub fn update(&self, id_or_code: &str, name: &str, email: Option<&str>) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("recipient_code", required_string())
                .field("name", required_string())
                .field("email", [Rule::Bail, Rule::Nullable, Rule::Email]),
        );
        let mut body = fields([("name", json!(name))]);
        if let Some(email) = email {
            body.insert("email".to_owned(), json!(email));
        }
        let request = ResourceRequest::put("transfer.recipient.update")
            .path_param_as("recipient_code", id_or_code)
            .body(body);
        self.client.dispatch(request, &schema)
    }

    pub fn delete(&self, id_or_code: &str) -> Operation {
        let schema = Schema::new(RuleSet::new().field("recipient_code", required_string()));
        let request =
            ResourceRequest::delete("transfer.recipient.delete").path_param_as("recipient_code", id_or_code);
        self.client.dispatch(request, &schema)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};
    use crate::operation::ErrorKind;
    use crate::resources::testing::client;

    #[test]
    fn reason_is_prefixed_and_reference_generated() {
        let (client, wire) = client();
        assert!(client.transfer().initiate(&TransferRequest::new(3_794_800, "RCP_gx2wn530m0i3w3m", "Payout")).success());

        let body = wire.last_body();
        assert_eq!(body["reason"], "Acme: Payout");
        assert_eq!(body["source"], "balance");
        let reference = body["reference"].as_str().unwrap();
        assert!(Uuid::parse_str(reference).is_ok());
    }

    #[test]
    fn caller_reference_and_existing_prefix_are_kept() {
        let (client, _) = client();
        let transfer = TransferRequest::new(100, "RCP_1", "Acme: refund").reference("ref-9");
        let prepared = client.transfer().prepare(&transfer);
        assert_eq!(prepared.reason, "Acme: refund");
        assert_eq!(prepared.reference.as_deref(), Some("ref-9"));
    }

    #[test]
    fn blank_reason_is_rejected_before_prefixing() {
        let (client, wire) = client();
        for reason in ["", "   "] {
            let op = client.transfer().initiate(&TransferRequest::new(100, "RCP_1", reason));
            assert_eq!(op.error_kind(), Some(ErrorKind::Validation));
            assert_eq!(op.errors().unwrap(), json!({"reason": ["The reason field is required."]}));
        }
        assert!(wire.sent().is_empty());
        assert_eq!(client.transfer().prepare(&TransferRequest::new(100, "RCP_1", " ")).reason, " ");
    }

    #[test]
    fn recipient_code_is_checked() {
        let (client, wire) = client();
        let op = client.transfer().initiate(&TransferRequest::new(100, "CUS_1", "x"));
        assert!(op.errors().unwrap().get("recipient").is_some());
        assert!(wire.sent().is_empty());
    }

    #[test]
    fn bulk_transfer_wraps_items() {
        let (client, wire) = client();
        let items = [TransferRequest::new(100, "RCP_a", "one"), TransferRequest::new(200, "RCP_b", "two")];
        assert!(client.transfer().bulk("NGN", &items).success());
        let body = wire.last_body();
        assert_eq!(body["transfers"].as_array().unwrap().len(), 2);
        assert_eq!(body["transfers"][1]["reason"], "Acme: two");
        assert_eq!(wire.last().url, "https://api.example.test/transfer/bulk");

        let op = client.transfer().bulk("NGN", &[]);
        assert_eq!(op.error_kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn bulk_transfer_validates_each_item() {
        let (client, wire) = client();
        let op = client.transfer().bulk("NGN", &[TransferRequest::new(100, "CUS_not_a_recipient", "x")]);
        assert_eq!(
            op.errors().unwrap(),
            json!({"transfers.0.recipient": ["The transfers 0 recipient field must start with one of the following: RCP_."]})
        );

        let items = [TransferRequest::new(100, "RCP_a", "one"), TransferRequest::new(200, "RCP_b", " ")];
        let op = client.transfer().bulk("NGN", &items);
        assert_eq!(op.errors().unwrap(), json!({"transfers.1.reason": ["The transfers 1 reason field is required."]}));
        assert!(wire.sent().is_empty());
    }

    #[test]
    fn bulk_recipients_validate_each_entry() {
        let (client, wire) = client();
        let good = BankRecipient::nuban("Ada Obi", "0123456789", "058");
        let bad = BankRecipient::nuban("", "0123456789", "058");
        let op = client.recipient().bulk(&[good.clone(), bad]);
        assert_eq!(
            op.errors().unwrap(),
            json!({"batch.1.name": ["The batch 1 name field is required."]})
        );
        assert!(wire.sent().is_empty());

        assert!(client.recipient().bulk(&[good]).success());
        assert_eq!(wire.last_body()["batch"][0]["type"], "nuban");
    }

    #[test]
    fn recipient_update_and_delete_use_code() {
        let (client, wire) = client();
        assert!(client.recipient().update("RCP_1", "New Name", None).success());
        assert_eq!(wire.last().method, HttpMethod::Put);
        assert_eq!(wire.last_body(), json!({"name": "New Name"}));

        assert!(client.recipient().delete("RCP_1").success());
        assert_eq!(wire.last().method, HttpMethod::Delete);
        assert_eq!(wire.last().url, "https://api.example.test/transferrecipient/RCP_1");
    }

    /// Answers recipient creation with a code, and echoes transfers.
    struct Provider {
        seen: Mutex<Vec<String>>,
    }

    impl Transport for Provider {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.url.clone());
            let body = if request.url.ends_with("/transferrecipient") {
                r#"{"status":true,"data":{"recipient_code":"RCP_new"}}"#
            } else {
                r#"{"status":true,"data":{"status":"pending"}}"#
            };
            Ok(HttpResponse { status: 200, headers: Vec::new(), body: body.to_owned() })
        }
    }

    #[test]
    fn to_bank_account_chains_recipient_and_transfer() {
        let provider = Provider { seen: Mutex::new(Vec::new()) };
        let client = ApiClient::with_transport(Config::new("sk_test"), provider);

        let op = client
            .transfer()
            .to_bank_account(&BankRecipient::nuban("Ada Obi", "0123456789", "058"), 5_000, "Salary");

        assert!(op.success());
        assert_eq!(op.endpoint(), "transfer.initiate");
        assert_eq!(op.data(), Some(&json!({"status": "pending"})));
        let seen = client.transport().seen.lock().unwrap().clone();
        assert_eq!(seen, ["https://api.paystack.co/transferrecipient", "https://api.paystack.co/transfer"]);
    }

    #[test]
    fn to_bank_account_stops_on_invalid_recipient() {
        let (client, wire) = client();
        let op = client.transfer().to_bank_account(&BankRecipient::nuban("Ada", "", "058"), 5_000, "Salary");
        assert_eq!(op.endpoint(), "transfer.recipient.create");
        assert_eq!(op.error_kind(), Some(ErrorKind::Validation));
        assert!(wire.sent().is_empty());
    }
}
