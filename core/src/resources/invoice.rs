use super::{merge_options, pagination_rules, required_string};
use crate::client::{to_payload, ApiClient, ResourceRequest};
use crate::operation::{Operation, ResultSink};
use crate::transport::Transport;
use crate::types::{NewInvoice, Pagination};
use crate::validation::{Payload, Rule, RuleSet, Schema};

/// Payment requests.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

fn invoice_id_schema() -> Schema {
    Schema::new(RuleSet::new().field("invoice_id", required_string()))
}

impl<'a, T: Transport> InvoiceApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Create a plain invoice (by `amount`) or a product invoice (by
    /// `line_items`), depending on how `invoice` was built.
    pub fn create(&self, invoice: &NewInvoice) -> Operation {
        let mut rules = RuleSet::new()
            .field("customer", required_string())
            .field("due_date", [Rule::Bail, Rule::Required, Rule::Date])
            .field("currency", [Rule::Bail, Rule::Required, Rule::String, Rule::Size(3)]);
        rules = if invoice.line_items.is_some() {
            rules.field("line_items", [Rule::Bail, Rule::Required, Rule::Array])
        } else {
            rules.field("amount", [Rule::Bail, Rule::Required, Rule::Numeric])
        };
        self.client
            .dispatch_typed(ResourceRequest::post("invoice.create"), invoice, &Schema::new(rules))
    }

    /// List invoices; `filters` may narrow by customer, status or currency.
    pub fn list(&self, page: Pagination, filters: Payload) -> Operation {
        let body = match to_payload(&page) {
            Ok(body) => merge_options(body, filters),
            Err(error) => {
                let mut operation = Operation::new("invoice.list");
                operation.mark_error(error);
                return operation;
            }
        };
        self.client.dispatch(
            ResourceRequest::get("invoice.list").body(body),
            &Schema::new(pagination_rules()),
        )
    }

    pub fn fetch(&self, id_or_code: &str) -> Operation {
        self.by_code(ResourceRequest::get("invoice.fetch"), id_or_code)
    }

    pub fn verify(&self, code: &str) -> Operation {
        self.by_code(ResourceRequest::get("invoice.verify"), code)
    }

    /// Send a reminder to the invoice's customer.
    pub fn send_reminder(&self, code: &str) -> Operation {
        self.by_code(ResourceRequest::post("invoice.notify"), code)
    }

    /// Pending, successful and total amounts across invoices.
    pub fn totals(&self) -> Operation {
        self.client.dispatch(ResourceRequest::get("invoice.totals"), &Schema::none())
    }

    /// Turn a draft into a live invoice.
    pub fn finalize(&self, code: &str) -> Operation {
        self.by_code(ResourceRequest::post("invoice.finalize"), code)
    }

    pub fn update(&self, id_or_code: &str, changes: Payload) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("invoice_id", required_string())
                .field("due_date", [Rule::Bail, Rule::Nullable, Rule::Date])
                .field("amount", [Rule::Bail, Rule::Nullable, Rule::Numeric])
                .field("line_items", [Rule::Bail, Rule::Nullable, Rule::Array]),
        );
        let request = ResourceRequest::put("invoice.update")
            .path_param_as("invoice_id", id_or_code)
            .body(changes);
        self.client.dispatch(request, &schema)
    }

    pub fn archive(&self, code: &str) -> Operation {
        self.by_code(ResourceRequest::post("invoice.archive"), code)
    }

    fn by_code(&self, request: ResourceRequest, code: &str) -> Operation {
        self.client
            .dispatch(request.path_param_as("invoice_id", code), &invoice_id_schema())
    }
}
