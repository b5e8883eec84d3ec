use super::required_string;
use crate::client::{ApiClient, ResourceRequest};
use crate::operation::Operation;
use crate::transport::Transport;
use crate::types::UssdCharge;
use crate::validation::{Rule, RuleSet, Schema};

#[derive(Debug, Clone, Copy)]
pub struct ChargeApi<'a, T: Transport> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> ChargeApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Charge through a bank's USSD menu. `data.ussd_code` is the code the
    /// customer dials.
    pub fn ussd(&self, charge: &UssdCharge) -> Operation {
        let schema = Schema::new(
            RuleSet::new()
                .field("amount", [Rule::Bail, Rule::Required, Rule::Numeric])
                .field("email", [Rule::Bail, Rule::Required, Rule::Email])
                .field("ussd.type", required_string()),
        );
        self.client
            .dispatch_typed(ResourceRequest::post("charge.create"), charge, &schema)
    }
}
