//! Resource groups.
//!
//! Each group is a thin borrowed view over an `ApiClient`. A method builds the
//! payload, pairs it with the group's rules and hands both to `dispatch`.

use serde::Serialize;
use serde_json::Value;

use crate::client::{to_payload, ApiClient, ResourceRequest};
use crate::operation::{Operation, ResultSink};
use crate::transport::Transport;
use crate::validation::{Payload, Rule, RuleSet, ValidationResult, Validator};

pub mod charge;
pub mod customer;
pub mod dedicated_account;
pub mod invoice;
pub mod subaccount;
pub mod subscription;
pub mod transaction;
pub mod transfer;
pub mod verification;

pub use charge::ChargeApi;
pub use customer::CustomerApi;
pub use dedicated_account::DedicatedAccountApi;
pub use invoice::InvoiceApi;
pub use subaccount::SubaccountApi;
pub use subscription::{PlanApi, SubscriptionApi};
pub use transaction::TransactionApi;
pub use transfer::{RecipientApi, TransferApi};
pub use verification::VerificationApi;

impl<T: Transport> ApiClient<T> {
    pub fn customer(&self) -> CustomerApi<'_, T> {
        CustomerApi::new(self)
    }

    pub fn dedicated_account(&self) -> DedicatedAccountApi<'_, T> {
        DedicatedAccountApi::new(self)
    }

    pub fn transaction(&self) -> TransactionApi<'_, T> {
        TransactionApi::new(self)
    }

    pub fn charge(&self) -> ChargeApi<'_, T> {
        ChargeApi::new(self)
    }

    pub fn transfer(&self) -> TransferApi<'_, T> {
        TransferApi::new(self)
    }

    pub fn recipient(&self) -> RecipientApi<'_, T> {
        RecipientApi::new(self)
    }

    pub fn verification(&self) -> VerificationApi<'_, T> {
        VerificationApi::new(self)
    }

    pub fn invoice(&self) -> InvoiceApi<'_, T> {
        InvoiceApi::new(self)
    }

    pub fn subaccount(&self) -> SubaccountApi<'_, T> {
        SubaccountApi::new(self)
    }

    pub fn subscription(&self) -> SubscriptionApi<'_, T> {
        SubscriptionApi::new(self)
    }

    pub fn plan(&self) -> PlanApi<'_, T> {
        PlanApi::new(self)
    }

    /// Serialize `body`, then dispatch it. A body that does not serialize
    /// into an object fails as a configuration error without sending.
    pub(crate) fn dispatch_typed<B: Serialize>(
        &self,
        request: ResourceRequest,
        body: &B,
        validator: &dyn Validator,
    ) -> Operation {
        match to_payload(body) {
            Ok(payload) => self.dispatch(request.body(payload), validator),
            Err(error) => {
                let mut operation = Operation::new(request.endpoint);
                operation.mark_error(error);
                operation
            }
        }
    }
}

/// Check what the caller supplied before anything is derived from it.
///
/// Returns the serialized payload, or the failed operation for `endpoint`
/// when it does not serialize or breaks `validator`.
pub(crate) fn precheck<B: Serialize>(
    endpoint: &str,
    body: &B,
    validator: &dyn Validator,
) -> Result<Payload, Operation> {
    let mut operation = Operation::new(endpoint);
    let payload = match to_payload(body) {
        Ok(payload) => payload,
        Err(error) => {
            operation.mark_error(error);
            return Err(operation);
        }
    };
    match validator.validate(&payload) {
        ValidationResult::Valid => Ok(payload),
        ValidationResult::Invalid(errors) => {
            tracing::debug!(endpoint, fields = errors.len(), "payload rejected");
            operation.mark_error(errors.into());
            Err(operation)
        }
    }
}

/// Payload from literal pairs.
pub(crate) fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Payload {
    pairs.into_iter().map(|(key, value)| (key.to_owned(), value)).collect()
}

/// Merge caller options into `payload`; keys already set win.
pub(crate) fn merge_options(mut payload: Payload, options: Payload) -> Payload {
    for (key, value) in options {
        payload.entry(key).or_insert(value);
    }
    payload
}

/// `required|string`, the most common identifier rule.
pub(crate) fn required_string() -> [Rule; 3] {
    [Rule::Bail, Rule::Required, Rule::String]
}

/// `perPage` and `page` as optional numbers.
pub(crate) fn pagination_rules() -> RuleSet {
    RuleSet::new()
        .field("perPage", [Rule::Bail, Rule::Nullable, Rule::Numeric])
        .field("page", [Rule::Bail, Rule::Nullable, Rule::Numeric])
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use crate::client::ApiClient;
    use crate::config::Config;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::transport::Transport;

    /// Records every request and answers each with the same 200 body.
    #[derive(Debug, Clone, Default)]
    pub struct Recorder {
        pub requests: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl Recorder {
        pub fn sent(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn last(&self) -> HttpRequest {
            self.sent().pop().expect("no request recorded")
        }

        pub fn last_body(&self) -> serde_json::Value {
            serde_json::from_str(self.last().body.as_deref().unwrap_or("null")).unwrap()
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"status":true,"message":"ok","data":{}}"#.to_owned(),
            })
        }
    }

    pub fn client() -> (ApiClient<Recorder>, Recorder) {
        let recorder = Recorder::default();
        let mut config = Config::new("sk_test_resources");
        config.base_url = "https://api.example.test".to_owned();
        config.app_name = "Acme".to_owned();
        (ApiClient::with_transport(config, recorder.clone()), recorder)
    }
}
