//! In-memory stand-in for the Paystack API.
//!
//! Covers the routes the integration tests drive: customers, transaction
//! initialize/verify, banks, transfer recipients and transfers. Every reply
//! uses the provider envelope `{"status", "message", "data"}`; requests
//! without a `Bearer sk_test_…` key are refused with 401.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const KEY_PREFIX: &str = "sk_test_";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: u64,
    pub customer_code: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Deserialize)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Deserialize)]
pub struct CustomerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct Paging {
    #[serde(rename = "perPage", default = "default_per_page")]
    pub per_page: usize,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_per_page() -> usize {
    50
}

fn default_page() -> usize {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub reference: String,
    pub amount: u64,
    pub currency: String,
    pub email: String,
    pub status: String,
}

#[derive(Default)]
pub struct Store {
    customers: Vec<Customer>,
    transactions: HashMap<String, Transaction>,
    recipients: HashMap<String, Value>,
}

pub type Db = Arc<RwLock<Store>>;

/// Provider error reply.
fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"status": false, "message": message}))).into_response()
}

fn success(status: StatusCode, message: &str, data: Value) -> Response {
    (status, Json(json!({"status": true, "message": message, "data": data}))).into_response()
}

fn code(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[..15])
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/customer", get(list_customers).post(create_customer))
        .route("/customer/{code}", get(fetch_customer).put(update_customer))
        .route("/transaction/initialize", post(initialize_transaction))
        .route("/transaction/verify/{reference}", get(verify_transaction))
        .route("/bank", get(list_banks))
        .route("/transferrecipient", post(create_recipient))
        .route("/transfer", post(initiate_transfer))
        .layer(middleware::from_fn(require_secret_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_secret_key(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|key| key.starts_with(KEY_PREFIX) && key.len() > KEY_PREFIX.len());
    if !authorized {
        return failure(StatusCode::UNAUTHORIZED, "Invalid key");
    }
    next.run(request).await
}

async fn create_customer(State(db): State<Db>, Json(input): Json<NewCustomer>) -> Response {
    if !input.email.contains('@') {
        return failure(StatusCode::BAD_REQUEST, "Invalid email address passed");
    }
    let mut store = db.write().await;
    if let Some(existing) = store.customers.iter().find(|c| c.email == input.email) {
        let data = serde_json::to_value(existing).unwrap_or_default();
        return success(StatusCode::OK, "Customer already exists", data);
    }
    let customer = Customer {
        id: store.customers.len() as u64 + 1,
        customer_code: code("CUS"),
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
        phone: input.phone_number,
        metadata: input.metadata,
    };
    store.customers.push(customer.clone());
    success(
        StatusCode::OK,
        "Customer created",
        serde_json::to_value(customer).unwrap_or_default(),
    )
}

async fn list_customers(State(db): State<Db>, Query(paging): Query<Paging>) -> Response {
    let store = db.read().await;
    let per_page = paging.per_page.max(1);
    let skip = paging.page.saturating_sub(1) * per_page;
    let page: Vec<&Customer> = store.customers.iter().skip(skip).take(per_page).collect();
    Json(json!({
        "status": true,
        "message": "Customers retrieved",
        "data": page,
        "meta": {"total": store.customers.len(), "perPage": per_page, "page": paging.page},
    }))
    .into_response()
}

async fn fetch_customer(State(db): State<Db>, Path(code): Path<String>) -> Response {
    let store = db.read().await;
    match store
        .customers
        .iter()
        .find(|c| c.customer_code == code || c.email == code)
    {
        Some(customer) => success(
            StatusCode::OK,
            "Customer retrieved",
            serde_json::to_value(customer).unwrap_or_default(),
        ),
        None => failure(StatusCode::NOT_FOUND, "Customer not found"),
    }
}

async fn update_customer(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<CustomerUpdate>,
) -> Response {
    let mut store = db.write().await;
    let Some(customer) = store.customers.iter_mut().find(|c| c.customer_code == code) else {
        return failure(StatusCode::NOT_FOUND, "Customer not found");
    };
    if let Some(first_name) = input.first_name {
        customer.first_name = Some(first_name);
    }
    if let Some(last_name) = input.last_name {
        customer.last_name = Some(last_name);
    }
    if let Some(phone) = input.phone_number {
        customer.phone = Some(phone);
    }
    success(
        StatusCode::OK,
        "Customer updated",
        serde_json::to_value(&*customer).unwrap_or_default(),
    )
}

async fn initialize_transaction(State(db): State<Db>, Json(input): Json<Value>) -> Response {
    let Some(email) = input.get("email").and_then(Value::as_str) else {
        return failure(StatusCode::BAD_REQUEST, "Email is required");
    };
    let Some(amount) = input.get("amount").and_then(Value::as_u64) else {
        return failure(StatusCode::BAD_REQUEST, "Invalid amount");
    };
    let reference = input
        .get("reference")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let mut store = db.write().await;
    if store.transactions.contains_key(&reference) {
        return failure(StatusCode::BAD_REQUEST, "Duplicate Transaction Reference");
    }
    let transaction = Transaction {
        reference: reference.clone(),
        amount,
        currency: input
            .get("currency")
            .and_then(Value::as_str)
            .unwrap_or("NGN")
            .to_owned(),
        email: email.to_owned(),
        status: "success".to_owned(),
    };
    store.transactions.insert(reference.clone(), transaction);
    let access_code = code("AC");
    success(
        StatusCode::OK,
        "Authorization URL created",
        json!({
            "authorization_url": format!("https://checkout.paystack.com/{access_code}"),
            "access_code": access_code,
            "reference": reference,
        }),
    )
}

async fn verify_transaction(State(db): State<Db>, Path(reference): Path<String>) -> Response {
    let store = db.read().await;
    match store.transactions.get(&reference) {
        Some(transaction) => success(
            StatusCode::OK,
            "Verification successful",
            serde_json::to_value(transaction).unwrap_or_default(),
        ),
        None => failure(StatusCode::BAD_REQUEST, "Transaction reference not found"),
    }
}

async fn list_banks() -> Response {
    success(
        StatusCode::OK,
        "Banks retrieved",
        json!([
            {"name": "Access Bank", "slug": "access-bank", "code": "044", "country": "Nigeria", "currency": "NGN"},
            {"name": "Guaranty Trust Bank", "slug": "guaranty-trust-bank", "code": "058", "country": "Nigeria", "currency": "NGN"},
            {"name": "Wema Bank", "slug": "wema-bank", "code": "035", "country": "Nigeria", "currency": "NGN"},
        ]),
    )
}

async fn create_recipient(State(db): State<Db>, Json(input): Json<Value>) -> Response {
    let field = |name: &str| input.get(name).and_then(Value::as_str).unwrap_or_default().to_owned();
    let (name, account_number, bank_code) = (field("name"), field("account_number"), field("bank_code"));
    if account_number.len() != 10 {
        return failure(StatusCode::BAD_REQUEST, "Account number is invalid");
    }
    let recipient = json!({
        "recipient_code": code("RCP"),
        "type": field("type"),
        "name": name,
        "currency": field("currency"),
        "details": {"account_number": account_number, "bank_code": bank_code},
    });
    let recipient_code = recipient["recipient_code"].as_str().unwrap_or_default().to_owned();
    db.write().await.recipients.insert(recipient_code, recipient.clone());
    success(StatusCode::CREATED, "Transfer recipient created successfully", recipient)
}

async fn initiate_transfer(State(db): State<Db>, Json(input): Json<Value>) -> Response {
    let recipient = input.get("recipient").and_then(Value::as_str).unwrap_or_default();
    if !db.read().await.recipients.contains_key(recipient) {
        return failure(StatusCode::BAD_REQUEST, "Recipient specified is invalid");
    }
    success(
        StatusCode::OK,
        "Transfer has been queued",
        json!({
            "transfer_code": code("TRF"),
            "reference": input.get("reference").cloned().unwrap_or(Value::Null),
            "reason": input.get("reason").cloned().unwrap_or(Value::Null),
            "amount": input.get("amount").cloned().unwrap_or(Value::Null),
            "status": "pending",
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_serializes_with_provider_keys() {
        let customer = Customer {
            id: 1,
            customer_code: "CUS_abc".to_string(),
            email: "ada@example.com".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            phone: None,
            metadata: Value::Null,
        };
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["customer_code"], "CUS_abc");
        assert_eq!(json["last_name"], Value::Null);
    }

    #[test]
    fn new_customer_requires_email() {
        let result: Result<NewCustomer, _> = serde_json::from_str(r#"{"first_name":"Ada"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn paging_defaults_apply() {
        let paging: Paging = serde_json::from_str("{}").unwrap();
        assert_eq!((paging.per_page, paging.page), (50, 1));
    }

    #[test]
    fn generated_codes_carry_prefix() {
        let code = code("CUS");
        assert!(code.starts_with("CUS_"));
        assert_eq!(code.len(), 19);
    }
}
