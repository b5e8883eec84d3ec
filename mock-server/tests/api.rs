use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "Bearer sk_test_mock";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, KEY)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, KEY)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_key_is_refused() {
    let resp = app()
        .oneshot(Request::builder().uri("/bank").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({"status": false, "message": "Invalid key"}));
}

#[tokio::test]
async fn live_key_is_refused() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/bank")
                .header(http::header::AUTHORIZATION, "Bearer sk_live_real")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- banks ---

#[tokio::test]
async fn banks_are_listed() {
    let resp = app().oneshot(get_request("/bank")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], true);
    assert_eq!(body["data"][1]["code"], "058");
}

// --- customers ---

#[tokio::test]
async fn create_customer_returns_code() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/customer",
            r#"{"email":"ada@example.com","first_name":"Ada","phone_number":"0800"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["data"]["customer_code"].as_str().unwrap().starts_with("CUS_"));
    assert_eq!(body["data"]["phone"], "0800");
}

#[tokio::test]
async fn create_customer_rejects_bad_email() {
    let resp = app()
        .oneshot(json_request("POST", "/customer", r#"{"email":"nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "Invalid email address passed");
}

#[tokio::test]
async fn create_customer_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/customer", r#"{"first_name":"Ada"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let raw = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&raw).is_err());
}

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let resp = app().oneshot(get_request("/customer/CUS_missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["status"], false);
}

// --- transactions ---

#[tokio::test]
async fn unknown_reference_fails_verification() {
    let resp = app().oneshot(get_request("/transaction/verify/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "Transaction reference not found");
}

// --- transfers ---

#[tokio::test]
async fn transfer_to_unknown_recipient_fails() {
    let resp = app()
        .oneshot(json_request("POST", "/transfer", r#"{"amount":100,"recipient":"RCP_x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- lifecycles over one app instance ---

#[tokio::test]
async fn customer_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/customer", r#"{"email":"ada@example.com","first_name":"Ada"}"#))
        .await
        .unwrap();
    let created = body_json(resp).await;
    let code = created["data"]["customer_code"].as_str().unwrap().to_string();

    // Same email again returns the existing record.
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/customer", r#"{"email":"ada@example.com"}"#))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["data"]["customer_code"], code.as_str());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", &format!("/customer/{code}"), r#"{"last_name":"Obi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/customer/ada@example.com"))
        .await
        .unwrap();
    let fetched = body_json(resp).await;
    assert_eq!(fetched["data"]["last_name"], "Obi");
    assert_eq!(fetched["data"]["first_name"], "Ada");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/customer?perPage=1&page=1"))
        .await
        .unwrap();
    let listed = body_json(resp).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["meta"]["total"], 1);
}

#[tokio::test]
async fn transaction_and_transfer_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/transaction/initialize",
            r#"{"email":"ada@example.com","amount":20000,"reference":"ref-1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["data"]["reference"], "ref-1");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/transaction/initialize",
            r#"{"email":"ada@example.com","amount":20000,"reference":"ref-1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/transaction/verify/ref-1"))
        .await
        .unwrap();
    let verified = body_json(resp).await;
    assert_eq!(verified["data"]["amount"], 20000);
    assert_eq!(verified["data"]["status"], "success");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/transferrecipient",
            r#"{"type":"nuban","name":"Ada","account_number":"0123456789","bank_code":"058","currency":"NGN"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let recipient = body_json(resp).await["data"]["recipient_code"].as_str().unwrap().to_string();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/transfer",
            &json!({"amount": 500, "recipient": recipient, "reason": "x"}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["status"], "pending");
}
