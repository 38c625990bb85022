use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::Client;
use serde_json::Value;
use tower::ServiceExt;

// base64("admin:secret")
const BASIC: &str = "Basic YWRtaW46c2VjcmV0";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, BASIC)
        .body(String::new())
        .unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, BASIC)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn app() -> axum::Router {
    mock_server::app("admin", "secret")
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/clients/getAll.json").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert!(body["response"].is_null());
    assert!(body["message"].as_str().unwrap().contains("authorization"));
}

#[tokio::test]
async fn header_credentials_are_accepted() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/debug/echo.json")
                .header("BLESTA-API-USER", "admin")
                .header("BLESTA-API-KEY", "secret")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["response"]["auth"], "header");
}

// --- routing ---

#[tokio::test]
async fn unknown_endpoint_returns_404_without_errors_field() {
    let resp = app().oneshot(request("GET", "/api/widgets/get.json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert!(body.get("errors").is_none());
    assert!(body["response"].is_null());
}

#[tokio::test]
async fn missing_format_suffix_returns_404() {
    let resp = app().oneshot(request("GET", "/api/clients/getAll")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn crash_endpoint_returns_plain_text() {
    let resp = app().oneshot(request("GET", "/api/debug/crash.json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

#[tokio::test]
async fn echo_reports_query_and_body() {
    let resp = app()
        .oneshot(form_request("PUT", "/api/debug/echo.json?x=1", "a=b"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let echo = &body["response"];
    assert_eq!(echo["method"], "PUT");
    assert_eq!(echo["query"], "x=1");
    assert_eq!(echo["body"], "a=b");
    assert_eq!(echo["content_type"], "application/x-www-form-urlencoded");
    assert_eq!(echo["auth"], "basic");
}

// --- clients ---

#[tokio::test]
async fn add_client_with_bad_email_returns_errors() {
    let resp = app()
        .oneshot(form_request("POST", "/api/clients/add.json", "vars%5Bemail%5D=nope"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["errors"]["email"]["format"], "Please enter a valid email address.");
}

#[tokio::test]
async fn get_unknown_client_returns_null_response() {
    let resp = app().oneshot(request("GET", "/api/clients/get.json?client_id=99")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["response"].is_null());
}

#[tokio::test]
async fn wrong_verb_returns_404() {
    let resp = app().oneshot(request("GET", "/api/clients/delete.json?client_id=1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full client lifecycle ---

#[tokio::test]
async fn client_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // add
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "POST",
            "/api/clients/add.json",
            "vars%5Bfirst_name%5D=Jane&vars%5Blast_name%5D=Doe&vars%5Bemail%5D=jane%40example.com",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Client = serde_json::from_value(body_json(resp).await["response"].take()).unwrap();
    assert_eq!(created.first_name, "Jane");
    assert_eq!(created.email, "jane@example.com");
    let id = created.id;

    // getAll: should contain the one client
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/api/clients/getAll.json"))
        .await
        .unwrap();
    let all = body_json(resp).await;
    assert_eq!(all["response"].as_array().unwrap().len(), 1);

    // edit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "PUT",
            "/api/clients/edit.json",
            &format!("client_id={id}&vars%5Blast_name%5D=Smith"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let edited = body_json(resp).await;
    assert_eq!(edited["response"]["last_name"], "Smith");
    assert_eq!(edited["response"]["first_name"], "Jane"); // unchanged

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/api/clients/get.json?client_id={id}")))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["response"]["last_name"], "Smith");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request("DELETE", "/api/clients/delete.json", &format!("client_id={id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["response"], true);

    // delete again: 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request("DELETE", "/api/clients/delete.json", &format!("client_id={id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
