//! Integration tests for middleware functionality.

use bytes::Bytes;
use courier::{HttpClient, HyperClient, Method, Request};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn get(server: &MockServer, path: &str) -> Request<Bytes> {
    let url = url::Url::parse(&format!("{}{path}", server.uri())).expect("url");
    Request::builder(Method::Get, url).build()
}

#[tokio::test]
async fn test_token_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/meters"))
        .and(header("X-Auth-Token", "gAAAAABk-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_token_auth("gAAAAABk-token").build();
    let response = client
        .execute(get(&mock_server, "/v2/meters"))
        .await
        .expect("response");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_bearer_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .and(header("Authorization", "Bearer my-secret-token"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .with_bearer_auth("my-secret-token")
        .build();
    let response = client
        .execute(get(&mock_server, "/protected"))
        .await
        .expect("response");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_request_header_wins_over_auth_layer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/scoped"))
        .and(header("X-Auth-Token", "per-call"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_token_auth("default").build();
    let mut request = get(&mock_server, "/scoped");
    request
        .headers_mut()
        .insert("X-Auth-Token".to_string(), "per-call".to_string());

    let response = client.execute(request).await.expect("response");
    assert!(response.is_success());
}

#[tokio::test]
async fn test_logging_middleware() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"logged": true})))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_debug_logging().build();
    let response = client
        .execute(get(&mock_server, "/logged"))
        .await
        .expect("response");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_middleware_composition() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/composed"))
        .and(header("X-Auth-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .with_retry(2)
        .with_token_auth("test-token")
        .with_concurrency_limit(4)
        .with_logging()
        .build();

    let response = client
        .execute(get(&mock_server, "/composed"))
        .await
        .expect("response");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_no_retry_on_client_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/not-found"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_retry(3).build();
    let response = client
        .execute(get(&mock_server, "/not-found"))
        .await
        .expect("response");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // initial + 2 retries
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_retry(2).build();
    let response = client
        .execute(get(&mock_server, "/error"))
        .await
        .expect("response");

    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_no_retry_for_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/alarms"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_retry(2).build();
    let url = url::Url::parse(&format!("{}/v2/alarms", mock_server.uri())).expect("url");
    let request = Request::builder(Method::Post, url)
        .json(&serde_json::json!({"name": "cpu_high"}))
        .expect("json")
        .build();

    let response = client.execute(request).await.expect("response");
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_generic_layer_api() {
    use courier::middleware::{AuthHeaderLayer, AuthScheme};

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/custom-layer"))
        .and(header("Authorization", "Bearer custom-token"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .layer(AuthHeaderLayer::new(AuthScheme::Bearer, "custom-token"))
        .build();
    let response = client
        .execute(get(&mock_server, "/custom-layer"))
        .await
        .expect("response");

    assert!(response.is_success());
}
