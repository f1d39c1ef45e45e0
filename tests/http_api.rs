//! Router-level tests for the control API and generic stub dispatch.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use httpmock_server::{MockServer, Stub, StubRequest, StubResponse};

fn test_stub(method: &str, path: &str, body: Option<Value>, response_body: Option<Value>) -> Stub {
    Stub {
        request: StubRequest {
            method: method.to_string(),
            path: path.to_string(),
            query: HashMap::new(),
            body,
        },
        response: StubResponse {
            status_code: 200,
            headers: HashMap::new(),
            body: response_body,
        },
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn registered_stub_is_dispatched() {
    let server = MockServer::new().with_stubs(vec![test_stub(
        "GET",
        "test",
        None,
        Some(json!(r#"{"to":"json"}"#)),
    )]);
    let app = server.router();

    let (status, body) = send(&app, get("/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#""{\"to\":\"json\"}""#);
}

#[tokio::test]
async fn unknown_request_returns_404_with_empty_body() {
    let app = MockServer::new().router();
    let (status, body) = send(&app, get("/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn add_endpoint_accepts_json_stub() {
    let app = MockServer::new().router();

    let (status, body) = send(
        &app,
        post(
            "/httpmock/add",
            r#"{
                "request": {"method": "GET", "path": "/hello"},
                "response": {"status_code": 200, "body": {"message": "hi"}}
            }"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_empty());

    let (status, body) = send(&app, get("/hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"hi"}"#);
}

#[tokio::test]
async fn add_endpoint_accepts_yaml_stub() {
    let app = MockServer::new().router();

    let (status, _) = send(
        &app,
        post(
            "/httpmock/add",
            "request:\n  method: GET\n  path: /yaml\nresponse:\n  status_code: 202\n",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, get("/yaml")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn add_endpoint_rejects_malformed_body() {
    let app = MockServer::new().router();
    let (status, body) = send(&app, post("/httpmock/add", "{not json [nor: yaml")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_empty());
}

#[tokio::test]
async fn add_endpoint_rejects_invalid_stub() {
    let app = MockServer::new().router();
    let (status, _) = send(
        &app,
        post(
            "/httpmock/add",
            r#"{"request": {"method": "", "path": "/x"}, "response": {"status_code": 200}}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn add_endpoint_rejects_wrong_method() {
    let app = MockServer::new().router();
    let (status, _) = send(&app, get("/httpmock/add")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn list_endpoint_rejects_wrong_method() {
    let app = MockServer::new().router();
    let (status, _) = send(&app, post("/httpmock/list", "")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn list_endpoint_returns_empty_array() {
    let app = MockServer::new().router();

    let response = app.clone().oneshot(get("/httpmock/list")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"[]");
}

#[tokio::test]
async fn list_endpoint_returns_registered_stubs() {
    let server = MockServer::new().with_stubs(vec![test_stub("GET", "/a", None, None)]);
    let app = server.router();

    let (status, body) = send(&app, get("/httpmock/list")).await;
    assert_eq!(status, StatusCode::OK);

    let stubs: Vec<Stub> = serde_json::from_str(&body).unwrap();
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].request.path, "/a");
}

#[tokio::test]
async fn second_registration_overrides_first() {
    let app = MockServer::new().router();

    for status_code in [200, 503] {
        let (status, _) = send(
            &app,
            post(
                "/httpmock/add",
                &format!(
                    r#"{{"request": {{"method": "GET", "path": "/x"}}, "response": {{"status_code": {}}}}}"#,
                    status_code
                ),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(&app, get("/x")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn body_matching_ignores_whitespace() {
    let server = MockServer::new().with_stubs(vec![test_stub(
        "POST",
        "/echo",
        Some(json!({"a": 1})),
        Some(json!({"ok": true})),
    )]);
    let app = server.router();

    let (status, _) = send(&app, post("/echo", "{ \"a\" :\n\t1 }")).await;
    assert_eq!(status, StatusCode::OK);

    // different body, no match
    let (status, _) = send(&app, post("/echo", r#"{"a": 2}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // absent body, no match
    let (status, _) = send(&app, post("/echo", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn query_parameters_are_part_of_the_match() {
    let mut stub = test_stub("GET", "/search", None, None);
    stub.request.query = HashMap::from([("q".to_string(), vec!["rust".to_string()])]);
    let app = MockServer::new().with_stubs(vec![stub]).router();

    let (status, _) = send(&app, get("/search?q=rust")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/search?q=other")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/search")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stub_headers_are_copied_onto_the_response() {
    let mut stub = test_stub("GET", "/headers", None, None);
    stub.response.headers = HashMap::from([
        ("X-Custom".to_string(), vec!["a".to_string(), "b".to_string()]),
        ("Content-Type".to_string(), vec!["text/plain".to_string()]),
    ]);
    let app = MockServer::new().with_stubs(vec![stub]).router();

    let response = app.clone().oneshot(get("/headers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
    assert_eq!(response.headers().get_all("X-Custom").iter().count(), 2);
}

#[tokio::test]
async fn absent_response_body_serializes_as_null() {
    let app = MockServer::new()
        .with_stubs(vec![test_stub("GET", "/empty", None, None)])
        .router();

    let (status, body) = send(&app, get("/empty")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[tokio::test]
async fn clearing_the_registry_unregisters_everything() {
    let server = MockServer::new().with_stubs(vec![test_stub("GET", "/test", None, None)]);
    let app = server.router();

    let (status, _) = send(&app, get("/test")).await;
    assert_eq!(status, StatusCode::OK);

    server.registry().clear();
    let (status, _) = send(&app, get("/test")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stubs_are_loaded_from_a_directory_tree() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{"request": {"method": "GET", "path": "/a"}, "response": {"status_code": 200}}"#,
    )
    .unwrap();
    std::fs::write(
        nested.join("b.yaml"),
        "request:\n  method: GET\n  path: /b\nresponse:\n  status_code: 200\n",
    )
    .unwrap();

    let app = MockServer::new().with_stubs_from(dir.path()).router();

    let (status, _) = send(&app, get("/a")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/b")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn servers_do_not_share_registries() {
    let a = MockServer::new().with_stubs(vec![test_stub("GET", "/only-a", None, None)]);
    let b = MockServer::new();

    let (status, _) = send(&a.router(), get("/only-a")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&b.router(), get("/only-a")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
