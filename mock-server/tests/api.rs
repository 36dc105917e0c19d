use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_snapshots_the_request() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo/deep/path")
                .header("custom-header", "value-1")
                .body("payload".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo/deep/path");
    assert_eq!(echo.body, "payload");
    assert!(echo
        .headers
        .iter()
        .any(|(name, value)| name == "custom-header" && value == "value-1"));
}

#[tokio::test]
async fn root_echoes_too() {
    let resp = app().oneshot(get("/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/");
}

// --- status ---

#[tokio::test]
async fn status_responds_with_the_requested_code() {
    for code in [204u16, 404, 418, 500] {
        let resp = app().oneshot(get(&format!("/status/{code}"))).await.unwrap();
        assert_eq!(resp.status().as_u16(), code);
    }
}

// --- redirects ---

#[tokio::test]
async fn hop_chain_counts_down_to_landing() {
    let resp = app().oneshot(get("/hop/3")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[http::header::LOCATION], "/hop/2");

    let resp = app().oneshot(get("/hop/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[http::header::LOCATION], "/landing");
}

#[tokio::test]
async fn landing_is_the_end_of_the_chain() {
    let resp = app().oneshot(get("/landing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.as_ref(), b"landed");
}

#[tokio::test]
async fn loop_redirects_to_itself() {
    let resp = app().oneshot(get("/loop")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[http::header::LOCATION], "/loop");
}

// --- form ---

#[tokio::test]
async fn form_echoes_urlencoded_pairs() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("a=1&b=two+words".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let fields: Vec<(String, String)> = body_json(resp).await;
    assert_eq!(
        fields,
        vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "two words".to_string()),
        ]
    );
}

#[tokio::test]
async fn form_rejects_the_wrong_content_type() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("a=1".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- store / lookup ---

#[tokio::test]
async fn lookup_echoes_stored_value_name_and_custom_header() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("PUT")
                .uri("/store/database-key")
                .body("Hello".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("POST")
                .uri("/any/database-key")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header("custom", "magic")
                .body(r#"{"name":"Bob"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reply: serde_json::Value = body_json(resp).await;
    assert_eq!(reply["value"], "Hello Bob magic");
}

#[tokio::test]
async fn lookup_of_an_unknown_key_is_a_bad_request() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/any/missing-key")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"name":"Bob"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
