use std::{fs, path::Path, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use hyper::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, IF_NONE_MATCH, RANGE};
use spabase_common::{app_state, http::service::service, state::Config};
use tempfile::TempDir;
use tower::ServiceExt;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <base href="./" />
  <link rel="manifest" href="./manifest.json" />
</head>
<body>
  <script src="./static/js/main.js"></script>
</body>
</html>
"#;

const MAIN_JS: &str = r#"fetch("./api/todos")"#;

const SERVICE_WORKER_JS: &str = r#"importScripts("./precache-manifest.abc123.js");"#;

const VIDEO_LENGTH: usize = 4096;

fn video() -> Vec<u8> {
    (0..VIDEO_LENGTH).map(|i| b'a' + (i % 26) as u8).collect()
}

fn build_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let build = dir.path().join("ClientApp/build");
    fs::create_dir_all(build.join("static/js")).unwrap();
    fs::create_dir_all(build.join("static/media")).unwrap();
    fs::write(build.join("index.html"), INDEX_HTML).unwrap();
    fs::write(build.join("static/js/main.js"), MAIN_JS).unwrap();
    fs::write(build.join("service-worker.js"), SERVICE_WORKER_JS).unwrap();
    fs::write(build.join("static/media/video.bin"), video()).unwrap();
    dir
}

fn app(content_root: &Path, configure: impl FnOnce(&mut Config)) -> Router {
    let mut config = Config {
        content_root: content_root.to_path_buf(),
        path_base: Some("/app".to_string()),
        ..Config::default()
    };
    configure(&mut config);

    service(app_state(Arc::new(config)).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, hyper::HeaderMap, String) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, hyper::HeaderMap, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn index_is_rewritten_to_the_mount_prefix() {
    let dir = build_dir();
    let (status, headers, body) = get(app(dir.path(), |_| {}), "/app/index.html").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(headers[CONTENT_LENGTH], body.len().to_string().as_str());
    assert!(body.contains(r#"<base href="/app/" />"#));
    assert!(body.contains(r#"href="/app/manifest.json""#));
    assert!(body.contains(r#"src="/app/static/js/main.js""#));
}

#[tokio::test]
async fn client_routes_fall_back_to_the_default_page() {
    let dir = build_dir();

    for uri in ["/app", "/app/", "/app/todos/42"] {
        let (status, _, body) = get(app(dir.path(), |_| {}), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.contains(r#"src="/app/static/js/main.js""#), "{uri}");
    }
}

#[tokio::test]
async fn other_scripts_are_served_verbatim() {
    let dir = build_dir();
    let (status, headers, body) = get(app(dir.path(), |_| {}), "/app/static/js/main.js").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "text/javascript; charset=utf-8");
    assert_eq!(body, MAIN_JS);
}

#[tokio::test]
async fn service_worker_is_rewritten() {
    let dir = build_dir();
    let (status, _, body) = get(app(dir.path(), |_| {}), "/app/service-worker.js").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"importScripts("/app/precache-manifest.abc123.js");"#);
}

#[tokio::test]
async fn requests_outside_the_mount_use_the_root() {
    let dir = build_dir();
    let (status, _, body) = get(app(dir.path(), |_| {}), "/index.html").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<base href="/" />"#));
}

#[tokio::test]
async fn forwarded_prefix_is_prepended_when_trusted() {
    let dir = build_dir();
    let request = Request::get("/app/index.html")
        .header("x-forwarded-prefix", "/proxy/")
        .body(Body::empty())
        .unwrap();

    let (_, _, body) = send(
        app(dir.path(), |config| config.trust_forwarded_prefix = true),
        request,
    )
    .await;
    assert!(body.contains(r#"<base href="/proxy/app/" />"#));

    let request = Request::get("/app/index.html")
        .header("x-forwarded-prefix", "/proxy/")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(app(dir.path(), |_| {}), request).await;
    assert!(body.contains(r#"<base href="/app/" />"#));
}

#[tokio::test]
async fn forwarded_prefix_cannot_inject_markup() {
    let dir = build_dir();
    let request = Request::get("/app/index.html")
        .header("x-forwarded-prefix", r#"/x"><script>alert(1)</script>"#)
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(
        app(dir.path(), |config| config.trust_forwarded_prefix = true),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains(r#"/x"><script>"#));
    assert!(body.contains(
        r#"<base href="/x%22%3E%3Cscript%3Ealert%281%29%3C/script%3E/app/" />"#
    ));
}

#[tokio::test]
async fn relative_forwarded_prefix_is_ignored() {
    let dir = build_dir();
    let request = Request::get("/app/index.html")
        .header("x-forwarded-prefix", "javascript:alert(1)")
        .body(Body::empty())
        .unwrap();

    let (_, _, body) = send(
        app(dir.path(), |config| config.trust_forwarded_prefix = true),
        request,
    )
    .await;
    assert!(body.contains(r#"<base href="/app/" />"#));
}

#[tokio::test]
async fn plain_files_are_streamed_whole() {
    let dir = build_dir();
    let (status, headers, body) = get(app(dir.path(), |_| {}), "/app/static/media/video.bin").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "application/octet-stream");
    assert_eq!(headers[CONTENT_LENGTH], VIDEO_LENGTH.to_string().as_str());
    assert!(headers.contains_key(ETAG));
    assert_eq!(body.as_bytes(), video().as_slice());
}

#[tokio::test]
async fn range_requests_get_partial_content() {
    let dir = build_dir();
    let request = Request::get("/app/static/media/video.bin")
        .header(RANGE, "bytes=0-9")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(app(dir.path(), |_| {}), request).await;

    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(headers[CONTENT_RANGE], "bytes 0-9/4096");
    assert_eq!(headers[CONTENT_LENGTH], "10");
    assert_eq!(body, "abcdefghij");
}

#[tokio::test]
async fn matching_etag_returns_not_modified() {
    let dir = build_dir();
    let (_, headers, _) = get(app(dir.path(), |_| {}), "/app/static/js/main.js").await;
    let etag = headers[ETAG].clone();

    let request = Request::get("/app/static/js/main.js")
        .header(IF_NONE_MATCH, etag)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app(dir.path(), |_| {}), request).await;

    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn head_returns_headers_only() {
    let dir = build_dir();
    let request = Request::head("/app/static/js/main.js")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(app(dir.path(), |_| {}), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_LENGTH], MAIN_JS.len().to_string().as_str());
    assert!(body.is_empty());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let dir = build_dir();
    let request = Request::post("/app/index.html")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app(dir.path(), |_| {}), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn missing_root_directory_serves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, _) = get(app(dir.path(), |_| {}), "/app/index.html").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_default_page_is_not_found() {
    let dir = build_dir();
    let (status, _, _) = get(
        app(dir.path(), |config| config.default_page = "404.html".to_string()),
        "/app/nothing-here",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn empty_root_path_fails_before_serving() {
    let config = Config {
        root_path: String::new(),
        ..Config::default()
    };

    let err = app_state(Arc::new(config)).err().unwrap();
    assert!(err.to_string().contains("root_path"));
}
