mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};

use common::TestApp;

#[tokio::test]
async fn preflight_lists_methods_in_a_proper_header() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/app/journalentries/delete/a")
        .header(header::ORIGIN, "http://localhost:4200")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
        .body(Body::empty())
        .unwrap();

    let res = app.send(request).await;
    assert_eq!(res.status(), StatusCode::OK);

    let headers = res.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "missing {} in {}", method, methods);
    }
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap().to_ascii_lowercase();
    for name in ["origin", "x-requested-with", "content-type", "accept"] {
        assert!(allowed.contains(name), "missing {} in {}", name, allowed);
    }
}

#[tokio::test]
async fn simple_requests_allow_any_origin() {
    let app = TestApp::new();
    let request = Request::get("/app/quotes")
        .header(header::ORIGIN, "http://localhost:4200")
        .body(Body::empty())
        .unwrap();

    let res = app.send(request).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
