#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use recoverly_api::auth::{AuthError, IdentityProvider, ProviderProfile};
use recoverly_api::config::AppConfig;
use recoverly_api::database::{DocumentStore, MemoryDocumentStore};
use recoverly_api::{router, AppState};

/// Authorization code the fake provider accepts
pub const GOOD_CODE: &str = "good-code";

/// Identity provider that never leaves the process
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.example.test/auth?scope=profile&state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError> {
        if code == GOOD_CODE {
            Ok(ProviderProfile {
                id: "10769150350006150715113082367".to_string(),
                display_name: "Test Person".to_string(),
            })
        } else {
            Err(AuthError::Exchange("invalid_grant".to_string()))
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::in_memory())
    }

    pub fn with_config(mut config: AppConfig) -> Self {
        config.server.pages_dir = "tests/does-not-exist".to_string();
        config.server.json_dir = "tests/does-not-exist".to_string();
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let state = AppState::new(config, store.clone(), Arc::new(FakeProvider));
        Self {
            router: router(state),
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    /// Run the OAuth round trip against the fake provider; returns the Cookie header value
    pub async fn login(&self) -> String {
        let start = self.get("/auth/google", None).await;
        assert_eq!(start.status(), StatusCode::FOUND);
        let state = query_param(location(&start), "state").expect("state in redirect");

        let callback = self
            .get(&format!("/auth/google/callback?code={}&state={}", GOOD_CODE, state), None)
            .await;
        assert_eq!(callback.status(), StatusCode::FOUND);
        set_cookie(&callback).expect("session cookie")
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// `name=value` part of the response's Set-Cookie header
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string())
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned());
    value
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let text = body_text(response).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("invalid JSON body {:?}: {}", text, e))
}

/// The real binary on a free port; killed when dropped
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_recoverly-api"));
        cmd.env("PORT", port.to_string())
            .env("DATABASE_URL", "memory:")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
