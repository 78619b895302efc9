#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use radiograph_service::services::providers::VisionProvider;
use radiograph_service::services::{AnalysisClient, SessionRegistry};
use radiograph_service::startup::{build_router, RouterOptions};
use radiograph_service::AppState;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "----radiograph-test-boundary";

/// Minimal PNG signature plus padding; the service never decodes images.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR fake radiograph";

/// Router plus a handle on its state, driven through `oneshot`.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    cookie: Option<String>,
}

impl TestApp {
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        Self::with_options(provider, RouterOptions::default())
    }

    pub fn with_options(provider: Arc<dyn VisionProvider>, options: RouterOptions) -> Self {
        let state = AppState::new(AnalysisClient::new(provider), SessionRegistry::new());
        let router = build_router(state.clone(), &options);
        Self {
            router,
            state,
            cookie: None,
        }
    }

    /// Send a request with the current session cookie, remembering any new one.
    pub async fn send(&mut self, request: Request<Body>) -> Response<Body> {
        let response = self
            .router
            .clone()
            .oneshot(with_cookie(request, self.cookie.as_deref()))
            .await
            .expect("router is infallible");

        if let Some(cookie) = session_cookie(&response) {
            self.cookie = Some(cookie);
        }
        response
    }

    pub fn cookie(&self) -> Option<String> {
        self.cookie.clone()
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&mut self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn upload(
        &mut self,
        filename: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Response<Body> {
        self.send(upload_request(filename, content_type, data)).await
    }

    pub async fn session_json(&mut self) -> serde_json::Value {
        let response = self.get("/api/session").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }
}

pub fn with_cookie(mut request: Request<Body>, cookie: Option<&str>) -> Request<Body> {
    if let Some(cookie) = cookie {
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
    }
    request
}

/// `name=value` part of the session `Set-Cookie` header, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string())
}

pub fn multipart_body(filename: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(filename: &str, content_type: Option<&str>, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, content_type, data)))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("body is utf-8")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Failed to parse JSON")
}
