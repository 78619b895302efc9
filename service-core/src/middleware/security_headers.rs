use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Paths that only ever return data (JSON, metrics, downloads) get the
/// strict policy; everything else is an HTML page.
const DATA_PREFIXES: [&str; 3] = ["/api", "/metrics", "/report"];

const PAGE_CSP: &str = "default-src 'self'; \
     script-src 'self'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data:; \
     form-action 'self'; \
     frame-ancestors 'none'";

const DATA_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let path = req.uri().path();
    let is_data_route = DATA_PREFIXES.iter().any(|prefix| path.starts_with(prefix));

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(if is_data_route { DATA_CSP } else { PAGE_CSP }),
    );

    response
}
