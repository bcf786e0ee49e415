//! Admission middleware applied to every non-exempt request.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::admission::AdmissionDecision;
use crate::error::DoormanError;

use super::server::AppState;

/// Operational endpoints that bypass admission control entirely.
pub const EXEMPT_PATHS: [&str; 5] = ["/", "/health", "/docs", "/redoc", "/openapi.json"];

/// Derive the fairness key for a request.
///
/// Prefers the first entry of `X-Forwarded-For`, then the connection peer
/// address. Unattributable requests all share the `"unknown"` bucket; a
/// missing or malformed source is never an error. This key is not an
/// authentication signal.
pub fn derive_client_id(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Check the sliding window before forwarding a request, and stamp quota
/// telemetry on whatever goes back out.
pub async fn admit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let client_id = derive_client_id(&request);
    let decision = state.limiter.check(&client_id, state.clock.now());

    if !decision.admitted {
        debug!(
            client_id = %client_id,
            path = %request.uri().path(),
            "Request rejected by admission control"
        );
        return DoormanError::QuotaExceeded {
            limit: decision.limit,
            retry_after_secs: decision.reset_seconds,
        }
        .into_response();
    }

    let mut response = next.run(request).await;
    stamp_quota_headers(&mut response, &decision);
    response
}

fn stamp_quota_headers(response: &mut Response, decision: &AdmissionDecision) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", decision.limit.into());
    headers.insert("x-ratelimit-remaining", decision.remaining.into());
    headers.insert("x-ratelimit-reset", decision.reset_seconds.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{ManualClock, SlidingWindowLimiter};
    use crate::auth::{MemoryIdentityStore, SessionManager, TokenCodec};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Router};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tower::ServiceExt;

    fn test_router(capacity: u32, window_secs: u64) -> (Router, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Instant::now()));
        let store = Arc::new(MemoryIdentityStore::new());
        let state = AppState {
            limiter: Arc::new(SlidingWindowLimiter::new(
                capacity,
                Duration::from_secs(window_secs),
            )),
            sessions: Arc::new(SessionManager::new(
                TokenCodec::new("test-secret"),
                store,
                Duration::from_secs(1800),
                Duration::from_secs(7 * 86400),
            )),
            clock: clock.clone(),
        };

        let router = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route("/health", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state.clone(), admit))
            .with_state(state);

        (router, clock)
    }

    fn request(path: &str, client: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header("x-forwarded-for", client)
            .body(Body::empty())
            .unwrap()
    }

    fn header_value(response: &axum::response::Response, name: &str) -> String {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn test_admitted_response_carries_quota_headers() {
        let (router, _clock) = test_router(3, 60);

        let response = router.oneshot(request("/protected", "1.2.3.4")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, "x-ratelimit-limit"), "3");
        assert_eq!(header_value(&response, "x-ratelimit-remaining"), "2");
        assert_eq!(header_value(&response, "x-ratelimit-reset"), "60");
    }

    #[tokio::test]
    async fn test_exhausted_client_receives_429_with_retry_after() {
        let (router, _clock) = test_router(2, 60);

        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(request("/protected", "1.2.3.4"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = router.oneshot(request("/protected", "1.2.3.4")).await.unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(header_value(&response, "x-ratelimit-limit"), "2");
        assert_eq!(header_value(&response, "x-ratelimit-remaining"), "0");
        let reset = header_value(&response, "x-ratelimit-reset");
        assert_eq!(header_value(&response, header::RETRY_AFTER.as_str()), reset);
        assert!(reset.parse::<u64>().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_quota_reopens_after_window_advances() {
        let (router, clock) = test_router(1, 60);

        let first = router
            .clone()
            .oneshot(request("/protected", "1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        clock.advance(Duration::from_secs(10));
        let second = router
            .clone()
            .oneshot(request("/protected", "1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        clock.advance(Duration::from_secs(51));
        let third = router.oneshot(request("/protected", "1.2.3.4")).await.unwrap();
        assert_eq!(third.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_exempt_path_is_never_limited() {
        let (router, _clock) = test_router(1, 60);

        for _ in 0..5 {
            let response = router
                .clone()
                .oneshot(request("/health", "1.2.3.4"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get("x-ratelimit-limit").is_none());
        }
    }

    #[tokio::test]
    async fn test_clients_are_limited_independently() {
        let (router, _clock) = test_router(1, 60);

        assert_eq!(
            router
                .clone()
                .oneshot(request("/protected", "1.2.3.4"))
                .await
                .unwrap()
                .status(),
            StatusCode::OK
        );
        assert_eq!(
            router
                .clone()
                .oneshot(request("/protected", "5.6.7.8"))
                .await
                .unwrap()
                .status(),
            StatusCode::OK
        );
        assert_eq!(
            router
                .oneshot(request("/protected", "1.2.3.4"))
                .await
                .unwrap()
                .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_unattributable_requests_share_one_bucket() {
        let (router, _clock) = test_router(1, 60);

        // No forwarded header and no peer info degrades to "unknown".
        let bare = |path: &str| {
            Request::builder()
                .uri(path.to_string())
                .body(Body::empty())
                .unwrap()
        };

        assert_eq!(
            router.clone().oneshot(bare("/protected")).await.unwrap().status(),
            StatusCode::OK
        );
        assert_eq!(
            router.oneshot(bare("/protected")).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_derive_client_id_prefers_first_forwarded_entry() {
        let request = Request::builder()
            .uri("/protected")
            .header("x-forwarded-for", " 10.0.0.1 , 10.0.0.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(derive_client_id(&request), "10.0.0.1");
    }

    #[test]
    fn test_derive_client_id_falls_back_to_peer_address() {
        let mut request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("192.168.1.9:55000".parse().unwrap()));
        assert_eq!(derive_client_id(&request), "192.168.1.9");
    }

    #[test]
    fn test_derive_client_id_empty_header_degrades_to_unknown() {
        let request = Request::builder()
            .uri("/protected")
            .header("x-forwarded-for", "  ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(derive_client_id(&request), "unknown");
    }
}
