//! 核心中间件模块

use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::session::{SessionStore, SESSION_COOKIE};

/// 请求日志中间件
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let response = next.run(req).await;
    let status = response.status();
    let duration = start.elapsed();

    info!(
        "{} {} - {} - {}ms - User-Agent: {:?}",
        method,
        uri,
        status,
        duration.as_millis(),
        user_agent
    );

    response
}

/// 会话中间件：把 [`Session`](super::session::Session) 放进请求扩展。
/// 只有处理器真正写入了新会话才下发 cookie
pub async fn session_middleware(
    State(store): State<SessionStore>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_id = session_id_from(req.headers());
    let (session, known) = store.open(cookie_id.as_deref());
    let id = session.id().to_string();
    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;

    if !known && store.contains(&id) {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
                debug!("新建会话，当前共 {} 个会话", store.len());
            }
            Err(e) => warn!("无法设置会话 cookie: {}", e),
        }
    }

    response
}

fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{FlashLevel, Session};
    use axum::{body::Body, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn session_app(store: SessionStore) -> Router {
        Router::new()
            .route(
                "/read",
                get(|Extension(session): Extension<Session>| async move {
                    format!("{}", session.is_logged_in())
                }),
            )
            .route(
                "/write",
                get(|Extension(session): Extension<Session>| async move {
                    session.flash(FlashLevel::Info, "Logged out.");
                }),
            )
            .layer(axum::middleware::from_fn_with_state(store, session_middleware))
    }

    fn cookieless(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_cookieless_reads_store_nothing() {
        let store = SessionStore::new();
        let app = session_app(store.clone());

        for _ in 0..100 {
            let resp = app.clone().oneshot(cookieless("/read")).await.unwrap();
            assert!(resp.headers().get(SET_COOKIE).is_none());
        }
        let resp = app.clone().oneshot(cookieless("/missing")).await.unwrap();
        assert!(resp.headers().get(SET_COOKIE).is_none());
        assert_eq!(store.len(), 0);

        let resp = app.clone().oneshot(cookieless("/write")).await.unwrap();
        let cookie = resp.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("wishlist_session="));
        assert_eq!(store.len(), 1);

        // 已有会话不再重复下发 cookie
        let pair = cookie.split(';').next().unwrap().to_string();
        let req = axum::http::Request::builder()
            .uri("/write")
            .header(COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.headers().get(SET_COOKIE).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; wishlist_session=abc-123; other=1"),
        );
        assert_eq!(session_id_from(&headers).as_deref(), Some("abc-123"));

        let empty = HeaderMap::new();
        assert_eq!(session_id_from(&empty), None);
    }
}
