//! 应用层

pub mod wishlist;

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::core::middleware::{request_logging_middleware, session_middleware};
use crate::scrape::PageFetcher;
use wishlist::handler::{self, AppState};

/// 构建完整路由；所有路径挂载在配置的前缀下
pub fn build_router<F: PageFetcher + 'static>(state: AppState<F>) -> Router {
    let prefix = state.config.app.prefix.clone();
    let static_dir = state.config.app.static_dir.clone();
    let timeout = Duration::from_secs(state.config.http.timeout_seconds);

    let routes = Router::new()
        .route("/", get(handler::index::<F>))
        .route(
            "/admin",
            get(handler::admin_page::<F>).post(handler::admin_submit::<F>),
        )
        .route("/mark/:id", post(handler::mark_purchased::<F>))
        .route("/reserve/:id", post(handler::mark_reserved::<F>))
        .route("/delete/:id", post(handler::delete_product::<F>))
        .route("/clear/:id", post(handler::clear_status::<F>))
        .route("/refresh-price/:id", post(handler::refresh_price::<F>))
        .route("/api/products", get(handler::list_products::<F>))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handler::not_found)
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ))
        .with_state(state);

    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&prefix, routes)
    };

    app.layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
}
