//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use super::response::escape_html;
use crate::infrastructure::store::StoreError;

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, user_message) = match &self {
            CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CoreError::Storage(e) => {
                error!("数据存储错误: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The wishlist data could not be read or saved.".to_string(),
                )
            }
        };

        let body = format!(
            "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{code}</title></head>\
             <body><h1>{code} {reason}</h1><p>{message}</p></body></html>",
            code = status.as_u16(),
            reason = status.canonical_reason().unwrap_or("Error"),
            message = escape_html(&user_message),
        );

        (status, Html(body)).into_response()
    }
}
