use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::Pagination;

/// The `{ success, data, count?, pagination? }` envelope every endpoint answers with
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            pagination: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self {
            count: Some(data.len()),
            ..Self::ok(data)
        }
    }

    pub fn page(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::list(data)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
