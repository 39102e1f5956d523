use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use co_core::{Error, Page, SourceArticle};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages,
        }
    }
}

/// `{ success, data?, error?, message?, pagination? }` wrapper used by
/// every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
            pagination: None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<(StatusCode, Json<Envelope<T>>), ApiError>;

pub fn ok<T: Serialize>(envelope: Envelope<T>) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(envelope)))
}

pub fn created<T: Serialize>(envelope: Envelope<T>) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(envelope)))
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Carries the record that already satisfies the request.
    #[error("{message}")]
    Conflict {
        message: String,
        existing: Box<SourceArticle>,
    },

    #[error("{0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound(message) => ApiError::NotFound(message),
            Error::Validation(message) | Error::InvalidUrl(message) | Error::Conflict(message) => {
                ApiError::BadRequest(message)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, data) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Conflict { existing, .. } => (StatusCode::CONFLICT, Some(existing.as_ref().clone())),
            ApiError::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = Envelope {
            success: false,
            data,
            error: Some(self.to_string()),
            message: None,
            pagination: None,
        };
        (status, Json(body)).into_response()
    }
}
