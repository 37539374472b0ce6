//! API error taxonomy and its mapping onto HTTP responses.
//!
//! Every failure crossing the route boundary becomes a JSON body of
//! the form `{"error": <code>, "descripcion": <text>}`. Authorization
//! failures keep the historical `-1` code; everything else carries its
//! HTTP status.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::store;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{kind} {id} no encontrado")]
    NotFound { kind: &'static str, id: u64 },

    #[error("no autorizado")]
    Unauthorized,

    #[error(transparent)]
    Storage(store::Error),

    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        Self::NotFound { kind, id }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<store::Error> for ApiError {
    fn from(err: store::Error) -> Self {
        match err {
            store::Error::NotFound(id) => Self::NotFound {
                kind: "registro",
                id,
            },
            other => Self::Storage(other),
        }
    }
}

/// The wire shape of every error response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: i32,
    pub descripcion: String,
}

impl ErrorBody {
    /// The body the admin gate answers with, `error: -1` as the
    /// historical contract demands.
    pub fn no_autorizado() -> Self {
        Self {
            error: -1,
            descripcion: "no autorizado".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Unauthorized => ErrorBody::no_autorizado(),
            other => ErrorBody {
                error: status.as_u16() as i32,
                descripcion: other.to_string(),
            },
        };

        if status.is_server_error() {
            tracing::error!(err = %self, "request failed");
        } else {
            tracing::debug!(err = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
