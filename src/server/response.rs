use crate::batch::BatchError;
use crate::storage::ResultRecord;
use crate::{AddressError, LinkscopeError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub(crate) const BAD_FILE: &str = "bad file";
pub(crate) const INTERNAL_SERVER_ERROR: &str = "internal server error";

/// JSON body of every batch API response
///
/// Successful responses carry `data`; failed ones carry `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BatchData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchData {
    pub results: Vec<ResultRecord>,
}

impl Envelope {
    pub fn results(results: Vec<ResultRecord>) -> Self {
        Self {
            errors: None,
            data: Some(BatchData { results }),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            errors: Some(vec![message.into()]),
            data: None,
        }
    }
}

/// A request failure rendered as an error envelope
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Details are logged, never sent to the client
    Internal,
}

impl ApiError {
    pub(crate) fn bad_file() -> Self {
        Self::BadRequest(BAD_FILE.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(message) | Self::NotFound(message) => message,
            Self::Internal => INTERNAL_SERVER_ERROR.to_string(),
        };
        (status, Json(Envelope::error(message))).into_response()
    }
}

impl From<AddressError> for ApiError {
    fn from(err: AddressError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<LinkscopeError> for ApiError {
    fn from(err: LinkscopeError) -> Self {
        match err {
            LinkscopeError::Address(e) => e.into(),
            LinkscopeError::Batch(e) => e.into(),
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::NoAddresses => Self::BadRequest(err.to_string()),
            BatchError::NotFound(_) => Self::NotFound(err.to_string()),
            other => {
                tracing::error!("Request failed: {}", other);
                Self::Internal
            }
        }
    }
}
