//! Error types for the preview editing layer.
//!
//! Errors fall into the groups an editor can actually see: validation
//! problems caught before any network call, a missing preview session,
//! failures talking to the CMS, and page-level lookups that found nothing.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Message shown to the editor for every remote write failure.
pub const GENERIC_SAVE_ERROR: &str = "Could not save your changes. Please try again.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid field reference `{0}`")]
    InvalidFieldRef(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("preview session is not authenticated")]
    Unauthenticated,

    #[error("preview editing is disabled")]
    EditingDisabled,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("no element on the page carries field reference `{0}`")]
    NodeNotFound(String),

    #[error("element for `{field}` cannot display a {payload} value")]
    TargetMismatch { field: String, payload: &'static str },

    #[error("no editor is open")]
    NoOpenEditor,
}

impl Error {
    /// Text suitable for the overlay's inline error slot.
    pub fn user_message(&self) -> String {
        match self {
            Error::Remote(_) => GENERIC_SAVE_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}

/// Problems with the values an editor typed in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("`{0}` is not a valid URL")]
    InvalidUrl(String),

    #[error("`{0}` is not a valid email address")]
    InvalidEmail(String),

    #[error("link target must be `_self` or `_blank`, got `{0}`")]
    InvalidTarget(String),

    #[error("a {payload} value cannot be saved into a {field_type} field")]
    PayloadMismatch {
        field_type: &'static str,
        payload: &'static str,
    },
}

/// Failures from the CMS document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("write credential rejected by the CMS")]
    Unauthorized,

    #[error("malformed field path: {0}")]
    MalformedPath(String),

    #[error("document `{0}` not found")]
    NotFound(String),

    #[error("CMS responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode CMS response: {0}")]
    Decode(String),

    #[error("local store error: {0}")]
    Storage(String),

    #[error("no write credential configured")]
    MissingCredential,
}

impl From<sled::Error> for RemoteError {
    fn from(e: sled::Error) -> Self {
        RemoteError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Decode(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidFieldRef(_) | Error::Validation(_) | Error::TargetMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::EditingDisabled => StatusCode::FORBIDDEN,
            Error::NodeNotFound(_) | Error::NoOpenEditor => StatusCode::NOT_FOUND,
            Error::Remote(RemoteError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Remote(_) => StatusCode::BAD_GATEWAY,
        };

        if let Error::Remote(ref e) = self {
            tracing::warn!(error = %e, "CMS write failed");
        }

        (status, self.user_message()).into_response()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
