//! Error type shared by every route.
//!
//! All failures answer `404 { "error": ... }`; the payload keeps whatever the
//! upstream reported so clients can still tell failures apart.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}")]
    Upstream { status: u16, body: Value },

    #[error("legacy api error: {0}")]
    Legacy(Value),

    #[error("unexpected legacy reply: {0}")]
    Protocol(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upstream did not answer within {0}ms")]
    Timeout(u64),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("identifier `{0}` contains no digits")]
    MalformedIdentifier(String),

    #[error("tag {0} not found")]
    TagNotFound(u64),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("unexpected upstream response: {0}")]
    MalformedResponse(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProxyError {
    pub fn invalid(name: &'static str, value: &str) -> Self {
        ProxyError::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }

    /// Upstream gave no answer in time, on either transport.
    pub fn is_timeout(&self) -> bool {
        match self {
            ProxyError::Timeout(_) => true,
            ProxyError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// JSON placed under the `error` key of a failure response.
    pub fn payload(&self) -> Value {
        match self {
            ProxyError::Upstream { status, body } => json!({ "status": status, "body": body }),
            ProxyError::Legacy(body) => body.clone(),
            other => json!({ "message": other.to_string() }),
        }
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }

    fn error_response(&self) -> HttpResponse {
        log::warn!("Request failed: {}", self);
        HttpResponse::NotFound().json(json!({ "error": self.payload() }))
    }
}
