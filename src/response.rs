use std::fmt;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

/// Business-level outcome of an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Result of a single update request, as returned to the caller.
///
/// Optional fields that were never set are left out of the JSON entirely, so
/// an absent `Hostname` is distinguishable from an empty one. Keys are
/// PascalCase because deployed pollers read `Status`, `Message` and
/// `Address` by those names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Response {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Response {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            hostname: None,
            address: None,
            result: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Status::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    /// Attach the record name and the address written to it.
    pub fn with_host_info(mut self, hostname: impl Into<String>, address: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self.address = Some(address.into());
        self
    }

    /// Attach the raw provider result or error detail.
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Compact JSON encoding.
    ///
    /// # Panics
    ///
    /// Only string fields and a unit enum are serialized, so this can't fail
    /// for any value this type can hold.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("Response is always serializable")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

// Business failures still travel as 200 OK; callers inspect `Status`.
impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            self.to_json(),
        )
            .into_response()
    }
}
