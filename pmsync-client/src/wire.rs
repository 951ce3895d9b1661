//! Response envelopes shared by several endpoints.

use serde::Deserialize;

use pmsync_core::ApiError;

/// One page of a cursor-paginated list.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Build an [`ApiError::Status`] from a non-success response body.
pub(crate) fn status_error(endpoint: String, status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.code.is_empty() => ApiError::Status {
            endpoint,
            status,
            code: parsed.code,
            message: parsed.message,
        },
        _ => ApiError::Status {
            endpoint,
            status,
            code: "unknown".to_owned(),
            message: body.chars().take(200).collect(),
        },
    }
}
