//! Platform response envelope.
//!
//! Every service on the platform answers with the same JSON shape:
//! `{"success":true,"data":...}` or
//! `{"success":false,"error":{"code","message"}}`.

use serde::Serialize;

/// Machine-readable error codes shared across the platform.
pub mod codes {
    /// Request data failed validation.
    pub const VALIDATION: &str = "VALIDATION_ERROR";
    /// The requested resource does not exist.
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// The caller is not authenticated.
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    /// The caller is authenticated but not allowed.
    pub const FORBIDDEN: &str = "FORBIDDEN";
    /// Unexpected server-side failure.
    pub const INTERNAL_SERVER: &str = "INTERNAL_SERVER_ERROR";
}

/// Standard API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

/// Error details inside the envelope.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code.
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Successful envelope around `data`.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Failure envelope with an error code and message.
    #[must_use]
    pub fn error(code: &'static str, message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiErrorBody { code, message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_omits_error() {
        let json = serde_json::to_value(ApiResponse::success(serde_json::json!({"k": 1}))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["k"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::error(codes::NOT_FOUND, "gone".to_string()))
            .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "gone");
        assert!(json.get("data").is_none());
    }
}
