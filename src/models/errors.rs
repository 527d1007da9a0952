//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code for log correlation.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - INPUT_xxx: request validation errors
//! - DATA_xxx: upstream chain-data errors
//! - REG_xxx: risk-registry errors
//! - API_xxx: API errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Input Errors
    // ============================================
    /// Malformed token or agent address
    InputInvalidAddress,
    /// Zero address where a real address is required
    InputZeroAddress,

    // ============================================
    // Chain Data Errors
    // ============================================
    /// Upstream data source failed or timed out
    DataUnavailable,
    /// Upstream data present but unparseable
    DataMalformed,

    // ============================================
    // Registry Errors
    // ============================================
    /// Caller is not in the authorized writer set
    RegUnauthorized,
    /// Caller is not the registry owner
    RegNotOwner,
    /// Token already has a record
    RegAlreadyRegistered,
    /// Token has no record
    RegNotRegistered,
    /// A score input exceeds 100
    RegScoreOutOfRange,
    /// Circuit breaker active, mutations rejected
    RegPaused,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Resource not found
    ApiNotFound,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputInvalidAddress => "INPUT_INVALID_ADDRESS",
            Self::InputZeroAddress => "INPUT_ZERO_ADDRESS",

            Self::DataUnavailable => "DATA_UNAVAILABLE",
            Self::DataMalformed => "DATA_MALFORMED",

            Self::RegUnauthorized => "REG_UNAUTHORIZED",
            Self::RegNotOwner => "REG_NOT_OWNER",
            Self::RegAlreadyRegistered => "REG_ALREADY_REGISTERED",
            Self::RegNotRegistered => "REG_NOT_REGISTERED",
            Self::RegScoreOutOfRange => "REG_SCORE_OUT_OF_RANGE",
            Self::RegPaused => "REG_PAUSED",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::InputInvalidAddress
            | Self::InputZeroAddress
            | Self::RegScoreOutOfRange
            | Self::ConfigInvalidValue => 400,
            Self::RegUnauthorized | Self::RegNotOwner => 403,
            Self::ApiNotFound | Self::RegNotRegistered => 404,
            Self::RegAlreadyRegistered => 409,
            Self::RegPaused => 503,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataUnavailable | Self::RegPaused)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Malformed token address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InputInvalidAddress, msg)
    }

    /// Zero address rejected
    pub fn zero_address(what: &str) -> Self {
        Self::new(
            ErrorCode::InputZeroAddress,
            format!("Zero address rejected for {}", what),
        )
    }

    /// Upstream data source failed
    pub fn data_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DataUnavailable, msg)
    }

    /// Caller is not an authorized writer
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegUnauthorized, msg)
    }

    /// Caller is not the owner
    pub fn not_owner(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegNotOwner, msg)
    }

    /// Token already registered
    pub fn already_registered(token: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::RegAlreadyRegistered,
            format!("Token already registered: {}", token),
        )
    }

    /// Token not registered
    pub fn not_registered(token: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::RegNotRegistered,
            format!("Token not registered: {}", token),
        )
    }

    /// Score input exceeds 100
    pub fn score_out_of_range(name: &str, value: u8) -> Self {
        Self::new(
            ErrorCode::RegScoreOutOfRange,
            format!("Score {} out of range: {} > 100", name, value),
        )
    }

    /// Circuit breaker active
    pub fn paused() -> Self {
        Self::new(ErrorCode::RegPaused, "Registry is paused")
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }

    /// Invalid configuration value
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::DataUnavailable, "IO error", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::DataMalformed, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::already_registered("0xabc");
        assert_eq!(err.code, ErrorCode::RegAlreadyRegistered);
        assert_eq!(err.code_str(), "REG_ALREADY_REGISTERED");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::DataUnavailable.is_retryable());
        assert!(ErrorCode::RegPaused.is_retryable());
        assert!(!ErrorCode::RegUnauthorized.is_retryable());
        assert!(!ErrorCode::InputInvalidAddress.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::InputInvalidAddress.http_status(), 400);
        assert_eq!(ErrorCode::RegUnauthorized.http_status(), 403);
        assert_eq!(ErrorCode::RegNotRegistered.http_status(), 404);
        assert_eq!(ErrorCode::RegAlreadyRegistered.http_status(), 409);
        assert_eq!(ErrorCode::RegPaused.http_status(), 503);
        assert_eq!(ErrorCode::Unknown.http_status(), 500);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::paused();
        assert_eq!(format!("{}", err), "[REG_PAUSED] Registry is paused");
    }
}
