use serde::Serialize;
use std::fmt;

use crate::app::screen::capture::CaptureError;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_VALIDATION", message, trace_id)
    }

    pub fn dependency(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_DEPENDENCY", message, trace_id)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_SYSTEM", message, trace_id)
    }

    /// Attaches a trace id to a decoder failure.
    pub fn capture(err: &CaptureError, trace_id: impl Into<String>) -> Self {
        let code = match err {
            CaptureError::UnsupportedPixelFormat(_) => "ERR_UNSUPPORTED_PIXEL_FORMAT",
            CaptureError::MalformedCapture { .. } => "ERR_MALFORMED_CAPTURE",
        };
        Self::new(code, err.to_string(), trace_id)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_errors_keep_distinct_codes() {
        let unsupported = AppError::capture(&CaptureError::UnsupportedPixelFormat(4), "t-1");
        assert_eq!(unsupported.code, "ERR_UNSUPPORTED_PIXEL_FORMAT");
        assert!(unsupported.error.contains('4'));
        assert_eq!(unsupported.trace_id, "t-1");

        let malformed = AppError::capture(
            &CaptureError::MalformedCapture {
                expected: 8,
                available: 3,
            },
            "t-2",
        );
        assert_eq!(malformed.code, "ERR_MALFORMED_CAPTURE");
    }

    #[test]
    fn display_includes_code() {
        let err = AppError::validation("serial is required", "t");
        assert_eq!(err.to_string(), "serial is required (ERR_VALIDATION)");
    }
}
