use std::time::Duration;

use thiserror::Error;

use crate::camera::canon::values::Quantity;

/// A non-success status code returned across the EDSDK boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("[{name}] (0x{code:08X}) {message}")]
pub struct SdkFailure {
    /// Raw status code.
    pub code: u32,
    /// Symbolic name, or `EDS_ERR_UNKNOWN` for unregistered codes.
    pub name: &'static str,
    /// Human-readable description.
    pub message: &'static str,
}

/// Camera subsystem errors.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("EDSDK call failed: {0}")]
    Sdk(#[from] SdkFailure),

    #[error("camera index {index} out of range (available cameras: {count})")]
    IndexOutOfRange { index: u32, count: u32 },

    #[error("camera reports no supported {0} values")]
    NoAvailableValues(Quantity),

    #[error("{target} is not a valid {quantity} target")]
    InvalidTarget { quantity: Quantity, target: f64 },

    #[error("{quantity} value '{label}' is not supported by this camera")]
    UnsupportedValue {
        quantity: Quantity,
        label: &'static str,
    },

    #[error("no image transfer arrived within {0:?}")]
    Timeout(Duration),

    #[error("a capture is already waiting for its transfer")]
    CaptureInProgress,

    #[error("camera session is closed")]
    SessionClosed,

    #[error("invalid output path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{source} (cleanup also failed: {})", join_errors(.cleanup))]
    Cleanup {
        source: Box<CameraError>,
        cleanup: Vec<CameraError>,
    },
}

impl CameraError {
    /// The raw EDSDK status code behind this error, if any.
    pub fn sdk_code(&self) -> Option<u32> {
        match self {
            Self::Sdk(failure) => Some(failure.code),
            Self::Cleanup { source, .. } => source.sdk_code(),
            _ => None,
        }
    }
}

fn join_errors(errors: &[CameraError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CameraError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn busy() -> SdkFailure {
        SdkFailure {
            code: 0x81,
            name: "EDS_ERR_DEVICE_BUSY",
            message: "Device busy",
        }
    }

    #[test]
    fn sdk_failure_display_includes_name_code_and_message() {
        let text = busy().to_string();
        assert_eq!(text, "[EDS_ERR_DEVICE_BUSY] (0x00000081) Device busy");
    }

    #[test]
    fn sdk_code_is_reachable_through_cleanup() {
        let err = CameraError::Cleanup {
            source: Box::new(CameraError::Sdk(busy())),
            cleanup: vec![CameraError::SessionClosed],
        };
        assert_eq!(err.sdk_code(), Some(0x81));
        assert_eq!(CameraError::SessionClosed.sdk_code(), None);
    }

    #[test]
    fn cleanup_display_lists_both_failures() {
        let err = CameraError::Cleanup {
            source: Box::new(CameraError::Sdk(busy())),
            cleanup: vec![CameraError::InvalidPath("x".to_string())],
        };
        let text = err.to_string();
        assert!(text.contains("Device busy"), "got: {text}");
        assert!(text.contains("invalid output path: x"), "got: {text}");
    }

    #[test]
    fn index_out_of_range_message() {
        let err = CameraError::IndexOutOfRange { index: 2, count: 1 };
        assert_eq!(
            err.to_string(),
            "camera index 2 out of range (available cameras: 1)"
        );
    }
}
