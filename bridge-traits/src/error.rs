use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unknown playback session: {0}")]
    UnknownSession(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the host refused access rather than failing.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, BridgeError::PermissionDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
