use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    /// The host refused access to media.
    #[error("Media library permission denied: {0}")]
    PermissionDenied(String),

    #[error("Bridge error: {0}")]
    Bridge(BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

impl From<BridgeError> for LibraryError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::PermissionDenied(msg) => LibraryError::PermissionDenied(msg),
            other => LibraryError::Bridge(other),
        }
    }
}

impl LibraryError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, LibraryError::PermissionDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
