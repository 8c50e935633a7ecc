//! Graphics error types.
//!
//! Only failures reported by the engine ports and invalid input data are
//! errors. Broken usage contracts (popping the root layer, consuming a
//! connection before it was produced, stale handles) panic instead.

use thiserror::Error;

/// Errors that can occur while translating UI draw calls into a frame graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicsError {
    /// The engine failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// The engine failed to instantiate a graph node.
    #[error("node creation failed: {0}")]
    NodeCreationFailed(String),
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A texture file could not be read or decoded.
    #[error("texture load failed: {0}")]
    TextureLoad(String),
    /// Any other failure reported by the engine.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias used throughout the crate.
pub type GraphicsResult<T> = Result<T, GraphicsError>;

#[cfg(feature = "texture-loading")]
impl From<image::ImageError> for GraphicsError {
    fn from(err: image::ImageError) -> Self {
        Self::TextureLoad(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::InvalidParameter("pixel buffer too small".to_string());
        assert_eq!(err.to_string(), "invalid parameter: pixel buffer too small");

        let err = GraphicsError::NodeCreationFailed("Rml/Render3".to_string());
        assert_eq!(err.to_string(), "node creation failed: Rml/Render3");
    }
}
