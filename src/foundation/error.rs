/// Convenience result type used across textblur.
pub type TextBlurResult<T> = Result<T, TextBlurError>;

/// Top-level error taxonomy used by fallible textblur APIs.
///
/// Blur requests themselves never fail: readiness, supersession and empty content resolve through
/// the completion callback's `finished` flag. This type covers setup, configuration and the
/// rendering pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TextBlurError {
    /// Invalid user-provided configuration or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while shaping or rasterizing text.
    #[error("raster error: {0}")]
    Raster(String),

    /// The blur/composite pipeline could not produce an output for its input.
    #[error("blur error: {0}")]
    Blur(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TextBlurError {
    /// Build a [`TextBlurError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TextBlurError::Raster`] value.
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Build a [`TextBlurError::Blur`] value.
    pub fn blur(msg: impl Into<String>) -> Self {
        Self::Blur(msg.into())
    }

    /// Build a [`TextBlurError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
