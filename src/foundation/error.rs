/// Convenience result type used across stratum.
pub type StratumResult<T> = Result<T, StratumError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum StratumError {
    /// Invalid caller-provided scene, style, or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Backend initialization or program failures. These are fatal for the owning [`crate::Root`].
    #[error("gpu error: {0}")]
    Gpu(String),

    /// Texture, raster, or shared-resource bookkeeping failures.
    #[error("resource error: {0}")]
    Resource(String),

    /// Errors while compositing or rendering a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StratumError {
    /// Build a [`StratumError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StratumError::Gpu`] value.
    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    /// Build a [`StratumError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`StratumError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
