/// Convenience result type used across scrollsync.
pub type ScrollResult<T> = Result<T, ScrollError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Geometry that cannot be measured is not an error: trigger regions degrade to an idle no-op
/// until the next layout refresh.
#[derive(thiserror::Error, Debug)]
pub enum ScrollError {
    /// A required selector matched no elements inside its scope.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Malformed segment window, trigger region or playback configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Errors when serializing or deserializing page descriptions.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrollError {
    /// Build a [`ScrollError::Resolution`] value.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Build a [`ScrollError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`ScrollError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors raised while building a timeline or linkage.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::Configuration(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
