pub type RenderResult<T> = Result<T, RenderError>;

/// Failure kinds for a single render request.
///
/// Font fallback is handled internally and never surfaces here; every other
/// condition aborts the request with no partial output.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("input too large: {0}")]
    InputTooLarge(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    #[error("encoding failure: {0}")]
    EncodingFailure(String),

    #[error("geometry overflow: {0}")]
    GeometryOverflow(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RenderError {
    pub fn input_too_large(msg: impl Into<String>) -> Self {
        Self::InputTooLarge(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn font_unavailable(msg: impl Into<String>) -> Self {
        Self::FontUnavailable(msg.into())
    }

    pub fn encoding_failure(msg: impl Into<String>) -> Self {
        Self::EncodingFailure(msg.into())
    }

    pub fn geometry_overflow(msg: impl Into<String>) -> Self {
        Self::GeometryOverflow(msg.into())
    }
}
