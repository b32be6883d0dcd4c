/// Convenience result type used across the renderer.
pub type RenderResult<T> = Result<T, RenderError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// A placement refers to a bucket the bucket set does not have. The bucket
    /// count and the prefab list disagree; the frame cycle is aborted.
    #[error("config mismatch: bucket {index} is outside the bucket set of {bucket_count} prefabs")]
    ConfigMismatch { index: usize, bucket_count: usize },

    /// Configuration that can never render, rejected before the first frame.
    #[error("degenerate config: {0}")]
    DegenerateConfig(String),

    /// Malformed frame data or an unusable frame source.
    #[error("frame error: {0}")]
    Frame(String),

    /// A batch task or the render service went away mid-cycle.
    #[error("worker error: {0}")]
    Worker(String),

    /// The TOML config could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl RenderError {
    /// Build a [`RenderError::DegenerateConfig`] value.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateConfig(msg.into())
    }

    /// Build a [`RenderError::Frame`] value.
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    /// Build a [`RenderError::Worker`] value.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Whether the error aborted a single frame cycle but left the renderer usable.
    pub fn is_cycle_local(&self) -> bool {
        matches!(self, Self::ConfigMismatch { .. } | Self::Frame(_) | Self::Worker(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RenderError::degenerate("x")
                .to_string()
                .contains("degenerate config:")
        );
        assert!(RenderError::frame("x").to_string().contains("frame error:"));
        assert!(RenderError::worker("x").to_string().contains("worker error:"));
    }

    #[test]
    fn config_mismatch_names_index_and_count() {
        let err = RenderError::ConfigMismatch {
            index: 7,
            bucket_count: 4,
        };
        let text = err.to_string();
        assert!(text.contains("bucket 7"));
        assert!(text.contains("4 prefabs"));
        assert!(err.is_cycle_local());
    }

    #[test]
    fn io_preserves_source() {
        let err = RenderError::from(std::io::Error::other("boom"));
        assert!(err.to_string().contains("boom"));
        assert!(!err.is_cycle_local());
    }
}
