use thiserror::Error;

/// A background or font could not be loaded. Callers degrade (no background,
/// fallback face) rather than fail.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not parse font: {0}")]
    Font(String),

    #[error("background unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
