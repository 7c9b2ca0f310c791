use thiserror::Error;

/// Crate-wide error type. Registry lookups, renderer execution, and every
/// step of the vendor fetch report through this enum.
#[derive(Debug, Error)]
pub enum GlueError {
    /// A renderer reported a failure while producing its output string.
    #[error("render error: {0}")]
    Render(String),

    /// Lookup of an alias that is neither the primary nor the installed
    /// MathML alias.
    #[error("unknown renderer alias: {0}")]
    UnknownAlias(String),

    /// The version pin is empty or contains characters that cannot appear
    /// in a release tag.
    #[error("invalid version pin: {0}")]
    Version(String),

    /// Filesystem failure, tagged with the step that performed it.
    #[error("{step}: {source}")]
    Io {
        step: &'static str,
        source: std::io::Error,
    },

    /// HTTP client construction failure.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A GET request failed or returned a non-success status.
    #[error("download failed for {url}: {source}")]
    Download { url: String, source: reqwest::Error },

    /// The release archive did not contain an expected artifact path.
    #[error("archive is missing expected entry {0}")]
    MissingEntry(String),

    /// The checksum manifest could not be parsed or names an unknown file.
    #[error("checksum manifest error: {0}")]
    Manifest(String),

    /// A vendored file did not match its expected SHA-256 digest.
    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    Checksum {
        file: String,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, GlueError>;
