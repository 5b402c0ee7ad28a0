//! Error types for folio operations.

use thiserror::Error;

/// Errors that can occur while loading, rendering or exporting a book.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Book not found: {0}")]
    NotFound(String),

    #[error("Not authorized to access book {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    /// The text generator answered, but not in the expected shape.
    #[error("Invalid AI response: {0}")]
    InvalidAiResponse(String),

    #[error("Text generation failed: {0}")]
    Upstream(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl Error {
    /// True for failures caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Unauthorized(_) | Error::Validation(_)
        )
    }
}

impl From<printpdf::Error> for Error {
    fn from(e: printpdf::Error) -> Self {
        Error::Pdf(format!("{e:?}"))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
