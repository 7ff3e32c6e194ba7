use thiserror::Error;

/// Infrastructure failures: storage, HTTP client setup, encoding.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    BaseUrl(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),
}

/// Input rejected before anything is sent to the backend.
///
/// The `Display` text is what the user sees in the notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid file type. Please upload PNG, JPEG, GIF, WebP, or BMP.")]
    InvalidFileType { mime: String },

    #[error("File too large. Maximum size is 16MB.")]
    FileTooLarge { size: u64 },

    #[error("Please choose an image first")]
    NoImageSelected,

    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("Prompt too long. Maximum 500 characters")]
    PromptTooLong { len: usize },
}

pub type Result<T> = std::result::Result<T, ClientError>;
