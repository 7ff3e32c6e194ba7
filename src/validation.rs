//! Client-side checks run before anything reaches the backend.

use crate::error::ValidationError;

/// MIME types the backend accepts for image inference.
pub const ALLOWED_MIME_TYPES: [&str; 6] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// 16 MiB upload ceiling.
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

pub const MAX_PROMPT_CHARS: usize = 500;

/// Counters switch to the warning style above this length.
pub const NEAR_LIMIT_CHARS: usize = 450;

/// Type is checked before size, so an oversized file of the wrong type
/// reports the type problem.
pub fn validate_file(mime: &str, size: u64) -> Result<(), ValidationError> {
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(ValidationError::InvalidFileType {
            mime: mime.to_string(),
        });
    }

    if size > MAX_FILE_SIZE {
        return Err(ValidationError::FileTooLarge { size });
    }

    Ok(())
}

/// Trims the prompt and checks it is non-empty and within the limit.
/// Returns the trimmed prompt that should be sent.
pub fn validate_prompt(raw: &str) -> Result<&str, ValidationError> {
    let prompt = raw.trim();
    if prompt.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    let len = prompt.chars().count();
    if len > MAX_PROMPT_CHARS {
        return Err(ValidationError::PromptTooLong { len });
    }

    Ok(prompt)
}

/// Live character counter shown under a prompt field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharCounter {
    pub count: usize,
    pub near_limit: bool,
}

impl CharCounter {
    pub fn of(text: &str) -> Self {
        let count = text.chars().count();
        Self {
            count,
            near_limit: count > NEAR_LIMIT_CHARS,
        }
    }
}

/// Human-readable size in binary units, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
