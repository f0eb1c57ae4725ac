//! Error type for media pre-processing.

use stockpilot_common::error::StockpilotError;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// EPS / AI uploads. The message tells the user what to do instead.
    #[error(
        "{format} files are not supported. Please convert the file to PNG, JPEG or SVG \
         (for example by exporting it from your vector editor) and upload it again."
    )]
    UnsupportedVector { format: String },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Could not read SVG: {0}")]
    InvalidSvg(String),

    #[error("SVG is too large to rasterize ({width}x{height})")]
    TooLarge { width: u32, height: u32 },

    #[error("Could not load video: {0}")]
    VideoLoad(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for StockpilotError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedVector { .. } | MediaError::UnsupportedType(_) => {
                StockpilotError::UnsupportedMedia {
                    message: err.to_string(),
                }
            }
            MediaError::InvalidSvg(_) | MediaError::TooLarge { .. } | MediaError::VideoLoad(_) => {
                StockpilotError::Validation {
                    message: err.to_string(),
                }
            }
            MediaError::Encode(_) | MediaError::Io(_) => StockpilotError::Internal(err.into()),
        }
    }
}
