//! Stockpilot media pre-processing.
//!
//! Turns an arbitrary upload into a raster image the AI analysis endpoint
//! accepts: video frames are captured as JPEG, SVGs are rasterized to PNG,
//! raster images pass through, and vector formats we cannot render are
//! rejected with an actionable message.

pub mod error;
pub mod svg;
pub mod video;

use std::path::Path;

pub use error::MediaError;
pub use video::{FfmpegTools, seek_target};

/// What an upload is, as far as pre-processing cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Svg,
    /// EPS or Adobe Illustrator.
    UnsupportedVector,
    Raster,
    Other,
}

const VECTOR_MIME_TYPES: &[&str] = &["application/postscript", "application/illustrator"];
const VECTOR_EXTENSIONS: &[&str] = &["eps", "ai"];

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Classify an upload by its declared content type, falling back to the
/// file extension when the type is missing or generic.
pub fn classify(filename: &str, content_type: Option<&str>) -> MediaKind {
    let ext = extension(filename);
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    // Vector formats are checked first so `.ai` labelled as PDF still gets the
    // conversion hint.
    if declared
        .as_deref()
        .is_some_and(|ct| VECTOR_MIME_TYPES.contains(&ct))
        || ext
            .as_deref()
            .is_some_and(|e| VECTOR_EXTENSIONS.contains(&e))
    {
        return MediaKind::UnsupportedVector;
    }

    let mime = declared.or_else(|| {
        mime_guess::from_path(filename)
            .first()
            .map(|m| m.essence_str().to_string())
    });

    match mime.as_deref() {
        Some("image/svg+xml") => MediaKind::Svg,
        Some(m) if m.starts_with("video/") => MediaKind::Video,
        Some(m) if m.starts_with("image/") => MediaKind::Raster,
        _ if ext.as_deref() == Some("svg") => MediaKind::Svg,
        _ => MediaKind::Other,
    }
}

/// An upload handed to the pre-processor.
#[derive(Debug, Clone)]
pub struct MediaInput<'a> {
    pub filename: &'a str,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// A raster image ready for analysis.
#[derive(Debug, Clone)]
pub struct ProcessedMedia {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// `false` when the upload was passed through untouched.
    pub converted: bool,
    /// Where the frame was taken from, for videos.
    pub seek_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Stateless pre-processor; only holds the ffmpeg binary locations.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    tools: FfmpegTools,
}

impl Preprocessor {
    pub fn new(tools: FfmpegTools) -> Self {
        Self { tools }
    }

    pub fn from_config(config: &stockpilot_common::config::MediaConfig) -> Self {
        Self::new(FfmpegTools {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
        })
    }

    /// Produce a raster image from `input`. `requested_secs` is only used
    /// for video and is capped by [`seek_target`].
    pub async fn prepare(
        &self,
        input: MediaInput<'_>,
        requested_secs: f64,
    ) -> Result<ProcessedMedia, MediaError> {
        let kind = classify(input.filename, input.content_type);
        tracing::debug!(filename = %input.filename, ?kind, size = input.bytes.len(), "Pre-processing upload");

        match kind {
            MediaKind::UnsupportedVector => {
                let format = extension(input.filename)
                    .filter(|e| VECTOR_EXTENSIONS.contains(&e.as_str()))
                    .unwrap_or_else(|| "eps".into())
                    .to_ascii_uppercase();
                Err(MediaError::UnsupportedVector { format })
            }
            MediaKind::Other => Err(MediaError::UnsupportedType(
                input
                    .content_type
                    .map(str::to_string)
                    .or_else(|| extension(input.filename).map(|e| format!(".{e}")))
                    .unwrap_or_else(|| "unknown".into()),
            )),
            MediaKind::Raster => Ok(ProcessedMedia {
                bytes: input.bytes.to_vec(),
                content_type: input
                    .content_type
                    .map(str::to_string)
                    .or_else(|| {
                        mime_guess::from_path(input.filename)
                            .first()
                            .map(|m| m.essence_str().to_string())
                    })
                    .unwrap_or_else(|| "application/octet-stream".into()),
                converted: false,
                seek_secs: None,
                width: None,
                height: None,
            }),
            MediaKind::Svg => {
                let raster = svg::rasterize(input.bytes)?;
                Ok(ProcessedMedia {
                    bytes: raster.png,
                    content_type: "image/png".into(),
                    converted: true,
                    seek_secs: None,
                    width: Some(raster.width),
                    height: Some(raster.height),
                })
            }
            MediaKind::Video => {
                let ext = extension(input.filename);
                let frame = self
                    .tools
                    .capture_frame(input.bytes, ext.as_deref(), requested_secs)
                    .await?;
                Ok(ProcessedMedia {
                    bytes: frame.jpeg,
                    content_type: "image/jpeg".into(),
                    converted: true,
                    seek_secs: Some(frame.seek_secs),
                    width: Some(frame.width),
                    height: Some(frame.height),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(filename: &'a str, content_type: Option<&'a str>, bytes: &'a [u8]) -> MediaInput<'a> {
        MediaInput {
            filename,
            content_type,
            bytes,
        }
    }

    #[test]
    fn classification() {
        assert_eq!(classify("clip.mp4", None), MediaKind::Video);
        assert_eq!(classify("clip.bin", Some("video/quicktime")), MediaKind::Video);
        assert_eq!(classify("logo.svg", None), MediaKind::Svg);
        assert_eq!(classify("logo", Some("image/svg+xml")), MediaKind::Svg);
        assert_eq!(classify("art.eps", None), MediaKind::UnsupportedVector);
        assert_eq!(classify("art.ai", Some("application/pdf")), MediaKind::UnsupportedVector);
        assert_eq!(
            classify("art", Some("application/postscript")),
            MediaKind::UnsupportedVector
        );
        assert_eq!(classify("photo.jpg", None), MediaKind::Raster);
        assert_eq!(classify("photo", Some("image/webp; charset=binary")), MediaKind::Raster);
        assert_eq!(classify("notes.txt", None), MediaKind::Other);
        assert_eq!(classify("photo.png", Some("application/octet-stream")), MediaKind::Raster);
    }

    #[tokio::test]
    async fn raster_passes_through_unchanged() {
        let bytes = b"\x89PNG\r\n\x1a\nnot-really-decoded";
        let out = Preprocessor::default()
            .prepare(input("photo.png", Some("image/png"), bytes), 1.0)
            .await
            .unwrap();
        assert!(!out.converted);
        assert_eq!(out.bytes, bytes);
        assert_eq!(out.content_type, "image/png");
    }

    #[tokio::test]
    async fn vector_formats_are_rejected_with_hint() {
        let err = Preprocessor::default()
            .prepare(input("poster.ai", None, b"%!PS-Adobe"), 1.0)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, MediaError::UnsupportedVector { .. }));
        assert!(message.starts_with("AI files are not supported"));
        assert!(message.contains("PNG, JPEG or SVG"));
    }

    #[tokio::test]
    async fn unknown_types_are_rejected() {
        let err = Preprocessor::default()
            .prepare(input("notes.txt", Some("text/plain"), b"hello"), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedType(t) if t == "text/plain"));
    }

    #[tokio::test]
    async fn svg_is_rasterized_to_png() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="16"/>"#;
        let out = Preprocessor::default()
            .prepare(input("icon.svg", None, svg), 1.0)
            .await
            .unwrap();
        assert!(out.converted);
        assert_eq!(out.content_type, "image/png");
        assert_eq!((out.width, out.height), (Some(32), Some(16)));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::Png);
    }
}
