//! Video frame capture via `ffprobe` / `ffmpeg`.
//!
//! The upload is written to a temporary file, inspected for its duration, and
//! one frame is decoded at [`seek_target`] and re-encoded as JPEG.

use serde::Deserialize;
use std::io::Cursor;
use std::path::Path;

use crate::error::MediaError;

/// JPEG quality of captured frames (0.9 on a 0..1 scale).
pub const FRAME_JPEG_QUALITY: u8 = 90;

/// Fraction of the duration the seek is capped at, so short clips don't
/// land on their final (often black) frame.
pub const MAX_SEEK_FRACTION: f64 = 0.1;

/// Where to grab the frame: `min(requested, 10% of duration)`, never negative.
pub fn seek_target(requested_secs: f64, duration_secs: f64) -> f64 {
    requested_secs
        .min(duration_secs * MAX_SEEK_FRACTION)
        .max(0.0)
}

/// Paths of the ffmpeg binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
        }
    }
}

/// A captured frame.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub seek_secs: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -show_entries format=duration -of json` output.
fn parse_duration_output(stdout: &[u8]) -> Option<f64> {
    let output: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    let secs: f64 = output.format.duration?.trim().parse().ok()?;
    (secs.is_finite() && secs > 0.0).then_some(secs)
}

impl FfmpegTools {
    /// Capture one frame of `bytes` near `requested_secs` as JPEG.
    pub async fn capture_frame(
        &self,
        bytes: &[u8],
        extension: Option<&str>,
        requested_secs: f64,
    ) -> Result<CapturedFrame, MediaError> {
        let suffix = extension.map(|e| format!(".{e}")).unwrap_or_default();
        let file = tempfile::Builder::new()
            .prefix("stockpilot-video-")
            .suffix(&suffix)
            .tempfile()?;
        tokio::fs::write(file.path(), bytes).await?;

        let duration_secs = self.media_duration(file.path()).await?;
        let seek_secs = seek_target(requested_secs, duration_secs);
        tracing::debug!(duration_secs, requested_secs, seek_secs, "Capturing video frame");

        let png = self.decode_frame_png(file.path(), seek_secs).await?;
        let (jpeg, width, height) = encode_jpeg(&png)?;

        Ok(CapturedFrame {
            jpeg,
            width,
            height,
            seek_secs,
            duration_secs,
        })
    }

    async fn media_duration(&self, path: &Path) -> Result<f64, MediaError> {
        let output = tokio::process::Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| MediaError::VideoLoad(format!("ffprobe unavailable: {e}")))?;

        if !output.status.success() {
            return Err(MediaError::VideoLoad(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_duration_output(&output.stdout)
            .ok_or_else(|| MediaError::VideoLoad("could not determine video duration".into()))
    }

    async fn decode_frame_png(&self, path: &Path, seek_secs: f64) -> Result<Vec<u8>, MediaError> {
        let output = tokio::process::Command::new(&self.ffmpeg)
            .args(["-v", "error", "-ss", &format!("{seek_secs:.3}"), "-i"])
            .arg(path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .output()
            .await
            .map_err(|e| MediaError::VideoLoad(format!("ffmpeg unavailable: {e}")))?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(MediaError::VideoLoad(format!(
                "no frame decoded at {seek_secs:.3}s: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Re-encode a decoded PNG frame as JPEG at [`FRAME_JPEG_QUALITY`].
fn encode_jpeg(png: &[u8]) -> Result<(Vec<u8>, u32, u32), MediaError> {
    let frame = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .map_err(|e| MediaError::VideoLoad(format!("undecodable frame: {e}")))?
        .to_rgb8();
    let (width, height) = frame.dimensions();

    let mut out = Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, FRAME_JPEG_QUALITY)
        .encode_image(&frame)
        .map_err(|e| MediaError::Encode(e.to_string()))?;

    Ok((out.into_inner(), width, height))
}
