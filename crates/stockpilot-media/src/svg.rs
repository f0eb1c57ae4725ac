//! SVG rasterization onto an opaque white canvas.

use regex::Regex;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use std::sync::LazyLock;

use crate::error::MediaError;

/// Canvas side used when the SVG does not declare an absolute size.
pub const DEFAULT_SIDE: u32 = 1024;
/// Largest canvas side we are willing to allocate.
pub const MAX_SIDE: u32 = 8192;

static SVG_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg\b[^>]*>").unwrap());
static WIDTH_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\swidth\s*=\s*["']\s*([0-9]*\.?[0-9]+)\s*(px)?\s*["']"#).unwrap()
});
static HEIGHT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\sheight\s*=\s*["']\s*([0-9]*\.?[0-9]+)\s*(px)?\s*["']"#).unwrap()
});

/// A rasterized SVG.
#[derive(Debug, Clone)]
pub struct Rasterized {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Width and height declared on the root `<svg>` element.
///
/// Each side falls back to [`DEFAULT_SIDE`] independently when it is missing,
/// relative (`%`, `em`, ...) or zero.
pub fn intrinsic_size(text: &str) -> (u32, u32) {
    let Some(tag) = SVG_OPEN_TAG.find(text) else {
        return (DEFAULT_SIDE, DEFAULT_SIDE);
    };
    let tag = tag.as_str();
    (
        absolute_length(&WIDTH_ATTR, tag).unwrap_or(DEFAULT_SIDE),
        absolute_length(&HEIGHT_ATTR, tag).unwrap_or(DEFAULT_SIDE),
    )
}

fn absolute_length(re: &Regex, tag: &str) -> Option<u32> {
    let value: f64 = re.captures(tag)?.get(1)?.as_str().parse().ok()?;
    let px = value.round();
    (px >= 1.0).then_some(px as u32)
}

/// Rasterize SVG source into a PNG the size of its intrinsic dimensions,
/// composed over white so no transparency reaches the encoder.
pub fn rasterize(bytes: &[u8]) -> Result<Rasterized, MediaError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| MediaError::InvalidSvg("file is not valid UTF-8 text".into()))?;

    let (width, height) = intrinsic_size(text);
    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(MediaError::TooLarge { width, height });
    }

    let tree = usvg::Tree::from_str(text, &usvg::Options::default())
        .map_err(|e| MediaError::InvalidSvg(e.to_string()))?;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| MediaError::Encode(format!("cannot allocate {width}x{height} canvas")))?;
    pixmap.fill(Color::WHITE);

    // Stretch the drawing to the canvas, as an <img> drawn at (0, 0, w, h) would be.
    let size = tree.size();
    let transform = Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let png = pixmap
        .encode_png()
        .map_err(|e| MediaError::Encode(e.to_string()))?;

    Ok(Rasterized { png, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &[u8]) -> image::RgbaImage {
        image::load_from_memory_with_format(png, image::ImageFormat::Png)
            .unwrap()
            .to_rgba8()
    }

    #[test]
    fn size_defaults_when_unspecified() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"></svg>"#;
        assert_eq!(intrinsic_size(svg), (1024, 1024));
    }

    #[test]
    fn size_reads_absolute_attributes() {
        let svg = r#"<?xml version="1.0"?>
            <svg xmlns="http://www.w3.org/2000/svg" stroke-width="4" width="300px" height='200'>"#;
        assert_eq!(intrinsic_size(svg), (300, 200));
    }

    #[test]
    fn relative_sizes_fall_back_per_side() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="64">"#;
        assert_eq!(intrinsic_size(svg), (1024, 64));
    }

    #[test]
    fn unsized_svg_rasterizes_to_opaque_white_1024() {
        // Fully transparent content: every pixel must come out white and opaque.
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
            <rect x="0" y="0" width="10" height="10" fill="red" fill-opacity="0"/>
        </svg>"#;
        let out = rasterize(svg).unwrap();
        assert_eq!((out.width, out.height), (1024, 1024));

        let img = decode(&out.png);
        assert_eq!(img.dimensions(), (1024, 1024));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn drawing_is_scaled_to_canvas() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20">
            <rect x="0" y="0" width="20" height="20" fill="#000000"/>
        </svg>"##;
        let out = rasterize(svg).unwrap();
        let img = decode(&out.png);
        assert_eq!(img.dimensions(), (40, 20));
        assert_eq!(img.get_pixel(5, 10).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(35, 10).0, [255, 255, 255, 255]);
    }

    #[test]
    fn garbage_is_invalid_svg() {
        assert!(matches!(rasterize(b"not svg at all"), Err(MediaError::InvalidSvg(_))));
        assert!(matches!(rasterize(&[0xff, 0xfe, 0x00]), Err(MediaError::InvalidSvg(_))));
    }

    #[test]
    fn oversized_svg_is_refused() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="20000" height="10"/>"#;
        assert!(matches!(rasterize(svg), Err(MediaError::TooLarge { .. })));
    }
}
