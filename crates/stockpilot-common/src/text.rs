//! Deterministic text helpers: SEO filenames, prompt options, marketplaces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StockpilotError;

/// Longest slug (without extension) produced by [`seo_filename`].
pub const MAX_SLUG_LEN: usize = 80;

/// Turn a title into a search-friendly filename.
///
/// `"Sunset over the Alps!"` + `"JPG"` → `"sunset-over-the-alps.jpg"`.
pub fn seo_filename(title: &str, extension: &str) -> String {
    let mut slug = slugify(title);
    if slug.len() > MAX_SLUG_LEN {
        slug = truncate_on_word(&slug, MAX_SLUG_LEN);
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }

    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() {
        slug
    } else {
        format!("{slug}.{ext}")
    }
}

/// Lowercase ASCII slug; every run of other characters becomes one `-`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

fn truncate_on_word(slug: &str, max: usize) -> String {
    // Slugs are ASCII, byte indexing is safe.
    let head = &slug[..max];
    let cut_mid_word = slug.as_bytes()[max] != b'-';
    let kept = match head.rfind('-') {
        Some(idx) if cut_mid_word && idx > 0 => &head[..idx],
        _ => head,
    };
    kept.trim_end_matches('-').to_string()
}

// ============================================================
// Prompt options (image-to-prompt tool)
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptStyle {
    Photorealistic,
    Illustration,
    Vector,
    #[serde(rename = "3d-render")]
    ThreeDRender,
    Watercolor,
    Minimalist,
    Cinematic,
}

impl PromptStyle {
    pub const ALL: [PromptStyle; 7] = [
        PromptStyle::Photorealistic,
        PromptStyle::Illustration,
        PromptStyle::Vector,
        PromptStyle::ThreeDRender,
        PromptStyle::Watercolor,
        PromptStyle::Minimalist,
        PromptStyle::Cinematic,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Photorealistic => "photorealistic",
            Self::Illustration => "illustration",
            Self::Vector => "vector",
            Self::ThreeDRender => "3d-render",
            Self::Watercolor => "watercolor",
            Self::Minimalist => "minimalist",
            Self::Cinematic => "cinematic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Photorealistic => "Photorealistic",
            Self::Illustration => "Illustration",
            Self::Vector => "Vector art",
            Self::ThreeDRender => "3D render",
            Self::Watercolor => "Watercolor",
            Self::Minimalist => "Minimalist",
            Self::Cinematic => "Cinematic",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Photorealistic => {
                "Describe the scene as a photograph: camera, lens, lighting and depth of field."
            }
            Self::Illustration => "Describe it as a digital illustration: medium, line work and palette.",
            Self::Vector => "Describe it as flat vector art: shapes, solid fills and a limited palette.",
            Self::ThreeDRender => "Describe it as a 3D render: materials, render engine and lighting setup.",
            Self::Watercolor => "Describe it as a watercolor painting: paper texture, washes and bleeds.",
            Self::Minimalist => "Describe it minimally: main subject, negative space and one accent color.",
            Self::Cinematic => "Describe it as a film still: framing, color grade and mood.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptDetail {
    Basic,
    Detailed,
    Ultra,
}

impl PromptDetail {
    pub const ALL: [PromptDetail; 3] = [PromptDetail::Basic, PromptDetail::Detailed, PromptDetail::Ultra];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Detailed => "detailed",
            Self::Ultra => "ultra",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Detailed => "Detailed",
            Self::Ultra => "Ultra detailed",
        }
    }

    /// Target prompt length in words.
    pub fn word_budget(self) -> u32 {
        match self {
            Self::Basic => 40,
            Self::Detailed => 90,
            Self::Ultra => 160,
        }
    }
}

/// Compose the instruction sent to the analysis model for image-to-prompt.
pub fn image_to_prompt_instruction(style: PromptStyle, detail: PromptDetail) -> String {
    format!(
        "Write a single text-to-image prompt that would recreate this image. \
         Style: {}. {} Keep it around {} words. Return only the prompt.",
        style.label(),
        style.instruction(),
        detail.word_budget()
    )
}

// ============================================================
// Marketplaces
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marketplace {
    AdobeStock,
    Shutterstock,
    Freepik,
    Getty,
    Istock,
    Dreamstime,
    #[serde(rename = "123rf")]
    OneTwoThreeRf,
    Pond5,
}

impl Marketplace {
    pub const ALL: [Marketplace; 8] = [
        Marketplace::AdobeStock,
        Marketplace::Shutterstock,
        Marketplace::Freepik,
        Marketplace::Getty,
        Marketplace::Istock,
        Marketplace::Dreamstime,
        Marketplace::OneTwoThreeRf,
        Marketplace::Pond5,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::AdobeStock => "adobe-stock",
            Self::Shutterstock => "shutterstock",
            Self::Freepik => "freepik",
            Self::Getty => "getty",
            Self::Istock => "istock",
            Self::Dreamstime => "dreamstime",
            Self::OneTwoThreeRf => "123rf",
            Self::Pond5 => "pond5",
        }
    }
}

/// Parse marketplace slugs, dropping duplicates and keeping first-seen order.
pub fn parse_marketplaces(slugs: &[String]) -> Result<Vec<Marketplace>, StockpilotError> {
    let mut out: Vec<Marketplace> = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let m: Marketplace = slug.parse()?;
        if !out.contains(&m) {
            out.push(m);
        }
    }
    Ok(out)
}

/// Credits a generation costs: one per marketplace, never less than one.
pub fn credit_cost(marketplaces: &[Marketplace]) -> i32 {
    marketplaces.len().max(1) as i32
}

macro_rules! slug_enum_impls {
    ($ty:ty, $all:expr, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.slug())
            }
        }

        impl FromStr for $ty {
            type Err = StockpilotError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase();
                $all.into_iter()
                    .find(|v| v.slug() == needle)
                    .ok_or_else(|| StockpilotError::Validation {
                        message: format!("Unknown {}: '{}'", $what, s),
                    })
            }
        }
    };
}

slug_enum_impls!(PromptStyle, PromptStyle::ALL, "prompt style");
slug_enum_impls!(PromptDetail, PromptDetail::ALL, "detail level");
slug_enum_impls!(Marketplace, Marketplace::ALL, "marketplace");
