use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};

pub const SCHEDULE_FILENAME: &str = "games_today.png";
pub const CHART_FILENAME: &str = "last5games.png";

/// A reply handed to the channel. Images are PNG bytes held in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Text(String),
    Image { bytes: Vec<u8>, filename: String },
}

impl Artifact {
    pub fn text(content: impl Into<String>) -> Self {
        Artifact::Text(content.into())
    }

    pub fn image(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Artifact::Image {
            bytes,
            filename: filename.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Text(content) => Some(content),
            Artifact::Image { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Artifact::Image { .. })
    }

    /// One-line description for logs and the console.
    pub fn summary(&self) -> String {
        match self {
            Artifact::Text(content) => {
                let first = content.lines().next().unwrap_or_default();
                format!("text ({} lines) {first}", content.lines().count())
            }
            Artifact::Image { bytes, filename } => match png_dimensions(bytes) {
                Some((w, h)) => format!("{filename} ({w}x{h}, {:.1} KB)", kib(bytes.len())),
                None => format!("{filename} ({:.1} KB)", kib(bytes.len())),
            },
        }
    }
}

fn kib(len: usize) -> f64 {
    len as f64 / 1024.0
}

pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("png encoding failed")?;
    Ok(bytes)
}

/// Width and height from the IHDR chunk, without decoding pixels.
pub fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
    if bytes.len() < 24 || &bytes[..8] != SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}
