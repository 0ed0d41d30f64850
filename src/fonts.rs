use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::{Rgb, RgbImage};
use thiserror::Error;

use crate::builtin_font;

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("cannot read font {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a usable font", path.display())]
    Invalid { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontOrigin {
    File(PathBuf),
    Builtin,
}

enum Face {
    Outline(FontVec),
    Bitmap,
}

pub struct LoadedFont {
    face: Face,
    origin: FontOrigin,
}

/// Tries the font file at `path` and falls back to the built-in bitmap font
/// when it cannot be used. Never fails.
pub fn load_font(path: &Path) -> LoadedFont {
    match try_load_outline(path) {
        Ok(font) => LoadedFont {
            face: Face::Outline(font),
            origin: FontOrigin::File(path.to_path_buf()),
        },
        Err(err) => {
            tracing::debug!(error = %err, "using built-in bitmap font");
            LoadedFont::builtin()
        }
    }
}

pub fn try_load_outline(path: &Path) -> Result<FontVec, FontLoadError> {
    let bytes = fs::read(path).map_err(|source| FontLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(bytes).map_err(|_| FontLoadError::Invalid {
        path: path.to_path_buf(),
    })
}

impl LoadedFont {
    pub fn builtin() -> Self {
        Self {
            face: Face::Bitmap,
            origin: FontOrigin::Builtin,
        }
    }

    pub fn origin(&self) -> &FontOrigin {
        &self.origin
    }

    /// Coverage mask for `text` at `size` pixels, top edge at the ascender.
    pub fn rasterize(&self, text: &str, size: f32) -> Mask {
        match &self.face {
            Face::Outline(font) => rasterize_outline(font, text, size),
            Face::Bitmap => rasterize_bitmap(text, size),
        }
    }

    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let mask = self.rasterize(text, size);
        (mask.width, mask.height)
    }

    pub fn draw_text(
        &self,
        img: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        size: f32,
        color: Rgb<u8>,
    ) {
        let mask = self.rasterize(text, size);
        blit(img, &mask, x, y, color);
    }
}

fn rasterize_outline(font: &FontVec, text: &str, size: f32) -> Mask {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let height = (ascent - scaled.descent()).ceil().max(1.0) as u32;

    let mut caret = 0.0f32;
    let mut previous = None;
    let mut glyphs = Vec::new();
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, ascent)));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    let mut mask = Mask::new(caret.ceil().max(1.0) as u32, height);
    for glyph in glyphs {
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = bounds.min.x as i32 + gx as i32;
            let y = bounds.min.y as i32 + gy as i32;
            mask.add(x, y, coverage);
        });
    }
    mask
}

fn bitmap_scale(size: f32) -> u32 {
    ((size / 10.0).floor() as u32).max(1)
}

fn rasterize_bitmap(text: &str, size: f32) -> Mask {
    let scale = bitmap_scale(size);
    let chars = text.chars().count() as u32;
    let width = (chars * builtin_font::CELL_WIDTH * scale).max(1);
    let height = builtin_font::CELL_HEIGHT * scale;
    let mut mask = Mask::new(width, height);

    for (i, ch) in text.chars().enumerate() {
        let origin_x = i as u32 * builtin_font::CELL_WIDTH * scale;
        for col in 0..builtin_font::GLYPH_WIDTH {
            for row in 0..builtin_font::GLYPH_HEIGHT {
                if !builtin_font::pixel_on(ch, col, row) {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = origin_x + col * scale + dx;
                        let y = scale + row * scale + dy;
                        mask.add(x as i32, y as i32, 1.0);
                    }
                }
            }
        }
    }
    mask
}

/// Per-pixel text coverage in `0.0..=1.0`.
#[derive(Debug, Clone)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn coverage(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0.0;
        }
        self.data[(y as u32 * self.width + x as u32) as usize]
    }

    fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        self.data[idx] = (self.data[idx] + coverage).min(1.0);
    }

    /// Counter-clockwise rotation by `degrees`; the result is the rotated
    /// bounding box.
    pub fn rotated(&self, degrees: f32) -> Mask {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
        let forward = |x: f32, y: f32| (x * cos + y * sin, -x * sin + y * cos);

        let mut min = (f32::MAX, f32::MAX);
        let mut max = (f32::MIN, f32::MIN);
        for (x, y) in corners {
            let (dx, dy) = forward(x, y);
            min = (min.0.min(dx), min.1.min(dy));
            max = (max.0.max(dx), max.1.max(dy));
        }

        // Trim float noise so a quarter turn keeps exact dimensions.
        let out_w = (max.0 - min.0 - 1e-3).ceil().max(1.0) as u32;
        let out_h = (max.1 - min.1 - 1e-3).ceil().max(1.0) as u32;
        let mut out = Mask::new(out_w, out_h);
        for py in 0..out_h {
            for px in 0..out_w {
                let dx = px as f32 + 0.5 + min.0;
                let dy = py as f32 + 0.5 + min.1;
                let sx = dx * cos - dy * sin;
                let sy = dx * sin + dy * cos;
                let c = self.coverage(sx.floor() as i32, sy.floor() as i32);
                if c > 0.0 {
                    out.data[(py * out_w + px) as usize] = c;
                }
            }
        }
        out
    }
}

/// Blends `color` into `img` through `mask`, top-left at (`x`, `y`). Pixels
/// outside the image are clipped.
pub fn blit(img: &mut RgbImage, mask: &Mask, x: i32, y: i32, color: Rgb<u8>) {
    let (img_w, img_h) = img.dimensions();
    for my in 0..mask.height {
        let ty = y + my as i32;
        if ty < 0 || ty as u32 >= img_h {
            continue;
        }
        for mx in 0..mask.width {
            let tx = x + mx as i32;
            if tx < 0 || tx as u32 >= img_w {
                continue;
            }
            let alpha = mask.data[(my * mask.width + mx) as usize];
            if alpha <= 0.0 {
                continue;
            }
            let dst = img.get_pixel_mut(tx as u32, ty as u32);
            for channel in 0..3 {
                let under = dst.0[channel] as f32;
                let over = color.0[channel] as f32;
                dst.0[channel] = (under + (over - under) * alpha).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_file_falls_back_to_builtin() {
        let font = load_font(Path::new("/nonexistent/definitely-not-a-font.ttf"));
        assert_eq!(font.origin(), &FontOrigin::Builtin);
    }

    #[test]
    fn garbage_font_file_is_invalid() {
        let path = std::env::temp_dir().join("courtside-not-a-font.ttf");
        fs::write(&path, b"not a font").unwrap();
        let err = try_load_outline(&path).unwrap_err();
        assert!(matches!(err, FontLoadError::Invalid { .. }));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn bitmap_text_has_ink() {
        let mask = LoadedFont::builtin().rasterize("Hi", 24.0);
        assert_eq!(mask.width(), 2 * builtin_font::CELL_WIDTH * 2);
        let ink = (0..mask.height() as i32)
            .flat_map(|y| (0..mask.width() as i32).map(move |x| (x, y)))
            .filter(|&(x, y)| mask.coverage(x, y) > 0.0)
            .count();
        assert!(ink > 0);
    }

    #[test]
    fn rotation_by_ninety_swaps_dimensions() {
        let mask = LoadedFont::builtin().rasterize("PTS", 12.0);
        let turned = mask.rotated(90.0);
        assert_eq!(turned.width(), mask.height());
        assert_eq!(turned.height(), mask.width());
    }

    #[test]
    fn blit_clips_outside_pixels() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let mask = LoadedFont::builtin().rasterize("W", 30.0);
        blit(&mut img, &mask, -2, -2, Rgb([0, 0, 0]));
        assert_eq!(img.dimensions(), (4, 4));
    }
}
