use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use image::{Rgb, RgbImage};

use crate::artifact::encode_png;
use crate::fonts::LoadedFont;
use crate::stats_fetch::ScheduleLine;

pub const WIDTH: u32 = 800;
pub const PADDING: u32 = 20;
pub const LINE_SPACING: u32 = 40;
pub const FONT_SIZE: f32 = 24.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

pub fn canvas_height(lines: usize) -> u32 {
    PADDING * 2 + LINE_SPACING * lines as u32
}

/// `"{time} | {home} vs {away}"`, with the time shifted to `offset` when one
/// is given and the provider time parses.
pub fn schedule_text(line: &ScheduleLine, offset: Option<FixedOffset>) -> String {
    let time = match offset {
        Some(offset) => DateTime::parse_from_rfc3339(&line.time_utc)
            .map(|t| t.with_timezone(&offset).format("%Y-%m-%d %H:%M %:z").to_string())
            .unwrap_or_else(|_| line.time_utc.clone()),
        None => line.time_utc.clone(),
    };
    format!("{time} | {} vs {}", line.home_team, line.away_team)
}

/// One text line per game on a white 800px-wide canvas. Height grows with the
/// number of games; long lines are clipped at the right edge.
pub fn render_schedule(texts: &[String], font: &LoadedFont) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, canvas_height(texts.len()), BACKGROUND);
    for (i, text) in texts.iter().enumerate() {
        let y = PADDING + i as u32 * LINE_SPACING;
        font.draw_text(&mut img, PADDING as i32, y as i32, text, FONT_SIZE, INK);
    }
    img
}

pub fn render_schedule_png(
    lines: &[ScheduleLine],
    offset: Option<FixedOffset>,
    font: &LoadedFont,
) -> Result<Vec<u8>> {
    let texts: Vec<String> = lines.iter().map(|l| schedule_text(l, offset)).collect();
    encode_png(&render_schedule(&texts, font))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_utc_offset;

    fn line() -> ScheduleLine {
        ScheduleLine {
            time_utc: "2024-11-21T00:30:00Z".to_string(),
            home_team: "Celtics".to_string(),
            away_team: "Lakers".to_string(),
        }
    }

    #[test]
    fn text_keeps_provider_time_without_offset() {
        assert_eq!(
            schedule_text(&line(), None),
            "2024-11-21T00:30:00Z | Celtics vs Lakers"
        );
    }

    #[test]
    fn text_converts_to_offset() {
        let offset = parse_utc_offset("+08:00");
        assert_eq!(
            schedule_text(&line(), offset),
            "2024-11-21 08:30 +08:00 | Celtics vs Lakers"
        );
    }

    #[test]
    fn unparseable_time_passes_through() {
        let mut l = line();
        l.time_utc = "TBD".to_string();
        assert_eq!(
            schedule_text(&l, parse_utc_offset("-05:00")),
            "TBD | Celtics vs Lakers"
        );
    }
}
