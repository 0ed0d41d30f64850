use anyhow::{Context, Result, anyhow, bail};
use image::{Rgb, RgbImage};
use plotters::prelude::*;
use plotters::coord::types::RangedCoordf64;

use crate::artifact::encode_png;
use crate::fonts::{LoadedFont, Mask, blit};
use crate::projection::ChartSeries;

// 6x4 inches at 100 dpi.
pub const WIDTH: u32 = 600;
pub const HEIGHT: u32 = 400;

pub const SERIES_LABEL: &str = "PTS";
pub const X_AXIS_TITLE: &str = "Game Date";
pub const Y_AXIS_TITLE: &str = "Points";

const MARGIN_TOP: u32 = 40;
const MARGIN_RIGHT: u32 = 20;
const LEFT_AREA: u32 = 70;
const BOTTOM_AREA: u32 = 100;
const TICK: i32 = 5;
const Y_TICKS: usize = 6;
const MARKER_RADIUS: i32 = 4;

const TITLE_SIZE: f32 = 16.0;
const AXIS_TITLE_SIZE: f32 = 13.0;
const TICK_SIZE: f32 = 11.0;
const LEGEND_SIZE: f32 = 12.0;

const INK: Rgb<u8> = Rgb([0, 0, 0]);

pub struct ChartImage {
    pub png: Vec<u8>,
    /// Pixel centres of the point markers, one per value, in series order.
    pub markers: Vec<(i32, i32)>,
}

pub fn chart_title(team: &str) -> String {
    format!("Last 5 Games PTS - {team}")
}

/// Single-series line chart with circle markers, rotated date labels and a
/// legend. The plotting surface only lives inside the drawing scope, so it is
/// released before encoding whether drawing succeeded or not.
pub fn render_chart(series: &ChartSeries, title: &str, font: &LoadedFont) -> Result<ChartImage> {
    if series.is_empty() {
        bail!("chart needs at least one value");
    }
    if series.x_labels.len() != series.y_values.len() {
        bail!(
            "chart labels ({}) and values ({}) differ in length",
            series.x_labels.len(),
            series.y_values.len()
        );
    }
    if series.y_values.iter().any(|v| !v.is_finite()) {
        bail!("chart values must be finite");
    }

    let axis = YAxis::fit(&series.y_values);
    let last_x = series.len() as f64 - 0.5;
    let legend_text = font.rasterize(SERIES_LABEL, LEGEND_SIZE);

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    let layout = {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err("background"))?;

        let mut chart = ChartBuilder::on(&root)
            .margin_top(MARGIN_TOP)
            .margin_right(MARGIN_RIGHT)
            .x_label_area_size(BOTTOM_AREA)
            .y_label_area_size(LEFT_AREA)
            .build_cartesian_2d(-0.5f64..last_x, axis.lo..axis.hi)
            .map_err(plot_err("axes"))?;

        let points: Vec<(f64, f64)> = series
            .y_values
            .iter()
            .enumerate()
            .map(|(i, y)| (i as f64, *y))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))
            .map_err(plot_err("line"))?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&p| Circle::new(p, MARKER_RADIUS, BLUE.filled())),
            )
            .map_err(plot_err("markers"))?;

        let top_left = chart.backend_coord(&(-0.5, axis.hi));
        let bottom_right = chart.backend_coord(&(last_x, axis.lo));
        root.draw(&Rectangle::new([top_left, bottom_right], BLACK.stroke_width(1)))
            .map_err(plot_err("frame"))?;

        let mut x_ticks = Vec::with_capacity(points.len());
        for &(x, _) in &points {
            let (px, _) = chart.backend_coord(&(x, axis.lo));
            root.draw(&PathElement::new(
                vec![(px, bottom_right.1), (px, bottom_right.1 + TICK)],
                BLACK,
            ))
            .map_err(plot_err("x ticks"))?;
            x_ticks.push(px);
        }

        let mut y_ticks = Vec::with_capacity(axis.ticks.len());
        for &value in &axis.ticks {
            let (_, py) = chart.backend_coord(&(-0.5, value));
            root.draw(&PathElement::new(
                vec![(top_left.0 - TICK, py), (top_left.0, py)],
                BLACK,
            ))
            .map_err(plot_err("y ticks"))?;
            y_ticks.push((py, axis.label(value)));
        }

        let markers: Vec<(i32, i32)> = points.iter().map(|p| chart.backend_coord(p)).collect();
        let legend = LegendBox::place(top_left, bottom_right, &legend_text, &markers);
        root.draw(&Rectangle::new(
            [legend.top_left, legend.bottom_right],
            WHITE.filled(),
        ))
        .map_err(plot_err("legend"))?;
        root.draw(&Rectangle::new(
            [legend.top_left, legend.bottom_right],
            RGBColor(160, 160, 160).stroke_width(1),
        ))
        .map_err(plot_err("legend"))?;
        let (sx0, sx1, sy) = legend.swatch();
        root.draw(&PathElement::new(vec![(sx0, sy), (sx1, sy)], BLUE.stroke_width(2)))
            .map_err(plot_err("legend"))?;
        root.draw(&Circle::new(((sx0 + sx1) / 2, sy), MARKER_RADIUS, BLUE.filled()))
            .map_err(plot_err("legend"))?;

        root.present().map_err(plot_err("present"))?;

        Layout {
            top_left,
            bottom_right,
            x_ticks,
            y_ticks,
            legend,
            markers,
        }
    };

    let mut img =
        RgbImage::from_raw(WIDTH, HEIGHT, buffer).context("plot buffer has the wrong size")?;
    overlay_text(&mut img, &layout, series, title, font, &legend_text);

    Ok(ChartImage {
        png: encode_png(&img)?,
        markers: layout.markers,
    })
}

fn plot_err<E: std::fmt::Display>(stage: &'static str) -> impl FnOnce(E) -> anyhow::Error {
    move |err| anyhow!("failed to draw chart {stage}: {err}")
}

struct Layout {
    top_left: (i32, i32),
    bottom_right: (i32, i32),
    x_ticks: Vec<i32>,
    y_ticks: Vec<(i32, String)>,
    legend: LegendBox,
    markers: Vec<(i32, i32)>,
}

struct LegendBox {
    top_left: (i32, i32),
    bottom_right: (i32, i32),
}

impl LegendBox {
    const SWATCH: i32 = 24;
    const PAD: i32 = 6;

    /// Sized to the label and put in the first plot corner (upper right,
    /// upper left, lower right, lower left) that keeps every marker visible.
    fn place(
        plot_top_left: (i32, i32),
        plot_bottom_right: (i32, i32),
        label: &Mask,
        markers: &[(i32, i32)],
    ) -> Self {
        const INSET: i32 = 8;
        let width = Self::PAD * 3 + Self::SWATCH + label.width() as i32;
        let height = (label.height() as i32).max(MARKER_RADIUS * 2) + Self::PAD * 2;
        let left = plot_top_left.0 + INSET;
        let right = plot_bottom_right.0 - INSET - width;
        let top = plot_top_left.1 + INSET;
        let bottom = plot_bottom_right.1 - INSET - height;

        let candidates = [(right, top), (left, top), (right, bottom), (left, bottom)];
        let (x, y) = candidates
            .iter()
            .copied()
            .find(|&(x, y)| {
                let reach = MARKER_RADIUS + 1;
                !markers.iter().any(|&(mx, my)| {
                    (x - reach..=x + width + reach).contains(&mx)
                        && (y - reach..=y + height + reach).contains(&my)
                })
            })
            .unwrap_or(candidates[0]);
        Self {
            top_left: (x, y),
            bottom_right: (x + width, y + height),
        }
    }

    fn swatch(&self) -> (i32, i32, i32) {
        let x0 = self.top_left.0 + Self::PAD;
        let y = (self.top_left.1 + self.bottom_right.1) / 2;
        (x0, x0 + Self::SWATCH, y)
    }

    fn label_origin(&self, label: &Mask) -> (i32, i32) {
        let x = self.top_left.0 + Self::PAD * 2 + Self::SWATCH;
        let y = (self.top_left.1 + self.bottom_right.1) / 2 - label.height() as i32 / 2;
        (x, y)
    }
}

fn overlay_text(
    img: &mut RgbImage,
    layout: &Layout,
    series: &ChartSeries,
    title: &str,
    font: &LoadedFont,
    legend_text: &Mask,
) {
    let plot_mid_x = (layout.top_left.0 + layout.bottom_right.0) / 2;
    let plot_mid_y = (layout.top_left.1 + layout.bottom_right.1) / 2;

    let title_mask = font.rasterize(title, TITLE_SIZE);
    blit(
        img,
        &title_mask,
        plot_mid_x - title_mask.width() as i32 / 2,
        (MARGIN_TOP as i32 - title_mask.height() as i32) / 2,
        INK,
    );

    for (py, label) in &layout.y_ticks {
        let mask = font.rasterize(label, TICK_SIZE);
        blit(
            img,
            &mask,
            layout.top_left.0 - TICK - 4 - mask.width() as i32,
            py - mask.height() as i32 / 2,
            INK,
        );
    }

    for (px, label) in layout.x_ticks.iter().zip(&series.x_labels) {
        let mask = font.rasterize(label, TICK_SIZE).rotated(45.0);
        blit(
            img,
            &mask,
            px - mask.width() as i32 / 2,
            layout.bottom_right.1 + TICK + 3,
            INK,
        );
    }

    let x_title = font.rasterize(X_AXIS_TITLE, AXIS_TITLE_SIZE);
    blit(
        img,
        &x_title,
        plot_mid_x - x_title.width() as i32 / 2,
        HEIGHT as i32 - x_title.height() as i32 - 6,
        INK,
    );

    let y_title = font.rasterize(Y_AXIS_TITLE, AXIS_TITLE_SIZE).rotated(90.0);
    blit(
        img,
        &y_title,
        6,
        plot_mid_y - y_title.height() as i32 / 2,
        INK,
    );

    let (lx, ly) = layout.legend.label_origin(legend_text);
    blit(img, legend_text, lx, ly, INK);
}

/// Padded value range. Tick positions come from plotters' key-point search
/// over the same range the chart is built on.
#[derive(Debug, Clone, PartialEq)]
pub struct YAxis {
    pub lo: f64,
    pub hi: f64,
    pub ticks: Vec<f64>,
}

impl YAxis {
    pub fn fit(values: &[f64]) -> Self {
        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            min = 0.0;
            max = 1.0;
        }
        if (max - min).abs() < f64::EPSILON {
            min -= 1.0;
            max += 1.0;
        }
        let pad = (max - min) * 0.08;
        let lo = min - pad;
        let hi = max + pad;
        let coord: RangedCoordf64 = (lo..hi).into();
        Self {
            lo,
            hi,
            ticks: coord.key_points(Y_TICKS),
        }
    }

    pub fn label(&self, value: f64) -> String {
        let step = match self.ticks.as_slice() {
            [a, b, ..] => (b - a).abs(),
            _ => 1.0,
        };
        if step >= 1.0 - 1e-6 && (step - step.round()).abs() < 1e-6 {
            return format!("{value:.0}");
        }
        let decimals = (-step.log10().floor()).clamp(1.0, 4.0) as usize;
        format!("{value:.decimals$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_evenly_spaced_inside_the_range() {
        let axis = YAxis::fit(&[98.0, 121.0, 110.0, 104.0, 117.0]);
        assert!((2..=Y_TICKS).contains(&axis.ticks.len()));
        let step = axis.ticks[1] - axis.ticks[0];
        assert!(
            axis.ticks
                .windows(2)
                .all(|w| ((w[1] - w[0]) - step).abs() < 1e-6)
        );
    }

    #[test]
    fn fractional_steps_get_decimals() {
        let axis = YAxis::fit(&[0.1, 0.4]);
        assert!(axis.label(axis.ticks[0]).contains('.'));
    }

    #[test]
    fn axis_covers_values_with_ticks_inside() {
        let axis = YAxis::fit(&[98.0, 121.0, 110.0, 104.0, 117.0]);
        assert!(axis.lo < 98.0 && axis.hi > 121.0);
        assert!(!axis.ticks.is_empty());
        assert!(axis.ticks.iter().all(|t| *t >= axis.lo && *t <= axis.hi + 1e-9));
        assert_eq!(axis.label(110.0), "110");
    }

    #[test]
    fn flat_series_still_gets_a_range() {
        let axis = YAxis::fit(&[100.0]);
        assert!(axis.lo < 100.0 && axis.hi > 100.0);
    }
}
