use crate::types::Sample;
use serde::Serialize;

/// Pixel geometry of the chart viewport. Padding applies on all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for ChartGeometry {
    fn default() -> ChartGeometry {
        ChartGeometry {
            width: 760.0,
            height: 320.0,
            padding: 32.0,
        }
    }
}

impl ChartGeometry {
    fn inner_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }

    fn inner_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }

    fn x_step(&self, len: usize) -> f64 {
        self.inner_width() / len.saturating_sub(1).max(1) as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TooltipSize {
    pub width: f64,
    pub height: f64,
}

impl Default for TooltipSize {
    fn default() -> TooltipSize {
        TooltipSize {
            width: 160.0,
            height: 64.0,
        }
    }
}

/// Guard against a zero temperature span on flat or singleton buckets.
const FLAT_RANGE: f64 = 1e-9;

/// Offset from the anchor point to the tooltip's top-left corner.
const TOOLTIP_OFFSET_X: f64 = 14.0;
const TOOLTIP_OFFSET_Y: f64 = -10.0;

/// Project a day bucket into chart coordinates. Samples spread evenly along
/// x; y is the temperature normalized into the padded viewport, inverted
/// because plotting y grows downward. A singleton bucket lands at the bottom
/// of the plot area (frac = 0).
pub fn project(bucket: &[Sample], geometry: &ChartGeometry) -> Vec<ChartPoint> {
    if bucket.is_empty() {
        return Vec::new();
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for sample in bucket {
        min = min.min(sample.temperature);
        max = max.max(sample.temperature);
    }
    let range = (max - min).max(FLAT_RANGE);
    let step = geometry.x_step(bucket.len());

    bucket
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let frac = (sample.temperature - min) / range;
            ChartPoint {
                x: geometry.padding + i as f64 * step,
                y: geometry.padding + (1.0 - frac) * geometry.inner_height(),
            }
        })
        .collect()
}

/// Map a pointer x position to the nearest sample index: the inverse of the
/// x mapping in [`project`], rounded and clamped into range. `None` for an
/// empty bucket, so a vacated chart never reports a stale index.
pub fn index_at(pointer_x: f64, len: usize, geometry: &ChartGeometry) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let step = geometry.x_step(len);
    let raw = ((pointer_x - geometry.padding) / step).round();
    Some(raw.clamp(0.0, (len - 1) as f64) as usize)
}

/// Place the tooltip near the anchor, clamped so the full rectangle stays
/// inside the chart bounds on both axes.
pub fn tooltip_position(
    anchor: ChartPoint,
    size: TooltipSize,
    geometry: &ChartGeometry,
) -> ChartPoint {
    ChartPoint {
        x: (anchor.x + TOOLTIP_OFFSET_X).clamp(0.0, (geometry.width - size.width).max(0.0)),
        y: (anchor.y + TOOLTIP_OFFSET_Y).clamp(0.0, (geometry.height - size.height).max(0.0)),
    }
}
