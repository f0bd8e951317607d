//! Geometry for the flow gauge and rolling chart
//!
//! Drawing itself belongs to whoever renders the dashboard; these helpers
//! only turn a [`FlowSummary`] into coordinates and characters.

use crate::stream::sample_stream::FlowSummary;
use std::fmt::Write;

/// Block characters used by [`sparkline`], lowest to highest
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Polyline for the rolling flow chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    /// One (x, y) point per sample, oldest on the left; y grows downwards
    pub points: Vec<(f64, f64)>,
}

impl ChartGeometry {
    /// Lay the summary's buffer out on a `width` x `height` canvas
    ///
    /// The vertical range is the summary's `min..max`, so a flat zero buffer
    /// sits on the bottom edge.
    pub fn from_summary(summary: &FlowSummary, width: f64, height: f64) -> Self {
        Self::from_values(&summary.buffer, summary.min, summary.max, width, height)
    }

    pub fn from_values(values: &[f64], min: f64, max: f64, width: f64, height: f64) -> Self {
        let range = max - min;
        let step = if values.len() > 1 {
            width / (values.len() - 1) as f64
        } else {
            0.0
        };

        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let normalized = if range > 0.0 { (v - min) / range } else { 0.0 };
                (i as f64 * step, height - normalized * height)
            })
            .collect();

        Self {
            width,
            height,
            points,
        }
    }

    /// SVG path data (`M x y L x y ...`)
    pub fn svg_path(&self) -> String {
        let mut path = String::new();
        for (i, (x, y)) in self.points.iter().enumerate() {
            let command = if i == 0 { 'M' } else { 'L' };
            if i > 0 {
                path.push(' ');
            }
            let _ = write!(path, "{} {:.2} {:.2}", command, x, y);
        }
        path
    }
}

/// Fill fraction of the gauge, clamped to `[0, 1]`
pub fn gauge_fraction(value: f64, max: f64) -> f64 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

/// One block character per value, scaled between `min` and `max`
pub fn sparkline(values: &[f64], min: f64, max: f64) -> String {
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            let normalized = if range > 0.0 {
                ((v - min) / range).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let level = (normalized * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    #[test]
    fn test_flat_baseline_on_bottom_edge() {
        let chart = ChartGeometry::from_values(&[0.0; 5], 0.0, 100.0, 200.0, 50.0);
        assert_eq!(chart.points.len(), 5);
        assert!(chart.points.iter().all(|&(_, y)| y == 50.0));
        assert_relative_eq!(chart.points[4].0, 200.0);
    }

    #[test]
    fn test_points_scaled_to_range() {
        let chart = ChartGeometry::from_values(&[0.0, 50.0, 100.0], 0.0, 100.0, 100.0, 100.0);
        assert_eq!(chart.points, vec![(0.0, 100.0), (50.0, 50.0), (100.0, 0.0)]);
    }

    #[test]
    fn test_chart_from_first_sample_summary() {
        let mut buffer = vec![0.0; 29];
        buffer.push(42.5);
        let summary = FlowSummary {
            buffer,
            min: 0.0,
            max: 100.0,
            average: 42.5 / 30.0,
            current: 42.5,
            updated_at: Utc::now(),
        };

        let chart = ChartGeometry::from_summary(&summary, 290.0, 80.0);
        assert_eq!(chart.points.len(), 30);
        let (x, y) = chart.points[29];
        assert_relative_eq!(x, chart.width);
        assert_relative_eq!(y, 80.0 * (1.0 - 0.425), epsilon = 1e-9);
        assert!(chart.points[..29].iter().all(|&(_, y)| y == 80.0));
    }

    #[test]
    fn test_svg_path() {
        let chart = ChartGeometry::from_values(&[0.0, 100.0], 0.0, 100.0, 10.0, 10.0);
        assert_eq!(chart.svg_path(), "M 0.00 10.00 L 10.00 0.00");
    }

    #[test]
    fn test_single_point_and_empty() {
        let chart = ChartGeometry::from_values(&[42.0], 0.0, 100.0, 10.0, 10.0);
        assert_eq!(chart.points.len(), 1);
        assert_eq!(chart.points[0].0, 0.0);

        let empty = ChartGeometry::from_values(&[], 0.0, 100.0, 10.0, 10.0);
        assert_eq!(empty.svg_path(), "");
    }

    #[test]
    fn test_gauge_fraction_clamped() {
        assert_eq!(gauge_fraction(50.0, 100.0), 0.5);
        assert_eq!(gauge_fraction(150.0, 100.0), 1.0);
        assert_eq!(gauge_fraction(-3.0, 100.0), 0.0);
        assert_eq!(gauge_fraction(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_sparkline() {
        assert_eq!(sparkline(&[0.0, 50.0, 100.0], 0.0, 100.0), "▁▅█");
        assert_eq!(sparkline(&[0.0; 3], 0.0, 100.0), "▁▁▁");
        assert_eq!(sparkline(&[], 0.0, 100.0), "");
    }
}
