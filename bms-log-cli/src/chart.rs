//! Dual-axis SVG chart of the decoded BMS series
//!
//! The primary axis carries state of charge, current magnitude and cell
//! temperatures as solid lines; the secondary axis carries cell voltages as
//! dashed lines. Both share the time axis and one legend.

use anyhow::{anyhow, Result};
use bms_log_decoder::{SignalAccumulator, SignalSeries};
use plotters::prelude::*;
use std::ops::Range;

const RANGE_PADDING: f64 = 0.05;

const COLORS: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

/// Which y-axis a trace is drawn against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Primary,
    Secondary,
}

/// Display-only transform applied to values when plotting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// Plot the magnitude; the stored series keeps its sign
    Absolute,
}

impl Transform {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Transform::Identity => value,
            Transform::Absolute => value.abs(),
        }
    }
}

/// One signal's line on the chart
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub signal: String,
    pub axis: Axis,
    pub transform: Transform,
}

impl Trace {
    fn new(signal: &str, axis: Axis, transform: Transform) -> Self {
        Self {
            signal: signal.to_string(),
            axis,
            transform,
        }
    }

    /// Points as they are drawn, after the display transform
    pub fn display_points(&self, series: &SignalSeries) -> Vec<(f64, f64)> {
        series
            .points()
            .map(|(t, v)| (t, self.transform.apply(v)))
            .collect()
    }
}

/// Figure size, labels and trace assignment
#[derive(Debug, Clone)]
pub struct ChartLayout {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub x_label: String,
    pub primary_label: String,
    pub secondary_label: String,
    pub traces: Vec<Trace>,
}

impl ChartLayout {
    /// The battery dashboard layout
    pub fn bms() -> Self {
        use Axis::{Primary, Secondary};
        use Transform::{Absolute, Identity};

        Self {
            title: None,
            width: 1200,
            height: 600,
            x_label: "Time (s)".to_string(),
            primary_label: "SOC / Current (A) / Temp (°C)".to_string(),
            secondary_label: "Min/Max Voltage (V)".to_string(),
            traces: vec![
                Trace::new("B2V_SOC", Primary, Identity),
                Trace::new("B2V_TotalI", Primary, Absolute),
                Trace::new("B2V_MinCellT", Primary, Identity),
                Trace::new("B2V_MaxCellT", Primary, Identity),
                Trace::new("B2V_MaxCellV", Secondary, Identity),
                Trace::new("B2V_MinCellV", Secondary, Identity),
            ],
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// A trace resolved against the decoded series
struct PlotLine<'a> {
    name: &'a str,
    axis: Axis,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

/// Padded range covering `values`; a unit interval when there is nothing to cover
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }

    let pad = (max - min) * RANGE_PADDING;
    (min - pad)..(max + pad)
}

/// Render the chart as a standalone SVG document
///
/// Traces whose signal has no series are left out of the plot and legend.
pub fn render_svg(layout: &ChartLayout, series: &SignalAccumulator) -> Result<String> {
    let lines: Vec<PlotLine<'_>> = layout
        .traces
        .iter()
        .filter_map(|trace| series.get(&trace.signal).map(|s| (trace, s)))
        .enumerate()
        .map(|(idx, (trace, s))| PlotLine {
            name: &trace.signal,
            axis: trace.axis,
            color: COLORS[idx % COLORS.len()],
            points: trace
                .display_points(s)
                .into_iter()
                .filter(|(t, v)| t.is_finite() && v.is_finite())
                .collect(),
        })
        .collect();

    let axis_values = |axis: Axis| {
        lines
            .iter()
            .filter(move |l| l.axis == axis)
            .flat_map(|l| l.points.iter().map(|&(_, v)| v))
    };
    let x_range = padded_range(lines.iter().flat_map(|l| l.points.iter().map(|&(t, _)| t)));
    let primary = padded_range(axis_values(Axis::Primary));
    let secondary = padded_range(axis_values(Axis::Secondary));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (layout.width, layout.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!("Failed to draw chart: {}", e))?;

        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(64)
            .right_y_label_area_size(64);
        if let Some(title) = &layout.title {
            builder.caption(title, ("sans-serif", 20));
        }

        let mut chart = builder
            .build_cartesian_2d(x_range.clone(), primary)
            .map_err(|e| anyhow!("Failed to build chart: {}", e))?
            .set_secondary_coord(x_range, secondary);

        chart
            .configure_mesh()
            .x_desc(layout.x_label.as_str())
            .y_desc(layout.primary_label.as_str())
            .draw()
            .map_err(|e| anyhow!("Failed to draw axes: {}", e))?;
        chart
            .configure_secondary_axes()
            .y_desc(layout.secondary_label.as_str())
            .draw()
            .map_err(|e| anyhow!("Failed to draw secondary axis: {}", e))?;

        for line in &lines {
            let color = line.color;
            let anno = match line.axis {
                Axis::Primary => chart.draw_series(LineSeries::new(
                    line.points.iter().copied(),
                    color.stroke_width(2),
                )),
                Axis::Secondary => chart.draw_secondary_series(DashedLineSeries::new(
                    line.points.iter().copied(),
                    6,
                    4,
                    color.stroke_width(2),
                )),
            }
            .map_err(|e| anyhow!("Failed to draw {}: {}", line.name, e))?;

            anno.label(line.name).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        }

        if !lines.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| anyhow!("Failed to draw legend: {}", e))?;
        }

        root.present().map_err(|e| anyhow!("Failed to write chart: {}", e))?;
    }

    Ok(svg)
}
