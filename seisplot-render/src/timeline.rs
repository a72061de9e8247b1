//! Waveform timeline figure.
//!
//! Every station is drawn on one shared time axis. Samples inside the
//! station's highlight window are drawn solid and the rest translucent.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use seisplot_common::{Color, Error, StationDescriptor, Trace};
use serde::{Deserialize, Serialize};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{Color as _, FontDesc, FontFamily, FontStyle};

use crate::error::{RenderError, Result};
use crate::figure::{self, draw_err};

/// Legend frame color.
const LEGEND_EDGE: Color = Color::rgb(0xcc, 0xcc, 0xcc);

/// Legend text size in points.
const LEGEND_FONT_PT: f64 = 10.0;

/// Timeline figure settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Output PNG path (default: "images/waveforms.png").
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Figure width in inches (default: 16).
    #[serde(default = "default_width")]
    pub width_in: f64,

    /// Figure height in inches (default: 9).
    #[serde(default = "default_height")]
    pub height_in: f64,

    /// Output resolution (default: 300).
    #[serde(default = "default_dpi")]
    pub dpi: f64,

    /// Amplitude each station's peak is normalized to (default: 32471296).
    #[serde(default = "default_reference_amplitude")]
    pub reference_amplitude: f64,

    /// Opacity of samples outside the highlight window (default: 0.2).
    #[serde(default = "default_dim_alpha")]
    pub dim_alpha: f64,

    /// Line width in points (default: 1.0).
    #[serde(default = "default_line_width")]
    pub line_width: f64,

    /// Also write the SVG scene next to the PNG.
    #[serde(default)]
    pub write_svg: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("images/waveforms.png")
}

fn default_width() -> f64 {
    16.0
}

fn default_height() -> f64 {
    9.0
}

fn default_dpi() -> f64 {
    300.0
}

fn default_reference_amplitude() -> f64 {
    32_471_296.0
}

fn default_dim_alpha() -> f64 {
    0.2
}

fn default_line_width() -> f64 {
    1.0
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            width_in: default_width(),
            height_in: default_height(),
            dpi: default_dpi(),
            reference_amplitude: default_reference_amplitude(),
            dim_alpha: default_dim_alpha(),
            line_width: default_line_width(),
            write_svg: false,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> seisplot_common::Result<()> {
        if !(self.width_in > 0.0 && self.height_in > 0.0) {
            return Err(Error::validation("timeline width_in and height_in must be > 0"));
        }
        if !(self.dpi > 0.0) {
            return Err(Error::validation("timeline.dpi must be > 0"));
        }
        if !(self.reference_amplitude > 0.0) {
            return Err(Error::validation(
                "timeline.reference_amplitude must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.dim_alpha) {
            return Err(Error::validation(format!(
                "timeline.dim_alpha must be within [0, 1], got {}",
                self.dim_alpha
            )));
        }
        if !(self.line_width > 0.0) {
            return Err(Error::validation("timeline.line_width must be > 0"));
        }
        Ok(())
    }
}

/// One station's scaled samples, split at the station's end time.
///
/// Points are `(seconds since origin, scaled value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSeries {
    pub label: String,
    pub color: Color,
    pub bold: Vec<(f64, f64)>,
    pub dim: Vec<(f64, f64)>,
}

impl StationSeries {
    /// Scale and split a trace for plotting.
    ///
    /// Returns `None` when the trace has no usable peak or no sample falls
    /// inside both the station window and `[origin, window_end]`.
    pub fn build(
        station: &StationDescriptor,
        trace: &Trace,
        origin: DateTime<Utc>,
        window_end: DateTime<Utc>,
        reference_amplitude: f64,
    ) -> Option<Self> {
        let peak = match trace.max() {
            Some(m) if m > 0.0 => m,
            _ => trace.abs_max().filter(|m| *m > 0.0)?,
        };
        let factor = reference_amplitude / peak * station.scale;

        let mut bold = Vec::new();
        let mut dim = Vec::new();
        for (t, value) in trace.points() {
            if t < station.start || t < origin || t > window_end {
                continue;
            }
            let x = (t - origin).num_microseconds().unwrap_or_default() as f64 / 1e6;
            let point = (x, value * factor);
            if t < station.end {
                bold.push(point);
            } else {
                dim.push(point);
            }
        }

        if bold.is_empty() && dim.is_empty() {
            return None;
        }

        Some(Self {
            label: station.label.clone(),
            color: station.color,
            bold,
            dim,
        })
    }

    fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.bold.iter().chain(self.dim.iter())
    }
}

/// Reduce a polyline to at most a min/max pair per column.
///
/// Points are assumed sorted by x. Within each column the minimum and
/// maximum are kept in their original order, which preserves the visual
/// envelope of dense signals.
pub fn decimate(
    points: &[(f64, f64)],
    x_lo: f64,
    x_span: f64,
    columns: usize,
) -> Vec<(f64, f64)> {
    if columns == 0 || x_span <= 0.0 || points.len() <= 2 * columns {
        return points.to_vec();
    }

    struct Bucket {
        column: usize,
        min: (usize, (f64, f64)),
        max: (usize, (f64, f64)),
    }

    fn flush(bucket: &Bucket, out: &mut Vec<(f64, f64)>) {
        let (first, second) = if bucket.min.0 <= bucket.max.0 {
            (bucket.min, bucket.max)
        } else {
            (bucket.max, bucket.min)
        };
        out.push(first.1);
        if second.0 != first.0 {
            out.push(second.1);
        }
    }

    let last_column = columns - 1;
    let mut out = Vec::with_capacity(2 * columns);
    let mut current: Option<Bucket> = None;

    for (i, &point) in points.iter().enumerate() {
        let column = (((point.0 - x_lo) / x_span) * columns as f64)
            .floor()
            .clamp(0.0, last_column as f64) as usize;

        if let Some(bucket) = current.as_mut().filter(|b| b.column == column) {
            if point.1 < bucket.min.1.1 {
                bucket.min = (i, point);
            }
            if point.1 > bucket.max.1.1 {
                bucket.max = (i, point);
            }
            continue;
        }

        let next = Bucket {
            column,
            min: (i, point),
            max: (i, point),
        };
        if let Some(done) = current.replace(next) {
            flush(&done, &mut out);
        }
    }
    if let Some(bucket) = current {
        flush(&bucket, &mut out);
    }
    out
}

/// Builder for the timeline figure.
#[derive(Debug)]
pub struct Timeline<'a> {
    config: &'a TimelineConfig,
    origin: DateTime<Utc>,
    window_end: DateTime<Utc>,
    series: Vec<StationSeries>,
}

impl<'a> Timeline<'a> {
    /// Create an empty timeline covering `[origin, window_end]`.
    pub fn new(
        config: &'a TimelineConfig,
        origin: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            origin,
            window_end,
            series: Vec::new(),
        }
    }

    /// Add a station's trace. Returns `false` when the station was skipped.
    pub fn add(&mut self, station: &StationDescriptor, trace: &Trace) -> bool {
        match StationSeries::build(
            station,
            trace,
            self.origin,
            self.window_end,
            self.config.reference_amplitude,
        ) {
            Some(series) => {
                tracing::debug!(
                    station = %station.label,
                    bold = series.bold.len(),
                    dim = series.dim.len(),
                    "Added station to timeline"
                );
                self.series.push(series);
                true
            }
            None => {
                tracing::warn!(
                    station = %station.label,
                    trace = %trace.id(),
                    "No plottable samples, skipping station"
                );
                false
            }
        }
    }

    pub fn series(&self) -> &[StationSeries] {
        &self.series
    }

    /// Draw the figure onto `root`.
    ///
    /// The plot area leaves a 2% horizontal and 3% vertical margin. The
    /// legend sits in its upper-right corner when a system font is available.
    pub fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        if self.series.is_empty() {
            return Err(RenderError::NoData(
                "no station has samples in the timeline window".to_string(),
            ));
        }

        let (mut x_lo, mut x_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y_max: f64 = 0.0;
        for &(x, y) in self.series.iter().flat_map(|s| s.points()) {
            x_lo = x_lo.min(x);
            x_hi = x_hi.max(x);
            y_max = y_max.max(y.abs());
        }
        if x_hi <= x_lo {
            x_lo -= 1.0;
            x_hi += 1.0;
        }
        let x_span = x_hi - x_lo;
        let y_half = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

        root.fill(&WHITE).map_err(draw_err)?;

        let (width, height) = root.dim_in_pixel();
        let margin_x = (width as f64 * 0.02).round() as i32;
        let margin_y = (height as f64 * 0.03).round() as i32;
        let mut chart = ChartBuilder::on(root)
            .margin_left(margin_x)
            .margin_right(margin_x)
            .margin_top(margin_y)
            .margin_bottom(margin_y)
            .build_cartesian_2d(x_lo..x_hi, -y_half..y_half)
            .map_err(draw_err)?;

        let dpi = self.config.dpi;
        let columns = (width as i32 - 2 * margin_x).max(1) as usize;
        let line_px = figure::points_to_px(self.config.line_width, dpi);
        let sample = figure::points_to_px(2.0 * LEGEND_FONT_PT, dpi) as i32;

        for series in &self.series {
            let color = figure::rgb(series.color);
            chart
                .draw_series(LineSeries::new(
                    decimate(&series.dim, x_lo, x_span, columns),
                    color.mix(self.config.dim_alpha).stroke_width(line_px),
                ))
                .map_err(draw_err)?;

            let legend_style = color.stroke_width(line_px + line_px / 2);
            chart
                .draw_series(LineSeries::new(
                    decimate(&series.bold, x_lo, x_span, columns),
                    color.stroke_width(line_px),
                ))
                .map_err(draw_err)?
                .label(series.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + sample, y)], legend_style)
                });
        }

        if figure::text_available() {
            let font_px = figure::points_to_px(LEGEND_FONT_PT, dpi) as f64;
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .legend_area_size(sample + sample / 4)
                .background_style(&WHITE)
                .border_style(&figure::rgb(LEGEND_EDGE))
                .label_font(FontDesc::new(
                    FontFamily::Name(figure::FONT_FAMILY),
                    font_px,
                    FontStyle::Normal,
                ))
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// Render the figure to the configured output path.
    ///
    /// With `write_svg`, the figure is also drawn to an `.svg` file next to
    /// the PNG.
    pub fn render(&self) -> Result<PathBuf> {
        let output = &self.config.output;
        let size = figure::pixel_size(self.config.width_in, self.config.height_in, self.config.dpi);
        figure::prepare_output(output)?;

        self.draw(&BitMapBackend::new(output, size).into_drawing_area())?;
        if self.config.write_svg {
            let svg_path = output.with_extension("svg");
            self.draw(&SVGBackend::new(&svg_path, size).into_drawing_area())?;
            tracing::debug!(path = %svg_path.display(), "Wrote SVG copy");
        }

        tracing::info!(
            path = %output.display(),
            width = size.0,
            height = size.1,
            stations = self.series.len(),
            "Wrote waveform timeline"
        );
        Ok(output.clone())
    }
}
