//! Station map with the great-circle path between two stations.

use std::path::PathBuf;

use seisplot_common::{Color, Error, StationDescriptor, StationTable};
use serde::{Deserialize, Serialize};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::Color as _;

use crate::error::{RenderError, Result};
use crate::figure::{self, draw_err};
use crate::geo::{self, GeoPoint};
use crate::land;
use crate::projection::{Extent, PlateCarree, wrap180};

const GRATICULE_COLOR: Color = Color::rgb(0xb0, 0xb0, 0xb0);
const GRATICULE_WIDTH_PT: f64 = 0.5;

/// Great-circle path settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Label of the station the path starts at.
    #[serde(default = "default_from")]
    pub from: String,

    /// Label of the station the path ends at.
    #[serde(default = "default_to")]
    pub to: String,

    /// Number of interpolated segments (default: 256).
    #[serde(default = "default_segments")]
    pub segments: usize,

    /// Line color (default: black).
    #[serde(default = "default_path_color")]
    pub color: Color,

    /// Line width in points (default: 1.5).
    #[serde(default = "default_path_width")]
    pub width: f64,
}

fn default_from() -> String {
    "Nagano, Japan".to_string()
}

fn default_to() -> String {
    "Pittsboro, NC".to_string()
}

fn default_segments() -> usize {
    256
}

fn default_path_color() -> Color {
    Color::BLACK
}

fn default_path_width() -> f64 {
    1.5
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
            segments: default_segments(),
            color: default_path_color(),
            width: default_path_width(),
        }
    }
}

/// Map figure settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Output PNG path (default: "images/map.png").
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Figure width in inches (default: 12).
    #[serde(default = "default_width")]
    pub width_in: f64,

    /// Figure height in inches (default: 7).
    #[serde(default = "default_height")]
    pub height_in: f64,

    /// Output resolution (default: 300).
    #[serde(default = "default_dpi")]
    pub dpi: f64,

    /// Meridian at the center of the projection (default: 180).
    #[serde(default = "default_central_longitude")]
    pub central_longitude: f64,

    /// `[lon_min, lon_max, lat_min, lat_max]` (default: [105, 315, -35, 85]).
    #[serde(default)]
    pub extent: Extent,

    /// GeoJSON file with land polygons; a graticule is drawn without it.
    #[serde(default)]
    pub land_geojson: Option<PathBuf>,

    /// Land fill color (default: lightgray).
    #[serde(default = "default_land_color")]
    pub land_color: Color,

    /// Station marker diameter in points (default: 10).
    #[serde(default = "default_marker_size")]
    pub marker_size: f64,

    /// Graticule spacing in degrees (default: 30).
    #[serde(default = "default_graticule_step")]
    pub graticule_step: f64,

    #[serde(default)]
    pub path: PathConfig,

    /// Also write the SVG scene next to the PNG.
    #[serde(default)]
    pub write_svg: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("images/map.png")
}

fn default_width() -> f64 {
    12.0
}

fn default_height() -> f64 {
    7.0
}

fn default_dpi() -> f64 {
    300.0
}

fn default_central_longitude() -> f64 {
    180.0
}

fn default_land_color() -> Color {
    Color::rgb(0xd3, 0xd3, 0xd3)
}

fn default_marker_size() -> f64 {
    10.0
}

fn default_graticule_step() -> f64 {
    30.0
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            width_in: default_width(),
            height_in: default_height(),
            dpi: default_dpi(),
            central_longitude: default_central_longitude(),
            extent: Extent::default(),
            land_geojson: None,
            land_color: default_land_color(),
            marker_size: default_marker_size(),
            graticule_step: default_graticule_step(),
            path: PathConfig::default(),
            write_svg: false,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> seisplot_common::Result<()> {
        if !(self.width_in > 0.0 && self.height_in > 0.0) {
            return Err(Error::validation("map width_in and height_in must be > 0"));
        }
        if !(self.dpi > 0.0) {
            return Err(Error::validation("map.dpi must be > 0"));
        }
        self.extent.validate()?;
        if !(-180.0..=360.0).contains(&self.central_longitude) {
            return Err(Error::validation(format!(
                "map.central_longitude {} is out of range",
                self.central_longitude
            )));
        }
        if !(self.marker_size > 0.0) {
            return Err(Error::validation("map.marker_size must be > 0"));
        }
        if !(self.graticule_step > 0.0) {
            return Err(Error::validation("map.graticule_step must be > 0"));
        }
        if self.path.segments == 0 {
            return Err(Error::validation("map.path.segments must be > 0"));
        }
        if !(self.path.width > 0.0) {
            return Err(Error::validation("map.path.width must be > 0"));
        }
        Ok(())
    }
}

/// Geometry of the great-circle path between two stations.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSummary {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub distance_deg: f64,
    pub bearing_deg: f64,
    pub points: Vec<GeoPoint>,
}

/// Builder for the station map.
#[derive(Debug)]
pub struct WorldMap<'a> {
    config: &'a MapConfig,
    land: Vec<land::Polygon>,
}

impl<'a> WorldMap<'a> {
    pub fn new(config: &'a MapConfig) -> Self {
        Self {
            config,
            land: Vec::new(),
        }
    }

    pub fn with_land(mut self, land: Vec<land::Polygon>) -> Self {
        self.land = land;
        self
    }

    /// Load the configured land file, if any.
    pub fn load_land(self) -> Result<Self> {
        let config = self.config;
        match &config.land_geojson {
            Some(path) => {
                let land = land::load_land(path)?;
                Ok(self.with_land(land))
            }
            None => {
                tracing::warn!("No land_geojson configured, drawing a graticule instead");
                Ok(self)
            }
        }
    }

    /// Compute the configured great-circle path.
    pub fn path(&self, stations: &StationTable) -> Result<PathSummary> {
        let from = lookup(stations, &self.config.path.from)?;
        let to = lookup(stations, &self.config.path.to)?;
        let (a, b) = (GeoPoint::new(from.lat, from.lng), GeoPoint::new(to.lat, to.lng));

        Ok(PathSummary {
            from: from.label.clone(),
            to: to.label.clone(),
            distance_km: geo::distance_km(a, b),
            distance_deg: geo::angular_distance(a, b),
            bearing_deg: geo::initial_bearing(a, b),
            points: geo::great_circle(a, b, self.config.path.segments),
        })
    }

    /// Draw the map onto `root` and return the path geometry.
    pub fn draw<DB>(
        &self,
        root: &DrawingArea<DB, Shift>,
        stations: &StationTable,
    ) -> Result<PathSummary>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        if stations.is_empty() {
            return Err(RenderError::NoData("no stations to place on the map".to_string()));
        }
        let summary = self.path(stations)?;

        let (width, height) = root.dim_in_pixel();
        let projection = PlateCarree::new(
            self.config.central_longitude,
            self.config.extent,
            width as f64,
            height as f64,
        )?;
        let dpi = self.config.dpi;

        root.fill(&WHITE).map_err(draw_err)?;
        if self.land.is_empty() {
            self.draw_graticule(root, &projection)?;
        } else {
            self.draw_land(root, &projection)?;
        }

        let line: Vec<(f64, f64)> = summary.points.iter().map(|p| (p.lon, p.lat)).collect();
        let line = projection.unwrap(&line);
        let path_style = figure::rgb(self.config.path.color)
            .stroke_width(figure::points_to_px(self.config.path.width, dpi));
        for shift in shifts(&projection, &line) {
            let points = line
                .iter()
                .map(|&(rel, lat)| pixel(projection.project_relative(rel + shift, lat)))
                .collect::<Vec<_>>();
            root.draw(&PathElement::new(points, path_style)).map_err(draw_err)?;
        }

        // Blank everything outside the extent.
        let (x, y, w, h) = projection.bounds();
        let (left, top) = pixel((x, y));
        let (right, bottom) = pixel((x + w, y + h));
        let (width, height) = (width as i32, height as i32);
        for corners in [
            [(0, 0), (width, top)],
            [(0, bottom), (width, height)],
            [(0, 0), (left, height)],
            [(right, 0), (width, height)],
        ] {
            let [(x0, y0), (x1, y1)] = corners;
            if x0 < x1 && y0 < y1 {
                root.draw(&Rectangle::new(corners, WHITE.filled())).map_err(draw_err)?;
            }
        }

        let radius = figure::points_to_px(self.config.marker_size / 2.0, dpi) as i32;
        for station in stations {
            let center = pixel(projection.project(station.lng, station.lat));
            root.draw(&Circle::new(center, radius, figure::rgb(station.color).filled()))
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(summary)
    }

    /// Fill land polygons; holes are filled with the background.
    fn draw_land<DB>(&self, root: &DrawingArea<DB, Shift>, projection: &PlateCarree) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let land = figure::rgb(self.config.land_color).filled();
        for polygon in &self.land {
            let Some(exterior) = polygon.rings.first().filter(|r| !r.is_empty()) else {
                continue;
            };
            let outer = projection.unwrap(exterior);
            let anchor = (exterior[0].0, outer[0].0);

            // Holes share the exterior's unwrapping so they stay inside it.
            let holes: Vec<Vec<(f64, f64)>> = polygon.rings[1..]
                .iter()
                .filter(|r| !r.is_empty())
                .map(|ring| {
                    let start = anchor.1 + wrap180(ring[0].0 - anchor.0);
                    projection.unwrap_from(ring, start)
                })
                .collect();

            for shift in shifts(projection, &outer) {
                let project = |ring: &[(f64, f64)]| {
                    ring.iter()
                        .map(|&(rel, lat)| pixel(projection.project_relative(rel + shift, lat)))
                        .collect::<Vec<_>>()
                };
                root.draw(&Polygon::new(project(&outer[..]), land)).map_err(draw_err)?;
                for hole in &holes {
                    root.draw(&Polygon::new(project(&hole[..]), WHITE.filled())).map_err(draw_err)?;
                }
            }
        }
        Ok(())
    }

    fn draw_graticule<DB>(
        &self,
        root: &DrawingArea<DB, Shift>,
        projection: &PlateCarree,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let step = self.config.graticule_step;
        let style = figure::rgb(GRATICULE_COLOR)
            .stroke_width(figure::points_to_px(GRATICULE_WIDTH_PT, self.config.dpi));
        let mut lines = Vec::new();

        let mut lat = (-90.0 / step).ceil() * step;
        while lat <= 90.0 {
            lines.push([
                projection.project_relative(-180.0 - 360.0, lat),
                projection.project_relative(180.0 + 360.0, lat),
            ]);
            lat += step;
        }

        let mut lon = 0.0;
        while lon < 360.0 {
            lines.push([projection.project(lon, 90.0), projection.project(lon, -90.0)]);
            lon += step;
        }

        for [from, to] in lines {
            root.draw(&PathElement::new(vec![pixel(from), pixel(to)], style)).map_err(draw_err)?;
        }
        Ok(())
    }

    /// Render the map to the configured output path.
    ///
    /// With `write_svg`, the map is also drawn to an `.svg` file next to the
    /// PNG.
    pub fn render(&self, stations: &StationTable) -> Result<PathSummary> {
        let output = &self.config.output;
        let size = figure::pixel_size(self.config.width_in, self.config.height_in, self.config.dpi);
        figure::prepare_output(output)?;

        let summary = self.draw(&BitMapBackend::new(output, size).into_drawing_area(), stations)?;
        if self.config.write_svg {
            let svg_path = output.with_extension("svg");
            self.draw(&SVGBackend::new(&svg_path, size).into_drawing_area(), stations)?;
            tracing::debug!(path = %svg_path.display(), "Wrote SVG copy");
        }

        tracing::info!(
            path = %output.display(),
            from = %summary.from,
            to = %summary.to,
            distance_km = %format!("{:.0}", summary.distance_km),
            distance_deg = %format!("{:.2}", summary.distance_deg),
            bearing_deg = %format!("{:.1}", summary.bearing_deg),
            "Wrote station map"
        );
        Ok(summary)
    }
}

fn pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn lookup<'t>(stations: &'t StationTable, label: &str) -> Result<&'t StationDescriptor> {
    stations
        .get(label)
        .ok_or_else(|| RenderError::UnknownStation(label.to_string()))
}

/// Copies of an unwrapped line that overlap the projection extent.
fn shifts(projection: &PlateCarree, line: &[(f64, f64)]) -> Vec<f64> {
    let (lo, hi) = line
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(rel, _)| {
            (lo.min(rel), hi.max(rel))
        });
    if lo > hi {
        return Vec::new();
    }
    projection.copies(lo, hi)
}
