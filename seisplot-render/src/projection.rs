//! Equirectangular (Plate Carrée) projection onto a figure.

use seisplot_common::Error;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Geographic extent `[lon_min, lon_max, lat_min, lat_max]` in degrees.
///
/// `lon_max` may exceed 180 so an extent can cross the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Extent {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Extent {
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn validate(&self) -> seisplot_common::Result<()> {
        if !(self.lon_min < self.lon_max) {
            return Err(Error::validation(format!(
                "extent longitude range {}..{} is empty",
                self.lon_min, self.lon_max
            )));
        }
        if self.lon_span() > 360.0 {
            return Err(Error::validation(format!(
                "extent spans {} degrees of longitude",
                self.lon_span()
            )));
        }
        if !(self.lat_min < self.lat_max) || self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err(Error::validation(format!(
                "extent latitude range {}..{} is invalid",
                self.lat_min, self.lat_max
            )));
        }
        Ok(())
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::from([105.0, 315.0, -35.0, 85.0])
    }
}

impl From<[f64; 4]> for Extent {
    fn from(v: [f64; 4]) -> Self {
        Self {
            lon_min: v[0],
            lon_max: v[1],
            lat_min: v[2],
            lat_max: v[3],
        }
    }
}

impl From<Extent> for [f64; 4] {
    fn from(e: Extent) -> Self {
        [e.lon_min, e.lon_max, e.lat_min, e.lat_max]
    }
}

/// Normalize a longitude difference into `[-180, 180)`.
pub fn wrap180(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Plate Carrée mapping from geographic degrees to figure points.
///
/// The extent keeps equal degree scaling on both axes and is centered in
/// the target area.
#[derive(Debug, Clone, Copy)]
pub struct PlateCarree {
    central_longitude: f64,
    extent: Extent,
    /// Projected x of `extent.lon_min`, relative to the central longitude.
    x_min: f64,
    scale: f64,
    origin_x: f64,
    origin_y: f64,
}

impl PlateCarree {
    /// Fit `extent` into a `width` x `height` area.
    pub fn new(central_longitude: f64, extent: Extent, width: f64, height: f64) -> Result<Self> {
        extent.validate()?;
        let scale = (width / extent.lon_span()).min(height / extent.lat_span());
        let origin_x = (width - extent.lon_span() * scale) / 2.0;
        let origin_y = (height - extent.lat_span() * scale) / 2.0;

        Ok(Self {
            central_longitude,
            extent,
            x_min: wrap180(extent.lon_min - central_longitude),
            scale,
            origin_x,
            origin_y,
        })
    }

    /// Points per degree.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The drawable map area `(x, y, width, height)` in figure points.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.origin_x,
            self.origin_y,
            self.extent.lon_span() * self.scale,
            self.extent.lat_span() * self.scale,
        )
    }

    /// Longitude relative to the central meridian, in `[-180, 180)`.
    pub fn relative(&self, lon: f64) -> f64 {
        wrap180(lon - self.central_longitude)
    }

    /// Project a relative longitude (possibly outside ±180) and a latitude.
    pub fn project_relative(&self, rel_lon: f64, lat: f64) -> (f64, f64) {
        (
            self.origin_x + (rel_lon - self.x_min) * self.scale,
            self.origin_y + (self.extent.lat_max - lat) * self.scale,
        )
    }

    /// Project a geographic point.
    ///
    /// Relative longitudes left of the extent are shifted by 360° so the
    /// seam does not split an extent that crosses it.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let mut rel = self.relative(lon);
        if rel < self.x_min {
            rel += 360.0;
        }
        self.project_relative(rel, lat)
    }

    /// Relative longitudes of a line, continuous across the antimeridian.
    pub fn unwrap(&self, coords: &[(f64, f64)]) -> Vec<(f64, f64)> {
        match coords.first() {
            Some(&(lon, _)) => self.unwrap_from(coords, self.relative(lon)),
            None => Vec::new(),
        }
    }

    /// Like [`unwrap`](Self::unwrap), with the first point placed at relative
    /// longitude `start`.
    pub fn unwrap_from(&self, coords: &[(f64, f64)], start: f64) -> Vec<(f64, f64)> {
        let mut out = Vec::with_capacity(coords.len());
        let mut prev: Option<(f64, f64)> = None;
        for &(lon, lat) in coords {
            let rel = match prev {
                None => start,
                Some((prev_lon, prev_rel)) => prev_rel + wrap180(lon - prev_lon),
            };
            out.push((rel, lat));
            prev = Some((lon, rel));
        }
        out
    }

    /// Horizontal shifts (multiples of 360°) at which an unwrapped line with
    /// relative longitudes in `[lo, hi]` overlaps the extent.
    pub fn copies(&self, lo: f64, hi: f64) -> Vec<f64> {
        let x_max = self.x_min + self.extent.lon_span();
        [-360.0, 0.0, 360.0]
            .into_iter()
            .filter(|shift| hi + shift >= self.x_min && lo + shift <= x_max)
            .collect()
    }
}
