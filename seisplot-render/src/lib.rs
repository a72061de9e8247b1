//! seisplot rendering
//!
//! Figures are drawn with plotters onto a bitmap backend and written as PNG,
//! optionally with an SVG copy.
//!
//! - [`timeline`] - All stations on one time axis, highlighted per station
//! - [`map`] - Station markers and the great-circle path between two stations
//! - [`projection`] - Plate Carrée projection with a configurable center
//! - [`geo`] - Great circles, distances and bearings
//! - [`land`] - Land polygons from GeoJSON
//! - [`figure`] - Pixel sizes, colors, fonts and output paths
//!
//! # Example
//!
//! ```ignore
//! use seisplot_render::{Timeline, TimelineConfig};
//!
//! let config = TimelineConfig::default();
//! let mut timeline = Timeline::new(&config, event.origin, event.window_end());
//! timeline.add(&station, &trace);
//! timeline.render()?;
//! ```

pub mod error;
pub mod figure;
pub mod geo;
pub mod land;
pub mod map;
pub mod projection;
pub mod timeline;

pub use error::{RenderError, Result};
pub use geo::GeoPoint;
pub use map::{MapConfig, PathConfig, PathSummary, WorldMap};
pub use projection::{Extent, PlateCarree};
pub use timeline::{StationSeries, Timeline, TimelineConfig};
