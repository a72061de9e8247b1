//! Shared plumbing for figures drawn with plotters.
//!
//! Sizes in the configuration are in inches and points; backends work in
//! pixels, so everything is converted with the figure's dpi.

use std::path::Path;
use std::sync::OnceLock;

use plotters::drawing::DrawingAreaErrorKind;
use plotters::style::{FontStyle, RGBColor, register_font};
use seisplot_common::Color;

use crate::error::{RenderError, Result};

/// Family name all figure text is drawn with.
pub const FONT_FAMILY: &str = "sans-serif";

static TEXT: OnceLock<bool> = OnceLock::new();

/// Figure size in pixels.
pub fn pixel_size(width_in: f64, height_in: f64, dpi: f64) -> (u32, u32) {
    let px = |inches: f64| (inches * dpi).round().max(1.0) as u32;
    (px(width_in), px(height_in))
}

/// A length in points as a whole number of pixels, at least one.
pub fn points_to_px(points: f64, dpi: f64) -> u32 {
    (points * dpi / 72.0).round().max(1.0) as u32
}

pub fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

pub(crate) fn draw_err<E>(err: DrawingAreaErrorKind<E>) -> RenderError
where
    E: std::error::Error + Send + Sync,
{
    RenderError::Draw(err.to_string())
}

/// Create the parent directory of an output file.
pub fn prepare_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Whether figure text can be drawn.
///
/// The first call registers a system sans-serif face under [`FONT_FAMILY`].
/// Without any usable font the figures are drawn without text.
pub fn text_available() -> bool {
    *TEXT.get_or_init(|| {
        let Some(face) = system_face() else {
            tracing::warn!("No system font found, figures are drawn without text");
            return false;
        };
        // plotters keeps registered faces for the life of the process.
        let face: &'static [u8] = Box::leak(face.into_boxed_slice());
        if register_font(FONT_FAMILY, FontStyle::Normal, face).is_err() {
            tracing::warn!("System font could not be parsed, figures are drawn without text");
            return false;
        }
        true
    })
}

fn system_face() -> Option<Vec<u8>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        ..fontdb::Query::default()
    };
    let id = db.query(&query).or_else(|| {
        db.faces()
            .find(|face| face.index == 0 && face.style == fontdb::Style::Normal)
            .map(|face| face.id)
    })?;

    tracing::debug!(
        family = ?db.face(id).and_then(|face| face.families.first()).map(|f| &f.0),
        "Using system font"
    );
    db.with_face_data(id, |data, _| data.to_vec())
}
