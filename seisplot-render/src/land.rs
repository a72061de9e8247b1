//! Land polygons from GeoJSON.
//!
//! Accepts Polygon, MultiPolygon, GeometryCollection, Feature and
//! FeatureCollection objects, as found in Natural Earth exports. Other
//! geometry types are ignored.

use std::path::Path;

use serde_json::Value;

use crate::error::{RenderError, Result};

/// A closed ring of `(lon, lat)` pairs in degrees.
pub type Ring = Vec<(f64, f64)>;

/// A polygon: the exterior ring followed by its holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

/// Read and parse a GeoJSON file into polygons.
pub fn load_land(path: impl AsRef<Path>) -> Result<Vec<Polygon>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        RenderError::GeoJson(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let polygons = parse_land(&content)?;
    tracing::debug!(
        path = %path.display(),
        polygons = polygons.len(),
        "Loaded land polygons"
    );
    Ok(polygons)
}

/// Parse GeoJSON text into polygons.
pub fn parse_land(content: &str) -> Result<Vec<Polygon>> {
    let value: Value = serde_json::from_str(content)?;
    let mut polygons = Vec::new();
    collect(&value, &mut polygons)?;
    Ok(polygons)
}

fn collect(value: &Value, out: &mut Vec<Polygon>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| RenderError::GeoJson("object without a 'type' member".to_string()))?;

    match kind {
        "FeatureCollection" => {
            for feature in array_member(value, "features")? {
                collect(feature, out)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect(geometry, out)?,
        },
        "GeometryCollection" => {
            for geometry in array_member(value, "geometries")? {
                collect(geometry, out)?;
            }
        }
        "Polygon" => {
            out.push(polygon(coordinates(value)?)?);
        }
        "MultiPolygon" => {
            for poly in as_array(coordinates(value)?, "MultiPolygon coordinates")? {
                out.push(polygon(poly)?);
            }
        }
        _ => {}
    }
    Ok(())
}

fn array_member<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| RenderError::GeoJson(format!("missing '{}' array", key)))
}

fn coordinates(value: &Value) -> Result<&Value> {
    value
        .get("coordinates")
        .ok_or_else(|| RenderError::GeoJson("geometry without coordinates".to_string()))
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| RenderError::GeoJson(format!("{} must be an array", what)))
}

fn polygon(value: &Value) -> Result<Polygon> {
    let rings = as_array(value, "polygon")?
        .iter()
        .map(ring)
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon { rings })
}

fn ring(value: &Value) -> Result<Ring> {
    as_array(value, "ring")?
        .iter()
        .map(|position| {
            let pair = as_array(position, "position")?;
            match (
                pair.first().and_then(Value::as_f64),
                pair.get(1).and_then(Value::as_f64),
            ) {
                (Some(lon), Some(lat)) => Ok((lon, lat)),
                _ => Err(RenderError::GeoJson(format!("invalid position {}", position))),
            }
        })
        .collect()
}
