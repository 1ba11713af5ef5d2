//! District boundary geometry.
//!
//! Boundaries are GeoJSON Polygon or MultiPolygon geometries, kept in their
//! wire shape (`{"type": ..., "coordinates": ...}`) so they serialize straight
//! into GeoJSON responses. Containment is an even-odd ray cast, which handles
//! holes without treating them specially.

use serde::{Deserialize, Serialize};

use super::address::GeoPoint;

/// A linear ring: `[longitude, latitude]` positions, first == last.
pub type Ring = Vec<[f64; 2]>;

/// A polygon or multipolygon boundary in GeoJSON coordinate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Boundary {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

/// Bounding box as (min_lon, min_lat, max_lon, max_lat).
pub type BoundingBox = (f64, f64, f64, f64);

impl Boundary {
    /// Parse a boundary from a GeoJSON geometry string.
    pub fn from_geojson(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Parse a boundary from a GeoJSON geometry value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serialize back to a GeoJSON geometry string.
    pub fn to_geojson(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }

    /// Whether the boundary geometrically contains the point.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        match self {
            Boundary::Polygon(rings) => polygon_contains(rings, point),
            Boundary::MultiPolygon(polygons) => {
                polygons.iter().any(|rings| polygon_contains(rings, point))
            }
        }
    }

    /// Axis-aligned bounding box over every ring.
    ///
    /// Used as a cheap SQL prefilter before the exact containment test.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for ring in self.rings() {
            for &[lon, lat] in ring {
                bbox.0 = bbox.0.min(lon);
                bbox.1 = bbox.1.min(lat);
                bbox.2 = bbox.2.max(lon);
                bbox.3 = bbox.3.max(lat);
            }
        }
        bbox
    }

    /// True if the geometry has at least one ring and every ring has at
    /// least four positions (a closed triangle).
    pub fn is_valid(&self) -> bool {
        let mut rings = self.rings().peekable();
        rings.peek().is_some() && self.rings().all(|r| r.len() >= 4)
    }

    fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            Boundary::Polygon(rings) => Box::new(rings.iter()),
            Boundary::MultiPolygon(polygons) => Box::new(polygons.iter().flatten()),
        }
    }
}

/// Even-odd ray cast over every ring of one polygon.
///
/// Crossing an outer ring toggles inside; crossing a hole toggles back out.
fn polygon_contains(rings: &[Ring], point: &GeoPoint) -> bool {
    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;

    for ring in rings {
        let n = ring.len();
        if n < 2 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let [xi, yi] = ring[i];
            let [xj, yj] = ring[j];
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
    }

    inside
}
