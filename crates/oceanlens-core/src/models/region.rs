use serde::{Deserialize, Serialize};

use crate::error::{OceanError, Result};

/// Named latitude/longitude bounds.
///
/// A box whose `west` edge is greater than its `east` edge wraps across the
/// antimeridian (e.g. the North Pacific, west = 120, east = -120).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self { name: None, north, south, east, west }
    }

    pub fn named(name: impl Into<String>, north: f64, south: f64, east: f64, west: f64) -> Self {
        Self { name: Some(name.into()), north, south, east, west }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Closed ring `[lon, lat]`, counter-clockwise from the south-west corner
    pub fn to_ring(&self) -> Vec<[f64; 2]> {
        vec![
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
        ]
    }

    /// Inclusive containment test, antimeridian aware
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }

    fn validate(&self) -> Result<()> {
        let values = [self.north, self.south, self.east, self.west];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid("bounding box has non-finite bounds"));
        }
        if !(-90.0..=90.0).contains(&self.north) || !(-90.0..=90.0).contains(&self.south) {
            return Err(invalid(format!(
                "latitude bounds {}..{} outside [-90, 90]",
                self.south, self.north
            )));
        }
        if !(-180.0..=180.0).contains(&self.east) || !(-180.0..=180.0).contains(&self.west) {
            return Err(invalid(format!(
                "longitude bounds {}..{} outside [-180, 180]",
                self.west, self.east
            )));
        }
        if self.south > self.north {
            return Err(invalid(format!(
                "south bound {} is north of north bound {}",
                self.south, self.north
            )));
        }
        Ok(())
    }
}

/// Query region: an explicit polygon or a named bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Region {
    /// Polygon vertices as `[lon, lat]` pairs
    Polygon { vertices: Vec<[f64; 2]> },

    /// Latitude/longitude bounds
    Bounds(BoundingBox),
}

impl Region {
    /// Create a validated polygon region
    pub fn polygon(vertices: Vec<[f64; 2]>) -> Result<Self> {
        let region = Region::Polygon { vertices };
        region.validate()?;
        Ok(region)
    }

    /// Create a validated bounding-box region
    pub fn bounds(bbox: BoundingBox) -> Result<Self> {
        bbox.validate()?;
        Ok(Region::Bounds(bbox))
    }

    /// The whole globe as a polygon
    pub fn global() -> Self {
        Region::Polygon {
            vertices: vec![
                [-180.0, -90.0],
                [180.0, -90.0],
                [180.0, 90.0],
                [-180.0, 90.0],
                [-180.0, -90.0],
            ],
        }
    }

    /// Parse a polygon given as a JSON array of `[lon, lat]` pairs
    pub fn from_json(content: &str) -> Result<Self> {
        let vertices: Vec<[f64; 2]> = serde_json::from_str(content)
            .map_err(|e| invalid(format!("polygon is not a list of [lon, lat] pairs: {}", e)))?;
        Self::polygon(vertices)
    }

    /// Parse a polygon from a GeoJSON geometry, feature or single-feature collection.
    ///
    /// Only the exterior ring is used.
    pub fn from_geojson(content: &str) -> Result<Self> {
        let geojson: geojson::GeoJson =
            content.parse().map_err(|e| invalid(format!("invalid GeoJSON: {}", e)))?;

        let geometry = match geojson {
            geojson::GeoJson::Geometry(geometry) => geometry,
            geojson::GeoJson::Feature(feature) => feature
                .geometry
                .ok_or_else(|| invalid("GeoJSON feature has no geometry"))?,
            geojson::GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .next()
                .and_then(|feature| feature.geometry)
                .ok_or_else(|| invalid("GeoJSON feature collection has no geometry"))?,
        };

        match geometry.value {
            geojson::Value::Polygon(rings) => {
                let exterior = rings
                    .into_iter()
                    .next()
                    .ok_or_else(|| invalid("GeoJSON polygon has no rings"))?;
                let vertices = exterior
                    .into_iter()
                    .map(|position| {
                        if position.len() < 2 {
                            Err(invalid("GeoJSON position has fewer than two coordinates"))
                        } else {
                            Ok([position[0], position[1]])
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::polygon(vertices)
            }
            other => Err(invalid(format!(
                "expected a Polygon geometry, found {}",
                geometry_kind(&other)
            ))),
        }
    }

    /// Region name, if it is a named box
    pub fn name(&self) -> Option<&str> {
        match self {
            Region::Bounds(bbox) => bbox.name.as_deref(),
            Region::Polygon { .. } => None,
        }
    }

    /// Vertices as `[lon, lat]` pairs (bounding boxes as their closed ring)
    pub fn vertices(&self) -> Vec<[f64; 2]> {
        match self {
            Region::Polygon { vertices } => vertices.clone(),
            Region::Bounds(bbox) => bbox.to_ring(),
        }
    }

    /// Planar longitude span of the vertices in degrees
    pub fn lon_span(&self) -> f64 {
        span(self.vertices().iter().map(|v| v[0]))
    }

    /// Planar latitude span of the vertices in degrees
    pub fn lat_span(&self) -> f64 {
        span(self.vertices().iter().map(|v| v[1]))
    }

    /// Check structural validity
    pub fn validate(&self) -> Result<()> {
        match self {
            Region::Bounds(bbox) => bbox.validate(),
            Region::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(invalid(format!(
                        "polygon needs at least 3 vertices, found {}",
                        vertices.len()
                    )));
                }
                for (idx, [lon, lat]) in vertices.iter().enumerate() {
                    if !lon.is_finite() || !lat.is_finite() {
                        return Err(invalid(format!("vertex {} is not finite", idx)));
                    }
                    if !(-180.0..=180.0).contains(lon) || !(-90.0..=90.0).contains(lat) {
                        return Err(invalid(format!(
                            "vertex {} ({}, {}) outside valid lon/lat range",
                            idx, lon, lat
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

fn span(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn invalid(reason: impl Into<String>) -> OceanError {
    OceanError::InvalidRegion { reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_global_spans() {
        let global = Region::global();
        assert_eq!(global.lon_span(), 360.0);
        assert_eq!(global.lat_span(), 180.0);
        assert!(global.validate().is_ok());
    }

    #[test]
    fn test_polygon_requires_three_vertices() {
        let err = Region::polygon(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRegion);
    }

    #[test]
    fn test_polygon_rejects_out_of_range() {
        let err = Region::polygon(vec![[0.0, 0.0], [200.0, 0.0], [0.0, 10.0]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRegion);
    }

    #[test]
    fn test_from_json() {
        let region = Region::from_json("[[-80, 20], [-10, 20], [-10, 70], [-80, 70]]").unwrap();
        assert_eq!(region.lon_span(), 70.0);
        assert_eq!(region.lat_span(), 50.0);

        assert!(Region::from_json("{\"not\": \"a polygon\"}").is_err());
    }

    #[test]
    fn test_from_geojson_polygon() {
        let content = r#"{
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
        }"#;
        let region = Region::from_geojson(content).unwrap();
        assert_eq!(region.vertices().len(), 5);
    }

    #[test]
    fn test_from_geojson_rejects_points() {
        let err = Region::from_geojson(r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRegion);
    }

    #[test]
    fn test_bounding_box_antimeridian() {
        let north_pacific = BoundingBox::named("North Pacific", 70.0, 20.0, -120.0, 120.0);
        assert!(north_pacific.crosses_antimeridian());
        assert!(north_pacific.contains(40.0, 170.0));
        assert!(north_pacific.contains(40.0, -150.0));
        assert!(!north_pacific.contains(40.0, 0.0));
        assert!(!north_pacific.contains(10.0, 170.0));
    }

    #[test]
    fn test_bounding_box_validation() {
        assert!(Region::bounds(BoundingBox::new(10.0, 20.0, 0.0, -10.0)).is_err());
        assert!(Region::bounds(BoundingBox::new(95.0, 20.0, 0.0, -10.0)).is_err());
        let region = Region::bounds(BoundingBox::named("Gulf Stream", 45.0, 25.0, -60.0, -80.0))
            .unwrap();
        assert_eq!(region.name(), Some("Gulf Stream"));
    }
}
