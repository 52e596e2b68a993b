use geo::algorithm::intersects::Intersects;
use geo::{Coord, LineString, Point, Polygon};
use oceanlens_core::models::Region;

/// Build a `geo` polygon from `[lon, lat]` vertices
pub fn to_geo_polygon(vertices: &[[f64; 2]]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = vertices.iter().map(|v| Coord { x: v[0], y: v[1] }).collect();
    // LineString -> Polygon closes the ring if needed
    Polygon::new(LineString::new(coords), vec![])
}

/// Whether `(lat, lon)` lies inside the vertices, boundary included
pub fn polygon_contains(vertices: &[[f64; 2]], lat: f64, lon: f64) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    to_geo_polygon(vertices).intersects(&Point::new(lon, lat))
}

/// Whether a region contains a point.
///
/// Bounding boxes handle antimeridian wrap; polygons are evaluated in plain
/// lon/lat space.
pub fn region_contains(region: &Region, lat: f64, lon: f64) -> bool {
    match region {
        Region::Bounds(bbox) => bbox.contains(lat, lon),
        Region::Polygon { vertices } => polygon_contains(vertices, lat, lon),
    }
}
