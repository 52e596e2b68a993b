//! Planar (degree-space) measurements.
//!
//! Distances are plain Euclidean differences in degrees, not geodesic.

use serde::Serialize;

/// Euclidean distance between two `(lat, lon)` points in degrees
pub fn planar_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dlat = b.0 - a.0;
    let dlon = b.1 - a.1;
    (dlat * dlat + dlon * dlon).sqrt()
}

/// Latitude/longitude bounds of a point set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateExtent {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl CoordinateExtent {
    /// Bounds of `(lat, lon)` points, `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lat, lon) = iter.next()?;
        let mut extent = Self { lat_min: lat, lat_max: lat, lon_min: lon, lon_max: lon };
        for (lat, lon) in iter {
            extent.lat_min = extent.lat_min.min(lat);
            extent.lat_max = extent.lat_max.max(lat);
            extent.lon_min = extent.lon_min.min(lon);
            extent.lon_max = extent.lon_max.max(lon);
        }
        Some(extent)
    }

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Diagonal of the bounds in degrees
    pub fn diagonal(&self) -> f64 {
        self.lat_span().hypot(self.lon_span())
    }

    /// Area in square degrees; `None` when the points are collinear on an axis
    pub fn area(&self) -> Option<f64> {
        let area = self.lat_span() * self.lon_span();
        if area > 0.0 {
            Some(area)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance() {
        assert_eq!(planar_distance((0.0, 0.0), (3.0, 4.0)), 5.0);
        assert_eq!(planar_distance((1.0, 1.0), (1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_extent() {
        let extent =
            CoordinateExtent::from_points(vec![(10.0, -20.0), (13.0, -16.0), (11.0, -18.0)])
                .unwrap();
        assert_eq!(extent.lat_span(), 3.0);
        assert_eq!(extent.lon_span(), 4.0);
        assert_eq!(extent.diagonal(), 5.0);
        assert_eq!(extent.area(), Some(12.0));
    }

    #[test]
    fn test_degenerate_area() {
        let extent = CoordinateExtent::from_points(vec![(10.0, 0.0), (12.0, 0.0)]).unwrap();
        assert_eq!(extent.area(), None);
        assert!(CoordinateExtent::from_points(Vec::new()).is_none());
    }
}
