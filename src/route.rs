//! Straight-line route sampling.
//!
//! Sample points are interpolated in lat/lon space, not along the geodesic.
//! At regional scale the difference is well below the grid resolution.

use geo::{Line, LineInterpolatePoint, Point};

use crate::error::AssessmentError;
use crate::grid::check_coordinate;

// geo's Haversine uses the IUGG mean radius (6371.0088 km); distances here
// are pinned to 6371 km so route lengths match published figures.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points (x = lon, y = lat), in km.
pub fn haversine_km(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lon = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Sample `start → end` every `step_km`, always including both endpoints.
///
/// Yields `floor(d / step_km) - 1` interior points (never fewer than zero).
pub fn segment(
    start: Point<f64>,
    end: Point<f64>,
    step_km: f64,
    max_route_km: f64,
) -> Result<Vec<Point<f64>>, AssessmentError> {
    for p in [start, end] {
        check_coordinate(p.y(), p.x()).map_err(|e| AssessmentError::InvalidRoute(e.to_string()))?;
    }
    if start == end {
        return Err(AssessmentError::InvalidRoute(
            "start and end coordinates are identical".into(),
        ));
    }

    let distance_km = haversine_km(start, end);
    if distance_km > max_route_km {
        return Err(AssessmentError::InvalidRoute(format!(
            "route length {distance_km:.1} km exceeds the {max_route_km} km limit"
        )));
    }

    let steps = (distance_km / step_km).floor() as usize;
    let interior = steps.saturating_sub(1);
    let line = Line::new(start, end);

    let mut points = Vec::with_capacity(interior + 2);
    points.push(start);
    for i in 1..=interior {
        let fraction = i as f64 * step_km / distance_km;
        let p = line.line_interpolate_point(fraction).ok_or_else(|| {
            AssessmentError::InvalidRoute(format!("cannot interpolate at fraction {fraction}"))
        })?;
        points.push(p);
    }
    points.push(end);

    Ok(points)
}
