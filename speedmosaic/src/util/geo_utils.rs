use geo::{Closest, ClosestPoint, Coord, Distance, Haversine, Length, LineString, Point};
use rstar::AABB;

/// mean earth radius of the sphere used by [Haversine].
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// meters per degree of arc on that sphere, used to turn a metric radius into a
/// degree envelope for rtree queries.
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// widens envelopes past the radius. a great circle between two points of equal
/// latitude bows poleward, so a parallel of `r` meters spans slightly less than `r`.
const ENVELOPE_PADDING: f64 = 1.01;

/// great-circle distance in meters between two WGS84 coordinates.
pub fn haversine_meters(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// great-circle length in meters of a WGS84 linestring.
pub fn linestring_meters(linestring: &LineString<f64>) -> f64 {
    Haversine.length(linestring)
}

/// finds the point on a linestring nearest to the query coordinate along with
/// the great-circle distance to it. the projection is planar in degrees, which
/// is adequate at the snapping distances used in this crate.
///
/// # Returns
///
/// None if the linestring is empty or the projection is indeterminate.
pub fn closest_point_meters(
    linestring: &LineString<f64>,
    coord: Coord<f64>,
) -> Option<(Coord<f64>, f64)> {
    let query = Point::from(coord);
    let closest = match linestring.closest_point(&query) {
        Closest::Intersection(p) => p,
        Closest::SinglePoint(p) => p,
        Closest::Indeterminate => return None,
    };
    let distance = Haversine.distance(closest, query);
    Some((closest.0, distance))
}

/// builds an rtree envelope around a coordinate that contains every point within
/// `radius_meters`. longitudinal degrees are widened by the latitude so that the
/// envelope never undershoots the radius.
pub fn envelope_around(coord: Coord<f64>, radius_meters: f64) -> AABB<[f64; 2]> {
    let padded = radius_meters.max(0.0) * ENVELOPE_PADDING;
    let dy = padded / METERS_PER_DEGREE;
    // widest parallel inside the envelope sets the longitude span
    let max_lat = (coord.y.abs() + dy).min(90.0);
    let cos_lat = max_lat.to_radians().cos().max(1e-6);
    let dx = padded / (METERS_PER_DEGREE * cos_lat);
    AABB::from_corners(
        [coord.x - dx, coord.y - dy],
        [coord.x + dx, coord.y + dy],
    )
}

/// removes consecutive duplicate coordinates, keeping the first of each run.
pub fn dedup_coords(coords: &mut Vec<Coord<f64>>) {
    coords.dedup_by(|a, b| a == b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, line_string};

    #[test]
    fn test_one_degree_at_equator() {
        let d = haversine_meters(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 });
        // mean earth radius 6371008.8 m -> 111195 m per degree
        assert!((d - 111_195.0).abs() < 10.0, "unexpected distance {d}");
    }

    #[test]
    fn test_closest_point_on_segment_interior() {
        let ls = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let (p, d) = closest_point_meters(&ls, coord! { x: 0.5, y: 0.001 })
            .expect("test invariant failed: closest point is indeterminate");
        assert!((p.x - 0.5).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert!(d > 100.0 && d < 120.0, "unexpected distance {d}");
    }

    #[test]
    fn test_envelope_contains_radius() {
        for (center, radius) in [
            (coord! { x: 139.7, y: 35.6 }, 100.0),
            (coord! { x: 0.0, y: 0.0 }, 30.0),
            (coord! { x: 10.0, y: 60.0 }, 500.0),
            (coord! { x: -70.0, y: -45.0 }, 5_000.0),
        ] {
            let env = envelope_around(center, radius);
            let east = coord! { x: env.upper()[0], y: center.y };
            let west = coord! { x: env.lower()[0], y: center.y };
            let north = coord! { x: center.x, y: env.upper()[1] };
            let south = coord! { x: center.x, y: env.lower()[1] };
            for edge in [east, west, north, south] {
                let d = haversine_meters(center, edge);
                assert!(d >= radius, "edge {edge:?} at {d} m for radius {radius}");
            }
        }
    }

    #[test]
    fn test_meters_per_degree_matches_haversine() {
        let d = haversine_meters(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 1.0 });
        assert!((d - METERS_PER_DEGREE).abs() < 1e-3, "{d} vs {METERS_PER_DEGREE}");
    }
}
