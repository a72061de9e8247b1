//! Spherical geometry: great circles, distances and bearings.

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A point on the sphere in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn to_vector(self) -> [f64; 3] {
        let (lat, lon) = (self.lat.to_radians(), self.lon.to_radians());
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }

    fn from_vector(v: [f64; 3]) -> Self {
        let lat = v[2].atan2((v[0] * v[0] + v[1] * v[1]).sqrt());
        let lon = v[1].atan2(v[0]);
        Self::new(lat.to_degrees(), lon.to_degrees())
    }
}

/// Central angle between two points, in degrees.
pub fn angular_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Great-circle distance in kilometres.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    angular_distance(a, b).to_radians() * EARTH_RADIUS_KM
}

/// Initial bearing from `a` towards `b`, clockwise from north in `[0, 360)`.
pub fn initial_bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlon = (b.lon - a.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Densify the great circle from `a` to `b` into `segments + 1` points.
///
/// Uses spherical linear interpolation. Coincident or antipodal endpoints
/// have no unique great circle, so only the endpoints are returned.
pub fn great_circle(a: GeoPoint, b: GeoPoint, segments: usize) -> Vec<GeoPoint> {
    let (p, q) = (a.to_vector(), b.to_vector());
    let dot = p[0] * q[0] + p[1] * q[1] + p[2] * q[2];
    let cross = [
        p[1] * q[2] - p[2] * q[1],
        p[2] * q[0] - p[0] * q[2],
        p[0] * q[1] - p[1] * q[0],
    ];
    let sin_omega = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    let omega = sin_omega.atan2(dot);

    if segments == 0 || sin_omega.abs() < 1e-12 {
        return vec![a, b];
    }

    (0..=segments)
        .map(|i| {
            if i == 0 {
                return a;
            }
            if i == segments {
                return b;
            }
            let f = i as f64 / segments as f64;
            let wa = ((1.0 - f) * omega).sin() / sin_omega;
            let wb = (f * omega).sin() / sin_omega;
            GeoPoint::from_vector([
                wa * p[0] + wb * q[0],
                wa * p[1] + wb * q[1],
                wa * p[2] + wb * q[2],
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAGANO: GeoPoint = GeoPoint {
        lat: 36.546,
        lon: 138.204,
    };
    const PITTSBORO: GeoPoint = GeoPoint {
        lat: 35.79,
        lon: -79.11,
    };

    #[test]
    fn test_quarter_circle_distance() {
        let d = angular_distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 90.0));
        assert!((d - 90.0).abs() < 1e-9);
        let km = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(90.0, 0.0));
        assert!((km - EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((initial_bearing(origin, GeoPoint::new(10.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((initial_bearing(origin, GeoPoint::new(0.0, 10.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing(origin, GeoPoint::new(-10.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing(origin, GeoPoint::new(0.0, -10.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_great_circle_endpoints_and_arc() {
        let path = great_circle(NAGANO, PITTSBORO, 256);
        assert_eq!(path.len(), 257);
        assert_eq!(path[0], NAGANO);
        assert_eq!(path[256], PITTSBORO);

        // The geodesic from central Japan to North Carolina runs over the Arctic.
        let northmost = path.iter().map(|p| p.lat).fold(f64::MIN, f64::max);
        assert!(northmost > 60.0, "northmost latitude {}", northmost);

        // Consecutive points are evenly spaced.
        let total = angular_distance(NAGANO, PITTSBORO);
        for pair in path.windows(2) {
            let step = angular_distance(pair[0], pair[1]);
            assert!((step - total / 256.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_nagano_to_pittsboro_distance() {
        let km = distance_km(NAGANO, PITTSBORO);
        assert!((10_500.0..11_500.0).contains(&km), "distance {} km", km);
        let bearing = initial_bearing(NAGANO, PITTSBORO);
        assert!((0.0..60.0).contains(&bearing), "bearing {}", bearing);
    }

    #[test]
    fn test_degenerate_great_circle() {
        let p = GeoPoint::new(10.0, 20.0);
        assert_eq!(great_circle(p, p, 16), vec![p, p]);
        let antipode = GeoPoint::new(-10.0, -160.0);
        assert_eq!(great_circle(p, antipode, 16).len(), 2);
    }
}
