//! Web-Mercator projection onto the unit square.
//!
//! `x` grows eastward from 0 at -180° to 1 at 180°; `y` grows southward from
//! 0 at the northern Mercator limit to 1 at the southern one. Latitudes past
//! roughly ±85.05° clamp to the square's edges.

use std::f64::consts::PI;

/// Longitude (degrees) to unit-square x.
#[inline]
pub fn lng_to_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude (degrees) to unit-square y, clamped to `[0, 1]`.
#[inline]
pub fn lat_to_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Unit-square x back to longitude (degrees).
#[inline]
pub fn x_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Unit-square y back to latitude (degrees).
#[inline]
pub fn y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_center() {
        assert!((lng_to_x(0.0) - 0.5).abs() < 1e-12);
        assert!((lat_to_y(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_inverse() {
        for &(lat, lng) in &[(10.0, 20.0), (-45.5, 170.25), (60.0, -120.0), (0.0, 0.0)] {
            let back_lat = y_to_lat(lat_to_y(lat));
            let back_lng = x_to_lng(lng_to_x(lng));
            assert!((back_lat - lat).abs() < 1e-9, "{lat} -> {back_lat}");
            assert!((back_lng - lng).abs() < 1e-9, "{lng} -> {back_lng}");
        }
    }

    #[test]
    fn test_poles_clamp() {
        assert_eq!(lat_to_y(90.0), 0.0);
        assert_eq!(lat_to_y(-90.0), 1.0);
        assert!(lat_to_y(89.0) < 0.01);
    }

    #[test]
    fn test_north_is_up() {
        assert!(lat_to_y(50.0) < lat_to_y(10.0));
        assert!(lng_to_x(50.0) > lng_to_x(10.0));
    }
}
