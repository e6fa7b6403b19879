//! Inertial position to geodetic coordinates.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use crate::{
    error::{Error, Result},
    time::gmst,
};

/// Earth equatorial radius (km).
pub const EQUATORIAL_RADIUS_KM: f64 = 6378.137;
/// Earth flattening.
pub const FLATTENING: f64 = 3.35281066474748e-3;
/// Square of the first eccentricity.
const E2: f64 = FLATTENING * (2.0 - FLATTENING);

/// Latitude change (rad) below which the iteration has converged.
const TOLERANCE: f64 = 1e-10;
/// Upper bound on latitude iterations.
pub const MAX_ITERATIONS: usize = 50;

/// A position in geodetic coordinates.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GeodeticFix {
    /// Latitude in degrees.
    pub latitude_deg: f64,
    /// Longitude in degrees.
    pub longitude_deg: f64,
    /// Altitude above the ellipsoid in km.
    pub altitude_km: f64,
}

/// Converts an inertial position (km) at `time` to geodetic coordinates.
pub fn to_geodetic(position_km: &Vector3<f64>, time: &DateTime<Utc>) -> Result<GeodeticFix> {
    to_geodetic_with_gmst(position_km, gmst(time))
}

/// Converts an inertial position (km) to geodetic coordinates given the
/// Greenwich sidereal angle `gmst` (rad).
pub fn to_geodetic_with_gmst(position_km: &Vector3<f64>, gmst: f64) -> Result<GeodeticFix> {
    let (x, y, z) = (position_km.x, position_km.y, position_km.z);

    let theta = y.atan2(x);
    let mut lon = normalize_to_two_pi(theta - gmst);
    let r = x.hypot(y);
    let mut lat = z.atan2(r);

    let mut c;
    let mut iterations = 0;
    loop {
        if iterations == MAX_ITERATIONS {
            return Err(Error::ConvergenceError { iterations });
        }
        iterations += 1;

        let phi = lat;
        let sin_phi = phi.sin();
        c = 1.0 / (1.0 - E2 * sin_phi.powi(2)).sqrt();
        lat = (z + EQUATORIAL_RADIUS_KM * c * E2 * sin_phi).atan2(r);
        if (lat - phi).abs() < TOLERANCE {
            break;
        }
    }

    // r / cos(lat) degenerates on the polar axis
    let cos_lat = lat.cos();
    let alt = if cos_lat.abs() > 1e-9 {
        r / cos_lat - EQUATORIAL_RADIUS_KM * c
    } else {
        z / lat.sin() - EQUATORIAL_RADIUS_KM * c * (1.0 - E2)
    };

    if lat > FRAC_PI_2 {
        lat -= TAU;
    }
    if lon > PI {
        lon -= TAU;
    }

    Ok(GeodeticFix {
        latitude_deg: lat.to_degrees(),
        longitude_deg: lon.to_degrees(),
        altitude_km: alt,
    })
}

/// Reduces `x` into `[0, 2π)`.
pub fn normalize_to_two_pi(x: f64) -> f64 {
    let mut value = x - (x / TAU).trunc() * TAU;
    if value < 0.0 {
        value += TAU;
    }
    value
}

/// Converts a geodetic position to an Earth-fixed position (km).
pub fn geodetic_to_ecef(fix: &GeodeticFix) -> Vector3<f64> {
    let (sin_lat, cos_lat) = fix.latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = fix.longitude_deg.to_radians().sin_cos();
    let alt = fix.altitude_km;

    let n = EQUATORIAL_RADIUS_KM / (1.0 - E2 * sin_lat.powi(2)).sqrt();
    Vector3::new(
        (n + alt) * cos_lat * cos_lon,
        (n + alt) * cos_lat * sin_lon,
        (n * (1.0 - E2) + alt) * sin_lat,
    )
}

/// Rotates an Earth-fixed position into the inertial frame.
///
/// # Arguments
///
/// * `ecef` - A position in the Earth-fixed frame
/// * `gmst` - Greenwich Mean Sidereal Time in radians
pub fn ecef_to_eci(ecef: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let (sin_theta, cos_theta) = gmst.sin_cos();
    Vector3::new(
        cos_theta * ecef.x - sin_theta * ecef.y,
        sin_theta * ecef.x + cos_theta * ecef.y,
        ecef.z,
    )
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn round_trip(latitude_deg: f64, longitude_deg: f64, altitude_km: f64, gmst: f64) -> GeodeticFix {
        let truth = GeodeticFix {
            latitude_deg,
            longitude_deg,
            altitude_km,
        };
        let eci = ecef_to_eci(&geodetic_to_ecef(&truth), gmst);
        to_geodetic_with_gmst(&eci, gmst).unwrap()
    }

    #[test]
    fn recovers_known_positions() {
        for altitude in [200.0, 420.0, 2000.0, 20200.0, 35786.0, 40000.0] {
            for latitude in [-80.0, -51.6, -10.0, 0.0, 0.5, 28.5, 63.4, 80.0] {
                for (longitude, gmst) in [(-179.5, 0.3), (-45.0, 4.0), (0.0, 0.0), (120.0, 6.1)] {
                    let fix = round_trip(latitude, longitude, altitude, gmst);
                    let error = (fix.latitude_deg - latitude).to_radians().abs();
                    assert!(error < 1e-8, "lat {latitude} alt {altitude}: {error}");
                    assert_approx_eq!(f64, fix.longitude_deg, longitude, epsilon = 1e-8);
                    assert_approx_eq!(f64, fix.altitude_km, altitude, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn polar_axis() {
        let fix = to_geodetic_with_gmst(&Vector3::new(0.0, 0.0, 7000.0), 0.0).unwrap();
        assert_approx_eq!(f64, fix.latitude_deg, 90.0, epsilon = 1e-9);
        // Polar radius is 6356.752 km
        assert_approx_eq!(f64, fix.altitude_km, 7000.0 - 6356.752314, epsilon = 1e-5);
    }

    #[test]
    fn non_finite_position_does_not_converge() {
        let result = to_geodetic_with_gmst(&Vector3::new(f64::NAN, 1.0, 1.0), 0.0);
        assert_eq!(
            result,
            Err(Error::ConvergenceError {
                iterations: MAX_ITERATIONS
            })
        );
    }

    #[test]
    fn single_wrap_keeps_longitude_in_range() {
        // Sidereal angles far outside [0, 2π) still land in (-180, 180].
        for gmst in [-100.0, -TAU, -1.0, 0.0, PI, 7.5, 1000.0] {
            for step in 0..72 {
                let theta = (step as f64 * 5.0).to_radians() - PI;
                let position = Vector3::new(7000.0 * theta.cos(), 7000.0 * theta.sin(), 100.0);
                let fix = to_geodetic_with_gmst(&position, gmst).unwrap();
                assert!(
                    fix.longitude_deg > -180.0 && fix.longitude_deg <= 180.0,
                    "gmst {gmst} theta {theta}: {}",
                    fix.longitude_deg
                );
                assert!((-90.0..=90.0).contains(&fix.latitude_deg));
            }
        }
    }

    #[test]
    fn normalizes_into_two_pi() {
        assert_approx_eq!(f64, normalize_to_two_pi(0.0), 0.0);
        assert_approx_eq!(f64, normalize_to_two_pi(-0.5), TAU - 0.5, epsilon = 1e-12);
        assert_approx_eq!(f64, normalize_to_two_pi(7.0 * PI), PI, epsilon = 1e-12);
        assert_approx_eq!(f64, normalize_to_two_pi(-7.0 * PI), PI, epsilon = 1e-12);
        assert_approx_eq!(f64, normalize_to_two_pi(TAU + 0.25), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn uses_sidereal_time() {
        let time = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 3, 20, 12, 0, 0).unwrap();
        let position = Vector3::new(6778.0, 0.0, 0.0);
        let fix = to_geodetic(&position, &time).unwrap();
        let expected = to_geodetic_with_gmst(&position, gmst(&time)).unwrap();
        assert_eq!(fix, expected);
    }
}
