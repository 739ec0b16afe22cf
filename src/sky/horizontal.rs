use chrono::{DateTime, Utc};
use serde::Serialize;

use super::time::local_sidereal_time;
use crate::angles::wrap_to_360;

const DEGENERATE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalPosition {
    /// North = 0, east = 90.
    pub azimuth_deg: f64,
    pub altitude_deg: f64,
}

impl HorizontalPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.altitude_deg >= 0.0
    }
}

/// Azimuth/altitude of an equatorial position for an observer at `time`.
///
/// RA is in hours, everything else in degrees with longitude positive east.
/// Returns `None` when any input is not finite.
pub fn get_az_alt(
    ra_hours: f64,
    dec_deg: f64,
    lat_deg: f64,
    lon_deg: f64,
    time: DateTime<Utc>,
) -> Option<HorizontalPosition> {
    if ![ra_hours, dec_deg, lat_deg, lon_deg]
        .iter()
        .all(|v| v.is_finite())
    {
        return None;
    }
    let lst = local_sidereal_time(time, lon_deg);
    let hour_angle = lst - ra_hours * 15.0;
    Some(horizontal_from_hour_angle(hour_angle, dec_deg, lat_deg))
}

pub fn horizontal_from_hour_angle(
    hour_angle_deg: f64,
    dec_deg: f64,
    lat_deg: f64,
) -> HorizontalPosition {
    let ha = hour_angle_deg.to_radians();
    let dec = dec_deg.to_radians();
    let lat = lat_deg.to_radians();

    let sin_alt = (dec.sin() * lat.sin() + dec.cos() * lat.cos() * ha.cos()).clamp(-1.0, 1.0);
    let alt = sin_alt.asin();

    let denominator = alt.cos() * lat.cos();
    // Azimuth is undefined at the zenith and for an observer on a pole.
    let azimuth = if denominator.abs() < DEGENERATE {
        0.0
    } else {
        let cos_az = ((dec.sin() - sin_alt * lat.sin()) / denominator).clamp(-1.0, 1.0);
        let az = cos_az.acos().to_degrees();
        if ha.sin() > 0.0 {
            360.0 - az
        } else {
            az
        }
    };

    HorizontalPosition {
        azimuth_deg: wrap_to_360(azimuth),
        altitude_deg: alt.to_degrees(),
    }
}

/// Great-circle separation in degrees between two (longitude-like, latitude-like) points.
pub fn angular_separation(az1_deg: f64, alt1_deg: f64, az2_deg: f64, alt2_deg: f64) -> f64 {
    let alt1 = alt1_deg.to_radians();
    let alt2 = alt2_deg.to_radians();
    let delta = (az1_deg - az2_deg).to_radians();
    let cos_sep = alt1.sin() * alt2.sin() + alt1.cos() * alt2.cos() * delta.cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Separation between two equatorial positions, RA in hours.
pub fn equatorial_separation(ra1_hours: f64, dec1_deg: f64, ra2_hours: f64, dec2_deg: f64) -> f64 {
    angular_separation(ra1_hours * 15.0, dec1_deg, ra2_hours * 15.0, dec2_deg)
}
