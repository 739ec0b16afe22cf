use serde::Serialize;

use crate::angles::wrap_to_24;

/// Right ascensions (hours) that are on the horizon, rising and setting, at a
/// given local sidereal time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizonCrossing {
    pub rising_ra_hours: f64,
    pub setting_ra_hours: f64,
}

/// Solves `cos H0 = -tan(lat) tan(dec)` for the horizon hour angle.
///
/// `None` when the declination never crosses the horizon at this latitude
/// (circumpolar or never rising), for an observer on a pole, or for
/// non-finite input.
pub fn ra_at_altitude_zero(dec_deg: f64, lat_deg: f64, lst_hours: f64) -> Option<HorizonCrossing> {
    if !(dec_deg.is_finite() && lat_deg.is_finite() && lst_hours.is_finite()) {
        return None;
    }
    if lat_deg.abs() >= 90.0 {
        return None;
    }

    let cos_h0 = -lat_deg.to_radians().tan() * dec_deg.to_radians().tan();
    if !cos_h0.is_finite() || cos_h0.abs() > 1.0 {
        return None;
    }
    let h0_hours = cos_h0.acos().to_degrees() / 15.0;

    Some(HorizonCrossing {
        rising_ra_hours: wrap_to_24(lst_hours + h0_hours),
        setting_ra_hours: wrap_to_24(lst_hours - h0_hours),
    })
}

/// Declinations from just past `threshold_deg` up to and including `pole_deg`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeclinationBand {
    pub threshold_deg: f64,
    pub pole_deg: f64,
}

impl DeclinationBand {
    pub fn contains(&self, dec_deg: f64) -> bool {
        if self.pole_deg > self.threshold_deg {
            dec_deg > self.threshold_deg && dec_deg <= self.pole_deg
        } else {
            dec_deg < self.threshold_deg && dec_deg >= self.pole_deg
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InvalidDeclinations {
    pub always_above: Option<DeclinationBand>,
    pub always_below: Option<DeclinationBand>,
}

impl InvalidDeclinations {
    pub fn contains(&self, dec_deg: f64) -> bool {
        self.always_above.is_some_and(|b| b.contains(dec_deg))
            || self.always_below.is_some_and(|b| b.contains(dec_deg))
    }
}

/// Declination bands that never cross the horizon from `lat_deg`.
pub fn invalid_declination_range(lat_deg: f64) -> InvalidDeclinations {
    if !lat_deg.is_finite() || lat_deg == 0.0 {
        return InvalidDeclinations::default();
    }

    // On a pole every declination keeps a constant altitude.
    if lat_deg.abs() >= 90.0 {
        let sign = lat_deg.signum();
        return InvalidDeclinations {
            always_above: Some(DeclinationBand {
                threshold_deg: 0.0,
                pole_deg: 90.0 * sign,
            }),
            always_below: Some(DeclinationBand {
                threshold_deg: 0.0,
                pole_deg: -90.0 * sign,
            }),
        };
    }

    let colatitude = 90.0 - lat_deg.abs();
    let sign = lat_deg.signum();
    InvalidDeclinations {
        always_above: Some(DeclinationBand {
            threshold_deg: colatitude * sign,
            pole_deg: 90.0 * sign,
        }),
        always_below: Some(DeclinationBand {
            threshold_deg: -colatitude * sign,
            pole_deg: -90.0 * sign,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sky::horizontal::horizontal_from_hour_angle;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equator_object_rises_six_hours_before_transit() {
        let crossing = ra_at_altitude_zero(0.0, 40.0, 12.0).unwrap();
        assert_abs_diff_eq!(crossing.rising_ra_hours, 18.0, epsilon = 1e-9);
        assert_abs_diff_eq!(crossing.setting_ra_hours, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn crossing_ra_is_on_the_horizon() {
        let (dec, lat, lst) = (25.0, -33.9, 3.5);
        let crossing = ra_at_altitude_zero(dec, lat, lst).unwrap();
        for ra in [crossing.rising_ra_hours, crossing.setting_ra_hours] {
            let pos = horizontal_from_hour_angle((lst - ra) * 15.0, dec, lat);
            assert_abs_diff_eq!(pos.altitude_deg, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn no_crossing_inside_invalid_bands() {
        for lat in [-89.5, -51.0, -10.0, 10.0, 40.0, 66.0] {
            let bands = invalid_declination_range(lat);
            for dec in [-89.0, -60.0, -45.0, -20.0, 0.0, 20.0, 45.0, 60.0, 89.0] {
                let crossing = ra_at_altitude_zero(dec, lat, 0.0);
                assert_eq!(
                    crossing.is_none(),
                    bands.contains(dec),
                    "lat {} dec {}",
                    lat,
                    dec
                );
            }
        }
    }

    #[test]
    fn northern_bands() {
        let bands = invalid_declination_range(40.0);
        let above = bands.always_above.unwrap();
        let below = bands.always_below.unwrap();
        assert_eq!((above.threshold_deg, above.pole_deg), (50.0, 90.0));
        assert_eq!((below.threshold_deg, below.pole_deg), (-50.0, -90.0));
        assert!(above.contains(60.0) && !above.contains(50.0));
        assert!(below.contains(-90.0) && !below.contains(-40.0));
    }

    #[test]
    fn southern_bands_mirror() {
        let bands = invalid_declination_range(-30.0);
        assert!(bands.always_above.unwrap().contains(-70.0));
        assert!(bands.always_below.unwrap().contains(70.0));
        assert!(!bands.contains(0.0));
    }

    #[test]
    fn polar_and_equatorial_edges() {
        let pole = invalid_declination_range(90.0);
        assert!(pole.always_above.unwrap().contains(0.1));
        assert!(pole.always_below.unwrap().contains(-0.1));
        assert!(!pole.contains(0.0));
        assert!(ra_at_altitude_zero(0.0, 90.0, 1.0).is_none());
        assert!(ra_at_altitude_zero(10.0, -90.0, 1.0).is_none());

        assert_eq!(invalid_declination_range(0.0), InvalidDeclinations::default());
        assert_eq!(invalid_declination_range(f64::NAN), InvalidDeclinations::default());
    }
}
