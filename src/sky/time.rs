use chrono::{DateTime, Utc};

use crate::angles::wrap_to_360;

pub const J2000: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub fn julian_date(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JD
}

/// Greenwich mean sidereal time in degrees, IAU 1982 polynomial.
pub fn greenwich_mean_sidereal_time(jd: f64) -> f64 {
    let days = jd - J2000;
    let t = days / 36_525.0;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * days + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    wrap_to_360(gmst)
}

/// Local sidereal time in degrees for an east-positive longitude.
pub fn local_sidereal_time(time: DateTime<Utc>, longitude_deg: f64) -> f64 {
    wrap_to_360(greenwich_mean_sidereal_time(julian_date(time)) + longitude_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn julian_date_of_j2000() {
        let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_abs_diff_eq!(julian_date(epoch), J2000, epsilon = 1e-9);
        let unix = Utc.timestamp_opt(0, 0).unwrap();
        assert_abs_diff_eq!(julian_date(unix), 2_440_587.5, epsilon = 1e-9);
    }

    #[test]
    fn gmst_matches_reference() {
        assert_abs_diff_eq!(greenwich_mean_sidereal_time(J2000), 280.46061837, epsilon = 1e-9);
        // 1987-04-10 19:21:00 UT, 8h34m57.0896s
        let time = Utc.with_ymd_and_hms(1987, 4, 10, 19, 21, 0).unwrap();
        let gmst = greenwich_mean_sidereal_time(julian_date(time));
        assert_abs_diff_eq!(gmst, 128.737_873_4, epsilon = 1e-5);
    }

    #[test]
    fn lst_adds_longitude() {
        let time = Utc.with_ymd_and_hms(1987, 4, 10, 19, 21, 0).unwrap();
        let lst = local_sidereal_time(time, -77.0);
        assert_abs_diff_eq!(lst, 51.737_873_4, epsilon = 1e-5);
        let wrapped = local_sidereal_time(time, 300.0);
        assert_abs_diff_eq!(wrapped, 68.737_873_4, epsilon = 1e-5);
    }
}
