mod binning;
mod horizon;
mod horizontal;
mod site;
mod time;

pub use binning::{AzAltBin, AzAltBins};
pub use horizon::{
    invalid_declination_range, ra_at_altitude_zero, DeclinationBand, HorizonCrossing,
    InvalidDeclinations,
};
pub use horizontal::{
    angular_separation, equatorial_separation, get_az_alt, horizontal_from_hour_angle,
    HorizontalPosition,
};
pub use site::Site;
pub use time::{greenwich_mean_sidereal_time, julian_date, local_sidereal_time, J2000};
