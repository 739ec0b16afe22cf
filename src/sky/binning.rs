use std::collections::BTreeMap;

use super::horizontal::HorizontalPosition;
use crate::angles::wrap_to_360;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AzAltBin {
    pub azimuth: usize,
    pub altitude: usize,
}

/// Fixed grid over the visible hemisphere, azimuth [0, 360) by altitude [0, 90].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzAltBins {
    az_step_deg: f64,
    alt_step_deg: f64,
}

impl AzAltBins {
    pub fn new(az_step_deg: f64, alt_step_deg: f64) -> Option<Self> {
        let valid = |step: f64, span: f64| step.is_finite() && step > 0.0 && step <= span;
        (valid(az_step_deg, 360.0) && valid(alt_step_deg, 90.0)).then_some(Self {
            az_step_deg,
            alt_step_deg,
        })
    }

    pub fn azimuth_bins(&self) -> usize {
        (360.0 / self.az_step_deg).ceil() as usize
    }

    pub fn altitude_bins(&self) -> usize {
        (90.0 / self.alt_step_deg).ceil() as usize
    }

    /// Cell holding `position`; below-horizon or non-finite positions have none.
    pub fn bin_of(&self, position: &HorizontalPosition) -> Option<AzAltBin> {
        let alt = position.altitude_deg;
        if !alt.is_finite() || !position.azimuth_deg.is_finite() || !(0.0..=90.0).contains(&alt) {
            return None;
        }
        let az = wrap_to_360(position.azimuth_deg);
        let azimuth = ((az / self.az_step_deg).floor() as usize).min(self.azimuth_bins() - 1);
        let altitude = ((alt / self.alt_step_deg).floor() as usize).min(self.altitude_bins() - 1);
        Some(AzAltBin { azimuth, altitude })
    }

    /// Number of positions per occupied cell.
    pub fn histogram<'a, I>(&self, positions: I) -> BTreeMap<AzAltBin, usize>
    where
        I: IntoIterator<Item = &'a HorizontalPosition>,
    {
        let mut counts = BTreeMap::new();
        for bin in positions.into_iter().filter_map(|p| self.bin_of(p)) {
            *counts.entry(bin).or_insert(0) += 1;
        }
        counts
    }
}
