use serde::{Deserialize, Serialize};

/// Observer location on the Earth's surface, longitude positive east.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Site {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl Site {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Option<Self> {
        let site = Self {
            latitude_deg,
            longitude_deg,
        };
        site.is_valid().then_some(site)
    }

    /// Parses `"lat, lon"` in decimal degrees.
    pub fn from_coordinates(coordinates: &str) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Self::new(lat, lon)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && (-90.0..=90.0).contains(&self.latitude_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinates() {
        let site = Site::from_coordinates(" -33.8598874, 151.2021771 ").unwrap();
        assert_eq!(site.latitude_deg, -33.8598874);
        assert_eq!(site.longitude_deg, 151.2021771);
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(Site::from_coordinates("12.0").is_none());
        assert!(Site::from_coordinates("north, 12").is_none());
        assert!(Site::from_coordinates("95, 12").is_none());
        assert!(Site::from_coordinates("1, 2, 3").is_none());
        assert!(Site::new(f64::NAN, 0.0).is_none());
    }
}
