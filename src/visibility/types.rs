use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sky::{get_az_alt, HorizontalPosition, Site};

/// A catalog object; RA is stored in degrees like the catalog does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTarget {
    pub name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl CatalogTarget {
    pub fn new(name: impl Into<String>, ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            name: name.into(),
            ra_deg,
            dec_deg,
        }
    }

    pub fn ra_hours(&self) -> f64 {
        self.ra_deg / 15.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetPosition {
    pub name: String,
    pub position: HorizontalPosition,
}

impl TargetPosition {
    pub fn is_visible(&self) -> bool {
        self.position.is_above_horizon()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilitySnapshot {
    pub computed_at: DateTime<Utc>,
    pub site: Site,
    pub targets: Vec<TargetPosition>,
}

impl VisibilitySnapshot {
    pub fn visible(&self) -> impl Iterator<Item = &TargetPosition> {
        self.targets.iter().filter(|t| t.is_visible())
    }

    pub fn get(&self, name: &str) -> Option<&TargetPosition> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// Horizontal positions of every target for `site` at `at`.
///
/// Targets with non-finite coordinates are left out.
pub fn compute_visibility(
    targets: &[CatalogTarget],
    site: Site,
    at: DateTime<Utc>,
) -> VisibilitySnapshot {
    let targets = targets
        .iter()
        .filter_map(|target| {
            let position = get_az_alt(
                target.ra_hours(),
                target.dec_deg,
                site.latitude_deg,
                site.longitude_deg,
                at,
            );
            if position.is_none() {
                log::debug!("skipping {}: coordinates not finite", target.name);
            }
            position.map(|position| TargetPosition {
                name: target.name.clone(),
                position,
            })
        })
        .collect();

    VisibilitySnapshot {
        computed_at: at,
        site,
        targets,
    }
}
