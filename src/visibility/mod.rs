mod location;
mod refresher;
mod types;

pub use location::{FixedLocation, LocationProvider, SharedLocation};
pub use refresher::{
    RefreshMode, RefreshSettings, VisibilityRefresher, DEFAULT_LOCATION_RETRY,
    DEFAULT_REFRESH_INTERVAL,
};
pub use types::{compute_visibility, CatalogTarget, TargetPosition, VisibilitySnapshot};
