pub mod angles;
pub mod config;
pub mod sky;
pub mod status;
pub mod telemetry;
pub mod visibility;
