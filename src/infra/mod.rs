pub mod config;
pub mod dam;
pub mod water_quality;
