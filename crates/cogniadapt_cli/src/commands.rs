pub mod config;
pub mod media;
pub mod profile;
pub mod quiz;
pub mod transform;
