pub mod config;
pub mod deployment;

pub use config::{PlatformConfig, DEFAULT_PORT};
pub use deployment::DeployedApp;
