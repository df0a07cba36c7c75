pub mod config_loader;
pub mod deployer;
pub mod docker;
pub mod folders;
pub mod ports;
pub mod registry;
pub mod reveal;
pub mod session;
