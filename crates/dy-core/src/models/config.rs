use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8501;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// First host port handed out by the port allocator.
    pub base_port: u16,
    /// Port the app listens on inside its container.
    pub container_port: u16,
    pub host: String,
    pub registry_file: String,
    pub docker_binary: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_port: DEFAULT_PORT,
            container_port: DEFAULT_PORT,
            host: "localhost".into(),
            registry_file: "created_folders.csv".into(),
            docker_binary: "docker".into(),
        }
    }
}
