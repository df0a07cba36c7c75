use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{PlatformError, Result};

/// The external container runtime the deployer drives.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Build an image tagged `image` from the build context at `context`.
    async fn build_image(&self, image: &str, context: &Path) -> Result<()>;

    /// Start a detached container publishing `host_port` to `container_port`.
    /// Returns the container id.
    async fn run_detached(&self, image: &str, host_port: u16, container_port: u16)
        -> Result<String>;

    /// Force-remove a container, stopping it first if it is running.
    async fn remove_container(&self, container_id: &str) -> Result<()>;
}

pub fn build_args(image: &str, context: &Path) -> Vec<String> {
    vec![
        "build".into(),
        "-t".into(),
        image.into(),
        context.to_string_lossy().to_string(),
    ]
}

pub fn run_args(image: &str, host_port: u16, container_port: u16) -> Vec<String> {
    vec![
        "run".into(),
        "-d".into(),
        "-p".into(),
        format!("{host_port}:{container_port}"),
        image.into(),
    ]
}

pub fn remove_args(container_id: &str) -> Vec<String> {
    vec!["rm".into(), "-f".into(), container_id.into()]
}

/// Runs the `docker` CLI (or a compatible binary such as `podman`).
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run the binary and return its trimmed stdout. A non-zero exit is
    /// turned into an error by `on_failure`.
    async fn run<F>(&self, args: &[String], on_failure: F) -> Result<String>
    where
        F: FnOnce(String) -> PlatformError,
    {
        tracing::info!(command = %format!("{} {}", self.binary, args.join(" ")), "running container command");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| PlatformError::Docker(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(on_failure(format!(
                "{} {} failed (exit {}): {}",
                self.binary,
                args.first().map(String::as_str).unwrap_or_default(),
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn build_image(&self, image: &str, context: &Path) -> Result<()> {
        self.run(&build_args(image, context), |detail| {
            PlatformError::BuildFailed {
                image: image.to_string(),
                detail,
            }
        })
        .await?;
        Ok(())
    }

    async fn run_detached(
        &self,
        image: &str,
        host_port: u16,
        container_port: u16,
    ) -> Result<String> {
        let stdout = self
            .run(&run_args(image, host_port, container_port), |detail| {
                PlatformError::RunFailed {
                    image: image.to_string(),
                    detail,
                }
            })
            .await?;
        // `run -d` prints the id last; pulls may print progress lines first.
        Ok(stdout.lines().last().unwrap_or_default().trim().to_string())
    }

    async fn remove_container(&self, container_id: &str) -> Result<()> {
        self.run(&remove_args(container_id), PlatformError::Docker)
            .await?;
        Ok(())
    }
}
