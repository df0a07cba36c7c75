use std::path::Path;

use chrono::Utc;

use crate::error::{PlatformError, Result};
use crate::models::{DeployedApp, PlatformConfig, DEFAULT_PORT};

use super::docker::ContainerRuntime;

/// Image name for a folder: its final path segment, lowercased because image
/// references must be lowercase. Folders whose names differ only by case
/// would share an image, so `FolderManager::create_folder` refuses them.
pub fn image_name_for(folder_path: &Path) -> Result<String> {
    folder_path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| PlatformError::InvalidName(folder_path.display().to_string()))
}

/// Builds a folder into an image and starts it as a detached container.
pub struct Deployer<R> {
    runtime: R,
    container_port: u16,
    host: String,
}

impl<R: ContainerRuntime> Deployer<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            container_port: DEFAULT_PORT,
            host: "localhost".into(),
        }
    }

    pub fn from_config(runtime: R, config: &PlatformConfig) -> Self {
        Self {
            runtime,
            container_port: config.container_port,
            host: config.host.clone(),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Build the image for `folder_path`, then run it publishing `port`.
    /// The run step is skipped when the build fails. `url_path` only feeds
    /// the display URL of the returned app.
    pub async fn deploy(&self, folder_path: &Path, url_path: &str, port: u16) -> Result<DeployedApp> {
        let folder_path = std::path::absolute(folder_path)?;
        let image = image_name_for(&folder_path)?;
        let folder = folder_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        tracing::info!(image = %image, context = %folder_path.display(), "building image");
        if let Err(e) = self.runtime.build_image(&image, &folder_path).await {
            tracing::error!(image = %image, error = %e, "image build failed");
            return Err(e);
        }

        tracing::info!(image = %image, port, container_port = self.container_port, "starting container");
        let container_id = match self
            .runtime
            .run_detached(&image, port, self.container_port)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(image = %image, port, error = %e, "container run failed");
                return Err(e);
            }
        };

        Ok(DeployedApp {
            folder,
            folder_path,
            image,
            container_id,
            port,
            url: DeployedApp::compose_url(&self.host, port, url_path),
            deployed_at: Utc::now(),
        })
    }

    /// Remove the container backing `app`.
    pub async fn remove(&self, app: &DeployedApp) -> Result<()> {
        tracing::info!(container = %app.container_id, image = %app.image, "removing container");
        self.runtime.remove_container(&app.container_id).await
    }
}
