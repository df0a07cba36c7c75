use std::path::PathBuf;

use crate::error::{PlatformError, Result};
use crate::models::{DeployedApp, PlatformConfig};

use super::deployer::Deployer;
use super::docker::{ContainerRuntime, DockerCli};
use super::folders::FolderManager;
use super::ports::PortAllocator;

/// State of one interactive session: the managed folders, the apps deployed
/// so far and the ports they took. Deployed apps and ports are never
/// persisted.
pub struct Session<R> {
    folders: FolderManager,
    deployer: Deployer<R>,
    ports: PortAllocator,
    deployed: Vec<DeployedApp>,
}

impl Session<DockerCli> {
    /// A session that drives the configured container CLI.
    pub fn with_docker(root: PathBuf, config: &PlatformConfig) -> Self {
        Self::new(root, config, DockerCli::new(config.docker_binary.clone()))
    }
}

impl<R: ContainerRuntime> Session<R> {
    pub fn new(root: PathBuf, config: &PlatformConfig, runtime: R) -> Self {
        Self {
            folders: FolderManager::new(root, &config.registry_file),
            deployer: Deployer::from_config(runtime, config),
            ports: PortAllocator::new(config.base_port),
            deployed: Vec::new(),
        }
    }

    pub fn folders(&self) -> &FolderManager {
        &self.folders
    }

    pub fn deployer(&self) -> &Deployer<R> {
        &self.deployer
    }

    pub fn deployed_apps(&self) -> &[DeployedApp] {
        &self.deployed
    }

    pub fn used_ports(&self) -> Vec<u16> {
        self.ports.used()
    }

    /// Port the next deployment would get.
    pub fn next_port(&self) -> Result<u16> {
        self.ports.next_available()
    }

    /// Build and start `folder` on the next free port. The port is only
    /// claimed if the container starts. Deploying a folder that already has
    /// an app in this session replaces it: the old container is removed once
    /// the new one is running.
    pub async fn deploy(&mut self, folder: &str, url_path: &str) -> Result<DeployedApp> {
        if folder.trim().is_empty() {
            return Err(PlatformError::MissingInput("app folder"));
        }
        if url_path.trim().is_empty() {
            return Err(PlatformError::MissingInput("URL path"));
        }
        let folder_path = self.folders.folder_path(folder)?;
        if !folder_path.is_dir() {
            return Err(PlatformError::FolderNotFound(folder_path));
        }

        let port = self.ports.next_available()?;
        tracing::info!(folder = %folder, port, "deploying");
        let mut app = self.deployer.deploy(&folder_path, url_path, port).await?;
        app.folder = folder.to_string();
        self.ports.claim(port);

        if let Some(index) = self.deployed.iter().position(|a| a.folder == folder) {
            let previous = self.deployed.remove(index);
            if let Err(e) = self.deployer.remove(&previous).await {
                tracing::warn!(
                    folder = %folder,
                    container = %previous.container_id,
                    error = %e,
                    "failed to remove replaced container"
                );
            }
        }

        self.deployed.push(app.clone());
        Ok(app)
    }

    /// Stop and remove the app deployed from `folder`. Its port stays claimed.
    pub async fn undeploy(&mut self, folder: &str) -> Result<DeployedApp> {
        let index = self
            .deployed
            .iter()
            .position(|a| a.folder == folder)
            .ok_or_else(|| PlatformError::AppNotDeployed(folder.to_string()))?;
        self.deployer.remove(&self.deployed[index]).await?;
        Ok(self.deployed.remove(index))
    }
}
