// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use dy_console::console::{Console, Reply};
use dy_core::error::{PlatformError, Result};
use dy_core::models::{DeployedApp, PlatformConfig};
use dy_core::services::docker::ContainerRuntime;
use dy_core::services::session::Session;

/// Container runtime that records docker-style command lines instead of
/// running them. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingRuntime {
    pub log: Arc<Mutex<Vec<String>>>,
    pub fail_build: bool,
}

impl RecordingRuntime {
    pub fn failing_build() -> Self {
        Self {
            fail_build: true,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerRuntime for RecordingRuntime {
    async fn build_image(&self, image: &str, context: &Path) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("build -t {image} {}", context.display()));
        if self.fail_build {
            return Err(PlatformError::BuildFailed {
                image: image.into(),
                detail: "no Dockerfile".into(),
            });
        }
        Ok(())
    }

    async fn run_detached(&self, image: &str, host_port: u16, container_port: u16) -> Result<String> {
        self.log
            .lock()
            .unwrap()
            .push(format!("run -d -p {host_port}:{container_port} {image}"));
        Ok(format!("{image}-{host_port}"))
    }

    async fn remove_container(&self, container_id: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("rm -f {container_id}"));
        Ok(())
    }
}

/// A console over a fresh session rooted at `root`.
pub fn make_console(root: &Path, runtime: RecordingRuntime) -> Console<RecordingRuntime> {
    Console::new(Session::new(
        root.to_path_buf(),
        &PlatformConfig::default(),
        runtime,
    ))
}

/// Run a line and return the reply text, panicking on blank/comment lines.
pub async fn run(console: &mut Console<RecordingRuntime>, line: &str) -> Reply {
    console
        .handle_line(line)
        .await
        .unwrap_or_else(|| panic!("no reply for {line:?}"))
}

pub fn text(reply: Reply) -> String {
    match reply {
        Reply::Text(t) => t,
        other => panic!("expected text reply, got {other:?}"),
    }
}

/// A deployed app with a fixed timestamp.
pub fn make_app(folder: &str, port: u16, url_path: &str) -> DeployedApp {
    DeployedApp {
        folder: folder.into(),
        folder_path: PathBuf::from(format!("/work/{folder}")),
        image: folder.to_lowercase(),
        container_id: format!("{}-{port}", folder.to_lowercase()),
        port,
        url: DeployedApp::compose_url("localhost", port, url_path),
        deployed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}
