use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An app started during the current session. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployedApp {
    pub folder: String,
    pub folder_path: PathBuf,
    pub image: String,
    pub container_id: String,
    pub port: u16,
    pub url: String,
    pub deployed_at: DateTime<Utc>,
}

impl DeployedApp {
    pub fn compose_url(host: &str, port: u16, url_path: &str) -> String {
        format!("http://{host}:{port}{url_path}")
    }
}
