use dy_core::error::{PlatformError, Result};
use dy_core::services::docker::ContainerRuntime;
use dy_core::services::session::Session;

use crate::command::Command;
use crate::render;

/// What the console shows after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Error(String),
    Quit,
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

/// Wires console commands to a [`Session`] and turns every result into a
/// message. Errors end the command, never the session.
pub struct Console<R> {
    session: Session<R>,
}

impl<R: ContainerRuntime> Console<R> {
    pub fn new(session: Session<R>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    /// Parse and run one input line. Blank lines and comments give `None`.
    pub async fn handle_line(&mut self, line: &str) -> Option<Reply> {
        match crate::command::parse(line) {
            Ok(Some(command)) => Some(self.execute(command).await),
            Ok(None) => None,
            Err(usage) => Some(Reply::Error(format!("Error: {usage}"))),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Reply {
        tracing::debug!(?command, "execute");
        match self.try_execute(command).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(error = %e, "command_failed");
                Reply::Error(error_message(&e))
            }
        }
    }

    async fn try_execute(&mut self, command: Command) -> Result<Reply> {
        let folders = self.session.folders();
        let reply = match command {
            Command::Help => Reply::Text(render::help()),
            Command::Quit => Reply::Quit,
            Command::Folders => {
                let names = folders.list_folders().await?;
                Reply::Text(render::folders(&names))
            }
            Command::CreateFolder(name) => {
                folders.create_folder(&name).await?;
                Reply::Text(format!("Folder '{name}' created."))
            }
            Command::DeleteFolder(name) => {
                folders.delete_folder(&name).await?;
                Reply::Text(format!(
                    "Folder '{name}' and its contents have been deleted."
                ))
            }
            Command::OpenFolder(name) => {
                folders.reveal_folder(&name)?;
                Reply::Text(format!("Opened '{name}' in the file browser."))
            }
            Command::ListFiles(folder) => {
                let names = folders.list_files(&folder).await?;
                Reply::Text(render::files(&folder, &names))
            }
            Command::ReadFile { folder, file } => {
                Reply::Text(folders.read_file(&folder, &file).await?)
            }
            Command::WriteFile {
                folder,
                file,
                content,
            } => {
                folders.create_file(&folder, &file, &content).await?;
                Reply::Text(format!("File '{file}' created in '{folder}'."))
            }
            Command::DeleteFile { folder, file } => {
                folders.delete_file(&folder, &file).await?;
                Reply::Text(format!("File '{file}' deleted from '{folder}'."))
            }
            Command::Deploy { folder, url_path } => {
                let app = self.session.deploy(&folder, &url_path).await?;
                Reply::Text(format!(
                    "App '{}' successfully deployed at {}",
                    app.folder, app.url
                ))
            }
            Command::Undeploy(folder) => {
                let app = self.session.undeploy(&folder).await?;
                Reply::Text(format!(
                    "App '{}' removed; port {} stays reserved.",
                    app.folder, app.port
                ))
            }
            Command::Apps { json: false } => {
                Reply::Text(render::deployed_apps(self.session.deployed_apps()))
            }
            Command::Apps { json: true } => {
                Reply::Text(serde_json::to_string_pretty(self.session.deployed_apps())?)
            }
            Command::Ports => {
                let next = self.session.next_port().ok();
                Reply::Text(render::ports(&self.session.used_ports(), next))
            }
        };
        Ok(reply)
    }
}

fn error_message(error: &PlatformError) -> String {
    match error {
        PlatformError::BuildFailed { .. } | PlatformError::RunFailed { .. } => {
            format!("Error: failed to deploy the app ({error}). Check the logs.")
        }
        PlatformError::PartialDelete { remaining, .. } => {
            let mut message = format!("Error: {error}");
            for path in remaining {
                message.push_str(&format!("\n  remaining: {}", path.display()));
            }
            message
        }
        other => format!("Error: {other}"),
    }
}
