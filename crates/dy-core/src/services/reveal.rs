use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{PlatformError, Result};

/// Program and arguments that open `path` in the file browser of `os`
/// (a value of `std::env::consts::OS`).
pub fn reveal_command(os: &str, path: &Path) -> (&'static str, Vec<String>) {
    let target = path.to_string_lossy().to_string();
    match os {
        "windows" => ("explorer", vec![target]),
        "macos" => ("open", vec![target]),
        _ => ("xdg-open", vec![target]),
    }
}

/// Open `path` in the host's file browser. The viewer is left running.
pub fn reveal(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(PlatformError::FolderNotFound(path.to_path_buf()));
    }
    let (program, args) = reveal_command(std::env::consts::OS, path);
    tracing::info!(program, path = %path.display(), "opening folder in file browser");
    Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| PlatformError::Process(format!("failed to start {program}: {e}")))?;
    Ok(())
}
