use dy_core::models::DeployedApp;

pub const TITLE: &str = "Local App Deployment Platform";

pub fn help() -> String {
    [
        "Folders:",
        "  folders                        list created folders",
        "  mkdir <folder>                 create a folder",
        "  rmdir <folder>                 delete a folder and everything in it",
        "  open <folder>                  open a folder in the file browser",
        "Files:",
        "  ls <folder>                    list files in a folder",
        "  cat <folder> <file>            show a file",
        "  write <folder> <file> [text]   create or replace a file (\\n, \\t escapes)",
        "  rm <folder> <file>             delete a file",
        "Deployment:",
        "  deploy <folder> <url-path>     build and run a folder's Dockerfile",
        "  undeploy <folder>              remove a deployed app's container",
        "  apps [--json]                  list deployed apps",
        "  ports                          list ports used this session",
        "  quit",
    ]
    .join("\n")
}

pub fn deployed_apps(apps: &[DeployedApp]) -> String {
    if apps.is_empty() {
        return "No apps deployed yet.".into();
    }
    apps.iter()
        .map(|app| format!("- {} deployed at {}", app.folder, app.url))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn folders(names: &[String]) -> String {
    let mut lines = vec![format!("Total Folders Created: {}", names.len())];
    lines.extend(names.iter().map(|n| format!("- {n}")));
    lines.join("\n")
}

pub fn files(folder: &str, names: &[String]) -> String {
    if names.is_empty() {
        return format!("Files in {folder}:\nNo files found in this folder.");
    }
    let mut lines = vec![format!("Files in {folder}:")];
    lines.extend(names.iter().map(|n| format!("- {n}")));
    lines.join("\n")
}

pub fn ports(used: &[u16], next: Option<u16>) -> String {
    let used = if used.is_empty() {
        "none".to_string()
    } else {
        used.iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    match next {
        Some(port) => format!("Used ports: {used}\nNext port: {port}"),
        None => format!("Used ports: {used}\nNext port: none available"),
    }
}
