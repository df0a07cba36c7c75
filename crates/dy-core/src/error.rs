use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("folder '{0}' already exists")]
    FolderAlreadyExists(String),

    #[error("folder {0} does not exist")]
    FolderNotFound(PathBuf),

    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("'{0}' is reserved for dockyard's own files")]
    ReservedName(String),

    #[error("folder '{name}' would share the image name of existing folder '{existing}'")]
    NameCollision { name: String, existing: String },

    #[error("missing input: {0}")]
    MissingInput(&'static str),

    #[error("config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("malformed folder registry {path}: {reason}")]
    MalformedRegistry { path: PathBuf, reason: String },

    #[error("folder registry failed: {0}")]
    Registry(String),

    #[error("container runtime failed: {0}")]
    Docker(String),

    #[error("image build for '{image}' failed: {detail}")]
    BuildFailed { image: String, detail: String },

    #[error("container run for '{image}' failed: {detail}")]
    RunFailed { image: String, detail: String },

    #[error("port allocation failed: {0}")]
    PortAllocation(String),

    #[error("partially deleted {path}: {} entries remain ({source})", .remaining.len())]
    PartialDelete {
        path: PathBuf,
        remaining: Vec<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("no app deployed from folder '{0}'")]
    AppNotDeployed(String),

    #[error("process failed: {0}")]
    Process(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlatformError>;
