use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadflowError {
    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("cannot derive a sample name from the parent of {0}")]
    NoSampleName(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("trim failed for {source_path} (exit {code}): {stderr}")]
    TrimFailed {
        source_path: String,
        code: String,
        stderr: String,
    },

    #[error("failed to start {program}: {error}")]
    Spawn {
        program: String,
        error: std::io::Error,
    },

    #[error("{path}: {error}")]
    File {
        path: String,
        error: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReadflowError {
    pub(crate) fn file(path: &std::path::Path, error: std::io::Error) -> Self {
        Self::File {
            path: path.display().to_string(),
            error,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadflowError>;
