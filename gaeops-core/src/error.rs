use thiserror::Error;

/// Problems with the local Cloud SDK installation. All of these are fatal for
/// the requested operation; callers typically prompt for an install or upgrade.
#[derive(Error, Debug)]
pub enum CloudSdkError {
    #[error("Cloud SDK not found: {0}")]
    NotFound(String),

    #[error("Cloud SDK {installed} is out of date, version {required} or newer is required")]
    OutOfDate { installed: String, required: String },

    #[error("Cloud SDK version file error: {0}")]
    VersionFile(String),
}

/// Failure reported by a process handler while consuming a gcloud process.
#[derive(Error, Debug)]
pub enum ProcessHandlerError {
    #[error("Process exited with non-zero status: {}", describe_exit(.code))]
    NonZeroExit { code: Option<i32> },

    #[error("IO error while handling process: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process handling failed: {0}")]
    Failed(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

/// Umbrella error for every App Engine operation.
#[derive(Error, Debug)]
pub enum AppEngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    CloudSdk(#[from] CloudSdkError),

    #[error("Failed to run gcloud: {0}")]
    Io(#[from] std::io::Error),

    #[error("gcloud operation failed: {0}")]
    ProcessHandler(#[from] ProcessHandlerError),
}

pub type Result<T> = std::result::Result<T, AppEngineError>;
