pub type Result<T> = core::result::Result<T, HashJobError>;

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum HashJobError {
    #[error("Couldn't access {path}: {reason}.")]
    FileAccess { path: String, reason: String },

    #[error("Unsupported algorithm: {0}.")]
    UnsupportedAlgorithm(String),

    #[error("Couldn't read {path}: {reason}.")]
    IoFailure { path: String, reason: String },

    #[error("A hash job is already running.")]
    AlreadyRunning,

    #[error("Save failed: {0}.")]
    SaveFailure(String),

    #[error("The hash job worker is no longer available.")]
    Disconnected,
}
