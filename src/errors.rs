use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser not launched")]
    BrowserNotLaunched,

    #[error("Tab creation failed: {0}")]
    TabCreationFailed(String),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("JavaScript execution timeout")]
    JavaScriptTimeout,

    #[error("Page has no document body")]
    NoDocument,

    #[error("Invalid page snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("No marked element with id {0}")]
    UnknownMarkedId(usize),

    #[error("Page changed while marking: {0} captured elements left the document")]
    StaleSnapshot(usize),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type Result<T> = std::result::Result<T, MarkerError>;
