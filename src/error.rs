use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("settings storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("auto-launch registration failed: {0}")]
    AutoLaunchRegistrationFailed(String),

    #[error("bridge error: {0}")]
    Bridge(String),

    #[error("daemon refused request: {0}")]
    Rejected(String),

    #[error("timer controller is no longer running")]
    ControllerGone,
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::Bridge(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Bridge(format!("malformed message: {}", e))
    }
}

pub type AppResult<T> = Result<T, AppError>;
