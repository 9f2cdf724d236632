use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("LOCATOR_INVALID: cannot get page id from {0}")]
    InvalidLocator(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("{0}")]
    Remote(String),
    #[error("TRANSPORT_FAILURE: {0}")]
    Transport(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Config(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
