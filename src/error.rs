use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrawlerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("No level-up choice is pending")]
    NoChoicePending,

    #[error("Choice {index} out of range ({available} on offer)")]
    ChoiceOutOfRange { index: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, BrawlerError>;
