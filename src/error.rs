use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedicError {
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Unknown recovery action: {0}")]
    UnknownAction(String),

    #[error("Simulation failed at step {step}: {message}")]
    Simulation { step: u32, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MedicError>;
