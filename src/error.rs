use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Yaml Error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("unsupported config format: {0}")]
    UnsupportedConfigFormat(String),

    #[error("clock went backwards: {current}s after {previous}s")]
    ClockWentBackwards { previous: f64, current: f64 },
}
