use thiserror::Error;

/// Failures surfaced by location and route assessment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssessmentError {
    #[error("coordinate ({lat}, {lon}) is outside WGS84 bounds")]
    OutOfRange { lat: f64, lon: f64 },

    #[error("no readiness data covers ({lat}, {lon})")]
    NotFound { lat: f64, lon: f64 },

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("no readiness data found along the route")]
    NoCoverage,
}

/// Failures while loading or building the spatial dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid survey point #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("dataset contains no survey points")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
