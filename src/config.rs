use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ConfigError;

// Finer than this and `180 / res` no longer fits an i32 grid bucket
pub const MIN_GRID_RESOLUTION_DEG: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// JSON survey file; when unset the service synthesizes a dataset.
    pub dataset_path: Option<PathBuf>,
    pub dataset_seed: u64,
    pub grid_resolution_deg: f64,
    pub segment_length_km: f64,
    pub route_step_km: f64,
    pub max_route_km: f64,
    pub upgrade_threshold: usize,
}

/// Load configuration from the process environment, reading `.env` first.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Parse configuration through `lookup` so tests can feed a plain map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(var, format!("must be a positive number, got {value}")));
        }
        Ok(value)
    };

    let grid_resolution_deg = parse_positive_f64("CAV_GRID_RESOLUTION_DEG", "0.01")?;
    if grid_resolution_deg < MIN_GRID_RESOLUTION_DEG {
        return Err(invalid(
            "CAV_GRID_RESOLUTION_DEG",
            format!("must be at least {MIN_GRID_RESOLUTION_DEG}, got {grid_resolution_deg}"),
        ));
    }

    let bind_addr = or_default("CAV_BIND_ADDR", "0.0.0.0:8080")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("CAV_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("CAV_LOG_LEVEL", "info");
    let dataset_path = lookup("CAV_DATASET_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let dataset_seed = or_default("CAV_DATASET_SEED", "42")
        .parse::<u64>()
        .map_err(|e| invalid("CAV_DATASET_SEED", e.to_string()))?;
    let upgrade_threshold = or_default("CAV_UPGRADE_THRESHOLD", "5")
        .parse::<usize>()
        .map_err(|e| invalid("CAV_UPGRADE_THRESHOLD", e.to_string()))?;

    Ok(AppConfig {
        bind_addr,
        log_level,
        dataset_path,
        dataset_seed,
        grid_resolution_deg,
        segment_length_km: parse_positive_f64("CAV_SEGMENT_LENGTH_KM", "0.05")?,
        route_step_km: parse_positive_f64("CAV_ROUTE_STEP_KM", "1.0")?,
        max_route_km: parse_positive_f64("CAV_MAX_ROUTE_KM", "1000")?,
        upgrade_threshold,
    })
}
