mod aggregate;
mod api;
mod assess;
mod config;
mod error;
mod grid;
mod risk;
mod route;
mod stats;
mod synth;

use tracing_subscriber::EnvFilter;

use crate::aggregate::RouteSettings;
use crate::api::{build_app, AppState};
use crate::assess::ReadinessEngine;
use crate::grid::SpatialDataset;

// One synthetic survey point every 50 m
const SYNTH_POINTS_PER_KM: u32 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // 1. Build the spatial dataset before accepting traffic
    let dataset = match &config.dataset_path {
        Some(path) => SpatialDataset::from_json_file(path, config.grid_resolution_deg)?,
        None => {
            tracing::info!(seed = config.dataset_seed, "no dataset file configured; synthesizing survey");
            let survey = synth::generate_survey(config.dataset_seed, SYNTH_POINTS_PER_KM);
            SpatialDataset::from_survey(&survey, config.grid_resolution_deg)?
        }
    };

    // 2. Engine + cached national stats
    let route = RouteSettings {
        step_km: config.route_step_km,
        max_route_km: config.max_route_km,
        upgrade_threshold: config.upgrade_threshold,
    };
    let engine = ReadinessEngine::new(dataset, route, config.segment_length_km);
    let state = AppState::new(engine);
    tracing::info!(
        cells = state.stats.total_segments_assessed,
        average = state.stats.average_readiness_score,
        coverage_km = state.stats.coverage_km,
        "readiness engine ready"
    );

    // 3. Serve
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "{} listening", api::SERVICE_NAME);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
