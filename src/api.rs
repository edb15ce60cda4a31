use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use geo::Point;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::aggregate::RouteAssessment;
use crate::assess::{LocationAssessment, ReadinessEngine};
use crate::error::AssessmentError;
use crate::grid::SpatialDataset;
use crate::stats::NationalStats;

pub const SERVICE_NAME: &str = "CAV Road Readiness API";

// Shared, read-only for the lifetime of the server
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReadinessEngine<SpatialDataset>>,
    pub stats: Arc<NationalStats>,
}

impl AppState {
    /// Wrap the engine and compute national stats once up front.
    pub fn new(engine: ReadinessEngine<SpatialDataset>) -> Self {
        let stats = engine.national_stats();
        Self {
            engine: Arc::new(engine),
            stats: Arc::new(stats),
        }
    }
}

// --- API DTOs ---

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

impl From<AssessmentError> for ApiError {
    fn from(err: AssessmentError) -> Self {
        let code = match err {
            AssessmentError::OutOfRange { .. } | AssessmentError::InvalidRoute(_) => "bad_request",
            AssessmentError::NotFound { .. } | AssessmentError::NoCoverage => "not_found",
        };
        Self::new(code, err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new("bad_request", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code {
            "bad_request" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub fn build_app(state: AppState) -> Router {
    // Allows browser dashboards on any origin to query the API
    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(root))
        .route("/api/v1/location/readiness", get(location_readiness))
        .route("/api/v1/route/assess", get(assess_route))
        .route("/api/v1/stats", get(national_stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Handlers ---

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "endpoints": {
            "assess_route": "/api/v1/route/assess",
            "location_readiness": "/api/v1/location/readiness",
            "stats": "/api/v1/stats",
        },
    }))
}

async fn location_readiness(
    State(state): State<AppState>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<LocationAssessment>, ApiError> {
    let Query(q) = query?;
    let assessment = state.engine.assess_location(q.lat, q.lon)?;
    Ok(Json(assessment))
}

async fn assess_route(
    State(state): State<AppState>,
    query: Result<Query<RouteQuery>, QueryRejection>,
) -> Result<Json<RouteAssessment>, ApiError> {
    let Query(q) = query?;
    let start = Point::new(q.start_lon, q.start_lat);
    let end = Point::new(q.end_lon, q.end_lat);

    let engine = Arc::clone(&state.engine);
    let report = tokio::task::spawn_blocking(move || engine.assess_route(start, end))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "route assessment task failed");
            ApiError::internal("route assessment failed")
        })??;

    tracing::info!(
        route_id = %report.route_id,
        segments = report.segments.len(),
        critical = report.critical_segments.len(),
        "route assessed"
    );
    Ok(Json(report))
}

async fn national_stats(State(state): State<AppState>) -> Json<NationalStats> {
    Json(state.stats.as_ref().clone())
}
