use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use geo::Point;
use serde::Serialize;

use crate::aggregate::{self, RouteAssessment, RouteSettings};
use crate::error::AssessmentError;
use crate::grid::{check_coordinate, GridRecord, InfrastructureQuality, ReadinessSource};
use crate::risk::RiskLevel;
use crate::stats::{self, NationalStats};

/// Readiness at one coordinate, shared by single-location and route output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessReading {
    pub latitude: f64,
    pub longitude: f64,
    pub readiness_score: f64,
    pub risk_level: RiskLevel,
    pub risk_color: &'static str,
    pub infrastructure_quality: InfrastructureQuality,
    pub detected_features: BTreeSet<String>,
    pub weather_impact: f64,
}

impl ReadinessReading {
    fn from_record(latitude: f64, longitude: f64, record: &GridRecord) -> Self {
        let risk_level = RiskLevel::from_score(record.readiness_score);
        Self {
            latitude,
            longitude,
            readiness_score: record.readiness_score,
            risk_level,
            risk_color: risk_level.color(),
            infrastructure_quality: record.infrastructure_quality,
            detected_features: record.detected_features.clone(),
            weather_impact: record.weather_impact,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationAssessment {
    #[serde(flatten)]
    pub reading: ReadinessReading,
    pub timestamp: DateTime<Utc>,
}

/// Validate `(lat, lon)` and read the enclosing grid record.
pub fn read<S: ReadinessSource>(
    source: &S,
    lat: f64,
    lon: f64,
) -> Result<ReadinessReading, AssessmentError> {
    check_coordinate(lat, lon)?;
    let record = source.lookup(lat, lon)?;
    Ok(ReadinessReading::from_record(lat, lon, record))
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Assessment entry point, owning the immutable dataset for the service lifetime.
pub struct ReadinessEngine<S> {
    source: S,
    route: RouteSettings,
    segment_length_km: f64,
}

impl<S: ReadinessSource> ReadinessEngine<S> {
    pub fn new(source: S, route: RouteSettings, segment_length_km: f64) -> Self {
        Self {
            source,
            route,
            segment_length_km,
        }
    }

    pub fn assess_location(&self, lat: f64, lon: f64) -> Result<LocationAssessment, AssessmentError> {
        Ok(LocationAssessment {
            reading: read(&self.source, lat, lon)?,
            timestamp: Utc::now(),
        })
    }

    pub fn assess_route(
        &self,
        start: Point<f64>,
        end: Point<f64>,
    ) -> Result<RouteAssessment, AssessmentError> {
        aggregate::assess_route(&self.source, &self.route, start, end, Utc::now())
    }

    pub fn national_stats(&self) -> NationalStats {
        stats::national_stats(&self.source, self.segment_length_km)
    }
}
