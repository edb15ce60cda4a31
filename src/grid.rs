//! Grid-indexed readiness dataset.
//!
//! Survey points are quantized into lat/lon buckets at a fixed resolution.
//! Queries are quantized the same way, so a lookup is a single hash probe.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AssessmentError, DatasetError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureQuality {
    pub lane_markings: f64,
    pub signage_visibility: f64,
    pub surface_condition: f64,
}

/// A single surveyed road point, in the generator's JSON layout.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub readiness_score: f64,
    #[serde(default)]
    pub detected_features: Vec<String>,
    pub infrastructure_quality: InfrastructureQuality,
    #[serde(default)]
    pub weather_impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub lat_bucket: i32,
    pub lon_bucket: i32,
}

impl GridKey {
    pub fn quantize(lat: f64, lon: f64, resolution_deg: f64) -> Self {
        Self {
            lat_bucket: (lat / resolution_deg).round() as i32,
            lon_bucket: (lon / resolution_deg).round() as i32,
        }
    }
}

/// Readiness for one grid bucket, merged from every survey point inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRecord {
    pub readiness_score: f64,
    pub infrastructure_quality: InfrastructureQuality,
    pub detected_features: BTreeSet<String>,
    pub weather_impact: f64,
    pub sample_count: usize,
}

/// Read-only lookup interface the assessment engine runs against.
///
/// Synthetic and surveyed datasets both sit behind this, so the engine never
/// needs to know where its records came from.
pub trait ReadinessSource: Send + Sync {
    /// Record for the bucket enclosing `(lat, lon)`.
    fn lookup(&self, lat: f64, lon: f64) -> Result<&GridRecord, AssessmentError>;

    fn records(&self) -> impl Iterator<Item = &GridRecord> + '_;
}

/// Rejects coordinates outside WGS84 bounds (NaN included).
pub fn check_coordinate(lat: f64, lon: f64) -> Result<(), AssessmentError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(AssessmentError::OutOfRange { lat, lon })
    }
}

#[derive(Debug)]
pub struct SpatialDataset {
    resolution_deg: f64,
    cells: HashMap<GridKey, GridRecord>,
}

#[derive(Default)]
struct CellAccumulator {
    score: f64,
    lane_markings: f64,
    signage_visibility: f64,
    surface_condition: f64,
    weather_impact: f64,
    features: BTreeSet<String>,
    count: usize,
}

impl CellAccumulator {
    fn add(&mut self, point: &SurveyPoint) {
        self.score += point.readiness_score;
        self.lane_markings += point.infrastructure_quality.lane_markings;
        self.signage_visibility += point.infrastructure_quality.signage_visibility;
        self.surface_condition += point.infrastructure_quality.surface_condition;
        self.weather_impact += point.weather_impact;
        self.features.extend(point.detected_features.iter().cloned());
        self.count += 1;
    }

    fn finish(self) -> GridRecord {
        let n = self.count as f64;
        GridRecord {
            readiness_score: self.score / n,
            infrastructure_quality: InfrastructureQuality {
                lane_markings: self.lane_markings / n,
                signage_visibility: self.signage_visibility / n,
                surface_condition: self.surface_condition / n,
            },
            detected_features: self.features,
            weather_impact: self.weather_impact / n,
            sample_count: self.count,
        }
    }
}

impl SpatialDataset {
    /// Quantize survey points into grid buckets, merging points that share one.
    pub fn from_survey(points: &[SurveyPoint], resolution_deg: f64) -> Result<Self, DatasetError> {
        if points.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut acc: HashMap<GridKey, CellAccumulator> = HashMap::new();
        for (index, point) in points.iter().enumerate() {
            validate_point(point).map_err(|reason| DatasetError::InvalidRecord { index, reason })?;
            let key = GridKey::quantize(point.latitude, point.longitude, resolution_deg);
            acc.entry(key).or_default().add(point);
        }

        let cells: HashMap<GridKey, GridRecord> =
            acc.into_iter().map(|(key, cell)| (key, cell.finish())).collect();

        tracing::info!(
            points = points.len(),
            cells = cells.len(),
            resolution_deg,
            "spatial dataset built"
        );

        Ok(Self {
            resolution_deg,
            cells,
        })
    }

    pub fn from_json_file(path: &Path, resolution_deg: f64) -> Result<Self, DatasetError> {
        tracing::info!(path = %path.display(), "loading survey dataset");
        let reader = BufReader::new(File::open(path)?);
        let points: Vec<SurveyPoint> = serde_json::from_reader(reader)?;
        Self::from_survey(&points, resolution_deg)
    }

    pub fn key_for(&self, lat: f64, lon: f64) -> GridKey {
        GridKey::quantize(lat, lon, self.resolution_deg)
    }
}

impl ReadinessSource for SpatialDataset {
    fn lookup(&self, lat: f64, lon: f64) -> Result<&GridRecord, AssessmentError> {
        self.cells
            .get(&self.key_for(lat, lon))
            .ok_or(AssessmentError::NotFound { lat, lon })
    }

    fn records(&self) -> impl Iterator<Item = &GridRecord> + '_ {
        self.cells.values()
    }
}

fn validate_point(point: &SurveyPoint) -> Result<(), String> {
    check_coordinate(point.latitude, point.longitude).map_err(|e| e.to_string())?;

    if !(0.0..=100.0).contains(&point.readiness_score) {
        return Err(format!(
            "readiness_score {} outside [0, 100]",
            point.readiness_score
        ));
    }

    let q = &point.infrastructure_quality;
    for (name, value) in [
        ("lane_markings", q.lane_markings),
        ("signage_visibility", q.signage_visibility),
        ("surface_condition", q.surface_condition),
        ("weather_impact", point.weather_impact),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("{name} {value} outside [0, 1]"));
        }
    }

    Ok(())
}
