use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::assess::round_to;
use crate::grid::ReadinessSource;
use crate::risk::RiskLevel;

/// Dataset-wide counters; every risk level is always present in the distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalStats {
    pub total_segments_assessed: usize,
    pub average_readiness_score: f64,
    pub coverage_km: f64,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
}

pub fn national_stats<S: ReadinessSource>(source: &S, segment_length_km: f64) -> NationalStats {
    let mut total = 0usize;
    let mut score_sum = 0.0;
    let mut samples = 0usize;
    for record in source.records() {
        total += 1;
        score_sum += record.readiness_score;
        samples += record.sample_count;
    }

    let counts = source
        .records()
        .map(|r| RiskLevel::from_score(r.readiness_score))
        .counts();
    let risk_distribution = RiskLevel::ALL
        .iter()
        .map(|level| (*level, counts.get(level).copied().unwrap_or(0)))
        .collect();

    let average = if total == 0 { 0.0 } else { score_sum / total as f64 };

    NationalStats {
        total_segments_assessed: total,
        average_readiness_score: round_to(average, 2),
        coverage_km: round_to(samples as f64 * segment_length_km, 1),
        risk_distribution,
    }
}
