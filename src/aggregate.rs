//! Route-level aggregation over sampled segment readings.

use chrono::{DateTime, Utc};
use geo::Point;
use rayon::prelude::*;
use serde::Serialize;

use crate::assess::{self, round_to, ReadinessReading};
use crate::error::AssessmentError;
use crate::grid::ReadinessSource;
use crate::risk::RiskLevel;
use crate::route::{self, haversine_km};

const LANE_MARKING_FLOOR: f64 = 0.6;
const ROUNDABOUT_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct RouteSettings {
    pub step_km: f64,
    pub max_route_km: f64,
    /// Non-compliant segment count above which upgrades are recommended.
    pub upgrade_threshold: usize,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            step_km: 1.0,
            max_route_km: 1000.0,
            upgrade_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Point<f64>> for Coordinate {
    fn from(p: Point<f64>) -> Self {
        Self {
            latitude: p.y(),
            longitude: p.x(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegment {
    pub segment_id: u32,
    #[serde(flatten)]
    pub reading: ReadinessReading,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteAssessment {
    pub route_id: String,
    pub start: Coordinate,
    pub end: Coordinate,
    pub total_distance_km: f64,
    pub average_readiness_score: f64,
    pub overall_risk_level: RiskLevel,
    pub segments: Vec<RouteSegment>,
    pub critical_segments: Vec<RouteSegment>,
    pub recommendations: Vec<String>,
    pub assessed_at: DateTime<Utc>,
}

/// Sample the route, read every sample in parallel and fold the results.
///
/// Samples without coverage are dropped; the route only fails with
/// `NoCoverage` when none resolve.
pub fn assess_route<S: ReadinessSource>(
    source: &S,
    settings: &RouteSettings,
    start: Point<f64>,
    end: Point<f64>,
    assessed_at: DateTime<Utc>,
) -> Result<RouteAssessment, AssessmentError> {
    let samples = route::segment(start, end, settings.step_km, settings.max_route_km)?;

    let readings = samples
        .par_iter()
        .map(|p| match assess::read(source, p.y(), p.x()) {
            Ok(reading) => Ok(Some(reading)),
            Err(AssessmentError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let segments: Vec<RouteSegment> = readings
        .into_iter()
        .flatten()
        .zip(1u32..)
        .map(|(reading, segment_id)| RouteSegment {
            segment_id,
            reading,
        })
        .collect();

    tracing::debug!(
        samples = samples.len(),
        resolved = segments.len(),
        "route sampled"
    );

    if segments.is_empty() {
        return Err(AssessmentError::NoCoverage);
    }

    let mean = segments.iter().map(|s| s.reading.readiness_score).sum::<f64>() / segments.len() as f64;

    let critical_segments: Vec<RouteSegment> = segments
        .iter()
        .filter(|s| s.reading.risk_level == RiskLevel::Critical)
        .cloned()
        .collect();

    let recommendations = recommend(&RouteFacts::collect(&segments, settings.upgrade_threshold));

    Ok(RouteAssessment {
        route_id: format!("route_{}", assessed_at.format("%Y%m%d_%H%M%S")),
        start: start.into(),
        end: end.into(),
        total_distance_km: round_to(haversine_km(start, end), 2),
        average_readiness_score: round_to(mean, 2),
        // classified before rounding so 49.995 stays critical
        overall_risk_level: RiskLevel::from_score(mean),
        segments,
        critical_segments,
        recommendations,
        assessed_at,
    })
}

/// Counts the recommendation rules are evaluated against.
#[derive(Debug)]
struct RouteFacts {
    critical: usize,
    non_compliant: usize,
    upgrade_threshold: usize,
    mean_lane_markings: f64,
    roundabouts: usize,
    construction_zones: usize,
}

impl RouteFacts {
    fn collect(segments: &[RouteSegment], upgrade_threshold: usize) -> Self {
        let count_tag = |tag: &str| {
            segments
                .iter()
                .filter(|s| s.reading.detected_features.contains(tag))
                .count()
        };
        let lane_total: f64 = segments
            .iter()
            .map(|s| s.reading.infrastructure_quality.lane_markings)
            .sum();

        Self {
            critical: segments
                .iter()
                .filter(|s| s.reading.risk_level == RiskLevel::Critical)
                .count(),
            non_compliant: segments
                .iter()
                .filter(|s| s.reading.risk_level != RiskLevel::Compliant)
                .count(),
            upgrade_threshold,
            mean_lane_markings: lane_total / segments.len().max(1) as f64,
            roundabouts: count_tag("roundabout"),
            construction_zones: count_tag("construction_zone"),
        }
    }
}

struct Rule {
    applies: fn(&RouteFacts) -> bool,
    message: fn(&RouteFacts) -> String,
}

/// Evaluated top to bottom; output keeps this order.
const RULES: &[Rule] = &[
    Rule {
        applies: |f| f.critical > 0,
        message: |_| "Consider alternative routing around critical segments".to_string(),
    },
    Rule {
        applies: |f| f.non_compliant > f.upgrade_threshold,
        message: |f| format!("Infrastructure upgrades recommended for {} segments", f.non_compliant),
    },
    Rule {
        applies: |f| f.mean_lane_markings < LANE_MARKING_FLOOR,
        message: |_| {
            "Lane marking quality below threshold - consider alternative route or infrastructure upgrade"
                .to_string()
        },
    },
    Rule {
        applies: |f| f.roundabouts > ROUNDABOUT_LIMIT,
        message: |f| {
            format!(
                "{} roundabouts detected - ensure AV is validated for UK-style roundabouts",
                f.roundabouts
            )
        },
    },
    Rule {
        applies: |f| f.construction_zones > 0,
        message: |f| {
            format!(
                "{} construction zones - check for real-time updates before deployment",
                f.construction_zones
            )
        },
    },
];

const ALL_CLEAR: &str = "Route meets minimum readiness criteria for AV deployment";

fn recommend(facts: &RouteFacts) -> Vec<String> {
    let out: Vec<String> = RULES
        .iter()
        .filter(|rule| (rule.applies)(facts))
        .map(|rule| (rule.message)(facts))
        .collect();

    if out.is_empty() {
        vec![ALL_CLEAR.to_string()]
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::point;
    use crate::grid::{SpatialDataset, SurveyPoint};

    // Along lon 0 from lat 50.000 to 50.027 (≈3.0 km) the four samples land in
    // buckets 5000, 5001, 5002 and 5003 at 0.01° resolution.
    const START: (f64, f64) = (50.0, 0.0);
    const END: (f64, f64) = (50.027, 0.0);

    fn start() -> Point<f64> {
        Point::new(START.1, START.0)
    }

    fn end() -> Point<f64> {
        Point::new(END.1, END.0)
    }

    fn dataset(points: &[SurveyPoint]) -> SpatialDataset {
        SpatialDataset::from_survey(points, 0.01).unwrap()
    }

    fn run(points: &[SurveyPoint], settings: RouteSettings) -> Result<RouteAssessment, AssessmentError> {
        assess_route(&dataset(points), &settings, start(), end(), Utc::now())
    }

    fn full_coverage(scores: [f64; 4]) -> Vec<SurveyPoint> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| point(50.0 + i as f64 * 0.01, 0.0, s))
            .collect()
    }

    #[test]
    fn segments_cover_every_sample_in_order() {
        let report = run(&full_coverage([90.0, 80.0, 70.0, 60.0]), RouteSettings::default()).unwrap();
        let ids: Vec<u32> = report.segments.iter().map(|s| s.segment_id).collect();
        assert_eq!(ids, [1, 2, 3, 4]);

        let first = &report.segments[0].reading;
        let last = &report.segments[3].reading;
        assert_eq!((first.latitude, first.longitude), START);
        assert_eq!((last.latitude, last.longitude), END);

        let scores: Vec<f64> = report.segments.iter().map(|s| s.reading.readiness_score).collect();
        assert_eq!(scores, [90.0, 80.0, 70.0, 60.0]);
    }

    #[test]
    fn overall_risk_uses_unrounded_mean() {
        let report = run(&full_coverage([49.99, 50.0, 50.0, 49.99]), RouteSettings::default()).unwrap();
        assert!((report.average_readiness_score - 50.0).abs() < 1e-9);
        assert_eq!(report.overall_risk_level, RiskLevel::Critical);
    }

    #[test]
    fn uncovered_interior_sample_is_skipped() {
        // bucket 5001 has no record
        let points = [point(50.0, 0.0, 80.0), point(50.02, 0.0, 60.0), point(50.03, 0.0, 40.0)];
        let report = run(&points, RouteSettings::default()).unwrap();

        let ids: Vec<u32> = report.segments.iter().map(|s| s.segment_id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert!((report.average_readiness_score - 60.0).abs() < 1e-9);
        assert_eq!(report.overall_risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn critical_segments_preserve_route_order() {
        let report = run(&full_coverage([30.0, 90.0, 45.0, 80.0]), RouteSettings::default()).unwrap();
        let ids: Vec<u32> = report.critical_segments.iter().map(|s| s.segment_id).collect();
        assert_eq!(ids, [1, 3]);
        assert!(report
            .critical_segments
            .iter()
            .all(|s| s.reading.readiness_score < 50.0));
    }

    #[test]
    fn distance_ignores_segment_count() {
        let report = run(&[point(50.0, 0.0, 80.0)], RouteSettings::default()).unwrap();
        assert_eq!(report.segments.len(), 1);
        assert!((report.total_distance_km - 3.0).abs() < 0.01);
    }

    #[test]
    fn no_coverage_anywhere() {
        let result = run(&[point(10.0, 10.0, 80.0)], RouteSettings::default());
        assert_eq!(result.map(|r| r.segments), Err(AssessmentError::NoCoverage));
    }

    #[test]
    fn out_of_range_endpoint_is_invalid_route() {
        let ds = dataset(&[point(50.0, 0.0, 80.0)]);
        let result = assess_route(
            &ds,
            &RouteSettings::default(),
            start(),
            Point::new(0.0, 95.0),
            Utc::now(),
        );
        assert!(matches!(result, Err(AssessmentError::InvalidRoute(_))));
    }

    #[test]
    fn zero_length_route_is_invalid() {
        let ds = dataset(&[point(50.0, 0.0, 80.0)]);
        let result = assess_route(&ds, &RouteSettings::default(), start(), start(), Utc::now());
        assert!(matches!(result, Err(AssessmentError::InvalidRoute(_))));
    }

    #[test]
    fn route_id_uses_assessment_time() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T08:30:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let report = assess_route(
            &dataset(&full_coverage([80.0; 4])),
            &RouteSettings::default(),
            start(),
            end(),
            at,
        )
        .unwrap();
        assert_eq!(report.route_id, "route_20260301_083005");
    }

    #[test]
    fn compliant_route_gets_all_clear() {
        let report = run(&full_coverage([90.0; 4]), RouteSettings::default()).unwrap();
        assert_eq!(report.overall_risk_level, RiskLevel::Compliant);
        assert!(report.critical_segments.is_empty());
        assert_eq!(report.recommendations, [ALL_CLEAR]);
    }

    #[test]
    fn recommendations_follow_rule_order() {
        let settings = RouteSettings {
            upgrade_threshold: 2,
            ..RouteSettings::default()
        };
        let report = run(&full_coverage([40.0, 60.0, 55.0, 90.0]), settings).unwrap();
        assert_eq!(
            report.recommendations,
            [
                "Consider alternative routing around critical segments",
                "Infrastructure upgrades recommended for 3 segments",
            ]
        );
    }

    #[test]
    fn upgrade_rule_needs_count_above_threshold() {
        let settings = RouteSettings {
            upgrade_threshold: 3,
            ..RouteSettings::default()
        };
        let report = run(&full_coverage([60.0, 60.0, 60.0, 90.0]), settings).unwrap();
        assert_eq!(report.recommendations, [ALL_CLEAR]);
    }

    #[test]
    fn feature_rules_report_counts() {
        let mut points = full_coverage([90.0; 4]);
        for p in &mut points {
            p.detected_features = vec!["roundabout".into()];
            p.infrastructure_quality.lane_markings = 0.5;
        }
        points[2].detected_features.push("construction_zone".into());

        let report = run(&points, RouteSettings::default()).unwrap();
        assert_eq!(
            report.recommendations,
            [
                "Lane marking quality below threshold - consider alternative route or infrastructure upgrade",
                "4 roundabouts detected - ensure AV is validated for UK-style roundabouts",
                "1 construction zones - check for real-time updates before deployment",
            ]
        );
    }

    #[test]
    fn route_serializes_wire_fields() {
        let report = run(&full_coverage([80.0, 60.0, 40.0, 60.0]), RouteSettings::default()).unwrap();
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["overall_risk_level"], "MODERATE");
        assert_eq!(json["segments"][0]["segment_id"], 1);
        assert_eq!(json["segments"][0]["risk_level"], "COMPLIANT");
        assert_eq!(json["critical_segments"][0]["segment_id"], 3);
        assert_eq!(json["start"]["latitude"], 50.0);
        assert!(json["total_distance_km"].is_number());
    }
}
