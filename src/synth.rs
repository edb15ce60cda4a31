//! Seeded synthetic survey over the reference UK freight corridors.
//!
//! Used when no survey file is configured. Scores follow the feature-weight
//! model: a base score by road class, minus 20 × the summed feature weights,
//! clamped to `[0, 100]`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::assess::round_to;
use crate::grid::{InfrastructureQuality, SurveyPoint};

const SCORE_WEIGHT_SCALE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoadClass {
    Motorway,
    Urban,
}

struct Corridor {
    name: &'static str,
    start: (f64, f64),
    end: (f64, f64),
    distance_km: f64,
    road_types: &'static [RoadClass],
}

impl Corridor {
    /// Any motorway stretch puts the whole corridor on the motorway profile.
    fn class(&self) -> RoadClass {
        if self.road_types.contains(&RoadClass::Motorway) {
            RoadClass::Motorway
        } else {
            RoadClass::Urban
        }
    }
}

const CORRIDORS: &[Corridor] = &[
    Corridor {
        name: "Dover to Milton Keynes (M2/M25/M1)",
        start: (51.1279, 1.3134),
        end: (52.0406, -0.7594),
        distance_km: 189.0,
        road_types: &[RoadClass::Motorway],
    },
    Corridor {
        name: "London to Birmingham (M1)",
        start: (51.5074, -0.1278),
        end: (52.4862, -1.8904),
        distance_km: 193.0,
        road_types: &[RoadClass::Motorway, RoadClass::Urban],
    },
    Corridor {
        name: "Manchester to Leeds (M62)",
        start: (53.4808, -2.2426),
        end: (53.8008, -1.5491),
        distance_km: 64.0,
        road_types: &[RoadClass::Motorway],
    },
];

/// Positive weight lowers the score, negative raises it.
fn feature_weight(tag: &str) -> f64 {
    match tag {
        "construction_zone" => 0.85,
        "foggy" => 0.80,
        "obscured_signage" => 0.75,
        "roundabout" => 0.70,
        "junction" => 0.68,
        "lane_merge" => 0.65,
        "no_hard_shoulder" => 0.60,
        "pedestrian_crossing" => 0.55,
        "curve" => 0.50,
        "tunnel" => 0.45,
        "urban" => 0.40,
        "residential" => 0.35,
        "motorway_signage" => -0.20,
        "hard_shoulder" => -0.25,
        "multiple_lanes" => -0.30,
        _ => 0.0,
    }
}

/// `(tag, probability)` pairs rolled independently per point.
fn feature_odds(class: RoadClass) -> &'static [(&'static str, f64)] {
    match class {
        RoadClass::Motorway => &[
            ("multiple_lanes", 0.30),
            ("hard_shoulder", 0.20),
            ("construction_zone", 0.05),
            ("junction", 0.08),
        ],
        RoadClass::Urban => &[
            ("urban", 0.40),
            ("pedestrian_crossing", 0.30),
            ("roundabout", 0.15),
            ("junction", 0.08),
        ],
    }
}

fn survey_point(rng: &mut ChaCha8Rng, corridor: &Corridor, progress: f64) -> SurveyPoint {
    let latitude = corridor.start.0 + (corridor.end.0 - corridor.start.0) * progress;
    let longitude = corridor.start.1 + (corridor.end.1 - corridor.start.1) * progress;

    let class = corridor.class();
    let base = match class {
        RoadClass::Motorway => rng.gen_range(70.0..90.0),
        RoadClass::Urban => rng.gen_range(50.0..75.0),
    };

    let mut detected_features = Vec::new();
    let mut adjustment = 0.0;
    for &(tag, odds) in feature_odds(class) {
        if rng.gen_bool(odds) {
            detected_features.push(tag.to_string());
            adjustment += feature_weight(tag);
        }
    }

    let score = (base - adjustment * SCORE_WEIGHT_SCALE).clamp(0.0, 100.0);

    SurveyPoint {
        latitude: round_to(latitude, 6),
        longitude: round_to(longitude, 6),
        readiness_score: round_to(score, 1),
        detected_features,
        infrastructure_quality: InfrastructureQuality {
            lane_markings: round_to(rng.gen_range(0.4..0.95), 2),
            signage_visibility: round_to(rng.gen_range(0.6..1.0), 2),
            surface_condition: round_to(rng.gen_range(0.5..0.9), 2),
        },
        weather_impact: round_to(rng.gen_range(0.0..0.3), 2),
    }
}

/// Survey every corridor at `points_per_km`; identical seeds give identical output.
pub fn generate_survey(seed: u64, points_per_km: u32) -> Vec<SurveyPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut points = Vec::new();

    for corridor in CORRIDORS {
        let count = (corridor.distance_km * f64::from(points_per_km)) as usize;
        for i in 0..count {
            points.push(survey_point(&mut rng, corridor, i as f64 / count as f64));
        }
        tracing::debug!(corridor = corridor.name, points = count, "corridor surveyed");
    }

    points
}
