use serde::{Deserialize, Serialize};

pub const COMPLIANT_MIN_SCORE: f64 = 75.0;
pub const MODERATE_MIN_SCORE: f64 = 50.0;

/// AV-readiness band: `[75, 100]` compliant, `[50, 75)` moderate, below 50 critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Compliant,
    Moderate,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Compliant, RiskLevel::Moderate, RiskLevel::Critical];

    pub fn from_score(score: f64) -> Self {
        if score >= COMPLIANT_MIN_SCORE {
            RiskLevel::Compliant
        } else if score >= MODERATE_MIN_SCORE {
            RiskLevel::Moderate
        } else {
            RiskLevel::Critical
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskLevel::Compliant => "green",
            RiskLevel::Moderate => "yellow",
            RiskLevel::Critical => "red",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Compliant => write!(f, "COMPLIANT"),
            RiskLevel::Moderate => write!(f, "MODERATE"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::Compliant);
        assert_eq!(RiskLevel::from_score(75.0), RiskLevel::Compliant);
        assert_eq!(RiskLevel::from_score(74.999), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(49.999), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Critical);
    }

    #[test]
    fn every_score_maps_to_exactly_one_band() {
        for tenth in 0..=1000 {
            let score = f64::from(tenth) / 10.0;
            let level = RiskLevel::from_score(score);
            let expected = if score >= 75.0 {
                RiskLevel::Compliant
            } else if score >= 50.0 {
                RiskLevel::Moderate
            } else {
                RiskLevel::Critical
            };
            assert_eq!(level, expected, "score {score}");
        }
    }

    #[test]
    fn wire_literals() {
        assert_eq!(serde_json::to_string(&RiskLevel::Compliant).unwrap(), "\"COMPLIANT\"");
        assert_eq!(serde_json::to_string(&RiskLevel::Moderate).unwrap(), "\"MODERATE\"");
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"CRITICAL\"");
        assert_eq!(RiskLevel::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn colors() {
        assert_eq!(RiskLevel::Compliant.color(), "green");
        assert_eq!(RiskLevel::Moderate.color(), "yellow");
        assert_eq!(RiskLevel::Critical.color(), "red");
    }
}
