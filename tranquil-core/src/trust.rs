//! Device trust score fields.
//!
//! Scores are supplied from outside; nothing in this crate computes them.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Value every score starts at.
pub const DEFAULT_SCORE: f64 = 50.0;

/// Final score at or above which a device counts as highly trusted.
pub const HIGH_TRUST_THRESHOLD: f64 = 80.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// The five score fields of a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustScores {
    pub base_score: f64,
    pub behavior_score: f64,
    pub location_score: f64,
    pub time_score: f64,
    pub final_score: f64,
}

impl Default for TrustScores {
    fn default() -> Self {
        Self {
            base_score: DEFAULT_SCORE,
            behavior_score: DEFAULT_SCORE,
            location_score: DEFAULT_SCORE,
            time_score: DEFAULT_SCORE,
            final_score: DEFAULT_SCORE,
        }
    }
}

impl TrustScores {
    /// Reject any score outside 0-100 (NaN included).
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("base_score", self.base_score),
            ("behavior_score", self.behavior_score),
            ("location_score", self.location_score),
            ("time_score", self.time_score),
            ("final_score", self.final_score),
        ];

        for (field, value) in fields {
            if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(CoreError::ScoreOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Round every field to the two decimals the database keeps, then validate.
    pub fn normalized(&self) -> Result<Self> {
        let scores = Self {
            base_score: round_score(self.base_score),
            behavior_score: round_score(self.behavior_score),
            location_score: round_score(self.location_score),
            time_score: round_score(self.time_score),
            final_score: round_score(self.final_score),
        };
        scores.validate()?;
        Ok(scores)
    }

    pub fn is_high_trust(&self) -> bool {
        self.final_score >= HIGH_TRUST_THRESHOLD
    }
}

fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_fifty() {
        let scores = TrustScores::default();
        assert_eq!(scores.base_score, 50.0);
        assert_eq!(scores.final_score, 50.0);
        assert!(scores.validate().is_ok());
        assert!(!scores.is_high_trust());
    }

    #[test]
    fn test_validate_bounds() {
        let mut scores = TrustScores::default();
        scores.final_score = 100.0;
        scores.time_score = 0.0;
        assert!(scores.validate().is_ok());

        scores.location_score = 100.5;
        match scores.validate() {
            Err(CoreError::ScoreOutOfRange { field, .. }) => assert_eq!(field, "location_score"),
            other => panic!("expected ScoreOutOfRange, got {:?}", other),
        }

        scores.location_score = f64::NAN;
        assert!(scores.validate().is_err());
    }

    #[test]
    fn test_high_trust_threshold() {
        let mut scores = TrustScores::default();
        scores.final_score = 79.99;
        assert!(!scores.is_high_trust());
        scores.final_score = 80.0;
        assert!(scores.is_high_trust());
    }

    #[test]
    fn test_normalized_rounds_to_two_decimals() {
        let scores = TrustScores {
            final_score: 79.996,
            base_score: 12.344,
            ..TrustScores::default()
        };
        let normalized = scores.normalized().unwrap();
        assert_eq!(normalized.final_score, 80.0);
        assert_eq!(normalized.base_score, 12.34);
        assert!(normalized.is_high_trust());

        let over = TrustScores {
            time_score: 100.01,
            ..TrustScores::default()
        };
        assert!(over.normalized().is_err());

        let nan = TrustScores {
            behavior_score: f64::NAN,
            ..TrustScores::default()
        };
        assert!(nan.normalized().is_err());
    }
}
