//! Device trust score entity
//!
//! Stored as NUMERIC(5,2) and read back as float8.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tranquil_core::TrustScores;
use utoipa::ToSchema;
use uuid::Uuid;

/// Trust score row, one per device
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DeviceTrustScore {
    #[schema(value_type = String)]
    pub device_id: Uuid,
    #[schema(example = 50.0)]
    pub base_score: f64,
    #[schema(example = 50.0)]
    pub behavior_score: f64,
    #[schema(example = 50.0)]
    pub location_score: f64,
    #[schema(example = 50.0)]
    pub time_score: f64,
    #[schema(example = 50.0)]
    pub final_score: f64,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl DeviceTrustScore {
    /// Default row created alongside a device.
    pub fn initial(device_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::from_scores(device_id, &TrustScores::default(), now)
    }

    pub fn from_scores(device_id: Uuid, scores: &TrustScores, now: DateTime<Utc>) -> Self {
        Self {
            device_id,
            base_score: scores.base_score,
            behavior_score: scores.behavior_score,
            location_score: scores.location_score,
            time_score: scores.time_score,
            final_score: scores.final_score,
            updated_at: now,
        }
    }

    pub fn scores(&self) -> TrustScores {
        TrustScores {
            base_score: self.base_score,
            behavior_score: self.behavior_score,
            location_score: self.location_score,
            time_score: self.time_score,
            final_score: self.final_score,
        }
    }

    pub fn is_high_trust(&self) -> bool {
        self.scores().is_high_trust()
    }
}
