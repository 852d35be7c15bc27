//! Risk scoring seam.
//!
//! The scorer is an external collaborator: given a food-item feature
//! vector it returns a coarse spoilage risk level and a predicted safe
//! consumption window in hours. The core only loads-before-calling and
//! treats any failure as a hard error of the surrounding operation; it
//! never inspects model internals.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::donations::domain::{EnvironmentKind, FoodType, StorageKind};

/// Coarse spoilage-risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Feature vector handed to the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodFeatures {
    pub food_type: FoodType,
    pub storage: StorageKind,
    pub time_since_prep_hours: f64,
    pub is_sealed: bool,
    pub environment: EnvironmentKind,
    pub confidence: f64,
}

/// Output of a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub risk_level: RiskLevel,
    pub safe_for_hours: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PredictionError {
    #[error("risk model is not loaded")]
    ModelNotLoaded,
    #[error("risk model produced no usable prediction")]
    Unusable,
    #[error("risk prediction timed out after {0:?}")]
    Timeout(Duration),
    #[error("risk prediction task failed: {0}")]
    Worker(String),
}

/// Opaque scoring function. Implementations own their loaded model
/// handle; construction is the load step.
pub trait RiskScorer: Send + Sync {
    fn predict(&self, features: &FoodFeatures) -> Result<RiskPrediction, PredictionError>;
}

/// Bundled scorer reproducing the rule table the production classifier
/// was trained against. Serves as the default implementation and keeps
/// the pipeline deterministic in tests; a real ONNX-backed scorer slots
/// in behind the same trait.
#[derive(Debug, Clone)]
pub struct RuleBasedScorer {
    weights: RiskWeights,
}

#[derive(Debug, Clone)]
struct RiskWeights {
    unsealed: u8,
    prep_over_12h: u8,
    prep_over_24h: u8,
    room_temp: u8,
    non_veg: u8,
    raw: u8,
    humid: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            unsealed: 1,
            prep_over_12h: 1,
            prep_over_24h: 2,
            room_temp: 1,
            non_veg: 1,
            raw: 2,
            humid: 1,
        }
    }
}

impl RuleBasedScorer {
    /// One-time load step; the returned handle is read-only and safe to
    /// share process-wide behind an `Arc`.
    pub fn load() -> Self {
        Self {
            weights: RiskWeights::default(),
        }
    }

    fn risk_score(&self, features: &FoodFeatures) -> u8 {
        let w = &self.weights;
        let mut score = 0;
        if !features.is_sealed {
            score += w.unsealed;
        }
        if features.time_since_prep_hours > 24.0 {
            score += w.prep_over_24h;
        } else if features.time_since_prep_hours > 12.0 {
            score += w.prep_over_12h;
        }
        if features.storage == StorageKind::RoomTemp {
            score += w.room_temp;
        }
        match features.food_type {
            FoodType::NonVeg => score += w.non_veg,
            FoodType::Raw => score += w.raw,
            FoodType::CookedVeg | FoodType::Packaged => {}
        }
        if features.environment == EnvironmentKind::Humid {
            score += w.humid;
        }
        score
    }

    /// Deterministic shelf-life estimate standing in for the regression
    /// model: a base window per food type, stretched by cold storage and
    /// sealing, shrunk by humidity, minus the time already elapsed.
    fn safe_hours(&self, features: &FoodFeatures) -> f64 {
        let base = match features.food_type {
            FoodType::CookedVeg => 12.0,
            FoodType::NonVeg => 8.0,
            FoodType::Packaged => 48.0,
            FoodType::Raw => 24.0,
        };
        let storage_factor = match features.storage {
            StorageKind::Fridge => 2.0,
            StorageKind::RoomTemp => 1.0,
        };
        let seal_factor = if features.is_sealed { 1.25 } else { 1.0 };
        let environment_factor = match features.environment {
            EnvironmentKind::Dry => 1.0,
            EnvironmentKind::Humid => 0.75,
        };

        let window = base * storage_factor * seal_factor * environment_factor
            - features.time_since_prep_hours;
        let clamped = window.max(1.0);
        (clamped * 10.0).round() / 10.0
    }
}

impl RiskScorer for RuleBasedScorer {
    fn predict(&self, features: &FoodFeatures) -> Result<RiskPrediction, PredictionError> {
        if !features.time_since_prep_hours.is_finite() || features.time_since_prep_hours < 0.0 {
            return Err(PredictionError::Unusable);
        }

        let risk_level = match self.risk_score(features) {
            0..=2 => RiskLevel::Low,
            3..=4 => RiskLevel::Medium,
            _ => RiskLevel::High,
        };

        Ok(RiskPrediction {
            risk_level,
            safe_for_hours: self.safe_hours(features),
            confidence: features.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FoodFeatures {
        FoodFeatures {
            food_type: FoodType::Packaged,
            storage: StorageKind::Fridge,
            time_since_prep_hours: 2.0,
            is_sealed: true,
            environment: EnvironmentKind::Dry,
            confidence: 0.9,
        }
    }

    #[test]
    fn sealed_refrigerated_packaged_food_is_low_risk() {
        let scorer = RuleBasedScorer::load();
        let prediction = scorer.predict(&features()).expect("prediction");
        assert_eq!(prediction.risk_level, RiskLevel::Low);
        assert!(prediction.safe_for_hours > 24.0);
        assert_eq!(prediction.confidence, 0.9);
    }

    #[test]
    fn stale_unsealed_raw_food_in_humid_room_is_high_risk() {
        let scorer = RuleBasedScorer::load();
        let prediction = scorer
            .predict(&FoodFeatures {
                food_type: FoodType::Raw,
                storage: StorageKind::RoomTemp,
                time_since_prep_hours: 26.0,
                is_sealed: false,
                environment: EnvironmentKind::Humid,
                confidence: 0.8,
            })
            .expect("prediction");
        assert_eq!(prediction.risk_level, RiskLevel::High);
    }

    #[test]
    fn prep_time_over_twelve_hours_bumps_risk_one_notch() {
        let scorer = RuleBasedScorer::load();
        let fresh = scorer.predict(&features()).expect("prediction");

        let mut older = features();
        older.food_type = FoodType::NonVeg;
        older.storage = StorageKind::RoomTemp;
        older.time_since_prep_hours = 13.0;
        let stale = scorer.predict(&older).expect("prediction");

        assert_eq!(fresh.risk_level, RiskLevel::Low);
        assert_eq!(stale.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn safe_hours_never_drop_below_one() {
        let scorer = RuleBasedScorer::load();
        let mut tired = features();
        tired.food_type = FoodType::NonVeg;
        tired.storage = StorageKind::RoomTemp;
        tired.is_sealed = false;
        tired.time_since_prep_hours = 30.0;
        let prediction = scorer.predict(&tired).expect("prediction");
        assert!(prediction.safe_for_hours >= 1.0);
    }

    #[test]
    fn negative_prep_time_is_unusable() {
        let scorer = RuleBasedScorer::load();
        let mut bad = features();
        bad.time_since_prep_hours = -1.0;
        assert!(matches!(
            scorer.predict(&bad),
            Err(PredictionError::Unusable)
        ));
    }
}
