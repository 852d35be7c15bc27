use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::GeoPoint;
use crate::identity::UserId;
use crate::scoring::RiskLevel;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonationId(pub String);

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodType {
    CookedVeg,
    NonVeg,
    Packaged,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Fridge,
    RoomTemp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    Dry,
    Humid,
}

/// Lifecycle states. `available → claimed → picked`, with `expired`
/// reachable from `available` and `claimed`; `picked` and `expired` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Available,
    Claimed,
    Picked,
    Expired,
}

impl DonationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Claimed => "claimed",
            Self::Picked => "picked",
            Self::Expired => "expired",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Picked | Self::Expired)
    }

    /// Legality of a transition, independent of who requests it. Actor
    /// guards (claimant identity, verification) sit at the write path.
    pub fn allows_transition_to(self, to: DonationStatus) -> bool {
        matches!(
            (self, to),
            (Self::Available, Self::Claimed)
                | (Self::Available, Self::Expired)
                | (Self::Claimed, Self::Picked)
                | (Self::Claimed, Self::Expired)
        )
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The scorer's verdict, captured once at creation and never
/// user-editable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryPrediction {
    pub safe_for_hours: f64,
    pub confidence: f64,
    pub risk_level: RiskLevel,
}

/// A posted food item awaiting pickup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub donor: UserId,
    pub title: String,
    pub food_type: FoodType,
    pub storage: StorageKind,
    pub time_since_prep_hours: f64,
    pub is_sealed: bool,
    pub environment: EnvironmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: GeoPoint,
    pub prediction: ExpiryPrediction,
    /// Always `created_at + prediction.safe_for_hours`; every write
    /// path keeps the pair consistent.
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<UserId>,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    /// Derives the expiry timestamp for a safe-hours window anchored at
    /// the creation instant, never at "now".
    pub fn expiry_from(created_at: DateTime<Utc>, safe_for_hours: f64) -> DateTime<Utc> {
        created_at + Duration::milliseconds((safe_for_hours * 3_600_000.0).round() as i64)
    }

    /// Hours left before expiry, rounded to one decimal place and
    /// clamped at zero. Pure function of stored state and `now`.
    pub fn remaining_hours(&self, now: DateTime<Utc>) -> f64 {
        let millis = (self.expires_at - now).num_milliseconds();
        if millis <= 0 {
            return 0.0;
        }
        let hours = millis as f64 / 3_600_000.0;
        (hours * 10.0).round() / 10.0
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The record-level invariant: a claimant is recorded exactly while
    /// the donation is claimed or picked, except that expiry may strike
    /// with or without a claimant in place.
    pub fn claimant_consistent(&self) -> bool {
        match self.status {
            DonationStatus::Available => self.claimed_by.is_none(),
            DonationStatus::Claimed | DonationStatus::Picked => self.claimed_by.is_some(),
            DonationStatus::Expired => true,
        }
    }

    pub fn features(&self) -> crate::scoring::FoodFeatures {
        crate::scoring::FoodFeatures {
            food_type: self.food_type,
            storage: self.storage,
            time_since_prep_hours: self.time_since_prep_hours,
            is_sealed: self.is_sealed,
            environment: self.environment,
            confidence: self.prediction.confidence,
        }
    }
}

/// A donor's submission as it arrives over the wire. Coordinates stay a
/// raw vector until validated into a [`GeoPoint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationSubmission {
    pub title: String,
    pub food_type: FoodType,
    pub storage: StorageKind,
    pub time_since_prep_hours: f64,
    pub is_sealed: bool,
    pub environment: EnvironmentKind,
    pub confidence: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub coordinates: Vec<f64>,
}
