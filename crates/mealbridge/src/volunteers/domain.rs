use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::donations::domain::DonationId;
use crate::geo::GeoPoint;
use crate::identity::UserId;
use crate::ngos::domain::NgoId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolunteerId(pub String);

impl fmt::Display for VolunteerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    FullTime,
    PartTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Bike,
    Car,
    None,
}

/// Registration payload: everything the volunteer chooses about
/// themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerProfile {
    pub availability: Availability,
    pub vehicle_type: VehicleType,
    pub service_radius_km: f64,
    pub location: GeoPoint,
}

/// A volunteer extension record, 1:1 with a user account.
///
/// `assigned_donations` is append-only from this crate's perspective;
/// the assignment coordinator is its only writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: VolunteerId,
    pub user_id: UserId,
    pub availability: Availability,
    pub vehicle_type: VehicleType,
    pub service_radius_km: f64,
    pub location: GeoPoint,
    pub is_verified: bool,
    pub verified_by: Option<NgoId>,
    pub assigned_donations: Vec<DonationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Volunteer {
    /// True when an NGO-driven assignment through `ngo` is permitted.
    pub fn verified_through(&self, ngo: &NgoId) -> bool {
        self.is_verified && self.verified_by.as_ref() == Some(ngo)
    }
}
