use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::geo::GeoPoint;
use crate::identity::UserId;
use crate::store::StoreError;

use super::domain::{Volunteer, VolunteerId, VolunteerProfile};
use super::repository::VolunteerRepository;

static VOLUNTEER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_volunteer_id() -> VolunteerId {
    let id = VOLUNTEER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VolunteerId(format!("vol-{id:06}"))
}

/// Registration and profile maintenance for volunteers. Verification is
/// NGO-driven and lives in the NGO registry; claims live in the
/// assignment coordinator.
pub struct VolunteerRegistry<V> {
    volunteers: Arc<V>,
}

impl<V> VolunteerRegistry<V>
where
    V: VolunteerRepository + 'static,
{
    pub fn new(volunteers: Arc<V>) -> Self {
        Self { volunteers }
    }

    /// Register a volunteer extension record for `user`. One volunteer
    /// record per user account; unverified until an NGO approves.
    pub fn register(
        &self,
        user: UserId,
        profile: VolunteerProfile,
    ) -> Result<Volunteer, VolunteerRegistryError> {
        if !profile.service_radius_km.is_finite() || profile.service_radius_km <= 0.0 {
            return Err(VolunteerRegistryError::InvalidServiceRadius(
                profile.service_radius_km,
            ));
        }

        if self.volunteers.fetch_by_user(&user)?.is_some() {
            return Err(VolunteerRegistryError::AlreadyRegistered(user));
        }

        let now = Utc::now();
        let volunteer = Volunteer {
            id: next_volunteer_id(),
            user_id: user,
            availability: profile.availability,
            vehicle_type: profile.vehicle_type,
            service_radius_km: profile.service_radius_km,
            location: profile.location,
            is_verified: false,
            verified_by: None,
            assigned_donations: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        Ok(self.volunteers.insert(volunteer)?)
    }

    /// Volunteers move; their service radius stays put.
    pub fn update_location(
        &self,
        id: &VolunteerId,
        location: GeoPoint,
    ) -> Result<Volunteer, VolunteerRegistryError> {
        Ok(self.volunteers.update_location(id, location)?)
    }

    pub fn get(&self, id: &VolunteerId) -> Result<Volunteer, VolunteerRegistryError> {
        self.volunteers
            .fetch(id)?
            .ok_or(VolunteerRegistryError::NotFound)
    }

    pub fn get_by_user(&self, user: &UserId) -> Result<Volunteer, VolunteerRegistryError> {
        self.volunteers
            .fetch_by_user(user)?
            .ok_or(VolunteerRegistryError::NotFound)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VolunteerRegistryError {
    #[error("service radius must be a positive number of kilometres, got {0}")]
    InvalidServiceRadius(f64),
    #[error("a volunteer record already exists for user {0}")]
    AlreadyRegistered(UserId),
    #[error("volunteer not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}
