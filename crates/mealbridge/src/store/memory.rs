//! In-memory repository implementations.
//!
//! Each store serializes mutations behind a single mutex, which is what
//! makes the conditional updates (claim, claimant-scoped transition,
//! sweep) compare-and-set: the state check and the write happen under
//! one lock acquisition, so per-record operations are linearizable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::donations::domain::{Donation, DonationId, DonationStatus};
use crate::donations::repository::DonationRepository;
use crate::geo::GeoPoint;
use crate::identity::UserId;
use crate::ngos::domain::{Ngo, NgoId};
use crate::ngos::repository::NgoRepository;
use crate::volunteers::domain::{Volunteer, VolunteerId};
use crate::volunteers::repository::VolunteerRepository;

use super::StoreError;

#[derive(Default, Clone)]
pub struct InMemoryDonationStore {
    records: Arc<Mutex<HashMap<DonationId, Donation>>>,
}

impl InMemoryDonationStore {
    fn sorted(mut donations: Vec<Donation>) -> Vec<Donation> {
        donations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.0.cmp(&b.id.0)));
        donations
    }
}

impl DonationRepository for InMemoryDonationStore {
    fn insert(&self, donation: Donation) -> Result<Donation, StoreError> {
        let mut guard = self.records.lock().expect("donation store mutex poisoned");
        if guard.contains_key(&donation.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(donation.id.clone(), donation.clone());
        Ok(donation)
    }

    fn fetch(&self, id: &DonationId) -> Result<Option<Donation>, StoreError> {
        let guard = self.records.lock().expect("donation store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, status: Option<DonationStatus>) -> Result<Vec<Donation>, StoreError> {
        let guard = self.records.lock().expect("donation store mutex poisoned");
        let donations = guard
            .values()
            .filter(|donation| status.map_or(true, |wanted| donation.status == wanted))
            .cloned()
            .collect();
        Ok(Self::sorted(donations))
    }

    fn list_by_donor(&self, donor: &UserId) -> Result<Vec<Donation>, StoreError> {
        let guard = self.records.lock().expect("donation store mutex poisoned");
        let donations = guard
            .values()
            .filter(|donation| &donation.donor == donor)
            .cloned()
            .collect();
        Ok(Self::sorted(donations))
    }

    fn list_claimed_by(&self, claimant: &UserId) -> Result<Vec<Donation>, StoreError> {
        let guard = self.records.lock().expect("donation store mutex poisoned");
        let donations = guard
            .values()
            .filter(|donation| donation.claimed_by.as_ref() == Some(claimant))
            .cloned()
            .collect();
        Ok(Self::sorted(donations))
    }

    fn claim_if_available(
        &self,
        id: &DonationId,
        claimant: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError> {
        let mut guard = self.records.lock().expect("donation store mutex poisoned");
        let donation = guard.get_mut(id).ok_or(StoreError::NotFound)?;

        // State re-check at write time: an expired or already-claimed
        // donation loses the race here, never after it.
        if donation.status != DonationStatus::Available || donation.claimed_by.is_some() {
            return Err(StoreError::Conflict);
        }

        donation.claimed_by = Some(claimant.clone());
        donation.status = DonationStatus::Claimed;
        donation.updated_at = now;
        Ok(donation.clone())
    }

    fn transition_by_claimant(
        &self,
        id: &DonationId,
        actor: &UserId,
        to: DonationStatus,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError> {
        let mut guard = self.records.lock().expect("donation store mutex poisoned");
        let donation = guard.get_mut(id).ok_or(StoreError::NotFound)?;

        // Permission scope is part of the lookup: a donation held by
        // someone else is indistinguishable from a missing one.
        if donation.claimed_by.as_ref() != Some(actor) {
            return Err(StoreError::NotFound);
        }

        if !donation.status.allows_transition_to(to) {
            return Err(StoreError::Conflict);
        }

        donation.status = to;
        donation.updated_at = now;
        Ok(donation.clone())
    }

    fn set_safe_hours(
        &self,
        id: &DonationId,
        safe_for_hours: f64,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError> {
        let mut guard = self.records.lock().expect("donation store mutex poisoned");
        let donation = guard.get_mut(id).ok_or(StoreError::NotFound)?;

        // Single write keeps the prediction and its derived expiry
        // consistent for every reader.
        donation.prediction.safe_for_hours = safe_for_hours;
        donation.expires_at = expires_at;
        donation.updated_at = now;
        Ok(donation.clone())
    }

    fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("donation store mutex poisoned");
        let mut expired = 0;
        for donation in guard.values_mut() {
            let due = donation.expires_at <= now;
            let sweepable = matches!(
                donation.status,
                DonationStatus::Available | DonationStatus::Claimed
            );
            if due && sweepable {
                donation.status = DonationStatus::Expired;
                donation.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryVolunteerStore {
    records: Arc<Mutex<HashMap<VolunteerId, Volunteer>>>,
}

impl VolunteerRepository for InMemoryVolunteerStore {
    fn insert(&self, volunteer: Volunteer) -> Result<Volunteer, StoreError> {
        let mut guard = self.records.lock().expect("volunteer store mutex poisoned");
        if guard.contains_key(&volunteer.id) {
            return Err(StoreError::Conflict);
        }
        if guard.values().any(|v| v.user_id == volunteer.user_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(volunteer.id.clone(), volunteer.clone());
        Ok(volunteer)
    }

    fn fetch(&self, id: &VolunteerId) -> Result<Option<Volunteer>, StoreError> {
        let guard = self.records.lock().expect("volunteer store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_user(&self, user: &UserId) -> Result<Option<Volunteer>, StoreError> {
        let guard = self.records.lock().expect("volunteer store mutex poisoned");
        Ok(guard.values().find(|v| &v.user_id == user).cloned())
    }

    fn all(&self) -> Result<Vec<Volunteer>, StoreError> {
        let guard = self.records.lock().expect("volunteer store mutex poisoned");
        let mut volunteers: Vec<Volunteer> = guard.values().cloned().collect();
        volunteers.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(volunteers)
    }

    fn update_location(
        &self,
        id: &VolunteerId,
        location: GeoPoint,
    ) -> Result<Volunteer, StoreError> {
        let mut guard = self.records.lock().expect("volunteer store mutex poisoned");
        let volunteer = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        volunteer.location = location;
        volunteer.updated_at = Utc::now();
        Ok(volunteer.clone())
    }

    fn mark_verified(&self, id: &VolunteerId, ngo: &NgoId) -> Result<Volunteer, StoreError> {
        let mut guard = self.records.lock().expect("volunteer store mutex poisoned");
        let volunteer = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        volunteer.is_verified = true;
        volunteer.verified_by = Some(ngo.clone());
        volunteer.updated_at = Utc::now();
        Ok(volunteer.clone())
    }

    fn append_assignment(&self, user: &UserId, donation: &DonationId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("volunteer store mutex poisoned");
        let volunteer = guard
            .values_mut()
            .find(|v| &v.user_id == user)
            .ok_or(StoreError::NotFound)?;
        if !volunteer.assigned_donations.contains(donation) {
            volunteer.assigned_donations.push(donation.clone());
            volunteer.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryNgoStore {
    records: Arc<Mutex<HashMap<NgoId, Ngo>>>,
    registration_seq: Arc<AtomicU64>,
}

impl NgoRepository for InMemoryNgoStore {
    fn insert(&self, ngo: Ngo) -> Result<Ngo, StoreError> {
        let mut guard = self.records.lock().expect("ngo store mutex poisoned");
        let taken = guard.values().any(|existing| {
            existing.registration_number == ngo.registration_number
                || existing.user_id == ngo.user_id
        });
        if taken || guard.contains_key(&ngo.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(ngo.id.clone(), ngo.clone());
        Ok(ngo)
    }

    fn fetch(&self, id: &NgoId) -> Result<Option<Ngo>, StoreError> {
        let guard = self.records.lock().expect("ngo store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_user(&self, user: &UserId) -> Result<Option<Ngo>, StoreError> {
        let guard = self.records.lock().expect("ngo store mutex poisoned");
        Ok(guard.values().find(|ngo| &ngo.user_id == user).cloned())
    }

    fn next_registration_seq(&self) -> Result<u64, StoreError> {
        // Atomic increment so concurrent registrations never share a
        // number.
        Ok(self.registration_seq.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn append_delivery_partner(
        &self,
        id: &NgoId,
        volunteer: &VolunteerId,
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("ngo store mutex poisoned");
        let ngo = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if !ngo.delivery_partners.contains(volunteer) {
            ngo.delivery_partners.push(volunteer.clone());
            ngo.updated_at = Utc::now();
        }
        Ok(())
    }
}
