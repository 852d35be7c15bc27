//! Assignment of donations to volunteers.
//!
//! The coordinator is the only writer of `claimed_by` and of volunteer
//! assignment membership. The donation-side write is the store's
//! compare-and-set, so two racing claimants can never both succeed and
//! a sweep that lands first permanently wins.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::identity::UserId;
use crate::ngos::domain::NgoId;
use crate::store::StoreError;
use crate::volunteers::domain::Volunteer;
use crate::volunteers::repository::VolunteerRepository;

use super::domain::{Donation, DonationId};
use super::repository::DonationRepository;

/// The volunteer currently holding a donation.
#[derive(Debug, Clone, Serialize)]
pub struct Assignee {
    pub user: UserId,
    pub volunteer: Volunteer,
}

pub struct AssignmentCoordinator<D, V> {
    donations: Arc<D>,
    volunteers: Arc<V>,
}

impl<D, V> AssignmentCoordinator<D, V>
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
{
    pub fn new(donations: Arc<D>, volunteers: Arc<V>) -> Self {
        Self {
            donations,
            volunteers,
        }
    }

    /// A volunteer's unilateral claim on an `available` donation.
    ///
    /// Only verified volunteers may claim. The status check happens at
    /// write time inside the store, not at read time, so a donation
    /// that expired or was claimed in between yields a conflict.
    pub fn claim(
        &self,
        donation_id: &DonationId,
        volunteer_user: &UserId,
    ) -> Result<Donation, AssignmentError> {
        let volunteer = self
            .volunteers
            .fetch_by_user(volunteer_user)?
            .ok_or(AssignmentError::VolunteerNotFound)?;

        if !volunteer.is_verified {
            return Err(AssignmentError::NotVerified);
        }

        self.claim_checked(donation_id, &volunteer)
    }

    /// NGO-driven allocation: same atomicity as [`claim`], plus the
    /// target volunteer must have been verified by the assigning NGO.
    ///
    /// [`claim`]: Self::claim
    pub fn assign(
        &self,
        donation_id: &DonationId,
        volunteer_user: &UserId,
        assigning_ngo: &NgoId,
    ) -> Result<Donation, AssignmentError> {
        let volunteer = self
            .volunteers
            .fetch_by_user(volunteer_user)?
            .ok_or(AssignmentError::VolunteerNotFound)?;

        if !volunteer.verified_through(assigning_ngo) {
            return Err(AssignmentError::NotVerifiedByNgo {
                ngo: assigning_ngo.clone(),
            });
        }

        self.claim_checked(donation_id, &volunteer)
    }

    /// Current holder of a donation; `None` while unclaimed rather than
    /// an error.
    pub fn assignee(&self, donation_id: &DonationId) -> Result<Option<Assignee>, AssignmentError> {
        let donation = self
            .donations
            .fetch(donation_id)?
            .ok_or(AssignmentError::Store(StoreError::NotFound))?;

        let Some(user) = donation.claimed_by else {
            return Ok(None);
        };

        let volunteer = self
            .volunteers
            .fetch_by_user(&user)?
            .ok_or(AssignmentError::VolunteerNotFound)?;

        Ok(Some(Assignee { user, volunteer }))
    }

    fn claim_checked(
        &self,
        donation_id: &DonationId,
        volunteer: &Volunteer,
    ) -> Result<Donation, AssignmentError> {
        let donation =
            self.donations
                .claim_if_available(donation_id, &volunteer.user_id, Utc::now())?;

        // Second write of the pair, done explicitly here rather than by
        // a storage hook. Appending after the CAS means a lost race
        // never touches the volunteer record.
        self.volunteers
            .append_assignment(&volunteer.user_id, donation_id)?;

        info!(donation = %donation.id, volunteer = %volunteer.id, "donation claimed");
        Ok(donation)
    }
}

/// Error raised by the assignment coordinator.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("no volunteer record for that user")]
    VolunteerNotFound,
    #[error("volunteer is not verified")]
    NotVerified,
    #[error("volunteer is not verified by NGO {ngo}")]
    NotVerifiedByNgo { ngo: NgoId },
    #[error(transparent)]
    Store(#[from] StoreError),
}
