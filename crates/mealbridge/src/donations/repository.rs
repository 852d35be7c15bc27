use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::store::StoreError;

use super::domain::{Donation, DonationId, DonationStatus};

/// Storage abstraction for donation records.
///
/// The conditional operations are the concurrency contract of the whole
/// system: claim/transition/sweep re-check state at write time inside
/// the store, so two racing writers observe a single linearized order
/// per donation id and exactly one of them wins.
pub trait DonationRepository: Send + Sync {
    fn insert(&self, donation: Donation) -> Result<Donation, StoreError>;
    fn fetch(&self, id: &DonationId) -> Result<Option<Donation>, StoreError>;
    fn list(&self, status: Option<DonationStatus>) -> Result<Vec<Donation>, StoreError>;
    fn list_by_donor(&self, donor: &UserId) -> Result<Vec<Donation>, StoreError>;
    fn list_claimed_by(&self, claimant: &UserId) -> Result<Vec<Donation>, StoreError>;

    /// Compare-and-set claim: succeeds only while the donation is still
    /// `available` with no claimant recorded. A donation that exists but
    /// is past that state yields [`StoreError::Conflict`], which callers
    /// surface distinctly from [`StoreError::NotFound`].
    fn claim_if_available(
        &self,
        id: &DonationId,
        claimant: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError>;

    /// Conditional status progression scoped to the current claimant:
    /// the lookup key is `(id, claimed_by = actor)`, so a donation held
    /// by someone else reads as absent rather than forbidden. Transition
    /// legality is re-checked under the same write.
    fn transition_by_claimant(
        &self,
        id: &DonationId,
        actor: &UserId,
        to: DonationStatus,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError>;

    /// Writes a new safe-hours value and its derived expiry timestamp as
    /// one update, so readers never observe the pair diverged.
    fn set_safe_hours(
        &self,
        id: &DonationId,
        safe_for_hours: f64,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError>;

    /// Bulk sweep: every donation with `expires_at <= now` still in
    /// `available` or `claimed` moves to `expired`. Idempotent; returns
    /// how many records changed.
    fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Outbound notification to a volunteer about a nearby donation.
/// Transport (mail, push) lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerNotification {
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
}

/// Fire-and-forget notification hook. Failures are logged by callers
/// and never roll back persisted donation state.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: VolunteerNotification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
