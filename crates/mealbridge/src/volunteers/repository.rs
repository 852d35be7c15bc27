use crate::donations::domain::DonationId;
use crate::geo::GeoPoint;
use crate::identity::UserId;
use crate::ngos::domain::NgoId;
use crate::store::StoreError;

use super::domain::{Volunteer, VolunteerId};

/// Storage abstraction for volunteer records.
///
/// `mark_verified` and `append_assignment` are conditional single-record
/// updates; implementations apply each one atomically.
pub trait VolunteerRepository: Send + Sync {
    fn insert(&self, volunteer: Volunteer) -> Result<Volunteer, StoreError>;
    fn fetch(&self, id: &VolunteerId) -> Result<Option<Volunteer>, StoreError>;
    fn fetch_by_user(&self, user: &UserId) -> Result<Option<Volunteer>, StoreError>;
    fn all(&self) -> Result<Vec<Volunteer>, StoreError>;
    fn update_location(&self, id: &VolunteerId, location: GeoPoint) -> Result<Volunteer, StoreError>;
    /// Flips `is_verified` and records the verifying NGO in one write.
    fn mark_verified(&self, id: &VolunteerId, ngo: &NgoId) -> Result<Volunteer, StoreError>;
    /// Appends a donation id to the volunteer's assignment list;
    /// appending an id already present is a no-op.
    fn append_assignment(&self, user: &UserId, donation: &DonationId) -> Result<(), StoreError>;
}
