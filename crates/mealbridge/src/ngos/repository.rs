use crate::identity::UserId;
use crate::store::StoreError;
use crate::volunteers::domain::VolunteerId;

use super::domain::{Ngo, NgoId};

/// Storage abstraction for NGO records.
pub trait NgoRepository: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the registration number
    /// is already taken.
    fn insert(&self, ngo: Ngo) -> Result<Ngo, StoreError>;
    fn fetch(&self, id: &NgoId) -> Result<Option<Ngo>, StoreError>;
    fn fetch_by_user(&self, user: &UserId) -> Result<Option<Ngo>, StoreError>;
    /// Allocates the next registration sequence number. Must be an
    /// atomic increment so concurrent registrations never collide.
    fn next_registration_seq(&self) -> Result<u64, StoreError>;
    fn append_delivery_partner(
        &self,
        id: &NgoId,
        volunteer: &VolunteerId,
    ) -> Result<(), StoreError>;
}
