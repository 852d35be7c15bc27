use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::identity::UserId;
use crate::store::StoreError;
use crate::volunteers::domain::{Volunteer, VolunteerId};
use crate::volunteers::repository::VolunteerRepository;

use super::domain::{Ngo, NgoId, NgoRegistration};
use super::repository::NgoRepository;

static NGO_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_ngo_id() -> NgoId {
    let id = NGO_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NgoId(format!("ngo-{id:06}"))
}

/// Registration and volunteer oversight for NGOs.
pub struct NgoRegistry<N, V> {
    ngos: Arc<N>,
    volunteers: Arc<V>,
}

impl<N, V> NgoRegistry<N, V>
where
    N: NgoRepository + 'static,
    V: VolunteerRepository + 'static,
{
    pub fn new(ngos: Arc<N>, volunteers: Arc<V>) -> Self {
        Self { ngos, volunteers }
    }

    /// Register an NGO extension record for `user`. When no registration
    /// number is supplied, one is allocated from the store's counter and
    /// formatted as a zero-padded `NGO-` number.
    pub fn register(
        &self,
        user: UserId,
        registration: NgoRegistration,
    ) -> Result<Ngo, NgoRegistryError> {
        if registration.organization_name.trim().is_empty() {
            return Err(NgoRegistryError::MissingOrganizationName);
        }

        if self.ngos.fetch_by_user(&user)?.is_some() {
            return Err(NgoRegistryError::AlreadyRegistered(user));
        }

        let registration_number = match registration.registration_number {
            Some(number) if !number.trim().is_empty() => number,
            _ => {
                let seq = self.ngos.next_registration_seq()?;
                format!("NGO-{seq:06}")
            }
        };

        let now = Utc::now();
        let ngo = Ngo {
            id: next_ngo_id(),
            user_id: user,
            organization_name: registration.organization_name,
            registration_number,
            address: registration.address,
            contact_person: registration.contact_person,
            verified: false,
            donations_received: Vec::new(),
            delivery_partners: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        match self.ngos.insert(ngo) {
            Ok(stored) => Ok(stored),
            Err(StoreError::Conflict) => Err(NgoRegistryError::RegistrationNumberTaken),
            Err(other) => Err(other.into()),
        }
    }

    /// Verify a volunteer on behalf of `ngo`: flips the verification
    /// flag with the verifying NGO recorded, and adds the volunteer to
    /// the NGO's delivery partners. Both writes happen here, in the
    /// open, rather than through a storage hook.
    pub fn approve_volunteer(
        &self,
        ngo_id: &NgoId,
        volunteer_id: &VolunteerId,
    ) -> Result<Volunteer, NgoRegistryError> {
        let ngo = self
            .ngos
            .fetch(ngo_id)?
            .ok_or(NgoRegistryError::NgoNotFound)?;

        let volunteer = match self.volunteers.mark_verified(volunteer_id, &ngo.id) {
            Ok(volunteer) => volunteer,
            Err(StoreError::NotFound) => return Err(NgoRegistryError::VolunteerNotFound),
            Err(other) => return Err(other.into()),
        };

        self.ngos.append_delivery_partner(&ngo.id, volunteer_id)?;
        Ok(volunteer)
    }

    pub fn get(&self, id: &NgoId) -> Result<Ngo, NgoRegistryError> {
        self.ngos.fetch(id)?.ok_or(NgoRegistryError::NgoNotFound)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NgoRegistryError {
    #[error("organization name is required")]
    MissingOrganizationName,
    #[error("an NGO record already exists for user {0}")]
    AlreadyRegistered(UserId),
    #[error("registration number is already taken")]
    RegistrationNumberTaken,
    #[error("ngo not found")]
    NgoNotFound,
    #[error("volunteer not found")]
    VolunteerNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}
