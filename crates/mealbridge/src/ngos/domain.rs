use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::donations::domain::DonationId;
use crate::identity::UserId;
use crate::volunteers::domain::VolunteerId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NgoId(pub String);

impl fmt::Display for NgoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPerson {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Registration payload. `registration_number` is optional; when absent
/// one is allocated from the store's atomic counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgoRegistration {
    pub organization_name: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    pub address: Address,
    pub contact_person: ContactPerson,
}

/// An NGO extension record, 1:1 with a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ngo {
    pub id: NgoId,
    pub user_id: UserId,
    pub organization_name: String,
    /// Unique; auto-assigned sequentially when not supplied.
    pub registration_number: String,
    pub address: Address,
    pub contact_person: ContactPerson,
    pub verified: bool,
    pub donations_received: Vec<DonationId>,
    pub delivery_partners: Vec<VolunteerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
