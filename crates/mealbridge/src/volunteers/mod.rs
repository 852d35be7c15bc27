//! Volunteer directory: profiles, verification state, and the
//! append-only list of donations each volunteer has been matched to.

pub mod domain;
pub mod registry;
pub mod repository;

pub use domain::{Availability, VehicleType, Volunteer, VolunteerId, VolunteerProfile};
pub use registry::{VolunteerRegistry, VolunteerRegistryError};
pub use repository::VolunteerRepository;
