//! NGO directory: registration with sequential registration numbers,
//! and volunteer verification.

pub mod domain;
pub mod registry;
pub mod repository;

pub use domain::{Address, ContactPerson, Ngo, NgoId, NgoRegistration};
pub use registry::{NgoRegistry, NgoRegistryError};
pub use repository::NgoRepository;
