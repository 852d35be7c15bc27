//! Donation lifecycle: creation with risk scoring, the
//! available/claimed/picked/expired state machine, geospatial volunteer
//! matching, assignment, and background expiry.

pub mod assignment;
pub mod domain;
pub mod matching;
pub mod repository;
pub mod router;
pub mod service;
pub mod sweeper;

#[cfg(test)]
mod tests;

pub use assignment::{Assignee, AssignmentCoordinator, AssignmentError};
pub use domain::{
    Donation, DonationId, DonationStatus, DonationSubmission, EnvironmentKind, ExpiryPrediction,
    FoodType, StorageKind,
};
pub use matching::{GeoMatcher, VolunteerFilter, VolunteerMatch};
pub use repository::{DonationRepository, NotificationSink, NotifyError, VolunteerNotification};
pub use router::{donation_router, DonationApi};
pub use service::{DonationService, DonationServiceError, ValidationError};
pub use sweeper::ExpirySweeper;
