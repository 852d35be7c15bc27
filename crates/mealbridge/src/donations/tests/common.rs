use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::MatchingConfig;
use crate::donations::assignment::AssignmentCoordinator;
use crate::donations::domain::{
    Donation, DonationId, DonationStatus, DonationSubmission, EnvironmentKind, ExpiryPrediction,
    FoodType, StorageKind,
};
use crate::donations::matching::GeoMatcher;
use crate::donations::repository::{
    DonationRepository, NotificationSink, NotifyError, VolunteerNotification,
};
use crate::donations::router::DonationApi;
use crate::donations::service::DonationService;
use crate::geo::GeoPoint;
use crate::identity::UserId;
use crate::ngos::domain::NgoId;
use crate::scoring::{FoodFeatures, PredictionError, RiskLevel, RiskPrediction, RiskScorer};
use crate::store::{InMemoryDonationStore, InMemoryVolunteerStore, StoreError};
use crate::volunteers::domain::{Availability, VehicleType, Volunteer, VolunteerId};

/// Kilometres per degree of latitude; good enough to place fixtures.
pub(super) const KM_PER_DEGREE: f64 = 111.19;

pub(super) fn origin() -> GeoPoint {
    GeoPoint::new(0.0, 0.0).expect("valid origin")
}

/// A point roughly `km` kilometres due north of `base`.
pub(super) fn km_north(base: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint::new(base.longitude, base.latitude + km / KM_PER_DEGREE).expect("valid offset point")
}

pub(super) fn submission() -> DonationSubmission {
    DonationSubmission {
        title: "Wedding buffet leftovers".to_string(),
        food_type: FoodType::CookedVeg,
        storage: StorageKind::Fridge,
        time_since_prep_hours: 2.0,
        is_sealed: true,
        environment: EnvironmentKind::Dry,
        confidence: 0.9,
        description: Some("Thirty covered trays".to_string()),
        coordinates: vec![0.0, 0.0],
    }
}

pub(super) fn volunteer_at(
    suffix: &str,
    location: GeoPoint,
    service_radius_km: f64,
    verified_by: Option<NgoId>,
) -> Volunteer {
    let now = Utc::now();
    Volunteer {
        id: VolunteerId(format!("vol-{suffix}")),
        user_id: UserId(format!("user-{suffix}")),
        availability: Availability::PartTime,
        vehicle_type: VehicleType::Bike,
        service_radius_km,
        location,
        is_verified: verified_by.is_some(),
        verified_by,
        assigned_donations: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn donation_at(
    suffix: &str,
    location: GeoPoint,
    status: DonationStatus,
    expires_at: DateTime<Utc>,
) -> Donation {
    let now = Utc::now();
    Donation {
        id: DonationId(format!("don-{suffix}")),
        donor: UserId(format!("donor-{suffix}")),
        title: format!("Donation {suffix}"),
        food_type: FoodType::CookedVeg,
        storage: StorageKind::Fridge,
        time_since_prep_hours: 2.0,
        is_sealed: true,
        environment: EnvironmentKind::Dry,
        description: None,
        location,
        prediction: ExpiryPrediction {
            safe_for_hours: 3.0,
            confidence: 0.9,
            risk_level: RiskLevel::Low,
        },
        expires_at,
        claimed_by: None,
        status,
        created_at: now,
        updated_at: now,
    }
}

/// Scorer returning a canned prediction, for deterministic pipelines.
pub(super) struct FixedScorer {
    pub(super) prediction: RiskPrediction,
}

impl FixedScorer {
    pub(super) fn new(risk_level: RiskLevel, safe_for_hours: f64) -> Self {
        Self {
            prediction: RiskPrediction {
                risk_level,
                safe_for_hours,
                confidence: 0.9,
            },
        }
    }
}

impl RiskScorer for FixedScorer {
    fn predict(&self, _features: &FoodFeatures) -> Result<RiskPrediction, PredictionError> {
        Ok(self.prediction.clone())
    }
}

/// Scorer whose model never loaded.
pub(super) struct FailingScorer;

impl RiskScorer for FailingScorer {
    fn predict(&self, _features: &FoodFeatures) -> Result<RiskPrediction, PredictionError> {
        Err(PredictionError::ModelNotLoaded)
    }
}

/// Sink recording every delivered notification.
#[derive(Default, Clone)]
pub(super) struct RecordingSink {
    events: Arc<Mutex<Vec<VolunteerNotification>>>,
}

impl RecordingSink {
    pub(super) fn events(&self) -> Vec<VolunteerNotification> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: VolunteerNotification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Sink whose transport is down.
pub(super) struct BrokenSink;

impl NotificationSink for BrokenSink {
    fn notify(&self, _notification: VolunteerNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

/// Store wrapper counting safe-hours writes, for asserting that
/// recomputes with an unchanged value touch nothing.
#[derive(Default, Clone)]
pub(super) struct CountingDonationStore {
    pub(super) inner: InMemoryDonationStore,
    safe_hours_writes: Arc<AtomicUsize>,
}

impl CountingDonationStore {
    pub(super) fn safe_hours_writes(&self) -> usize {
        self.safe_hours_writes.load(Ordering::SeqCst)
    }
}

impl DonationRepository for CountingDonationStore {
    fn insert(&self, donation: Donation) -> Result<Donation, StoreError> {
        self.inner.insert(donation)
    }

    fn fetch(&self, id: &DonationId) -> Result<Option<Donation>, StoreError> {
        self.inner.fetch(id)
    }

    fn list(&self, status: Option<DonationStatus>) -> Result<Vec<Donation>, StoreError> {
        self.inner.list(status)
    }

    fn list_by_donor(&self, donor: &UserId) -> Result<Vec<Donation>, StoreError> {
        self.inner.list_by_donor(donor)
    }

    fn list_claimed_by(&self, claimant: &UserId) -> Result<Vec<Donation>, StoreError> {
        self.inner.list_claimed_by(claimant)
    }

    fn claim_if_available(
        &self,
        id: &DonationId,
        claimant: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError> {
        self.inner.claim_if_available(id, claimant, now)
    }

    fn transition_by_claimant(
        &self,
        id: &DonationId,
        actor: &UserId,
        to: DonationStatus,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError> {
        self.inner.transition_by_claimant(id, actor, to, now)
    }

    fn set_safe_hours(
        &self,
        id: &DonationId,
        safe_for_hours: f64,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError> {
        self.safe_hours_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_safe_hours(id, safe_for_hours, expires_at, now)
    }

    fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.inner.expire_due(now)
    }
}

pub(super) type TestService<D, S, N> = DonationService<D, InMemoryVolunteerStore, S, N>;

pub(super) fn build_service<D, S, N>(
    donations: Arc<D>,
    volunteers: Arc<InMemoryVolunteerStore>,
    scorer: Arc<S>,
    sink: Arc<N>,
) -> TestService<D, S, N>
where
    D: DonationRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    DonationService::new(
        donations,
        volunteers,
        scorer,
        sink,
        MatchingConfig::default(),
        Duration::from_millis(500),
    )
}

pub(super) fn build_api<S>(
    donations: Arc<InMemoryDonationStore>,
    volunteers: Arc<InMemoryVolunteerStore>,
    scorer: Arc<S>,
    sink: Arc<RecordingSink>,
) -> Arc<DonationApi<InMemoryDonationStore, InMemoryVolunteerStore, S, RecordingSink>>
where
    S: RiskScorer + 'static,
{
    let service = build_service(
        donations.clone(),
        volunteers.clone(),
        scorer,
        sink,
    );
    let coordinator = AssignmentCoordinator::new(donations.clone(), volunteers.clone());
    let matcher = GeoMatcher::new(donations, volunteers, MatchingConfig::default());
    Arc::new(DonationApi {
        service,
        coordinator,
        matcher,
    })
}
