use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::MatchingConfig;
use crate::geo::{GeoError, GeoPoint};
use crate::identity::UserId;
use crate::scoring::{FoodFeatures, PredictionError, RiskLevel, RiskScorer};
use crate::store::StoreError;
use crate::volunteers::repository::VolunteerRepository;

use super::domain::{Donation, DonationId, DonationStatus, DonationSubmission, ExpiryPrediction};
use super::matching::{find_volunteers_near, VolunteerFilter};
use super::repository::{DonationRepository, NotificationSink, VolunteerNotification};

static DONATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_donation_id() -> DonationId {
    let id = DONATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DonationId(format!("don-{id:06}"))
}

/// Service owning the donation lifecycle: validated creation with risk
/// scoring, expiry derivation, and claimant-scoped status progression.
///
/// The scorer handle is loaded once at startup and injected; the
/// notification sink is fire-and-forget.
pub struct DonationService<D, V, S, N> {
    donations: Arc<D>,
    volunteers: Arc<V>,
    scorer: Arc<S>,
    notifications: Arc<N>,
    matching: MatchingConfig,
    predict_timeout: Duration,
}

impl<D, V, S, N> DonationService<D, V, S, N>
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        donations: Arc<D>,
        volunteers: Arc<V>,
        scorer: Arc<S>,
        notifications: Arc<N>,
        matching: MatchingConfig,
        predict_timeout: Duration,
    ) -> Self {
        Self {
            donations,
            volunteers,
            scorer,
            notifications,
            matching,
            predict_timeout,
        }
    }

    /// Create a donation from a donor submission.
    ///
    /// The risk prediction happens before anything is persisted; a
    /// scorer failure or timeout fails the whole operation so no
    /// partial record exists. High-risk items trigger an immediate
    /// match against verified volunteers around the drop point, each of
    /// whom is notified once.
    pub async fn create(
        &self,
        donor: UserId,
        submission: DonationSubmission,
    ) -> Result<Donation, DonationServiceError> {
        let (location, features) = validate_submission(&submission)?;
        let prediction = self.predict(features).await?;

        let now = Utc::now();
        let donation = Donation {
            id: next_donation_id(),
            donor,
            title: submission.title.trim().to_string(),
            food_type: submission.food_type,
            storage: submission.storage,
            time_since_prep_hours: submission.time_since_prep_hours,
            is_sealed: submission.is_sealed,
            environment: submission.environment,
            description: submission.description,
            location,
            prediction: ExpiryPrediction {
                safe_for_hours: prediction.safe_for_hours,
                confidence: prediction.confidence,
                risk_level: prediction.risk_level,
            },
            expires_at: Donation::expiry_from(now, prediction.safe_for_hours),
            claimed_by: None,
            status: DonationStatus::Available,
            created_at: now,
            updated_at: now,
        };

        let stored = self.donations.insert(donation)?;

        if stored.prediction.risk_level == RiskLevel::High {
            self.alert_nearby_volunteers(&stored);
        }

        Ok(stored)
    }

    /// Recompute `expires_at` after a safe-hours change, anchored at the
    /// donation's original creation instant. A value equal to the stored
    /// one writes nothing, so repeated recomputes cause no update churn.
    pub fn recompute_expiry(
        &self,
        id: &DonationId,
        new_safe_for_hours: f64,
    ) -> Result<Donation, DonationServiceError> {
        if !new_safe_for_hours.is_finite() || new_safe_for_hours < 0.0 {
            return Err(PredictionError::Unusable.into());
        }

        let donation = self.donations.fetch(id)?.ok_or(StoreError::NotFound)?;

        if donation.prediction.safe_for_hours == new_safe_for_hours {
            return Ok(donation);
        }

        let expires_at = Donation::expiry_from(donation.created_at, new_safe_for_hours);
        let updated =
            self.donations
                .set_safe_hours(id, new_safe_for_hours, expires_at, Utc::now())?;
        Ok(updated)
    }

    /// Run the scorer again over a stored donation's features and fold
    /// any changed safe-hours value back into its expiry.
    pub async fn rescore(&self, id: &DonationId) -> Result<Donation, DonationServiceError> {
        let donation = self.donations.fetch(id)?.ok_or(StoreError::NotFound)?;
        let prediction = self.predict(donation.features()).await?;
        self.recompute_expiry(id, prediction.safe_for_hours)
    }

    /// Hours left before expiry at `now`, clamped at zero.
    pub fn remaining_hours(
        &self,
        id: &DonationId,
        now: DateTime<Utc>,
    ) -> Result<f64, DonationServiceError> {
        let donation = self.donations.fetch(id)?.ok_or(StoreError::NotFound)?;
        Ok(donation.remaining_hours(now))
    }

    /// Claimant-scoped status progression (`claimed → picked`,
    /// `claimed → expired`). A donation the actor does not hold reads as
    /// absent; an illegal transition is a conflict.
    pub fn update_status(
        &self,
        id: &DonationId,
        actor: &UserId,
        to: DonationStatus,
    ) -> Result<Donation, DonationServiceError> {
        let updated = self
            .donations
            .transition_by_claimant(id, actor, to, Utc::now())?;
        Ok(updated)
    }

    pub fn get(&self, id: &DonationId) -> Result<Donation, DonationServiceError> {
        Ok(self.donations.fetch(id)?.ok_or(StoreError::NotFound)?)
    }

    pub fn list(&self, status: Option<DonationStatus>) -> Result<Vec<Donation>, DonationServiceError> {
        Ok(self.donations.list(status)?)
    }

    pub fn list_for_donor(&self, donor: &UserId) -> Result<Vec<Donation>, DonationServiceError> {
        Ok(self.donations.list_by_donor(donor)?)
    }

    /// Donations currently held by a claimant (their pickup queue).
    pub fn assigned_to(&self, claimant: &UserId) -> Result<Vec<Donation>, DonationServiceError> {
        Ok(self.donations.list_claimed_by(claimant)?)
    }

    async fn predict(
        &self,
        features: FoodFeatures,
    ) -> Result<crate::scoring::RiskPrediction, DonationServiceError> {
        let scorer = Arc::clone(&self.scorer);
        let timeout = self.predict_timeout;

        let outcome = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || scorer.predict(&features)),
        )
        .await;

        let prediction = match outcome {
            Err(_) => Err(PredictionError::Timeout(timeout)),
            Ok(Err(join_error)) => Err(PredictionError::Worker(join_error.to_string())),
            Ok(Ok(result)) => result,
        }?;
        Ok(prediction)
    }

    fn alert_nearby_volunteers(&self, donation: &Donation) {
        let volunteers = match self.volunteers.all() {
            Ok(volunteers) => volunteers,
            Err(err) => {
                warn!(donation = %donation.id, error = %err, "high-risk alert skipped: volunteer lookup failed");
                return;
            }
        };

        let matches = find_volunteers_near(
            &volunteers,
            donation.location,
            self.matching.global_cutoff_km,
            &VolunteerFilter::verified(),
        );

        let mut delivered = 0usize;
        for candidate in &matches {
            let notification = VolunteerNotification {
                recipient: candidate.volunteer.user_id.clone(),
                subject: format!("Urgent pickup: {}", donation.title),
                body: format!(
                    "A {} donation \"{}\" {:.1} km away expires soon. Claim it if you can make the trip.",
                    donation.prediction.risk_level.label(),
                    donation.title,
                    candidate.distance_km,
                ),
            };
            // Sink failures must not roll back the stored donation.
            match self.notifications.notify(notification) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(donation = %donation.id, volunteer = %candidate.volunteer.id, error = %err, "volunteer notification failed");
                }
            }
        }

        info!(
            donation = %donation.id,
            matched = matches.len(),
            notified = delivered,
            "high-risk donation alerts dispatched"
        );
    }
}

/// Field-level validation failures, surfaced to clients as 400s.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("time_since_prep_hours must be a non-negative number")]
    InvalidPrepTime,
    #[error("confidence must fall within 0.0..=1.0")]
    ConfidenceOutOfRange,
    #[error(transparent)]
    Location(#[from] GeoError),
}

/// Error raised by the donation service.
#[derive(Debug, thiserror::Error)]
pub enum DonationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GeoError> for DonationServiceError {
    fn from(value: GeoError) -> Self {
        Self::Validation(ValidationError::Location(value))
    }
}

fn validate_submission(
    submission: &DonationSubmission,
) -> Result<(GeoPoint, FoodFeatures), ValidationError> {
    if submission.title.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "title" });
    }
    if !submission.time_since_prep_hours.is_finite() || submission.time_since_prep_hours < 0.0 {
        return Err(ValidationError::InvalidPrepTime);
    }
    if !submission.confidence.is_finite() || !(0.0..=1.0).contains(&submission.confidence) {
        return Err(ValidationError::ConfidenceOutOfRange);
    }

    let location = GeoPoint::from_coordinates(&submission.coordinates)?;

    let features = FoodFeatures {
        food_type: submission.food_type,
        storage: submission.storage,
        time_since_prep_hours: submission.time_since_prep_hours,
        is_sealed: submission.is_sealed,
        environment: submission.environment,
        confidence: submission.confidence,
    };

    Ok((location, features))
}
