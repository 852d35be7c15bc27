use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::identity::UserId;
use crate::ngos::domain::NgoId;
use crate::scoring::RiskScorer;
use crate::store::StoreError;
use crate::volunteers::domain::VolunteerId;
use crate::volunteers::repository::VolunteerRepository;

use super::assignment::{AssignmentCoordinator, AssignmentError};
use super::domain::{Donation, DonationId, DonationStatus, DonationSubmission};
use super::matching::{GeoMatcher, VolunteerFilter};
use super::repository::{DonationRepository, NotificationSink};
use super::service::{DonationService, DonationServiceError};

/// Everything the donation HTTP surface needs, wired once at startup.
pub struct DonationApi<D, V, S, N> {
    pub service: DonationService<D, V, S, N>,
    pub coordinator: AssignmentCoordinator<D, V>,
    pub matcher: GeoMatcher<D, V>,
}

/// Router builder exposing the donation lifecycle endpoints.
pub fn donation_router<D, V, S, N>(api: Arc<DonationApi<D, V, S, N>>) -> Router
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/donations",
            post(create_handler::<D, V, S, N>).get(list_handler::<D, V, S, N>),
        )
        .route("/api/v1/donations/:donation_id", get(get_handler::<D, V, S, N>))
        .route(
            "/api/v1/donations/:donation_id/claim",
            post(claim_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/donations/:donation_id/status",
            patch(status_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/donations/:donation_id/rescore",
            post(rescore_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/donations/:donation_id/eligible-volunteers",
            get(eligible_volunteers_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/donations/:donation_id/assign",
            post(assign_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/donations/:donation_id/assignee",
            get(assignee_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/users/:user_id/donations",
            get(donor_donations_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/users/:user_id/claimed",
            get(claimed_donations_handler::<D, V, S, N>),
        )
        .route(
            "/api/v1/volunteers/:volunteer_id/nearby-donations",
            get(nearby_donations_handler::<D, V, S, N>),
        )
        .with_state(api)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateDonationRequest {
    pub(crate) donor_id: String,
    #[serde(flatten)]
    pub(crate) submission: DonationSubmission,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    pub(crate) status: Option<DonationStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimRequest {
    pub(crate) volunteer_user_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    pub(crate) actor_id: String,
    pub(crate) status: DonationStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    pub(crate) volunteer_user_id: String,
    pub(crate) ngo_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EligibleParams {
    pub(crate) ngo_id: Option<String>,
}

/// Donation payload enriched with the derived hours-left figure.
#[derive(Debug, serde::Serialize)]
pub(crate) struct DonationView {
    #[serde(flatten)]
    pub(crate) donation: Donation,
    pub(crate) remaining_hours: f64,
}

fn donation_view(donation: Donation) -> DonationView {
    let remaining_hours = donation.remaining_hours(Utc::now());
    DonationView {
        donation,
        remaining_hours,
    }
}

pub(crate) async fn create_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Json(request): Json<CreateDonationRequest>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    let donor = UserId(request.donor_id);
    match api.service.create(donor, request.submission).await {
        Ok(donation) => (StatusCode::CREATED, Json(donation_view(donation))).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn list_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    match api.service.list(params.status) {
        Ok(donations) => (StatusCode::OK, Json(donations)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn get_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(donation_id): Path<String>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    match api.service.get(&DonationId(donation_id)) {
        Ok(donation) => (StatusCode::OK, Json(donation_view(donation))).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn claim_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(donation_id): Path<String>,
    Json(request): Json<ClaimRequest>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    let id = DonationId(donation_id);
    let claimant = UserId(request.volunteer_user_id);
    match api.coordinator.claim(&id, &claimant) {
        Ok(donation) => (StatusCode::OK, Json(donation_view(donation))).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

pub(crate) async fn status_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(donation_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    let id = DonationId(donation_id);
    let actor = UserId(request.actor_id);
    match api.service.update_status(&id, &actor, request.status) {
        Ok(donation) => (StatusCode::OK, Json(donation_view(donation))).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn rescore_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(donation_id): Path<String>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    match api.service.rescore(&DonationId(donation_id)).await {
        Ok(donation) => (StatusCode::OK, Json(donation_view(donation))).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn eligible_volunteers_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(donation_id): Path<String>,
    Query(params): Query<EligibleParams>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    let donation = match api.service.get(&DonationId(donation_id)) {
        Ok(donation) => donation,
        Err(error) => return service_error_response(error),
    };

    let filter = match params.ngo_id {
        Some(ngo_id) => VolunteerFilter::verified_by(NgoId(ngo_id)),
        None => VolunteerFilter::verified(),
    };

    match api.matcher.volunteers_near(donation.location, &filter) {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn assign_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(donation_id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    let id = DonationId(donation_id);
    let volunteer_user = UserId(request.volunteer_user_id);
    let ngo = NgoId(request.ngo_id);
    match api.coordinator.assign(&id, &volunteer_user, &ngo) {
        Ok(donation) => (StatusCode::OK, Json(donation_view(donation))).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

pub(crate) async fn assignee_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(donation_id): Path<String>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    match api.coordinator.assignee(&DonationId(donation_id)) {
        // An unclaimed donation has no assignee; that is data, not an
        // error.
        Ok(assignee) => (StatusCode::OK, Json(json!({ "assignee": assignee }))).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

pub(crate) async fn donor_donations_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    match api.service.list_for_donor(&UserId(user_id)) {
        Ok(donations) => (StatusCode::OK, Json(donations)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn claimed_donations_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    match api.service.assigned_to(&UserId(user_id)) {
        Ok(donations) => (StatusCode::OK, Json(donations)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn nearby_donations_handler<D, V, S, N>(
    State(api): State<Arc<DonationApi<D, V, S, N>>>,
    Path(volunteer_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Response
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
{
    let status = Some(params.status.unwrap_or(DonationStatus::Available));
    match api
        .matcher
        .donations_for_volunteer(&VolunteerId(volunteer_id), status)
    {
        Ok(donations) => (StatusCode::OK, Json(donations)).into_response(),
        Err(error) => store_error_response(error),
    }
}

/// A lost claim race must read as "already taken" (409), never as
/// "never existed" (404).
fn store_error_response(error: StoreError) -> Response {
    let status = match &error {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn service_error_response(error: DonationServiceError) -> Response {
    match error {
        DonationServiceError::Validation(error) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        DonationServiceError::Prediction(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        DonationServiceError::Store(error) => store_error_response(error),
    }
}

fn assignment_error_response(error: AssignmentError) -> Response {
    match error {
        AssignmentError::VolunteerNotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        AssignmentError::NotVerified | AssignmentError::NotVerifiedByNgo { .. } => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        AssignmentError::Store(error) => store_error_response(error),
    }
}
