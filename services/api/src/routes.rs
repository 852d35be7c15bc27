use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;

use mealbridge::donations::{donation_router, DonationApi, DonationRepository, NotificationSink};
use mealbridge::geo::GeoPoint;
use mealbridge::identity::UserId;
use mealbridge::ngos::{
    Address, ContactPerson, NgoId, NgoRegistration, NgoRegistry, NgoRegistryError, NgoRepository,
};
use mealbridge::scoring::RiskScorer;
use mealbridge::store::StoreError;
use mealbridge::volunteers::{
    Availability, VehicleType, VolunteerId, VolunteerProfile, VolunteerRegistry,
    VolunteerRegistryError, VolunteerRepository,
};

use crate::infra::AppState;

/// Registry handles for the directory endpoints, shared across
/// requests.
pub(crate) struct Directory<V, N> {
    pub(crate) volunteers: VolunteerRegistry<V>,
    pub(crate) ngos: NgoRegistry<N, V>,
}

/// Full HTTP surface: donation lifecycle routes plus the volunteer and
/// NGO directory, health, readiness, and metrics.
pub(crate) fn platform_routes<D, V, S, N, G>(
    api: Arc<DonationApi<D, V, S, N>>,
    directory: Arc<Directory<V, G>>,
) -> Router
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
    S: RiskScorer + 'static,
    N: NotificationSink + 'static,
    G: NgoRepository + 'static,
{
    donation_router(api)
        .merge(directory_router(directory))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

fn directory_router<V, G>(directory: Arc<Directory<V, G>>) -> Router
where
    V: VolunteerRepository + 'static,
    G: NgoRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/volunteers",
            post(register_volunteer_endpoint::<V, G>),
        )
        .route(
            "/api/v1/volunteers/:volunteer_id",
            get(get_volunteer_endpoint::<V, G>),
        )
        .route(
            "/api/v1/volunteers/:volunteer_id/location",
            patch(update_location_endpoint::<V, G>),
        )
        .route("/api/v1/ngos", post(register_ngo_endpoint::<V, G>))
        .route("/api/v1/ngos/:ngo_id", get(get_ngo_endpoint::<V, G>))
        .route(
            "/api/v1/ngos/:ngo_id/volunteers/:volunteer_id/approve",
            post(approve_volunteer_endpoint::<V, G>),
        )
        .with_state(directory)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterVolunteerRequest {
    pub(crate) user_id: String,
    pub(crate) availability: Availability,
    pub(crate) vehicle_type: VehicleType,
    pub(crate) service_radius_km: f64,
    pub(crate) coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationUpdateRequest {
    pub(crate) coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterNgoRequest {
    pub(crate) user_id: String,
    pub(crate) organization_name: String,
    #[serde(default)]
    pub(crate) registration_number: Option<String>,
    pub(crate) address: Address,
    pub(crate) contact_person: ContactPerson,
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn register_volunteer_endpoint<V, G>(
    State(directory): State<Arc<Directory<V, G>>>,
    Json(request): Json<RegisterVolunteerRequest>,
) -> Response
where
    V: VolunteerRepository + 'static,
    G: NgoRepository + 'static,
{
    let location = match GeoPoint::from_coordinates(&request.coordinates) {
        Ok(location) => location,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    };

    let profile = VolunteerProfile {
        availability: request.availability,
        vehicle_type: request.vehicle_type,
        service_radius_km: request.service_radius_km,
        location,
    };

    match directory
        .volunteers
        .register(UserId(request.user_id), profile)
    {
        Ok(volunteer) => (StatusCode::CREATED, Json(volunteer)).into_response(),
        Err(error) => volunteer_error_response(error),
    }
}

pub(crate) async fn get_volunteer_endpoint<V, G>(
    State(directory): State<Arc<Directory<V, G>>>,
    Path(volunteer_id): Path<String>,
) -> Response
where
    V: VolunteerRepository + 'static,
    G: NgoRepository + 'static,
{
    match directory.volunteers.get(&VolunteerId(volunteer_id)) {
        Ok(volunteer) => (StatusCode::OK, Json(volunteer)).into_response(),
        Err(error) => volunteer_error_response(error),
    }
}

pub(crate) async fn update_location_endpoint<V, G>(
    State(directory): State<Arc<Directory<V, G>>>,
    Path(volunteer_id): Path<String>,
    Json(request): Json<LocationUpdateRequest>,
) -> Response
where
    V: VolunteerRepository + 'static,
    G: NgoRepository + 'static,
{
    let location = match GeoPoint::from_coordinates(&request.coordinates) {
        Ok(location) => location,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    };

    match directory
        .volunteers
        .update_location(&VolunteerId(volunteer_id), location)
    {
        Ok(volunteer) => (StatusCode::OK, Json(volunteer)).into_response(),
        Err(error) => volunteer_error_response(error),
    }
}

pub(crate) async fn register_ngo_endpoint<V, G>(
    State(directory): State<Arc<Directory<V, G>>>,
    Json(request): Json<RegisterNgoRequest>,
) -> Response
where
    V: VolunteerRepository + 'static,
    G: NgoRepository + 'static,
{
    let registration = NgoRegistration {
        organization_name: request.organization_name,
        registration_number: request.registration_number,
        address: request.address,
        contact_person: request.contact_person,
    };

    match directory.ngos.register(UserId(request.user_id), registration) {
        Ok(ngo) => (StatusCode::CREATED, Json(ngo)).into_response(),
        Err(error) => ngo_error_response(error),
    }
}

pub(crate) async fn get_ngo_endpoint<V, G>(
    State(directory): State<Arc<Directory<V, G>>>,
    Path(ngo_id): Path<String>,
) -> Response
where
    V: VolunteerRepository + 'static,
    G: NgoRepository + 'static,
{
    match directory.ngos.get(&NgoId(ngo_id)) {
        Ok(ngo) => (StatusCode::OK, Json(ngo)).into_response(),
        Err(error) => ngo_error_response(error),
    }
}

pub(crate) async fn approve_volunteer_endpoint<V, G>(
    State(directory): State<Arc<Directory<V, G>>>,
    Path((ngo_id, volunteer_id)): Path<(String, String)>,
) -> Response
where
    V: VolunteerRepository + 'static,
    G: NgoRepository + 'static,
{
    match directory
        .ngos
        .approve_volunteer(&NgoId(ngo_id), &VolunteerId(volunteer_id))
    {
        Ok(volunteer) => (StatusCode::OK, Json(volunteer)).into_response(),
        Err(error) => ngo_error_response(error),
    }
}

fn store_error_response(error: StoreError) -> Response {
    let status = match &error {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn volunteer_error_response(error: VolunteerRegistryError) -> Response {
    match error {
        VolunteerRegistryError::InvalidServiceRadius(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        VolunteerRegistryError::AlreadyRegistered(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        VolunteerRegistryError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        VolunteerRegistryError::Store(error) => store_error_response(error),
    }
}

fn ngo_error_response(error: NgoRegistryError) -> Response {
    match error {
        NgoRegistryError::MissingOrganizationName => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        NgoRegistryError::AlreadyRegistered(_) | NgoRegistryError::RegistrationNumberTaken => (
            StatusCode::CONFLICT,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        NgoRegistryError::NgoNotFound | NgoRegistryError::VolunteerNotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        NgoRegistryError::Store(error) => store_error_response(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use mealbridge::store::{InMemoryNgoStore, InMemoryVolunteerStore};
    use tower::ServiceExt;

    fn test_directory() -> Arc<Directory<InMemoryVolunteerStore, InMemoryNgoStore>> {
        let volunteers = Arc::new(InMemoryVolunteerStore::default());
        let ngos = Arc::new(InMemoryNgoStore::default());
        Arc::new(Directory {
            volunteers: VolunteerRegistry::new(volunteers.clone()),
            ngos: NgoRegistry::new(ngos, volunteers),
        })
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn volunteer_payload(user: &str) -> serde_json::Value {
        json!({
            "user_id": user,
            "availability": "part-time",
            "vehicle_type": "bike",
            "service_radius_km": 12.0,
            "coordinates": [77.5946, 12.9716]
        })
    }

    fn ngo_payload(user: &str) -> serde_json::Value {
        json!({
            "user_id": user,
            "organization_name": "Harvest Relief Trust",
            "address": {
                "street": "14 Mill Road",
                "city": "Bangalore",
                "state": "KA",
                "zip": "560001"
            },
            "contact_person": {
                "name": "R. Iyer",
                "phone": "+91-90000-00000",
                "email": "ops@harvestrelief.example"
            }
        })
    }

    #[tokio::test]
    async fn volunteer_registration_round_trips() {
        let router = directory_router(test_directory());

        let created = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/volunteers",
                volunteer_payload("user-rider"),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let body = json_body(created).await;
        assert_eq!(body["is_verified"], false);
        let id = body["id"].as_str().unwrap().to_string();

        let fetched = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/volunteers/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);

        let duplicate = router
            .oneshot(json_request(
                "POST",
                "/api/v1/volunteers",
                volunteer_payload("user-rider"),
            ))
            .await
            .unwrap();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn zero_radius_registration_is_rejected() {
        let router = directory_router(test_directory());

        let mut payload = volunteer_payload("user-rider");
        payload["service_radius_km"] = json!(0.0);
        let response = router
            .oneshot(json_request("POST", "/api/v1/volunteers", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ngo_approval_marks_the_volunteer_verified() {
        let router = directory_router(test_directory());

        let ngo = router
            .clone()
            .oneshot(json_request("POST", "/api/v1/ngos", ngo_payload("user-ngo")))
            .await
            .unwrap();
        assert_eq!(ngo.status(), StatusCode::CREATED);
        let ngo = json_body(ngo).await;
        assert!(ngo["registration_number"]
            .as_str()
            .unwrap()
            .starts_with("NGO-"));
        let ngo_id = ngo["id"].as_str().unwrap().to_string();

        let volunteer = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/volunteers",
                volunteer_payload("user-rider"),
            ))
            .await
            .unwrap();
        let volunteer = json_body(volunteer).await;
        let volunteer_id = volunteer["id"].as_str().unwrap().to_string();

        let approved = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/ngos/{ngo_id}/volunteers/{volunteer_id}/approve"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(approved.status(), StatusCode::OK);
        let approved = json_body(approved).await;
        assert_eq!(approved["is_verified"], true);
        assert_eq!(approved["verified_by"], ngo_id);

        let missing = router
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/ngos/ngo-ghost/volunteers/{volunteer_id}/approve"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
