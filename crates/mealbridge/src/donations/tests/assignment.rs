use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};

use crate::donations::assignment::{AssignmentCoordinator, AssignmentError};
use crate::donations::domain::DonationStatus;
use crate::donations::repository::DonationRepository;
use crate::identity::UserId;
use crate::ngos::domain::NgoId;
use crate::store::{InMemoryDonationStore, InMemoryVolunteerStore, StoreError};
use crate::volunteers::repository::VolunteerRepository;

use super::common::{donation_at, origin, volunteer_at};

fn ngo() -> NgoId {
    NgoId("ngo-000001".to_string())
}

fn setup() -> (
    Arc<InMemoryDonationStore>,
    Arc<InMemoryVolunteerStore>,
    AssignmentCoordinator<InMemoryDonationStore, InMemoryVolunteerStore>,
) {
    let donations = Arc::new(InMemoryDonationStore::default());
    let volunteers = Arc::new(InMemoryVolunteerStore::default());
    let coordinator = AssignmentCoordinator::new(donations.clone(), volunteers.clone());
    (donations, volunteers, coordinator)
}

#[test]
fn a_verified_volunteer_claims_and_gains_the_assignment() {
    let (donations, volunteers, coordinator) = setup();
    let rider = volunteer_at("rider", origin(), 10.0, Some(ngo()));
    volunteers.insert(rider.clone()).unwrap();

    let seeded = donation_at(
        "meal",
        origin(),
        DonationStatus::Available,
        Utc::now() + Duration::hours(3),
    );
    donations.insert(seeded.clone()).unwrap();

    let claimed = coordinator.claim(&seeded.id, &rider.user_id).unwrap();
    assert_eq!(claimed.status, DonationStatus::Claimed);
    assert_eq!(claimed.claimed_by, Some(rider.user_id.clone()));

    let refreshed = volunteers.fetch(&rider.id).unwrap().unwrap();
    assert!(refreshed.assigned_donations.contains(&seeded.id));
}

#[test]
fn unverified_and_unknown_claimants_are_rejected() {
    let (donations, volunteers, coordinator) = setup();
    let walkon = volunteer_at("walkon", origin(), 10.0, None);
    volunteers.insert(walkon.clone()).unwrap();

    let seeded = donation_at(
        "meal",
        origin(),
        DonationStatus::Available,
        Utc::now() + Duration::hours(3),
    );
    donations.insert(seeded.clone()).unwrap();

    assert!(matches!(
        coordinator.claim(&seeded.id, &walkon.user_id),
        Err(AssignmentError::NotVerified)
    ));
    assert!(matches!(
        coordinator.claim(&seeded.id, &UserId("user-ghost".to_string())),
        Err(AssignmentError::VolunteerNotFound)
    ));
    // The donation never changed hands.
    assert!(donations.fetch(&seeded.id).unwrap().unwrap().claimed_by.is_none());
}

#[test]
fn losing_a_claim_race_is_a_conflict_not_a_miss() {
    let (donations, volunteers, coordinator) = setup();
    let first = volunteer_at("first", origin(), 10.0, Some(ngo()));
    let second = volunteer_at("second", origin(), 10.0, Some(ngo()));
    volunteers.insert(first.clone()).unwrap();
    volunteers.insert(second.clone()).unwrap();

    let seeded = donation_at(
        "meal",
        origin(),
        DonationStatus::Available,
        Utc::now() + Duration::hours(3),
    );
    donations.insert(seeded.clone()).unwrap();

    coordinator.claim(&seeded.id, &first.user_id).unwrap();

    assert!(matches!(
        coordinator.claim(&seeded.id, &second.user_id),
        Err(AssignmentError::Store(StoreError::Conflict))
    ));
    assert!(matches!(
        coordinator.claim(
            &crate::donations::domain::DonationId("don-ghost".to_string()),
            &second.user_id
        ),
        Err(AssignmentError::Store(StoreError::NotFound))
    ));
}

#[test]
fn racing_claimants_produce_exactly_one_winner() {
    let (donations, volunteers, _) = setup();
    let coordinator = Arc::new(AssignmentCoordinator::new(
        donations.clone(),
        volunteers.clone(),
    ));

    let seeded = donation_at(
        "meal",
        origin(),
        DonationStatus::Available,
        Utc::now() + Duration::hours(3),
    );
    donations.insert(seeded.clone()).unwrap();

    let mut handles = Vec::new();
    for n in 0..8 {
        let rider = volunteer_at(&format!("racer{n}"), origin(), 10.0, Some(ngo()));
        volunteers.insert(rider.clone()).unwrap();
        let coordinator = coordinator.clone();
        let donation_id = seeded.id.clone();
        handles.push(thread::spawn(move || {
            coordinator.claim(&donation_id, &rider.user_id).is_ok()
        }));
    }

    let wins = handles
        .into_iter()
        .map(|handle| handle.join().expect("claimant thread panicked"))
        .filter(|&won| won)
        .count();
    assert_eq!(wins, 1);

    let settled = donations.fetch(&seeded.id).unwrap().unwrap();
    assert_eq!(settled.status, DonationStatus::Claimed);
    assert!(settled.claimed_by.is_some());
}

#[test]
fn a_sweep_that_lands_first_wins_over_a_claim() {
    let (donations, volunteers, coordinator) = setup();
    let rider = volunteer_at("rider", origin(), 10.0, Some(ngo()));
    volunteers.insert(rider.clone()).unwrap();

    let stale = donation_at(
        "stale",
        origin(),
        DonationStatus::Available,
        Utc::now() - Duration::minutes(5),
    );
    donations.insert(stale.clone()).unwrap();

    assert_eq!(donations.expire_due(Utc::now()).unwrap(), 1);
    assert!(matches!(
        coordinator.claim(&stale.id, &rider.user_id),
        Err(AssignmentError::Store(StoreError::Conflict))
    ));
}

#[test]
fn ngo_assignment_requires_its_own_verification() {
    let (donations, volunteers, coordinator) = setup();
    let other_ngo = NgoId("ngo-000002".to_string());
    let rider = volunteer_at("rider", origin(), 10.0, Some(ngo()));
    volunteers.insert(rider.clone()).unwrap();

    let seeded = donation_at(
        "meal",
        origin(),
        DonationStatus::Available,
        Utc::now() + Duration::hours(3),
    );
    donations.insert(seeded.clone()).unwrap();

    assert!(matches!(
        coordinator.assign(&seeded.id, &rider.user_id, &other_ngo),
        Err(AssignmentError::NotVerifiedByNgo { ngo }) if ngo == other_ngo
    ));

    let assigned = coordinator
        .assign(&seeded.id, &rider.user_id, &ngo())
        .unwrap();
    assert_eq!(assigned.claimed_by, Some(rider.user_id));
}

#[test]
fn assignee_lookup_distinguishes_unclaimed_from_missing() {
    let (donations, volunteers, coordinator) = setup();
    let rider = volunteer_at("rider", origin(), 10.0, Some(ngo()));
    volunteers.insert(rider.clone()).unwrap();

    let seeded = donation_at(
        "meal",
        origin(),
        DonationStatus::Available,
        Utc::now() + Duration::hours(3),
    );
    donations.insert(seeded.clone()).unwrap();

    assert!(coordinator.assignee(&seeded.id).unwrap().is_none());

    coordinator.claim(&seeded.id, &rider.user_id).unwrap();
    let holder = coordinator.assignee(&seeded.id).unwrap().unwrap();
    assert_eq!(holder.user, rider.user_id);
    assert_eq!(holder.volunteer.id, rider.id);

    assert!(matches!(
        coordinator.assignee(&crate::donations::domain::DonationId("don-ghost".to_string())),
        Err(AssignmentError::Store(StoreError::NotFound))
    ));
}
