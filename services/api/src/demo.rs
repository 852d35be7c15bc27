use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use clap::Args;

use mealbridge::config::MatchingConfig;
use mealbridge::donations::{
    AssignmentCoordinator, DonationService, DonationStatus, DonationSubmission, EnvironmentKind,
    ExpirySweeper, FoodType, GeoMatcher, StorageKind, VolunteerFilter,
};
use mealbridge::error::AppError;
use mealbridge::geo::GeoPoint;
use mealbridge::identity::UserId;
use mealbridge::ngos::{Address, ContactPerson, NgoRegistration, NgoRegistry};
use mealbridge::scoring::{FoodFeatures, RiskScorer, RuleBasedScorer};
use mealbridge::store::{InMemoryDonationStore, InMemoryNgoStore, InMemoryVolunteerStore};
use mealbridge::volunteers::{Availability, VehicleType, VolunteerProfile, VolunteerRegistry};

use crate::infra::{parse_environment, parse_food_type, parse_storage, RecordingNotificationSink};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Food category: cooked_veg, non_veg, packaged, or raw
    #[arg(long, value_parser = parse_food_type)]
    pub(crate) food_type: FoodType,
    /// Storage condition: fridge or room_temp
    #[arg(long, value_parser = parse_storage)]
    pub(crate) storage: StorageKind,
    /// Ambient environment: dry or humid
    #[arg(long, value_parser = parse_environment)]
    pub(crate) environment: EnvironmentKind,
    /// Hours since the food was prepared
    #[arg(long)]
    pub(crate) prep_hours: f64,
    /// Whether the food is sealed
    #[arg(long)]
    pub(crate) sealed: bool,
    /// Donor confidence in the declared details (0.0 to 1.0)
    #[arg(long, default_value_t = 0.8)]
    pub(crate) confidence: f64,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the expiry sweep portion of the walkthrough
    #[arg(long)]
    pub(crate) skip_sweep: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let scorer = RuleBasedScorer::load();
    let features = FoodFeatures {
        food_type: args.food_type,
        storage: args.storage,
        time_since_prep_hours: args.prep_hours,
        is_sealed: args.sealed,
        environment: args.environment,
        confidence: args.confidence,
    };

    match scorer.predict(&features) {
        Ok(prediction) => {
            println!("Spoilage risk assessment");
            println!("  risk level:     {}", prediction.risk_level.label());
            println!("  safe for:       {:.1} hours", prediction.safe_for_hours);
            println!("  confidence:     {:.2}", prediction.confidence);
        }
        Err(err) => println!("scoring failed: {err}"),
    }

    Ok(())
}

/// Coordinates a few kilometres apart around a city centre.
fn demo_point(lat_offset_km: f64) -> Vec<f64> {
    vec![77.5946, 12.9716 + lat_offset_km / 111.19]
}

fn demo_profile(lat_offset_km: f64, radius_km: f64) -> VolunteerProfile {
    let coords = demo_point(lat_offset_km);
    VolunteerProfile {
        availability: Availability::PartTime,
        vehicle_type: VehicleType::Bike,
        service_radius_km: radius_km,
        location: GeoPoint::new(coords[0], coords[1]).expect("demo point is valid"),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let donations = Arc::new(InMemoryDonationStore::default());
    let volunteers = Arc::new(InMemoryVolunteerStore::default());
    let ngos = Arc::new(InMemoryNgoStore::default());
    let sink = Arc::new(RecordingNotificationSink::default());

    let service = DonationService::new(
        donations.clone(),
        volunteers.clone(),
        Arc::new(RuleBasedScorer::load()),
        sink.clone(),
        MatchingConfig::default(),
        StdDuration::from_millis(2000),
    );
    let coordinator = AssignmentCoordinator::new(donations.clone(), volunteers.clone());
    let matcher = GeoMatcher::new(donations.clone(), volunteers.clone(), MatchingConfig::default());
    let volunteer_registry = VolunteerRegistry::new(volunteers.clone());
    let ngo_registry = NgoRegistry::new(ngos, volunteers);

    println!("Mealbridge coordination demo\n");

    let ngo = ngo_registry
        .register(
            UserId("user-ngo".to_string()),
            NgoRegistration {
                organization_name: "Harvest Relief Trust".to_string(),
                registration_number: None,
                address: Address {
                    street: "14 Mill Road".to_string(),
                    city: "Bangalore".to_string(),
                    state: "KA".to_string(),
                    zip: "560001".to_string(),
                },
                contact_person: ContactPerson {
                    name: "R. Iyer".to_string(),
                    phone: "+91-90000-00000".to_string(),
                    email: "ops@harvestrelief.example".to_string(),
                },
            },
        )
        .map_err(demo_failure)?;
    println!(
        "Registered NGO {} ({})",
        ngo.organization_name, ngo.registration_number
    );

    let near = volunteer_registry
        .register(UserId("user-asha".to_string()), demo_profile(2.0, 15.0))
        .map_err(demo_failure)?;
    let far = volunteer_registry
        .register(UserId("user-vikram".to_string()), demo_profile(9.0, 20.0))
        .map_err(demo_failure)?;
    let unapproved = volunteer_registry
        .register(UserId("user-leela".to_string()), demo_profile(1.0, 10.0))
        .map_err(demo_failure)?;

    let near = ngo_registry
        .approve_volunteer(&ngo.id, &near.id)
        .map_err(demo_failure)?;
    let far = ngo_registry
        .approve_volunteer(&ngo.id, &far.id)
        .map_err(demo_failure)?;
    println!(
        "Volunteers on file: {} and {} verified by {}, {} awaiting approval\n",
        near.id, far.id, ngo.id, unapproved.id
    );

    let risky = service
        .create(
            UserId("user-market".to_string()),
            DonationSubmission {
                title: "Fish market surplus".to_string(),
                food_type: FoodType::NonVeg,
                storage: StorageKind::RoomTemp,
                time_since_prep_hours: 13.0,
                is_sealed: false,
                environment: EnvironmentKind::Humid,
                confidence: 0.8,
                description: Some("Six crates, on ice until noon".to_string()),
                coordinates: demo_point(0.0),
            },
        )
        .await
        .map_err(demo_failure)?;
    let mild = service
        .create(
            UserId("user-canteen".to_string()),
            DonationSubmission {
                title: "Canteen rice trays".to_string(),
                food_type: FoodType::CookedVeg,
                storage: StorageKind::Fridge,
                time_since_prep_hours: 2.0,
                is_sealed: true,
                environment: EnvironmentKind::Dry,
                confidence: 0.9,
                description: None,
                coordinates: demo_point(0.5),
            },
        )
        .await
        .map_err(demo_failure)?;

    for donation in [&risky, &mild] {
        println!(
            "Donation {} \"{}\": {} risk, safe for {:.1}h, expires {}",
            donation.id,
            donation.title,
            donation.prediction.risk_level.label(),
            donation.prediction.safe_for_hours,
            donation.expires_at.format("%H:%M:%S"),
        );
    }

    let alerts = sink.events();
    println!("\nHigh-risk alerts dispatched: {}", alerts.len());
    for alert in &alerts {
        println!("  -> {}: {}", alert.recipient, alert.subject);
    }

    let candidates = matcher
        .volunteers_near(risky.location, &VolunteerFilter::verified())
        .map_err(demo_failure)?;
    println!("\nEligible volunteers for {} (nearest first):", risky.id);
    for candidate in &candidates {
        println!(
            "  {} at {:.1} km (radius {:.0} km)",
            candidate.volunteer.id, candidate.distance_km, candidate.volunteer.service_radius_km
        );
    }

    let claimed = coordinator
        .claim(&risky.id, &near.user_id)
        .map_err(demo_failure)?;
    println!("\n{} claimed by {}", claimed.id, near.user_id);
    match coordinator.claim(&risky.id, &far.user_id) {
        Ok(_) => println!("unexpected double claim"),
        Err(err) => println!("{} attempting the same claim: {err}", far.user_id),
    }

    let picked = service
        .update_status(&risky.id, &near.user_id, DonationStatus::Picked)
        .map_err(demo_failure)?;
    println!("{} marked {} by its claimant", picked.id, picked.status);

    if !args.skip_sweep {
        let sweeper = ExpirySweeper::new(donations, StdDuration::from_secs(60));
        let future = Utc::now() + Duration::hours(mild.prediction.safe_for_hours.ceil() as i64 + 1);
        let expired = sweeper.sweep_once(future).map_err(demo_failure)?;
        println!(
            "\nSweeping as if the clock were {}: {expired} donation(s) expired",
            future.format("%H:%M:%S")
        );
        let retired = service.get(&mild.id).map_err(demo_failure)?;
        println!(
            "  {} is now {} with {:.1}h remaining",
            retired.id,
            retired.status,
            retired.remaining_hours(future)
        );
    }

    println!("\nDemo complete.");
    Ok(())
}

fn demo_failure(err: impl std::fmt::Display) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}
