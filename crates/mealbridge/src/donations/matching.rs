//! Geospatial matching of volunteers to donations and vice versa.
//!
//! Matching a donation to volunteers intersects two radius constraints:
//! a system-wide cutoff that bounds the candidate set, and each
//! volunteer's own service radius. Both must hold. Results are ordered
//! nearest-first; callers display and assign in that order.

use std::sync::Arc;

use serde::Serialize;

use crate::config::MatchingConfig;
use crate::geo::{haversine_km, GeoPoint};
use crate::ngos::domain::NgoId;
use crate::store::StoreError;
use crate::volunteers::domain::Volunteer;
use crate::volunteers::repository::VolunteerRepository;

use super::domain::{Donation, DonationStatus};
use super::repository::DonationRepository;

/// A matched volunteer and their great-circle distance from the query
/// point.
#[derive(Debug, Clone, Serialize)]
pub struct VolunteerMatch {
    pub volunteer: Volunteer,
    pub distance_km: f64,
}

/// Narrowing criteria for volunteer matching.
#[derive(Debug, Clone, Default)]
pub struct VolunteerFilter {
    pub verified_only: bool,
    pub verified_by: Option<NgoId>,
}

impl VolunteerFilter {
    pub fn verified() -> Self {
        Self {
            verified_only: true,
            verified_by: None,
        }
    }

    pub fn verified_by(ngo: NgoId) -> Self {
        Self {
            verified_only: true,
            verified_by: Some(ngo),
        }
    }

    fn admits(&self, volunteer: &Volunteer) -> bool {
        if self.verified_only && !volunteer.is_verified {
            return false;
        }
        if let Some(ngo) = &self.verified_by {
            if volunteer.verified_by.as_ref() != Some(ngo) {
                return false;
            }
        }
        true
    }
}

/// Volunteers within both the global cutoff and their own service
/// radius of `point`, nearest first.
pub fn find_volunteers_near(
    volunteers: &[Volunteer],
    point: GeoPoint,
    global_cutoff_km: f64,
    filter: &VolunteerFilter,
) -> Vec<VolunteerMatch> {
    let mut matches: Vec<VolunteerMatch> = volunteers
        .iter()
        .filter(|volunteer| filter.admits(volunteer))
        .filter_map(|volunteer| {
            let distance_km = haversine_km(point, volunteer.location);
            // A volunteer outside their own configured radius is out
            // even when inside the global cutoff.
            if distance_km <= global_cutoff_km && distance_km <= volunteer.service_radius_km {
                Some(VolunteerMatch {
                    volunteer: volunteer.clone(),
                    distance_km,
                })
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    matches
}

/// Donations within `radius_km` of `point`, optionally narrowed by
/// status, nearest first. The radius here is already caller-specified,
/// so no global cutoff applies.
pub fn find_donations_near(
    donations: &[Donation],
    point: GeoPoint,
    radius_km: f64,
    status: Option<DonationStatus>,
) -> Vec<Donation> {
    let mut in_range: Vec<(f64, Donation)> = donations
        .iter()
        .filter(|donation| status.map_or(true, |wanted| donation.status == wanted))
        .filter_map(|donation| {
            let distance_km = haversine_km(point, donation.location);
            (distance_km <= radius_km).then(|| (distance_km, donation.clone()))
        })
        .collect();

    in_range.sort_by(|a, b| a.0.total_cmp(&b.0));
    in_range.into_iter().map(|(_, donation)| donation).collect()
}

/// Repository-backed matcher composing the pure queries above.
pub struct GeoMatcher<D, V> {
    donations: Arc<D>,
    volunteers: Arc<V>,
    config: MatchingConfig,
}

impl<D, V> GeoMatcher<D, V>
where
    D: DonationRepository + 'static,
    V: VolunteerRepository + 'static,
{
    pub fn new(donations: Arc<D>, volunteers: Arc<V>, config: MatchingConfig) -> Self {
        Self {
            donations,
            volunteers,
            config,
        }
    }

    /// Candidate volunteers for a donation location, bounded by the
    /// configured global cutoff.
    pub fn volunteers_near(
        &self,
        point: GeoPoint,
        filter: &VolunteerFilter,
    ) -> Result<Vec<VolunteerMatch>, StoreError> {
        let volunteers = self.volunteers.all()?;
        Ok(find_volunteers_near(
            &volunteers,
            point,
            self.config.global_cutoff_km,
            filter,
        ))
    }

    /// Donations a volunteer could serve from where they stand now,
    /// restricted to their own service radius.
    pub fn donations_near_volunteer(
        &self,
        volunteer: &Volunteer,
        status: Option<DonationStatus>,
    ) -> Result<Vec<Donation>, StoreError> {
        let donations = self.donations.list(None)?;
        Ok(find_donations_near(
            &donations,
            volunteer.location,
            volunteer.service_radius_km,
            status,
        ))
    }

    /// Same query keyed by volunteer id, for the HTTP surface.
    pub fn donations_for_volunteer(
        &self,
        id: &crate::volunteers::domain::VolunteerId,
        status: Option<DonationStatus>,
    ) -> Result<Vec<Donation>, StoreError> {
        let volunteer = self.volunteers.fetch(id)?.ok_or(StoreError::NotFound)?;
        self.donations_near_volunteer(&volunteer, status)
    }
}
