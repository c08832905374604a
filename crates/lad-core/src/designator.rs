//! Runway designators and helipad approach bearings.
//!
//! Everything is derived on read from a [`DerivedState`]; nothing is cached.

use serde::{Deserialize, Serialize};

use crate::geodesy;
use crate::models::{DerivedState, GeoPoint, PlaceKind, TrajectoryCount};

/// Convert a true bearing to magnetic, in [0, 360).
///
/// Declination is negative for west variation, so a west declination
/// increases the magnetic bearing.
pub fn magnetic_bearing(true_bearing: f64, declination: f64) -> f64 {
    let value = (true_bearing - declination + 360.0).rem_euclid(360.0);
    if value >= 360.0 {
        0.0
    } else {
        value
    }
}

/// Runway end number for a magnetic heading, as shown on the designator.
///
/// Headings round to the nearest ten degrees; a result of 0 is shown as 36.
pub fn runway_end_number(magnetic_bearing: f64) -> String {
    let number = (magnetic_bearing / 10.0).round() as i64;
    match number.rem_euclid(36) {
        0 => "36".to_string(),
        n => format!("{:02}", n),
    }
}

/// Designator pair such as `"26/08"` for a magnetic bearing of the
/// threshold 1 → threshold 2 direction.
pub fn runway_designator(magnetic_bearing: f64) -> String {
    let reciprocal = (magnetic_bearing + 180.0).rem_euclid(360.0);
    format!(
        "{}/{}",
        runway_end_number(magnetic_bearing),
        runway_end_number(reciprocal)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayDesignation {
    pub true_bearing_deg: f64,
    pub magnetic_bearing_deg: f64,
    pub designator: String,
    pub declination_deg: f64,
}

/// Inbound magnetic bearings from each trajectory point to the helipad center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelipadBearings {
    pub trajectory1_deg: Option<f64>,
    pub trajectory2_deg: Option<f64>,
    pub declination_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Designation {
    Runway(RunwayDesignation),
    Helipad(HelipadBearings),
}

/// Derive the designation for the current state, if enough points exist.
pub fn designate(state: &DerivedState) -> Option<Designation> {
    let declination = state.declination_deg;
    let points = &state.points;

    match state.place_kind()? {
        PlaceKind::RunwayPair => {
            if !points.threshold1.is_populated() || !points.threshold2.is_populated() {
                return None;
            }
            let (lat1, lng1) = points.threshold1.decimal();
            let (lat2, lng2) = points.threshold2.decimal();
            let true_bearing = geodesy::bearing(lat1, lng1, lat2, lng2);
            let magnetic = magnetic_bearing(true_bearing, declination);
            Some(Designation::Runway(RunwayDesignation {
                true_bearing_deg: true_bearing,
                magnetic_bearing_deg: magnetic,
                designator: runway_designator(magnetic),
                declination_deg: declination,
            }))
        }
        PlaceKind::HelipadArea => {
            if !points.center.is_populated() {
                return None;
            }
            let (center_lat, center_lng) = points.center.decimal();
            let inbound = |point: &GeoPoint| {
                point.is_populated().then(|| {
                    let (lat, lng) = point.decimal();
                    magnetic_bearing(
                        geodesy::bearing(lat, lng, center_lat, center_lng),
                        declination,
                    )
                })
            };
            let trajectory2 = match state.trajectory_count {
                TrajectoryCount::Two => inbound(&points.trajectory2),
                TrajectoryCount::One => None,
            };
            Some(Designation::Helipad(HelipadBearings {
                trajectory1_deg: inbound(&points.trajectory1),
                trajectory2_deg: trajectory2,
                declination_deg: declination,
            }))
        }
    }
}

impl DerivedState {
    /// Designator or approach bearings, recomputed on every call.
    pub fn designation(&self) -> Option<Designation> {
        designate(self)
    }
}
