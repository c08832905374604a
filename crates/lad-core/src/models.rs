//! Core data models for landing-site registration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec;

/// A coordinate axis entered as degrees, minutes and seconds of text.
///
/// Hemisphere is not stored: latitudes are south and longitudes are west,
/// so every conversion to decimal degrees is negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmsValue {
    pub degrees: String,
    pub minutes: String,
    pub seconds: String,
}

impl DmsValue {
    pub fn new(
        degrees: impl Into<String>,
        minutes: impl Into<String>,
        seconds: impl Into<String>,
    ) -> Self {
        Self {
            degrees: degrees.into(),
            minutes: minutes.into(),
            seconds: seconds.into(),
        }
    }

    pub fn field(&self, field: DmsField) -> &str {
        match field {
            DmsField::Degrees => &self.degrees,
            DmsField::Minutes => &self.minutes,
            DmsField::Seconds => &self.seconds,
        }
    }

    /// Replace one subfield. Returns true when the text changed.
    pub fn set(&mut self, field: DmsField, value: String) -> bool {
        let slot = match field {
            DmsField::Degrees => &mut self.degrees,
            DmsField::Minutes => &mut self.minutes,
            DmsField::Seconds => &mut self.seconds,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// Signed decimal degrees (always <= 0).
    pub fn to_decimal(&self) -> f64 {
        codec::to_decimal(&self.degrees, &self.minutes, &self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DmsField {
    Degrees,
    Minutes,
    Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Lat,
    Lng,
}

/// Every point the form knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointId {
    Threshold1,
    Threshold2,
    Center,
    Trajectory1,
    Trajectory2,
}

impl PointId {
    pub const ALL: [PointId; 5] = [
        PointId::Threshold1,
        PointId::Threshold2,
        PointId::Center,
        PointId::Trajectory1,
        PointId::Trajectory2,
    ];

    /// Display label shown on the form and the map.
    pub fn label(self) -> &'static str {
        match self {
            PointId::Threshold1 => "Umbral 1",
            PointId::Threshold2 => "Umbral 2",
            PointId::Center => "Centro Geométrico",
            PointId::Trajectory1 => "Punto Trayectoria 1",
            PointId::Trajectory2 => "Punto Trayectoria 2",
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub label: String,
    pub lat: DmsValue,
    pub lng: DmsValue,
    /// Ground elevation in meters, as displayed.
    pub elevation: Option<String>,
}

impl GeoPoint {
    pub fn new(id: PointId) -> Self {
        Self {
            label: id.label().to_string(),
            lat: DmsValue::default(),
            lng: DmsValue::default(),
            elevation: None,
        }
    }

    pub fn axis(&self, axis: Axis) -> &DmsValue {
        match axis {
            Axis::Lat => &self.lat,
            Axis::Lng => &self.lng,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut DmsValue {
        match axis {
            Axis::Lat => &mut self.lat,
            Axis::Lng => &mut self.lng,
        }
    }

    /// A point takes part in derivations once both degree fields hold text.
    pub fn is_populated(&self) -> bool {
        !self.lat.degrees.trim().is_empty() && !self.lng.degrees.trim().is_empty()
    }

    /// (lat, lng) in signed decimal degrees.
    pub fn decimal(&self) -> (f64, f64) {
        (self.lat.to_decimal(), self.lng.to_decimal())
    }
}

/// The named points of a site, addressed by [`PointId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePoints {
    pub threshold1: GeoPoint,
    pub threshold2: GeoPoint,
    pub center: GeoPoint,
    pub trajectory1: GeoPoint,
    pub trajectory2: GeoPoint,
}

impl Default for SitePoints {
    fn default() -> Self {
        Self {
            threshold1: GeoPoint::new(PointId::Threshold1),
            threshold2: GeoPoint::new(PointId::Threshold2),
            center: GeoPoint::new(PointId::Center),
            trajectory1: GeoPoint::new(PointId::Trajectory1),
            trajectory2: GeoPoint::new(PointId::Trajectory2),
        }
    }
}

impl SitePoints {
    pub fn get(&self, id: PointId) -> &GeoPoint {
        match id {
            PointId::Threshold1 => &self.threshold1,
            PointId::Threshold2 => &self.threshold2,
            PointId::Center => &self.center,
            PointId::Trajectory1 => &self.trajectory1,
            PointId::Trajectory2 => &self.trajectory2,
        }
    }

    pub fn get_mut(&mut self, id: PointId) -> &mut GeoPoint {
        match id {
            PointId::Threshold1 => &mut self.threshold1,
            PointId::Threshold2 => &mut self.threshold2,
            PointId::Center => &mut self.center,
            PointId::Trajectory1 => &mut self.trajectory1,
            PointId::Trajectory2 => &mut self.trajectory2,
        }
    }
}

/// Place classification picked on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaceClass {
    /// Runway landing site.
    Lad,
    /// Runway landing site, second category.
    Lada,
    /// Helipad.
    Ladh,
}

impl PlaceClass {
    pub fn kind(self) -> PlaceKind {
        match self {
            PlaceClass::Lad | PlaceClass::Lada => PlaceKind::RunwayPair,
            PlaceClass::Ladh => PlaceKind::HelipadArea,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    /// Two thresholds plus a derived center.
    RunwayPair,
    /// A center plus one or two approach-trajectory reference points.
    HelipadArea,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TrajectoryCount {
    #[default]
    One,
    Two,
}

impl TryFrom<u8> for TrajectoryCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("trajectory count must be 1 or 2, got {other}")),
        }
    }
}

impl From<TrajectoryCount> for u8 {
    fn from(count: TrajectoryCount) -> Self {
        match count {
            TrajectoryCount::One => 1,
            TrajectoryCount::Two => 2,
        }
    }
}

/// Where the derivation pipeline currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No pending edit.
    #[default]
    Idle,
    /// Edit observed, debounce timer running.
    Scheduled,
    /// Async resolutions in flight.
    Computing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclinationSource {
    /// Nothing estimated yet.
    #[default]
    Manual,
    /// Local linear estimate from the declination model.
    Estimated,
}

/// Everything the engine derives for a form session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedState {
    pub place_class: Option<PlaceClass>,
    pub trajectory_count: TrajectoryCount,
    pub points: SitePoints,
    /// Great-circle distance between the thresholds, whole meters.
    pub runway_length_m: Option<u32>,
    /// Negative = west.
    pub declination_deg: f64,
    pub declination_source: DeclinationSource,
    pub busy: bool,
    pub phase: Phase,
    pub generation: u64,
}

impl DerivedState {
    pub fn place_kind(&self) -> Option<PlaceKind> {
        self.place_class.map(PlaceClass::kind)
    }

    /// Points that are shown on the map for the current place kind.
    pub fn active_point_ids(&self) -> Vec<PointId> {
        let mut ids = Vec::with_capacity(3);
        match self.place_kind() {
            Some(PlaceKind::RunwayPair) => {
                ids.extend([PointId::Threshold1, PointId::Threshold2]);
            }
            Some(PlaceKind::HelipadArea) => {
                ids.push(PointId::Trajectory1);
                if self.trajectory_count == TrajectoryCount::Two {
                    ids.push(PointId::Trajectory2);
                }
            }
            None => {}
        }
        ids.push(PointId::Center);
        ids.retain(|id| self.points.get(*id).is_populated());
        ids
    }

    pub fn active_points(&self) -> Vec<&GeoPoint> {
        self.active_point_ids()
            .into_iter()
            .map(|id| self.points.get(id))
            .collect()
    }
}
