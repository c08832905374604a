//! Runway and helipad reports for `lad-calc`.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use lad_core::declination::SOURCE_LABEL;
use lad_core::{
    DeclinationModel, DeclinationSource, DerivedState, Designation, DmsValue, GeoPoint,
    HelipadBearings, PlaceClass, PointId, RunwayDesignation, TrajectoryCount,
};

/// Parse `D:M:S` text such as `34:36:30`. Missing trailing fields stay blank.
pub fn parse_dms(text: &str) -> DmsValue {
    let mut parts = text.splitn(3, ':').map(str::trim);
    let degrees = parts.next().unwrap_or_default();
    let minutes = parts.next().unwrap_or_default();
    let seconds = parts.next().unwrap_or_default();
    DmsValue::new(degrees, minutes, seconds)
}

/// Build a named point from `D:M:S` latitude and longitude text.
pub fn parse_point(id: PointId, lat: &str, lng: &str) -> Result<GeoPoint> {
    let mut point = GeoPoint::new(id);
    point.lat = parse_dms(lat);
    point.lng = parse_dms(lng);
    if !point.is_populated() {
        bail!("{} needs degrees for both latitude and longitude", id);
    }
    Ok(point)
}

/// Where the declination for a report comes from.
#[derive(Debug, Clone, Copy)]
pub enum DeclinationInput {
    /// Value given on the command line.
    Manual(f64),
    /// Estimate at the site center.
    Estimate {
        model: DeclinationModel,
        as_of: DateTime<Utc>,
    },
}

impl DeclinationInput {
    fn apply(&self, state: &mut DerivedState) {
        match *self {
            DeclinationInput::Manual(degrees) => {
                state.declination_deg = degrees;
                state.declination_source = DeclinationSource::Manual;
            }
            DeclinationInput::Estimate { model, as_of } => {
                let (lat, lng) = state.points.center.decimal();
                let degrees = model.declination(lat, lng, as_of);
                state.declination_deg = (degrees * 100.0).round() / 100.0;
                state.declination_source = DeclinationSource::Estimated;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunwayReport {
    pub center: GeoPoint,
    pub length_m: u32,
    pub declination_source: DeclinationSource,
    pub designation: RunwayDesignation,
}

/// Center, length and designator for a threshold pair.
pub fn runway_report(
    threshold1: GeoPoint,
    threshold2: GeoPoint,
    declination: DeclinationInput,
) -> Result<RunwayReport> {
    let mut state = DerivedState {
        place_class: Some(PlaceClass::Lad),
        ..Default::default()
    };
    state.points.threshold1 = threshold1;
    state.points.threshold2 = threshold2;
    state.derive_geometry();
    declination.apply(&mut state);

    let (Some(length_m), Some(Designation::Runway(designation))) =
        (state.runway_length_m, state.designation())
    else {
        bail!("both thresholds need degrees for latitude and longitude");
    };

    Ok(RunwayReport {
        center: state.points.center,
        length_m,
        declination_source: state.declination_source,
        designation,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct HelipadReport {
    pub center: GeoPoint,
    pub declination_source: DeclinationSource,
    pub bearings: HelipadBearings,
}

/// Inbound magnetic bearings from one or two trajectory points.
pub fn helipad_report(
    center: GeoPoint,
    trajectory1: GeoPoint,
    trajectory2: Option<GeoPoint>,
    declination: DeclinationInput,
) -> Result<HelipadReport> {
    let mut state = DerivedState {
        place_class: Some(PlaceClass::Ladh),
        ..Default::default()
    };
    state.points.center = center;
    state.points.trajectory1 = trajectory1;
    if let Some(point) = trajectory2 {
        state.points.trajectory2 = point;
        state.trajectory_count = TrajectoryCount::Two;
    }
    declination.apply(&mut state);

    let Some(Designation::Helipad(bearings)) = state.designation() else {
        bail!("helipad center needs degrees for latitude and longitude");
    };

    Ok(HelipadReport {
        center: state.points.center,
        declination_source: state.declination_source,
        bearings,
    })
}

/// `34° 36' 36.00" S`
pub fn format_dms(value: &DmsValue, hemisphere: char) -> String {
    format!(
        "{}° {}' {}\" {}",
        value.degrees, value.minutes, value.seconds, hemisphere
    )
}

fn source_label(source: DeclinationSource) -> &'static str {
    match source {
        DeclinationSource::Manual => "manual",
        DeclinationSource::Estimated => SOURCE_LABEL,
    }
}

fn format_bearing(bearing: Option<f64>) -> String {
    bearing
        .map(|value| format!("{:.2}°", value))
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for RunwayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {}  {}",
            self.center.label,
            format_dms(&self.center.lat, 'S'),
            format_dms(&self.center.lng, 'W')
        )?;
        writeln!(f, "Length: {} m", self.length_m)?;
        writeln!(f, "True bearing: {:.2}°", self.designation.true_bearing_deg)?;
        writeln!(
            f,
            "Declination: {:.2}° ({})",
            self.designation.declination_deg,
            source_label(self.declination_source)
        )?;
        writeln!(
            f,
            "Magnetic bearing: {:.2}°",
            self.designation.magnetic_bearing_deg
        )?;
        write!(f, "Designator: {}", self.designation.designator)
    }
}

impl fmt::Display for HelipadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {}  {}",
            self.center.label,
            format_dms(&self.center.lat, 'S'),
            format_dms(&self.center.lng, 'W')
        )?;
        writeln!(
            f,
            "Declination: {:.2}° ({})",
            self.bearings.declination_deg,
            source_label(self.declination_source)
        )?;
        writeln!(
            f,
            "{} inbound: {}",
            PointId::Trajectory1.label(),
            format_bearing(self.bearings.trajectory1_deg)
        )?;
        write!(
            f,
            "{} inbound: {}",
            PointId::Trajectory2.label(),
            format_bearing(self.bearings.trajectory2_deg)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn thresholds() -> (GeoPoint, GeoPoint) {
        (
            parse_point(PointId::Threshold1, "34:36:30", "58:22:54").unwrap(),
            parse_point(PointId::Threshold2, "34:36:42", "58:23:10").unwrap(),
        )
    }

    #[test]
    fn dms_arguments() {
        assert_eq!(parse_dms("34:36:30"), DmsValue::new("34", "36", "30"));
        assert_eq!(parse_dms(" 34 : 36 "), DmsValue::new("34", "36", ""));
        assert_eq!(parse_dms("58:22:54,5"), DmsValue::new("58", "22", "54,5"));
        assert!(parse_point(PointId::Center, ":10:0", "58").is_err());
    }

    #[test]
    fn runway_with_manual_declination() {
        let (t1, t2) = thresholds();
        let report = runway_report(t1, t2, DeclinationInput::Manual(-9.9)).unwrap();

        assert_eq!(report.length_m, 550);
        assert_eq!(report.center.lat, DmsValue::new("34", "36", "36.00"));
        assert_eq!(report.center.lng, DmsValue::new("58", "23", "2.00"));
        assert_eq!(report.designation.designator, "24/06");
        assert_eq!(report.declination_source, DeclinationSource::Manual);

        let text = report.to_string();
        assert!(text.starts_with("Centro Geométrico: 34° 36' 36.00\" S  58° 23' 2.00\" W"));
        assert!(text.contains("Length: 550 m"));
        assert!(text.ends_with("Designator: 24/06"));
    }

    #[test]
    fn runway_with_estimated_declination() {
        let (t1, t2) = thresholds();
        let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let report = runway_report(
            t1,
            t2,
            DeclinationInput::Estimate {
                model: DeclinationModel::default(),
                as_of,
            },
        )
        .unwrap();

        assert_eq!(report.declination_source, DeclinationSource::Estimated);
        assert_eq!(report.designation.declination_deg, -9.91);
        assert!(report.to_string().contains("(Est. lineal local)"));
    }

    #[test]
    fn helipad_bearings() {
        let center = parse_point(PointId::Center, "34:36:36", "58:23:2").unwrap();
        let south = parse_point(PointId::Trajectory1, "34:37:0", "58:23:2").unwrap();
        let report = helipad_report(center, south, None, DeclinationInput::Manual(0.0)).unwrap();

        assert_eq!(report.bearings.trajectory1_deg, Some(0.0));
        assert_eq!(report.bearings.trajectory2_deg, None);
        assert!(report
            .to_string()
            .ends_with("Punto Trayectoria 2 inbound: -"));
    }

    #[test]
    fn helipad_second_trajectory() {
        let center = parse_point(PointId::Center, "34:36:36", "58:23:2").unwrap();
        let south = parse_point(PointId::Trajectory1, "34:37:0", "58:23:2").unwrap();
        let east = parse_point(PointId::Trajectory2, "34:36:36", "58:22:0").unwrap();
        let report =
            helipad_report(center, south, Some(east), DeclinationInput::Manual(-10.0)).unwrap();

        // Inbound from the east is roughly west, shifted by the declination.
        let inbound = report.bearings.trajectory2_deg.unwrap();
        assert!((inbound - 280.0).abs() < 0.1, "{}", inbound);
    }
}
