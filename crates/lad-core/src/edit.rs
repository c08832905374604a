//! Typed form edits.
//!
//! Every editable field is addressed by a closed set of identifiers, so an
//! edit can only touch the branch of [`DerivedState`] it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Axis, DerivedState, DmsField, PlaceClass, PlaceKind, PointId, TrajectoryCount};

/// A single user edit, as received from the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Edit {
    /// Text typed into one degrees/minutes/seconds box.
    Coordinate {
        point: PointId,
        axis: Axis,
        field: DmsField,
        value: String,
    },
    /// Place classification radio; `None` clears the selection.
    PlaceClass { place_class: Option<PlaceClass> },
    /// Helipad trajectory count selector.
    TrajectoryCount { count: TrajectoryCount },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("{0} is derived from the runway thresholds and cannot be edited")]
    DerivedField(PointId),
}

impl Edit {
    pub fn coordinate(point: PointId, axis: Axis, field: DmsField, value: impl Into<String>) -> Self {
        Edit::Coordinate {
            point,
            axis,
            field,
            value: value.into(),
        }
    }

    /// Check the edit against the current state without applying it.
    pub fn validate(&self, state: &DerivedState) -> Result<(), EditError> {
        match self {
            Edit::Coordinate {
                point: PointId::Center,
                ..
            } if state.place_kind() == Some(PlaceKind::RunwayPair) => {
                Err(EditError::DerivedField(PointId::Center))
            }
            _ => Ok(()),
        }
    }

    /// Apply the raw edit to `state`. Derived fields are left alone; those
    /// are the pipeline's job.
    pub fn apply(&self, state: &mut DerivedState) -> Result<(), EditError> {
        self.validate(state)?;
        match self {
            Edit::Coordinate {
                point,
                axis,
                field,
                value,
            } => {
                state
                    .points
                    .get_mut(*point)
                    .axis_mut(*axis)
                    .set(*field, value.clone());
            }
            Edit::PlaceClass { place_class } => state.place_class = *place_class,
            Edit::TrajectoryCount { count } => state.trajectory_count = *count,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_edit_touches_one_field() {
        let mut state = DerivedState::default();
        let edit = Edit::coordinate(PointId::Threshold2, Axis::Lng, DmsField::Seconds, "10");
        edit.apply(&mut state).unwrap();

        assert_eq!(state.points.threshold2.lng.seconds, "10");
        assert_eq!(state.points.threshold2.lat.seconds, "");
        assert_eq!(state.points.threshold1.lng.seconds, "");
    }

    #[test]
    fn runway_center_is_not_editable() {
        let mut state = DerivedState {
            place_class: Some(PlaceClass::Lada),
            ..Default::default()
        };
        let edit = Edit::coordinate(PointId::Center, Axis::Lat, DmsField::Degrees, "34");
        assert_eq!(
            edit.apply(&mut state),
            Err(EditError::DerivedField(PointId::Center))
        );
        assert_eq!(state.points.center.lat.degrees, "");
    }

    #[test]
    fn helipad_center_is_editable() {
        let mut state = DerivedState {
            place_class: Some(PlaceClass::Ladh),
            ..Default::default()
        };
        let edit = Edit::coordinate(PointId::Center, Axis::Lat, DmsField::Degrees, "34");
        edit.apply(&mut state).unwrap();
        assert_eq!(state.points.center.lat.degrees, "34");
    }

    #[test]
    fn selection_edits() {
        let mut state = DerivedState::default();
        Edit::PlaceClass {
            place_class: Some(PlaceClass::Ladh),
        }
        .apply(&mut state)
        .unwrap();
        Edit::TrajectoryCount {
            count: TrajectoryCount::Two,
        }
        .apply(&mut state)
        .unwrap();
        assert_eq!(state.place_class, Some(PlaceClass::Ladh));
        assert_eq!(state.trajectory_count, TrajectoryCount::Two);
    }

    #[test]
    fn edits_deserialize_from_tagged_json() {
        let edit: Edit = serde_json::from_str(
            r#"{"type":"coordinate","point":"threshold1","axis":"lat","field":"minutes","value":"36"}"#,
        )
        .unwrap();
        assert_eq!(
            edit,
            Edit::coordinate(PointId::Threshold1, Axis::Lat, DmsField::Minutes, "36")
        );

        let edit: Edit =
            serde_json::from_str(r#"{"type":"place_class","place_class":"LADH"}"#).unwrap();
        assert_eq!(
            edit,
            Edit::PlaceClass {
                place_class: Some(PlaceClass::Ladh)
            }
        );

        let edit: Edit = serde_json::from_str(r#"{"type":"trajectory_count","count":2}"#).unwrap();
        assert_eq!(
            edit,
            Edit::TrajectoryCount {
                count: TrajectoryCount::Two
            }
        );
    }
}
