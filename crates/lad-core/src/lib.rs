//! Landing-site geodesy: DMS codec, great-circle math, declination
//! estimate, runway designators and the form state they act on.

pub mod codec;
pub mod declination;
pub mod designator;
pub mod edit;
pub mod geodesy;
mod geometry;
pub mod models;

pub use codec::{to_decimal, to_dms};
pub use declination::{declination, DeclinationModel};
pub use designator::{
    designate, magnetic_bearing, runway_designator, Designation, HelipadBearings,
    RunwayDesignation,
};
pub use edit::{Edit, EditError};
pub use geodesy::{bearing, distance, midpoint, EARTH_RADIUS_M};
pub use models::{
    Axis, DeclinationSource, DerivedState, DmsField, DmsValue, GeoPoint, Phase, PlaceClass,
    PlaceKind, PointId, SitePoints, TrajectoryCount,
};
