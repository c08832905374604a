//! LAD CLI - command line tools over the landing-site geodesy.
//!
//! The `lad-calc` binary converts coordinates and derives runway
//! designators and helipad approach bearings without a running server.

pub mod report;

pub use report::{
    helipad_report, parse_dms, parse_point, runway_report, DeclinationInput, HelipadReport,
    RunwayReport,
};
