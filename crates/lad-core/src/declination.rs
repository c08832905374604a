//! Local linear approximation of magnetic declination.
//!
//! Not a World Magnetic Model evaluation: a reference value at one place and
//! epoch, corrected by a secular drift and two spatial gradients. Good for the
//! region the defaults are tuned around (Buenos Aires), degrading with distance.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Label reported alongside estimated declinations.
pub const SOURCE_LABEL: &str = "Est. lineal local";

/// Coefficients of the linear declination model. Degrees throughout;
/// negative declination = west.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclinationModel {
    /// Declination at the reference point and epoch.
    pub base_deg: f64,
    /// Decimal year the base value refers to.
    pub epoch_year: f64,
    /// Change per year.
    pub secular_drift_deg_per_year: f64,
    pub ref_lat: f64,
    pub ref_lng: f64,
    /// Change per degree of latitude away from `ref_lat`.
    pub lat_gradient: f64,
    /// Change per degree of longitude away from `ref_lng`.
    pub lng_gradient: f64,
}

impl Default for DeclinationModel {
    fn default() -> Self {
        Self {
            base_deg: -9.9,
            epoch_year: 2025.0,
            secular_drift_deg_per_year: -0.1,
            ref_lat: -34.6,
            ref_lng: -58.4,
            lat_gradient: -0.35,
            lng_gradient: -0.75,
        }
    }
}

impl DeclinationModel {
    /// Estimated declination at (lat, lng) on `as_of`.
    pub fn declination(&self, lat: f64, lng: f64, as_of: DateTime<Utc>) -> f64 {
        let lat = if lat.is_finite() { lat } else { self.ref_lat };
        let lng = if lng.is_finite() { lng } else { self.ref_lng };
        self.base_deg
            + self.secular_drift_deg_per_year * (decimal_year(as_of) - self.epoch_year)
            + self.lat_gradient * (lat - self.ref_lat)
            + self.lng_gradient * (lng - self.ref_lng)
    }
}

/// Declination from the default model.
pub fn declination(lat: f64, lng: f64, as_of: DateTime<Utc>) -> f64 {
    DeclinationModel::default().declination(lat, lng, as_of)
}

/// Year plus the elapsed fraction of it, e.g. 2024-07-02T00:00Z = 2024.5.
pub fn decimal_year(as_of: DateTime<Utc>) -> f64 {
    let year = as_of.year();
    let days_in_year = NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|last| last.ordinal())
        .unwrap_or(365) as f64;
    let elapsed_days =
        as_of.ordinal0() as f64 + as_of.num_seconds_from_midnight() as f64 / 86_400.0;
    year as f64 + elapsed_days / days_in_year
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn decimal_year_fractions() {
        assert_eq!(decimal_year(at(2025, 1, 1, 0)), 2025.0);
        // 2024 is a leap year: July 2 starts day 183 of 366.
        assert!((decimal_year(at(2024, 7, 2, 0)) - 2024.5).abs() < 1e-9);
        assert!(decimal_year(at(2024, 7, 2, 12)) > 2024.5);
    }

    #[test]
    fn base_value_at_reference() {
        let model = DeclinationModel::default();
        let value = model.declination(model.ref_lat, model.ref_lng, at(2025, 1, 1, 0));
        assert!((value - model.base_deg).abs() < 1e-12);
    }

    #[test]
    fn drift_accumulates_per_year() {
        let model = DeclinationModel::default();
        let now = model.declination(-34.6, -58.4, at(2025, 1, 1, 0));
        let later = model.declination(-34.6, -58.4, at(2027, 1, 1, 0));
        assert!((later - now - 2.0 * model.secular_drift_deg_per_year).abs() < 1e-9);
    }

    #[test]
    fn gradients_apply_linearly() {
        let model = DeclinationModel {
            secular_drift_deg_per_year: 0.0,
            ..Default::default()
        };
        let when = at(2030, 3, 1, 0);
        let west = model.declination(-34.6, -59.4, when);
        let south = model.declination(-35.6, -58.4, when);
        assert!((west - (model.base_deg - model.lng_gradient)).abs() < 1e-9);
        assert!((south - (model.base_deg - model.lat_gradient)).abs() < 1e-9);
    }

    #[test]
    fn deterministic_and_non_finite_safe() {
        let when = at(2026, 10, 16, 9);
        assert_eq!(declination(-31.4, -64.2, when), declination(-31.4, -64.2, when));
        assert!(declination(f64::NAN, f64::INFINITY, when).is_finite());
    }
}
