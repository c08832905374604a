//! Runway geometry derived from the threshold pair.

use crate::codec;
use crate::geodesy;
use crate::models::{DerivedState, PlaceKind};

impl DerivedState {
    /// Re-derive the runway center and length from the thresholds. Helipads
    /// carry no runway length. Returns true when anything changed.
    ///
    /// Nothing is touched while either threshold is incomplete, so the last
    /// derived center stays on the map until the pair is whole again.
    pub fn derive_geometry(&mut self) -> bool {
        match self.place_kind() {
            Some(PlaceKind::RunwayPair) => {
                let points = &self.points;
                if !points.threshold1.is_populated() || !points.threshold2.is_populated() {
                    return false;
                }
                let (lat1, lng1) = points.threshold1.decimal();
                let (lat2, lng2) = points.threshold2.decimal();
                let (mid_lat, mid_lng) = geodesy::midpoint(lat1, lng1, lat2, lng2);
                let length = geodesy::distance(lat1, lng1, lat2, lng2).round() as u32;

                let mut changed = replace(&mut self.runway_length_m, Some(length));
                changed |= replace(&mut self.points.center.lat, codec::to_dms(mid_lat));
                changed |= replace(&mut self.points.center.lng, codec::to_dms(mid_lng));
                changed
            }
            Some(PlaceKind::HelipadArea) => replace(&mut self.runway_length_m, None),
            None => false,
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
