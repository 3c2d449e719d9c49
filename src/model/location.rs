//! Longitude/latitude pairs.

use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the globe. The API stores it as `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    lng: f64,
    lat: f64,
}

impl Location {
    /// Create a location from a longitude and a latitude.
    pub fn new(lng: f64, lat: f64) -> Result<Self> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(Error::Validation(format!(
                "location coordinates must be finite numbers, got lng={} lat={}",
                lng, lat
            )));
        }
        Ok(Self { lng, lat })
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Wire form, `[lng, lat]`.
    pub fn to_wire(&self) -> Value {
        json!([self.lng, self.lat])
    }

    /// `[lat, lng]`, the usual human order.
    pub fn to_lat_lng(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }

    /// Parse the wire form `[lng, lat]`.
    pub fn from_wire(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [lng, lat] => Self::new(lng.as_f64()?, lat.as_f64()?).ok(),
            _ => None,
        }
    }

    /// Haversine distance to another location, in meters.
    pub fn meters_from(&self, other: &Location) -> f64 {
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Haversine distance to another location, in kilometers.
    pub fn kilometers_from(&self, other: &Location) -> f64 {
        self.meters_from(other) / 1000.0
    }
}
