//! Spherical distance math for radius searches.

use serde::{Deserialize, Serialize};

/// Earth radius used to convert kilometers to radians
pub const EARTH_RADIUS_KM: f64 = 6378.0;

/// Earth radius used to convert miles to radians
pub const EARTH_RADIUS_MI: f64 = 3963.0;

/// Unit of a radius search distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Miles,
}

impl DistanceUnit {
    /// Parse the optional `:unit` route segment; anything unrecognized is kilometers.
    pub fn parse(unit: Option<&str>) -> Self {
        match unit.map(|u| u.trim().to_ascii_lowercase()).as_deref() {
            Some("mi") | Some("mile") | Some("miles") => DistanceUnit::Miles,
            _ => DistanceUnit::Kilometers,
        }
    }

    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_MI,
        }
    }
}

/// Convert a surface distance into an angular radius (radians).
pub fn angular_radius(distance: f64, unit: DistanceUnit) -> f64 {
    distance / unit.earth_radius()
}

/// A point on the sphere, GeoJSON order (longitude first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Read a `[lng, lat]` coordinate pair.
    pub fn from_coordinates(value: &serde_json::Value) -> Option<Self> {
        let pair = value.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        Some(Self::new(pair[0].as_f64()?, pair[1].as_f64()?))
    }
}

/// Great-circle angle between two points in radians (haversine).
pub fn central_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Whether `point` lies inside the spherical cap around `center`.
pub fn within_sphere(point: GeoPoint, center: GeoPoint, radius: f64) -> bool {
    central_angle(point, center) <= radius
}
