//! # Geo
//!
//! Geocoding adapters and spherical radius math used by bootcamp
//! location handling and radius search.

pub mod geocoder;
pub mod radius;

pub use geocoder::{GeocodeError, GeocodedLocation, Geocoder, MapQuestGeocoder, StaticGeocoder};
pub use radius::{angular_radius, central_angle, within_sphere, DistanceUnit, GeoPoint};
