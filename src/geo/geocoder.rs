//! Address geocoding.
//!
//! Bootcamp addresses and radius-search postal codes are resolved through
//! the [`Geocoder`] trait. Production uses the MapQuest geocoding API; tests
//! and local development use [`StaticGeocoder`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use super::radius::GeoPoint;

/// Geocoding failures
#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    #[error("No location found for '{0}'")]
    NoMatch(String),

    #[error("Geocoder request failed: {0}")]
    Request(String),

    #[error("Unexpected geocoder response: {0}")]
    Response(String),
}

/// A resolved address
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeocodedLocation {
    pub point: Option<GeoPoint>,
    pub formatted_address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
}

impl GeocodedLocation {
    pub fn at(point: GeoPoint, formatted_address: impl Into<String>) -> Self {
        Self {
            point: Some(point),
            formatted_address: formatted_address.into(),
            ..Default::default()
        }
    }

    /// GeoJSON point stored in a bootcamp's `location` field
    pub fn to_geojson(&self) -> Value {
        let coordinates = match self.point {
            Some(p) => json!([p.longitude, p.latitude]),
            None => json!([]),
        };
        json!({
            "type": "Point",
            "coordinates": coordinates,
            "formattedAddress": self.formatted_address,
            "street": self.street,
            "city": self.city,
            "state": self.state,
            "zipcode": self.zipcode,
            "country": self.country,
        })
    }
}

/// Resolves free-form addresses to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<GeocodedLocation, GeocodeError>;
}

/// MapQuest geocoding API client
pub struct MapQuestGeocoder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl MapQuestGeocoder {
    pub const DEFAULT_ENDPOINT: &'static str = "https://www.mapquestapi.com/geocoding/v1/address";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    #[serde(default)]
    street: String,
    #[serde(default)]
    admin_area5: String,
    #[serde(default)]
    admin_area3: String,
    #[serde(default)]
    admin_area1: String,
    #[serde(default)]
    postal_code: String,
    lat_lng: MapQuestLatLng,
}

#[derive(Debug, Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

impl From<MapQuestLocation> for GeocodedLocation {
    fn from(loc: MapQuestLocation) -> Self {
        let formatted_address = [
            loc.street.as_str(),
            loc.admin_area5.as_str(),
            format!("{} {}", loc.admin_area3, loc.postal_code).trim(),
            loc.admin_area1.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            point: Some(GeoPoint::new(loc.lat_lng.lng, loc.lat_lng.lat)),
            formatted_address,
            street: loc.street,
            city: loc.admin_area5,
            state: loc.admin_area3,
            zipcode: loc.postal_code,
            country: loc.admin_area1,
        }
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, query: &str) -> Result<GeocodedLocation, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", self.api_key.as_str()), ("location", query)])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let body: MapQuestResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Response(e.to_string()))?;

        let location = body
            .results
            .into_iter()
            .flat_map(|r| r.locations)
            .next()
            .ok_or_else(|| GeocodeError::NoMatch(query.to_string()))?;

        debug!(query, "geocoded via MapQuest");
        Ok(location.into())
    }
}

/// Table-driven geocoder for tests and offline development
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, GeocodedLocation>,
    fallback: Option<GeoPoint>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every unknown query to `point`.
    pub fn centered(point: GeoPoint) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: Some(point),
        }
    }

    pub fn with_entry(mut self, query: &str, location: GeocodedLocation) -> Self {
        self.entries.insert(normalize(query), location);
        self
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<GeocodedLocation, GeocodeError> {
        if let Some(location) = self.entries.get(&normalize(query)) {
            return Ok(location.clone());
        }
        match self.fallback {
            Some(point) => Ok(GeocodedLocation::at(point, query.trim())),
            None => Err(GeocodeError::NoMatch(query.to_string())),
        }
    }
}
