//! Geocoding providers: the provider seam and the Nominatim client.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{BoundingBox, Candidate, LocationDetails, LocationError};
use crate::config::{base_url, ClientConfig};
use crate::transport::{read_json, ProviderFailure};

/// A source of ranked place candidates.
pub trait GeocodingProvider {
    /// Up to `limit` candidates for `text`, best match first, with country attributed.
    fn search(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, ProviderFailure>;

    /// Full address record for a coordinate pair.
    fn reverse(&self, latitude: f64, longitude: f64) -> Result<LocationDetails, LocationError>;
}

impl<P: GeocodingProvider + ?Sized> GeocodingProvider for Box<P> {
    fn search(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, ProviderFailure> {
        (**self).search(text, limit)
    }

    fn reverse(&self, latitude: f64, longitude: f64) -> Result<LocationDetails, LocationError> {
        (**self).reverse(latitude, longitude)
    }
}

// ─── Nominatim provider ─────────────────────────────────────────

#[derive(Deserialize, Debug, Clone)]
struct NominatimPlace {
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, rename = "type")]
    place_type: Option<String>,
    #[serde(default)]
    address: BTreeMap<String, Value>,
}

impl NominatimPlace {
    fn into_candidate(self, query: &str) -> Candidate {
        let country = self
            .address
            .get("country")
            .and_then(Value::as_str)
            .map(str::to_string);
        Candidate {
            latitude: raw_coordinate(&self.lat),
            longitude: raw_coordinate(&self.lon),
            display_name: self.display_name.unwrap_or_else(|| query.to_string()),
            country,
            place_type: self.place_type.unwrap_or_else(|| "unknown".into()),
        }
    }
}

/// Nominatim sends coordinates as decimal strings; some mirrors send numbers.
fn raw_coordinate(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[derive(Deserialize, Debug)]
struct NominatimReverse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: BTreeMap<String, Value>,
    #[serde(default)]
    boundingbox: Vec<String>,
}

impl NominatimReverse {
    fn into_details(self, latitude: f64, longitude: f64) -> Result<LocationDetails, LocationError> {
        if let Some(err) = self.error {
            return Err(LocationError::NotFound(err));
        }
        let address = self
            .address
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect();
        Ok(LocationDetails {
            latitude,
            longitude,
            display_name: self
                .display_name
                .unwrap_or_else(|| format!("{}, {}", latitude, longitude)),
            address,
            bounding_box: parse_bounding_box(&self.boundingbox),
        })
    }
}

/// Nominatim orders the box as `[min_lat, max_lat, min_lon, max_lon]`.
fn parse_bounding_box(raw: &[String]) -> Option<BoundingBox> {
    let values: Vec<f64> = raw
        .iter()
        .map(|s| s.trim().parse::<f64>().ok())
        .collect::<Option<_>>()?;
    match values.as_slice() {
        [min_lat, max_lat, min_lon, max_lon] => Some(BoundingBox {
            min_latitude: *min_lat,
            max_latitude: *max_lat,
            min_longitude: *min_lon,
            max_longitude: *max_lon,
        }),
        _ => None,
    }
}

/// OpenStreetMap Nominatim search/reverse client.
pub struct Nominatim {
    agent: ureq::Agent,
    base_url: String,
}

impl Nominatim {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            agent: config.agent(),
            base_url: base_url(&config.geocoder_url),
        }
    }
}

impl GeocodingProvider for Nominatim {
    fn search(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, ProviderFailure> {
        let url = format!("{}/search", self.base_url);
        debug!(%url, query = text, limit, "nominatim search");

        let response = self
            .agent
            .get(&url)
            .query("q", text)
            .query("format", "json")
            .query("limit", &limit.to_string())
            .query("addressdetails", "1")
            .call()?;

        let places: Vec<NominatimPlace> = read_json(response)?;
        debug!(query = text, results = places.len(), "nominatim search complete");
        Ok(places.into_iter().map(|p| p.into_candidate(text)).collect())
    }

    fn reverse(&self, latitude: f64, longitude: f64) -> Result<LocationDetails, LocationError> {
        let url = format!("{}/reverse", self.base_url);
        debug!(%url, latitude, longitude, "nominatim reverse");

        let response = self
            .agent
            .get(&url)
            .query("lat", &latitude.to_string())
            .query("lon", &longitude.to_string())
            .query("format", "json")
            .query("addressdetails", "1")
            .call()
            .map_err(ProviderFailure::from)?;

        let place: NominatimReverse = read_json(response)?;
        place.into_details(latitude, longitude)
    }
}
