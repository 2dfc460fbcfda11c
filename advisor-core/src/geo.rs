//! Location resolution: free-text place names or raw coordinates in,
//! `(lat, lon, canonical name)` out. Backed by Nominatim (OpenStreetMap).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use std::time::Duration;

use crate::error::GeoError;
use crate::model::Location;

const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "env-advisor/0.1 (github.com/env-advisor)";

/// Canonical name used when reverse geocoding yields neither a locality
/// nor a country.
const UNKNOWN_PLACE: &str = "Unknown";

/// Input to location resolution. A non-empty `free_text` takes priority
/// over `coords`.
#[derive(Debug, Clone, Default)]
pub struct LocationQuery {
    pub free_text: Option<String>,
    pub coords: Option<(f64, f64)>,
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Forward-geocode a place name. `Ok(None)` means zero results.
    async fn forward(&self, text: &str) -> Result<Option<(f64, f64)>>;

    /// Reverse-geocode coordinates to a `"city, country"` style name.
    /// `Ok(None)` means no locality or country component was found.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>>;
}

/// Resolve a query into a [`Location`] according to the precedence rules:
/// free text first (the text itself becomes the canonical name), then
/// coordinates (reverse-geocoded name, `"Unknown"` when nothing comes back),
/// otherwise the caller has to ask the user for a place.
pub async fn resolve(geocoder: &dyn Geocoder, query: &LocationQuery) -> Result<Location, GeoError> {
    if let Some(text) = query.free_text.as_deref().filter(|t| !t.trim().is_empty()) {
        let (lat, lon) = geocoder
            .forward(text)
            .await?
            .ok_or_else(|| GeoError::NotFound(text.to_string()))?;

        return Ok(Location { lat, lon, name: text.to_string() });
    }

    if let Some((lat, lon)) = query.coords {
        let name = geocoder
            .reverse(lat, lon)
            .await?
            .unwrap_or_else(|| UNKNOWN_PLACE.to_string());

        return Ok(Location { lat, lon, name });
    }

    Err(GeoError::LocationRequired)
}

/// Nominatim client. Free, no API key required.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self> {
        Self::with_base_url(NOMINATIM_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build geocoding HTTP client")?;

        Ok(Self { base_url, http })
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn forward(&self, text: &str) -> Result<Option<(f64, f64)>> {
        let url = format!("{}/search", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", text), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .context("Failed to send request to Nominatim (search)")?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Nominatim search failed with status {status}"));
        }

        let hits: Vec<SearchHit> =
            res.json().await.context("Failed to parse Nominatim search JSON")?;

        let Some(hit) = hits.first() else {
            return Ok(None);
        };

        let lat = hit.lat.parse::<f64>().context("Nominatim returned a non-numeric latitude")?;
        let lon = hit.lon.parse::<f64>().context("Nominatim returned a non-numeric longitude")?;

        Ok(Some((lat, lon)))
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string().as_str()),
                ("lon", lon.to_string().as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("zoom", "10"),
            ])
            .send()
            .await
            .context("Failed to send request to Nominatim (reverse)")?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Nominatim reverse failed with status {status}"));
        }

        let body: ReverseResponse =
            res.json().await.context("Failed to parse Nominatim reverse JSON")?;

        let Some(addr) = body.address else {
            return Ok(None);
        };

        let country = addr.country.clone();

        // Prefer city > town > village > municipality for the locality name.
        let locality = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.municipality)
            .or(addr.county)
            .or(addr.state);

        let name = match (locality, country) {
            (Some(place), Some(country)) if country != place => {
                Some(format!("{place}, {country}"))
            }
            (Some(place), _) => Some(place),
            (None, Some(country)) => Some(country),
            (None, None) => None,
        };

        Ok(name)
    }
}
