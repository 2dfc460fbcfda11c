use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::FetchFailure;
use crate::model::{PollenReading, PollenRisk, PollenType};
use crate::source::{PollenSource, truncate_body};

const AMBEE_BASE_URL: &str = "https://api.ambeedata.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Ambee pollen client. Surfaces exactly one reading per request: the type
/// whose risk ranks highest, ties broken by the provider's field order
/// (grass, tree, weed).
#[derive(Debug, Clone)]
pub struct AmbeePollenSource {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AmbeePollenSource {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, AMBEE_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build pollen HTTP client")?;

        Ok(Self { api_key, base_url, http })
    }
}

#[derive(Debug, Deserialize)]
struct AmbeeRisk {
    grass_pollen: Option<PollenRisk>,
    tree_pollen: Option<PollenRisk>,
    weed_pollen: Option<PollenRisk>,
}

#[derive(Debug, Deserialize)]
struct AmbeeCount {
    grass_pollen: Option<i64>,
    tree_pollen: Option<i64>,
    weed_pollen: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AmbeeRecord {
    #[serde(rename = "Risk")]
    risk: Option<AmbeeRisk>,
    #[serde(rename = "Count")]
    count: Option<AmbeeCount>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AmbeeResponse {
    #[serde(default)]
    data: Vec<AmbeeRecord>,
}

/// Pick the dominant reading from one provider record. Types are walked in
/// the provider's field order and a later type only wins with a strictly
/// higher risk, so equal-priority ties keep the first-seen type.
fn top_reading(record: &AmbeeRecord) -> Result<PollenReading, FetchFailure> {
    let risks = record
        .risk
        .as_ref()
        .ok_or_else(|| FetchFailure::Malformed("missing Risk object".to_string()))?;
    let counts = record
        .count
        .as_ref()
        .ok_or_else(|| FetchFailure::Malformed("missing Count object".to_string()))?;

    let entries = [
        (PollenType::Grass, risks.grass_pollen, counts.grass_pollen),
        (PollenType::Tree, risks.tree_pollen, counts.tree_pollen),
        (PollenType::Weed, risks.weed_pollen, counts.weed_pollen),
    ];

    let mut top: Option<(PollenType, PollenRisk, i64)> = None;
    for (kind, risk, count) in entries {
        let (Some(risk), Some(count)) = (risk, count) else { continue };
        match top {
            Some((_, best, _)) if risk.priority() <= best.priority() => {}
            _ => top = Some((kind, risk, count)),
        }
    }

    let (kind, risk, count) =
        top.ok_or_else(|| FetchFailure::Malformed("no per-type risk entries".to_string()))?;

    let time = record
        .updated_at
        .ok_or_else(|| FetchFailure::Malformed("missing updatedAt".to_string()))?;

    Ok(PollenReading { kind, count, risk, time })
}

#[async_trait]
impl PollenSource for AmbeePollenSource {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<PollenReading, FetchFailure> {
        let url = format!("{}/latest/pollen/by-lat-lng", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("lat", lat.to_string().as_str()), ("lng", lon.to_string().as_str())])
            .header("x-api-key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.into()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| FetchFailure::Transport(e.into()))?;

        if !status.is_success() {
            return Err(FetchFailure::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: AmbeeResponse =
            serde_json::from_str(&body).map_err(|e| FetchFailure::Malformed(e.to_string()))?;

        let record = parsed.data.first().ok_or(FetchFailure::Empty)?;

        top_reading(record)
    }
}
