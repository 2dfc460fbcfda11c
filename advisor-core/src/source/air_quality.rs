use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::FetchFailure;
use crate::model::AirQuality;
use crate::source::{AirQualitySource, truncate_body};

const AIR_POLLUTION_BASE_URL: &str = "https://api.openweathermap.org/data";
const PRIMARY_VERSION: &str = "3.0";
const FALLBACK_VERSION: &str = "2.5";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// PM2.5 grade. Boundaries are inclusive on the lower tier:
/// `<=15` good, `<=35` moderate, `<=75` poor, above that very poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pm25Grade {
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl Pm25Grade {
    pub fn label(&self) -> &'static str {
        match self {
            Pm25Grade::Good => "good",
            Pm25Grade::Moderate => "moderate",
            Pm25Grade::Poor => "poor",
            Pm25Grade::VeryPoor => "very poor",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Pm25Grade::Good => "The air is clean! Outdoor activities are fine.",
            Pm25Grade::Moderate => {
                "Air quality is moderate. Sensitive people should take care."
            }
            Pm25Grade::Poor => {
                "Air quality is poor. Wear a mask and avoid long outings."
            }
            Pm25Grade::VeryPoor => {
                "Air quality is very poor! Stay indoors as much as possible and mind your indoor air."
            }
        }
    }
}

/// Grade a PM2.5 concentration (ug/m3).
pub fn classify_pm25(pm25: f64) -> Pm25Grade {
    if pm25 <= 15.0 {
        Pm25Grade::Good
    } else if pm25 <= 35.0 {
        Pm25Grade::Moderate
    } else if pm25 <= 75.0 {
        Pm25Grade::Poor
    } else {
        Pm25Grade::VeryPoor
    }
}

/// OpenWeather air pollution client with version fallback: the primary
/// v3.0 endpoint is tried first, any failure falls through to v2.5 with
/// the same parameters.
#[derive(Debug, Clone)]
pub struct OpenWeatherAirQuality {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherAirQuality {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, AIR_POLLUTION_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build air quality HTTP client")?;

        Ok(Self { api_key, base_url, http })
    }

    async fn fetch_version(
        &self,
        version: &str,
        lat: f64,
        lon: f64,
    ) -> Result<AirQuality, FetchFailure> {
        let url = format!("{}/{}/air_pollution", self.base_url, version);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string().as_str()),
                ("lon", lon.to_string().as_str()),
                ("appid", self.api_key.as_str()),
            ])
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

        let parsed: AqResponse =
            serde_json::from_str(&body).map_err(|e| FetchFailure::Malformed(e.to_string()))?;

        let record = parsed.list.first().ok_or(FetchFailure::Empty)?;

        Ok(AirQuality { pm25: record.components.pm2_5, pm10: record.components.pm10 })
    }
}

#[derive(Debug, Deserialize)]
struct AqComponents {
    pm2_5: f64,
    pm10: f64,
}

#[derive(Debug, Deserialize)]
struct AqRecord {
    components: AqComponents,
}

#[derive(Debug, Deserialize)]
struct AqResponse {
    list: Vec<AqRecord>,
}

#[async_trait]
impl AirQualitySource for OpenWeatherAirQuality {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<AirQuality, FetchFailure> {
        match self.fetch_version(PRIMARY_VERSION, lat, lon).await {
            Ok(aq) => Ok(aq),
            Err(cause) => {
                tracing::warn!(
                    version = PRIMARY_VERSION,
                    %cause,
                    "air quality primary endpoint failed, falling back"
                );
                self.fetch_version(FALLBACK_VERSION, lat, lon).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grading_partitions_at_15_35_75_inclusive_lower() {
        assert_eq!(classify_pm25(0.0), Pm25Grade::Good);
        assert_eq!(classify_pm25(15.0), Pm25Grade::Good);
        assert_eq!(classify_pm25(15.1), Pm25Grade::Moderate);
        assert_eq!(classify_pm25(35.0), Pm25Grade::Moderate);
        assert_eq!(classify_pm25(35.1), Pm25Grade::Poor);
        assert_eq!(classify_pm25(75.0), Pm25Grade::Poor);
        assert_eq!(classify_pm25(75.1), Pm25Grade::VeryPoor);
        assert_eq!(classify_pm25(500.0), Pm25Grade::VeryPoor);
    }

    #[test]
    fn every_grade_has_advice() {
        for pm25 in [1.0, 20.0, 50.0, 100.0] {
            let grade = classify_pm25(pm25);
            assert!(!grade.advice().is_empty());
            assert!(!grade.label().is_empty());
        }
    }

    #[test]
    fn empty_record_list_is_tagged_empty() {
        let parsed: AqResponse = serde_json::from_str(r#"{"list": []}"#).expect("valid JSON");
        assert!(parsed.list.is_empty());
    }
}
