use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::model::{HourlyTemp, WeatherSnapshot};
use crate::source::{WeatherSource, truncate_body};

const ONECALL_BASE_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// OpenWeather One Call client: current conditions plus the hourly series
/// used for graph sampling.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, ONECALL_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self { api_key, base_url, http })
    }
}

#[derive(Debug, Deserialize)]
struct OwDescription {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    sunrise: i64,
    sunset: i64,
    temp: f64,
    feels_like: f64,
    humidity: u8,
    dew_point: f64,
    uvi: f64,
    clouds: u8,
    #[serde(default)]
    visibility: u32,
    wind_speed: f64,
    wind_deg: u16,
    weather: Vec<OwDescription>,
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    temp: OwDailyTemp,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    #[serde(default)]
    timezone_offset: i64,
    current: OwCurrent,
    #[serde(default)]
    hourly: Vec<OwHourly>,
    #[serde(default)]
    daily: Vec<OwDaily>,
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string().as_str()),
                ("lon", lon.to_string().as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("exclude", "minutely,alerts"),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (one call)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read OpenWeather response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather one call request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwOneCallResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather one call JSON")?;

        let condition = parsed
            .current
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let (temp_min, temp_max) = parsed
            .daily
            .first()
            .map(|d| (d.temp.min, d.temp.max))
            .unwrap_or((parsed.current.temp, parsed.current.temp));

        let pop = parsed.hourly.first().and_then(|h| h.pop);

        let hourly: Vec<HourlyTemp> = parsed
            .hourly
            .iter()
            .map(|h| HourlyTemp { dt: h.dt, temp: h.temp })
            .collect();

        Ok(WeatherSnapshot {
            temp_c: parsed.current.temp,
            feels_like_c: parsed.current.feels_like,
            temp_min_c: temp_min,
            temp_max_c: temp_max,
            condition,
            humidity_pct: parsed.current.humidity,
            uv_index: parsed.current.uvi,
            cloud_pct: parsed.current.clouds,
            dew_point_c: parsed.current.dew_point,
            visibility_m: parsed.current.visibility,
            wind_speed_mps: parsed.current.wind_speed,
            wind_deg: parsed.current.wind_deg,
            pop,
            rain_1h_mm: parsed.current.rain.map(|r| r.one_hour).unwrap_or(0.0),
            sunrise: parsed.current.sunrise,
            sunset: parsed.current.sunset,
            hourly: if hourly.is_empty() { None } else { Some(hourly) },
            timezone_offset: parsed.timezone_offset,
        })
    }
}
