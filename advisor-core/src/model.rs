use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved place. Never cached across requests; every request
/// re-resolves its own location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

/// One entry of the hourly forecast series, ordered by `dt` ascending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HourlyTemp {
    /// Epoch seconds, UTC.
    pub dt: i64,
    pub temp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub condition: String,
    pub humidity_pct: u8,
    pub uv_index: f64,
    pub cloud_pct: u8,
    pub dew_point_c: f64,
    pub visibility_m: u32,
    pub wind_speed_mps: f64,
    pub wind_deg: u16,
    /// Precipitation probability in `[0, 1]`, when the provider reports one.
    pub pop: Option<f64>,
    /// Rain over the last hour, mm.
    pub rain_1h_mm: f64,
    /// Epoch seconds, UTC.
    pub sunrise: i64,
    pub sunset: i64,
    /// Raw hourly series for graph sampling, ordered by timestamp ascending.
    pub hourly: Option<Vec<HourlyTemp>>,
    /// Offset of the location's local time from UTC, in seconds.
    pub timezone_offset: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AirQuality {
    pub pm25: f64,
    pub pm10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollenType {
    Grass,
    Tree,
    Weed,
}

impl PollenType {
    pub fn label(&self) -> &'static str {
        match self {
            PollenType::Grass => "grass",
            PollenType::Tree => "tree",
            PollenType::Weed => "weed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PollenRisk {
    Low,
    Medium,
    High,
}

impl PollenRisk {
    /// Numeric ranking used to pick the dominant pollen type.
    pub fn priority(&self) -> u8 {
        match self {
            PollenRisk::Low => 1,
            PollenRisk::Medium => 2,
            PollenRisk::High => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PollenRisk::Low => "Low",
            PollenRisk::Medium => "Medium",
            PollenRisk::High => "High",
        }
    }
}

/// The single pollen facet surfaced per request: the type whose risk ranks
/// highest, ties broken by the provider's field order.
#[derive(Debug, Clone)]
pub struct PollenReading {
    pub kind: PollenType,
    pub count: i64,
    pub risk: PollenRisk,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

/// Read-only profile context folded into the composite prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub sensitive_factors: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
}

/// One sampled point of the 6-point temperature graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphPoint {
    /// 12-hour local clock label, e.g. "12am", "3pm".
    pub hour: String,
    pub temp: i32,
}
