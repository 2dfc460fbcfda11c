//! The advisory orchestrator: resolves a location, decides which data
//! facets the request needs, fetches them concurrently, and turns the
//! summarizer's text into the final reply.

use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ServiceId};
use crate::conversation::{ConversationStore, SHARED_SESSION};
use crate::error::{AdvisorError, GeoError};
use crate::format::{format_reply, strip_bold};
use crate::geo::{Geocoder, LocationQuery, NominatimGeocoder, resolve};
use crate::graph::sample_hourly;
use crate::intent::{self, IntentFacet};
use crate::model::{
    AirQuality, GraphPoint, Location, PollenReading, UserProfile, WeatherSnapshot,
};
use crate::profile::{JsonProfileStore, ProfileStore};
use crate::source::air_quality::{OpenWeatherAirQuality, classify_pm25};
use crate::source::pollen::AmbeePollenSource;
use crate::source::weather::OpenWeatherSource;
use crate::source::{AirQualitySource, PollenSource, WeatherSource};
use crate::summarizer::{GeminiSummarizer, Summarizer};

const ASK_LOCATION: &str = "Which place would you like me to check?";
const WEATHER_APOLOGY: &str =
    "Sorry, I couldn't fetch the weather right now. Please try again in a moment.";
const POLLEN_APOLOGY: &str =
    "Sorry, I couldn't fetch pollen data right now. Please try again later.";
const AIR_QUALITY_APOLOGY: &str =
    "Sorry, I couldn't fetch air quality data right now. Please try again in a moment.";
const POLLEN_SUMMARY_APOLOGY: &str =
    "Sorry, I couldn't put together a pollen answer right now. Please try again later.";
const AIR_SUMMARY_APOLOGY: &str =
    "Sorry, I couldn't put together an air quality answer right now. Please try again later.";

/// Utterance literals that short-circuit to the dedicated pollen path.
const POLLEN_KEYWORDS: &[&str] = &["pollen", "꽃가루"];

/// Utterance literals that short-circuit to the dedicated air quality path.
const AIR_KEYWORDS: &[&str] = &["fine dust", "air quality", "미세먼지"];

/// Utterance literals that force the hourly temperature graph.
const GRAPH_KEYWORDS: &[&str] = &[
    "temperature", "temp", "graph", "wear", "clothing", "outfit",
    "기온", "온도", "그래프", "옷",
];

/// One incoming chat request.
#[derive(Debug, Clone, Default)]
pub struct AdviceRequest {
    pub user_input: String,
    /// Place name already extracted from the utterance, if any.
    pub place: Option<String>,
    /// Device coordinates, used when no place name is given.
    pub coords: Option<(f64, f64)>,
    pub uid: Option<String>,
}

/// The orchestrator's answer.
#[derive(Debug, Clone)]
pub struct Advice {
    pub reply: String,
    /// Present whenever a location was resolved, including apology replies
    /// further down the pipeline.
    pub location: Option<Location>,
    /// Present when the air quality facet was fetched.
    pub air_quality: Option<AirQuality>,
    /// Present when the request asked for the temperature graph.
    pub hourly_graph: Option<Vec<GraphPoint>>,
}

impl Advice {
    fn reply_only(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), location: None, air_quality: None, hourly_graph: None }
    }

    fn at(location: Location, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            location: Some(location),
            air_quality: None,
            hourly_graph: None,
        }
    }
}

/// Response path for one request, in priority order: the pollen keyword
/// wins over the fine-dust keyword, and only keyword-free utterances go
/// through full intent classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Pollen,
    AirQuality,
    General,
}

fn select_branch(utterance: &str) -> Branch {
    let lower = utterance.to_lowercase();
    if POLLEN_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Branch::Pollen
    } else if AIR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Branch::AirQuality
    } else {
        Branch::General
    }
}

fn wants_graph(utterance: &str, facets: &[IntentFacet]) -> bool {
    let lower = utterance.to_lowercase();
    GRAPH_KEYWORDS.iter().any(|k| lower.contains(k))
        || facets.contains(&IntentFacet::Clothing)
        || facets.contains(&IntentFacet::Temperature)
}

pub struct Advisor {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherSource>,
    air: Arc<dyn AirQualitySource>,
    pollen: Arc<dyn PollenSource>,
    summarizer: Arc<dyn Summarizer>,
    profiles: Arc<dyn ProfileStore>,
    store: ConversationStore,
}

impl Advisor {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherSource>,
        air: Arc<dyn AirQualitySource>,
        pollen: Arc<dyn PollenSource>,
        summarizer: Arc<dyn Summarizer>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            geocoder,
            weather,
            air,
            pollen,
            summarizer,
            profiles,
            store: ConversationStore::new(),
        }
    }

    /// Wire up the concrete clients from stored API keys. The profile file
    /// is optional; a missing one degrades to an empty store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let openweather_key = config.require_api_key(ServiceId::OpenWeather)?.to_owned();
        let ambee_key = config.require_api_key(ServiceId::Ambee)?.to_owned();
        let gemini_key = config.require_api_key(ServiceId::Gemini)?.to_owned();

        let profiles = match profile_file_path() {
            Some(path) if path.exists() => JsonProfileStore::from_path(&path)?,
            _ => JsonProfileStore::empty(),
        };

        Ok(Self::new(
            Arc::new(NominatimGeocoder::new()?),
            Arc::new(OpenWeatherSource::new(openweather_key.clone())?),
            Arc::new(OpenWeatherAirQuality::new(openweather_key)?),
            Arc::new(AmbeePollenSource::new(ambee_key)?),
            Arc::new(GeminiSummarizer::new(gemini_key)?),
            Arc::new(profiles),
        ))
    }

    /// Handle one request end to end. Missing locations and unavailable
    /// data terminate in an `Ok` apology reply; only summarizer failures on
    /// the general path and upstream faults propagate as errors.
    pub async fn advise(&self, request: &AdviceRequest) -> Result<Advice, AdvisorError> {
        let session = request.uid.as_deref().unwrap_or(SHARED_SESSION);

        let query = LocationQuery {
            free_text: request.place.clone(),
            coords: request.coords,
        };

        let location = match resolve(self.geocoder.as_ref(), &query).await {
            Ok(location) => location,
            Err(GeoError::LocationRequired) => {
                return Ok(Advice::reply_only(ASK_LOCATION));
            }
            Err(GeoError::NotFound(name)) => {
                return Ok(Advice::reply_only(format!(
                    "Sorry, I couldn't find a place called \"{name}\"."
                )));
            }
            Err(GeoError::Upstream(e)) => return Err(AdvisorError::Upstream(e)),
        };

        tracing::info!(name = %location.name, lat = location.lat, lon = location.lon, "resolved location");

        match select_branch(&request.user_input) {
            Branch::Pollen => self.pollen_path(session, location).await,
            Branch::AirQuality => self.air_quality_path(session, location).await,
            Branch::General => self.general_path(session, location, request).await,
        }
    }

    async fn pollen_path(
        &self,
        session: &str,
        location: Location,
    ) -> Result<Advice, AdvisorError> {
        let reading = match self.pollen.fetch(location.lat, location.lon).await {
            Ok(reading) => reading,
            Err(cause) => {
                tracing::warn!(%cause, "pollen fetch failed");
                return Ok(Advice::at(location, POLLEN_APOLOGY));
            }
        };

        let prompt = pollen_prompt(&location.name, &reading);
        let reply = self
            .summarize(session, prompt, Some(POLLEN_SUMMARY_APOLOGY))
            .await?;

        Ok(Advice::at(location, reply))
    }

    async fn air_quality_path(
        &self,
        session: &str,
        location: Location,
    ) -> Result<Advice, AdvisorError> {
        let air = match self.air.fetch(location.lat, location.lon).await {
            Ok(air) => air,
            Err(cause) => {
                tracing::warn!(%cause, "air quality fetch failed");
                return Ok(Advice::at(location, AIR_QUALITY_APOLOGY));
            }
        };

        let prompt = air_quality_prompt(&location.name, air);
        let reply = self.summarize(session, prompt, Some(AIR_SUMMARY_APOLOGY)).await?;

        Ok(Advice {
            reply,
            location: Some(location),
            air_quality: Some(air),
            hourly_graph: None,
        })
    }

    async fn general_path(
        &self,
        session: &str,
        location: Location,
        request: &AdviceRequest,
    ) -> Result<Advice, AdvisorError> {
        let profile = match request.uid.as_deref() {
            Some(uid) => self.profiles.get(uid).await.map_err(AdvisorError::Upstream)?,
            None => None,
        };

        let history = self.store.history(session);
        let facets = intent::classify(
            self.summarizer.as_ref(),
            &request.user_input,
            &history,
        )
        .await?;

        let need_air = facets.contains(&IntentFacet::AirQuality);
        let need_pollen = facets.contains(&IntentFacet::Pollen);

        // The needed fetches run concurrently; a soft failure in one must
        // not affect the others.
        let weather_fut = self.weather.fetch(location.lat, location.lon);
        let air_fut = async {
            if need_air { Some(self.air.fetch(location.lat, location.lon).await) } else { None }
        };
        let pollen_fut = async {
            if need_pollen {
                Some(self.pollen.fetch(location.lat, location.lon).await)
            } else {
                None
            }
        };
        let (weather_res, air_res, pollen_res) = tokio::join!(weather_fut, air_fut, pollen_fut);

        let weather = match weather_res {
            Ok(weather) => weather,
            Err(cause) => {
                tracing::warn!(%cause, "weather fetch failed");
                return Ok(Advice::at(location, WEATHER_APOLOGY));
            }
        };

        let air = air_res.and_then(|res| match res {
            Ok(air) => Some(air),
            Err(cause) => {
                tracing::warn!(%cause, "air quality fetch failed, omitting facet");
                None
            }
        });

        let pollen = pollen_res.and_then(|res| match res {
            Ok(reading) => Some(reading),
            Err(cause) => {
                tracing::warn!(%cause, "pollen fetch failed, omitting facet");
                None
            }
        });

        let hourly_graph = if wants_graph(&request.user_input, &facets) {
            weather
                .hourly
                .as_deref()
                .map(|hourly| sample_hourly(hourly, weather.timezone_offset, Utc::now()))
                .filter(|points| !points.is_empty())
        } else {
            None
        };

        let prompt = composite_prompt(
            &request.user_input,
            &location.name,
            profile.as_ref(),
            &weather,
            air,
            pollen.as_ref(),
        );

        // General path: a summarizer failure propagates with its status.
        let reply = self.summarize(session, prompt, None).await?;

        Ok(Advice { reply, location: Some(location), air_quality: air, hourly_graph })
    }

    /// Append the prompt as a user turn, run the summarizer over the full
    /// history, then store the bold-stripped reply, trim, and format it.
    ///
    /// `apology` makes the summarizer failure soft (the dedicated pollen
    /// and air quality paths); without it the error propagates.
    async fn summarize(
        &self,
        session: &str,
        prompt: String,
        apology: Option<&str>,
    ) -> Result<String, AdvisorError> {
        self.store.push_user(session, prompt);
        let history = self.store.history(session);

        let raw = match self.summarizer.generate(&history).await {
            Ok(raw) => raw,
            Err(cause) => {
                return match apology {
                    Some(apology) => {
                        tracing::warn!(%cause, "summarizer failed, replying with apology");
                        Ok(apology.to_string())
                    }
                    None => Err(cause.into()),
                };
            }
        };

        let stripped = strip_bold(&raw);
        self.store.push_assistant(session, stripped.clone());

        Ok(format_reply(&stripped))
    }
}

fn profile_file_path() -> Option<PathBuf> {
    Config::config_file_path().ok().and_then(|p| {
        p.parent().map(|dir| dir.join("profiles.json"))
    })
}

fn pollen_prompt(location_name: &str, reading: &PollenReading) -> String {
    format!(
        "Current pollen report for \"{location_name}\" ({} pollen):\n\
         - Count: {} particles\n\
         - Risk: {}\n\
         - Measured at: {}\n\n\
         Summarize this for the user in a friendly tone and add one \
         practical allergy tip, in 3-4 sentences.",
        reading.kind.label(),
        reading.count,
        reading.risk.label(),
        reading.time.format("%Y-%m-%d %H:%M UTC"),
    )
}

fn air_quality_prompt(location_name: &str, air: AirQuality) -> String {
    let grade = classify_pm25(air.pm25);
    format!(
        "Current air quality for \"{location_name}\":\n\
         - PM2.5: {} ug/m3 ({})\n\
         - PM10: {} ug/m3\n\n\
         {}\n\n\
         Summarize this for the user in a friendly tone, in 3-4 sentences.",
        air.pm25,
        grade.label(),
        air.pm10,
        grade.advice(),
    )
}

fn composite_prompt(
    user_input: &str,
    location_name: &str,
    profile: Option<&UserProfile>,
    weather: &WeatherSnapshot,
    air: Option<AirQuality>,
    pollen: Option<&PollenReading>,
) -> String {
    let mut prompt = String::new();

    if let Some(profile) = profile {
        prompt.push_str(&format!(
            "User profile:\n- Name: {}\n- Sensitivities: {}\n- Hobbies: {}\n\n",
            profile.name,
            join_or_none(&profile.sensitive_factors),
            join_or_none(&profile.hobbies),
        ));
    }

    let pop = weather
        .pop
        .map(|p| format!("{}%", (p * 100.0).round()))
        .unwrap_or_else(|| "no data".to_string());

    prompt.push_str(&format!(
        "Weather for {location_name}:\n\
         - Temperature: {}C\n\
         - Feels like: {}C\n\
         - Low: {}C\n\
         - High: {}C\n\
         - Condition: {}\n\
         - Humidity: {}%\n\
         - UV index: {}\n\
         - Cloud cover: {}%\n\
         - Dew point: {}C\n\
         - Visibility: {}m\n\
         - Wind: {}m/s from {} degrees\n\
         - Chance of rain: {}\n\
         - Rain last hour: {}mm\n\
         - Sunrise: {}\n\
         - Sunset: {}\n",
        weather.temp_c,
        weather.feels_like_c,
        weather.temp_min_c,
        weather.temp_max_c,
        weather.condition,
        weather.humidity_pct,
        weather.uv_index,
        weather.cloud_pct,
        weather.dew_point_c,
        weather.visibility_m,
        weather.wind_speed_mps,
        weather.wind_deg,
        pop,
        weather.rain_1h_mm,
        format_epoch(weather.sunrise),
        format_epoch(weather.sunset),
    ));

    if let Some(air) = air {
        prompt.push_str(&format!(
            "- Fine dust: PM2.5 {} ug/m3, PM10 {} ug/m3\n",
            air.pm25, air.pm10
        ));
    }

    if let Some(pollen) = pollen {
        prompt.push_str(&format!(
            "- Pollen: {} ({} particles, {})\n",
            pollen.kind.label(),
            pollen.count,
            pollen.risk.label(),
        ));
    }

    prompt.push_str(&format!(
        "\nUsing the information above, answer the user's question \
         \"{user_input}\" in a friendly, practical way. Keep the advice to \
         3-4 sentences where possible."
    ));

    prompt
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() { "none".to_string() } else { items.join(", ") }
}

fn format_epoch(epoch: i64) -> String {
    chrono::DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PollenRisk, PollenType};
    use chrono::TimeZone;

    #[test]
    fn pollen_keyword_wins_over_air_keyword() {
        assert_eq!(select_branch("pollen and fine dust please"), Branch::Pollen);
        assert_eq!(select_branch("Is the fine dust bad today?"), Branch::AirQuality);
        assert_eq!(select_branch("미세먼지 어때?"), Branch::AirQuality);
        assert_eq!(select_branch("꽃가루 조심해야 해?"), Branch::Pollen);
        assert_eq!(select_branch("Will it rain tomorrow?"), Branch::General);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(select_branch("POLLEN forecast?"), Branch::Pollen);
        assert_eq!(select_branch("Air Quality check"), Branch::AirQuality);
    }

    #[test]
    fn graph_terms_force_the_hourly_series() {
        assert!(wants_graph("what should I wear today?", &[]));
        assert!(wants_graph("show me the temperature graph", &[]));
        assert!(!wants_graph("will it rain?", &[]));
        assert!(wants_graph("will it rain?", &[IntentFacet::Clothing]));
    }

    #[test]
    fn pollen_prompt_mentions_type_count_and_risk() {
        let reading = PollenReading {
            kind: PollenType::Tree,
            count: 40,
            risk: PollenRisk::High,
            time: Utc.with_ymd_and_hms(2025, 6, 4, 11, 0, 0).unwrap(),
        };

        let prompt = pollen_prompt("Seoul", &reading);
        assert!(prompt.contains("tree"));
        assert!(prompt.contains("40"));
        assert!(prompt.contains("High"));
        assert!(prompt.contains("2025-06-04 11:00 UTC"));
    }

    #[test]
    fn air_quality_prompt_carries_grade_and_advice() {
        let prompt = air_quality_prompt("Seoul", AirQuality { pm25: 50.0, pm10: 80.0 });
        assert!(prompt.contains("PM2.5: 50"));
        assert!(prompt.contains("(poor)"));
        assert!(prompt.contains("Wear a mask"));
    }

    #[test]
    fn composite_prompt_includes_optional_blocks_only_when_present() {
        let weather = sample_weather();

        let bare = composite_prompt("how is it?", "Seoul", None, &weather, None, None);
        assert!(!bare.contains("Fine dust"));
        assert!(!bare.contains("Pollen:"));
        assert!(!bare.contains("User profile"));

        let profile = UserProfile {
            name: "Dana".into(),
            sensitive_factors: vec!["pollen".into()],
            hobbies: vec![],
        };
        let reading = PollenReading {
            kind: PollenType::Grass,
            count: 12,
            risk: PollenRisk::Low,
            time: Utc.with_ymd_and_hms(2025, 6, 4, 11, 0, 0).unwrap(),
        };
        let full = composite_prompt(
            "how is it?",
            "Seoul",
            Some(&profile),
            &weather,
            Some(AirQuality { pm25: 10.0, pm10: 20.0 }),
            Some(&reading),
        );
        assert!(full.contains("Name: Dana"));
        assert!(full.contains("Hobbies: none"));
        assert!(full.contains("Fine dust: PM2.5 10"));
        assert!(full.contains("Pollen: grass (12 particles, Low)"));
    }

    fn sample_weather() -> WeatherSnapshot {
        WeatherSnapshot {
            temp_c: 21.0,
            feels_like_c: 20.5,
            temp_min_c: 15.0,
            temp_max_c: 25.0,
            condition: "clear sky".into(),
            humidity_pct: 50,
            uv_index: 5.0,
            cloud_pct: 10,
            dew_point_c: 10.0,
            visibility_m: 10000,
            wind_speed_mps: 3.0,
            wind_deg: 180,
            pop: Some(0.2),
            rain_1h_mm: 0.0,
            sunrise: 1_717_452_000,
            sunset: 1_717_504_800,
            hourly: None,
            timezone_offset: 32400,
        }
    }
}
