//! Environmental data sources: weather, air quality, pollen.
//!
//! Each source is a pure function of `(lat, lon)`. Weather failures are
//! hard errors; air quality and pollen fail soft with a tagged
//! [`FetchFailure`] that callers log and degrade to "unavailable".

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::FetchFailure;
use crate::model::{AirQuality, PollenReading, WeatherSnapshot};

pub mod air_quality;
pub mod pollen;
pub mod weather;

#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot>;
}

#[async_trait]
pub trait AirQualitySource: Send + Sync + Debug {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<AirQuality, FetchFailure>;
}

#[async_trait]
pub trait PollenSource: Send + Sync + Debug {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<PollenReading, FetchFailure>;
}

/// Shorten an error body for logging. The cut point backs up to a char
/// boundary so multibyte provider messages cannot split mid-character.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
    format!("{}...", &body[..cut])
}

#[cfg(test)]
mod tests {
    use super::truncate_body;

    #[test]
    fn short_bodies_pass_through() {
        assert_eq!(truncate_body("bad request"), "bad request");
    }

    #[test]
    fn long_ascii_bodies_are_cut_at_the_limit() {
        let body = "x".repeat(300);
        let out = truncate_body(&body);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn multibyte_bodies_are_cut_on_a_char_boundary() {
        // 3 bytes per char; byte 200 falls inside a character.
        let body = "한".repeat(100);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.trim_end_matches("..."), "한".repeat(66));
    }
}
