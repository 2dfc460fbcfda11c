use thiserror::Error;

/// Outcomes of location resolution that are not a usable `Location`.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Neither a place name nor coordinates were supplied.
    #[error("a location is required")]
    LocationRequired,

    /// Forward geocoding returned zero results for the given text.
    #[error("no location found for \"{0}\"")]
    NotFound(String),

    /// The geocoding service itself failed (network, bad payload).
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// Why a soft-failing fetcher (air quality, pollen) produced no data.
///
/// Callers collapse all variants into "data unavailable"; the tag only
/// exists so the cause can be logged before it disappears.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("provider returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider payload did not match the expected shape: {0}")]
    Malformed(String),

    #[error("provider returned an empty record list")]
    Empty,

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Failure of the external text summarizer. Carries the provider's HTTP
/// status when one was received, so the general path can surface it.
#[derive(Debug, Error)]
#[error("summarizer request failed{}: {message}", status_suffix(.status))]
pub struct SummarizerError {
    pub status: Option<u16>,
    pub message: String,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

/// Errors the orchestrator propagates to its caller. Everything else
/// (missing location, unavailable data) terminates in an apology reply
/// instead of an error.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error(transparent)]
    Summarizer(#[from] SummarizerError),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}
