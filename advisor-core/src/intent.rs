//! Intent classification: which environmental facets does the utterance
//! actually ask about. Delegates to the summarizer; the answer is advisory
//! and an empty facet set is valid.

use crate::error::SummarizerError;
use crate::model::ConversationTurn;
use crate::summarizer::Summarizer;

/// The fixed facet vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentFacet {
    Temperature,
    Rain,
    AirQuality,
    Uv,
    DewPoint,
    Cloud,
    Wind,
    Clothing,
    SunriseSunset,
    Visibility,
    Pollen,
}

impl IntentFacet {
    pub fn token(&self) -> &'static str {
        match self {
            IntentFacet::Temperature => "temperature",
            IntentFacet::Rain => "rain",
            IntentFacet::AirQuality => "air_quality",
            IntentFacet::Uv => "uv",
            IntentFacet::DewPoint => "dew_point",
            IntentFacet::Cloud => "cloud",
            IntentFacet::Wind => "wind",
            IntentFacet::Clothing => "clothing",
            IntentFacet::SunriseSunset => "sunrise_sunset",
            IntentFacet::Visibility => "visibility",
            IntentFacet::Pollen => "pollen",
        }
    }

    pub const fn all() -> &'static [IntentFacet] {
        &[
            IntentFacet::Temperature,
            IntentFacet::Rain,
            IntentFacet::AirQuality,
            IntentFacet::Uv,
            IntentFacet::DewPoint,
            IntentFacet::Cloud,
            IntentFacet::Wind,
            IntentFacet::Clothing,
            IntentFacet::SunriseSunset,
            IntentFacet::Visibility,
            IntentFacet::Pollen,
        ]
    }

    /// Map one classifier token to a facet. Only the canonical snake_case
    /// vocabulary tokens match; anything else is dropped.
    fn from_token(token: &str) -> Option<IntentFacet> {
        IntentFacet::all().iter().copied().find(|f| f.token() == token)
    }
}

fn instruction(utterance: &str) -> String {
    let vocabulary = IntentFacet::all()
        .iter()
        .map(|f| f.token())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "From the sentence \"{utterance}\", pick which weather information \
         items the user wants to know, choosing only from: [{vocabulary}]. \
         Answer with just one or two of those tokens, comma separated."
    )
}

/// Tokenize a raw classifier reply on commas/whitespace/newlines, case-fold,
/// and keep only vocabulary members. Unknown tokens are silently dropped;
/// duplicates keep their first position.
pub fn parse_facets(raw: &str) -> Vec<IntentFacet> {
    let mut facets = Vec::new();
    for token in raw.to_lowercase().split([',', '\n', '\r', '\t', ' ']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(facet) = IntentFacet::from_token(token) {
            if !facets.contains(&facet) {
                facets.push(facet);
            }
        }
    }
    facets
}

/// Ask the summarizer which facets the utterance requests. An empty result
/// means "answer generally". Failures propagate; on the orchestrator's
/// general path they surface like any other summarizer failure.
pub async fn classify(
    summarizer: &dyn Summarizer,
    utterance: &str,
    history: &[ConversationTurn],
) -> Result<Vec<IntentFacet>, SummarizerError> {
    let mut turns: Vec<ConversationTurn> = history.to_vec();
    turns.push(ConversationTurn::user(instruction(utterance)));

    let raw = summarizer.generate(&turns).await?;
    let facets = parse_facets(&raw);
    tracing::debug!(?facets, %raw, "classified intent facets");

    Ok(facets)
}
