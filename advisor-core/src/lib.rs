//! Core library for the environmental advisory chat.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location resolution and the environmental data sources
//!   (weather, air quality with version fallback, pollen with risk ranking)
//! - Intent classification and the summarizer abstraction
//! - The advisory orchestrator, bounded conversation store, response
//!   formatter, and temperature graph sampler
//!
//! It is used by `advisor-cli`, but can also be reused by other binaries or
//! services.

pub mod advisor;
pub mod config;
pub mod conversation;
pub mod error;
pub mod format;
pub mod geo;
pub mod graph;
pub mod intent;
pub mod model;
pub mod profile;
pub mod source;
pub mod summarizer;

pub use advisor::{Advice, AdviceRequest, Advisor};
pub use config::{Config, ServiceConfig, ServiceId};
pub use conversation::ConversationStore;
pub use error::{AdvisorError, FetchFailure, GeoError, SummarizerError};
pub use model::{AirQuality, ConversationTurn, Location, PollenReading, WeatherSnapshot};
