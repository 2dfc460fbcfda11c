use anyhow::Context;
use clap::{Parser, Subcommand};

use advisor_core::advisor::{AdviceRequest, Advisor};
use advisor_core::config::{Config, ServiceId};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "advisor", version, about = "Environmental advisory chat CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for an external service.
    Configure {
        /// Service short name: "openweather", "ambee" or "gemini".
        service: String,
    },

    /// Ask a weather / air quality / pollen question.
    Ask {
        /// The question, e.g. "what should I wear in Seoul today?".
        question: String,

        /// Place name the question is about; omit to use coordinates.
        #[arg(long)]
        place: Option<String>,

        /// Latitude of the device location.
        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        /// Longitude of the device location.
        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// User id for profile context and a per-user conversation.
        #[arg(long)]
        uid: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { service } => configure(&service),
            Command::Ask { question, place, lat, lon, uid } => {
                ask(question, place, lat.zip(lon), uid).await
            }
        }
    }
}

fn configure(service: &str) -> anyhow::Result<()> {
    let id = ServiceId::try_from(service)?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let mut config = Config::load()?;
    config.upsert_service_api_key(id, api_key);
    config.save()?;

    println!("Saved API key for '{id}'.");
    Ok(())
}

async fn ask(
    question: String,
    place: Option<String>,
    coords: Option<(f64, f64)>,
    uid: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let advisor = Advisor::from_config(&config)?;

    let request = AdviceRequest { user_input: question, place, coords, uid };
    let advice = advisor.advise(&request).await?;

    println!("{}", advice.reply);

    if let Some(location) = &advice.location {
        println!("\n({}: {:.4}, {:.4})", location.name, location.lat, location.lon);
    }

    if let Some(graph) = &advice.hourly_graph {
        let series: Vec<String> =
            graph.iter().map(|p| format!("{} {}C", p.hour, p.temp)).collect();
        println!("Next hours: {}", series.join(" | "));
    }

    Ok(())
}
