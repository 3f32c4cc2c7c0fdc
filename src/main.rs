use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use carbon_shunya::{
    AssessmentOutcome, AssessmentRequest, CarbonConfig, CarbonError, CarbonPipeline, logging, web,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "carbon-shunya",
    author,
    version,
    about = "Carbon Shunya: carbon credit score estimation from tree cover, vegetation imagery and air quality"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Debug logging and configuration details
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assess the carbon balance around a location
    Assess {
        /// Place name or "lat,lon"
        #[arg(long, short)]
        location: String,

        /// Analysis radius in km
        #[arg(long, short, value_parser = clap::value_parser!(u32).range(1..=10))]
        radius: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write the NDVI thumbnail (PNG) to this path
        #[arg(long)]
        save_image: Option<PathBuf>,
    },
    /// Serve the web dashboard
    Serve {
        /// Port to listen on
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CarbonError>() {
                Some(carbon_error) => eprintln!("Error: {}", carbon_error.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            tracing::debug!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .or_else(CarbonConfig::get_config_path)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = CarbonConfig::load_from_path(Some(config_path.clone()))?;
    logging::init(&config.logging, cli.verbose)?;

    if cli.verbose {
        println!("Using config from: {}", config_path.display());
        println!("Log level: {}", config.logging.level);
    }

    match cli.command {
        None => {
            print_overview(&config);
            Ok(())
        }
        Some(Commands::Assess {
            location,
            radius,
            json,
            save_image,
        }) => {
            let radius = radius.unwrap_or(config.defaults.radius_km);
            assess(&config, location, radius, json, save_image).await
        }
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let pipeline = CarbonPipeline::from_config(&config)?;
            web::run(&config, pipeline).await
        }
    }
}

async fn assess(
    config: &CarbonConfig,
    location: String,
    radius_km: u32,
    json: bool,
    save_image: Option<PathBuf>,
) -> Result<()> {
    let pipeline = CarbonPipeline::from_config(config)?;

    let mut request = AssessmentRequest::new(location, f64::from(radius_km));
    if save_image.is_some() {
        request = request.with_image();
    }

    match pipeline.assess(&request).await? {
        AssessmentOutcome::AwaitingInput => {
            println!("📍 Enter a location to begin.");
        }
        AssessmentOutcome::LocationNotFound { query } => {
            eprintln!("Location not found: {query}");
        }
        AssessmentOutcome::Completed(report) => {
            if json {
                let body = serde_json::to_string_pretty(&report)
                    .with_context(|| "Failed to serialize report")?;
                println!("{body}");
            } else {
                println!("{report}");
            }

            if let (Some(path), Some(image)) = (save_image, &report.vegetation_image) {
                image
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("🌳 NDVI image saved to {}", path.display());
            }
        }
    }
    Ok(())
}

fn print_overview(config: &CarbonConfig) {
    println!("🍃 Carbon Shunya v{}", carbon_shunya::VERSION);
    println!("   Carbon emission analyzer for any place on Earth.");
    println!();
    println!("Usage:");
    println!("   carbon-shunya assess --location \"Dehradun\" --radius 5");
    println!("   carbon-shunya serve --port {}", config.server.port);
    println!();

    if config.air_quality.api_key.is_none() {
        println!("⚠️ No air quality token: set CARBON_AIR_QUALITY__API_KEY (https://aqicn.org/data-platform/token/).");
    }
    if config.earth_engine.project.is_none() || config.earth_engine.access_token.is_none() {
        println!(
            "⚠️ Earth Engine not configured: set CARBON_EARTH_ENGINE__PROJECT and CARBON_EARTH_ENGINE__ACCESS_TOKEN."
        );
    }
}
