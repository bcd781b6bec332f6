//! Command line form for star classification and sky imagery.
//!
//! Subcommands:
//! - `derive`: Print temperature, radius, age and absolute magnitude
//! - `classify`: Derive features and run the classifier
//! - `image`: Convert RA/Dec and fetch a survey image of that position

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use skyview::{ImageFormat, SkyViewClient};
use stellar::classifier::{ClassificationResult, ForestClassifier};
use stellar::config::AppConfig;
use stellar::photometry::{DerivationError, DerivedFeatures, StellarInputs};
use stellar::session::{SessionError, StarSession};
use stellar::shared_args::{CoordinateArgs, ImageFormatArg, StellarArgs};

/// Stellar classification form
#[derive(Parser, Debug)]
#[command(name = "stellar_form")]
#[command(about = "Classify stars from photometric parameters and fetch sky images")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the quantities derived from the inputs
    Derive {
        #[command(flatten)]
        star: StellarArgs,
    },

    /// Classify the star described by the inputs
    Classify {
        #[command(flatten)]
        star: StellarArgs,

        /// Classifier artifact (overrides config)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch a survey image centred on a sky position
    Image {
        #[command(flatten)]
        coords: CoordinateArgs,

        /// Image payload (overrides config)
        #[arg(long, value_enum)]
        format: Option<ImageFormatArg>,

        /// Output file (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Survey name (overrides config)
        #[arg(long)]
        survey: Option<String>,
    },
}

/// Machine-readable classification output
#[derive(Serialize)]
struct ClassifyReport<'a> {
    inputs: &'a StellarInputs,
    result: &'a ClassificationResult,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = AppConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    match args.command {
        Command::Derive { star } => cmd_derive(&star),
        Command::Classify { star, model, json } => cmd_classify(&config, &star, model, json),
        Command::Image {
            coords,
            format,
            output,
            survey,
        } => cmd_image(&config, &coords, format, output, survey),
    }
}

fn format_derived(value: &Result<f64, DerivationError>, unit: &str) -> String {
    match value {
        Ok(v) => format!("{v:.4}{unit}"),
        Err(e) => format!("unavailable ({e})"),
    }
}

fn cmd_derive(star: &StellarArgs) -> Result<()> {
    let inputs = star.to_inputs();
    let derived = DerivedFeatures::derive(&inputs);

    println!("B-V:                {}", inputs.bv);
    println!("Luminosity:         {} L☉", inputs.luminosity);
    println!(
        "Temperature:        {}",
        format_derived(&derived.temperature, " K")
    );
    println!("Radius:             {}", format_derived(&derived.radius, " R☉"));
    println!("Age:                {}", format_derived(&derived.age, ""));
    println!(
        "Absolute magnitude: {}",
        format_derived(&derived.absolute_magnitude, "")
    );

    if !derived.is_complete() {
        println!("Some quantities are unavailable, classification would be refused");
    }
    Ok(())
}

fn cmd_classify(
    config: &AppConfig,
    star: &StellarArgs,
    model: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let model_path = model.unwrap_or_else(|| config.model_path.clone());
    let classifier = ForestClassifier::load_from_file(&model_path)
        .with_context(|| format!("Failed to load classifier from {}", model_path.display()))?;

    let inputs = star.to_inputs();
    let session = StarSession::new(&classifier, inputs);

    let result = match session.classify() {
        Ok(result) => result,
        Err(SessionError::Incomplete(e)) => bail!("{e}"),
        Err(e @ SessionError::Inference(_)) => {
            log::error!("{e}");
            return Err(e.into());
        }
    };

    if json {
        let report = ClassifyReport {
            inputs: session.inputs(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Predicted type: {}", result.predicted_type);
    println!("Confidence:     {:.2}%", result.confidence);
    for p in &result.probabilities {
        println!("  {:<20} {:6.2}%", p.label, p.probability * 100.0);
    }
    Ok(())
}

fn cmd_image(
    config: &AppConfig,
    coords: &CoordinateArgs,
    format: Option<ImageFormatArg>,
    output: Option<PathBuf>,
    survey: Option<String>,
) -> Result<()> {
    let position = coords.to_coordinate()?;
    println!("Position: {position}");
    if position.is_origin() {
        log::warn!("RA and Dec are both zero; enter valid coordinates if this is unintended");
    }

    let format = format.map(ImageFormat::from).unwrap_or(config.image_format);
    let output = output.unwrap_or_else(|| config.output_path.clone());

    let mut skyview_config = config.skyview.clone();
    if let Some(survey) = survey {
        skyview_config.survey = survey;
    }
    let client = SkyViewClient::new(skyview_config);

    let image = match client.fetch(position.ra_degrees(), position.dec_degrees(), format) {
        Ok(image) => image,
        Err(e) => {
            log::warn!("Image fetch failed: {e}");
            bail!("Could not fetch sky image: {e}");
        }
    };

    let (width, height) = image.dimensions();
    image
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Saved {width}x{height} image to {}", output.display());
    Ok(())
}
