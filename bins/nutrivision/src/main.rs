//! nutrivision: capture nutrition labels and fruit, extract their nutrients.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nutrivision_cli::output::{
    format_count, format_duration, format_grams, format_size, render_breakdown, Status,
};
use nutrivision_cli::progress::{finish_error, finish_success, upload_spinner};
use nutrivision_client::{ClientConfig, ExtractionClient, ExtractionError, ExtractionResult};
use nutrivision_core::config::Config;
use nutrivision_core::error::exit_codes;
use nutrivision_core::{ErrorCode, ErrorReport};
use nutrivision_core::profile::{AgeField, Height, HeightUnit, Profile, Weight, WeightUnit};
use nutrivision_gallery::{discard_capture, load_recent, FileGallery, Gallery, GalleryError};
use nutrivision_image::{
    compute_label_crop, extract_metadata, Capture, CaptureMode, CapturedImage, FileCapture,
    ImageError,
};
use nutrivision_telemetry::{metrics, LogFormat, TelemetryConfig, Timer, EXTRACTION_DURATION};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "nutrivision")]
#[command(about = "Extract nutrient totals from nutrition label and fruit photos")]
#[command(version)]
struct Cli {
    /// Path to nutrivision.toml
    #[arg(short, long, global = true, env = "NUTRIVISION_CONFIG")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Report failures as a JSON error report on stderr
    #[arg(long, global = true)]
    json_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload images to the extraction service and show the nutrient breakdown
    Extract(ExtractArgs),

    /// Take a capture from an image file (label mode crops the guide region)
    Capture {
        /// Source image
        image: PathBuf,
        /// What the photo shows
        #[arg(short, long, default_value = "label")]
        mode: CaptureMode,
        /// Keep the capture in the gallery album
        #[arg(long)]
        save: bool,
    },

    /// Show the label crop rectangle for a frame size or an image file
    Crop {
        /// Frame width in pixels
        #[arg(required_unless_present = "image")]
        width: Option<u32>,
        /// Frame height in pixels
        #[arg(required_unless_present = "image")]
        height: Option<u32>,
        /// Read the frame size from this image's header instead
        #[arg(long, conflicts_with_all = ["width", "height"])]
        image: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a nutrient amount such as `500mg` to grams
    Normalize {
        /// Amount with optional `g` or `mg` unit
        value: String,
    },

    /// Saved captures
    #[command(subcommand)]
    Gallery(GalleryCommand),

    /// Show the biometric profile with unit conversions
    Profile(ProfileArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Images to upload
    images: Vec<PathBuf>,

    /// What the photos show
    #[arg(short, long, default_value = "label")]
    mode: CaptureMode,

    /// Upload the files as they are, without the label crop
    #[arg(long)]
    no_crop: bool,

    /// Keep the captures in the gallery album
    #[arg(long)]
    save: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print upload metrics afterwards
    #[arg(long)]
    metrics: bool,
}

#[derive(Subcommand)]
enum GalleryCommand {
    /// List the most recent saved captures
    List {
        /// Album to list (defaults to the configured album)
        #[arg(short, long)]
        album: Option<String>,
        /// Maximum number of captures
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved capture by asset id or URI
    Delete {
        /// Asset id, stored path or original capture URI
        reference: String,
    },

    /// Drop an entry from the recent captures strip (0 is the newest)
    Discard {
        /// Position in the strip
        index: usize,
    },
}

#[derive(Args)]
struct ProfileArgs {
    /// Age as typed (digits only)
    #[arg(long)]
    age: Option<String>,

    /// Years to add to the age
    #[arg(long, default_value_t = 0)]
    older: u16,

    /// Years to subtract from the age
    #[arg(long, default_value_t = 0)]
    younger: u16,

    /// Body weight
    #[arg(long)]
    weight: Option<String>,

    /// Unit of --weight
    #[arg(long, default_value = "kg")]
    weight_unit: WeightUnit,

    /// Body height, e.g. 5'7 or 170
    #[arg(long)]
    height: Option<String>,

    /// Unit of --height
    #[arg(long, default_value = "ft")]
    height_unit: HeightUnit,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    let code = match run(cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let report = failure_report(&e);
            if json_errors {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => Status::error(&format!("{e:#}")),
                }
            } else {
                Status::error(&format!("{e:#}"));
            }
            report.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let mut telemetry = TelemetryConfig::from_section(&config.schema.telemetry);
    if cli.verbose {
        telemetry = telemetry.with_log_level("debug");
    }
    if cli.json_logs {
        telemetry = telemetry.with_format(LogFormat::Json);
    }
    nutrivision_telemetry::init_with_config(telemetry)?;

    if let Some(path) = &config.path {
        debug!(path = %path, "Loaded configuration");
    }

    match cli.command {
        Commands::Extract(args) => run_extract(args, &config).await,
        Commands::Capture { image, mode, save } => run_capture(&image, mode, save, &config),
        Commands::Crop {
            width,
            height,
            image,
            json,
        } => match (image, width, height) {
            (Some(path), _, _) => run_crop_image(&path, json),
            (None, Some(width), Some(height)) => run_crop(width, height, json),
            _ => anyhow::bail!("crop needs a width and height, or --image"),
        },
        Commands::Normalize { value } => run_normalize(&value),
        Commands::Gallery(command) => run_gallery(command, &config),
        Commands::Profile(args) => run_profile(args),
    }
}

async fn run_extract(args: ExtractArgs, config: &Config) -> Result<()> {
    let captures = args
        .images
        .iter()
        .map(|path| take_capture(path, args.mode, !args.no_crop, config))
        .collect::<Result<Vec<_>>>()?;

    if args.save {
        save_all(&captures, config);
    }

    let client_config = ClientConfig::from_schema(&config.schema.extraction)?;
    let client = ExtractionClient::with_config(client_config)?;

    let spinner = (!args.json && console::Term::stderr().is_term())
        .then(|| upload_spinner(captures.len()));

    let timer = Timer::start(EXTRACTION_DURATION);
    let outcome = client.submit(&captures).await;
    let elapsed = timer.stop();
    metrics().record_extraction(outcome.is_ok());

    let result = match outcome {
        Ok(result) => {
            if let Some(pb) = &spinner {
                finish_success(pb, &format!("Extracted in {}", format_duration(elapsed)));
            }
            result
        }
        Err(e) => {
            if let Some(pb) = &spinner {
                finish_error(pb, "Extraction failed");
            }
            return Err(e.into());
        }
    };

    print_result(&result, args.json)?;

    if args.metrics {
        println!("{}", serde_json::to_string_pretty(&metrics().export_json())?);
    }

    Ok(())
}

fn print_result(result: &ExtractionResult, json: bool) -> Result<()> {
    let totals = result.totals()?;
    let breakdown = totals.breakdown();

    if json {
        let output = serde_json::json!({
            "combined": result.combined,
            "totals": totals,
            "breakdown": breakdown,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    Status::header("Nutrients");
    print!("{}", render_breakdown(&breakdown));

    let others: Vec<_> = result
        .combined
        .iter()
        .filter(|(name, _)| !name.ends_with("_total"))
        .collect();
    if !others.is_empty() {
        Status::header("Also reported");
        for (name, value) in others {
            match value.grams() {
                Ok(grams) => println!("{name}: {}", format_grams(grams)),
                Err(_) => println!("{name}: {value}"),
            }
        }
    }

    Ok(())
}

fn take_capture(path: &Path, mode: CaptureMode, crop: bool, config: &Config) -> Result<CapturedImage> {
    if !crop {
        return Ok(CapturedImage::new(path.to_string_lossy(), mode));
    }

    let capture = &config.schema.capture;
    FileCapture::new(path, &capture.output_dir)
        .with_quality(capture.jpeg_quality)
        .capture(mode)
        .with_context(|| format!("Failed to capture {}", path.display()))
}

fn save_all(captures: &[CapturedImage], config: &Config) {
    let gallery = match FileGallery::from_config(&config.schema.gallery) {
        Ok(gallery) => gallery,
        Err(e) => {
            Status::warning(&format!("Gallery unavailable: {e}"));
            return;
        }
    };

    for capture in captures {
        match gallery.save(capture) {
            Ok(id) => debug!(asset_id = %id, uri = %capture.uri, "Saved capture"),
            Err(e) => {
                warn!(uri = %capture.uri, error = %e, "Could not save capture");
                Status::warning(&format!("Not saved to gallery: {}", capture.uri));
            }
        }
    }
}

fn run_capture(image: &Path, mode: CaptureMode, save: bool, config: &Config) -> Result<()> {
    let captured = take_capture(image, mode, true, config)?;
    Status::success(&format!("{mode} capture: {}", captured.uri));

    if save {
        let gallery = FileGallery::from_config(&config.schema.gallery)?;
        let id = gallery.save(&captured)?;
        Status::info(&format!("Saved to album {} as {id}", gallery.album()));

        let recent = load_recent(
            &gallery,
            gallery.album(),
            config.schema.capture.max_recent,
        );
        Status::header("Recent captures");
        for (index, item) in recent.iter().enumerate() {
            println!("{index}  {:<5}  {}", item.mode, item.uri);
        }
    }

    Ok(())
}

fn run_crop(width: u32, height: u32, json: bool) -> Result<()> {
    let rect = compute_label_crop(width, height);

    if json {
        println!("{}", serde_json::to_string_pretty(&rect)?);
    } else {
        println!("Crop: {}x{} at ({}, {})", rect.width, rect.height, rect.origin_x, rect.origin_y);
        let px = rect.to_pixels(width, height);
        println!("Pixels: {}x{} at ({}, {})", px.width, px.height, px.x, px.y);
    }

    Ok(())
}

fn run_crop_image(path: &Path, json: bool) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let meta = extract_metadata(&data).ok_or(ImageError::UnknownFormat).with_context(|| {
        format!("Cannot read dimensions from the header of {}", path.display())
    })?;
    let rect = meta.label_crop();

    if json {
        let output = serde_json::json!({
            "image": meta,
            "orientation": meta.orientation(),
            "crop": rect,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Frame: {}x{} {:?}, {} ({:?})",
        meta.width,
        meta.height,
        meta.format,
        format_size(meta.size_bytes as u64),
        meta.orientation(),
    );
    run_crop(meta.width, meta.height, false)
}

fn run_normalize(value: &str) -> Result<()> {
    let grams = nutrivision_client::normalize_to_grams(value)?;
    println!("{grams}");
    Ok(())
}

fn run_gallery(command: GalleryCommand, config: &Config) -> Result<()> {
    let gallery = FileGallery::from_config(&config.schema.gallery)?;

    match command {
        GalleryCommand::List { album, limit, json } => {
            let album = album.as_deref().unwrap_or(gallery.album());
            let limit = limit.unwrap_or(config.schema.gallery.recent_limit);
            let records = gallery.list_records(album, limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            if records.is_empty() {
                Status::info(&format!("Album {album} is empty"));
                return Ok(());
            }

            Status::header(&format!(
                "{album}: {}",
                format_count(records.len(), "capture", "captures")
            ));
            for record in &records {
                println!(
                    "{}  {:<5}  {:>9}  {}",
                    record.id,
                    record.mode,
                    format_size(record.size_bytes),
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                );
            }
        }

        GalleryCommand::Delete { reference } => match gallery.find(&reference)? {
            Some(id) if gallery.delete(&id)? => Status::success(&format!("Deleted {id}")),
            _ => Status::warning(&format!("No saved capture matches {reference}")),
        },

        GalleryCommand::Discard { index } => {
            let mut recent = load_recent(
                &gallery,
                gallery.album(),
                config.schema.capture.max_recent,
            );
            match discard_capture(&mut recent, index, &gallery) {
                Some(removed) => Status::success(&format!("Discarded {}", removed.uri)),
                None => Status::warning(&format!(
                    "No capture at position {index} ({} recent)",
                    recent.len()
                )),
            }
        }
    }

    Ok(())
}

fn run_profile(args: ProfileArgs) -> Result<()> {
    let mut age = AgeField::default();
    if let Some(text) = &args.age {
        age.set_text(text);
        if age.has_error() {
            Status::warning(&format!(
                "Ignoring age {text:?}: numbers only; keeping {}",
                age.age()
            ));
        }
        age.commit();
    }
    for _ in 0..args.older {
        age.increment();
    }
    for _ in 0..args.younger {
        age.decrement();
    }

    let weight = match &args.weight {
        Some(text) => Weight::parse(text, args.weight_unit)?,
        None => Weight::default().converted_to(args.weight_unit),
    };

    let height = match &args.height {
        Some(text) => Height::parse(text, args.height_unit)?,
        None => Height::default(),
    };

    let profile = Profile {
        age: age.age(),
        weight,
        height,
    };

    if args.json {
        let output = serde_json::json!({
            "profile": profile,
            "weight_kg": profile.weight.kilograms(),
            "height_cm": profile.height.centimetres(),
            "bmi": profile.bmi(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Age:    {}", profile.age);
        println!("Weight: {} ({:.1} kg)", profile.weight, profile.weight.kilograms());
        println!("Height: {} ({:.1} cm)", profile.height, profile.height.centimetres());
        println!("BMI:    {:.1}", profile.bmi());
    }

    Ok(())
}

/// Error report for a failed command, classified by the first known cause.
fn failure_report(error: &anyhow::Error) -> ErrorReport {
    let outer = error.to_string();

    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<nutrivision_core::Error>() {
            return e.to_report();
        }

        let code = if cause.is::<ExtractionError>() {
            ErrorCode::ExtractionError
        } else if cause.is::<GalleryError>() {
            ErrorCode::GalleryError
        } else if cause.is::<ImageError>() {
            ErrorCode::InvalidFormat
        } else {
            continue;
        };

        let message = cause.to_string();
        let mut report = nutrivision_core::Error::new(code, message.clone());
        if outer != message {
            report = report.with_context(outer.clone());
        }
        if let Some(suggestion) = cause.downcast_ref::<ExtractionError>().and_then(suggestion_for) {
            report = report.with_suggestion(suggestion);
        }
        return report.to_report();
    }

    nutrivision_core::Error::new(ErrorCode::Unknown, format!("{error:#}")).to_report()
}

fn suggestion_for(error: &ExtractionError) -> Option<&'static str> {
    match error {
        ExtractionError::NetworkUnreachable(_) => {
            Some("Check extraction.endpoint_url and that the service is running")
        }
        ExtractionError::UnreadableSource { .. } => Some("Pass paths to readable image files"),
        ExtractionError::Busy => Some("Wait for the current upload to finish"),
        _ => None,
    }
}
