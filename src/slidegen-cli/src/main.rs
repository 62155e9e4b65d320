//! slidegen CLI - AI Presentation Generator
//!
//! Generates a PowerPoint deck on a topic using an LLM for the outline and
//! Pexels for pictures.

use clap::Parser;
use colored::Colorize;
use slidegen_core::{Config, DeckBuilder, DeckEvent, DeckReport, default_config};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "slidegen",
    version,
    about = "AI Presentation Generator - Build slide decks from a topic",
    long_about = "A CLI tool that asks an OpenAI-compatible API for a slide outline, finds pictures on Pexels and writes a .pptx file."
)]
struct Cli {
    /// The presentation topic
    #[arg(value_name = "TOPIC")]
    topic: Option<String>,

    /// Number of slides to ask for
    #[arg(short = 'n', long = "slides", value_name = "SLIDES")]
    slides: Option<usize>,

    /// Output .pptx file
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Build the deck without pictures
    #[arg(long)]
    no_images: bool,

    /// Also write the generated outline as JSON
    #[arg(long, value_name = "PATH")]
    save_outline: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e.to_string().red());
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(cli.config.as_deref())?;

    if let Ok(api_base) = env::var("SLIDEGEN_API_BASE") {
        config.models.api_base = api_base;
    }

    let api_key = env::var("GOOGLE_API_KEY").unwrap_or_default();
    let pexels_key = env::var("PEXELS_API_KEY").ok();

    let topic = cli
        .topic
        .clone()
        .unwrap_or_else(|| config.defaults.topic.clone());
    let num_slides = cli.slides.unwrap_or(config.defaults.num_slides);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output));

    let mut builder = DeckBuilder::new(config, &api_key, pexels_key)?;
    if warn_missing_photo_key(cli.no_images, builder.images_enabled()) {
        eprintln!(
            "{}",
            "Warning: PEXELS_API_KEY not set. Slides will have no pictures.".yellow()
        );
    }
    if cli.no_images {
        builder = builder.with_images(false);
    }
    let builder = builder.with_callback(create_console_callback());

    println!();
    println!("{} {}", "Topic:".bold(), topic.bright_white());
    println!(
        "{} {}",
        "Models:".bold(),
        format!(
            "{} (outline), {} (image queries)",
            builder.config().models.outline_model,
            builder.config().models.image_query_model
        )
        .dimmed()
    );
    println!();

    let report = builder.build(&topic, num_slides, &output).await?;

    if let Some(path) = cli.save_outline.as_deref() {
        save_outline(&report, path)?;
    }

    println!();
    println!(
        "{}",
        format!(
            "Presentation saved as {} ({} slides, {} pictures)",
            report.path.display(),
            report.slides,
            report.pictures
        )
        .bright_green()
        .bold()
    );

    Ok(())
}

/// Pictures were asked for but there is no key to fetch them with.
fn warn_missing_photo_key(no_images: bool, has_photo_key: bool) -> bool {
    !no_images && !has_photo_key
}

/// Load the config file, falling back to the embedded defaults when it does not exist.
fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) if path.exists() => Ok(Config::load(path)?),
        Some(path) => {
            eprintln!(
                "{}",
                format!(
                    "Warning: config file {} not found, using defaults.",
                    path.display()
                )
                .yellow()
            );
            Ok(default_config())
        }
        None => Ok(default_config()),
    }
}

fn save_outline(report: &DeckReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&report.outline)?;
    std::fs::write(path, json)?;
    println!("{} {}", "Outline saved to".dimmed(), path.display());
    Ok(())
}

/// Create a callback that prints deck events to the console.
fn create_console_callback() -> Box<dyn Fn(DeckEvent) + Send + Sync> {
    Box::new(move |event| match event {
        DeckEvent::OutlineRequested { topic, num_slides } => {
            println!(
                "{} {}",
                "▶".bright_cyan(),
                format!("Requesting a {}-slide outline on '{}'...", num_slides, topic).bright_cyan()
            );
        }
        DeckEvent::OutlineReady { slides } => {
            println!("  {}", format!("Outline ready: {} slides", slides).dimmed());
        }
        DeckEvent::SlideStarted {
            index,
            total,
            title,
            slide_type,
        } => {
            println!(
                "Creating slide {}/{}: '{}' (Type: {})",
                index,
                total,
                title.bright_white(),
                slide_type.yellow()
            );
        }
        DeckEvent::ImageQueryFallback {
            title: _,
            phrase,
            reason,
        } => {
            eprintln!(
                "  {}",
                format!(
                    "Warning: image query failed ({}), searching for '{}' instead.",
                    reason, phrase
                )
                .yellow()
            );
        }
        DeckEvent::ImageSkipped { title, reason } => {
            eprintln!(
                "  {}",
                format!("Warning: no picture for '{}': {}", title, reason).yellow()
            );
        }
        DeckEvent::ImagePlaced { title: _, query } => {
            println!("  {} {}", "Picture:".dimmed(), query.dimmed());
        }
        DeckEvent::Saved { .. } => {
            // Handled in run
        }
    })
}
