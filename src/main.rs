mod error;
mod export;
mod fetch;
mod parser;
mod settings;
mod table;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use fetch::{Fetcher, RawPage};
use settings::Settings;
use table::{Cell, Table};

#[derive(Parser)]
#[command(
    name = "movies_scraper",
    about = "Scrape a movie countdown page into CSV and XLSX"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and export (the default)
    Run(RunArgs),
    /// Fetch and extract, then print the table instead of writing files
    Preview {
        /// Read a saved page instead of fetching
        #[arg(long)]
        from: Option<PathBuf>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Read a saved page instead of fetching
    #[arg(long)]
    from: Option<PathBuf>,
    /// Save the fetched page here before parsing
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// CSV destination
    #[arg(long)]
    csv: Option<PathBuf>,
    /// XLSX destination
    #[arg(long)]
    xlsx: Option<PathBuf>,
    /// Write a leading row-index column
    #[arg(long)]
    index: bool,
    /// Omit the header row
    #[arg(long)]
    no_header: bool,
}

impl RunArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.snapshot {
            settings.snapshot = Some(path.clone());
        }
        if let Some(path) = &self.csv {
            settings.csv_path = path.clone();
        }
        if let Some(path) = &self.xlsx {
            settings.xlsx_path = path.clone();
        }
        if self.index {
            settings.include_index = true;
        }
        if self.no_header {
            settings.include_header = false;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load settings")?;

    let result = match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            args.apply(&mut settings);
            debug!(?settings, "settings loaded");
            run(&settings, args.from.as_deref())
        }
        Commands::Preview { from, limit } => {
            debug!(?settings, "settings loaded");
            preview(&settings, from.as_deref(), limit)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn run(settings: &Settings, from: Option<&Path>) -> Result<()> {
    let table = scrape(settings, from)?;
    let targets = settings.targets();
    export::export(&table, &targets, settings.export_options())
        .context("Failed to export movies")?;
    println!(
        "Saved {} movies to {} and {}",
        table.len(),
        targets.csv.display(),
        targets.xlsx.display()
    );
    Ok(())
}

fn preview(settings: &Settings, from: Option<&Path>, limit: usize) -> Result<()> {
    let table = scrape(settings, from)?;
    if table.is_empty() {
        println!("No movies found.");
        return Ok(());
    }

    println!(
        "{:>3} | {:<28} | {:>4} | {:>5} | {:>6} | {:<20} | {:<32}",
        "#", "Movie Title", "Year", "Score", "Adj.", "Director", "Cast"
    );
    println!("{}", "-".repeat(116));

    for (i, r) in table.rows().iter().take(limit).enumerate() {
        let director = r.director.as_deref().unwrap_or("-");
        println!(
            "{:>3} | {:<28} | {:>4} | {:>5} | {:>6} | {:<20} | {:<32}",
            i + 1,
            truncate(&r.title, 28),
            r.year,
            r.score,
            Cell::Float(r.adjusted_score).render(),
            truncate(director, 20),
            truncate(&r.cast_joined(), 32),
        );
    }

    println!("\n--- Consensus ---");
    for r in table.rows().iter().take(limit) {
        println!("  {}: {}", truncate(&r.title, 28), r.consensus);
    }

    println!("\n{} movies", table.len());
    Ok(())
}

/// Backend check, page load, optional snapshot, then extraction.
fn scrape(settings: &Settings, from: Option<&Path>) -> Result<Table> {
    let backend = settings.backend()?;
    let page = load_page(settings, from)?;
    if let Some(path) = &settings.snapshot {
        page.save(path)?;
    }
    parser::process_page(&page, backend)
        .with_context(|| format!("Failed to extract movies from {}", page.source))
}

fn load_page(settings: &Settings, from: Option<&Path>) -> Result<RawPage> {
    if let Some(path) = from {
        return Ok(RawPage::from_file(path)?);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(format!("GET {}", settings.url));
    pb.enable_steady_tick(Duration::from_millis(100));

    let page = Fetcher::new()
        .and_then(|fetcher| fetcher.fetch(&settings.url))
        .with_context(|| format!("Failed to fetch {}", settings.url));
    pb.finish_and_clear();
    page
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
