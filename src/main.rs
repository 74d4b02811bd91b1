use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use image::GenericImageView;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use workgood::config::{self, AlarmWindow};
use workgood::core::similarity::{SIMILARITY_THRESHOLD, SimilarityEngine};
use workgood::core::store::{self, CaptureStore};
use workgood::core::sweep::{AlarmSignal, SignalCallback, SweepReport, SweepRunner};
use workgood::history::{self, SweepRecord};

#[derive(Parser, Debug)]
#[command(name = "workgood", version, about = "Photo-gated work alarm")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a captured photo and run the comparison pass
    Capture {
        /// Photo to import (jpg or png)
        #[arg(short, long, value_name = "FILE")]
        photo: PathBuf,
        /// Capture directory (default: Pictures/WorkGoodApp)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Keep the photo without asking
        #[arg(long)]
        keep: bool,
    },

    /// Run one comparison pass over the capture directory
    Sweep {
        /// Capture directory (default: Pictures/WorkGoodApp)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Score two photos against each other
    Compare {
        /// First photo
        a: PathBuf,
        /// Second photo
        b: PathBuf,
    },

    /// Delete every captured photo for a fresh baseline
    Reset {
        /// Capture directory (default: Pictures/WorkGoodApp)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Configure the daily alarm window
    Window {
        #[command(subcommand)]
        command: WindowCmd,
    },

    /// Show the alarm window and the captured photos
    Status {
        /// Capture directory (default: Pictures/WorkGoodApp)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// List recorded comparison passes
    History {
        /// Capture directory (default: Pictures/WorkGoodApp)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum WindowCmd {
    /// Set the window, e.g. `window set 07:30 19:00`
    Set {
        /// Start of the window, HH:MM
        start: String,
        /// End of the window (when the alarm rings), HH:MM
        end: String,
    },

    /// Show the configured window
    Show,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture { photo, dir, keep } => {
            let store = CaptureStore::new(capture_dir(dir));
            let saved = store
                .import(&photo)
                .with_context(|| format!("Failed to import {:?}", photo))?;
            println!("📷 Saved {}", saved.display());

            run_sweep(store.dir())?;

            // The preview decision comes after the pass, so a rejected
            // photo may already be gone.
            let keep_it = keep
                || Confirm::new()
                    .with_prompt("Keep this photo?")
                    .default(true)
                    .interact()?;
            if !keep_it {
                if store.discard(&saved)? {
                    println!("🗑️  Discarded {}", saved.display());
                } else {
                    println!("Photo was already removed by the comparison pass.");
                }
            }
        }

        Commands::Sweep { dir } => {
            let dir = capture_dir(dir);
            println!("▶ Comparing photos in: {}", dir.display());
            run_sweep(&dir)?;
        }

        Commands::Compare { a, b } => {
            let engine = SimilarityEngine::new();
            match engine.correlation(&a, &b) {
                Some(score) => {
                    let verdict = if score >= SIMILARITY_THRESHOLD {
                        "similar"
                    } else {
                        "not similar"
                    };
                    println!("Correlation: {:.4} → {}", score, verdict);
                }
                None => println!("⚠️  Could not decode one of the photos; treating as not similar."),
            }
        }

        Commands::Reset { dir, yes } => {
            let store = CaptureStore::new(capture_dir(dir));
            let photos = store.list();
            if photos.is_empty() {
                println!("No captured photos in {}.", store.dir().display());
                return Ok(());
            }

            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!(
                        "Delete all {} photo(s) in {}?",
                        photos.len(),
                        store.dir().display()
                    ))
                    .default(false)
                    .interact()?;
            if !confirmed {
                println!("Aborted; nothing deleted.");
                return Ok(());
            }

            let removed = store.clear();
            println!("🧹 Deleted {} photo(s); ready for a fresh baseline.", removed);
        }

        Commands::Window { command } => match command {
            WindowCmd::Set { start, end } => {
                let start = parse_clock(&start)?;
                let end = parse_clock(&end)?;
                let window =
                    AlarmWindow::new(start.hour(), start.minute(), end.hour(), end.minute())
                        .context("Start time must be before end time")?;

                let path = config::default_config_path();
                config::save_window(&path, &window)
                    .with_context(|| format!("Failed to write config {:?}", path))?;
                println!("⏰ Alarm window set: {}", window);
            }

            WindowCmd::Show => match config::load_window(&config::default_config_path())? {
                Some(window) => println!("⏰ Alarm window: {}", window),
                None => println!("No alarm window configured yet."),
            },
        },

        Commands::Status { dir } => {
            match config::load_window(&config::default_config_path())? {
                Some(window) => println!("⏰ Alarm window: {}", window),
                None => println!("⏰ Alarm window: not set"),
            }

            let store = CaptureStore::new(capture_dir(dir));
            let photos = store.list();
            if photos.is_empty() {
                println!("📁 {}: no captured photos.", store.dir().display());
                return Ok(());
            }

            println!("📁 {} ({} photo(s)):", store.dir().display(), photos.len());
            for row in photo_rows(&photos)? {
                println!("   ▶ {}", row);
            }
        }

        Commands::History { dir } => {
            let dir = capture_dir(dir);
            let records = history::read_records(&dir)?;
            if records.is_empty() {
                println!("No comparison passes recorded in {}.", dir.display());
                return Ok(());
            }

            println!("🗂️  Comparison history:");
            for (i, rec) in records.iter().enumerate() {
                println!(
                    "[{}] {}\n     kept: {}\n     deleted: {:?}\n     matched: {}\n",
                    i, rec.timestamp, rec.kept, rec.deleted, rec.matched
                );
            }
        }
    }

    Ok(())
}

/// Resolve the capture directory: the explicit flag or the app default.
fn capture_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(store::default_capture_dir)
}

/// Parse a wall-clock time in `HH:MM` form.
fn parse_clock(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .with_context(|| format!("Invalid time {:?}; expected HH:MM", raw))
}

/// Run one comparison pass, narrating the alarm signals, and record it
/// in the capture directory's history.
fn run_sweep(dir: &Path) -> Result<SweepReport> {
    let signals: SignalCallback = Box::new(|signal| match signal {
        AlarmSignal::StopAlarm => println!("🔕 Scene matched; the alarm can stop."),
        AlarmSignal::NoMatch => println!("⚠️  Photos are not similar."),
    });
    let report = SweepRunner::new().run(dir, Some(&signals));

    if report.pairs_compared == 0 {
        println!(
            "▶ Nothing to compare yet ({} photo(s) on file).",
            report.listed
        );
        return Ok(report);
    }

    if let Some(kept) = &report.kept {
        println!("🏆 Keeping → {}", kept.display());
    }
    for gone in &report.deleted {
        println!("🗑️  Deleted {}", gone.display());
    }

    if let Some(record) = SweepRecord::from_report(&report) {
        history::append_record(dir, &record)
            .with_context(|| format!("Failed to record history in {:?}", dir))?;
    }

    if report.matched {
        println!("✅ Progress photo accepted.");
    } else {
        println!("❌ No matching scene; the alarm keeps ringing.");
    }

    Ok(report)
}

/// Gather display metadata for every photo in parallel.
fn photo_rows(photos: &[PathBuf]) -> Result<Vec<String>> {
    benchmark("reading photos", || -> Result<Vec<String>> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        spinner.set_message("Reading photos…");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let rows = photos
            .par_iter()
            .map(|path| -> Result<String> {
                let bytes =
                    fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
                let digest = blake3::hash(&bytes);
                let dims = image::load_from_memory(&bytes)
                    .map(|img| {
                        let (width, height) = img.dimensions();
                        format!("{}x{}", width, height)
                    })
                    .unwrap_or_else(|_| "unreadable".to_string());
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                spinner.tick();
                Ok(format!(
                    "{}  {}  {} bytes  {}",
                    name,
                    dims,
                    bytes.len(),
                    &digest.to_hex()[..12]
                ))
            })
            .collect::<Result<_>>();

        spinner.finish_and_clear();
        rows
    })
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    println!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
