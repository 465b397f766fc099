//! City scoring batch
//!
//! Scores every city of a list once and appends the result to the regions
//! JSON file. Regions already present are skipped, so the run can be
//! repeated or resumed. Only one batch may write a given file at a time.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::Result;
use crate::models::CityScore;
use crate::scoring::score_city;
use crate::weather::WeatherApiClient;

/// Flat JSON file holding the scored regions
#[derive(Debug, Clone)]
pub struct RegionStore {
    path: PathBuf,
}

impl RegionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records; a missing file is an empty list
    pub async fn load(&self) -> Result<Vec<CityScore>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No regions file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the file with `records` (4-space indented, UTF-8 unescaped)
    pub async fn save(&self, records: &[CityScore]) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        records.serialize(&mut serializer)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &buffer).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Regions already scored, keyed by "Name, Region"
#[must_use]
pub fn existing_regions(records: &[CityScore]) -> HashSet<String> {
    records.iter().map(|r| r.region.clone()).collect()
}

/// Read a city list file, see [`parse_city_list`]
pub async fn read_city_list(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).await?;
    Ok(parse_city_list(&contents))
}

/// Parse either a CSV with `city` and `country` header columns, or plain
/// lines of "City, Country". Blank lines and `#` comments are ignored.
#[must_use]
pub fn parse_city_list(contents: &str) -> Vec<String> {
    let mut lines = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .peekable();

    let header: Option<Vec<String>> = lines.peek().and_then(|first| {
        let columns: Vec<String> = split_csv_line(first)
            .into_iter()
            .map(|c| c.to_lowercase())
            .collect();
        columns.iter().any(|c| c == "city").then_some(columns)
    });

    let Some(header) = header else {
        return lines.map(str::to_string).collect();
    };
    lines.next();

    let city_idx = header.iter().position(|c| c == "city");
    let country_idx = header.iter().position(|c| c == "country");

    lines
        .filter_map(|line| {
            let fields = split_csv_line(line);
            let city = fields.get(city_idx?)?.clone();
            if city.is_empty() {
                return None;
            }
            match country_idx.and_then(|i| fields.get(i)).filter(|c| !c.is_empty()) {
                Some(country) => Some(format!("{city}, {country}")),
                None => Some(city),
            }
        })
        .collect()
}

/// Split one CSV line, honouring double-quoted fields
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Tuning for one batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub forecast_days: u32,
    /// Persist after every N-th city when that city added a record
    pub save_every: usize,
    /// Pause after each newly scored city
    pub delay: Duration,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            forecast_days: 14,
            save_every: 100,
            delay: Duration::from_millis(200),
            show_progress: true,
        }
    }
}

/// A city that could not be scored
#[derive(Debug, Clone, PartialEq)]
pub struct CityFailure {
    pub city: String,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub processed: usize,
    pub added: usize,
    pub skipped: usize,
    pub failed: Vec<CityFailure>,
}

enum CityOutcome {
    Added,
    Skipped(String),
}

/// Whether progress is written after the city at 1-based `position`.
///
/// Only a newly added city can trigger a save; skipped and failed cities
/// never do, even on a multiple of `save_every`. Zero disables it.
#[must_use]
pub fn should_save(position: usize, added: bool, save_every: usize) -> bool {
    added && save_every > 0 && position % save_every == 0
}

/// Score `cities` and append new regions to `records`.
///
/// `existing` must hold the regions already in `records`; it is updated as
/// cities are added. Per-city failures are logged and collected, the loop
/// moves on. The final record list is always written to `store`.
pub async fn run_batch<R: Rng + ?Sized>(
    client: &WeatherApiClient,
    cities: &[String],
    records: &mut Vec<CityScore>,
    existing: &mut HashSet<String>,
    store: &RegionStore,
    options: &BatchOptions,
    rng: &mut R,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let progress = progress_bar(cities.len(), options.show_progress);

    for (idx, city) in cities.iter().enumerate().map(|(i, c)| (i + 1, c)) {
        report.processed += 1;
        progress.set_message(city.clone());

        let outcome = score_one(client, city, records, existing, options.forecast_days, rng).await;
        if should_save(idx, matches!(outcome, Ok(CityOutcome::Added)), options.save_every) {
            match store.save(records).await {
                Ok(()) => info!("Progress saved after {} cities", idx),
                Err(e) => warn!("Could not save progress after {} cities: {}", idx, e),
            }
        }

        match outcome {
            Ok(CityOutcome::Added) => {
                report.added += 1;
                if !options.delay.is_zero() {
                    tokio::time::sleep(options.delay).await;
                }
            }
            Ok(CityOutcome::Skipped(region)) => {
                debug!("Skipping {} ({} already scored)", city, region);
                report.skipped += 1;
            }
            Err(e) => {
                warn!("Error in {}: {}", city, e);
                report.failed.push(CityFailure {
                    city: city.clone(),
                    error: e.to_string(),
                });
            }
        }
        progress.inc(1);
    }

    progress.finish_with_message("done");
    store.save(records).await?;
    info!(
        "Regions file updated: {} added, {} skipped, {} failed ({} total)",
        report.added,
        report.skipped,
        report.failed.len(),
        records.len()
    );

    Ok(report)
}

async fn score_one<R: Rng + ?Sized>(
    client: &WeatherApiClient,
    city: &str,
    records: &mut Vec<CityScore>,
    existing: &mut HashSet<String>,
    forecast_days: u32,
    rng: &mut R,
) -> Result<CityOutcome> {
    let response = client.forecast(city, forecast_days, true).await?;
    let region = response.location.region_key();
    if existing.contains(&region) {
        return Ok(CityOutcome::Skipped(region));
    }

    let score = score_city(&response, rng)?;
    existing.insert(score.region.clone());
    records.push(score);
    Ok(CityOutcome::Added)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{msg:30!} [{bar:40}] {pos}/{len} cities ({eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
