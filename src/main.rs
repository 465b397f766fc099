use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tracing::{info, warn};

use cityscience::batch::{self, BatchOptions, RegionStore};
use cityscience::cli::{BulletinCommand, Cli, Command, ScoreCommand, SummaryCommand};
use cityscience::{
    BulletinRequest, BulletinService, CityScienceConfig, GeminiClient, WeatherApiClient,
    init_logging, report, summary, web,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CityScienceConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    init_logging(&config.logging, cli.verbosity());

    match cli.command {
        Command::Serve => web::run(config).await,
        Command::Score(cmd) => score(&config, cmd).await,
        Command::Bulletin(cmd) => bulletin(&config, cmd).await,
        Command::Summary(cmd) => write_summary(cmd).await,
    }
}

async fn score(config: &CityScienceConfig, cmd: ScoreCommand) -> anyhow::Result<()> {
    let client = WeatherApiClient::new(&config.weather, config.weather_api_key()?)?;

    let cities_path = cmd
        .cities
        .unwrap_or_else(|| PathBuf::from(&config.batch.cities_file));
    let cities = batch::read_city_list(&cities_path)
        .await
        .with_context(|| format!("Failed to read city list {}", cities_path.display()))?;

    let store = RegionStore::new(
        cmd.output
            .unwrap_or_else(|| PathBuf::from(&config.batch.regions_file)),
    );
    let mut records = store
        .load()
        .await
        .with_context(|| format!("Failed to read {}", store.path().display()))?;
    let mut existing = batch::existing_regions(&records);
    info!(
        "Scoring {} cities, {} regions already in {}",
        cities.len(),
        existing.len(),
        store.path().display()
    );

    let seed = cmd.seed.unwrap_or_else(|| rand::rng().random());
    info!("Using seed {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let options = BatchOptions {
        forecast_days: config.batch.forecast_days,
        save_every: config.batch.save_every,
        delay: Duration::from_millis(config.batch.delay_ms),
        show_progress: !cmd.no_progress,
    };
    let report = batch::run_batch(
        &client,
        &cities,
        &mut records,
        &mut existing,
        &store,
        &options,
        &mut rng,
    )
    .await?;

    for failure in &report.failed {
        warn!("Not scored: {} ({})", failure.city, failure.error);
    }
    println!(
        "{} processed, {} added, {} skipped, {} failed",
        report.processed,
        report.added,
        report.skipped,
        report.failed.len()
    );
    Ok(())
}

async fn bulletin(config: &CityScienceConfig, cmd: BulletinCommand) -> anyhow::Result<()> {
    let weather = WeatherApiClient::new(&config.weather, config.weather_api_key()?)?;
    let generator = GeminiClient::new(&config.generation, config.generation_api_key()?)?;
    let service = BulletinService::new(weather, std::sync::Arc::new(generator));

    let output = cmd
        .output
        .unwrap_or_else(|| PathBuf::from(&config.server.output_html));
    let request = BulletinRequest::from(cmd.kind);

    let written = service
        .generate(&request, &output)
        .await
        .with_context(|| format!("Failed to generate {} bulletin", request.kind()))?;
    println!("HTML page generated: {}", written.display());
    Ok(())
}

async fn write_summary(cmd: SummaryCommand) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(cmd.seed);
    let document = summary::synthesize(&cmd.location, cmd.year, &mut rng)?;
    let html = document.to_html(chrono::Local::now().naive_local());

    let written = report::write_report(&cmd.output, &html).await?;
    println!("Document generated: {}", written.display());
    Ok(())
}
