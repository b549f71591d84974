use cellar_sync::adapters::http_api::HttpApiClient;
use cellar_sync::adapters::json_claims::JsonClaimStore;
use cellar_sync::config::settings::SettingsDirectory;
use cellar_sync::config::{CliConfig, Command};
use cellar_sync::core::claims::SyncClaimCoordinator;
use cellar_sync::utils::logger;
use cellar_sync::{
    business_day, AlertAggregator, BusinessDayRange, CellarError, Settings, SyncEngine, SyncReport,
};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    logger::init_cli_logger(cli.verbose);

    let settings = match Settings::from_file(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load settings from {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };

    let api = HttpApiClient::new(
        settings.pos.endpoint.clone(),
        Duration::from_secs(settings.pos.timeout_seconds.unwrap_or(30)),
    )?;

    match cli.command {
        Command::Sync { location, provider } => {
            let provider = match provider.or_else(|| {
                settings
                    .location(&location)
                    .map(|l| l.provider.clone())
            }) {
                Some(p) => p,
                None => {
                    tracing::error!("Unknown location {} and no --provider given", location);
                    std::process::exit(1);
                }
            };

            let claims = JsonClaimStore::new(Path::new(&cli.state_dir).join("claims.json"));
            let coordinator = SyncClaimCoordinator::with_abandon_after(
                claims,
                chrono::Duration::minutes(settings.claim_timeout_minutes() as i64),
            );
            let ledger = HttpApiClient::new(
                settings.pos.endpoint.clone(),
                Duration::from_secs(settings.pos.timeout_seconds.unwrap_or(30)),
            )?;
            let engine = SyncEngine::new(
                SettingsDirectory::new(settings.clone()),
                api,
                ledger,
                coordinator,
            )
            .with_fetch_timeout(Duration::from_secs(settings.fetch_timeout_seconds()));

            match engine.run_current(&location, &provider, Utc::now()).await {
                Ok(SyncReport::Completed { token, records, .. }) => {
                    println!("Synced {} sale records for {}", records, token);
                }
                Ok(SyncReport::AlreadyCompleted { token }) => {
                    println!("Already synced: {}", token);
                }
                Ok(SyncReport::InProgress { token }) => {
                    println!("Sync already in progress elsewhere: {}", token);
                }
                Err(e) => {
                    report_failure(&e);
                    std::process::exit(1);
                }
            }
        }
        Command::Summary { location } => {
            let alerts = HttpApiClient::new(
                settings.pos.endpoint.clone(),
                Duration::from_secs(settings.pos.timeout_seconds.unwrap_or(30)),
            )?;
            let aggregator = AlertAggregator::with_tolerance(
                api,
                alerts,
                Duration::from_secs(settings.summary_tolerance_seconds()),
            );
            match aggregator.compute_summary(&location).await {
                Ok(summary) => {
                    println!(
                        "{}: {} active, {} critical{}",
                        location,
                        summary.active_alerts,
                        summary.critical_alerts,
                        if summary.has_critical { " (!)" } else { "" },
                    );
                }
                Err(e) => {
                    report_failure(&e);
                    std::process::exit(1);
                }
            }
        }
        Command::Window { location, date } => {
            let config = settings.location_time_config(&location)?;
            let label = match date {
                Some(d) => d.parse::<NaiveDate>().map_err(|e| CellarError::ConfigError {
                    message: format!("Invalid date {}: {}", d, e),
                })?,
                None => business_day::current_label(Utc::now(), config.as_ref())?,
            };
            let range = BusinessDayRange {
                start_label: label,
                end_label: label,
            };
            for bounds in cellar_sync::period::expand(&range, config.as_ref())? {
                println!(
                    "{} {}: [{}, {}) ({}h)",
                    location,
                    label,
                    bounds.start,
                    bounds.end,
                    bounds.duration().num_minutes() as f64 / 60.0,
                );
            }
        }
    }

    Ok(())
}

fn report_failure(e: &CellarError) {
    tracing::error!("Run failed: {}", e);
    if e.is_retryable() {
        eprintln!("Failed (retryable): {}", e);
    } else {
        eprintln!("Failed: {}", e);
    }
}
