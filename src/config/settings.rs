use crate::core::timezone;
use crate::domain::model::LocationTimeConfig;
use crate::domain::ports::LocationDirectory;
use crate::utils::error::{CellarError, Result};
use crate::utils::validation::{
    validate_close_time, validate_positive_number, validate_timezone, validate_url, Validate,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub sync: SyncSection,
    pub pos: PosSection,
    pub locations: Vec<LocationSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncSection {
    pub claim_timeout_minutes: Option<u64>,
    pub fetch_timeout_seconds: Option<u64>,
    pub summary_tolerance_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSection {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSection {
    pub id: String,
    /// HH:MM close-of-business; omit (or "00:00" without a timezone) for a
    /// plain UTC calendar day
    pub close_time: Option<String>,
    pub timezone: Option<String>,
    pub provider: String,
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn claim_timeout_minutes(&self) -> u64 {
        self.sync.claim_timeout_minutes.unwrap_or(10)
    }

    pub fn fetch_timeout_seconds(&self) -> u64 {
        self.sync.fetch_timeout_seconds.unwrap_or(30)
    }

    pub fn summary_tolerance_seconds(&self) -> u64 {
        self.sync.summary_tolerance_seconds.unwrap_or(30)
    }

    pub fn location(&self, id: &str) -> Option<&LocationSection> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Builds the domain config for a location, or `None` when the location
    /// has no close-time configuration (plain UTC calendar day).
    pub fn location_time_config(&self, id: &str) -> Result<Option<LocationTimeConfig>> {
        let Some(section) = self.location(id) else {
            return Err(CellarError::ConfigError {
                message: format!("Unknown location: {}", id),
            });
        };
        section.time_config()
    }
}

impl LocationSection {
    pub fn time_config(&self) -> Result<Option<LocationTimeConfig>> {
        let (Some(close), Some(zone)) = (&self.close_time, &self.timezone) else {
            return Ok(None);
        };
        Ok(Some(LocationTimeConfig {
            location_id: self.id.clone(),
            business_close_time: timezone::parse_time_of_day(close)?,
            timezone: timezone::parse_zone(zone)?,
        }))
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("pos.endpoint", &self.pos.endpoint)?;
        if let Some(timeout) = self.sync.claim_timeout_minutes {
            validate_positive_number("sync.claim_timeout_minutes", timeout, 1)?;
        }
        if let Some(timeout) = self.sync.fetch_timeout_seconds {
            validate_positive_number("sync.fetch_timeout_seconds", timeout, 1)?;
        }
        if self.locations.is_empty() {
            return Err(CellarError::ConfigError {
                message: "At least one [[locations]] entry is required".to_string(),
            });
        }
        for location in &self.locations {
            if let Some(close) = &location.close_time {
                validate_close_time(&format!("locations.{}.close_time", location.id), close)?;
            }
            if let Some(zone) = &location.timezone {
                validate_timezone(&format!("locations.{}.timezone", location.id), zone)?;
            }
            if location.close_time.is_some() != location.timezone.is_some() {
                return Err(CellarError::ConfigError {
                    message: format!(
                        "Location {} must set close_time and timezone together",
                        location.id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Lets the engine read location configs through the directory port.
pub struct SettingsDirectory {
    settings: Settings,
}

impl SettingsDirectory {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl LocationDirectory for SettingsDirectory {
    async fn time_config(&self, location_id: &str) -> Result<Option<LocationTimeConfig>> {
        self.settings.location_time_config(location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        toml::from_str(
            r#"
            [sync]
            claim_timeout_minutes = 10
            fetch_timeout_seconds = 30

            [pos]
            endpoint = "https://api.example.com"

            [[locations]]
            id = "downtown-bar"
            close_time = "02:00"
            timezone = "America/New_York"
            provider = "square"

            [[locations]]
            id = "warehouse"
            provider = "square"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn parses_and_validates_sample() {
        let settings = sample();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.claim_timeout_minutes(), 10);
        assert_eq!(settings.summary_tolerance_seconds(), 30);
    }

    #[test]
    fn builds_domain_config_for_cross_midnight_location() {
        let settings = sample();
        let config = settings.location_time_config("downtown-bar").unwrap().unwrap();
        assert_eq!(config.location_id, "downtown-bar");
        assert_eq!(
            config.business_close_time,
            timezone::parse_time_of_day("02:00").unwrap()
        );
    }

    #[test]
    fn unconfigured_location_means_utc_calendar_day() {
        let settings = sample();
        assert!(settings.location_time_config("warehouse").unwrap().is_none());
    }

    #[test]
    fn unknown_location_is_a_config_error() {
        let settings = sample();
        assert!(matches!(
            settings.location_time_config("nowhere"),
            Err(CellarError::ConfigError { .. })
        ));
    }

    #[test]
    fn rejects_close_time_without_timezone() {
        let mut settings = sample();
        settings.locations[0].timezone = None;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_bad_timezone() {
        let mut settings = sample();
        settings.locations[0].timezone = Some("Not/AZone".to_string());
        assert!(settings.validate().is_err());
    }
}
