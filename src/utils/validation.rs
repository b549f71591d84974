use crate::utils::error::{CellarError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CellarError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CellarError::InvalidConfigValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CellarError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_timezone(field_name: &str, zone: &str) -> Result<()> {
    zone.parse::<chrono_tz::Tz>()
        .map(|_| ())
        .map_err(|_| CellarError::InvalidConfigValue {
            field: field_name.to_string(),
            value: zone.to_string(),
            reason: "Not a known IANA timezone identifier".to_string(),
        })
}

pub fn validate_close_time(field_name: &str, value: &str) -> Result<()> {
    crate::core::timezone::parse_time_of_day(value).map(|_| ()).map_err(|_| {
        CellarError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected HH:MM with hours 00-23 and minutes 00-59".to_string(),
        }
    })
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(CellarError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}
