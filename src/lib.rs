pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::Settings;

pub use crate::core::alerts::AlertAggregator;
pub use crate::core::claims::{ClaimOutcome, SyncClaimCoordinator};
pub use crate::core::engine::SyncEngine;
pub use crate::core::{business_day, period, timezone};
pub use crate::domain::model::{
    AlertSummary, BusinessDayBounds, BusinessDayRange, ClaimStatus, ClaimToken,
    LocationTimeConfig, SaleRecord, StockLevel, SyncClaim, SyncReport, VarianceCounts,
};
pub use crate::utils::error::{CellarError, Result};
