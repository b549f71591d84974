pub mod alerts;
pub mod business_day;
pub mod claims;
pub mod engine;
pub mod period;
pub mod timezone;

pub use crate::domain::model::{
    AlertSummary, BusinessDayBounds, BusinessDayRange, ClaimStatus, ClaimToken,
    LocationTimeConfig, SaleRecord, StockLevel, SyncClaim, SyncReport, VarianceCounts,
};
pub use crate::domain::ports::{
    AlertStore, CasResult, ClaimPrecondition, ClaimStore, InventoryStore, LocationDirectory,
    SalesLedger, SyncClient,
};
pub use crate::utils::error::Result;
