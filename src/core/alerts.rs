//! On-demand alert summaries with single-flight deduplication.
//!
//! Polling UIs hit this concurrently for the same location. The aggregator
//! coalesces callers within a freshness window onto one underlying store
//! query pair, bounding load on the inventory and alert stores.

use crate::domain::model::{AlertSummary, StockLevel, VarianceCounts};
use crate::domain::ports::{AlertStore, InventoryStore};
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(30);

/// Pure composition rule: stock thresholds plus externally stored variance
/// counts.
pub fn summarize(snapshot: &[StockLevel], variance: &VarianceCounts) -> AlertSummary {
    let low_stock = snapshot
        .iter()
        .filter(|item| item.current_quantity < item.minimum_quantity)
        .count() as u32;
    let critical_stock = snapshot
        .iter()
        .filter(|item| item.current_quantity <= 0.0)
        .count() as u32;

    let critical_alerts = u32::from(critical_stock > 0) + variance.critical;
    AlertSummary {
        active_alerts: low_stock + variance.active,
        critical_alerts,
        has_critical: critical_alerts > 0,
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedSummary {
    computed_at: Instant,
    summary: AlertSummary,
}

type Flight = Arc<tokio::sync::Mutex<Option<CachedSummary>>>;

pub struct AlertAggregator<I: InventoryStore, A: AlertStore> {
    inventory: I,
    alerts: A,
    tolerance: Duration,
    // Per-location flight slots. The outer lock only guards the map; the
    // per-key async mutex is what serializes concurrent computations.
    flights: Mutex<HashMap<String, Flight>>,
}

impl<I: InventoryStore, A: AlertStore> AlertAggregator<I, A> {
    pub fn new(inventory: I, alerts: A) -> Self {
        Self::with_tolerance(inventory, alerts, DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(inventory: I, alerts: A, tolerance: Duration) -> Self {
        Self {
            inventory,
            alerts,
            tolerance,
            flights: Mutex::new(HashMap::new()),
        }
    }

    fn flight(&self, location_id: &str) -> Flight {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        // Evict slots nobody holds whose cache has aged past the tolerance,
        // so the map tracks the actively polled locations rather than every
        // location ever queried.
        let tolerance = self.tolerance;
        flights.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(cached) => {
                    (*cached).is_some_and(|c| c.computed_at.elapsed() < tolerance)
                }
                Err(_) => true,
            }
        });
        flights
            .entry(location_id.to_string())
            .or_default()
            .clone()
    }

    /// Computes the summary for a location, coalescing concurrent callers.
    ///
    /// The first caller inside the tolerance window performs the store
    /// queries while holding the location's flight slot; callers arriving
    /// meanwhile wait on the slot and receive the freshly cached result.
    pub async fn compute_summary(&self, location_id: &str) -> Result<AlertSummary> {
        let flight = self.flight(location_id);
        let mut slot = flight.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.computed_at.elapsed() < self.tolerance {
                tracing::debug!(location_id, "serving deduplicated alert summary");
                return Ok(cached.summary);
            }
        }

        let snapshot = self.inventory.snapshot(location_id).await?;
        let variance = self.alerts.variance_counts(location_id).await?;
        let summary = summarize(&snapshot, &variance);
        tracing::debug!(
            location_id,
            active = summary.active_alerts,
            critical = summary.critical_alerts,
            "computed alert summary"
        );

        *slot = Some(CachedSummary {
            computed_at: Instant::now(),
            summary,
        });
        Ok(summary)
    }
}
