//! Batch scheduler for automated status scanning
//!
//! One tick selects a bounded batch of items under the configured rate
//! budget and inspects them one at a time. Selection runs in two passes:
//! never-checked items first (newest-published first), then, only when the
//! batch has room left, the stalest previously-checked items. New content
//! is prioritized and re-checks age out in FIFO order.
//!
//! Sequential per-item processing plus the bounded batch size is the whole
//! backpressure mechanism against the external quota (~2,000 requests/day);
//! there is no token bucket and no parallelism to burst through it.

use crate::client::InspectionClient;
use crate::config::Settings;
use crate::store::{ItemRecord, SharedItemStore};
use crate::Result;
use std::sync::Arc;

/// Outcome counts of one scheduler tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Items selected for this tick
    pub selected: usize,

    /// Items whose inspection completed
    pub inspected: usize,

    /// Items skipped because no canonical URL resolved
    pub skipped: usize,

    /// Items whose inspection errored (logged and passed over)
    pub failed: usize,
}

/// Drives one batch of inspections per external trigger
pub struct BatchScheduler {
    settings: Arc<Settings>,
    inspector: InspectionClient,
    store: SharedItemStore,
}

impl BatchScheduler {
    /// Creates a new batch scheduler
    ///
    /// # Arguments
    ///
    /// * `settings` - Immutable settings snapshot for this tick
    /// * `inspector` - Inspection client used per item
    /// * `store` - Item store for selection and URL resolution
    pub fn new(
        settings: Arc<Settings>,
        inspector: InspectionClient,
        store: SharedItemStore,
    ) -> Self {
        Self {
            settings,
            inspector,
            store,
        }
    }

    /// Runs one scheduling tick
    ///
    /// A no-op when scanning is disabled or the item-type allow-list is
    /// empty. Per-item inspection errors never abort the batch; every
    /// selected item gets its turn and the tick ends when the batch is
    /// done. Failed items are not retried within the tick; the next
    /// period picks them up again.
    pub async fn run_tick(&self) -> Result<TickSummary> {
        let mut summary = TickSummary::default();

        if !self.settings.scan_enabled {
            tracing::debug!("Scheduled scan is disabled, skipping tick");
            return Ok(summary);
        }

        if self.settings.item_types.is_empty() {
            tracing::debug!("No item types enabled for scanning, skipping tick");
            return Ok(summary);
        }

        let batch = self.select_batch()?;
        summary.selected = batch.len();

        if batch.is_empty() {
            tracing::debug!("No items need checking this tick");
            return Ok(summary);
        }

        tracing::info!(
            "Scan tick: processing {} items (batch size {})",
            batch.len(),
            self.settings.scan_speed.batch_size()
        );

        for item in batch {
            // Resolve the canonical URL through the store; an item that no
            // longer resolves is skipped with no side effects.
            let url = {
                let store = self.store.lock().unwrap();
                match store.canonical_url(item.id) {
                    Ok(Some(url)) => url,
                    Ok(None) => {
                        summary.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to resolve URL for item {}: {}", item.id, e);
                        summary.skipped += 1;
                        continue;
                    }
                }
            };

            match self.inspector.inspect(&url, Some(item.id)).await {
                Ok(inspection) => {
                    summary.inspected += 1;
                    tracing::debug!("Item {} ({}) is {}", item.id, url, inspection.status);
                }
                Err(e) => {
                    // One item must never take the batch down with it.
                    summary.failed += 1;
                    tracing::warn!("Inspection failed for {}: {}", url, e);
                }
            }
        }

        tracing::info!(
            "Scan tick complete: {} inspected, {} skipped, {} failed",
            summary.inspected,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    /// Selects the items for this tick
    ///
    /// Pass 1 fills the batch with never-checked items; pass 2 tops it up
    /// with the stalest checked items only when pass 1 under-filled it.
    fn select_batch(&self) -> Result<Vec<ItemRecord>> {
        let batch_size = self.settings.scan_speed.batch_size();
        let types = &self.settings.item_types;
        let store = self.store.lock().unwrap();

        let mut batch = store.find_never_checked(types, batch_size)?;

        if batch.len() < batch_size {
            let remaining = batch_size - batch.len();
            let stale = store.find_oldest_checked(types, remaining)?;
            batch.extend(stale);
        }

        Ok(batch)
    }
}
