//! Sequential event driver.
//!
//! Each event is applied against a [`StagedStore`] over the committed store
//! and committed as one batch only if its handler succeeds.

use super::handlers::{dispatch, HandlerContext};
use crate::config::{Config, OrderingMode};
use crate::datasource::ChainReader;
use crate::domain::{sort_events_deterministic, Address, EventEnvelope, EventOrderingKey};
use crate::engine::downstream;
use crate::error::IndexerError;
use crate::store::{EntityStore, StagedStore};
use tracing::{debug, error, info};

/// Result of [`Indexer::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied { swap_legs: usize, dropped_legs: usize },
    /// At or below the watermark; already processed.
    Skipped,
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: Vec<(EventOrderingKey, IndexerError)>,
    pub swap_legs: usize,
    pub dropped_legs: usize,
}

pub struct Indexer<S: EntityStore, R: ChainReader> {
    store: S,
    reader: R,
    config: Config,
    watermark: Option<EventOrderingKey>,
}

impl<S: EntityStore, R: ChainReader> Indexer<S, R> {
    pub fn new(store: S, reader: R, config: Config) -> Self {
        Self {
            store,
            reader,
            config,
            watermark: None,
        }
    }

    /// Resume after a persisted checkpoint.
    pub fn with_watermark(mut self, watermark: Option<EventOrderingKey>) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn watermark(&self) -> Option<EventOrderingKey> {
        self.watermark
    }

    /// Every account reachable from `id` through the recipient graph.
    pub fn downstream(&self, id: &Address) -> Result<Vec<Address>, IndexerError> {
        downstream(&self.store, id)
    }

    /// Apply one event. On error nothing is written and the watermark stays put.
    pub fn process(&mut self, envelope: &EventEnvelope) -> Result<Outcome, IndexerError> {
        let key = envelope.ordering_key();
        if let Some(watermark) = self.watermark {
            if key <= watermark {
                return match self.config.ordering_mode {
                    OrderingMode::Strict => Err(IndexerError::OutOfOrder { key, watermark }),
                    OrderingMode::Sort => {
                        debug!("Skipping {} at {}: already processed", envelope.event.name(), key);
                        Ok(Outcome::Skipped)
                    }
                };
            }
        }

        let staged = StagedStore::new(&self.store);
        let mut ctx = HandlerContext::new(staged, &envelope.meta, &self.reader, &self.config);
        dispatch(&mut ctx, &envelope.event)?;

        let outcome = Outcome::Applied {
            swap_legs: ctx.swap_legs,
            dropped_legs: ctx.dropped_legs,
        };
        let batch = ctx.store.into_batch();
        debug!(
            "Applied {} at {} ({} writes)",
            envelope.event.name(),
            key,
            batch.len()
        );
        self.store.write_batch(batch)?;
        self.watermark = Some(key);
        Ok(outcome)
    }

    /// Apply a batch of events. A failing event is recorded and skipped;
    /// the rest of the batch still runs.
    ///
    /// Events at or below the watermark the replay started from are
    /// re-deliveries of a resumed source and are skipped in either mode.
    pub fn replay(&mut self, mut events: Vec<EventEnvelope>) -> ReplayReport {
        if self.config.ordering_mode == OrderingMode::Sort {
            sort_events_deterministic(&mut events);
        }

        let resumed_from = self.watermark;
        let mut report = ReplayReport::default();
        for envelope in &events {
            if resumed_from.is_some_and(|w| envelope.ordering_key() <= w) {
                debug!(
                    "Skipping {} at {}: delivered before resume",
                    envelope.event.name(),
                    envelope.ordering_key()
                );
                report.skipped += 1;
                continue;
            }
            match self.process(envelope) {
                Ok(Outcome::Applied {
                    swap_legs,
                    dropped_legs,
                }) => {
                    report.processed += 1;
                    report.swap_legs += swap_legs;
                    report.dropped_legs += dropped_legs;
                }
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    let key = envelope.ordering_key();
                    error!("Failed to apply {} at {}: {}", envelope.event.name(), key, e);
                    report.failed.push((key, e));
                }
            }
        }

        info!(
            "Replay finished: {} processed, {} skipped, {} failed",
            report.processed,
            report.skipped,
            report.failed.len()
        );
        report
    }
}
