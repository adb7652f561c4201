//! Mock event source for testing without files.

use super::{DataSourceError, EventSource};
use crate::domain::EventEnvelope;
use async_trait::async_trait;

/// Mock event source that returns predefined events.
#[derive(Debug, Clone)]
pub struct MockEventSource {
    events: Vec<EventEnvelope>,
    failure: Option<DataSourceError>,
}

impl MockEventSource {
    /// Create a new mock event source with no events.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            failure: None,
        }
    }

    /// Add an event to the mock event source.
    pub fn with_event(mut self, event: EventEnvelope) -> Self {
        self.events.push(event);
        self
    }

    /// Add multiple events to the mock event source.
    pub fn with_events(mut self, events: Vec<EventEnvelope>) -> Self {
        self.events.extend(events);
        self
    }

    /// Make every fetch fail with `error`.
    pub fn with_failure(mut self, error: DataSourceError) -> Self {
        self.failure = Some(error);
        self
    }
}

impl Default for MockEventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(&self, from_block: u64) -> Result<Vec<EventEnvelope>, DataSourceError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self
            .events
            .iter()
            .filter(|e| e.meta.block_number >= from_block)
            .cloned()
            .collect())
    }
}
