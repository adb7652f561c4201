//! Canonical event ordering for deterministic replay.

use crate::domain::EventEnvelope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable ordering key for events.
///
/// Ordering: block_number -> transaction_index -> origin (logs before calls) -> log_index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOrderingKey {
    pub block_number: u64,
    pub transaction_index: u64,
    pub origin_rank: u8,
    pub log_index: u64,
}

impl EventOrderingKey {
    /// Returns true if event_a should come before event_b.
    pub fn should_come_before(event_a: &EventEnvelope, event_b: &EventEnvelope) -> bool {
        event_a.ordering_key() < event_b.ordering_key()
    }
}

impl fmt::Display for EventOrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.block_number, self.transaction_index, self.origin_rank, self.log_index
        )
    }
}

/// Sort events into canonical order. Stable for equal keys.
pub fn sort_events_deterministic(events: &mut [EventEnvelope]) {
    events.sort_by_key(|e| e.ordering_key());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Address, ControlTransferCancelled, DomainEvent, EventMeta, Origin, Timestamp, TxHash,
    };

    fn make_event(block: u64, tx_index: u64, log_index: u64, origin: Origin) -> EventEnvelope {
        EventEnvelope::new(
            EventMeta {
                block_number: block,
                timestamp: Timestamp::new(0),
                transaction_hash: TxHash::new(format!("0x{}{}", block, tx_index)),
                transaction_index: tx_index,
                log_index,
                origin,
            },
            DomainEvent::ControlTransferCancelled(ControlTransferCancelled {
                split: Address::zero(),
            }),
        )
    }

    #[test]
    fn test_event_ordering_by_block() {
        let a = make_event(1, 9, 9, Origin::Log);
        let b = make_event(2, 0, 0, Origin::Log);
        assert!(EventOrderingKey::should_come_before(&a, &b));
        assert!(!EventOrderingKey::should_come_before(&b, &a));
    }

    #[test]
    fn test_event_ordering_calls_after_logs() {
        let call = make_event(5, 1, 0, Origin::Call);
        let log = make_event(5, 1, 30, Origin::Log);
        let next_tx_log = make_event(5, 2, 0, Origin::Log);
        assert!(EventOrderingKey::should_come_before(&log, &call));
        assert!(EventOrderingKey::should_come_before(&call, &next_tx_log));
    }

    #[test]
    fn test_sort_events_deterministic() {
        let mut events = vec![
            make_event(2, 0, 1, Origin::Log),
            make_event(1, 1, 0, Origin::Call),
            make_event(1, 1, 4, Origin::Log),
            make_event(1, 0, 7, Origin::Log),
        ];
        sort_events_deterministic(&mut events);

        let keys: Vec<String> = events.iter().map(|e| e.ordering_key().to_string()).collect();
        assert_eq!(keys, vec!["1:0:0:7", "1:1:0:4", "1:1:1:0", "2:0:0:1"]);
    }
}
