//! Newline-delimited JSON event file.
//!
//! One [`EventEnvelope`] per line. Blank lines and lines starting with `#`
//! are skipped.

use super::{DataSourceError, EventSource};
use crate::domain::EventEnvelope;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonlEventSource {
    path: PathBuf,
}

impl JsonlEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Decode file contents. Line numbers in errors are 1-based.
    pub fn parse(contents: &str) -> Result<Vec<EventEnvelope>, DataSourceError> {
        let mut events = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let envelope: EventEnvelope =
                serde_json::from_str(line).map_err(|e| DataSourceError::ParseError {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            events.push(envelope);
        }
        Ok(events)
    }
}

#[async_trait]
impl EventSource for JsonlEventSource {
    async fn fetch_events(&self, from_block: u64) -> Result<Vec<EventEnvelope>, DataSourceError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DataSourceError::Io(format!("{}: {}", self.path.display(), e))
        })?;
        let events: Vec<EventEnvelope> = Self::parse(&contents)?
            .into_iter()
            .filter(|e| e.meta.block_number >= from_block)
            .collect();
        debug!(
            "Read {} events from {} (from block {})",
            events.len(),
            self.path.display(),
            from_block
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LINE_A: &str = r#"{"meta":{"blockNumber":10,"timestamp":120,"transactionHash":"0xaa","logIndex":0},"event":{"type":"controlTransferCancelled","split":"0x0000000000000000000000000000000000000001"}}"#;
    const LINE_B: &str = r#"{"meta":{"blockNumber":20,"timestamp":240,"transactionHash":"0xbb","logIndex":1},"event":{"type":"recoupCreated","waterfall":"0x0000000000000000000000000000000000000002"}}"#;

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let contents = format!("# header\n{}\n\n{}\n", LINE_A, LINE_B);
        let events = JsonlEventSource::parse(&contents).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].meta.block_number, 20);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let contents = format!("{}\n{{not json}}\n", LINE_A);
        match JsonlEventSource::parse(&contents) {
            Err(DataSourceError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_events_filters_by_block() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        tokio::fs::write(&path, format!("{}\n{}\n", LINE_A, LINE_B))
            .await
            .unwrap();

        let source = JsonlEventSource::new(&path);
        let events = source.fetch_events(15).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].meta.block_number, 20);
    }

    #[tokio::test]
    async fn test_fetch_events_missing_file() {
        let source = JsonlEventSource::new("/nonexistent/events.jsonl");
        assert!(matches!(
            source.fetch_events(0).await,
            Err(DataSourceError::Io(_))
        ));
    }
}
