use splits_indexer::datasource::{EventSource, JsonlEventSource, UnavailableChainReader};
use splits_indexer::domain::{Address, Amount};
use splits_indexer::engine::Ledger;
use splits_indexer::{init_db, Config, Indexer, OrderingMode, Repository};
use std::io::Write;
use tempfile::TempDir;

fn addr(n: u8) -> Address {
    Address::new(format!("0x{:040x}", n))
}

const EVENTS: &str = r#"
# split with two recipients, then one distribution
{"meta":{"blockNumber":1,"timestamp":1700000000,"transactionHash":"0x01","logIndex":0},"event":{"type":"splitCreated","split":"0x000000000000000000000000000000000000001e","recipients":[{"account":"0x0000000000000000000000000000000000000001","ownership":600000},{"account":"0x0000000000000000000000000000000000000002","ownership":400000}],"distributorFee":0}}
{"meta":{"blockNumber":2,"timestamp":1700000012,"transactionHash":"0x02","logIndex":3},"event":{"type":"fundsDistributed","split":"0x000000000000000000000000000000000000001e","token":"0x0000000000000000000000000000000000000032","amount":"1000","distributor":"0x0000000000000000000000000000000000000000"}}
"#;

const MORE_EVENTS: &str = r#"{"meta":{"blockNumber":3,"timestamp":1700000024,"transactionHash":"0x03","logIndex":0},"event":{"type":"fundsDistributed","split":"0x000000000000000000000000000000000000001e","token":"0x0000000000000000000000000000000000000032","amount":"500","distributor":"0x0000000000000000000000000000000000000000"}}
"#;

async fn setup() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("indexer.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Repository::new(pool), temp_dir)
}

fn write_events(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("events.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn test_snapshot_round_trip_and_resume() {
    let (repo, dir) = setup().await;
    let token = addr(50);

    let source = JsonlEventSource::new(write_events(&dir, EVENTS));
    let events = source.fetch_events(0).await.unwrap();
    assert_eq!(events.len(), 2);

    let (store, watermark) = repo.load_snapshot().await.unwrap();
    assert!(watermark.is_none());
    let mut indexer =
        Indexer::new(store, UnavailableChainReader, Config::in_memory()).with_watermark(watermark);
    let report = indexer.replay(events);
    assert_eq!(report.processed, 2);

    let watermark = indexer.watermark();
    let store = indexer.into_store();
    repo.persist_snapshot(&store, watermark.as_ref()).await.unwrap();

    let (loaded, loaded_watermark) = repo.load_snapshot().await.unwrap();
    assert_eq!(loaded, store);
    assert_eq!(loaded_watermark, watermark);
    assert_eq!(loaded_watermark.map(|w| w.log_index), Some(3));

    // A second run sees the old events again plus a new one.
    let source = JsonlEventSource::new(write_events(&dir, &format!("{}{}", EVENTS, MORE_EVENTS)));
    let events = source.fetch_events(2).await.unwrap();
    assert_eq!(events.len(), 2);

    let mut indexer = Indexer::new(loaded, UnavailableChainReader, Config::in_memory())
        .with_watermark(loaded_watermark);
    let report = indexer.replay(events);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.processed, 1);
    assert_eq!(
        Ledger::active_balance(indexer.store(), &addr(1), &token).unwrap(),
        Some(Amount::from_u64(900))
    );
}

#[tokio::test]
async fn test_strict_resume_skips_events_from_watermark_block() {
    let (repo, dir) = setup().await;
    let mut config = Config::in_memory();
    config.ordering_mode = OrderingMode::Strict;

    let source = JsonlEventSource::new(write_events(&dir, EVENTS));
    let mut indexer = Indexer::new(
        repo.load_snapshot().await.unwrap().0,
        UnavailableChainReader,
        config.clone(),
    );
    let report = indexer.replay(source.fetch_events(0).await.unwrap());
    assert_eq!(report.processed, 2);
    let watermark = indexer.watermark();
    repo.persist_snapshot(&indexer.into_store(), watermark.as_ref())
        .await
        .unwrap();

    // Restart with nothing new: the watermark block is read again.
    let (store, watermark) = repo.load_snapshot().await.unwrap();
    let from_block = watermark.map(|w| w.block_number).unwrap_or(0);
    let mut indexer =
        Indexer::new(store, UnavailableChainReader, config.clone()).with_watermark(watermark);
    let report = indexer.replay(source.fetch_events(from_block).await.unwrap());
    assert_eq!(report.processed, 0);
    assert_eq!(report.skipped, 1);
    assert!(report.failed.is_empty());

    // New events after the watermark still apply.
    let source = JsonlEventSource::new(write_events(&dir, &format!("{}{}", EVENTS, MORE_EVENTS)));
    let report = indexer.replay(source.fetch_events(from_block).await.unwrap());
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.failed.is_empty());
    assert_eq!(
        Ledger::active_balance(indexer.store(), &addr(1), &addr(50)).unwrap(),
        Some(Amount::from_u64(900))
    );
}
