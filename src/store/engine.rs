//! The bounded offline store
//!
//! State lives behind one `RwLock`. `store`, `compact` and `sync` hold the
//! write lock across the whole evict-then-insert sequence, including the
//! log append, so accounting never interleaves. Reads take the read lock
//! and always see a fully committed state.
//!
//! Commit order:
//! 1. Redact, serialize and size the payload (no lock held)
//! 2. Apply the oversize policy
//! 3. Plan evictions, oldest first, until the record fits
//! 4. Append one frame carrying the evictions and the insert
//! 5. Only then mutate memory
//!
//! A failed append leaves both the log and memory as they were.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::config::{OversizePolicy, StoreConfig};
use super::errors::{StoreError, StoreResult};
use super::record::{RecordRow, StoreOutcome, StoreReceipt, StoreStats, StoredRecord};
use super::redact::Redactor;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::storage::{LogFrame, MemoryLog, RecordLog, StorageError};

struct StoreState {
    records: VecDeque<StoredRecord>,
    current_storage: u64,
    next_id: u64,
    last_timestamp: f64,
    log: Box<dyn RecordLog>,
}

/// Capacity-bounded, redacting, append-only record store.
pub struct OfflineStore {
    config: StoreConfig,
    redactor: Redactor,
    metrics: Arc<MetricsRegistry>,
    state: RwLock<StoreState>,
}

impl std::fmt::Debug for OfflineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OfflineStore {
    /// Opens a store on top of `log`, replaying whatever it already holds.
    pub fn open<L: RecordLog + 'static>(config: StoreConfig, log: L) -> StoreResult<Self> {
        Self::open_with_metrics(config, log, Arc::new(MetricsRegistry::new()))
    }

    /// Opens a store that reports into a shared metrics registry.
    pub fn open_with_metrics<L: RecordLog + 'static>(
        config: StoreConfig,
        log: L,
        metrics: Arc<MetricsRegistry>,
    ) -> StoreResult<Self> {
        config.validate()?;

        let mut state = StoreState {
            records: VecDeque::new(),
            current_storage: 0,
            next_id: 1,
            last_timestamp: 0.0,
            log: Box::new(log),
        };

        log_event_with_fields(Event::ReplayBegin, &[]);
        if let Err(e) = replay(&mut state) {
            log_event_with_fields(Event::ReplayFailed, &[("error", &e.to_string())]);
            return Err(e);
        }

        let shrunk = shrink_to_limit(&mut state, config.storage_limit_bytes)?;

        let records = state.records.len().to_string();
        let bytes = state.current_storage.to_string();
        let shrunk = shrunk.to_string();
        log_event_with_fields(
            Event::ReplayComplete,
            &[
                ("current_storage", &bytes),
                ("evicted_for_limit", &shrunk),
                ("records", &records),
            ],
        );

        Ok(Self {
            redactor: Redactor::from_config(&config),
            config,
            metrics,
            state: RwLock::new(state),
        })
    }

    /// A store with no persistence.
    pub fn in_memory(config: StoreConfig) -> StoreResult<Self> {
        Self::open(config, MemoryLog::new())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Redacts, sizes and commits `payload` under `record_type`, evicting the
    /// oldest records until it fits.
    pub fn store<T>(&self, record_type: &str, payload: &T) -> StoreResult<StoreOutcome>
    where
        T: Serialize + ?Sized,
    {
        if record_type.is_empty() {
            return Err(StoreError::InvalidRecordType);
        }

        let value = serde_json::to_value(payload)?;
        let redacted = self.redactor.redact(value);
        let data = serde_json::to_vec(&redacted)?;
        let size_bytes = data.len() as u64;
        let limit = self.config.storage_limit_bytes;

        if size_bytes > limit {
            return self.handle_oversize(record_type, size_bytes);
        }

        let mut state = self.write_state()?;

        let mut projected = state.current_storage;
        let mut evicted_ids = Vec::new();
        for record in state.records.iter() {
            if projected + size_bytes <= limit {
                break;
            }
            projected -= record.size_bytes;
            evicted_ids.push(record.id);
        }

        let id = state.next_id;
        let timestamp = now_seconds().max(state.last_timestamp);
        let frame = LogFrame::insert(id, timestamp, record_type, data)
            .with_evictions(evicted_ids.clone());

        let appended = state.log.append(&frame);
        if let Err(e) = appended {
            drop(state);
            self.metrics.increment_store_failures();
            log_event_with_fields(
                Event::StoreFailed,
                &[("error", &e.to_string()), ("record_type", record_type)],
            );
            return Err(e.into());
        }

        let mut evicted = Vec::with_capacity(evicted_ids.len());
        for _ in 0..evicted_ids.len() {
            if let Some(old) = state.records.pop_front() {
                state.current_storage -= old.size_bytes;
                evicted.push(old);
            }
        }

        state.records.push_back(StoredRecord::from_frame(frame));
        state.current_storage += size_bytes;
        state.next_id = id + 1;
        state.last_timestamp = timestamp;
        drop(state);

        for old in &evicted {
            self.metrics.record_evicted(old.size_bytes);
            log_event_with_fields(
                Event::RecordEvicted,
                &[
                    ("id", &old.id.to_string()),
                    ("record_type", &old.record_type),
                    ("size_bytes", &old.size_bytes.to_string()),
                ],
            );
        }

        self.metrics.record_stored(size_bytes);
        log_event_with_fields(
            Event::RecordStored,
            &[
                ("id", &id.to_string()),
                ("record_type", record_type),
                ("size_bytes", &size_bytes.to_string()),
            ],
        );

        Ok(StoreOutcome::Stored(StoreReceipt {
            id,
            record_type: record_type.to_string(),
            size_bytes,
            timestamp,
            evicted: evicted_ids,
        }))
    }

    /// Runs `store` on the blocking pool. The append fsyncs under the write
    /// lock, which must not happen on an async worker thread.
    pub async fn store_async<T>(
        self: &Arc<Self>,
        record_type: impl Into<String>,
        payload: T,
    ) -> StoreResult<StoreOutcome>
    where
        T: Serialize + Send + 'static,
    {
        let store = Arc::clone(self);
        let record_type = record_type.into();
        tokio::task::spawn_blocking(move || store.store(&record_type, &payload))
            .await
            .map_err(|e| StoreError::Interrupted(e.to_string()))?
    }

    fn handle_oversize(&self, record_type: &str, size_bytes: u64) -> StoreResult<StoreOutcome> {
        let limit = self.config.storage_limit_bytes;
        let size = size_bytes.to_string();
        let limit_str = limit.to_string();
        let fields = [
            ("record_type", record_type),
            ("size_bytes", size.as_str()),
            ("storage_limit", limit_str.as_str()),
        ];

        match self.config.oversize_policy {
            OversizePolicy::Reject => {
                self.metrics.increment_rejected();
                log_event_with_fields(Event::RecordRejected, &fields);
                Err(StoreError::RecordTooLarge {
                    size: size_bytes,
                    limit,
                })
            }
            OversizePolicy::Drop => {
                self.metrics.increment_dropped();
                log_event_with_fields(Event::StorageExhausted, &fields);
                Ok(StoreOutcome::Dropped { size_bytes })
            }
        }
    }

    /// All payloads stored under `record_type`, oldest first.
    pub fn retrieve(&self, record_type: &str) -> StoreResult<Vec<Value>> {
        self.retrieve_as(record_type)
    }

    /// Like `retrieve`, deserializing each payload into `T`.
    pub fn retrieve_as<T: DeserializeOwned>(&self, record_type: &str) -> StoreResult<Vec<T>> {
        let state = self.read_state()?;
        let payloads = state
            .records
            .iter()
            .filter(|r| r.record_type == record_type)
            .map(|r| serde_json::from_slice(&r.data))
            .collect::<Result<Vec<T>, _>>()?;
        drop(state);

        self.metrics.increment_retrievals();
        Ok(payloads)
    }

    /// Current accounting.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let state = self.read_state()?;
        Ok(StoreStats {
            record_count: state.records.len(),
            current_storage: state.current_storage,
            storage_limit: self.config.storage_limit_bytes,
            next_id: state.next_id,
            log_size_bytes: state.log.size_bytes(),
        })
    }

    /// Sum of retained record sizes.
    pub fn current_storage(&self) -> StoreResult<u64> {
        Ok(self.read_state()?.current_storage)
    }

    /// Every retained record as an inspection row, oldest first.
    pub fn rows(&self) -> StoreResult<Vec<RecordRow>> {
        let state = self.read_state()?;
        Ok(state.records.iter().map(StoredRecord::to_row).collect())
    }

    /// Rewrites the backing log to hold only the retained records.
    ///
    /// Returns the number of log bytes reclaimed.
    pub fn compact(&self) -> StoreResult<u64> {
        let mut state = self.write_state()?;
        let before = state.log.size_bytes();
        let frames = snapshot_frames(&state);
        state.log.rewrite(&frames)?;
        let after = state.log.size_bytes();
        drop(state);

        self.metrics.increment_compactions();
        log_event_with_fields(
            Event::LogCompacted,
            &[("after_bytes", &after.to_string()), ("before_bytes", &before.to_string())],
        );
        Ok(before.saturating_sub(after))
    }

    /// Flushes the backing log.
    pub fn sync(&self) -> StoreResult<()> {
        self.write_state()?.log.sync()?;
        Ok(())
    }
}

fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Rebuilds in-memory state from the log. Evictions in a frame must name the
/// current oldest records, in order.
fn replay(state: &mut StoreState) -> StoreResult<()> {
    let frames = state.log.replay()?;

    for frame in frames {
        if frame.is_watermark() {
            if frame.record_id + 1 < state.next_id {
                return Err(StorageError::corruption(format!(
                    "Watermark {} is below replayed id {}",
                    frame.record_id,
                    state.next_id - 1
                ))
                .into());
            }
            state.next_id = frame.record_id + 1;
            state.last_timestamp = state.last_timestamp.max(frame.timestamp);
            continue;
        }

        for evicted_id in &frame.evicted_ids {
            match state.records.front() {
                Some(front) if front.id == *evicted_id => {
                    if let Some(old) = state.records.pop_front() {
                        state.current_storage -= old.size_bytes;
                    }
                }
                _ => {
                    return Err(StorageError::corruption(format!(
                        "Frame for record {} evicts {} which is not the oldest record",
                        frame.record_id, evicted_id
                    ))
                    .into())
                }
            }
        }

        if frame.record_id < state.next_id {
            return Err(StorageError::corruption(format!(
                "Record id {} is not greater than previous id {}",
                frame.record_id,
                state.next_id - 1
            ))
            .into());
        }

        state.next_id = frame.record_id + 1;
        state.last_timestamp = state.last_timestamp.max(frame.timestamp);
        let record = StoredRecord::from_frame(frame);
        state.current_storage += record.size_bytes;
        state.records.push_back(record);
    }

    Ok(())
}

/// Frames that rebuild `state` on their own: every retained record, then a
/// watermark so ids and timestamps never go back after a rewrite.
fn snapshot_frames(state: &StoreState) -> Vec<LogFrame> {
    let mut frames: Vec<LogFrame> = state.records.iter().map(StoredRecord::to_frame).collect();
    if state.next_id > 1 {
        frames.push(LogFrame::watermark(state.next_id - 1, state.last_timestamp));
    }
    frames
}

/// Evicts oldest records until the replayed state fits a (possibly lowered)
/// limit, then rewrites the log so the evictions persist.
fn shrink_to_limit(state: &mut StoreState, limit: u64) -> StoreResult<usize> {
    let mut evicted = 0;
    while state.current_storage > limit {
        match state.records.pop_front() {
            Some(old) => {
                state.current_storage -= old.size_bytes;
                evicted += 1;
            }
            None => break,
        }
    }

    if evicted > 0 {
        let frames = snapshot_frames(state);
        state.log.rewrite(&frames)?;
    }

    Ok(evicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_of_size(size: usize) -> Value {
        // {"p":"..."} is 8 bytes of framing around the string contents.
        json!({ "p": "x".repeat(size - 8) })
    }

    #[test]
    fn test_payload_helper_sizes() {
        for size in [10, 40, 50, 100] {
            assert_eq!(serde_json::to_vec(&payload_of_size(size)).unwrap().len(), size);
        }
    }

    #[test]
    fn test_store_then_retrieve_redacted() {
        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        store
            .store("nft", &json!({"dna_secrets": "ACGT...", "score": 0.95}))
            .unwrap();

        let records = store.retrieve("nft").unwrap();
        assert_eq!(records, vec![json!({"dna_secrets": "REDACTED", "score": 0.95})]);
    }

    #[test]
    fn test_size_is_redacted_canonical_length() {
        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        let outcome = store
            .store("nft", &json!({"score": 1, "dna_secrets": "a-very-long-secret-strand"}))
            .unwrap();

        let expected = br#"{"dna_secrets":"REDACTED","score":1}"#.len() as u64;
        assert_eq!(outcome.receipt().unwrap().size_bytes, expected);
        assert_eq!(store.current_storage().unwrap(), expected);
    }

    #[test]
    fn test_unknown_type_is_empty() {
        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        assert!(store.retrieve("unknown_type").unwrap().is_empty());
    }

    #[test]
    fn test_empty_type_rejected() {
        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        let err = store.store("", &json!({})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecordType));
        assert_eq!(store.stats().unwrap().record_count, 0);
    }

    #[test]
    fn test_unserializable_payload_rejected() {
        use std::collections::HashMap;

        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);

        let err = store.store("bad", &bad).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert_eq!(store.stats().unwrap().record_count, 0);
    }

    #[test]
    fn test_eviction_removes_oldest() {
        let store = OfflineStore::in_memory(StoreConfig::with_limit(100)).unwrap();
        store.store("a", &payload_of_size(40)).unwrap();
        store.store("b", &payload_of_size(40)).unwrap();

        let outcome = store.store("c", &payload_of_size(50)).unwrap();

        assert_eq!(outcome.receipt().unwrap().evicted, vec![1]);
        assert_eq!(store.current_storage().unwrap(), 90);
        assert!(store.retrieve("a").unwrap().is_empty());
        assert_eq!(store.retrieve("b").unwrap().len(), 1);
    }

    #[test]
    fn test_eviction_loops_until_fit() {
        let store = OfflineStore::in_memory(StoreConfig::with_limit(100)).unwrap();
        for _ in 0..5 {
            store.store("small", &payload_of_size(20)).unwrap();
        }

        let outcome = store.store("big", &payload_of_size(90)).unwrap();

        assert_eq!(outcome.receipt().unwrap().evicted, vec![1, 2, 3, 4, 5]);
        let stats = store.stats().unwrap();
        assert_eq!(stats.record_count, 1);
        assert_eq!(stats.current_storage, 90);
    }

    #[test]
    fn test_exact_fit_does_not_evict() {
        let store = OfflineStore::in_memory(StoreConfig::with_limit(100)).unwrap();
        store.store("a", &payload_of_size(50)).unwrap();
        let outcome = store.store("b", &payload_of_size(50)).unwrap();
        assert!(outcome.receipt().unwrap().evicted.is_empty());
        assert_eq!(store.current_storage().unwrap(), 100);
    }

    #[test]
    fn test_oversize_reject_leaves_store_unchanged() {
        let store = OfflineStore::in_memory(StoreConfig::with_limit(100)).unwrap();
        store.store("a", &payload_of_size(40)).unwrap();

        let err = store.store("huge", &payload_of_size(101)).unwrap_err();

        assert!(matches!(err, StoreError::RecordTooLarge { size: 101, limit: 100 }));
        assert_eq!(store.retrieve("a").unwrap().len(), 1);
        assert_eq!(store.current_storage().unwrap(), 40);
        assert_eq!(store.metrics().snapshot().records_rejected, 1);
    }

    #[test]
    fn test_oversize_drop_leaves_store_unchanged() {
        let config = StoreConfig::with_limit(100).oversize_policy(OversizePolicy::Drop);
        let store = OfflineStore::in_memory(config).unwrap();
        store.store("a", &payload_of_size(40)).unwrap();

        let outcome = store.store("huge", &payload_of_size(101)).unwrap();

        assert_eq!(outcome, StoreOutcome::Dropped { size_bytes: 101 });
        assert_eq!(store.current_storage().unwrap(), 40);
        assert_eq!(store.metrics().snapshot().records_dropped, 1);
    }

    #[test]
    fn test_ids_and_timestamps_monotonic() {
        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        let mut last_id = 0;
        let mut last_ts = 0.0;
        for i in 0..20 {
            let outcome = store.store("t", &json!({ "i": i })).unwrap();
            let receipt = outcome.receipt().unwrap();
            assert!(receipt.id > last_id);
            assert!(receipt.timestamp >= last_ts);
            last_id = receipt.id;
            last_ts = receipt.timestamp;
        }
    }

    #[test]
    fn test_retrieve_as_typed() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Blueprint {
            seq: String,
        }

        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        store.store("nano", &json!({"seq": "P vs NP"})).unwrap();

        let typed: Vec<Blueprint> = store.retrieve_as("nano").unwrap();
        assert_eq!(typed, vec![Blueprint { seq: "P vs NP".into() }]);
    }

    #[tokio::test]
    async fn test_store_async_commits_like_store() {
        let store = Arc::new(OfflineStore::in_memory(StoreConfig::with_limit(100)).unwrap());
        store.store("a", &payload_of_size(60)).unwrap();

        let outcome = store.store_async("b", payload_of_size(60)).await.unwrap();
        assert_eq!(outcome.receipt().unwrap().evicted, vec![1]);

        let err = store.store_async("c", payload_of_size(200)).await.unwrap_err();
        assert!(matches!(err, StoreError::RecordTooLarge { .. }));
        assert_eq!(store.current_storage().unwrap(), 60);
    }

    #[test]
    fn test_compact_keeps_live_records() {
        let store = OfflineStore::in_memory(StoreConfig::with_limit(100)).unwrap();
        for _ in 0..6 {
            store.store("t", &payload_of_size(40)).unwrap();
        }
        let before = store.retrieve("t").unwrap();

        let reclaimed = store.compact().unwrap();

        assert!(reclaimed > 0);
        assert_eq!(store.retrieve("t").unwrap(), before);
        assert_eq!(store.stats().unwrap().next_id, 7);
    }

    #[test]
    fn test_rows_expose_inspection_schema() {
        let store = OfflineStore::in_memory(StoreConfig::default()).unwrap();
        store.store("gift_proposal", &json!({"amount": 5})).unwrap();

        let rows = store.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].record_type, "gift_proposal");
        assert_eq!(rows[0].data, r#"{"amount":5}"#);
    }
}
