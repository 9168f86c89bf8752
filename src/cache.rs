use crate::extractor::{ExpressExtractor, ExpressRecord};
use crate::message::{latest_timestamp, SmsMessage};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// The cache's whole state: the records of the last batch extraction plus
/// the fingerprint of the batch they came from. Replaced wholesale on every
/// update so readers never observe a torn snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<ExpressRecord>>,
    pub latest_timestamp: Option<String>,
    pub latest_id: Option<i64>,
    pub loaded_at: Instant,
}

/// Memoizes the last batch extraction against a fingerprint (latest message
/// timestamp/id) with a TTL, so repeated passes over an unchanged message
/// set skip the pattern engine entirely.
pub struct ExtractionCache {
    ttl: Duration,
    inner: Mutex<Option<Arc<Snapshot>>>,
}

impl Default for ExtractionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        ExtractionCache {
            ttl,
            inner: Mutex::new(None),
        }
    }

    /// The cached records, if the snapshot is non-empty, within TTL, and
    /// every provided fingerprint component matches. A `None` component
    /// matches anything.
    pub fn get_if_fresh(
        &self,
        latest_ts: Option<&str>,
        latest_id: Option<i64>,
    ) -> Option<Arc<Vec<ExpressRecord>>> {
        let guard = self.inner.lock().ok()?;
        let snapshot = guard.as_ref()?;

        if snapshot.records.is_empty() {
            return None;
        }
        if snapshot.loaded_at.elapsed() > self.ttl {
            log::debug!("extraction cache expired");
            return None;
        }
        if let Some(ts) = latest_ts {
            if snapshot.latest_timestamp.as_deref() != Some(ts) {
                log::debug!("extraction cache fingerprint mismatch (timestamp)");
                return None;
            }
        }
        if let Some(id) = latest_id {
            if snapshot.latest_id != Some(id) {
                log::debug!("extraction cache fingerprint mismatch (id)");
                return None;
            }
        }

        Some(Arc::clone(&snapshot.records))
    }

    /// The current snapshot regardless of freshness, if any.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.lock().ok()?.clone()
    }

    /// Replace the snapshot wholesale.
    pub fn update(
        &self,
        records: Vec<ExpressRecord>,
        latest_ts: Option<String>,
        latest_id: Option<i64>,
    ) {
        let snapshot = Arc::new(Snapshot {
            records: Arc::new(records),
            latest_timestamp: latest_ts,
            latest_id,
            loaded_at: Instant::now(),
        });
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(snapshot);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = None;
        }
    }

    /// Batch extraction through the cache. The fingerprint is the batch's
    /// latest receipt timestamp; on miss the extractor runs and the result
    /// is cached.
    pub fn get_or_extract(&self, messages: &[SmsMessage]) -> Arc<Vec<ExpressRecord>> {
        let fingerprint = latest_timestamp(messages);
        if let Some(records) = self.get_if_fresh(fingerprint.as_deref(), None) {
            log::debug!("extraction cache hit ({} records)", records.len());
            return records;
        }

        let records = ExpressExtractor::extract_all(messages);
        self.update(records, fingerprint, None);
        self.snapshot()
            .map(|s| Arc::clone(&s.records))
            .unwrap_or_default()
    }
}
