// Date-based batch discovery.
//
// Groups the sorted key stream into runs sharing one calendar-day stamp.
// The date is whatever `YYYY-MM-DD` token appears in the key; keys without
// one are skipped. The listing is sorted, so a run ends at the first key
// carrying a different date.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::cursor::KeyCursor;

/// How many keys to pull from the cursor per refill.
const REFILL_CHUNK: usize = 1000;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])")
        .unwrap_or_else(|e| panic!("date pattern: {e}"))
});

/// One day's worth of log object keys. Never empty once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBatch {
    pub keys: Vec<String>,
    pub date: String,
}

pub struct DateBatcher {
    cursor: KeyCursor,
    buffer: VecDeque<String>,
    chunk: usize,
}

impl DateBatcher {
    pub fn new(cursor: KeyCursor) -> Self {
        Self::with_chunk(cursor, REFILL_CHUNK)
    }

    pub fn with_chunk(cursor: KeyCursor, chunk: usize) -> Self {
        Self {
            cursor,
            buffer: VecDeque::new(),
            chunk: chunk.max(1),
        }
    }

    /// Collect the next maximal run of same-date keys. `None` means the
    /// listing is exhausted.
    pub async fn next_batch(&mut self) -> Result<Option<KeyBatch>> {
        let mut keys = Vec::new();
        let mut date: Option<String> = None;

        loop {
            let Some(key) = self.next_key().await? else {
                break;
            };
            let Some(key_date) = extract_date(&key) else {
                debug!(key = %key, "skipping key without a date stamp");
                continue;
            };
            match &date {
                None => date = Some(key_date),
                Some(current) if *current == key_date => {}
                Some(current) => {
                    if key_date < *current {
                        warn!(
                            key = %key,
                            batch_date = %current,
                            "key date sorts before the current batch; listing order \
                             does not follow dates"
                        );
                    }
                    // Next day's first key stays buffered for the next call.
                    self.buffer.push_front(key);
                    break;
                }
            }
            keys.push(key);
        }

        match date {
            Some(date) if !keys.is_empty() => Ok(Some(KeyBatch { keys, date })),
            _ => Ok(None),
        }
    }

    async fn next_key(&mut self) -> Result<Option<String>> {
        if self.buffer.is_empty() {
            let refill = self.cursor.list(self.chunk).await?;
            self.buffer.extend(refill);
        }
        Ok(self.buffer.pop_front())
    }
}

fn extract_date(key: &str) -> Option<String> {
    DATE_RE.find(key).map(|m| m.as_str().to_string())
}
