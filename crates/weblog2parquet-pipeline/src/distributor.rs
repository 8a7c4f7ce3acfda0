// Shared work queue for one batch's keys.
//
// Hands each key to exactly one caller, in listing order. Keys are never
// requeued: a caller that fails an object is responsible for logging it.

use parking_lot::Mutex;

struct DistributorState {
    keys: Vec<String>,
    next: usize,
}

pub struct WorkDistributor {
    state: Mutex<DistributorState>,
}

impl WorkDistributor {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            state: Mutex::new(DistributorState { keys, next: 0 }),
        }
    }

    /// Pop the next undelivered key; `None` once all are handed out.
    pub fn take_next(&self) -> Option<String> {
        let mut state = self.state.lock();
        let key = state.keys.get(state.next)?.clone();
        state.next += 1;
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn delivers_keys_in_order_then_none() {
        let dist = WorkDistributor::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(dist.take_next().as_deref(), Some("a"));
        assert_eq!(dist.take_next().as_deref(), Some("b"));
        assert_eq!(dist.take_next().as_deref(), Some("c"));
        assert_eq!(dist.take_next(), None);
        assert_eq!(dist.take_next(), None);
    }

    #[test]
    fn empty_distributor_yields_none() {
        let dist = WorkDistributor::new(Vec::new());
        assert_eq!(dist.take_next(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_pullers_see_each_key_exactly_once() {
        let keys: Vec<String> = (0..500).map(|i| format!("key-{i:04}")).collect();
        let dist = Arc::new(WorkDistributor::new(keys.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dist = dist.clone();
            handles.push(tokio::spawn(async move {
                let mut pulled = Vec::new();
                while let Some(key) = dist.take_next() {
                    pulled.push(key);
                    tokio::task::yield_now().await;
                }
                pulled
            }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.extend(handle.await.unwrap());
        }

        assert_eq!(seen.len(), keys.len());
        let unique: HashSet<&String> = seen.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
