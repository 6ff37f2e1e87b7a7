use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// Outcome of recording one failed processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Budget remains; return the delivery to the queue.
    Requeue { attempts: u32 },
    /// Budget exhausted; route the delivery to the dead-letter queue.
    DeadLetter { attempts: u32 },
}

/// In-process redelivery budget, keyed by payload content hash.
///
/// AMQP requeue carries no attempt count, so failing payloads are
/// fingerprinted and counted here. Entries are removed on success and on
/// dead-letter routing, which bounds the map to payloads currently cycling
/// through redelivery. Counts reset on process restart.
pub struct RetryTracker {
    max_attempts: u32,
    attempts: Mutex<HashMap<String, u32>>,
}

impl RetryTracker {
    /// `max_attempts` is the total number of processing attempts a payload
    /// gets before it is dead-lettered.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record one failed attempt and decide whether the budget is exhausted.
    pub fn record_failure(&self, payload: &[u8]) -> RetryDecision {
        let key = fingerprint(payload);
        let mut attempts = self.attempts.lock().expect("retry tracker mutex poisoned");
        let count = attempts.entry(key).and_modify(|c| *c += 1).or_insert(1);

        if *count >= self.max_attempts {
            RetryDecision::DeadLetter { attempts: *count }
        } else {
            RetryDecision::Requeue { attempts: *count }
        }
    }

    /// Forget a payload once it reaches a terminal outcome.
    pub fn clear(&self, payload: &[u8]) {
        let key = fingerprint(payload);
        self.attempts
            .lock()
            .expect("retry tracker mutex poisoned")
            .remove(&key);
    }
}

fn fingerprint(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}
