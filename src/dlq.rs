use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::domain::{DeadLetterQueue, Error};

/// Logs every dead letter as a warning.
#[derive(Default, Debug)]
pub struct TracingDLQ {}

impl DeadLetterQueue for TracingDLQ {
    fn report(&self, error: &Error) {
        warn!(error = %error, "dead letter");
    }
}

/// Keeps dead letters in memory so a caller can inspect them afterwards.
#[derive(Default, Debug)]
pub struct MemoryDLQ {
    letters: Mutex<Vec<String>>,
}

impl MemoryDLQ {
    pub fn letters(&self) -> Vec<String> {
        self.letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DeadLetterQueue for MemoryDLQ {
    fn report(&self, error: &Error) {
        self.letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }
}
