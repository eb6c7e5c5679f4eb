use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::metrics::Sample;

/// In-memory accumulator for samples awaiting publication.
///
/// A single mutex covers appends and swaps and is never held across an
/// `.await`. Clones share the same underlying storage.
pub struct SampleBuffer {
    entries: Arc<Mutex<Vec<Sample>>>,
    max_retained: Option<usize>,
}

impl SampleBuffer {
    /// Create an unbounded buffer.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            max_retained: None,
        }
    }

    /// Create a buffer that caps how many samples survive a [`restore`](Self::restore).
    pub fn with_max_retained(max_retained: Option<usize>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            max_retained,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Sample>> {
        // Every critical section leaves the Vec in a valid state.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a sample. Never fails.
    pub fn append(&self, sample: Sample) {
        self.lock().push(sample);
    }

    /// Atomically take everything recorded so far, leaving the buffer empty.
    pub fn take_and_clear(&self) -> Vec<Sample> {
        std::mem::take(&mut *self.lock())
    }

    /// Merge a batch that failed to publish back in front of anything
    /// appended since it was taken.
    ///
    /// Returns the number of samples dropped because of the retention cap,
    /// oldest first.
    pub fn restore(&self, batch: Vec<Sample>) -> usize {
        let mut entries = self.lock();
        let newer = std::mem::take(&mut *entries);
        let mut merged = batch;
        merged.extend(newer);

        let dropped = match self.max_retained {
            Some(max) if merged.len() > max => {
                let excess = merged.len() - max;
                merged.drain(..excess);
                excess
            }
            _ => 0,
        };

        *entries = merged;
        dropped
    }

    /// Get the current number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SampleBuffer {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            max_retained: self.max_retained,
        }
    }
}
