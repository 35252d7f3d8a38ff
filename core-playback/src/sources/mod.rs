//! # Source Resolution
//!
//! Turns a track's declared sources into candidates, picks the first playable
//! one and attaches the track to the transport.
//!
//! Overlapping loads are ordered by a [`LoadGeneration`]: every externally
//! triggered load takes a fresh [`LoadTicket`], and a load whose ticket has
//! been overtaken by the time probing settles is discarded without touching
//! the transport.

mod manager;
pub mod mime;

pub use manager::{MediaSourceManager, SourceLoad};
pub use mime::{file_name_from_url, mime_from_url, normalize_sources};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counter of load requests.
#[derive(Debug, Clone, Default)]
pub struct LoadGeneration {
    counter: Arc<AtomicU64>,
}

impl LoadGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, invalidating every ticket issued before.
    pub fn advance(&self) -> LoadTicket {
        let generation = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        LoadTicket {
            generation,
            counter: Some(self.counter.clone()),
        }
    }

    /// The generation of the most recent load.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

/// Proof that a load was the latest one when it started.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    counter: Option<Arc<AtomicU64>>,
}

impl LoadTicket {
    /// A ticket that never goes stale, for loads outside any playlist.
    pub fn unguarded() -> Self {
        Self {
            generation: 0,
            counter: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `false` once a newer load has started.
    pub fn is_current(&self) -> bool {
        self.counter
            .as_ref()
            .map_or(true, |counter| counter.load(Ordering::SeqCst) == self.generation)
    }
}
