#![forbid(unsafe_code)]

//! Request tokens and the in-flight load ledger.
//!
//! Every load request carries a [`RequestToken`]: the chunk start plus a
//! generation number that is unique for the lifetime of the ledger. The
//! ledger remembers the one token currently expected for each chunk. A
//! completion is accepted only when its token matches; anything else (a
//! duplicate, a completion for an unloaded chunk, a completion overtaken by a
//! refresh or a reset) is stale.
//!
//! # Invariants
//!
//! 1. Generations are strictly increasing and never reused, even across
//!    [`RequestLedger::clear`].
//! 2. At most one token is expected per chunk start.

use std::collections::BTreeMap;
use std::time::Duration;

use web_time::Instant;

/// Identity of one issued load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken {
    /// Chunk-aligned start index of the requested chunk.
    pub chunk_start: usize,
    /// Ledger-wide unique issue number.
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    issued_at: Instant,
}

/// Tracks the expected token for every chunk with a load in flight.
#[derive(Debug, Clone, Default)]
pub struct RequestLedger {
    next_generation: u64,
    in_flight: BTreeMap<usize, InFlight>,
}

impl RequestLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for `chunk_start`, superseding any earlier one.
    pub fn issue(&mut self, chunk_start: usize) -> RequestToken {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.in_flight.insert(
            chunk_start,
            InFlight {
                generation,
                issued_at: Instant::now(),
            },
        );
        RequestToken {
            chunk_start,
            generation,
        }
    }

    /// Whether `token` is the one currently expected.
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.in_flight
            .get(&token.chunk_start)
            .is_some_and(|entry| entry.generation == token.generation)
    }

    /// Accept a completion. Returns the request latency, or `None` if the
    /// token is stale.
    pub fn complete(&mut self, token: RequestToken) -> Option<Duration> {
        if !self.is_current(token) {
            return None;
        }
        self.in_flight
            .remove(&token.chunk_start)
            .map(|entry| entry.issued_at.elapsed())
    }

    /// Forget the in-flight load for `chunk_start`, if any.
    pub fn cancel(&mut self, chunk_start: usize) -> bool {
        self.in_flight.remove(&chunk_start).is_some()
    }

    /// Whether a load for `chunk_start` is in flight.
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self, chunk_start: usize) -> bool {
        self.in_flight.contains_key(&chunk_start)
    }

    /// Chunk starts with a load in flight, ascending.
    pub fn in_flight(&self) -> impl Iterator<Item = usize> + '_ {
        self.in_flight.keys().copied()
    }

    /// Number of loads in flight.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether nothing is in flight.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Forget every in-flight load. Generations keep counting up, so tokens
    /// issued before the clear stay stale.
    pub fn clear(&mut self) {
        self.in_flight.clear();
    }

    /// Generation the next token will carry.
    #[inline]
    #[must_use]
    pub fn next_generation(&self) -> u64 {
        self.next_generation
    }
}
