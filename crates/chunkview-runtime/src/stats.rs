#![forbid(unsafe_code)]

//! Session counters.

use std::time::Duration;

/// Monotonic counters describing what a session has done.
///
/// Counters are never reset by `Msg::Reset` or `Msg::Reconfigure`; they cover
/// the whole lifetime of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Load requests issued (reconcile, materialize nudges and refreshes).
    pub loads_issued: u64,
    /// Unload requests issued.
    pub unloads_issued: u64,
    /// Forced refreshes issued via `Msg::RefreshChunk`.
    pub refreshes: u64,
    /// Chunks accepted into the store.
    pub chunks_installed: u64,
    /// Completions dropped because their token was not current.
    pub stale_completions: u64,
    /// Failures reported by the source for current tokens.
    pub load_failures: u64,
    /// Reason attached to the most recent failure.
    pub last_failure: Option<String>,
    /// Latency of the most recent accepted load.
    pub last_load_latency: Option<Duration>,
    /// Largest resident-chunk count seen.
    pub peak_resident: usize,
}

impl SessionStats {
    /// Requests of any kind issued so far.
    #[inline]
    #[must_use]
    pub fn requests_issued(&self) -> u64 {
        self.loads_issued + self.unloads_issued
    }

    /// Completions received so far, accepted or not.
    #[inline]
    #[must_use]
    pub fn completions_seen(&self) -> u64 {
        self.chunks_installed + self.stale_completions + self.load_failures
    }

    pub(crate) fn observe_resident(&mut self, resident: usize) {
        self.peak_resident = self.peak_resident.max(resident);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zeroed() {
        let stats = SessionStats::default();
        assert_eq!(stats.requests_issued(), 0);
        assert_eq!(stats.completions_seen(), 0);
        assert!(stats.last_failure.is_none());
    }

    #[test]
    fn peak_resident_only_grows() {
        let mut stats = SessionStats::default();
        stats.observe_resident(4);
        stats.observe_resident(2);
        assert_eq!(stats.peak_resident, 4);
    }
}
