#![forbid(unsafe_code)]

//! Seed selection for reproducible runs.
//!
//! Tests take their seed from the environment when one is given, so a failing
//! interleaving seen in CI can be replayed locally:
//!
//! ```text
//! CHUNKVIEW_TEST_SEED=7 cargo test -p chunkview-harness
//! ```

/// Choose a seed from the environment or use the provided default.
#[must_use]
pub fn fixture_seed(default_seed: u64) -> u64 {
    env_u64("CHUNKVIEW_TEST_SEED")
        .or_else(|| env_u64("E2E_SEED"))
        .unwrap_or(default_seed)
}

/// A fixed list of seeds, led by the environment seed when one is set.
#[must_use]
pub fn fixture_seeds(defaults: &[u64]) -> Vec<u64> {
    match env_u64("CHUNKVIEW_TEST_SEED").or_else(|| env_u64("E2E_SEED")) {
        Some(seed) => vec![seed],
        None => defaults.to_vec(),
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
