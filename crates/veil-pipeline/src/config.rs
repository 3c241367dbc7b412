//! Pipeline configuration.

/// Immutable settings threaded through a pipeline run.
///
/// Built once per invocation and passed by value (it's small and `Copy`)
/// to every stage that needs it — nothing in this crate reaches for global
/// or thread-local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Declared bit width for the `uint` type, e.g. `256`.
    pub uint_width: u32,
    /// Upper bound on the exponent a baby-step/giant-step discrete-log
    /// search will scan before giving up. Not consulted by this crate
    /// directly — `veil-crypto`'s solver takes its own bound — but carried
    /// here so a caller driving both crates from one `Config` has a single
    /// place to set it.
    pub max_dlog_exponent: u32,
    /// Whether a function that is both externally-verified and recursive
    /// is rejected outright (`true`, the default) or merely flagged in the
    /// hybrid-detection result for the caller to act on.
    pub reject_non_inlineable_recursion: bool,
}

impl Config {
    /// `uint256`, a `2^32`-step discrete-log search, recursion hard-rejected.
    pub fn new(uint_width: u32) -> Self {
        Config {
            uint_width,
            max_dlog_exponent: 32,
            reject_non_inlineable_recursion: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(256)
    }
}
