//! Ambient configuration surface (component C10): the knobs `diff::build`
//! and `Patch` take, kept separate from the algorithms themselves so a CLI
//! or embedding application can override them without touching engine code.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Controls how long `diff::build` is willing to spend in `bisect` before
/// giving up and returning a degenerate `[Delete, Insert]` split.
///
/// Not `Serialize`/`Deserialize`: `Instant` has no stable wire format, so a
/// deadline is always constructed at call time from a `Duration`.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    pub deadline: Option<Instant>,
}

impl BuildConfig {
    /// No deadline: `bisect` always runs to completion and the half-match
    /// heuristic is skipped in favor of minimality (see SPEC_FULL §4.1.1).
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { deadline: Some(Instant::now() + timeout) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.deadline.is_none()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.map(|d| Instant::now() > d).unwrap_or(false)
    }
}

impl Default for BuildConfig {
    /// The diff-match-patch default: one second.
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(1))
    }
}

/// Bitap tuning: how far from the anchor, and how imperfect, a match may
/// be and still be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitapConfig {
    /// How far a match can stray from its expected location before it is
    /// scored as a total mismatch.
    pub distance: u32,
    /// Maximum combined (error-rate + proximity) score accepted as a match.
    pub match_threshold: f64,
}

impl Default for BitapConfig {
    fn default() -> Self {
        Self { distance: 1000, match_threshold: 0.5 }
    }
}

/// Knobs for patch construction and application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchConfig {
    pub bitap: BitapConfig,
    /// Minimum run of unchanged bytes required to close an open patch
    /// fragment, and the amount of surrounding context added around each
    /// fragment's payload.
    pub patch_margin: u16,
    /// Maximum acceptable `levenshtein(diff) / |left|` ratio when applying
    /// a long-delete fragment against drifted context.
    pub delete_threshold: f64,
    /// Bitap word width; patterns longer than this are chunked by
    /// `Patch::split_max` before being handed to `bitap::execute`.
    pub match_max_bits: u16,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            bitap: BitapConfig::default(),
            patch_margin: 4,
            delete_threshold: 0.5,
            match_max_bits: crate::bitap::WORD_BITS as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_config_roundtrips_through_json() {
        let cfg = PatchConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn unbounded_build_config_has_no_deadline() {
        let cfg = BuildConfig::unbounded();
        assert!(cfg.is_unbounded());
        assert!(!cfg.is_expired());
    }

    #[test]
    fn expired_timeout_reports_expired() {
        let cfg = BuildConfig::with_timeout(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cfg.is_expired());
    }
}
