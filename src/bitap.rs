//! Bitap fuzzy substring matcher (component C2): Baeza-Yates–Gonnet
//! bit-parallel approximate matching, bounded to patterns of at most
//! [`WORD_BITS`] bytes.
//!
//! This is the primitive [`crate::patch`] leans on to re-anchor patch
//! fragments against a buffer whose surrounding context may have drifted
//! since the patch was built. The bit-parallel row recurrence and scoring
//! function follow the classical diff-match-patch `match_bitap`.

use crate::config::BitapConfig;
use std::collections::HashMap;

/// Hard width of the bitap state word. The patch-apply layer (`split_max`,
/// `apply_padding`) is built around this exact constant; see the design
/// notes on widening.
pub const WORD_BITS: usize = 32;

/// Locate `pattern` in `haystack`, favoring matches near `near_loc` and
/// rejecting anything scoring worse than `config.match_threshold`.
///
/// Returns `None` if no match scores within the threshold, or if
/// `pattern` exceeds [`WORD_BITS`] bytes (callers are expected to chunk
/// longer patterns themselves, as `Patch::apply` does for long deletes).
pub fn execute(haystack: &[u8], pattern: &[u8], near_loc: usize, config: &BitapConfig) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > WORD_BITS {
        return None;
    }

    let loc = near_loc as isize;
    let text_len = haystack.len() as isize;
    let pattern_len = pattern.len() as isize;

    let mut score_threshold = config.match_threshold;
    if let Some(exact) = find_first(haystack, pattern, near_loc) {
        score_threshold = score_threshold.min(bitap_score(0, exact as isize, loc, pattern.len(), config));
    }
    if let Some(exact) = find_last(haystack, pattern, near_loc + pattern.len()) {
        score_threshold = score_threshold.min(bitap_score(0, exact as isize, loc, pattern.len(), config));
    }

    let alphabet = build_alphabet(pattern);
    let match_mask = 1u32 << (pattern.len() - 1);
    let mut best_loc: Option<isize> = None;

    let mut bin_max = pattern_len + text_len;
    let mut last_rd: Vec<u32> = Vec::new();

    for d in 0..pattern.len() {
        let d = d as isize;
        let mut bin_min = 0isize;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if bitap_score(d as usize, loc + bin_mid, loc, pattern.len(), config) <= score_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let mut start = (loc - bin_mid + 1).max(1);
        let finish = (loc + bin_mid).min(text_len) + pattern_len;

        if finish < 0 {
            break;
        }
        let mut rd = vec![0u32; (finish + 2) as usize];
        rd[(finish + 1) as usize] = (1u32 << d) - 1;

        let mut j = finish;
        while j >= start {
            let char_match = if text_len <= j - 1 || j - 1 < 0 {
                0u32
            } else {
                *alphabet.get(&haystack[(j - 1) as usize]).unwrap_or(&0)
            };

            let rj1 = rd[(j + 1) as usize];
            let new_rd = if d == 0 {
                ((rj1 << 1) | 1) & char_match
            } else {
                let last_j1 = last_rd[(j + 1) as usize];
                let last_j = last_rd[j as usize];
                (((rj1 << 1) | 1) & char_match) | (((last_j1 | last_j) << 1) | 1) | last_j1
            };
            rd[j as usize] = new_rd;

            if new_rd & match_mask != 0 {
                let candidate = j - 1;
                let s = bitap_score(d as usize, candidate, loc, pattern.len(), config);
                if s <= score_threshold {
                    score_threshold = s;
                    best_loc = Some(candidate);
                    if candidate > loc {
                        start = (2 * loc - candidate).max(1);
                    } else {
                        break;
                    }
                }
            }
            j -= 1;
        }

        if bitap_score((d + 1) as usize, loc, loc, pattern.len(), config) > score_threshold {
            break;
        }
        last_rd = rd;
    }

    best_loc.map(|l| l.max(0) as usize)
}

fn find_first(haystack: &[u8], pattern: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || pattern.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|p| p + from)
}

fn find_last(haystack: &[u8], pattern: &[u8], upto: usize) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > haystack.len() {
        return None;
    }
    let limit = upto.min(haystack.len() - pattern.len());
    (0..=limit).rev().find(|&p| &haystack[p..p + pattern.len()] == pattern)
}

/// Build the per-byte bitmask alphabet used by the bit-parallel scan: bit
/// `pattern.len() - i - 1` of `alphabet[byte]` is set wherever
/// `pattern[i] == byte`, matching the classical diff-match-patch layout.
fn build_alphabet(pattern: &[u8]) -> HashMap<u8, u32> {
    let mut map = HashMap::with_capacity(pattern.len());
    let n = pattern.len();
    for (i, &b) in pattern.iter().enumerate() {
        let bit = 1u32 << (n - i - 1);
        *map.entry(b).or_insert(0) |= bit;
    }
    map
}

/// Match quality at `loc` having accumulated `errors` edits so far:
/// proportion of errors plus a distance penalty.
fn bitap_score(errors: usize, x: isize, loc: isize, pattern_len: usize, config: &BitapConfig) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = (loc - x).unsigned_abs();
    if config.distance == 0 {
        if proximity == 0 {
            accuracy
        } else {
            1.0
        }
    } else {
        accuracy + (proximity as f64 / config.distance as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BitapConfig {
        BitapConfig::default()
    }

    #[test]
    fn exact_match_at_anchor() {
        let loc = execute(b"the quick brown fox", b"quick", 4, &cfg());
        assert_eq!(loc, Some(4));
    }

    #[test]
    fn exact_match_away_from_anchor_still_found() {
        let loc = execute(b"the quick brown fox", b"fox", 0, &cfg());
        assert_eq!(loc, Some(16));
    }

    #[test]
    fn no_match_returns_none() {
        let loc = execute(b"the quick brown fox", b"zzzzz", 0, &cfg());
        assert_eq!(loc, None);
    }

    #[test]
    fn pattern_over_word_bits_rejected() {
        let pattern = vec![b'a'; WORD_BITS + 1];
        let haystack = vec![b'a'; WORD_BITS + 10];
        assert_eq!(execute(&haystack, &pattern, 0, &cfg()), None);
    }

    #[test]
    fn fuzzy_match_tolerates_single_substitution() {
        // "fox" vs haystack containing "fax" at the same spot.
        let loc = execute(b"the quick brown fax jumped", b"fox", 16, &cfg());
        assert_eq!(loc, Some(16));
    }

    #[test]
    fn strict_threshold_rejects_fuzzy_match() {
        let strict = BitapConfig { distance: 1000, match_threshold: 0.0 };
        let loc = execute(b"the quick brown fax jumped", b"fox", 16, &strict);
        assert_eq!(loc, None);
    }
}
