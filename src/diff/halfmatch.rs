//! Half-match heuristic (component C6): find a substring common to both
//! inputs that is at least half the length of the longer one, so the
//! caller can divide-and-conquer before falling back to `bisect`.

use crate::buffer::ByteSpan;

#[derive(Debug, Clone)]
pub struct HalfMatch {
    pub text1_a: ByteSpan,
    pub text1_b: ByteSpan,
    pub text2_a: ByteSpan,
    pub text2_b: ByteSpan,
    pub common_mid: ByteSpan,
}

/// Try to find a half-match between `text1` and `text2`. Callers are
/// responsible for skipping this heuristic when an unbounded deadline was
/// requested (SPEC_FULL §4.1.1 step 3) — this function always attempts it.
pub fn find(text1: &ByteSpan, text2: &ByteSpan) -> Option<HalfMatch> {
    let (longer, shorter, text1_is_longer) = if text1.len() > text2.len() {
        (text1, text2, true)
    } else {
        (text2, text1, false)
    };

    if longer.len() < 4 || shorter.len() * 2 < longer.len() {
        return None;
    }

    let hm1 = half_match_at(longer, shorter, (longer.len() + 3) / 4);
    let hm2 = half_match_at(longer, shorter, (longer.len() + 1) / 2);

    let best = match (hm1, hm2) {
        (None, None) => return None,
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (Some(a), Some(b)) => {
            if a.common_mid.len() >= b.common_mid.len() {
                a
            } else {
                b
            }
        }
    };

    // `best` is oriented as (longer_a, longer_b, shorter_a, shorter_b).
    // Re-orient so text1_*/text2_* refer to the original caller arguments.
    if text1_is_longer {
        Some(HalfMatch {
            text1_a: best.longer_a,
            text1_b: best.longer_b,
            text2_a: best.shorter_a,
            text2_b: best.shorter_b,
            common_mid: best.common_mid,
        })
    } else {
        Some(HalfMatch {
            text1_a: best.shorter_a,
            text1_b: best.shorter_b,
            text2_a: best.longer_a,
            text2_b: best.longer_b,
            common_mid: best.common_mid,
        })
    }
}

struct RawHalfMatch {
    longer_a: ByteSpan,
    longer_b: ByteSpan,
    shorter_a: ByteSpan,
    shorter_b: ByteSpan,
    common_mid: ByteSpan,
}

/// Seed the search at `longer[i .. i + longer.len()/4]`, scan `shorter`
/// for every occurrence, and keep the occurrence whose common-affix
/// extension against `longer` is longest.
fn half_match_at(longer: &ByteSpan, shorter: &ByteSpan, i: usize) -> Option<RawHalfMatch> {
    let seed = longer.slice_at(i, i + longer.len() / 4);
    if seed.is_empty() {
        return None;
    }

    let mut best_common_len = 0usize;
    let mut best: Option<RawHalfMatch> = None;

    let mut from = 0usize;
    while let Some(j) = shorter.position_of(seed.as_bytes(), from) {
        let prefix_len = longer.cut(i).common_prefix_len(&shorter.cut(j));
        let suffix_len = longer.head(i).common_suffix_len(&shorter.head(j));

        if prefix_len + suffix_len > best_common_len {
            best_common_len = prefix_len + suffix_len;
            let common_mid = shorter
                .slice_at(j - suffix_len, j)
                .concat(&shorter.slice_at(j, j + prefix_len));
            best = Some(RawHalfMatch {
                longer_a: longer.head(i - suffix_len),
                longer_b: longer.cut(i + prefix_len),
                shorter_a: shorter.head(j - suffix_len),
                shorter_b: shorter.cut(j + prefix_len),
                common_mid,
            });
        }

        from = j + 1;
    }

    if best_common_len * 2 >= longer.len() {
        best
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_expected_half_match() {
        let hm = find(&ByteSpan::from("1234567890"), &ByteSpan::from("a345678z")).unwrap();
        assert_eq!(hm.text1_a.as_bytes(), b"12");
        assert_eq!(hm.text1_b.as_bytes(), b"90");
        assert_eq!(hm.text2_a.as_bytes(), b"a");
        assert_eq!(hm.text2_b.as_bytes(), b"z");
        assert_eq!(hm.common_mid.as_bytes(), b"345678");
    }

    #[test]
    fn rejects_when_no_sufficient_overlap() {
        assert!(find(&ByteSpan::from("1234567890"), &ByteSpan::from("abcdef")).is_none());
    }

    #[test]
    fn rejects_short_inputs() {
        assert!(find(&ByteSpan::from("abc"), &ByteSpan::from("ab")).is_none());
    }
}
