//! The diff engine (component C5): trims common affixes, recognizes cheap
//! shortcuts, falls back to the half-match heuristic and then to
//! [`bisect`], and always finishes with [`cleanup::run`].

mod bisect;
mod cleanup;
mod fragment;
mod halfmatch;

pub use fragment::DiffFragment;

use crate::buffer::ByteSpan;
use crate::config::BuildConfig;
use crate::operation::Operation;
use tracing::{debug, trace};

/// An ordered, canonicalized edit script from `L` (left/old) to `R`
/// (right/new).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diff {
    fragments: Vec<DiffFragment>,
}

impl Diff {
    pub fn fragments(&self) -> &[DiffFragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Concatenate the slices of every fragment whose operation is not
    /// `ignore_op`. `extract(Insert)` reconstructs L; `extract(Delete)`
    /// reconstructs R.
    pub fn extract(&self, ignore_op: Operation) -> ByteSpan {
        let mut out = ByteSpan::empty();
        for frag in &self.fragments {
            if frag.op != ignore_op {
                out = out.concat(&frag.span);
            }
        }
        out
    }

    /// `max(inserted, deleted)` summed over each maximal edit run — an
    /// upper bound on the classical edit distance.
    pub fn levenshtein(&self) -> usize {
        let mut total = 0usize;
        let mut inserted = 0usize;
        let mut deleted = 0usize;
        for frag in &self.fragments {
            match frag.op {
                Operation::Insert => inserted += frag.len(),
                Operation::Delete => deleted += frag.len(),
                Operation::Equal => {
                    total += inserted.max(deleted);
                    inserted = 0;
                    deleted = 0;
                }
            }
        }
        total + inserted.max(deleted)
    }

    /// Translate a byte position in L into the corresponding position in
    /// R, accounting for deletions (clamped to the post-delete position).
    pub fn map_index(&self, loc: usize) -> usize {
        let mut chars_l = 0usize;
        let mut chars_r = 0usize;
        let mut last_chars_l = 0usize;
        let mut last_chars_r = 0usize;
        let mut breaking_op: Option<Operation> = None;

        for frag in &self.fragments {
            if frag.op != Operation::Insert {
                chars_l += frag.len();
            }
            if frag.op != Operation::Delete {
                chars_r += frag.len();
            }
            if chars_l > loc {
                breaking_op = Some(frag.op);
                break;
            }
            last_chars_l = chars_l;
            last_chars_r = chars_r;
        }

        if breaking_op == Some(Operation::Delete) {
            return last_chars_r;
        }
        last_chars_r + (loc - last_chars_l)
    }
}

/// Build a canonical diff from `l` to `r`, honoring `config`'s deadline.
pub fn build(l: &ByteSpan, r: &ByteSpan, config: &BuildConfig) -> Diff {
    let _span = tracing::debug_span!("diff::build", l_len = l.len(), r_len = r.len()).entered();
    debug!("starting diff build");
    let fragments = build_fragments(l, r, config);
    let fragments = cleanup::run(fragments);
    Diff { fragments }
}

/// Recursive worker: trims affixes, tries shortcuts, and otherwise
/// recurses through half-match/bisect. Does NOT run cleanup itself —
/// that only happens once, at the top of [`build`], after the whole
/// recursive tree has been assembled. `bisect::run` still threads this
/// function back in as its recursion callback so each half gets its own
/// affix trim and shortcut checks.
fn build_fragments(l: &ByteSpan, r: &ByteSpan, config: &BuildConfig) -> Vec<DiffFragment> {
    if l == r {
        return if l.is_empty() { vec![] } else { vec![DiffFragment::equal(l.clone())] };
    }

    let prefix_len = l.common_prefix_len(r);
    let prefix = l.head(prefix_len);
    let mut mid_l = l.cut(prefix_len);
    let mut mid_r = r.cut(prefix_len);

    let suffix_len = mid_l.common_suffix_len(&mid_r);
    let suffix = mid_l.tail(suffix_len);
    mid_l = mid_l.trunc(mid_l.len() - suffix_len);
    mid_r = mid_r.trunc(mid_r.len() - suffix_len);

    let mut result = Vec::new();
    if !prefix.is_empty() {
        result.push(DiffFragment::equal(prefix));
    }
    result.extend(compute_middle(&mid_l, &mid_r, config));
    if !suffix.is_empty() {
        result.push(DiffFragment::equal(suffix));
    }
    result
}

/// Compute the edit script for two non-empty middles with no shared
/// affix (§4.1.1): substring shortcut, single-byte shortcut, half-match,
/// then bisect.
fn compute_middle(a: &ByteSpan, b: &ByteSpan, config: &BuildConfig) -> Vec<DiffFragment> {
    if a.is_empty() {
        return if b.is_empty() { vec![] } else { vec![DiffFragment::insert(b.clone())] };
    }
    if b.is_empty() {
        return vec![DiffFragment::delete(a.clone())];
    }

    let (longer, shorter, a_is_longer) =
        if a.len() > b.len() { (a, b, true) } else { (b, a, false) };

    if let Some(pos) = longer.position_of(shorter.as_bytes(), 0) {
        let pre = longer.head(pos);
        let post = longer.cut(pos + shorter.len());
        let mut out = Vec::with_capacity(3);
        if !pre.is_empty() {
            out.push(edge_fragment(a_is_longer, pre));
        }
        out.push(DiffFragment::equal(shorter.clone()));
        if !post.is_empty() {
            out.push(edge_fragment(a_is_longer, post));
        }
        return out;
    }

    if shorter.len() == 1 {
        return vec![DiffFragment::delete(a.clone()), DiffFragment::insert(b.clone())];
    }

    if !config.is_unbounded() {
        if let Some(hm) = halfmatch::find(a, b) {
            trace!(common_mid_len = hm.common_mid.len(), "half-match accepted");
            let mut head = build_fragments(&hm.text1_a, &hm.text2_a, config);
            head.push(DiffFragment::equal(hm.common_mid));
            let mut tail = build_fragments(&hm.text1_b, &hm.text2_b, config);
            head.append(&mut tail);
            return head;
        }
        trace!("half-match rejected");
    }

    bisect::run(a, b, config, |x, y| build_fragments(x, y, config))
}

/// In the substring shortcut, the longer buffer's surrounding bytes are a
/// DELETE if `a` was the longer input, an INSERT if `b` was.
fn edge_fragment(a_is_longer: bool, span: ByteSpan) -> DiffFragment {
    if a_is_longer {
        DiffFragment::delete(span)
    } else {
        DiffFragment::insert(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(s: &str) -> ByteSpan {
        ByteSpan::from(s)
    }

    #[test]
    fn trivial_identical_inputs() {
        let d = build(&s("abc"), &s("abc"), &BuildConfig::unbounded());
        assert_eq!(d.fragments(), &[DiffFragment::equal(s("abc"))]);
    }

    #[test]
    fn trivial_empty_inputs() {
        let d = build(&s(""), &s(""), &BuildConfig::unbounded());
        assert!(d.is_empty());
    }

    #[test]
    fn s1_bisect_cat_map() {
        let d = build(&s("cat"), &s("map"), &BuildConfig::unbounded());
        assert_eq!(
            d.fragments(),
            &[
                DiffFragment::delete(s("c")),
                DiffFragment::insert(s("m")),
                DiffFragment::equal(s("a")),
                DiffFragment::delete(s("t")),
                DiffFragment::insert(s("p")),
            ]
        );
    }

    #[test]
    fn s1_bisect_cat_map_expired_deadline() {
        let expired = BuildConfig::with_timeout(std::time::Duration::from_millis(0));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let d = build(&s("cat"), &s("map"), &expired);
        assert_eq!(d.fragments(), &[DiffFragment::delete(s("cat")), DiffFragment::insert(s("map"))]);
    }

    #[test]
    fn s3_substring_shortcut() {
        let d = build(&s("abc"), &s("ab123c"), &BuildConfig::unbounded());
        assert_eq!(
            d.fragments(),
            &[DiffFragment::equal(s("ab")), DiffFragment::insert(s("123")), DiffFragment::equal(s("c"))]
        );
    }

    #[test]
    fn s2_apples_bananas() {
        let d = build(&s("Apples are a fruit."), &s("Bananas are also fruit."), &BuildConfig::default());
        assert_eq!(
            d.fragments(),
            &[
                DiffFragment::delete(s("Apple")),
                DiffFragment::insert(s("Banana")),
                DiffFragment::equal(s("s are a")),
                DiffFragment::insert(s("lso")),
                DiffFragment::equal(s(" fruit.")),
            ]
        );
    }

    #[test]
    fn reconstructive_law_holds() {
        let l = s("the quick brown fox");
        let r = s("the slow brown dog");
        let d = build(&l, &r, &BuildConfig::default());
        assert_eq!(d.extract(Operation::Insert), l);
        assert_eq!(d.extract(Operation::Delete), r);
    }

    #[test]
    fn levenshtein_matches_s1() {
        let d = build(&s("cat"), &s("map"), &BuildConfig::unbounded());
        assert_eq!(d.levenshtein(), 2); // two single-byte substitutions, one edit each
    }
}
