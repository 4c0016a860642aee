//! `LongSpan` and `PatchFragment` (component C8): the footprint a patch
//! fragment occupies in L and in R, plus the diff fragments (edits and
//! surrounding context) that make it up.

use crate::diff::DiffFragment;
use crate::buffer::ByteSpan;
use crate::operation::Operation;

/// A half-open byte range `[offset, offset + length)` within some buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LongSpan {
    pub offset: usize,
    pub length: usize,
}

impl LongSpan {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Extend this span backward by `n` bytes (prepending context).
    pub fn grow_head(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
        self.length += n;
    }

    /// Extend this span forward by `n` bytes (appending context).
    pub fn grow_tail(&mut self, n: usize) {
        self.length += n;
    }
}

/// One context-bearing patch unit: the diff fragments it carries, and the
/// byte ranges of L and R it covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchFragment {
    pub left_span: LongSpan,
    pub right_span: LongSpan,
    pub diff_fragments: Vec<DiffFragment>,
}

impl PatchFragment {
    pub fn starting_at(left_offset: usize, right_offset: usize) -> Self {
        Self {
            left_span: LongSpan::new(left_offset, 0),
            right_span: LongSpan::new(right_offset, 0),
            diff_fragments: Vec::new(),
        }
    }

    /// Append a diff fragment, growing `left_span`/`right_span` by its
    /// length according to which side(s) it contributes to.
    pub fn add(&mut self, frag: DiffFragment) {
        if frag.op != Operation::Insert {
            self.left_span.length += frag.len();
        }
        if frag.op != Operation::Delete {
            self.right_span.length += frag.len();
        }
        self.diff_fragments.push(frag);
    }

    /// Concatenation of every non-INSERT diff fragment: this fragment's
    /// expected slice of the pre-patch (left) buffer.
    pub fn left_buffer(&self) -> ByteSpan {
        let mut out = ByteSpan::empty();
        for frag in &self.diff_fragments {
            if frag.op != Operation::Insert {
                out = out.concat(&frag.span);
            }
        }
        out
    }

    /// Concatenation of every non-DELETE diff fragment: this fragment's
    /// contribution to the post-patch (right) buffer.
    pub fn right_buffer(&self) -> ByteSpan {
        let mut out = ByteSpan::empty();
        for frag in &self.diff_fragments {
            if frag.op != Operation::Delete {
                out = out.concat(&frag.span);
            }
        }
        out
    }

    /// True when this fragment carries no INSERT or DELETE — pure
    /// bookkeeping context produced by `split_max`'s decomposition, which
    /// `split_max` step 5 drops rather than emitting.
    pub fn is_empty(&self) -> bool {
        !self.diff_fragments.iter().any(|f| f.op != Operation::Equal)
    }

    /// Prepend an EQUAL context fragment, growing both spans at the head.
    pub fn prepend_context(&mut self, span: ByteSpan) {
        if span.is_empty() {
            return;
        }
        self.left_span.grow_head(span.len());
        self.right_span.grow_head(span.len());
        self.diff_fragments.insert(0, DiffFragment::equal(span));
    }

    /// Append an EQUAL context fragment, growing both spans at the tail.
    pub fn append_context(&mut self, span: ByteSpan) {
        if span.is_empty() {
            return;
        }
        self.left_span.grow_tail(span.len());
        self.right_span.grow_tail(span.len());
        self.diff_fragments.push(DiffFragment::equal(span));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_grows_spans_by_op() {
        let mut f = PatchFragment::starting_at(10, 10);
        f.add(DiffFragment::equal(ByteSpan::from("ab")));
        f.add(DiffFragment::delete(ByteSpan::from("xyz")));
        f.add(DiffFragment::insert(ByteSpan::from("q")));
        assert_eq!(f.left_span, LongSpan::new(10, 5)); // "ab" + "xyz"
        assert_eq!(f.right_span, LongSpan::new(10, 3)); // "ab" + "q"
        assert_eq!(f.left_buffer().as_bytes(), b"abxyz");
        assert_eq!(f.right_buffer().as_bytes(), b"abq");
    }

    #[test]
    fn is_empty_true_for_pure_context() {
        let mut f = PatchFragment::starting_at(0, 0);
        f.add(DiffFragment::equal(ByteSpan::from("ctx")));
        assert!(f.is_empty());
        f.add(DiffFragment::insert(ByteSpan::from("x")));
        assert!(!f.is_empty());
    }

    #[test]
    fn prepend_and_append_context_grow_both_spans() {
        let mut f = PatchFragment::starting_at(10, 10);
        f.add(DiffFragment::delete(ByteSpan::from("x")));
        f.prepend_context(ByteSpan::from("pre"));
        f.append_context(ByteSpan::from("post"));
        assert_eq!(f.left_span, LongSpan::new(7, 8)); // 3 + 1 + 4
        assert_eq!(f.right_span, LongSpan::new(7, 7)); // 3 + 0 + 4
    }
}
