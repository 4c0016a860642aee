//! The patch engine (component C9): walks a canonical [`Diff`] into
//! context-bearing [`PatchFragment`]s, splits oversize fragments to fit
//! the bitap window, and fuzzy-applies a patch against a buffer whose
//! surrounding context may have drifted.
//!
//! Construction (`build_fragments`/`add_context`) and application
//! (`apply`/`split_max`/`apply_padding`) follow the classic
//! diff-match-patch `patch_make`/`patch_apply` control flow; see
//! SPEC_FULL §4.3 for the line-by-line contract this module implements.

mod fragment;
pub mod text;

pub use fragment::{LongSpan, PatchFragment};

use crate::bitap;
use crate::buffer::ByteSpan;
use crate::config::{BuildConfig, PatchConfig};
use crate::diff::{self, Diff, DiffFragment};
use crate::error::Error;
use crate::operation::Operation;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Bit `i` is set when patch fragment `i` applied cleanly during
/// [`Patch::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppliedMask(Vec<bool>);

impl AppliedMask {
    fn new(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> bool {
        self.0[i]
    }

    pub fn all_set(&self) -> bool {
        self.0.iter().all(|&b| b)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Indices of fragments that did not apply, in ascending order.
    pub fn failed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().filter(|(_, &b)| !b).map(|(i, _)| i)
    }
}

/// An ordered list of [`PatchFragment`]s plus the bitap/margin knobs used
/// to build and apply them (component C9).
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    fragments: Vec<PatchFragment>,
    config: PatchConfig,
}

impl Patch {
    pub fn fragments(&self) -> &[PatchFragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Build a patch from `diff` alone, reconstructing the pre-patch
    /// buffer via [`Diff::extract`]. Prefer [`Patch::from_diff_with_source`]
    /// when the caller already has `L` handy — it avoids recomputing it.
    pub fn from_diff(diff: &Diff, config: &PatchConfig) -> Self {
        let source = diff.extract(Operation::Insert);
        Self::from_diff_with_source(&source, diff, config)
    }

    /// Build a patch from `diff`, using `source` (L, the pre-patch buffer)
    /// directly for context extraction (SPEC_FULL §4.3.1–4.3.2).
    pub fn from_diff_with_source(source: &ByteSpan, diff: &Diff, config: &PatchConfig) -> Self {
        let _span = tracing::debug_span!("patch::from_diff", diff_len = diff.len()).entered();
        let margin = config.patch_margin as usize;
        let fragments = build_fragments(source, diff, margin);
        debug!(fragment_count = fragments.len(), "patch constructed");
        Self { fragments, config: *config }
    }

    /// Produce a patch applicable to R (the post-patch buffer) to yield L:
    /// swap each fragment's spans and flip its edits. `LongSpan` offsets
    /// are absolute within their own buffer, so no cumulative correction
    /// is needed once the spans are swapped — see DESIGN.md for why this
    /// departs from a cumulative-offset approach.
    pub fn reverse(&self) -> Self {
        let fragments = self
            .fragments
            .iter()
            .map(|f| PatchFragment {
                left_span: f.right_span,
                right_span: f.left_span,
                diff_fragments: f.diff_fragments.iter().map(flip).collect(),
            })
            .collect();
        Self { fragments, config: self.config }
    }

    /// Render this patch in the textual format of §4.3.8.
    pub fn to_text(&self) -> String {
        text::to_text(self)
    }

    /// Parse a patch previously produced by [`Patch::to_text`] (or an
    /// interoperable producer of the same format).
    pub fn parse(input: &str, config: &PatchConfig) -> Result<Self, Error> {
        let fragments = text::parse(input)?;
        Ok(Self { fragments, config: *config })
    }

    pub fn parse_default(input: &str) -> Result<Self, Error> {
        Self::parse(input, &PatchConfig::default())
    }

    /// Fuzzy-apply this patch against `buffer`, padding the edges with
    /// `padding_length` synthetic bytes so bitap has context to anchor
    /// against near the document boundaries (SPEC_FULL §4.3.4–§4.3.5).
    pub fn apply(&self, buffer: &ByteSpan, padding_length: usize) -> Result<(ByteSpan, AppliedMask), Error> {
        if self.fragments.is_empty() {
            return Ok((buffer.clone(), AppliedMask::new(0)));
        }

        let word_bits = bitap::WORD_BITS;
        if padding_length >= word_bits {
            return Err(Error::InvalidArgument(format!(
                "padding_length {padding_length} must be less than the bitap word width ({word_bits})"
            )));
        }

        let margin = (self.config.patch_margin as usize).min(word_bits - 1);
        let (null_pad, padded) = apply_padding(&self.fragments, padding_length);
        let mut patched = null_pad.concat(buffer).concat(&null_pad);
        let fragments = split_max(padded, margin, word_bits);

        let mut mask = AppliedMask::new(fragments.len());
        let mut delta: isize = 0;

        for (i, frag) in fragments.iter().enumerate() {
            let expected = frag.right_span.offset as isize + delta;
            let size_delta = frag.right_span.length as isize - frag.left_span.length as isize;

            if expected < 0 || expected as usize > patched.len() {
                trace!(fragment = i, "expected location outside buffer, dropping fragment");
                delta -= size_delta;
                continue;
            }
            let expected = expected as usize;

            let left = frag.left_buffer();
            let hit = if left.len() > word_bits {
                long_delete_match(&patched, &left, expected, word_bits, &self.config)
            } else {
                bitap::execute(patched.as_bytes(), left.as_bytes(), expected, &self.config.bitap)
                    .map(|loc| (loc, -1isize))
            };

            let (start_loc, end_loc) = match hit {
                Some(hit) => hit,
                None => {
                    trace!(fragment = i, "bitap found no match, dropping fragment");
                    delta -= size_delta;
                    continue;
                }
            };

            delta = start_loc as isize - expected as isize;

            let patched_text = if end_loc < 0 {
                let upto = (start_loc + left.len()).min(patched.len());
                patched.slice_at(start_loc, upto)
            } else {
                let upto = (end_loc as usize + word_bits).min(patched.len());
                patched.slice_at(start_loc, upto)
            };

            if patched_text == left {
                let right = frag.right_buffer();
                let head = patched.head(start_loc);
                let tail = patched.cut(start_loc + left.len());
                patched = head.concat(&right).concat(&tail);
                mask.set(i);
            } else if let Some(replaced) =
                apply_imperfect(&patched, frag, &left, &patched_text, start_loc, &self.config)
            {
                patched = replaced;
                mask.set(i);
            } else {
                trace!(fragment = i, "imperfect match rejected by delete-threshold gate");
                delta -= size_delta;
            }
        }

        let stripped = patched.slice_at(null_pad.len(), patched.len() - null_pad.len());
        Ok((stripped, mask))
    }

    /// Apply with the classic default padding amount (one margin's worth).
    pub fn apply_default(&self, buffer: &ByteSpan) -> Result<(ByteSpan, AppliedMask), Error> {
        self.apply(buffer, self.config.patch_margin as usize)
    }
}

impl AppliedMask {
    fn set(&mut self, i: usize) {
        self.0[i] = true;
    }
}

fn flip(frag: &DiffFragment) -> DiffFragment {
    let op = match frag.op {
        Operation::Delete => Operation::Insert,
        Operation::Insert => Operation::Delete,
        Operation::Equal => Operation::Equal,
    };
    DiffFragment::new(op, frag.span.clone())
}

/// §4.3.1: walk the diff, opening a fragment at the first edit and
/// closing it once a sufficiently long EQUAL is seen. Short equals
/// inside an open fragment are kept as context; a long enough equal
/// closes the fragment without itself being added — trailing context is
/// instead drawn straight from `source` by [`add_context`].
fn build_fragments(source: &ByteSpan, diff: &Diff, margin: usize) -> Vec<PatchFragment> {
    let frags = diff.fragments();
    if frags.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut current: Option<PatchFragment> = None;
    let mut bytes_l = 0usize;
    let mut bytes_r = 0usize;
    let last = frags.len() - 1;

    for (i, frag) in frags.iter().enumerate() {
        if current.is_none() && frag.op != Operation::Equal {
            current = Some(PatchFragment::starting_at(bytes_l, bytes_r));
        }

        match frag.op {
            Operation::Insert | Operation::Delete => {
                if let Some(cur) = current.as_mut() {
                    cur.add(frag.clone());
                }
            }
            Operation::Equal => {
                if frag.len() <= 2 * margin && current.is_some() && i != last {
                    current.as_mut().unwrap().add(frag.clone());
                } else if frag.len() >= 2 * margin {
                    if let Some(mut cur) = current.take() {
                        add_context(&mut cur, source, margin);
                        out.push(cur);
                    }
                }
            }
        }

        if frag.op != Operation::Insert {
            bytes_l += frag.len();
        }
        if frag.op != Operation::Delete {
            bytes_r += frag.len();
        }
    }

    if let Some(mut cur) = current.take() {
        add_context(&mut cur, source, margin);
        out.push(cur);
    }

    out
}

/// §4.3.2: grow `frag`'s context until `source[right.offset .. right.offset
/// + left.length]` is a unique substring of `source` (or the bitap-width
/// cap is hit), then add one more margin "for luck".
fn add_context(frag: &mut PatchFragment, source: &ByteSpan, margin: usize) {
    if source.is_empty() {
        return;
    }

    let word_bits = bitap::WORD_BITS;
    let start = frag.right_span.offset;
    let len = frag.left_span.length;
    let mut padding = 0usize;
    let mut pattern = clamped_slice(source, start, start + len);

    while source.count_occurrences(pattern.as_bytes()) > 1
        && pattern.len() < word_bits.saturating_sub(2 * margin)
    {
        padding += margin;
        pattern = clamped_slice(source, start.saturating_sub(padding), start + len + padding);
    }
    padding += margin;

    let prefix = clamped_slice(source, start.saturating_sub(padding), start);
    let suffix = clamped_slice(source, start + len, start + len + padding);
    frag.prepend_context(prefix);
    frag.append_context(suffix);
}

fn clamped_slice(source: &ByteSpan, start: usize, end: usize) -> ByteSpan {
    let start = start.min(source.len());
    let end = end.clamp(start, source.len());
    source.slice_at(start, end)
}

/// §4.3.3: chop any fragment whose `left_span` exceeds `word_bits` into a
/// run of smaller fragments, each carrying `margin` bytes of context
/// handed down from its predecessor.
fn split_max(fragments: Vec<PatchFragment>, margin: usize, word_bits: usize) -> Vec<PatchFragment> {
    let budget = word_bits.saturating_sub(margin);
    let mut out = Vec::with_capacity(fragments.len());

    for big in fragments {
        if big.left_span.length <= word_bits {
            out.push(big);
            continue;
        }

        let mut start_l = big.left_span.offset;
        let mut start_r = big.right_span.offset;
        let mut precontext = ByteSpan::empty();
        let mut remaining: VecDeque<DiffFragment> = big.diff_fragments.into_iter().collect();

        while !remaining.is_empty() {
            let mut small = PatchFragment::starting_at(
                start_l.saturating_sub(precontext.len()),
                start_r.saturating_sub(precontext.len()),
            );
            let mut empty = true;

            if !precontext.is_empty() {
                small.left_span.length = precontext.len();
                small.right_span.length = precontext.len();
                small.diff_fragments.push(DiffFragment::equal(precontext.clone()));
            }

            while !remaining.is_empty() && small.left_span.length < budget {
                let op = remaining[0].op;
                if op == Operation::Insert {
                    let d = remaining.pop_front().unwrap();
                    start_r += d.len();
                    small.right_span.length += d.len();
                    small.diff_fragments.push(d);
                    empty = false;
                } else if op == Operation::Delete
                    && small.diff_fragments.len() == 1
                    && small.diff_fragments[0].op == Operation::Equal
                    && remaining[0].len() > 2 * word_bits
                {
                    let d = remaining.pop_front().unwrap();
                    start_l += d.len();
                    small.left_span.length += d.len();
                    small.diff_fragments.push(d);
                    empty = false;
                } else {
                    let take = (budget.saturating_sub(small.left_span.length)).min(remaining[0].len());
                    let head = remaining[0].span.head(take);
                    start_l += take;
                    small.left_span.length += take;
                    if op == Operation::Equal {
                        start_r += take;
                        small.right_span.length += take;
                    } else {
                        empty = false;
                    }
                    small.diff_fragments.push(DiffFragment::new(op, head));
                    if take == remaining[0].len() {
                        remaining.pop_front();
                    } else {
                        let rest = remaining[0].span.cut(take);
                        remaining[0] = DiffFragment::new(op, rest);
                    }
                }
            }

            precontext = small.right_buffer();
            precontext = precontext.tail(margin);

            let postcontext = left_text(&remaining).head(margin);
            if !postcontext.is_empty() {
                small.left_span.length += postcontext.len();
                small.right_span.length += postcontext.len();
                match small.diff_fragments.last_mut() {
                    Some(last) if last.op == Operation::Equal => {
                        last.span = last.span.concat(&postcontext);
                    }
                    _ => small.diff_fragments.push(DiffFragment::equal(postcontext)),
                }
            }

            if !empty {
                out.push(small);
            }
        }
    }

    out
}

fn left_text(frags: &VecDeque<DiffFragment>) -> ByteSpan {
    let mut out = ByteSpan::empty();
    for f in frags {
        if f.op != Operation::Insert {
            out = out.concat(&f.span);
        }
    }
    out
}

/// §4.3.4: shift every fragment forward by `padding_length` and extend
/// the first/last fragment's boundary EQUAL so bitap always has a full
/// padding window of context to anchor against near the document edges.
fn apply_padding(fragments: &[PatchFragment], padding_length: usize) -> (ByteSpan, Vec<PatchFragment>) {
    let null_pad = ByteSpan::from((1..=padding_length as u8).collect::<Vec<u8>>());

    let mut out: Vec<PatchFragment> = fragments
        .iter()
        .map(|f| PatchFragment {
            left_span: LongSpan::new(f.left_span.offset + padding_length, f.left_span.length),
            right_span: LongSpan::new(f.right_span.offset + padding_length, f.right_span.length),
            diff_fragments: f.diff_fragments.clone(),
        })
        .collect();

    if let Some(first) = out.first_mut() {
        match first.diff_fragments.first() {
            Some(d) if d.op == Operation::Equal => {
                if padding_length > d.len() {
                    let extra = padding_length - d.len();
                    let grown = null_pad.tail(extra).concat(&d.span);
                    first.diff_fragments[0] = DiffFragment::equal(grown);
                    first.left_span.offset -= extra;
                    first.right_span.offset -= extra;
                    first.left_span.length += extra;
                    first.right_span.length += extra;
                }
            }
            _ => {
                first.diff_fragments.insert(0, DiffFragment::equal(null_pad.clone()));
                first.left_span.offset -= padding_length;
                first.right_span.offset -= padding_length;
                first.left_span.length += padding_length;
                first.right_span.length += padding_length;
            }
        }
    }

    if let Some(last) = out.last_mut() {
        match last.diff_fragments.last() {
            Some(d) if d.op == Operation::Equal => {
                if padding_length > d.len() {
                    let extra = padding_length - d.len();
                    let grown = d.span.concat(&null_pad.head(extra));
                    let idx = last.diff_fragments.len() - 1;
                    last.diff_fragments[idx] = DiffFragment::equal(grown);
                    last.left_span.length += extra;
                    last.right_span.length += extra;
                }
            }
            _ => {
                last.diff_fragments.push(DiffFragment::equal(null_pad.clone()));
                last.left_span.length += padding_length;
                last.right_span.length += padding_length;
            }
        }
    }

    (null_pad, out)
}

fn long_delete_match(
    haystack: &ByteSpan,
    pattern: &ByteSpan,
    expected: usize,
    word_bits: usize,
    config: &PatchConfig,
) -> Option<(usize, isize)> {
    let head = pattern.head(word_bits);
    let tail = pattern.tail(word_bits);
    let start = bitap::execute(haystack.as_bytes(), head.as_bytes(), expected, &config.bitap)?;
    let tail_near = expected + pattern.len() - word_bits;
    let end = bitap::execute(haystack.as_bytes(), tail.as_bytes(), tail_near, &config.bitap)?;
    if start >= end {
        return None;
    }
    Some((start, end as isize))
}

/// §4.3.6: bitap located the region but its bytes disagree with `left`.
/// Re-align via an internal diff between `left` and the matched region,
/// then replay this fragment's own edits at the positions that diff maps
/// them to.
fn apply_imperfect(
    patched: &ByteSpan,
    frag: &PatchFragment,
    left: &ByteSpan,
    patched_text: &ByteSpan,
    start_loc: usize,
    config: &PatchConfig,
) -> Option<ByteSpan> {
    let word_bits = bitap::WORD_BITS;
    let build_cfg = if left.len().min(patched_text.len()) < 1_000_000 {
        BuildConfig::unbounded()
    } else {
        BuildConfig::default()
    };
    let realign = diff::build(left, patched_text, &build_cfg);

    if left.len() > word_bits && realign.levenshtein() as f64 / left.len() as f64 > config.delete_threshold {
        return None;
    }

    let mut result = patched.clone();
    let mut idx1 = 0usize;

    for d in &frag.diff_fragments {
        match d.op {
            Operation::Equal => idx1 += d.len(),
            Operation::Insert => {
                let pos = start_loc + realign.map_index(idx1);
                let head = result.head(pos);
                let tail = result.cut(pos);
                result = head.concat(&d.span).concat(&tail);
                idx1 += d.len();
            }
            Operation::Delete => {
                let from = start_loc + realign.map_index(idx1);
                let to = start_loc + realign.map_index(idx1 + d.len());
                let head = result.head(from);
                let tail = result.cut(to);
                result = head.concat(&tail);
            }
        }
    }

    Some(result)
}
