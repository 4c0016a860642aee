#![allow(clippy::needless_doctest_main)]
#![doc = include_str!("../README.md")]

mod bitap;
mod buffer;
mod config;
mod diff;
mod error;
mod operation;
mod patch;

pub use buffer::ByteSpan;
pub use config::{BitapConfig, BuildConfig, PatchConfig};
pub use diff::{Diff, DiffFragment};
pub use error::Error;
pub use operation::Operation;
pub use patch::{AppliedMask, LongSpan, Patch, PatchFragment};

/// Build a canonical diff from `l` to `r` (see [`diff::build`](diff) for the
/// full algorithm).
pub fn diff(l: &ByteSpan, r: &ByteSpan, config: &BuildConfig) -> Diff {
    diff::build(l, r, config)
}

/// One-shot convenience: diff `l`/`r`, build a patch with default margins,
/// and apply it back to `l` — mainly useful for tests and the round-trip
/// law, since real callers usually want to keep the intermediate `Diff`
/// and `Patch` around (to serialize, invert, or inspect them).
pub fn patch(l: &ByteSpan, r: &ByteSpan) -> Result<ByteSpan, Error> {
    let d = diff::build(l, r, &BuildConfig::default());
    let p = Patch::from_diff_with_source(l, &d, &PatchConfig::default());
    let (out, _mask) = p.apply_default(l)?;
    Ok(out)
}
