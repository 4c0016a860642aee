//! Textual patch format (§4.3.8): one `@@ -Lstart[,Llen] +Rstart[,Rlen] @@`
//! header per fragment, followed by one glyph-prefixed, percent-encoded
//! line per diff fragment it carries.
//!
//! The escaping scheme mirrors the classical diff-match-patch
//! `patch_toText`/`patch_fromText`: encode with the unreserved set
//! JavaScript's `encodeURI` leaves alone, then unescape `%20` back to a
//! literal space for readability. Unlike the original, `+` is always
//! escaped to `%2B` — left bare it collides with the insert-line glyph
//! once a line wraps, so the parser would not be able to tell an escaped
//! literal `+` from the next line's prefix.

use super::fragment::{LongSpan, PatchFragment};
use crate::buffer::ByteSpan;
use crate::diff::DiffFragment;
use crate::error::Error;
use crate::operation::Operation;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left unescaped in a patch body line: ASCII alphanumerics plus the
/// punctuation `encodeURI` treats as unreserved, minus `+` (see module
/// docs).
const PATCH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'$')
    .remove(b',')
    .remove(b'#');

fn encode_line(span: &ByteSpan) -> String {
    let lossy = String::from_utf8_lossy(span.as_bytes());
    let encoded = utf8_percent_encode(&lossy, PATCH_ESCAPE).to_string();
    encoded.replace("%20", " ")
}

fn decode_line(line: &str) -> Result<ByteSpan, Error> {
    let restored = line.replace(' ', "%20");
    let decoded = percent_decode_str(&restored)
        .decode_utf8()
        .map_err(|e| Error::MalformedPatch(format!("patch line is not valid percent-encoded UTF-8: {e}")))?;
    Ok(ByteSpan::from(decoded.as_bytes()))
}

pub fn to_text(patch: &super::Patch) -> String {
    let mut out = String::new();
    for frag in patch.fragments() {
        out.push_str(&header(&frag.left_span, &frag.right_span));
        out.push('\n');
        for d in &frag.diff_fragments {
            out.push(d.op.glyph());
            out.push_str(&encode_line(&d.span));
            out.push('\n');
        }
    }
    out
}

fn header(left: &LongSpan, right: &LongSpan) -> String {
    format!(
        "@@ -{} +{} @@",
        coord(left.offset, left.length),
        coord(right.offset, right.length)
    )
}

/// `diff_match_patch` reports a single-byte span as a bare start (no
/// `,length`); anything else carries an explicit length, including the
/// zero-length case (an insertion/deletion point with no prior context).
fn coord(offset: usize, length: usize) -> String {
    match length {
        0 => format!("{offset},0"),
        1 => format!("{}", offset + 1),
        n => format!("{},{}", offset + 1, n),
    }
}

pub fn parse(input: &str) -> Result<Vec<PatchFragment>, Error> {
    let mut fragments = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        let (left, right) = parse_header(line)?;
        let mut frag = PatchFragment {
            left_span: left,
            right_span: right,
            diff_fragments: Vec::new(),
        };

        while let Some(next) = lines.peek() {
            if next.starts_with("@@ ") {
                break;
            }
            let line = lines.next().unwrap();
            if line.is_empty() {
                continue;
            }
            let mut chars = line.chars();
            let glyph = chars.next().unwrap();
            let op = Operation::from_glyph(glyph)?;
            let payload = decode_line(chars.as_str())?;
            frag.diff_fragments.push(DiffFragment::new(op, payload));
        }

        fragments.push(frag);
    }

    Ok(fragments)
}

fn parse_header(line: &str) -> Result<(LongSpan, LongSpan), Error> {
    let body = line
        .strip_prefix("@@ -")
        .and_then(|s| s.strip_suffix(" @@"))
        .ok_or_else(|| Error::MalformedPatch(format!("bad patch header: {line:?}")))?;

    let (left_raw, right_raw) = body
        .split_once(" +")
        .ok_or_else(|| Error::MalformedPatch(format!("bad patch header: {line:?}")))?;

    Ok((parse_coord(left_raw)?, parse_coord(right_raw)?))
}

fn parse_coord(raw: &str) -> Result<LongSpan, Error> {
    let (start_raw, len_raw) = match raw.split_once(',') {
        Some((a, b)) => (a, Some(b)),
        None => (raw, None),
    };
    let start: usize = start_raw
        .parse()
        .map_err(|_| Error::MalformedPatch(format!("bad coordinate: {raw:?}")))?;
    let length = match len_raw {
        Some(s) => s.parse().map_err(|_| Error::MalformedPatch(format!("bad coordinate: {raw:?}")))?,
        None => 1,
    };
    let offset = if length == 0 {
        start
    } else {
        start.checked_sub(1).ok_or_else(|| {
            Error::MalformedPatch(format!("patch coordinate must be 1-based, got {start}"))
        })?
    };
    Ok(LongSpan::new(offset, length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatchConfig;
    use crate::diff::build as build_diff;
    use crate::config::BuildConfig;

    fn s(s: &str) -> ByteSpan {
        ByteSpan::from(s)
    }

    #[test]
    fn s4_exact_serialized_form() {
        let l = s("Now is the time for all good men to come to the aid of their country");
        let r = s("Now is the time for all good women to come to the aid of their country");
        let d = build_diff(&l, &r, &BuildConfig::default());
        let p = super::super::Patch::from_diff_with_source(&l, &d, &PatchConfig::default());
        assert_eq!(p.to_text(), "@@ -22,16 +22,18 @@\n ll good \n+wo\n men to c\n");
    }

    #[test]
    fn header_coord_bare_for_single_byte() {
        assert_eq!(coord(0, 1), "1");
        assert_eq!(coord(9, 1), "10");
    }

    #[test]
    fn header_coord_explicit_for_zero_and_multi_byte() {
        assert_eq!(coord(0, 0), "0,0");
        assert_eq!(coord(21, 16), "22,16");
    }

    #[test]
    fn plus_is_always_escaped() {
        let line = encode_line(&s("a+b"));
        assert_eq!(line, "a%2Bb");
    }

    #[test]
    fn space_survives_as_literal() {
        let line = encode_line(&s("hello world"));
        assert_eq!(line, "hello world");
    }

    #[test]
    fn control_bytes_are_escaped() {
        let line = encode_line(&s("a\nb"));
        assert_eq!(line, "a%0Ab");
    }

    #[test]
    fn parse_rejects_missing_header() {
        assert!(parse(" just a body line\n").is_err());
    }

    #[test]
    fn parse_rejects_zero_start_coordinate() {
        assert!(parse_header("@@ -0 +1 @@").is_err());
    }

    #[test]
    fn zero_length_coordinate_round_trips_through_parse() {
        // The diff-match-patch "insert into an empty buffer" sentinel:
        // offset stays unchanged (not 1-based) when length is 0.
        let (left, right) = parse_header("@@ -0,0 +1,4 @@").unwrap();
        assert_eq!(left, LongSpan::new(0, 0));
        assert_eq!(right, LongSpan::new(0, 4));
        assert_eq!(header(&left, &right), "@@ -0,0 +1,4 @@");
    }

    #[test]
    fn round_trip_through_text_preserves_fragments() {
        let l = s("the quick brown fox jumps over the lazy dog");
        let r = s("the quick red fox leaps over a sleepy dog");
        let d = build_diff(&l, &r, &BuildConfig::default());
        let p = super::super::Patch::from_diff_with_source(&l, &d, &PatchConfig::default());
        let text = p.to_text();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, p.fragments().to_vec());
    }
}
