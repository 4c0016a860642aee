//! `Operation`: the three-way edit tag (component C3).

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Equal,
    Insert,
    Delete,
}

impl Operation {
    /// The single-character glyph used in the textual patch format.
    pub fn glyph(self) -> char {
        match self {
            Operation::Equal => ' ',
            Operation::Insert => '+',
            Operation::Delete => '-',
        }
    }

    /// Inverse of [`Operation::glyph`]. A non-glyph byte is a parse failure.
    pub fn from_glyph(glyph: char) -> Result<Self, Error> {
        match glyph {
            ' ' => Ok(Operation::Equal),
            '+' => Ok(Operation::Insert),
            '-' => Ok(Operation::Delete),
            other => Err(Error::MalformedPatch(format!(
                "unknown diff operation glyph: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_roundtrip_is_bijective() {
        for op in [Operation::Equal, Operation::Insert, Operation::Delete] {
            assert_eq!(Operation::from_glyph(op.glyph()).unwrap(), op);
        }
    }

    #[test]
    fn unknown_glyph_is_malformed() {
        assert!(Operation::from_glyph('?').is_err());
    }
}
