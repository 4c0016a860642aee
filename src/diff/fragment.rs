//! `DiffFragment`: an `(Operation, ByteSpan)` pair (component C4).

use crate::buffer::ByteSpan;
use crate::operation::Operation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffFragment {
    pub op: Operation,
    pub span: ByteSpan,
}

impl DiffFragment {
    pub fn new(op: Operation, span: ByteSpan) -> Self {
        Self { op, span }
    }

    pub fn equal(span: ByteSpan) -> Self {
        Self::new(Operation::Equal, span)
    }

    pub fn insert(span: ByteSpan) -> Self {
        Self::new(Operation::Insert, span)
    }

    pub fn delete(span: ByteSpan) -> Self {
        Self::new(Operation::Delete, span)
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_op_and_bytes() {
        let a = DiffFragment::equal(ByteSpan::from("abc"));
        let b = DiffFragment::equal(ByteSpan::from("abc"));
        let c = DiffFragment::insert(ByteSpan::from("abc"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
