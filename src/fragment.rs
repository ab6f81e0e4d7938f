//! Fragment: the engine's unit of output
//!
//! A fragment is a classified slice of the run's input. For one run the
//! fragments are non-decreasing in start offset, contiguous and
//! non-overlapping, and concatenating their text in emission order
//! reconstructs the input exactly.

use crate::kind::TokenKind;
use serde::Serialize;

/// One classified slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fragment<'a> {
    /// Byte offset of `text` in the run's input.
    pub start: usize,
    /// Classification of this slice.
    pub kind: TokenKind,
    /// The slice itself, borrowed from the input.
    pub text: &'a str,
}

impl<'a> Fragment<'a> {
    pub fn new(start: usize, kind: TokenKind, text: &'a str) -> Self {
        Self { start, kind, text }
    }

    /// Byte offset one past the end of this fragment.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Length of the fragment in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
