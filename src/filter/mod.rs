//! Filter expressions for dirsearch
//!
//! The tree mirrors the search filter grammar: logical AND, OR, and NOT
//! over equality, presence, substring, ordering, and approximate leaves.
//! Parsing filter strings is the caller's concern.

mod ast;

pub use ast::{ExpressionNode, SubstringAssertion};
