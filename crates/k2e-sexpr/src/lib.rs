//! KiCad S-expression reading: a flat tokenizer and a recursive-descent tree builder.
//!
//! The tree is deliberately untyped beyond `(kind item*)`; interpreting node kinds is
//! left to the writer crate.

mod error;
mod lexer;
mod tree;

pub use error::SexprError;
pub use lexer::{Token, tokenize};
pub use tree::{Item, MAX_DEPTH, Node, parse, parse_str, unquote};
