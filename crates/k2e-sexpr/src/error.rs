use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SexprError {
    #[error("expected '(' at token {index} (byte {offset}), found {found:?}")]
    ExpectedOpen {
        index: usize,
        offset: usize,
        found: String,
    },

    #[error("node opened at token {index} (byte {offset}) has no type atom")]
    MissingType { index: usize, offset: usize },

    #[error("unexpected end of input at token {index}: expected ')'")]
    UnexpectedEof { index: usize },

    #[error("unterminated string starting at token {index} (byte {offset})")]
    UnterminatedString { index: usize, offset: usize },

    #[error("unexpected trailing token at {index} (byte {offset}) after the top-level node")]
    TrailingTokens { index: usize, offset: usize },

    #[error("nesting deeper than {limit} levels at token {index} (byte {offset})")]
    TooDeep {
        index: usize,
        offset: usize,
        limit: usize,
    },
}
