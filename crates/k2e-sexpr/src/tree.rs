use std::fmt;

use crate::error::SexprError;
use crate::lexer::{Token, tokenize};

/// Deepest nesting the tree builder accepts before giving up.
pub const MAX_DEPTH: usize = 512;

/// `(kind item*)`. Items keep source order; positional arguments depend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Atom(String),
    Node(Node),
}

impl Node {
    pub fn new(kind: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            kind: kind.into(),
            items,
        }
    }

    pub fn atoms(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().filter_map(Item::as_atom)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.items.iter().filter_map(Item::as_node)
    }

    /// First direct child node of the given kind.
    #[must_use]
    pub fn child(&self, kind: &str) -> Option<&Node> {
        self.nodes().find(|n| n.kind == kind)
    }

    #[must_use]
    pub fn first_atom(&self) -> Option<&str> {
        self.items.first().and_then(Item::as_atom)
    }
}

impl Item {
    #[must_use]
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Item::Atom(s) => Some(s),
            Item::Node(_) => None,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Item::Node(n) => Some(n),
            Item::Atom(_) => None,
        }
    }
}

impl From<&str> for Item {
    fn from(atom: &str) -> Self {
        Item::Atom(atom.to_string())
    }
}

impl From<Node> for Item {
    fn from(node: Node) -> Self {
        Item::Node(node)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.kind)?;
        for item in &self.items {
            write!(f, " {item}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Atom(s) => f.write_str(s),
            Item::Node(n) => n.fmt(f),
        }
    }
}

/// Strips one pair of surrounding double quotes, if present.
#[must_use]
pub fn unquote(atom: &str) -> &str {
    if atom.len() >= 2 && atom.starts_with('"') && atom.ends_with('"') {
        &atom[1..atom.len() - 1]
    } else {
        atom
    }
}

/// Builds the first node of `tokens`. Tokens after its closing paren are ignored.
pub fn parse(tokens: &[Token<'_>]) -> Result<Node, SexprError> {
    TreeBuilder::new(tokens).node(0)
}

/// Tokenizes and parses a whole document, which must be exactly one top-level node.
pub fn parse_str(input: &str) -> Result<Node, SexprError> {
    let tokens = tokenize(input);
    let mut builder = TreeBuilder::new(&tokens);
    let node = builder.node(0)?;
    if let Some(extra) = tokens.get(builder.pos) {
        return Err(SexprError::TrailingTokens {
            index: builder.pos,
            offset: extra.offset(),
        });
    }
    Ok(node)
}

struct TreeBuilder<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> TreeBuilder<'t, 'a> {
    fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Result<Token<'a>, SexprError> {
        self.tokens
            .get(self.pos)
            .copied()
            .ok_or(SexprError::UnexpectedEof { index: self.pos })
    }

    fn atom(&self, token: Token<'a>) -> Result<String, SexprError> {
        if token.is_unterminated_string() {
            return Err(SexprError::UnterminatedString {
                index: self.pos,
                offset: token.offset(),
            });
        }
        Ok(token.as_str().to_string())
    }

    fn node(&mut self, depth: usize) -> Result<Node, SexprError> {
        let open = self.peek()?;
        if !open.is_open() {
            return Err(SexprError::ExpectedOpen {
                index: self.pos,
                offset: open.offset(),
                found: open.as_str().to_string(),
            });
        }
        if depth >= MAX_DEPTH {
            return Err(SexprError::TooDeep {
                index: self.pos,
                offset: open.offset(),
                limit: MAX_DEPTH,
            });
        }
        self.pos += 1;

        let kind_token = self.peek()?;
        if kind_token.is_open() || kind_token.is_close() {
            return Err(SexprError::MissingType {
                index: self.pos,
                offset: kind_token.offset(),
            });
        }
        let kind = self.atom(kind_token)?;
        self.pos += 1;

        let mut items = Vec::new();
        loop {
            let token = self.peek()?;
            if token.is_close() {
                self.pos += 1;
                return Ok(Node { kind, items });
            }
            if token.is_open() {
                items.push(Item::Node(self.node(depth + 1)?));
            } else {
                items.push(Item::Atom(self.atom(token)?));
                self.pos += 1;
            }
        }
    }
}
