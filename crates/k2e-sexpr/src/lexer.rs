use std::fmt;

/// A slice of the source text: `(`, `)`, a quoted string (quotes included) or a bare atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Token<'a> {
    #[must_use]
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Byte offset of the token's first character in the tokenized text.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.text == "("
    }

    #[must_use]
    pub fn is_close(&self) -> bool {
        self.text == ")"
    }

    /// A quoted string whose closing quote was never found.
    #[must_use]
    pub fn is_unterminated_string(&self) -> bool {
        let t = self.text;
        t.starts_with('"') && (t.len() < 2 || !t.ends_with('"') || t.ends_with("\\\""))
    }
}

impl PartialEq<&str> for Token<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// Splits `input` into tokens in a single left-to-right pass.
///
/// `;` starts a comment running to the end of the line unless it appears inside a quoted
/// string. Inside strings a `"` preceded by a backslash does not terminate the string; no
/// other escapes are interpreted. The lexer never fails: an unterminated string becomes a
/// token running to the end of input and is rejected by the parser.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut atom_start: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                flush_atom(input, &mut atom_start, i, &mut tokens);
                let end = string_end(bytes, i);
                tokens.push(Token {
                    text: &input[i..end],
                    offset: i,
                });
                i = end;
            }
            b';' => {
                flush_atom(input, &mut atom_start, i, &mut tokens);
                i = input[i..].find('\n').map_or(bytes.len(), |nl| i + nl);
            }
            b'(' | b')' => {
                flush_atom(input, &mut atom_start, i, &mut tokens);
                tokens.push(Token {
                    text: &input[i..=i],
                    offset: i,
                });
                i += 1;
            }
            b' ' | b'\t' | b'\n' | b'\r' => {
                flush_atom(input, &mut atom_start, i, &mut tokens);
                i += 1;
            }
            _ => {
                atom_start.get_or_insert(i);
                i += 1;
            }
        }
    }
    flush_atom(input, &mut atom_start, bytes.len(), &mut tokens);

    tokens
}

fn flush_atom<'a>(
    input: &'a str,
    atom_start: &mut Option<usize>,
    end: usize,
    tokens: &mut Vec<Token<'a>>,
) {
    if let Some(start) = atom_start.take() {
        tokens.push(Token {
            text: &input[start..end],
            offset: start,
        });
    }
}

/// Index one past the closing quote of the string opened at `open`, or the input length.
fn string_end(bytes: &[u8], open: usize) -> usize {
    let mut j = open + 1;
    while j < bytes.len() {
        if bytes[j] == b'"' && bytes[j - 1] != b'\\' {
            return j + 1;
        }
        j += 1;
    }
    bytes.len()
}
