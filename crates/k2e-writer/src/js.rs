//! Helpers for emitting JavaScript source text.

/// Escapes text for the literal part of a template literal.
#[must_use]
pub fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// A double-quoted JS string literal.
#[must_use]
pub fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// A single-quoted JS string literal.
#[must_use]
pub fn single_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Object-literal key for `name`.
#[must_use]
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

/// `object.name`, or `object["name"]` when `name` is not an identifier.
#[must_use]
pub fn property_access(object: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", string_literal(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_escapes() {
        assert_eq!(escape_template(r"a\b"), r"a\\b");
        assert_eq!(escape_template("`x`"), "\\`x\\`");
        assert_eq!(escape_template("${p.x}"), "\\${p.x}");
        assert_eq!(escape_template("$5 {a}"), "$5 {a}");
    }

    #[test]
    fn literals() {
        assert_eq!(string_literal("F.Cu"), "\"F.Cu\"");
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(single_quoted("it's"), "'it\\'s'");
    }

    #[test]
    fn property_names() {
        assert_eq!(property_access("p", "P1"), "p.P1");
        assert_eq!(property_access("p", "A-1"), "p[\"A-1\"]");
        assert_eq!(property_key("$ok_1"), "$ok_1");
        assert_eq!(property_key("1"), "\"1\"");
        assert!(!is_identifier(""));
    }
}
