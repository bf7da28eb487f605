//! Small text helpers shared by the parser and downstream tooling.

/// Determine whether the given text is a valid identifier.
#[must_use]
pub fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Interpret the escape sequences of a quoted string literal.
///
/// The lexer stores literal content verbatim; analysis that compares field
/// names against string keys runs the escapes here. Malformed sequences are
/// kept verbatim rather than reported: static analysis should keep going on
/// text the evaluator would reject.
#[must_use]
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let mut digits = String::new();
                for _ in 0..4 {
                    match chars.clone().next() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            chars.next();
                            digits.push(d);
                        }
                        _ => break,
                    }
                }
                let decoded = if digits.len() == 4 {
                    u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(c) => out.push(c),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("_foo9"));
        assert!(!is_valid_identifier("9foo"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape(r#"a\nb"#), "a\nb");
        assert_eq!(unescape(r#"foo"#), "foo");
        assert_eq!(unescape(r#"\q"#), "\\q");
    }
}
