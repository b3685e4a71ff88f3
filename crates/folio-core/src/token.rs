//! Quote-aware tokenizer and serializer for directive values.
//!
//! Tokens are serialized as a space-separated list. A token containing a
//! space or a quote character is wrapped in double quotes, with inner
//! backslashes and double quotes backslash-escaped:
//!
//! ```text
//! "first token" "\"second token\"" third
//! ```
//!
//! Parsing accepts both single and double quotes. Inside quotes, `\\` and
//! a backslash before the enclosing quote character are escapes; any other
//! backslash is kept as is.

/// Error type for token parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("unclosed quote: {0}")]
    UnclosedQuote(String),
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Quotes a single token if it needs it.
pub fn quote(token: &str) -> String {
    if token.contains(' ') || token.contains('"') || token.contains('\'') {
        format!("\"{}\"", token.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        token.to_string()
    }
}

/// Serializes a token list into its single-line string form.
pub fn tokens_to_string<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| quote(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a string into tokens.
///
/// `a b 'c d' e` yields `["a", "b", "c d", "e"]`.
pub fn string_to_tokens(s: &str) -> Result<Vec<String>> {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    // Leading spaces are not part of any token.
    while i < len && bytes[i] == b' ' {
        i += 1;
    }

    while i < len {
        let c = bytes[i];
        let next = if c == b'"' || c == b'\'' {
            let (token, end) =
                read_quoted(s, i).ok_or_else(|| TokenError::UnclosedQuote(s.to_string()))?;
            tokens.push(token);
            end
        } else {
            let end = s[i..].find(' ').map(|p| p + i).unwrap_or(len);
            tokens.push(s[i..end].to_string());
            end
        };

        i = next;
        while i < len && bytes[i] == b' ' {
            i += 1;
        }
    }

    Ok(tokens)
}

/// Reads the quoted token opening at byte `open`, returning it unescaped
/// together with the byte index just past its closing quote.
fn read_quoted(s: &str, open: usize) -> Option<(String, usize)> {
    let quote = char::from(s.as_bytes()[open]);
    let body = &s[open + 1..];
    let mut token = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        if c == '\\' {
            match chars.next_if(|&(_, n)| n == '\\' || n == quote) {
                Some((_, escaped)) => token.push(escaped),
                None => token.push(c),
            }
        } else if c == quote {
            return Some((token, open + 1 + pos + 1));
        } else {
            token.push(c);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn toks(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn serialize_quotes_tokens_with_spaces() {
        assert_eq!(tokens_to_string(&["a", "b", "c d", "e"]), r#"a b "c d" e"#);
    }

    #[test]
    fn serialize_escapes_inner_double_quotes() {
        assert_eq!(tokens_to_string(&[r#"say "hi""#]), r#""say \"hi\"""#);
    }

    #[test]
    fn parse_single_quoted() {
        assert_eq!(string_to_tokens("a b 'c d' e").unwrap(), toks(&["a", "b", "c d", "e"]));
    }

    #[test]
    fn parse_double_quoted_with_escape() {
        assert_eq!(
            string_to_tokens(r#"x "a \"b\" c" y"#).unwrap(),
            toks(&["x", r#"a "b" c"#, "y"])
        );
    }

    #[test]
    fn parse_skips_runs_of_spaces() {
        assert_eq!(string_to_tokens("  a    b ").unwrap(), toks(&["a", "b"]));
    }

    #[test]
    fn parse_empty_string() {
        assert!(string_to_tokens("").unwrap().is_empty());
    }

    #[test]
    fn parse_unclosed_quote_fails() {
        let err = string_to_tokens("a 'b c").unwrap_err();
        assert_eq!(err, TokenError::UnclosedQuote("a 'b c".into()));
    }

    #[test]
    fn parse_quoted_empty_token() {
        assert_eq!(string_to_tokens(r#"a "" b"#).unwrap(), toks(&["a", "", "b"]));
    }

    #[test]
    fn trailing_backslash_in_quoted_token() {
        let tokens = toks(&["add", r"dir C:\"]);
        let s = tokens_to_string(&tokens);
        assert_eq!(s, r#"add "dir C:\\""#);
        assert_eq!(string_to_tokens(&s).unwrap(), tokens);
    }

    #[test]
    fn lone_backslashes_are_literal() {
        assert_eq!(string_to_tokens(r#""a\b" c\"#).unwrap(), toks(&[r"a\b", r"c\"]));
        assert_eq!(string_to_tokens(r#"'it\'s'"#).unwrap(), toks(&["it's"]));
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_tokens(tokens in prop::collection::vec("[ -~\t\u{e9}]{1,10}", 0..6)) {
            let s = tokens_to_string(&tokens);
            prop_assert_eq!(string_to_tokens(&s).unwrap(), tokens, "via {}", s);
        }
    }
}
