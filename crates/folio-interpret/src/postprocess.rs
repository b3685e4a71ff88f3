//! Post-processing pipeline applied to schema values.
//!
//! A post-processing spec is one or more functions joined by `" | "` and
//! applied left to right:
//!
//! - `date`, `duration`, `size` -- human-readable formatting
//! - `%...` -- printf-style formatting of the value as a float
//! - `s/pattern/replacement` -- regular expression substitution
//! - `[start:end]` -- substring
//!
//! Every function returns an explicit `Result`. The chain as a whole is
//! forgiving: if any step fails the original, unmodified value is kept and
//! the failure is logged at `warn`.

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::format::{self, FormatError};
use crate::render::CellValue;

/// Separator between chained functions.
pub const FUNC_DELIM: &str = " | ";

/// Why a single post-processing step failed.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("not a number: {0}")]
    NotNumber(Value),

    #[error("not a string: {0}")]
    NotString(Value),

    #[error("invalid substitution {0:?}: expected s/pattern/replacement")]
    BadSubstitution(String),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("invalid slice bound {0:?}")]
    BadSlice(String),
}

/// One parsed step of a post-processing chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFunction {
    Date,
    Duration,
    Size,
    Printf(String),
    Substitute(String),
    Slice { start: String, end: String },
    Invalid(String),
}

impl PostFunction {
    pub fn parse(f: &str) -> Self {
        match f {
            "date" => Self::Date,
            "duration" => Self::Duration,
            "size" => Self::Size,
            _ if f.starts_with('%') => Self::Printf(f.to_string()),
            _ if f.starts_with("s/") => Self::Substitute(f.to_string()),
            _ if f.starts_with('[') => match parse_slice(f) {
                Some((start, end)) => Self::Slice {
                    start: start.to_string(),
                    end: end.to_string(),
                },
                None => Self::Invalid(f.to_string()),
            },
            _ => Self::Invalid(f.to_string()),
        }
    }

    fn apply(&self, value: Value) -> Result<Value, PostError> {
        let out = match self {
            Self::Date => format::date_str(as_float(&value)?)?,
            Self::Duration if !is_truthy(&value) => String::new(),
            Self::Duration => format::duration_str(as_float(&value)?)?,
            Self::Size => format::size_str(as_float(&value)?),
            Self::Printf(_) if !is_truthy(&value) => String::new(),
            Self::Printf(f) => format::sprintf(f, as_float(&value)?)?,
            Self::Substitute(f) => substitute(f, as_str(&value)?)?,
            Self::Slice { start, end } => slice(as_str(&value)?, start, end)?,
            Self::Invalid(name) => format!("<invalid function: {name}>"),
        };
        Ok(Value::String(out))
    }
}

/// Applies `post` to a cell.
///
/// Deferred cells are not processed; the spec is attached to them so it can
/// be applied once the file has been fetched.
pub fn apply_func(post: Option<&str>, cell: CellValue) -> CellValue {
    match cell {
        CellValue::Deferred(mut deferred) => {
            deferred.post = post.map(str::to_string);
            CellValue::Deferred(deferred)
        }
        CellValue::Value(value) => CellValue::Value(apply_to_value(post, value)),
    }
}

/// Applies `post` to a resolved value, keeping the original on failure.
pub fn apply_to_value(post: Option<&str>, value: Value) -> Value {
    let Some(post) = post else {
        return value;
    };
    match run_chain(post, &value) {
        Ok(out) => out,
        Err(err) => {
            warn!(post, %value, error = %err, "post-processing failed, keeping original value");
            value
        }
    }
}

/// Runs every step of the chain, stopping at the first invalid function.
pub fn run_chain(post: &str, value: &Value) -> Result<Value, PostError> {
    let mut current = value.clone();
    for f in post.split(FUNC_DELIM) {
        let func = PostFunction::parse(f);
        current = func.apply(current)?;
        if matches!(func, PostFunction::Invalid(_)) {
            break;
        }
    }
    Ok(current)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn as_float(value: &Value) -> Result<f64, PostError> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .ok_or_else(|| PostError::NotNumber(value.clone()))
}

fn as_str(value: &Value) -> Result<&str, PostError> {
    value
        .as_str()
        .ok_or_else(|| PostError::NotString(value.clone()))
}

/// Splits `[start:end]` into its two (possibly empty) bounds.
fn parse_slice(f: &str) -> Option<(&str, &str)> {
    let inner = f.strip_prefix('[')?;
    let close = inner.rfind(']')?;
    inner[..close].rsplit_once(':')
}

fn slice(s: &str, start: &str, end: &str) -> Result<String, PostError> {
    let bound = |b: &str, default: i64| -> Result<i64, PostError> {
        if b.is_empty() {
            Ok(default)
        } else {
            b.trim().parse().map_err(|_| PostError::BadSlice(b.to_string()))
        }
    };
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let clamp = |i: i64| -> usize {
        let i = if i < 0 { i + len } else { i };
        i.clamp(0, len) as usize
    };

    let start = clamp(bound(start, 0)?);
    let end = clamp(bound(end, -1)?);
    if start >= end {
        return Ok(String::new());
    }
    Ok(chars[start..end].iter().collect())
}

fn substitute(f: &str, s: &str) -> Result<String, PostError> {
    let parts: Vec<&str> = f.split('/').collect();
    let [_, pattern, replacement] = parts.as_slice() else {
        return Err(PostError::BadSubstitution(f.to_string()));
    };
    let re = Regex::new(pattern)?;
    Ok(re
        .replace_all(s, expand_replacement(replacement).as_str())
        .into_owned())
}

/// Converts `\1`-style group references into the `${1}` form and escapes
/// literal `$`.
fn expand_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' if chars.peek().is_some_and(char::is_ascii_digit) => {
                let mut group = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    group.push(d);
                }
                out.push_str(&format!("${{{group}}}"));
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DeferredValue;
    use serde_json::json;

    fn post(spec: &str, value: Value) -> Value {
        apply_to_value(Some(spec), value)
    }

    #[test]
    fn no_post_passes_through() {
        assert_eq!(apply_to_value(None, json!(3)), json!(3));
    }

    #[test]
    fn formatting_functions() {
        assert_eq!(post("date", json!(0)), json!("1970-01-01 00:00:00"));
        assert_eq!(post("size", json!(1536)), json!("1.5k"));
        assert_eq!(post("duration", json!(65)), json!("1m5s"));
        assert_eq!(post("duration", json!("65")), json!("1m5s"));
        assert_eq!(post("%.2f", json!("0.12345")), json!("0.12"));
    }

    #[test]
    fn empty_input_passes_through_empty() {
        assert_eq!(post("duration", json!("")), json!(""));
        assert_eq!(post("%.2f", json!(null)), json!(""));
        assert_eq!(post("%.2f", json!(0)), json!(""));
    }

    #[test]
    fn chained_functions_apply_left_to_right() {
        assert_eq!(post("%.3f | s/0\\./x", json!(0.5)), json!("x500"));
        assert_eq!(post("s/_/- | [0:4]", json!("a_b_c_d")), json!("a-b-"));
        // A trailing slash makes four parts, which is not a valid substitution.
        assert_eq!(post("s/_/-/", json!("a_b")), json!("a_b"));
    }

    #[test]
    fn substitution_with_groups() {
        assert_eq!(post("s/(\\w+)@(\\w+)/\\2 at \\1", json!("me@home")), json!("home at me"));
        assert_eq!(post("s/x/$/", json!("x")), json!("x"));
        assert_eq!(post("s/x/$", json!("x")), json!("$"));
    }

    #[test]
    fn slices_follow_python_semantics() {
        assert_eq!(post("[1:3]", json!("abcdef")), json!("bc"));
        assert_eq!(post("[:]", json!("abcdef")), json!("abcde"));
        assert_eq!(post("[2:]", json!("abcdef")), json!("cde"));
        assert_eq!(post("[-3:-1]", json!("abcdef")), json!("de"));
        assert_eq!(post("[4:2]", json!("abcdef")), json!(""));
    }

    #[test]
    fn invalid_function_stops_the_chain() {
        assert_eq!(post("frobnicate", json!("x")), json!("<invalid function: frobnicate>"));
        assert_eq!(post("size | bogus | date", json!(10)), json!("<invalid function: bogus>"));
        assert_eq!(post("[oops", json!("x")), json!("<invalid function: [oops>"));
    }

    #[test]
    fn failures_keep_original_value() {
        assert_eq!(post("date", json!("yesterday")), json!("yesterday"));
        assert_eq!(post("%d", json!("abc")), json!("abc"));
        assert_eq!(post("s/(/x", json!("abc")), json!("abc"));
        assert_eq!(post("s/a/b/c", json!("abc")), json!("abc"));
        assert_eq!(post("[a:b]", json!("abc")), json!("abc"));
        assert_eq!(post("[0:1]", json!(12)), json!(12));
        assert_eq!(post("size | %q", json!(2048)), json!(2048));
    }

    #[test]
    fn out_of_range_numbers_keep_original_value() {
        assert_eq!(post("duration", json!(1e300)), json!(1e300));
        assert_eq!(post("duration", json!(-1e300)), json!(-1e300));
        assert_eq!(post("%99999999999999999999d", json!(1)), json!(1));
        assert_eq!(post("%.9999999f", json!(1.5)), json!(1.5));
        assert_eq!(post("date", json!(1e300)), json!(1e300));
    }

    #[test]
    fn non_finite_strings_are_not_numbers() {
        for s in ["nan", "NaN", "inf", "-inf", "infinity"] {
            assert_eq!(post("date", json!(s)), json!(s));
            assert_eq!(post("duration", json!(s)), json!(s));
            assert_eq!(post("size", json!(s)), json!(s));
        }
        assert!(matches!(run_chain("duration", &json!("inf")), Err(PostError::NotNumber(_))));
    }

    #[test]
    fn chain_reports_failure_explicitly() {
        assert!(matches!(
            run_chain("s/x", &json!("abc")),
            Err(PostError::BadSubstitution(_))
        ));
        assert!(matches!(run_chain("size", &json!([1])), Err(PostError::NotNumber(_))));
    }

    #[test]
    fn deferred_values_get_post_attached() {
        let cell = CellValue::Deferred(DeferredValue::new("0x1", "/stats:acc"));
        match apply_func(Some("%.2f"), cell) {
            CellValue::Deferred(d) => {
                assert_eq!(d.post.as_deref(), Some("%.2f"));
                assert_eq!(d.genpath, "/stats:acc");
            }
            other => panic!("expected deferred, got {other:?}"),
        }
    }
}
