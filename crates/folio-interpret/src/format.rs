//! Human-readable formatting of dates, durations, sizes and printf-style
//! numbers.

use std::iter::Peekable;
use std::str::Chars;

use chrono::DateTime;

/// Largest width or precision a printf specifier may ask for.
const MAX_FIELD: usize = 4096;

/// Error type for formatting failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(f64),

    #[error("duration out of range: {0}")]
    DurationOutOfRange(f64),

    #[error("invalid format string {format:?}: {reason}")]
    BadFormat { format: String, reason: String },
}

/// Formats unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn date_str(timestamp: f64) -> Result<String, FormatError> {
    if !timestamp.is_finite() {
        return Err(FormatError::TimestampOutOfRange(timestamp));
    }
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .ok_or(FormatError::TimestampOutOfRange(timestamp))
}

/// Formats a number of seconds using its two most significant units.
///
/// `42.0` -> `42.0s`, `65` -> `1m5s`, `7380` -> `2h3m`, `349200` -> `4d1h`.
///
/// Fails for non-finite input and for more minutes than fit in an `i64`.
pub fn duration_str(seconds: f64) -> Result<String, FormatError> {
    let minutes = (seconds / 60.0).trunc();
    // i64::MAX as f64 rounds up to 2^63, so `<` keeps the cast exact.
    if !minutes.is_finite() || minutes.abs() >= i64::MAX as f64 {
        return Err(FormatError::DurationOutOfRange(seconds));
    }
    let minutes = minutes as i64;
    if minutes == 0 {
        return Ok(format!("{seconds:.1}s"));
    }
    let secs = (seconds - minutes as f64 * 60.0) as i64;
    let hours = minutes / 60;
    if hours == 0 {
        return Ok(format!("{minutes}m{secs}s"));
    }
    let minutes = minutes % 60;
    let days = hours / 24;
    if days == 0 {
        return Ok(format!("{hours}h{minutes}m"));
    }
    let hours = hours % 24;
    let years = days / 365;
    if years == 0 {
        return Ok(format!("{days}d{hours}h"));
    }
    let days = days % 365;
    Ok(format!("{years}y{days}d"))
}

/// Formats a byte count with a binary unit suffix (`''`, `k`, `m`, `g`, `t`).
///
/// `512` -> `512`, `1536` -> `1.5k`, `204800` -> `200k`.
pub fn size_str(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["", "k", "m", "g", "t"];
    let mut size = bytes;
    for unit in UNITS {
        if size < 100.0 && size != size.trunc() {
            return format!("{size:.1}{unit}");
        }
        if size < 1024.0 {
            return format!("{}{unit}", size.trunc() as i64);
        }
        size /= 1024.0;
    }
    format!("{}p", size.trunc() as i64)
}

/// A parsed `%[flags][width][.precision]conv` specifier.
#[derive(Debug, Default)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: usize,
    precision: Option<usize>,
    conv: char,
}

/// Applies a printf-style format containing exactly one value conversion.
///
/// Supported conversions: `d i f F e E g G s`, plus `%%` for a literal `%`.
pub fn sprintf(format: &str, value: f64) -> Result<String, FormatError> {
    let bad = |reason: &str| FormatError::BadFormat {
        format: format.to_string(),
        reason: reason.to_string(),
    };

    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars().peekable();
    let mut converted = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&f) = chars.peek() {
            match f {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.alt = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = read_field(&mut chars).ok_or_else(|| bad("width too large"))?;
        if chars.peek() == Some(&'.') {
            chars.next();
            let precision = read_field(&mut chars).ok_or_else(|| bad("precision too large"))?;
            spec.precision = Some(precision);
        }
        while matches!(chars.peek(), Some('h' | 'l' | 'L')) {
            chars.next();
        }
        spec.conv = chars.next().ok_or_else(|| bad("incomplete format"))?;

        if spec.conv == '%' {
            out.push('%');
            continue;
        }
        if converted {
            return Err(bad("not enough arguments for format string"));
        }
        converted = true;
        out.push_str(&format_one(&spec, value).map_err(|reason| bad(&reason))?);
    }

    if !converted {
        return Err(bad("not all arguments converted during string formatting"));
    }
    Ok(out)
}

/// Reads a run of decimal digits (zero if there are none). `None` if the
/// number exceeds [`MAX_FIELD`].
fn read_field(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut n: usize = 0;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add(d as usize))
            .filter(|&n| n <= MAX_FIELD)?;
        chars.next();
    }
    Some(n)
}

fn format_one(spec: &Spec, value: f64) -> Result<String, String> {
    let upper = spec.conv.is_ascii_uppercase();
    let numeric = spec.conv != 's';

    let body = match spec.conv {
        's' => {
            let s = if value.is_finite() && value == value.trunc() {
                format!("{value:.1}")
            } else {
                format!("{value}")
            };
            let s = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            };
            return Ok(pad(spec, "", &s, false));
        }
        _ if !value.is_finite() => {
            if matches!(spec.conv, 'd' | 'i') {
                return Err(format!("cannot convert {value} to integer"));
            }
            let s = if value.is_nan() { "nan" } else { "inf" };
            if upper { s.to_uppercase() } else { s.to_string() }
        }
        'd' | 'i' => {
            let digits = format!("{:.0}", value.abs().trunc());
            match spec.precision {
                Some(p) if digits.len() < p => format!("{}{digits}", "0".repeat(p - digits.len())),
                _ => digits,
            }
        }
        'f' | 'F' => {
            let s = format!("{:.*}", spec.precision.unwrap_or(6), value.abs());
            if spec.alt && !s.contains('.') { s + "." } else { s }
        }
        'e' | 'E' => exponential(value.abs(), spec.precision.unwrap_or(6), upper),
        'g' | 'G' => general(value.abs(), spec.precision.unwrap_or(6), spec.alt, upper),
        other => return Err(format!("unsupported format character '{other}'")),
    };

    let negative = match spec.conv {
        'd' | 'i' => value.trunc() < 0.0,
        _ => value.is_sign_negative() && !value.is_nan(),
    };
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };
    Ok(pad(spec, sign, &body, numeric))
}

/// `d.dddddde+XX` with at least two exponent digits.
fn exponential(abs: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{abs:.precision$e}");
    let (mantissa, exp) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{sign}{:02}", exp.abs())
}

fn general(abs: f64, precision: usize, alt: bool, upper: bool) -> String {
    let p = precision.max(1);
    let exp = if abs == 0.0 {
        0
    } else {
        let digits = p - 1;
        let raw = format!("{abs:.digits$e}");
        raw.split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };

    let s = if exp >= -4 && exp < p as i32 {
        let digits = (p as i32 - 1 - exp).max(0) as usize;
        format!("{abs:.digits$}")
    } else {
        exponential(abs, p - 1, upper)
    };
    if alt {
        return s;
    }

    // Strip trailing zeros from the mantissa.
    let (mantissa, suffix) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s.as_str(), ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{mantissa}{suffix}")
}

fn pad(spec: &Spec, sign: &str, body: &str, numeric: bool) -> String {
    let len = sign.chars().count() + body.chars().count();
    if len >= spec.width {
        return format!("{sign}{body}");
    }
    let fill = spec.width - len;
    if spec.left {
        format!("{sign}{body}{}", " ".repeat(fill))
    } else if spec.zero && numeric {
        format!("{sign}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{sign}{body}", " ".repeat(fill))
    }
}
