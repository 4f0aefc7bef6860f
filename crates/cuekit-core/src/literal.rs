//! Literal decoding
//!
//! The syntax tree keeps literals verbatim; these helpers turn that text
//! into values. They are shared by the parser (which rejects malformed
//! escapes early) and by the value builder.

/// Decode a double-quoted string literal
pub fn unquote(raw: &str) -> Result<String, String> {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| format!("invalid string literal {}", raw))?;
    let bytes = unescape(inner, '"')?;
    String::from_utf8(bytes).map_err(|_| format!("invalid UTF-8 in string literal {}", raw))
}

/// Decode a single-quoted bytes literal
pub fn unquote_bytes(raw: &str) -> Result<Vec<u8>, String> {
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(|| format!("invalid bytes literal {}", raw))?;
    unescape(inner, '\'')
}

fn unescape(inner: &str, quote: char) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| "unterminated escape sequence".to_string())?;
        let decoded = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '/' => '/',
            '\\' => '\\',
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .ok_or_else(|| format!("invalid unicode escape \\u{}", hex))?;
                char::from_u32(code)
                    .ok_or_else(|| format!("invalid unicode escape \\u{}", hex))?
            }
            c if c == quote => quote,
            other => return Err(format!("unknown escape sequence \\{}", other)),
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
    }
    Ok(out)
}

/// Quote a string the way the formatter writes string literals
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Quote bytes as a single-quoted literal
pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("'");
    for chunk in String::from_utf8_lossy(bytes).chars() {
        match chunk {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Parse an integer literal, allowing `_` digit separators
pub fn parse_int(raw: &str) -> Result<i64, String> {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    digits
        .parse::<i64>()
        .map_err(|_| format!("integer literal {} out of range", raw))
}

/// Parse a float literal, allowing `_` digit separators
pub fn parse_float(raw: &str) -> Result<f64, String> {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    let value = digits
        .parse::<f64>()
        .map_err(|_| format!("invalid float literal {}", raw))?;
    if !value.is_finite() {
        return Err(format!("float literal {} out of range", raw));
    }
    Ok(value)
}

/// Whether a label can be written without quotes
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let first_ok = match chars.next() {
        Some('#') => chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$'),
        Some(c) => c.is_ascii_alphabetic() || c == '_' || c == '$',
        None => false,
    };
    first_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !matches!(s, "package" | "import" | "null" | "true" | "false" | "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""a\"b""#).unwrap(), "a\"b");
        assert_eq!(unquote(r#""tab\there""#).unwrap(), "tab\there");
        assert_eq!(unquote(r#""é""#).unwrap(), "é");
        assert!(unquote(r#""\q""#).is_err());
    }

    #[test]
    fn test_unquote_bytes() {
        assert_eq!(unquote_bytes("'ab\\n'").unwrap(), b"ab\n".to_vec());
    }

    #[test]
    fn test_quote_roundtrip() {
        let s = "line\n\"quoted\"";
        assert_eq!(unquote(&quote(s)).unwrap(), s);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_int("1_000").unwrap(), 1000);
        assert_eq!(parse_int("-42").unwrap(), -42);
        assert!(parse_int("99999999999999999999").is_err());
        assert_eq!(parse_float("1.5e3").unwrap(), 1500.0);
        assert_eq!(
            parse_float("1e999").unwrap_err(),
            "float literal 1e999 out of range"
        );
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("name"));
        assert!(is_identifier("#User"));
        assert!(is_identifier("_hidden"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier("true"));
        assert!(!is_identifier(""));
    }
}
