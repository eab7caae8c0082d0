//! `application/x-www-form-urlencoded` escaping.
//!
//! Encoding delegates to `form_urlencoded`. Decoding is strict: a `%` that isn't followed by
//! two hex digits, or escaped bytes that are invalid in the target charset, are errors instead
//! of being passed through.
use super::Charset;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlDecodeError {
    #[error("malformed escape sequence at byte {position}")]
    MalformedEscape { position: usize },
    #[error("escaped bytes ending at byte {position} are not valid {charset}")]
    InvalidBytes { position: usize, charset: Charset },
}

/// Percent-encodes `text` under `charset`, spaces become `+`.
///
/// Returns `None` if `charset` can't represent `text`.
pub fn encode(text: &str, charset: Charset) -> Option<String> {
    let bytes = charset.encode(text)?;
    Some(form_urlencoded::byte_serialize(&bytes).collect())
}

/// Reverses [`encode`]: `+` becomes a space and runs of `%XX` escapes are decoded under
/// `charset`. Literal characters are kept as they are.
pub fn decode(text: &str, charset: Charset) -> Result<String, UrlDecodeError> {
    let raw = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut escaped: Vec<u8> = Vec::new();
    let mut pos = 0;

    while pos < raw.len() {
        if raw[pos] == b'%' {
            let byte = raw
                .get(pos + 1..pos + 3)
                .and_then(|hex| Some(hex_value(hex[0])? << 4 | hex_value(hex[1])?))
                .ok_or(UrlDecodeError::MalformedEscape { position: pos })?;
            escaped.push(byte);
            pos += 3;
            continue;
        }

        flush(&mut escaped, &mut out, charset, pos)?;

        let Some(c) = text[pos..].chars().next() else {
            break;
        };
        out.push(if c == '+' { ' ' } else { c });
        pos += c.len_utf8();
    }

    flush(&mut escaped, &mut out, charset, pos)?;
    Ok(out)
}

fn flush(
    escaped: &mut Vec<u8>,
    out: &mut String,
    charset: Charset,
    position: usize,
) -> Result<(), UrlDecodeError> {
    if escaped.is_empty() {
        return Ok(());
    }
    let text = charset
        .decode(escaped)
        .ok_or(UrlDecodeError::InvalidBytes { position, charset })?;
    out.push_str(&text);
    escaped.clear();
    Ok(())
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
