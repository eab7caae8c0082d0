use crate::error::ParsingError;
use http::HeaderValue;
use std::{borrow::Cow, fmt, str::FromStr};

pub const FORM_DATA: &str = "application/x-www-form-urlencoded";
pub const JSON: &str = "application/json";

/// The character sets a body can be encoded with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Iso8859_1,
}

impl Charset {
    /// The canonical (IANA) name of the charset.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Iso8859_1 => "ISO-8859-1",
        }
    }

    /// Encodes `text`, returns `None` if it holds characters the charset can't represent.
    pub fn encode(self, text: &str) -> Option<Cow<'_, [u8]>> {
        match self {
            Charset::Utf8 => Some(Cow::Borrowed(text.as_bytes())),
            Charset::UsAscii => text.is_ascii().then_some(Cow::Borrowed(text.as_bytes())),
            Charset::Iso8859_1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect::<Option<Vec<u8>>>()
                .map(Cow::Owned),
        }
    }

    /// Decodes `bytes`, returns `None` if they are not valid in this charset.
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Charset::UsAscii => bytes
                .is_ascii()
                .then(|| std::str::from_utf8(bytes).ok().map(Cow::Borrowed))
                .flatten(),
            Charset::Iso8859_1 => Some(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "us-ascii" | "ascii" => Ok(Charset::UsAscii),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" => Ok(Charset::Iso8859_1),
            _ => Err(ParsingError::UnsupportedCharset(s.to_string())),
        }
    }
}

/// A media type plus the charset its text is encoded with.
///
/// Parses and renders `Content-Type` header values:
///
/// ```rust
/// use grpcbridge_core::converter::{Charset, ContentType};
///
/// let ct: ContentType = "application/x-www-form-urlencoded; charset=ISO-8859-1".parse().unwrap();
/// assert_eq!(ct.media_type(), "application/x-www-form-urlencoded");
/// assert_eq!(ct.charset(), Charset::Iso8859_1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    media_type: String,
    charset: Charset,
}

impl ContentType {
    pub fn new(media_type: impl Into<String>, charset: Charset) -> Self {
        Self {
            media_type: media_type.into().to_ascii_lowercase(),
            charset,
        }
    }

    pub fn form_data() -> Self {
        Self::new(FORM_DATA, Charset::Utf8)
    }

    pub fn json() -> Self {
        Self::new(JSON, Charset::Utf8)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn with_charset(self, charset: Charset) -> Self {
        Self { charset, ..self }
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
        HeaderValue::try_from(self.to_string())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; charset={}", self.media_type, self.charset)
    }
}

impl FromStr for ContentType {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';');
        let media_type = parts.next().unwrap_or_default().trim();

        let valid = media_type
            .split_once('/')
            .is_some_and(|(kind, sub)| is_token(kind) && is_token(sub));
        if !valid {
            return Err(ParsingError::InvalidContentType(s.to_string()));
        }

        let mut charset = Charset::default();
        for param in parts {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("charset") {
                charset = value.trim().trim_matches('"').parse()?;
            }
        }

        Ok(ContentType::new(media_type, charset))
    }
}

impl TryFrom<&HeaderValue> for ContentType {
    type Error = ParsingError;

    fn try_from(value: &HeaderValue) -> Result<Self, Self::Error> {
        value
            .to_str()
            .map_err(|_| ParsingError::InvalidContentType(format!("{value:?}")))?
            .parse()
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
}
