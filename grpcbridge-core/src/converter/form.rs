//! # Form Data Converter
//!
//! Converts messages to and from `application/x-www-form-urlencoded` bodies on top of the
//! [`JsonConverter`]:
//!
//! 1. **Serialize**: the message is printed as a JSON tree, the (single level) tree is
//!    flattened into key/value pairs, values are percent-encoded and the pairs are joined with
//!    `&`. Repeated scalar fields produce one pair per element.
//! 2. **Parse**: the body is split into pairs, each pair is percent-decoded, and the pairs are
//!    assembled into a JSON object that the [`JsonConverter`] turns into the message.
//!
//! Messages with nested message fields can't be flattened, use JSON for those.
//!
//! ## Duplicate keys
//!
//! A key that names a repeated field collects every occurrence, in body order. A key that
//! names a singular field keeps its last occurrence.
use super::{
    Charset, ContentConverter, ContentType, JsonConverter, fan_out,
    urlencoded::{self, UrlDecodeError},
};
use crate::error::ParsingError;
use prost_reflect::{DynamicMessage, Kind, MessageDescriptor, ReflectMessage};
use serde_json::{Map, Number, Value};

/// Converts messages to and from `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormDataConverter {
    charset: Charset,
    parallel_threshold: usize,
}

impl FormDataConverter {
    /// Number of pairs from which encoding and decoding are spread over worker threads.
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

    /// The shared instance: UTF-8, default threshold.
    pub const DEFAULT: FormDataConverter = FormDataConverter::new();

    pub const fn new() -> Self {
        Self {
            charset: Charset::Utf8,
            parallel_threshold: Self::DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Sets the charset values are encoded with when serializing.
    pub const fn with_charset(self, charset: Charset) -> Self {
        Self { charset, ..self }
    }

    pub const fn with_parallel_threshold(self, parallel_threshold: usize) -> Self {
        Self {
            parallel_threshold,
            ..self
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// The process-wide instance encoding values with `charset`.
    pub fn shared(charset: Charset) -> &'static FormDataConverter {
        const US_ASCII: FormDataConverter = FormDataConverter::new().with_charset(Charset::UsAscii);
        const ISO_8859_1: FormDataConverter =
            FormDataConverter::new().with_charset(Charset::Iso8859_1);

        match charset {
            Charset::Utf8 => &Self::DEFAULT,
            Charset::UsAscii => &US_ASCII,
            Charset::Iso8859_1 => &ISO_8859_1,
        }
    }
}

impl Default for FormDataConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentConverter for FormDataConverter {
    fn content_type(&self) -> ContentType {
        ContentType::form_data().with_charset(self.charset)
    }

    fn serialize(
        &self,
        index: Option<usize>,
        message: &DynamicMessage,
    ) -> Result<String, ParsingError> {
        let tree = JsonConverter.print_value(message)?;
        let pairs = flatten(tree, message)?;
        let charset = self.charset;

        let encoded = fan_out::try_map(pairs, self.parallel_threshold, |(key, value)| {
            let value = urlencoded::encode(&value, charset).ok_or_else(|| {
                ParsingError::Unencodable {
                    message: format!("{message:?}"),
                    key: key.clone(),
                    charset,
                }
            })?;
            let key = match index {
                Some(index) => format!("{{{key}}}[{index}]"),
                None => key,
            };
            Ok::<_, ParsingError>(format!("{key}={value}"))
        })?;

        Ok(encoded.join("&"))
    }

    /// Items already carry their index suffix, joining them keeps the keys unique.
    fn pack_multiple(&self, items: &[String]) -> String {
        items.join("&")
    }

    fn parse(
        &self,
        body: Option<&str>,
        charset: Charset,
        builder: DynamicMessage,
    ) -> Result<DynamicMessage, ParsingError> {
        let Some(body) = body.filter(|b| !b.is_empty()) else {
            return Ok(builder);
        };

        let entries: Vec<(&str, &str)> = body
            .split('&')
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let pair = entry.split_once('=');
                if pair.is_none() {
                    tracing::debug!(entry, "dropping form entry without a value");
                }
                pair
            })
            .collect();

        let pairs = fan_out::try_map(entries, self.parallel_threshold, |(key, value)| {
            Ok::<_, UrlDecodeError>((
                urlencoded::decode(key, charset)?,
                urlencoded::decode(value, charset)?,
            ))
        })
        .map_err(|source| ParsingError::MalformedBody {
            body: body.to_string(),
            source,
        })?;

        let tree = assemble(&builder.descriptor(), pairs);
        JsonConverter.parse_value(tree, body, builder)
    }
}

/// Projects a single level JSON object into key/value pairs.
fn flatten(tree: Value, message: &DynamicMessage) -> Result<Vec<(String, String)>, ParsingError> {
    let not_flat = |key: &str| ParsingError::NotFlat {
        message: format!("{message:?}"),
        key: key.to_string(),
    };

    // Well-known types (e.g. a top level `google.protobuf.Value`) may print as non objects.
    let Value::Object(fields) = tree else {
        return Err(not_flat(""));
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    let text = scalar_text(item).ok_or_else(|| not_flat(&key))?;
                    pairs.extend(text.map(|text| (key.clone(), text)));
                }
            }
            value => {
                let text = scalar_text(value).ok_or_else(|| not_flat(&key))?;
                pairs.extend(text.map(|text| (key.clone(), text)));
            }
        }
    }
    Ok(pairs)
}

/// `None` for non scalar values, `Some(None)` for nulls, which are skipped.
fn scalar_text(value: Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s)),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Builds the JSON object handed to the JSON converter out of decoded pairs.
///
/// The builder's schema decides how duplicates are handled and which JSON type each value
/// gets. Keys that are not fields of the message are forwarded as strings so the JSON
/// converter reports them.
fn assemble(descriptor: &MessageDescriptor, pairs: Vec<(String, String)>) -> Value {
    let mut object = Map::new();

    for (key, text) in pairs {
        let field = descriptor
            .get_field_by_name(&key)
            .or_else(|| descriptor.get_field_by_json_name(&key));

        match field {
            Some(field) if field.is_list() => {
                let value = typed_value(&field.kind(), text);
                if let Value::Array(items) = object
                    .entry(key)
                    .or_insert_with(|| Value::Array(Vec::new()))
                {
                    items.push(value);
                }
            }
            Some(field) => {
                object.insert(key, typed_value(&field.kind(), text));
            }
            None => {
                object.insert(key, Value::String(text));
            }
        }
    }

    Value::Object(object)
}

/// Gives decoded text the JSON type the canonical Protobuf mapping expects for `kind`.
///
/// Wrapper messages (`google.protobuf.BoolValue` and friends) print as their wrapped value, so
/// they are typed by the kind of that value. Enums print numbers they don't declare, those are
/// forwarded as numbers.
///
/// Text that doesn't parse stays a string, the JSON converter then reports the mismatch.
fn typed_value(kind: &Kind, text: String) -> Value {
    let number = match kind {
        Kind::Message(message) => match wrapped_kind(message) {
            Some(inner) => return typed_value(&inner, text),
            None => None,
        },
        Kind::Enum(_) => text.parse::<i32>().ok().map(Number::from),
        Kind::Bool if text.eq_ignore_ascii_case("true") => return Value::Bool(true),
        Kind::Bool if text.eq_ignore_ascii_case("false") => return Value::Bool(false),
        Kind::Double | Kind::Float => text.parse::<f64>().ok().and_then(Number::from_f64),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 | Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            text.parse::<i64>().ok().map(Number::from)
        }
        Kind::Uint32 | Kind::Fixed32 | Kind::Uint64 | Kind::Fixed64 => {
            text.parse::<u64>().ok().map(Number::from)
        }
        _ => None,
    };

    match number {
        Some(number) => Value::Number(number),
        None => Value::String(text),
    }
}

/// The kind of the `value` field of a well-known wrapper message.
fn wrapped_kind(message: &MessageDescriptor) -> Option<Kind> {
    if message.package_name() != "google.protobuf" || message.fields().len() != 1 {
        return None;
    }
    message.get_field_by_name("value").map(|field| field.kind())
}
