//! # JSON Converter
//!
//! The JSON tree converter the other formats are built on. Printing and parsing are
//! delegated to `prost_reflect`'s `serde` support, so the output follows the canonical
//! Protobuf JSON mapping (except that field names are kept as declared in the schema).
use super::{Charset, ContentConverter, ContentType};
use crate::error::ParsingError;
use prost::Message;
use prost_reflect::{DeserializeOptions, DynamicMessage, ReflectMessage, SerializeOptions};

/// Converts messages to and from `application/json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonConverter;

impl JsonConverter {
    /// Prints `message` as a JSON tree.
    pub fn print_value(&self, message: &DynamicMessage) -> Result<serde_json::Value, ParsingError> {
        message
            .serialize_with_options(serde_json::value::Serializer, &serialize_options())
            .map_err(|source| ParsingError::Print {
                message: format!("{message:?}"),
                source,
            })
    }

    /// Prints `message` as compact JSON text.
    pub fn print(&self, message: &DynamicMessage) -> Result<String, ParsingError> {
        self.print_value(message).map(|tree| tree.to_string())
    }

    /// Builds a message of the builder's type out of a JSON tree and merges it into `builder`.
    ///
    /// `body` is only used to describe failures.
    pub fn parse_value(
        &self,
        tree: serde_json::Value,
        body: &str,
        builder: DynamicMessage,
    ) -> Result<DynamicMessage, ParsingError> {
        let parsed = DynamicMessage::deserialize_with_options(
            builder.descriptor(),
            tree,
            &deserialize_options(),
        )
        .map_err(|source| ParsingError::InvalidTree {
            body: body.to_string(),
            source,
        })?;

        merge(builder, parsed, body)
    }
}

impl ContentConverter for JsonConverter {
    fn content_type(&self) -> ContentType {
        ContentType::json()
    }

    /// JSON bodies are batched as arrays, so `index` is not needed to tell items apart.
    fn serialize(
        &self,
        _index: Option<usize>,
        message: &DynamicMessage,
    ) -> Result<String, ParsingError> {
        self.print(message)
    }

    fn pack_multiple(&self, items: &[String]) -> String {
        format!("[{}]", items.join(","))
    }

    /// The body is already text at this point, so `charset` plays no role.
    fn parse(
        &self,
        body: Option<&str>,
        _charset: Charset,
        builder: DynamicMessage,
    ) -> Result<DynamicMessage, ParsingError> {
        let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
            return Ok(builder);
        };

        let invalid = |source: serde_json::Error| ParsingError::InvalidTree {
            body: body.to_string(),
            source,
        };

        let mut deserializer = serde_json::Deserializer::from_str(body);
        let parsed = DynamicMessage::deserialize_with_options(
            builder.descriptor(),
            &mut deserializer,
            &deserialize_options(),
        )
        .map_err(invalid)?;
        deserializer.end().map_err(invalid)?;

        tracing::debug!(bytes = body.len(), "parsed JSON body");
        merge(builder, parsed, body)
    }
}

fn serialize_options() -> SerializeOptions {
    SerializeOptions::new().use_proto_field_name(true)
}

fn deserialize_options() -> DeserializeOptions {
    DeserializeOptions::new().deny_unknown_fields(true)
}

/// Merges `parsed` into `builder` with the usual Protobuf semantics: set scalars replace,
/// repeated fields append, nested messages merge.
fn merge(
    mut builder: DynamicMessage,
    parsed: DynamicMessage,
    body: &str,
) -> Result<DynamicMessage, ParsingError> {
    builder
        .merge(parsed.encode_to_vec().as_slice())
        .map_err(|source| ParsingError::Merge {
            body: body.to_string(),
            source,
        })?;
    Ok(builder)
}
