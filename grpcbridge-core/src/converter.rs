//! # Content Converters
//!
//! A [`ContentConverter`] turns dynamic messages into wire bodies of one format and back.
//!
//! * **[`JsonConverter`]**: `application/json`, the tree converter the other formats build on.
//! * **[`FormDataConverter`]**: `application/x-www-form-urlencoded`.
//!
//! Converters hold no mutable state, a single instance can be shared by every request.
//! [`converter_for`] picks the shared instance matching a negotiated [`ContentType`].
mod content_type;
mod fan_out;
mod form;
mod json;
mod urlencoded;

pub use content_type::{Charset, ContentType, FORM_DATA, JSON};
pub use form::FormDataConverter;
pub use json::JsonConverter;
pub use urlencoded::UrlDecodeError;

use crate::error::ParsingError;
use prost_reflect::DynamicMessage;

/// A bidirectional adapter between dynamic messages and one wire format.
pub trait ContentConverter: Send + Sync {
    /// The media type and default charset this converter produces and consumes.
    fn content_type(&self) -> ContentType;

    /// Renders one message.
    ///
    /// When `index` is given the message is an element of a batch, and every key the format
    /// produces is rendered as `{key}[index]` so the joined batch stays unambiguous.
    fn serialize(
        &self,
        index: Option<usize>,
        message: &DynamicMessage,
    ) -> Result<String, ParsingError>;

    /// Joins already serialized items into a single batch body.
    fn pack_multiple(&self, items: &[String]) -> String;

    /// Parses `body` and merges its content into `builder`.
    ///
    /// An absent or empty body is not an error: `builder` is returned as it is.
    fn parse(
        &self,
        body: Option<&str>,
        charset: Charset,
        builder: DynamicMessage,
    ) -> Result<DynamicMessage, ParsingError>;

    /// Serializes every message with its position as index, then packs the results.
    fn serialize_batch(&self, messages: &[DynamicMessage]) -> Result<String, ParsingError> {
        let items = messages
            .iter()
            .enumerate()
            .map(|(index, message)| self.serialize(Some(index), message))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.pack_multiple(&items))
    }
}

/// Returns the shared converter for the media type of `content_type`, if there's one.
///
/// Form data converters encode with the negotiated charset.
pub fn converter_for(content_type: &ContentType) -> Option<&'static dyn ContentConverter> {
    match content_type.media_type() {
        FORM_DATA => Some(FormDataConverter::shared(content_type.charset())),
        JSON => Some(&JsonConverter),
        other => {
            tracing::debug!(media_type = other, "no converter for media type");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_reflect::Value;

    #[test]
    fn test_converter_for_known_media_types() {
        let form = converter_for(&"application/x-www-form-urlencoded".parse().unwrap()).unwrap();
        let json = converter_for(&ContentType::json()).unwrap();

        assert_eq!(form.content_type(), ContentType::form_data());
        assert_eq!(json.content_type(), ContentType::json());
        assert!(converter_for(&"text/plain".parse().unwrap()).is_none());
    }

    #[test]
    fn test_converter_for_keeps_negotiated_charset() {
        let negotiated: ContentType = "application/x-www-form-urlencoded; charset=ISO-8859-1"
            .parse()
            .unwrap();

        let form = converter_for(&negotiated).unwrap();

        assert_eq!(form.content_type(), negotiated);
        assert_eq!(form.content_type().charset(), Charset::Iso8859_1);
    }

    #[test]
    fn test_serialize_batch_indexes_items() {
        let descriptor = test_service::message(test_service::REPEATED_REQUEST);
        let messages: Vec<DynamicMessage> = ["x", "y"]
            .into_iter()
            .map(|name| {
                let mut message = DynamicMessage::new(descriptor.clone());
                message.set_field_by_name("name", Value::String(name.to_string()));
                message
            })
            .collect();

        let form = FormDataConverter::DEFAULT.serialize_batch(&messages).unwrap();
        let json = JsonConverter.serialize_batch(&messages).unwrap();

        assert_eq!(form, "{name}[0]=x&{name}[1]=y");
        assert_eq!(json, r#"[{"name":"x"},{"name":"y"}]"#);
    }
}
