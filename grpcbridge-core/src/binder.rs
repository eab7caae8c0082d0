//! # Variable Binder
//!
//! Applies [`Variable`]s to dynamic messages by walking their descriptors at runtime.
//!
//! ## How it works
//!
//! 1. The current snapshot is cloned into a builder, the snapshot itself is never touched.
//! 2. Each path segment must name a singular message field. The nested message is created if
//!    it is unset, or reused if it already holds data.
//! 3. The leaf field is resolved on the last message reached and the raw value is coerced
//!    to its kind. Repeated fields get the value appended, singular fields get it replaced.
//!
//! Any failure discards the builder, so callers either get a complete new snapshot or an error.
use crate::{
    error::{BindError, ConfigurationError, ValidationError},
    variable::{Variable, VariableValue},
};
use prost::bytes::Bytes;
use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, ReflectMessage, Value};

/// Applies `variable` to a copy of `message` and returns the copy.
pub fn apply(message: &DynamicMessage, variable: &Variable) -> Result<DynamicMessage, BindError> {
    apply_all(message, std::iter::once(variable))
}

/// Applies every variable, in order, to a single copy of `message`.
///
/// Either all of them are applied or the error of the first failing one is returned.
pub fn apply_all<'a, I>(message: &DynamicMessage, variables: I) -> Result<DynamicMessage, BindError>
where
    I: IntoIterator<Item = &'a Variable>,
{
    let descriptor = message.descriptor();
    let mut builder = message.clone();
    for variable in variables {
        bind(&mut builder, variable)?;
        tracing::debug!(message = descriptor.full_name(), %variable, "variable bound");
    }
    Ok(builder)
}

fn bind(builder: &mut DynamicMessage, variable: &Variable) -> Result<(), BindError> {
    let target = descend(builder, variable)?;
    let descriptor = target.descriptor();

    let field = descriptor
        .get_field_by_name(variable.field_name())
        .ok_or_else(|| ConfigurationError::UnknownField {
            variable: variable.to_string(),
            field: variable.field_name().to_string(),
            message: descriptor.full_name().to_string(),
        })?;

    if field.is_map() || matches!(field.kind(), Kind::Message(_)) {
        return Err(ConfigurationError::MessageLeaf {
            variable: variable.to_string(),
            field: field.full_name().to_string(),
        }
        .into());
    }

    let value = coerce(&field, variable.value())?;

    if field.is_list() {
        if let Value::List(items) = target.get_field_mut(&field) {
            items.push(value);
        }
    } else {
        target
            .try_set_field(&field, value)
            .map_err(|e| ValidationError::InvalidTypedValue {
                field: field.full_name().to_string(),
                value: e.to_string(),
            })?;
    }

    Ok(())
}

/// Walks the variable's path, creating the nested messages that are not set yet.
fn descend<'a>(
    builder: &'a mut DynamicMessage,
    variable: &Variable,
) -> Result<&'a mut DynamicMessage, ConfigurationError> {
    let mut current = builder;

    for segment in variable.field_path() {
        let not_a_message = || ConfigurationError::NotAMessageSegment {
            variable: variable.to_string(),
            segment: segment.clone(),
        };

        let field = current
            .descriptor()
            .get_field_by_name(segment)
            .ok_or_else(|| ConfigurationError::UnknownPathSegment {
                variable: variable.to_string(),
                segment: segment.clone(),
            })?;

        // Repeated and map fields hold many messages, there's no way to pick one.
        if field.is_list() || field.is_map() || !matches!(field.kind(), Kind::Message(_)) {
            return Err(not_a_message());
        }

        current = current
            .get_field_mut(&field)
            .as_message_mut()
            .ok_or_else(not_a_message)?;
    }

    Ok(current)
}

/// Converts a variable value into a value of the field's kind.
pub fn coerce(field: &FieldDescriptor, value: &VariableValue) -> Result<Value, ValidationError> {
    match value {
        VariableValue::Raw(raw) => coerce_text(field, raw),
        VariableValue::Typed(typed) if typed.is_valid(&field.kind()) => Ok(typed.clone()),
        VariableValue::Typed(typed) => Err(ValidationError::InvalidTypedValue {
            field: field.full_name().to_string(),
            value: format!("{typed:?}"),
        }),
    }
}

fn coerce_text(field: &FieldDescriptor, raw: &str) -> Result<Value, ValidationError> {
    let mismatch = |expected: &'static str| ValidationError::Mismatch {
        field: field.full_name().to_string(),
        value: raw.to_string(),
        expected,
    };

    match field.kind() {
        Kind::Double => raw.parse().map(Value::F64).map_err(|_| mismatch("double")),
        Kind::Float => raw.parse().map(Value::F32).map_err(|_| mismatch("float")),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            raw.parse().map(Value::I32).map_err(|_| mismatch("int32"))
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            raw.parse().map(Value::I64).map_err(|_| mismatch("int64"))
        }
        Kind::Uint32 | Kind::Fixed32 => raw.parse().map(Value::U32).map_err(|_| mismatch("uint32")),
        Kind::Uint64 | Kind::Fixed64 => raw.parse().map(Value::U64).map_err(|_| mismatch("uint64")),
        Kind::Bool => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(mismatch("bool"))
            }
        }
        Kind::String => Ok(Value::String(raw.to_string())),
        Kind::Bytes => Ok(Value::Bytes(Bytes::copy_from_slice(raw.as_bytes()))),
        Kind::Enum(enum_desc) => enum_desc
            .get_value_by_name(raw)
            .map(|v| Value::EnumNumber(v.number()))
            .ok_or_else(|| ValidationError::UnknownEnumValue {
                field: field.full_name().to_string(),
                value: raw.to_string(),
                enum_name: enum_desc.full_name().to_string(),
            }),
        Kind::Message(_) => Err(mismatch("scalar")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_reflect::MessageDescriptor;

    fn get_request() -> MessageDescriptor {
        test_service::message(test_service::GET_REQUEST)
    }

    fn field(name: &str) -> FieldDescriptor {
        get_request()
            .get_field_by_name(name)
            .expect("Field not found")
    }

    fn raw(value: &str) -> VariableValue {
        VariableValue::Raw(value.to_string())
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce(&field("int_field"), &raw("-7")).unwrap(), Value::I32(-7));
        assert_eq!(
            coerce(&field("long_field"), &raw("9000000000")).unwrap(),
            Value::I64(9_000_000_000)
        );
        assert_eq!(coerce(&field("uint_field"), &raw("7")).unwrap(), Value::U32(7));
        assert_eq!(coerce(&field("float_field"), &raw("1.5")).unwrap(), Value::F32(1.5));
        assert_eq!(coerce(&field("double_field"), &raw("2.25")).unwrap(), Value::F64(2.25));
    }

    #[test]
    fn test_coerce_rejects_non_numeric_and_out_of_range_text() {
        for (name, text) in [
            ("int_field", "seven"),
            ("int_field", "3000000000"),
            ("uint_field", "-1"),
            ("double_field", "1,5"),
        ] {
            let err = coerce(&field(name), &raw(text)).unwrap_err();
            assert!(
                matches!(err, ValidationError::Mismatch { .. }),
                "{name}={text} should not coerce"
            );
        }
    }

    #[test]
    fn test_coerce_bool_is_case_insensitive() {
        assert_eq!(coerce(&field("bool_field"), &raw("TRUE")).unwrap(), Value::Bool(true));
        assert_eq!(coerce(&field("bool_field"), &raw("False")).unwrap(), Value::Bool(false));
        assert!(coerce(&field("bool_field"), &raw("yes")).is_err());
    }

    #[test]
    fn test_coerce_enum_by_name() {
        assert_eq!(
            coerce(&field("enum_field"), &raw("BAR")).unwrap(),
            Value::EnumNumber(2)
        );

        let err = coerce(&field("enum_field"), &raw("bar")).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownEnumValue { .. }));
    }

    #[test]
    fn test_coerce_text_kinds() {
        assert_eq!(
            coerce(&field("string_field"), &raw("a b")).unwrap(),
            Value::String("a b".to_string())
        );
        assert_eq!(
            coerce(&field("bytes_field"), &raw("héllo")).unwrap(),
            Value::Bytes(Bytes::from("héllo".as_bytes().to_vec()))
        );
    }

    #[test]
    fn test_coerce_typed_values_must_match_kind() {
        let typed = VariableValue::Typed(Value::I32(3));

        assert_eq!(coerce(&field("int_field"), &typed).unwrap(), Value::I32(3));
        // the element kind is what matters for repeated fields
        assert_eq!(coerce(&field("repeated_field"), &typed).unwrap(), Value::I32(3));

        let err = coerce(&field("string_field"), &typed).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTypedValue { .. }));
    }

    #[test]
    fn test_apply_creates_nested_messages_on_demand() {
        let message = DynamicMessage::new(get_request());
        let var = Variable::dotted("nested.deep.value", "5");

        let bound = apply(&message, &var).unwrap();

        let nested = bound.get_field_by_name("nested").unwrap();
        let deep = nested.as_message().unwrap().get_field_by_name("deep").unwrap();
        let value = deep.as_message().unwrap().get_field_by_name("value").unwrap();
        assert_eq!(value.as_i32(), Some(5));
        // the source snapshot is untouched
        assert!(!message.has_field_by_name("nested"));
    }

    #[test]
    fn test_apply_all_is_all_or_nothing() {
        let message = DynamicMessage::new(get_request());
        let vars = [
            Variable::dotted("string_field", "ok"),
            Variable::dotted("int_field", "not a number"),
        ];

        let err = apply_all(&message, &vars).unwrap_err();

        assert!(matches!(err, BindError::Validation(_)));
        assert!(!message.has_field_by_name("string_field"));
    }
}
