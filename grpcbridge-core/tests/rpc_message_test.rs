use grpcbridge_core::{
    BindError, ConfigurationError, RpcMessage, ValidationError, Variable,
    prost_reflect::{DynamicMessage, Value},
};
use std::sync::Arc;
use test_service::{GET_REQUEST, REPEATED_REQUEST};

fn request(name: &str) -> RpcMessage {
    RpcMessage::empty(test_service::message(name))
}

fn field(message: &DynamicMessage, path: &str) -> Value {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (parents.split('.').collect::<Vec<_>>(), leaf),
        None => (vec![], path),
    };

    let mut current = message.clone();
    for parent in parents {
        current = current
            .get_field_by_name(parent)
            .and_then(|v| v.as_message().cloned())
            .expect("Parent is not a message");
    }
    current
        .get_field_by_name(leaf)
        .expect("Field not found")
        .into_owned()
}

#[test]
fn test_set_var_on_every_scalar_kind() {
    let mut message = request(GET_REQUEST);

    let vars = [
        ("string_field", "a b"),
        ("int_field", "-3"),
        ("long_field", "123456789012"),
        ("float_field", "0.5"),
        ("double_field", "1e3"),
        ("bool_field", "True"),
        ("enum_field", "FOO"),
        ("bytes_field", "raw"),
        ("uint_field", "9"),
    ];
    for (name, value) in vars {
        message.set_var(&Variable::dotted(name, value)).unwrap();
    }

    let body = message.body();
    assert_eq!(field(body, "string_field"), Value::String("a b".to_string()));
    assert_eq!(field(body, "int_field"), Value::I32(-3));
    assert_eq!(field(body, "long_field"), Value::I64(123_456_789_012));
    assert_eq!(field(body, "float_field"), Value::F32(0.5));
    assert_eq!(field(body, "double_field"), Value::F64(1000.0));
    assert_eq!(field(body, "bool_field"), Value::Bool(true));
    assert_eq!(field(body, "enum_field"), Value::EnumNumber(1));
    assert_eq!(field(body, "bytes_field").as_bytes().unwrap().as_ref(), b"raw");
    assert_eq!(field(body, "uint_field"), Value::U32(9));
}

#[test]
fn test_singular_field_last_write_wins() {
    let mut message = request(GET_REQUEST);

    message.set_var(&Variable::dotted("int_field", "1")).unwrap();
    message.set_var(&Variable::dotted("int_field", "2")).unwrap();

    assert_eq!(field(message.body(), "int_field"), Value::I32(2));
}

#[test]
fn test_same_value_twice_is_idempotent() {
    let mut message = request(GET_REQUEST);
    let var = Variable::dotted("nested.nested_field", "same");

    message.set_var(&var).unwrap();
    let once = message.body().clone();
    message.set_var(&var).unwrap();

    assert_eq!(**message.body(), *once);
}

#[test]
fn test_repeated_field_accumulates_in_order() {
    let mut message = request(REPEATED_REQUEST);

    for value in ["3", "1", "2", "1"] {
        message.set_var(&Variable::dotted("a", value)).unwrap();
    }

    assert_eq!(
        field(message.body(), "a"),
        Value::List(vec![
            Value::I32(3),
            Value::I32(1),
            Value::I32(2),
            Value::I32(1)
        ])
    );
}

#[test]
fn test_nested_messages_are_reused() {
    let mut message = request(GET_REQUEST);

    message
        .set_var(&Variable::dotted("nested.nested_field", "x"))
        .unwrap();
    message
        .set_var(&Variable::dotted("nested.deep.value", "5"))
        .unwrap();
    message
        .set_var(&Variable::dotted("nested.tags", "t1"))
        .unwrap();

    let body = message.body();
    assert_eq!(field(body, "nested.nested_field"), Value::String("x".to_string()));
    assert_eq!(field(body, "nested.deep.value"), Value::I32(5));
    assert_eq!(
        field(body, "nested.tags"),
        Value::List(vec![Value::String("t1".to_string())])
    );
}

#[test]
fn test_previous_snapshot_is_not_mutated() {
    let mut message = request(GET_REQUEST);
    message.set_var(&Variable::dotted("int_field", "1")).unwrap();
    let before = Arc::clone(message.body());

    message.set_var(&Variable::dotted("int_field", "2")).unwrap();

    assert_eq!(field(&before, "int_field"), Value::I32(1));
    assert_eq!(field(message.body(), "int_field"), Value::I32(2));
    assert!(!Arc::ptr_eq(&before, message.body()));
}

#[test]
fn test_unknown_path_segment_is_atomic_configuration_error() {
    let mut message = request(GET_REQUEST);
    message.set_var(&Variable::dotted("int_field", "1")).unwrap();
    let before = Arc::clone(message.body());

    let err = message
        .set_var(&Variable::dotted("nested.ghost.value", "1"))
        .unwrap_err();

    match err {
        BindError::Configuration(ConfigurationError::UnknownPathSegment { segment, variable }) => {
            assert_eq!(segment, "ghost");
            assert_eq!(variable, "nested.ghost.value=1");
        }
        other => panic!("Unexpected error: {other}"),
    }
    assert!(Arc::ptr_eq(&before, message.body()));
    assert!(!message.body().has_field_by_name("nested"));
}

#[test]
fn test_unknown_leaf_is_configuration_error() {
    let mut message = request(GET_REQUEST);

    let err = message
        .set_var(&Variable::dotted("nested.ghost", "1"))
        .unwrap_err();

    assert!(matches!(
        err,
        BindError::Configuration(ConfigurationError::UnknownField { field, message, .. })
            if field == "ghost" && message == test_service::NESTED
    ));
}

#[test]
fn test_message_leaves_are_rejected_before_coercion() {
    let mut message = request(GET_REQUEST);

    for path in ["nested", "nested.deep", "labels", "nested_list"] {
        let err = message.set_var(&Variable::dotted(path, "x")).unwrap_err();
        assert!(
            matches!(
                err,
                BindError::Configuration(ConfigurationError::MessageLeaf { .. })
            ),
            "{path} should not be bindable"
        );
    }
}

#[test]
fn test_non_message_and_repeated_segments_are_rejected() {
    let mut message = request(GET_REQUEST);

    for path in ["string_field.value", "nested_list.nested_field", "labels.key"] {
        let err = message.set_var(&Variable::dotted(path, "x")).unwrap_err();
        assert!(
            matches!(
                err,
                BindError::Configuration(ConfigurationError::NotAMessageSegment { .. })
            ),
            "{path} should not be traversable"
        );
    }
}

#[test]
fn test_coercion_failure_is_atomic_validation_error() {
    let mut message = request(GET_REQUEST);
    let before = Arc::clone(message.body());

    let err = message
        .set_var(&Variable::dotted("nested.deep.value", "five"))
        .unwrap_err();

    assert!(matches!(
        err,
        BindError::Validation(ValidationError::Mismatch { expected: "int32", .. })
    ));
    assert!(Arc::ptr_eq(&before, message.body()));
}

#[test]
fn test_set_vars_builds_a_single_snapshot() {
    let mut message = request(REPEATED_REQUEST);
    let vars = [
        Variable::dotted("a", "1"),
        Variable::dotted("name", "n"),
        Variable::dotted("a", "2"),
    ];

    message.set_vars(&vars).unwrap();

    assert_eq!(
        field(message.body(), "a"),
        Value::List(vec![Value::I32(1), Value::I32(2)])
    );
    assert_eq!(field(message.body(), "name"), Value::String("n".to_string()));
}

#[test]
fn test_set_vars_failure_keeps_previous_body() {
    let mut message = request(REPEATED_REQUEST);
    let before = Arc::clone(message.body());
    let vars = [Variable::dotted("a", "1"), Variable::dotted("missing", "2")];

    assert!(message.set_vars(&vars).is_err());
    assert!(Arc::ptr_eq(&before, message.body()));
}

#[test]
fn test_typed_variables() {
    let mut message = request(GET_REQUEST);

    message
        .set_var(&Variable::new(["nested", "deep"], "value", Value::I32(11)))
        .unwrap();
    let err = message
        .set_var(&Variable::new(
            Vec::<String>::new(),
            "bool_field",
            Value::String("true".to_string()),
        ))
        .unwrap_err();

    assert_eq!(field(message.body(), "nested.deep.value"), Value::I32(11));
    assert!(matches!(
        err,
        BindError::Validation(ValidationError::InvalidTypedValue { .. })
    ));
}
