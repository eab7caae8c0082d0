use colored::*;
use grpcbridge_core::{
    Error, RpcMessage,
    prost_reflect::{FieldDescriptor, Kind, MessageDescriptor},
};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

/// The fields of a message that variables can be bound to.
pub struct BindablePaths(pub MessageDescriptor);

/// A serialized body together with the message it came from.
pub struct Output<'a>(pub &'a str, pub &'a RpcMessage);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        // Errors of the bridge carry the status they would be reported with.
        let status = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .map(|bridge| format!(" code={:?}", bridge.code()))
            .unwrap_or_default();

        FormattedString(format!(
            "{}{}\n\n'{:#}'",
            "Failed:".red().bold(),
            status.yellow(),
            err
        ))
    }
}

impl From<Output<'_>> for FormattedString {
    fn from(Output(body, message): Output<'_>) -> Self {
        FormattedString(format!(
            "{}\n{}\n\n{}\n{}",
            "Body:".cyan().bold(),
            body,
            "Message:".cyan().bold(),
            message
        ))
    }
}

impl From<BindablePaths> for FormattedString {
    fn from(BindablePaths(message): BindablePaths) -> Self {
        let mut paths = Vec::new();
        collect_paths(&message, "", &mut vec![message.full_name().to_string()], &mut paths);

        if paths.is_empty() {
            return FormattedString("No bindable fields found.".yellow().to_string());
        }

        let mut out = format!("Bindable fields of {}:\n", message.full_name().green());
        for (path, field) in paths {
            let label = if field.is_list() {
                format!("{} ", "repeated".cyan())
            } else {
                "".to_string()
            };
            out.push_str(&format!("  {}{} {}\n", label, kind_name(&field).yellow(), path));
        }
        FormattedString(out.trim_end().to_string())
    }
}

/// Collects the scalar and enum fields reachable through singular message fields.
///
/// `stack` holds the messages on the current path, recursive types are not expanded twice.
fn collect_paths(
    message: &MessageDescriptor,
    prefix: &str,
    stack: &mut Vec<String>,
    out: &mut Vec<(String, FieldDescriptor)>,
) {
    for field in message.fields() {
        let path = format!("{prefix}{}", field.name());
        match field.kind() {
            Kind::Message(nested) => {
                if field.is_list() || field.is_map() {
                    continue;
                }
                if stack.iter().any(|name| name == nested.full_name()) {
                    continue;
                }
                stack.push(nested.full_name().to_string());
                collect_paths(&nested, &format!("{path}."), stack, out);
                stack.pop();
            }
            _ => out.push((path, field)),
        }
    }
}

fn kind_name(field: &FieldDescriptor) -> String {
    match field.kind() {
        Kind::Double => "double".to_string(),
        Kind::Float => "float".to_string(),
        Kind::Int32 => "int32".to_string(),
        Kind::Int64 => "int64".to_string(),
        Kind::Uint32 => "uint32".to_string(),
        Kind::Uint64 => "uint64".to_string(),
        Kind::Sint32 => "sint32".to_string(),
        Kind::Sint64 => "sint64".to_string(),
        Kind::Fixed32 => "fixed32".to_string(),
        Kind::Fixed64 => "fixed64".to_string(),
        Kind::Sfixed32 => "sfixed32".to_string(),
        Kind::Sfixed64 => "sfixed64".to_string(),
        Kind::Bool => "bool".to_string(),
        Kind::String => "string".to_string(),
        Kind::Bytes => "bytes".to_string(),
        Kind::Message(m) => m.full_name().to_string(),
        Kind::Enum(e) => e.full_name().to_string(),
    }
}
