//! # CLI
//!
//! This module defines the command-line interface of `grpcbridge` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring headers are `key:value`);
use clap::{Parser, Subcommand, ValueEnum};
use grpcbridge_core::{Charset, ContentConverter, FormDataConverter, JsonConverter, Variable};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "grpcbridge",
    version,
    about = "Bind variables into Protobuf messages and transcode them"
)]
pub struct Cli {
    /// Path to the descriptor set (.bin) holding the message types
    pub file_descriptor_set: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bind variables into an empty message and print it
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// grpcbridge descriptors.bin bind my.pkg.GetRequest --var nested.id=7 --var tags=a --format form
    /// ```
    Bind {
        /// Fully qualified message name (e.g. my.package.Message)
        message: String,

        /// A variable to bind, as 'path.to.field=value'. Can be repeated.
        #[arg(long = "var", value_parser = parse_variable)]
        vars: Vec<Variable>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// Parse a body in one format and print it in another
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// grpcbridge descriptors.bin convert my.pkg.PostRequest --from form --to json --body 'name=a+b&id=1'
    /// ```
    Convert {
        /// Fully qualified message name (e.g. my.package.Message)
        message: String,

        #[arg(long, value_enum)]
        from: Format,

        #[arg(long, value_enum)]
        to: Format,

        /// The body to convert
        #[arg(long)]
        body: String,

        /// Charset of the input body
        #[arg(long, default_value = "UTF-8", value_parser = parse_charset)]
        charset: Charset,
    },

    /// List the fields of a message that variables can be bound to
    Describe {
        /// Fully qualified message name (e.g. my.package.Message)
        message: String,
    },
}

impl Commands {
    /// The message type every command operates on.
    pub fn message(&self) -> &str {
        match self {
            Commands::Bind { message, .. }
            | Commands::Convert { message, .. }
            | Commands::Describe { message } => message,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Form,
}

impl Format {
    pub fn converter(self) -> &'static dyn ContentConverter {
        match self {
            Format::Json => &JsonConverter,
            Format::Form => &FormDataConverter::DEFAULT,
        }
    }
}

fn parse_variable(value: &str) -> Result<Variable, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}

fn parse_charset(value: &str) -> Result<Charset, String> {
    value.parse().map_err(|e| format!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_command() {
        let cli = Cli::try_parse_from([
            "grpcbridge",
            "set.bin",
            "bind",
            "pkg.Msg",
            "--var",
            "nested.value=1",
            "--var",
            "tags=a",
            "--format",
            "form",
            "-H",
            "x-id: 42",
        ])
        .unwrap();

        assert_eq!(cli.file_descriptor_set, PathBuf::from("set.bin"));
        match cli.command {
            Commands::Bind {
                message,
                vars,
                format,
                headers,
            } => {
                assert_eq!(message, "pkg.Msg");
                assert_eq!(vars.len(), 2);
                assert_eq!(vars[0].field_path(), ["nested"]);
                assert_eq!(format, Format::Form);
                assert_eq!(headers, vec![("x-id".to_string(), "42".to_string())]);
            }
            _ => panic!("Expected the bind command"),
        }
    }

    #[test]
    fn test_parse_convert_command_rejects_unknown_charset() {
        let result = Cli::try_parse_from([
            "grpcbridge",
            "set.bin",
            "convert",
            "pkg.Msg",
            "--from",
            "form",
            "--to",
            "json",
            "--body",
            "a=1",
            "--charset",
            "EBCDIC",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_variable_requires_separator() {
        assert!(parse_variable("nested.value").is_err());
        assert!(parse_header("no-colon").is_err());
    }
}
