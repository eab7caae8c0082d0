//! # gRPC Bridge CLI Entry Point
//!
//! The main executable for the bridge tooling. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Sets up logging and parses command-line arguments using [`cli::Cli`].
//! 2. **Schema**: Loads the descriptor set and resolves the requested message type.
//! 3. **Execution**: Binds variables or transcodes bodies through `grpcbridge_core`.
//! 4. **Presentation**: Formats and prints the result or the error to standard output/error.

mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, Format};
use formatter::{BindablePaths, FormattedString, Output};
use grpcbridge_core::{
    Error, RpcMessage, Variable,
    prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor},
    tonic::metadata::{MetadataKey, MetadataMap, MetadataValue},
};
use std::{path::Path, process, str::FromStr};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Cli::parse();

    let descriptor = match load_message(&args.file_descriptor_set, args.command.message()) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Bind {
            vars,
            format,
            headers,
            ..
        } => run_bind(descriptor, &vars, format, headers),
        Commands::Convert {
            from,
            to,
            body,
            charset,
            ..
        } => run_convert(descriptor, from, to, &body, charset),
        Commands::Describe { .. } => {
            println!("{}", FormattedString::from(BindablePaths(descriptor)));
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{}", FormattedString::from(err));
        process::exit(1);
    }
}

fn load_message(path: &Path, name: &str) -> anyhow::Result<MessageDescriptor> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read descriptor set '{}'", path.display()))?;

    let pool = DescriptorPool::decode(bytes.as_slice())
        .with_context(|| format!("Invalid descriptor set '{}'", path.display()))?;

    tracing::debug!(files = pool.files().count(), "descriptor set loaded");

    pool.get_message_by_name(name)
        .with_context(|| format!("Message '{name}' not found in the descriptor set"))
}

fn run_bind(
    descriptor: MessageDescriptor,
    vars: &[Variable],
    format: Format,
    headers: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let mut message = RpcMessage::new(DynamicMessage::new(descriptor), build_metadata(headers)?);

    message
        .set_vars(vars)
        .map_err(Error::from)
        .context("Failed to bind variables")?;

    let body = format
        .converter()
        .serialize(None, message.body())
        .map_err(Error::from)?;

    println!("{}", FormattedString::from(Output(&body, &message)));
    Ok(())
}

fn run_convert(
    descriptor: MessageDescriptor,
    from: Format,
    to: Format,
    body: &str,
    charset: grpcbridge_core::Charset,
) -> anyhow::Result<()> {
    let parsed = from
        .converter()
        .parse(Some(body), charset, DynamicMessage::new(descriptor))
        .map_err(Error::from)
        .context("Failed to parse the body")?;

    let output = to
        .converter()
        .serialize(None, &parsed)
        .map_err(Error::from)
        .context("Failed to serialize the message")?;

    match to {
        Format::Json => {
            let value: serde_json::Value =
                serde_json::from_str(&output).context("Failed to read the serialized JSON")?;
            let pretty =
                serde_json::to_string_pretty(&value).context("Failed to pretty-print the JSON")?;
            println!("{pretty}");
        }
        Format::Form => println!("{output}"),
    }

    Ok(())
}

fn build_metadata(headers: Vec<(String, String)>) -> anyhow::Result<MetadataMap> {
    let mut metadata = MetadataMap::new();

    for (k, v) in headers {
        let key = MetadataKey::from_str(&k).with_context(|| format!("Invalid header name '{k}'"))?;
        let val =
            MetadataValue::from_str(&v).with_context(|| format!("Invalid value for header '{k}'"))?;
        metadata.insert(key, val);
    }

    Ok(metadata)
}
