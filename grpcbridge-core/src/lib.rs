//! # gRPC Bridge Core
//!
//! `grpcbridge-core` is the part of an HTTP to gRPC gateway that deals with message content.
//! It works with `prost_reflect::DynamicMessage`, so it doesn't need compile-time knowledge
//! of the Protobuf schema.
//!
//! ## Key Components
//!
//! * **[`RpcMessage`]:** A request or response body together with its metadata. Variables
//!   produced by a router are applied to it with [`RpcMessage::set_var`].
//! * **[`Variable`]:** One binding: a path of nested message fields, a leaf field and a value.
//! * **[`binder`]:** Walks message descriptors to coerce and set variable values.
//! * **[`ContentConverter`]:** Converts messages to and from a wire format. The crate ships a
//!   [`JsonConverter`] and a [`FormDataConverter`] built on top of it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use grpcbridge_core::{ContentConverter, FormDataConverter, RpcMessage, Variable};
//! # fn run(descriptor: grpcbridge_core::prost_reflect::MessageDescriptor) -> Result<(), grpcbridge_core::Error> {
//! let mut request = RpcMessage::empty(descriptor);
//! request.set_var(&Variable::dotted("nested.nested_field", "hello"))?;
//! request.set_var(&Variable::dotted("int_field", "7"))?;
//!
//! let body = FormDataConverter::DEFAULT.serialize(None, request.body())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! See [`error`]: configuration errors are server-side wiring defects, validation and parsing
//! errors are the caller's fault. [`Error`] converts into a `tonic::Status` with the right code.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod binder;
pub mod converter;
pub mod error;
pub mod rpc;
pub mod variable;

pub use converter::{
    Charset, ContentConverter, ContentType, FormDataConverter, JsonConverter, converter_for,
};
pub use error::{BindError, ConfigurationError, Error, ParsingError, ValidationError};
pub use rpc::RpcMessage;
pub use variable::{Variable, VariableValue};

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;
