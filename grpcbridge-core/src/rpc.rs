//! # RPC Messages
//!
//! An [`RpcMessage`] is a request or a response on its way through the bridge: the Protobuf
//! body plus the headers (or trailers) metadata that travels with it.
use crate::{binder, converter::JsonConverter, error::BindError, variable::Variable};
use prost_reflect::{DynamicMessage, MessageDescriptor};
use std::{fmt, sync::Arc};
use tonic::metadata::MetadataMap;

/// A request or response body paired with its metadata.
///
/// The body is an immutable snapshot. [`RpcMessage::set_var`] never changes it in place, it
/// replaces it with a new snapshot, so clones of the previous [`Arc`] keep seeing the old
/// content.
#[derive(Debug, Clone)]
pub struct RpcMessage {
    body: Arc<DynamicMessage>,
    metadata: MetadataMap,
}

impl RpcMessage {
    pub fn new(body: DynamicMessage, metadata: MetadataMap) -> Self {
        Self {
            body: Arc::new(body),
            metadata,
        }
    }

    /// An empty message of the given type, without metadata.
    pub fn empty(descriptor: MessageDescriptor) -> Self {
        Self::new(DynamicMessage::new(descriptor), MetadataMap::new())
    }

    /// The current body snapshot.
    pub fn body(&self) -> &Arc<DynamicMessage> {
        &self.body
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    /// Applies a variable to the body.
    ///
    /// On failure the current body is left as it was.
    pub fn set_var(&mut self, variable: &Variable) -> Result<(), BindError> {
        self.body = Arc::new(binder::apply(&self.body, variable)?);
        Ok(())
    }

    /// Applies several variables, in order, producing a single new snapshot.
    ///
    /// Either every variable is applied or the body is left as it was.
    pub fn set_vars<'a, I>(&mut self, variables: I) -> Result<(), BindError>
    where
        I: IntoIterator<Item = &'a Variable>,
    {
        self.body = Arc::new(binder::apply_all(&self.body, variables)?);
        Ok(())
    }

    pub fn into_parts(self) -> (Arc<DynamicMessage>, MetadataMap) {
        (self.body, self.metadata)
    }
}

impl fmt::Display for RpcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match JsonConverter.print(&self.body) {
            Ok(json) => write!(f, "{{{}}} {:?}", json, self.metadata),
            Err(_) => write!(f, "{{{:?}}} {:?}", self.body, self.metadata),
        }
    }
}
