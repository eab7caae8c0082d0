//! # Test Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a descriptor set for the
//! messages used by the `grpcbridge` test suites (see `proto/test.proto`).
//! It is not intended for production use.
use prost_reflect::{DescriptorPool, MessageDescriptor};
use std::sync::OnceLock;

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/grpcbridge.test.rs"));
}

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");

pub const PACKAGE: &str = "grpcbridge.test";
pub const GET_REQUEST: &str = "grpcbridge.test.GetRequest";
pub const GET_RESPONSE: &str = "grpcbridge.test.GetResponse";
pub const POST_REQUEST: &str = "grpcbridge.test.PostRequest";
pub const REPEATED_REQUEST: &str = "grpcbridge.test.RepeatedRequest";
pub const WELL_KNOWN_REQUEST: &str = "grpcbridge.test.WellKnownRequest";
pub const NESTED: &str = "grpcbridge.test.Nested";

/// The pool holding the test schema, decoded once per process.
///
/// Messages only compare equal when their descriptors come from the same pool, so every
/// caller gets a handle to this one.
pub fn descriptor_pool() -> DescriptorPool {
    static POOL: OnceLock<DescriptorPool> = OnceLock::new();

    POOL.get_or_init(|| {
        DescriptorPool::decode(FILE_DESCRIPTOR_SET)
            .expect("Failed to decode the test descriptor set")
    })
    .clone()
}

/// Looks up a message of the test schema by its fully qualified name.
pub fn message(full_name: &str) -> MessageDescriptor {
    descriptor_pool()
        .get_message_by_name(full_name)
        .unwrap_or_else(|| panic!("Message '{full_name}' is not part of the test schema"))
}
