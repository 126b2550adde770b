//! Generated protobuf and gRPC bindings for the `conduit.v1` wire schema.
//!
//! Produced by `tonic-prost-build` from `proto/conduit.proto`; see
//! `build.rs`. Payload values use the protobuf well-known
//! `google.protobuf.Value`, surfaced here as [`prost_types::Value`].

#![allow(missing_docs, clippy::pedantic)]

tonic::include_proto!("conduit.v1");
