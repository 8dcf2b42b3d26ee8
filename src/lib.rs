#![deny(unsafe_code)]

//! Code generation for Temporal workflow and activity bindings.
//!
//! This crate is the core of `protoc-gen-temporal-go`, a protoc plugin that
//! reads a compiled protobuf service schema and emits, per RPC method, typed
//! Go bindings for invoking and implementing durable workflows and activities
//! on Temporal, plus an HTTP gateway exposing workflows over JSON.
//!
//! # The Pipeline
//!
//! ```text
//! CodeGeneratorRequest → schema → naming + symbols → declare → emit → .pb.go
//!   (protoc, stdin)     (model)    (per-file state)   (core)   (text)
//! ```
//!
//! - [`schema`] resolves `FileDescriptorProto`s into an immutable model:
//!   services, methods with an explicit workflow/activity kind, and type
//!   references with their Go identity.
//! - [`naming`] derives every emitted identifier and enforces collision-free,
//!   deterministic naming.
//! - [`symbols`] interns external Go symbols so each import path is aliased
//!   at most once per file, with a stable alias.
//! - [`declare`] builds the declaration set: typed clients, server
//!   interfaces, worker registration bindings, HTTP handlers.
//! - [`emit`] renders one Go source file per input proto file.
//!
//! Generation is a batch transform: a run either fully succeeds or fails
//! fast on the first schema or naming error, with no partial output. Given
//! the same request, output is reproducible byte-for-byte.

pub mod code_writer;
pub mod declare;
pub mod emit;
pub mod error;
pub mod naming;
pub mod plugin;
pub mod schema;
pub mod symbols;

pub use error::CodegenError;
