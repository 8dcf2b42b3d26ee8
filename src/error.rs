//! Generation-time error taxonomy.
//!
//! Every variant is fatal to the whole run: the plugin reports the error
//! through the `CodeGeneratorResponse` and emits no partial files.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// The kind convention could not classify a method. Workflow methods
    /// carry a `Workflow` name suffix; stripping the suffix must leave a
    /// non-empty method name.
    #[error("{service}.{method}: method kind undetermined (empty name after kind suffix)")]
    KindUndetermined { service: String, method: String },

    /// A schema name would not survive as a Go identifier. Names are never
    /// silently mangled.
    #[error("{owner}: `{name}` is not a valid Go identifier")]
    InvalidIdentifier { owner: String, name: String },

    /// Workflows and activities are unary; streaming RPCs have no binding.
    #[error("{service}.{method}: streaming methods are not supported")]
    StreamingUnsupported { service: String, method: String },

    /// A method referenced a message type that is not defined by any file in
    /// the request.
    #[error("{service}.{method}: cannot resolve message type `{type_name}`")]
    UnresolvedType {
        service: String,
        method: String,
        type_name: String,
    },

    /// Two declarations would receive the same top-level identifier.
    #[error("duplicate declaration `{name}`: emitted for both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    /// Two workflow methods would be served under the same HTTP path.
    #[error("duplicate HTTP route `{path}`: emitted for both {first} and {second}")]
    RouteCollision {
        path: String,
        first: String,
        second: String,
    },

    /// Two methods would register under the same routing name with the
    /// worker.
    #[error("{service}: duplicate registration name `{name}`")]
    DuplicateRegistration { service: String, name: String },

    /// The code generator request on stdin was not a valid protobuf message.
    #[error("malformed code generator request: {0}")]
    Decode(#[from] prost::DecodeError),
}
