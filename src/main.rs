//! `protoc-gen-temporal-go`: protoc plugin entry point.
//!
//! protoc hands us a serialized `CodeGeneratorRequest` on stdin and expects
//! a `CodeGeneratorResponse` on stdout. Logging goes to stderr; stdout
//! belongs to the plugin protocol.

use std::io::{self, Read, Write};

use anyhow::Context;
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("reading code generator request from stdin")?;
    let request = CodeGeneratorRequest::decode(input.as_slice())
        .context("decoding code generator request")?;

    let response = temporal_codegen::plugin::respond(&request);

    let mut output = Vec::with_capacity(response.encoded_len());
    response
        .encode(&mut output)
        .context("encoding code generator response")?;
    io::stdout()
        .write_all(&output)
        .context("writing code generator response to stdout")?;
    Ok(())
}
