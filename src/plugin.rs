//! protoc plugin protocol.
//!
//! Drives the whole pipeline for one `CodeGeneratorRequest` and shapes the
//! result as a `CodeGeneratorResponse`. Generation-time errors abort the
//! run through the response's `error` field; no partial files are emitted.

use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use tracing::debug;

use crate::error::CodegenError;
use crate::symbols::ImportTable;
use crate::{declare, emit, schema};

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

/// Run the pipeline: one output file per requested proto file that declares
/// at least one service. Each file gets a fresh symbol table and naming
/// state.
pub fn generate(request: &CodeGeneratorRequest) -> Result<Vec<GeneratedFile>, CodegenError> {
    let files = schema::resolve_files(&request.proto_file, &request.file_to_generate)?;
    let mut out = Vec::with_capacity(files.len());
    for file in &files {
        let mut imports = ImportTable::new();
        let decls = declare::build_file(file, &mut imports)?;
        let content = emit::render_file(file, &decls, &imports);
        debug!(
            source = %file.proto_path,
            services = file.services.len(),
            declarations = decls.len(),
            "generated bindings"
        );
        out.push(GeneratedFile {
            name: output_name(&file.proto_path),
            content,
        });
    }
    Ok(out)
}

/// Build the wire response. Errors become the response's `error` field, the
/// protoc-side convention for aborting a generation run.
pub fn respond(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };
    match generate(request) {
        Ok(files) => {
            response.file = files
                .into_iter()
                .map(|f| File {
                    name: Some(f.name),
                    content: Some(f.content),
                    ..Default::default()
                })
                .collect();
        }
        Err(err) => response.error = Some(err.to_string()),
    }
    response
}

fn output_name(proto_path: &str) -> String {
    let stem = proto_path.strip_suffix(".proto").unwrap_or(proto_path);
    format!("{}_temporal.pb.go", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_sit_next_to_the_proto() {
        assert_eq!(
            output_name("example/greeter.proto"),
            "example/greeter_temporal.pb.go"
        );
        assert_eq!(output_name("odd"), "odd_temporal.pb.go");
    }
}
