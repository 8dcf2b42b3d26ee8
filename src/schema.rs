//! Schema Model.
//!
//! Resolves the `FileDescriptorProto`s of a code generator request into the
//! immutable model the rest of the pipeline consumes: files, services, and
//! methods with an explicit workflow/activity kind and Go type identity for
//! every message reference. All ordering is schema declaration order.

use std::collections::BTreeMap;

use prost_types::{DescriptorProto, FileDescriptorProto};

use crate::error::CodegenError;
use crate::naming;
use crate::symbols::paths;

/// The well-known single-string wrapper that takes the `wrapperspb.String`
/// marshaling path instead of generic message encoding.
const STRING_WRAPPER: &str = "google.protobuf.StringValue";

/// Every method belongs to exactly one kind, resolved once at ingestion.
///
/// The convention: a method whose name ends in `Workflow` is a workflow
/// method; any other method is an activity. The kind suffix (`Workflow`,
/// or `Activity` when a schema spells it out) is stripped from the emitted
/// method name, so proto `HelloWorkflow` becomes client method `Hello`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Workflow,
    Activity,
}

/// A resolved reference to a message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Fully-qualified proto name, without the leading dot.
    pub proto_name: String,
    /// Go type name within its package (nested messages join with `_`).
    pub go_name: String,
    /// Go import path of the package defining the type.
    pub import_path: String,
    /// Declared Go package name, used as the import alias when the type
    /// lives outside the file being generated.
    pub go_package_name: String,
    /// Marks `google.protobuf.StringValue`.
    pub string_wrapper: bool,
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Name as declared in the schema, e.g. `HelloWorkflow`. Used for
    /// routing keys.
    pub proto_name: String,
    /// Emitted method name with the kind suffix stripped, e.g. `Hello`.
    pub name: String,
    pub kind: MethodKind,
    pub input: TypeRef,
    pub output: TypeRef,
}

#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub name: String,
    pub methods: Vec<MethodSpec>,
}

impl ServiceSpec {
    pub fn methods_of(&self, kind: MethodKind) -> impl Iterator<Item = &MethodSpec> {
        self.methods.iter().filter(move |m| m.kind == kind)
    }

    pub fn has_kind(&self, kind: MethodKind) -> bool {
        self.methods.iter().any(|m| m.kind == kind)
    }
}

#[derive(Debug, Clone)]
pub struct FileSpec {
    /// Proto source path, e.g. `example/greeter.proto`.
    pub proto_path: String,
    /// Short Go package name for the `package` clause.
    pub go_package_name: String,
    /// Go import path of the generated package.
    pub go_import_path: String,
    pub services: Vec<ServiceSpec>,
}

impl FileSpec {
    /// Stem of the proto file name, used to scope per-file unexported
    /// helpers.
    pub fn stem(&self) -> String {
        let base = self
            .proto_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.proto_path);
        base.strip_suffix(".proto").unwrap_or(base).to_string()
    }
}

/// Message-type registry across every file in the request.
#[derive(Debug, Default)]
struct TypeRegistry {
    /// proto fully-qualified name (no leading dot) → Go identity.
    types: BTreeMap<String, GoIdentity>,
}

#[derive(Debug, Clone)]
struct GoIdentity {
    import_path: String,
    package_name: String,
    go_name: String,
}

impl TypeRegistry {
    fn from_files(files: &[FileDescriptorProto]) -> Self {
        let mut registry = Self::default();
        for file in files {
            let (import_path, package_name) = go_package_of(file);
            let proto_prefix = if file.package().is_empty() {
                String::new()
            } else {
                format!("{}.", file.package())
            };
            for message in &file.message_type {
                registry.visit(message, &proto_prefix, "", &import_path, &package_name);
            }
        }
        registry
    }

    fn visit(
        &mut self,
        message: &DescriptorProto,
        proto_prefix: &str,
        go_prefix: &str,
        import_path: &str,
        package_name: &str,
    ) {
        let proto_name = format!("{}{}", proto_prefix, message.name());
        let go_name = format!("{}{}", go_prefix, message.name());
        self.types.insert(
            proto_name.clone(),
            GoIdentity {
                import_path: import_path.to_string(),
                package_name: package_name.to_string(),
                go_name: go_name.clone(),
            },
        );
        for nested in &message.nested_type {
            // protoc-gen-go flattens nesting with underscores.
            self.visit(
                nested,
                &format!("{}.", proto_name),
                &format!("{}_", go_name),
                import_path,
                package_name,
            );
        }
    }

    fn resolve(
        &self,
        service: &str,
        method: &str,
        proto_type: &str,
    ) -> Result<TypeRef, CodegenError> {
        let name = proto_type.strip_prefix('.').unwrap_or(proto_type);
        if name == STRING_WRAPPER {
            return Ok(TypeRef {
                proto_name: name.to_string(),
                go_name: "StringValue".to_string(),
                import_path: paths::WRAPPERSPB.to_string(),
                go_package_name: "wrapperspb".to_string(),
                string_wrapper: true,
            });
        }
        let identity = self
            .types
            .get(name)
            .ok_or_else(|| CodegenError::UnresolvedType {
                service: service.to_string(),
                method: method.to_string(),
                type_name: name.to_string(),
            })?;
        Ok(TypeRef {
            proto_name: name.to_string(),
            go_name: identity.go_name.clone(),
            import_path: identity.import_path.clone(),
            go_package_name: identity.package_name.clone(),
            string_wrapper: false,
        })
    }
}

/// Derive (import path, package name) from the file's `go_package` option,
/// falling back to the proto package when the option is absent.
fn go_package_of(file: &FileDescriptorProto) -> (String, String) {
    if let Some(go_package) = file.options.as_ref().and_then(|o| o.go_package.as_deref()) {
        if let Some((path, name)) = go_package.split_once(';') {
            return (path.to_string(), name.to_string());
        }
        let name = go_package.rsplit('/').next().unwrap_or(go_package);
        return (go_package.to_string(), name.replace(['.', '-'], "_"));
    }
    if file.package().is_empty() {
        let stem = {
            let base = file.name().rsplit('/').next().unwrap_or_else(|| file.name());
            base.strip_suffix(".proto").unwrap_or(base).to_string()
        };
        (stem.clone(), stem.replace(['.', '-'], "_"))
    } else {
        (
            file.package().replace('.', "/"),
            file.package().replace('.', "_"),
        )
    }
}

/// Classify a method and strip the kind suffix from its emitted name.
fn classify(service: &str, proto_name: &str) -> Result<(MethodKind, String), CodegenError> {
    let (kind, stem) = if let Some(stem) = proto_name.strip_suffix("Workflow") {
        (MethodKind::Workflow, stem)
    } else if let Some(stem) = proto_name.strip_suffix("Activity") {
        (MethodKind::Activity, stem)
    } else {
        (MethodKind::Activity, proto_name)
    };
    if stem.is_empty() {
        return Err(CodegenError::KindUndetermined {
            service: service.to_string(),
            method: proto_name.to_string(),
        });
    }
    Ok((kind, stem.to_string()))
}

/// Resolve the files named in `targets` into [`FileSpec`]s, consulting every
/// file in the request for type definitions. Files with no services produce
/// no output.
pub fn resolve_files(
    all_files: &[FileDescriptorProto],
    targets: &[String],
) -> Result<Vec<FileSpec>, CodegenError> {
    let registry = TypeRegistry::from_files(all_files);
    let mut specs = Vec::new();

    for file in all_files {
        if !targets.iter().any(|t| t == file.name()) || file.service.is_empty() {
            continue;
        }
        let (go_import_path, go_package_name) = go_package_of(file);

        let mut services = Vec::new();
        for service in &file.service {
            let service_name = service.name().to_string();
            naming::ensure_go_ident(&service_name, &service_name)?;

            let mut methods = Vec::new();
            for method in &service.method {
                let proto_name = method.name().to_string();
                let owner = format!("{}.{}", service_name, proto_name);
                naming::ensure_go_ident(&owner, &proto_name)?;
                if method.client_streaming() || method.server_streaming() {
                    return Err(CodegenError::StreamingUnsupported {
                        service: service_name.clone(),
                        method: proto_name,
                    });
                }
                let (kind, name) = classify(&service_name, &proto_name)?;
                let input = registry.resolve(&service_name, &proto_name, method.input_type())?;
                let output = registry.resolve(&service_name, &proto_name, method.output_type())?;
                methods.push(MethodSpec {
                    proto_name,
                    name,
                    kind,
                    input,
                    output,
                });
            }
            services.push(ServiceSpec {
                name: service_name,
                methods,
            });
        }

        specs.push(FileSpec {
            proto_path: file.name().to_string(),
            go_package_name,
            go_import_path,
            services,
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_suffix_marks_the_kind_and_is_stripped() {
        let (kind, name) = classify("Greeter", "HelloWorkflow").unwrap();
        assert_eq!(kind, MethodKind::Workflow);
        assert_eq!(name, "Hello");
    }

    #[test]
    fn unsuffixed_methods_are_activities() {
        let (kind, name) = classify("Greeter", "SayHello").unwrap();
        assert_eq!(kind, MethodKind::Activity);
        assert_eq!(name, "SayHello");
    }

    #[test]
    fn explicit_activity_suffix_is_stripped() {
        let (kind, name) = classify("Greeter", "SayHelloActivity").unwrap();
        assert_eq!(kind, MethodKind::Activity);
        assert_eq!(name, "SayHello");
    }

    #[test]
    fn bare_kind_suffix_is_undetermined() {
        let err = classify("Greeter", "Workflow").unwrap_err();
        assert!(matches!(err, CodegenError::KindUndetermined { .. }));
        let err = classify("Greeter", "Activity").unwrap_err();
        assert!(matches!(err, CodegenError::KindUndetermined { .. }));
    }

    #[test]
    fn go_package_option_with_explicit_name() {
        let file = FileDescriptorProto {
            name: Some("example/greeter.proto".into()),
            package: Some("example".into()),
            options: Some(prost_types::FileOptions {
                go_package: Some("github.com/acme/example;examplepb".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (path, name) = go_package_of(&file);
        assert_eq!(path, "github.com/acme/example");
        assert_eq!(name, "examplepb");
    }

    #[test]
    fn go_package_falls_back_to_the_proto_package() {
        let file = FileDescriptorProto {
            name: Some("example/greeter.proto".into()),
            package: Some("acme.example".into()),
            ..Default::default()
        };
        let (path, name) = go_package_of(&file);
        assert_eq!(path, "acme/example");
        assert_eq!(name, "acme_example");
    }
}
