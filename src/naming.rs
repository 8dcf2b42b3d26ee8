//! Naming Resolver.
//!
//! Derives every emitted identifier from schema names, and owns the per-file
//! collision tables for top-level declarations and HTTP routes. Naming is a
//! pure function of the schema, so given the same input the generated file
//! is reproducible byte-for-byte.

use std::collections::BTreeMap;

use heck::{ToLowerCamelCase, ToUpperCamelCase};

use crate::error::CodegenError;
use crate::schema::MethodKind;

/// The top-level names emitted for one (service, kind) pair.
///
/// One canonical convention: `<Service><Kind>Client` / `New...` /
/// `<Service><Kind>Server` / `Register<Service><Kind>Worker`. The worker
/// registration both binds the implementation object and registers every
/// method against the Temporal worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNames {
    pub client_iface: String,
    pub client_impl: String,
    pub constructor: String,
    pub server_iface: String,
    pub register_worker: String,
}

pub fn resolve(service: &str, kind: MethodKind) -> ServiceNames {
    let service = service.to_upper_camel_case();
    let kind = match kind {
        MethodKind::Workflow => "Workflow",
        MethodKind::Activity => "Activity",
    };
    let client_iface = format!("{service}{kind}Client");
    ServiceNames {
        client_impl: client_iface.to_lower_camel_case(),
        constructor: format!("New{client_iface}"),
        server_iface: format!("{service}{kind}Server"),
        register_worker: format!("Register{service}{kind}Worker"),
        client_iface,
    }
}

/// Name of the per-service HTTP registration function.
pub fn http_register(service: &str) -> String {
    format!("Register{}HTTPHandlers", service.to_upper_camel_case())
}

/// Name of the per-file JSON error helper the handlers share.
pub fn http_error_helper(proto_stem: &str) -> String {
    format!("write{}Error", proto_stem.to_upper_camel_case())
}

/// HTTP route for a workflow method: `/<service>/<method>`, lower-cased.
pub fn http_route(service: &str, method: &str) -> String {
    format!("/{}/{}", service.to_lowercase(), method.to_lowercase())
}

/// Routing key shared by workflow start, activity execution, and worker
/// registration, so the caller and worker sides can never drift.
pub fn routing_key(service: &str, proto_method: &str) -> String {
    format!("{service}.{proto_method}")
}

/// The Go keyword set (Go spec, "Keywords"). A method named `select` is a
/// valid proto name but cannot be emitted as an identifier.
const GO_KEYWORDS: [&str; 25] = [
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch", "type",
    "var",
];

/// Whether a schema name survives as a Go identifier. Invalid names are a
/// fatal error, never mangled.
pub fn is_go_ident(name: &str) -> bool {
    if GO_KEYWORDS.contains(&name) {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn ensure_go_ident(owner: &str, name: &str) -> Result<(), CodegenError> {
    if is_go_ident(name) {
        Ok(())
    } else {
        Err(CodegenError::InvalidIdentifier {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// Collision table for names scoped to one output unit (top-level
/// identifiers of a file, or method names of one interface).
#[derive(Debug, Default)]
pub struct DeclTable {
    origins: BTreeMap<String, String>,
}

impl DeclTable {
    pub fn declare(&mut self, name: &str, origin: &str) -> Result<(), CodegenError> {
        if let Some(first) = self.origins.get(name) {
            return Err(CodegenError::NameCollision {
                name: name.to_string(),
                first: first.clone(),
                second: origin.to_string(),
            });
        }
        self.origins.insert(name.to_string(), origin.to_string());
        Ok(())
    }
}

/// Collision table for HTTP routes within one file.
#[derive(Debug, Default)]
pub struct RouteTable {
    origins: BTreeMap<String, String>,
}

impl RouteTable {
    pub fn declare(&mut self, path: &str, origin: &str) -> Result<(), CodegenError> {
        if let Some(first) = self.origins.get(path) {
            return Err(CodegenError::RouteCollision {
                path: path.to_string(),
                first: first.clone(),
                second: origin.to_string(),
            });
        }
        self.origins.insert(path.to_string(), origin.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_the_canonical_name_family() {
        let names = resolve("Greeter", MethodKind::Workflow);
        assert_eq!(names.client_iface, "GreeterWorkflowClient");
        assert_eq!(names.client_impl, "greeterWorkflowClient");
        assert_eq!(names.constructor, "NewGreeterWorkflowClient");
        assert_eq!(names.server_iface, "GreeterWorkflowServer");
        assert_eq!(names.register_worker, "RegisterGreeterWorkflowWorker");

        let names = resolve("Greeter", MethodKind::Activity);
        assert_eq!(names.client_iface, "GreeterActivityClient");
        assert_eq!(names.register_worker, "RegisterGreeterActivityWorker");
    }

    #[test]
    fn snake_case_service_names_normalize() {
        let names = resolve("my_service", MethodKind::Workflow);
        assert_eq!(names.client_iface, "MyServiceWorkflowClient");
        assert_eq!(http_register("my_service"), "RegisterMyServiceHTTPHandlers");
    }

    #[test]
    fn routes_are_lower_cased() {
        assert_eq!(http_route("Greeter", "Hello"), "/greeter/hello");
    }

    #[test]
    fn ident_validation() {
        assert!(is_go_ident("Hello"));
        assert!(is_go_ident("_private"));
        assert!(is_go_ident("Hello2"));
        assert!(!is_go_ident(""));
        assert!(!is_go_ident("2Hello"));
        assert!(!is_go_ident("hello-world"));
        assert!(!is_go_ident("héllo"));
    }

    #[test]
    fn go_keywords_are_not_identifiers() {
        assert!(!is_go_ident("select"));
        assert!(!is_go_ident("type"));
        assert!(!is_go_ident("func"));
        // Case-sensitive: the exported forms are fine.
        assert!(is_go_ident("Select"));
        assert!(is_go_ident("Type"));
    }

    #[test]
    fn decl_table_reports_both_origins() {
        let mut table = DeclTable::default();
        table.declare("GreeterWorkflowClient", "service Greeter").unwrap();
        let err = table
            .declare("GreeterWorkflowClient", "service greeter")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("service Greeter"));
        assert!(msg.contains("service greeter"));
    }
}
