//! Import/Symbol Table.
//!
//! Tracks which external Go symbols the emitted declarations reference, and
//! guarantees each distinct import path is aliased at most once per output
//! file with a stable alias. Paths are interned only at the point a
//! declaration references them, so a rendered file can never carry a dead
//! import.
//!
//! One table is created per output file and discarded after rendering;
//! there is no process-wide aliasing state.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Well-known import paths the generated bindings reach for.
pub mod paths {
    pub const ERRORS: &str = "errors";
    pub const BYTES: &str = "bytes";
    pub const CONTEXT: &str = "context";
    pub const FMT: &str = "fmt";
    pub const TIME: &str = "time";
    pub const HTTP: &str = "net/http";
    pub const TEMPORAL_CLIENT: &str = "go.temporal.io/sdk/client";
    pub const TEMPORAL_WORKER: &str = "go.temporal.io/sdk/worker";
    pub const TEMPORAL_WORKFLOW: &str = "go.temporal.io/sdk/workflow";
    pub const TEMPORAL_ACTIVITY: &str = "go.temporal.io/sdk/activity";
    pub const PROTOJSON: &str = "google.golang.org/protobuf/encoding/protojson";
    pub const WRAPPERSPB: &str = "google.golang.org/protobuf/types/known/wrapperspb";
}

/// One external symbol, rendered as `alias.Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRef {
    pub alias: String,
    pub name: String,
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Import {
    pub alias: String,
    pub path: String,
}

impl Import {
    /// Whether the alias is what Go would infer from the path anyway, in
    /// which case the import is written without an explicit alias.
    pub fn alias_is_default(&self) -> bool {
        self.alias == last_segment(&self.path)
    }
}

/// Per-file symbol table. Import order is first-use order, which makes the
/// rendered import block a pure function of declaration order.
#[derive(Debug, Default)]
pub struct ImportTable {
    by_path: HashMap<String, usize>,
    taken: HashSet<String>,
    imports: Vec<Import>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a symbol from a well-known path, using the conventional alias
    /// for that path.
    pub fn intern(&mut self, path: &str, name: &str) -> SymbolRef {
        let hint = conventional_alias(path);
        self.intern_with_hint(path, &hint, name)
    }

    /// Intern a symbol from another generated proto package, whose alias
    /// must match that package's declared Go package name.
    pub fn intern_package(&mut self, path: &str, package_name: &str, name: &str) -> SymbolRef {
        self.intern_with_hint(path, package_name, name)
    }

    fn intern_with_hint(&mut self, path: &str, hint: &str, name: &str) -> SymbolRef {
        let idx = match self.by_path.get(path) {
            Some(&idx) => idx,
            None => {
                // A path wanting a taken alias gets a numeric suffix,
                // deterministically in first-use order. The taken set holds
                // assigned aliases, not hints, so a later hint that happens
                // to equal a suffixed alias (a package named `client2`) is
                // bumped past it.
                let mut alias = hint.to_string();
                let mut n = 2;
                while !self.taken.insert(alias.clone()) {
                    alias = format!("{}{}", hint, n);
                    n += 1;
                }
                self.imports.push(Import {
                    alias,
                    path: path.to_string(),
                });
                self.by_path.insert(path.to_string(), self.imports.len() - 1);
                self.imports.len() - 1
            }
        };
        SymbolRef {
            alias: self.imports[idx].alias.clone(),
            name: name.to_string(),
        }
    }

    /// All interned imports, in first-use order.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// Conventional short alias for a path: a fixed mapping for the runtime and
/// stdlib families the bindings use, the sanitized last path segment for
/// anything else.
fn conventional_alias(path: &str) -> String {
    let alias = match path {
        paths::HTTP => "http",
        paths::TEMPORAL_CLIENT => "client",
        paths::TEMPORAL_WORKER => "worker",
        paths::TEMPORAL_WORKFLOW => "workflow",
        paths::TEMPORAL_ACTIVITY => "activity",
        paths::PROTOJSON => "protojson",
        paths::WRAPPERSPB => "wrapperspb",
        _ => return sanitize(last_segment(path)),
    };
    alias.to_string()
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn sanitize(segment: &str) -> String {
    let mut alias: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if alias.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        alias.insert(0, '_');
    }
    alias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_paths_get_conventional_aliases() {
        let mut table = ImportTable::new();
        assert_eq!(table.intern(paths::HTTP, "ServeMux").to_string(), "http.ServeMux");
        assert_eq!(
            table.intern(paths::PROTOJSON, "Unmarshal").to_string(),
            "protojson.Unmarshal"
        );
        assert_eq!(table.intern(paths::ERRORS, "New").to_string(), "errors.New");
    }

    #[test]
    fn repeated_interning_reuses_the_alias() {
        let mut table = ImportTable::new();
        let a = table.intern(paths::TEMPORAL_WORKFLOW, "Context");
        let b = table.intern(paths::TEMPORAL_WORKFLOW, "ExecuteActivity");
        assert_eq!(a.alias, b.alias);
        assert_eq!(table.imports().len(), 1);
    }

    #[test]
    fn alias_collisions_get_numeric_suffixes_in_first_use_order() {
        let mut table = ImportTable::new();
        let first = table.intern(paths::TEMPORAL_CLIENT, "Client");
        let second = table.intern("github.com/acme/client", "Thing");
        let third = table.intern("github.com/other/client", "Thing");
        assert_eq!(first.alias, "client");
        assert_eq!(second.alias, "client2");
        assert_eq!(third.alias, "client3");
    }

    #[test]
    fn suffixed_aliases_are_reserved_against_later_hints() {
        let mut table = ImportTable::new();
        let first = table.intern_package("github.com/acme/client", "client", "Thing");
        let second = table.intern_package("github.com/other/client", "client", "Thing");
        // A package whose declared name equals an already-suffixed alias
        // must not share it.
        let third = table.intern_package("github.com/acme/client2", "client2", "Thing");
        assert_eq!(first.alias, "client");
        assert_eq!(second.alias, "client2");
        assert_eq!(third.alias, "client22");

        let aliases: Vec<&str> = table.imports().iter().map(|i| i.alias.as_str()).collect();
        let unique: HashSet<&str> = aliases.iter().copied().collect();
        assert_eq!(unique.len(), aliases.len());
    }

    #[test]
    fn package_interning_prefers_the_declared_package_name() {
        let mut table = ImportTable::new();
        let sym = table.intern_package("github.com/acme/types", "typespb", "Thing");
        assert_eq!(sym.to_string(), "typespb.Thing");
        assert!(!table.imports()[0].alias_is_default());
    }

    #[test]
    fn import_order_is_first_use_order() {
        let mut table = ImportTable::new();
        table.intern(paths::FMT, "Sprintf");
        table.intern(paths::BYTES, "Buffer");
        table.intern(paths::FMT, "Errorf");
        let order: Vec<&str> = table.imports().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(order, vec![paths::FMT, paths::BYTES]);
    }
}
