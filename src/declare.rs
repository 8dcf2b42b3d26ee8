//! Declaration Builder.
//!
//! For every method of every service, in schema order, builds the emitted
//! declaration set: typed client, server contract, worker registration, and
//! HTTP handler bindings. Bodies are rendered here, against symbols interned
//! through the per-file [`ImportTable`]; the emitter only assembles the
//! file.
//!
//! Generated code must stay replay-safe: handlers close over nothing but
//! the immutable client, and registered adapters are interface method
//! values with no package-level state.

use std::collections::BTreeSet;

use crate::code_writer::CodeWriter;
use crate::error::CodegenError;
use crate::naming::{self, DeclTable, RouteTable, ServiceNames};
use crate::schema::{FileSpec, MethodKind, MethodSpec, ServiceSpec, TypeRef};
use crate::symbols::{paths, ImportTable};

/// Which family of emitted unit a declaration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    ClientType,
    ClientConstructor,
    ClientMethod,
    ServerInterface,
    WorkerRegistration,
    HttpHandlers,
}

/// One emitted unit: its resolver-assigned name and rendered Go body.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclKind,
    pub name: String,
    pub code: String,
}

/// Build every declaration for one output file, in emission order:
/// per service, workflow bindings then activity bindings
/// (ClientType → Constructor → ClientMethods → ServerInterface →
/// WorkerRegistration), HTTP handlers last.
pub fn build_file(
    file: &FileSpec,
    imports: &mut ImportTable,
) -> Result<Vec<Declaration>, CodegenError> {
    let mut decl_names = DeclTable::default();
    let mut routes = RouteTable::default();
    let mut decls = Vec::new();

    let any_workflows = file
        .services
        .iter()
        .any(|s| s.has_kind(MethodKind::Workflow));
    let helper = naming::http_error_helper(&file.stem());

    for service in &file.services {
        let mut builder = ServiceBuilder {
            file,
            service,
            imports,
            decl_names: &mut decl_names,
            routes: &mut routes,
            error_helper: &helper,
        };
        builder.build(&mut decls)?;
    }

    if any_workflows {
        decl_names.declare(&helper, &format!("file {}", file.proto_path))?;
        decls.push(error_helper_decl(&helper, imports));
    }

    Ok(decls)
}

struct ServiceBuilder<'a> {
    file: &'a FileSpec,
    service: &'a ServiceSpec,
    imports: &'a mut ImportTable,
    decl_names: &'a mut DeclTable,
    routes: &'a mut RouteTable,
    error_helper: &'a str,
}

impl ServiceBuilder<'_> {
    fn build(&mut self, out: &mut Vec<Declaration>) -> Result<(), CodegenError> {
        // Routing names must be unique across the whole service: the worker
        // would otherwise re-register the same name. This is a generation
        // error, not a runtime one.
        let mut registered = BTreeSet::new();
        for method in &self.service.methods {
            let key = naming::routing_key(&self.service.name, &method.proto_name);
            if !registered.insert(key.clone()) {
                return Err(CodegenError::DuplicateRegistration {
                    service: self.service.name.clone(),
                    name: key,
                });
            }
        }

        // A kind with zero methods emits nothing: no empty stubs.
        for kind in [MethodKind::Workflow, MethodKind::Activity] {
            if !self.service.has_kind(kind) {
                continue;
            }
            let names = naming::resolve(&self.service.name, kind);
            let origin = format!(
                "service {} ({} bindings)",
                self.service.name,
                kind_label(kind)
            );
            for name in [
                &names.client_iface,
                &names.client_impl,
                &names.constructor,
                &names.server_iface,
                &names.register_worker,
            ] {
                self.decl_names.declare(name, &origin)?;
            }
            let mut iface_methods = DeclTable::default();
            let methods: Vec<MethodSpec> = self.service.methods_of(kind).cloned().collect();
            for method in &methods {
                iface_methods.declare(
                    &method.name,
                    &format!("{}.{}", self.service.name, method.proto_name),
                )?;
            }

            out.push(self.client_type(kind, &names, &methods));
            out.push(self.constructor(kind, &names));
            for method in &methods {
                out.push(self.client_method(kind, &names, method));
            }
            out.push(self.server_interface(kind, &names, &methods));
            out.push(self.worker_registration(kind, &names, &methods));
        }

        if self.service.has_kind(MethodKind::Workflow) {
            let name = naming::http_register(&self.service.name);
            self.decl_names.declare(
                &name,
                &format!("service {} (HTTP handlers)", self.service.name),
            )?;
            let decl = self.http_handlers(&name)?;
            out.push(decl);
        }

        Ok(())
    }

    /// Render a type reference, interning its package when it lives outside
    /// the file being generated.
    fn type_expr(&mut self, ty: &TypeRef) -> String {
        if ty.import_path == self.file.go_import_path {
            ty.go_name.clone()
        } else {
            self.imports
                .intern_package(&ty.import_path, &ty.go_package_name, &ty.go_name)
                .to_string()
        }
    }

    fn caller_ctx(&mut self, kind: MethodKind) -> String {
        match kind {
            // Workflows are started from plain application code.
            MethodKind::Workflow => self.imports.intern(paths::CONTEXT, "Context").to_string(),
            // Activities are only invocable from inside a workflow.
            MethodKind::Activity => self
                .imports
                .intern(paths::TEMPORAL_WORKFLOW, "Context")
                .to_string(),
        }
    }

    fn server_ctx(&mut self, kind: MethodKind) -> String {
        match kind {
            MethodKind::Workflow => self
                .imports
                .intern(paths::TEMPORAL_WORKFLOW, "Context")
                .to_string(),
            MethodKind::Activity => self.imports.intern(paths::CONTEXT, "Context").to_string(),
        }
    }

    fn method_sig(&mut self, method: &MethodSpec, ctx_ty: &str) -> String {
        let req = self.type_expr(&method.input);
        let resp = self.type_expr(&method.output);
        format!(
            "{}(ctx {}, req *{}) (*{}, error)",
            method.name, ctx_ty, req, resp
        )
    }

    fn client_type(
        &mut self,
        kind: MethodKind,
        names: &ServiceNames,
        methods: &[MethodSpec],
    ) -> Declaration {
        let sigs: Vec<String> = methods
            .iter()
            .map(|m| {
                let ctx = self.caller_ctx(kind);
                self.method_sig(m, &ctx)
            })
            .collect();

        let mut w = CodeWriter::new();
        match kind {
            MethodKind::Workflow => w.writeln(&format!(
                "// {} starts {} workflows and waits for their results.",
                names.client_iface, self.service.name
            )),
            MethodKind::Activity => w.writeln(&format!(
                "// {} executes {} activities from inside a workflow.",
                names.client_iface, self.service.name
            )),
        }
        w.block(&format!("type {} interface", names.client_iface), |w| {
            for sig in &sigs {
                w.writeln(sig);
            }
        });
        w.blank_line();
        match kind {
            MethodKind::Workflow => {
                let client_ty = self.imports.intern(paths::TEMPORAL_CLIENT, "Client");
                w.block(&format!("type {} struct", names.client_impl), |w| {
                    w.writeln(&format!("client    {}", client_ty));
                    w.writeln("taskQueue string");
                });
            }
            MethodKind::Activity => {
                w.writeln(&format!("type {} struct{{}}", names.client_impl));
            }
        }
        Declaration {
            kind: DeclKind::ClientType,
            name: names.client_iface.clone(),
            code: w.finish(),
        }
    }

    fn constructor(&mut self, kind: MethodKind, names: &ServiceNames) -> Declaration {
        let mut w = CodeWriter::new();
        match kind {
            MethodKind::Workflow => {
                let client_ty = self.imports.intern(paths::TEMPORAL_CLIENT, "Client");
                w.writeln(&format!(
                    "// {} returns a client that starts {} workflows on the given task queue.",
                    names.constructor, self.service.name
                ));
                w.block(
                    &format!(
                        "func {}(c {}, taskQueue string) {}",
                        names.constructor, client_ty, names.client_iface
                    ),
                    |w| {
                        w.writeln(&format!(
                            "return &{}{{client: c, taskQueue: taskQueue}}",
                            names.client_impl
                        ));
                    },
                );
            }
            MethodKind::Activity => {
                w.writeln(&format!(
                    "// {} returns a client that executes {} activities with the",
                    names.constructor, self.service.name
                ));
                w.writeln("// activity options already attached to the calling workflow context.");
                w.block(
                    &format!("func {}() {}", names.constructor, names.client_iface),
                    |w| {
                        w.writeln(&format!("return &{}{{}}", names.client_impl));
                    },
                );
            }
        }
        Declaration {
            kind: DeclKind::ClientConstructor,
            name: names.constructor.clone(),
            code: w.finish(),
        }
    }

    fn client_method(
        &mut self,
        kind: MethodKind,
        names: &ServiceNames,
        method: &MethodSpec,
    ) -> Declaration {
        match kind {
            MethodKind::Workflow => self.workflow_client_method(names, method),
            MethodKind::Activity => self.activity_client_method(names, method),
        }
    }

    /// Start-and-wait: execution options scoped to the task queue (plus the
    /// caller's deadline, when one is set), the routing key, then a typed
    /// decode of the result. Errors propagate unchanged.
    fn workflow_client_method(&mut self, names: &ServiceNames, method: &MethodSpec) -> Declaration {
        let ctx = self.caller_ctx(MethodKind::Workflow);
        let sig = self.method_sig(method, &ctx);
        let options_ty = self
            .imports
            .intern(paths::TEMPORAL_CLIENT, "StartWorkflowOptions");
        let time_until = self.imports.intern(paths::TIME, "Until");
        let key = naming::routing_key(&self.service.name, &method.proto_name);
        let payload = payload_expr(&method.input);
        let output = self.type_expr(&method.output);
        let wrap = method
            .output
            .string_wrapper
            .then(|| self.imports.intern(paths::WRAPPERSPB, "String"));

        let mut w = CodeWriter::new();
        w.block(&format!("func (c *{}) {}", names.client_impl, sig), |w| {
            w.writeln(&format!("options := {}{{", options_ty));
            {
                let _indent = w.indent();
                w.writeln("TaskQueue: c.taskQueue,");
            }
            w.writeln("}");
            w.block("if deadline, ok := ctx.Deadline(); ok", |w| {
                w.writeln(&format!(
                    "options.WorkflowExecutionTimeout = {}(deadline)",
                    time_until
                ));
            });
            w.writeln(&format!(
                "run, err := c.client.ExecuteWorkflow(ctx, options, {:?}, {})",
                key, payload
            ));
            w.block("if err != nil", |w| w.writeln("return nil, err"));
            match &wrap {
                Some(wrap) => {
                    w.writeln("var value string");
                    w.block("if err := run.Get(ctx, &value); err != nil", |w| {
                        w.writeln("return nil, err");
                    });
                    w.writeln(&format!("return {}(value), nil", wrap));
                }
                None => {
                    w.writeln(&format!("out := &{}{{}}", output));
                    w.block("if err := run.Get(ctx, out); err != nil", |w| {
                        w.writeln("return nil, err");
                    });
                    w.writeln("return out, nil");
                }
            }
        });
        Declaration {
            kind: DeclKind::ClientMethod,
            name: format!("{}.{}", names.client_impl, method.name),
            code: w.finish(),
        }
    }

    /// In-workflow execution: activity options come from the context the
    /// workflow caller prepared, never from the generated code.
    fn activity_client_method(&mut self, names: &ServiceNames, method: &MethodSpec) -> Declaration {
        let ctx = self.caller_ctx(MethodKind::Activity);
        let sig = self.method_sig(method, &ctx);
        let execute = self
            .imports
            .intern(paths::TEMPORAL_WORKFLOW, "ExecuteActivity");
        let key = naming::routing_key(&self.service.name, &method.proto_name);
        let payload = payload_expr(&method.input);
        let output = self.type_expr(&method.output);
        let wrap = method
            .output
            .string_wrapper
            .then(|| self.imports.intern(paths::WRAPPERSPB, "String"));

        let mut w = CodeWriter::new();
        w.block(&format!("func (c *{}) {}", names.client_impl, sig), |w| {
            w.writeln(&format!("fut := {}(ctx, {:?}, {})", execute, key, payload));
            match &wrap {
                Some(wrap) => {
                    w.writeln("var value string");
                    w.block("if err := fut.Get(ctx, &value); err != nil", |w| {
                        w.writeln("return nil, err");
                    });
                    w.writeln(&format!("return {}(value), nil", wrap));
                }
                None => {
                    w.writeln(&format!("out := &{}{{}}", output));
                    w.block("if err := fut.Get(ctx, out); err != nil", |w| {
                        w.writeln("return nil, err");
                    });
                    w.writeln("return out, nil");
                }
            }
        });
        Declaration {
            kind: DeclKind::ClientMethod,
            name: format!("{}.{}", names.client_impl, method.name),
            code: w.finish(),
        }
    }

    fn server_interface(
        &mut self,
        kind: MethodKind,
        names: &ServiceNames,
        methods: &[MethodSpec],
    ) -> Declaration {
        let sigs: Vec<String> = methods
            .iter()
            .map(|m| {
                let ctx = self.server_ctx(kind);
                self.method_sig(m, &ctx)
            })
            .collect();

        let mut w = CodeWriter::new();
        w.writeln(&format!(
            "// {} is the contract a {} {} implementation satisfies.",
            names.server_iface,
            self.service.name,
            kind_label(kind)
        ));
        w.block(&format!("type {} interface", names.server_iface), |w| {
            for sig in &sigs {
                w.writeln(sig);
            }
        });
        Declaration {
            kind: DeclKind::ServerInterface,
            name: names.server_iface.clone(),
            code: w.finish(),
        }
    }

    /// Registers each interface method with the worker under its routing
    /// name, in schema order. Method values are the adapters: they receive
    /// the engine's native context and return results unmodified.
    fn worker_registration(
        &mut self,
        kind: MethodKind,
        names: &ServiceNames,
        methods: &[MethodSpec],
    ) -> Declaration {
        let worker_ty = self.imports.intern(paths::TEMPORAL_WORKER, "Worker");
        let (register, options_ty) = match kind {
            MethodKind::Workflow => (
                "RegisterWorkflowWithOptions",
                self.imports
                    .intern(paths::TEMPORAL_WORKFLOW, "RegisterOptions"),
            ),
            MethodKind::Activity => (
                "RegisterActivityWithOptions",
                self.imports
                    .intern(paths::TEMPORAL_ACTIVITY, "RegisterOptions"),
            ),
        };

        let mut w = CodeWriter::new();
        w.writeln(&format!(
            "// {} registers every {} {} with the worker under its routing name.",
            names.register_worker,
            self.service.name,
            kind_label(kind)
        ));
        w.block(
            &format!(
                "func {}(w {}, impl {})",
                names.register_worker, worker_ty, names.server_iface
            ),
            |w| {
                for method in methods {
                    w.writeln(&format!(
                        "w.{}(impl.{}, {}{{Name: {:?}}})",
                        register,
                        method.name,
                        options_ty,
                        naming::routing_key(&self.service.name, &method.proto_name)
                    ));
                }
            },
        );
        Declaration {
            kind: DeclKind::WorkerRegistration,
            name: names.register_worker.clone(),
            code: w.finish(),
        }
    }

    /// One JSON endpoint per workflow method. Each request is independent:
    /// the closures capture only the immutable client.
    fn http_handlers(&mut self, name: &str) -> Result<Declaration, CodegenError> {
        let workflow_names = naming::resolve(&self.service.name, MethodKind::Workflow);
        let mux_ty = self.imports.intern(paths::HTTP, "ServeMux");
        let methods: Vec<MethodSpec> = self
            .service
            .methods_of(MethodKind::Workflow)
            .cloned()
            .collect();

        let mut w = CodeWriter::new();
        w.writeln(&format!(
            "// {} binds one JSON endpoint per {} workflow method.",
            name, self.service.name
        ));
        w.writeln("// Unknown request fields are rejected.");
        w.writeln(&format!(
            "func {}(mux *{}, c {}) {{",
            name, mux_ty, workflow_names.client_iface
        ));
        {
            let _indent = w.indent();
            for (i, method) in methods.iter().enumerate() {
                if i > 0 {
                    w.blank_line();
                }
                self.http_handler(&mut w, method)?;
            }
        }
        w.writeln("}");

        Ok(Declaration {
            kind: DeclKind::HttpHandlers,
            name: name.to_string(),
            code: w.finish(),
        })
    }

    fn http_handler(&mut self, w: &mut CodeWriter, method: &MethodSpec) -> Result<(), CodegenError> {
        let route = naming::http_route(&self.service.name, &method.name);
        self.routes.declare(
            &route,
            &format!("{}.{}", self.service.name, method.proto_name),
        )?;

        let http = self.imports.intern(paths::HTTP, "Request").alias;
        let errors_new = self.imports.intern(paths::ERRORS, "New");
        let buffer = self.imports.intern(paths::BYTES, "Buffer");
        let helper = self.error_helper.to_string();
        let input = self.type_expr(&method.input);
        let request_wrap = method
            .input
            .string_wrapper
            .then(|| self.imports.intern(paths::WRAPPERSPB, "String"));

        w.writeln(&format!(
            "mux.HandleFunc({:?}, func(w {http}.ResponseWriter, r *{http}.Request) {{",
            route
        ));
        {
            let _indent = w.indent();
            w.block(&format!("if r.Method != {http}.MethodPost"), |w| {
                w.writeln(&format!(
                    "{helper}(w, {http}.StatusMethodNotAllowed, {errors_new}(\"method not allowed\"))"
                ));
                w.writeln("return");
            });
            w.writeln(&format!("var body {}", buffer));
            w.block("if _, err := body.ReadFrom(r.Body); err != nil", |w| {
                w.writeln(&format!("{helper}(w, {http}.StatusBadRequest, err)"));
                w.writeln("return");
            });
            match &request_wrap {
                Some(wrap) => {
                    w.writeln(&format!("req := {}(body.String())", wrap));
                }
                None => {
                    let unmarshal_options =
                        self.imports.intern(paths::PROTOJSON, "UnmarshalOptions");
                    w.writeln(&format!("req := &{}{{}}", input));
                    w.block(
                        &format!(
                            "if err := ({}{{DiscardUnknown: false}}).Unmarshal(body.Bytes(), req); err != nil",
                            unmarshal_options
                        ),
                        |w| {
                            w.writeln(&format!("{helper}(w, {http}.StatusBadRequest, err)"));
                            w.writeln("return");
                        },
                    );
                }
            }
            w.writeln(&format!("resp, err := c.{}(r.Context(), req)", method.name));
            w.block("if err != nil", |w| {
                w.writeln(&format!("{helper}(w, {http}.StatusInternalServerError, err)"));
                w.writeln("return");
            });
            if method.output.string_wrapper {
                let sprintf = self.imports.intern(paths::FMT, "Sprintf");
                w.writeln("w.Header().Set(\"Content-Type\", \"application/json\")");
                w.writeln(&format!("w.WriteHeader({http}.StatusOK)"));
                w.writeln(&format!(
                    "w.Write([]byte({}(\"%q\", resp.GetValue())))",
                    sprintf
                ));
            } else {
                let marshal_options = self.imports.intern(paths::PROTOJSON, "MarshalOptions");
                w.writeln(&format!("data, err := ({}{{}}).Marshal(resp)", marshal_options));
                w.block("if err != nil", |w| {
                    w.writeln(&format!("{helper}(w, {http}.StatusInternalServerError, err)"));
                    w.writeln("return");
                });
                w.writeln("w.Header().Set(\"Content-Type\", \"application/json\")");
                w.writeln(&format!("w.WriteHeader({http}.StatusOK)"));
                w.writeln("w.Write(data)");
            }
        }
        w.writeln("})");
        Ok(())
    }
}

fn kind_label(kind: MethodKind) -> &'static str {
    match kind {
        MethodKind::Workflow => "workflow",
        MethodKind::Activity => "activity",
    }
}

/// Payload passed to the engine: wrapper requests unwrap to their value,
/// everything else is sent as the typed message.
fn payload_expr(input: &TypeRef) -> &'static str {
    if input.string_wrapper {
        "req.GetValue()"
    } else {
        "req"
    }
}

/// Shared per-file helper the handlers call for error responses: a non-2xx
/// status plus a JSON body `{"error": "<message>"}`.
fn error_helper_decl(name: &str, imports: &mut ImportTable) -> Declaration {
    let response_writer = imports.intern(paths::HTTP, "ResponseWriter");
    let sprintf = imports.intern(paths::FMT, "Sprintf");

    let mut w = CodeWriter::new();
    w.block(
        &format!("func {}(w {}, code int, err error)", name, response_writer),
        |w| {
            w.writeln("w.Header().Set(\"Content-Type\", \"application/json\")");
            w.writeln("w.WriteHeader(code)");
            w.writeln(&format!(
                "w.Write([]byte({}(\"{{\\\"error\\\": %q}}\", err.Error())))",
                sprintf
            ));
        },
    );
    Declaration {
        kind: DeclKind::HttpHandlers,
        name: name.to_string(),
        code: w.finish(),
    }
}
