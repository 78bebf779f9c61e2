//! Cross-template checks: call-site validation, visibility, delegate
//! consistency and strict dependency enforcement. These need the
//! template registry, so they all run in the fileset phase.

use hashbrown::HashSet;

use crate::ast::{CallData, FileKind, FileSetNode, NodeId, NodeKind, Symbol, Visibility};
use crate::diagnostic::SemanticError;
use crate::passes::{CompilerFileSetPass, PassCx, PassResult};
use crate::registry::TemplateRegistry;
use crate::types::{SoyType, TypeRegistry};

/// Resolve (and cache) the fully-qualified callee of a call node.
fn resolve_callee(tree: &FileSetNode, call: NodeId, data: &CallData) -> Symbol {
    if let Some(resolved) = data.resolved.get() {
        return resolved;
    }
    let fqn = if data.is_partial {
        let file = tree.containing_file(call);
        TemplateRegistry::resolve_partial(tree.file_data(file).namespace, data.callee)
    } else {
        data.callee
    };
    data.resolved.set(Some(fqn));
    fqn
}

/// Validates basic call sites: the callee exists, passed params are
/// declared, required params are passed, and passed value types are
/// compatible with the declarations.
pub struct CheckTemplateCallsPass {
    pub types: TypeRegistry,
}

impl CompilerFileSetPass for CheckTemplateCallsPass {
    fn name(&self) -> &'static str {
        "CheckTemplateCalls"
    }

    fn run(&self, tree: &mut FileSetNode, registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult {
        let tree = &*tree;
        for file in tree.source_files() {
            for id in tree.walk(file) {
                let NodeKind::Call(data) = tree.kind(id) else {
                    continue;
                };
                if data.is_delegate {
                    continue;
                }
                let fqn = resolve_callee(tree, id, data);
                let Some(callee) = registry.basic_template(fqn) else {
                    cx.reporter.report(SemanticError::UnknownTemplate(fqn), tree.span(id));
                    continue;
                };

                let header = tree.template_data(callee);
                let declared: HashSet<Symbol> = header
                    .params
                    .iter()
                    .chain(header.prop_vars.iter())
                    .map(|v| v.name)
                    .collect();
                let passed: HashSet<Symbol> = data.params.iter().map(|p| p.name).collect();

                for param in &data.params {
                    if !declared.contains(&param.name) {
                        cx.reporter
                            .report(SemanticError::UndeclaredCallParam(param.name, fqn), param.name_span);
                        continue;
                    }
                    let declared_var = header
                        .params
                        .iter()
                        .chain(header.prop_vars.iter())
                        .find(|v| v.name == param.name)
                        .expect("ICE: declared param vanished");
                    let declared_ty = self.types.resolve(declared_var.type_name).unwrap_or(SoyType::Unknown);
                    let passed_ty = param.value.ty.get();
                    let both_known = !declared_ty.is_unknown() && !passed_ty.is_unknown();
                    let numeric_mix = declared_ty.is_numeric() && passed_ty.is_numeric();
                    if both_known && !numeric_mix && declared_ty != passed_ty {
                        cx.reporter.report(
                            SemanticError::TypeMismatch {
                                expected: declared_ty,
                                found: passed_ty,
                            },
                            param.value.span,
                        );
                    }
                }

                if !data.data_all {
                    for var in header.params.iter() {
                        if var.required && !passed.contains(&var.name) {
                            cx.reporter
                                .report(SemanticError::MissingRequiredParam(var.name, fqn), tree.span(id));
                        }
                    }
                }
            }
        }
        PassResult::Continue
    }
}

/// A private template may be called only from its own namespace.
pub struct CheckTemplateVisibilityPass;

impl CompilerFileSetPass for CheckTemplateVisibilityPass {
    fn name(&self) -> &'static str {
        "CheckTemplateVisibility"
    }

    fn run(&self, tree: &mut FileSetNode, registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult {
        let tree = &*tree;
        for file in tree.source_files() {
            let caller_namespace = tree.file_data(file).namespace;
            for id in tree.walk(file) {
                let NodeKind::Call(data) = tree.kind(id) else {
                    continue;
                };
                if data.is_delegate {
                    continue;
                }
                let fqn = resolve_callee(tree, id, data);
                let Some(callee) = registry.basic_template(fqn) else {
                    continue;
                };
                if tree.template_data(callee).visibility != Visibility::Private {
                    continue;
                }
                let callee_file = tree.containing_file(callee);
                if tree.file_data(callee_file).namespace != caller_namespace {
                    cx.reporter
                        .report(SemanticError::CallToPrivateTemplate(fqn), tree.span(id));
                }
            }
        }
        PassResult::Continue
    }
}

/// Within one (delegate name, variant) group, no two candidates may
/// share a priority.
pub struct CheckDelegatesPass;

impl CompilerFileSetPass for CheckDelegatesPass {
    fn name(&self) -> &'static str {
        "CheckDelegates"
    }

    fn run(&self, tree: &mut FileSetNode, registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult {
        let tree = &*tree;
        for (key, entries) in registry.delegate_groups() {
            for pair in entries.windows(2) {
                if pair[0].priority == pair[1].priority {
                    cx.reporter.report(
                        SemanticError::DuplicateDelegate(key.name),
                        tree.span(pair[1].template),
                    );
                }
            }
        }
        PassResult::Continue
    }
}

/// Calls may not target templates that live in indirect dependencies.
pub struct StrictDepsPass;

impl CompilerFileSetPass for StrictDepsPass {
    fn name(&self) -> &'static str {
        "StrictDeps"
    }

    fn run(&self, tree: &mut FileSetNode, registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult {
        let tree = &*tree;
        for file in tree.source_files() {
            for id in tree.walk(file) {
                let NodeKind::Call(data) = tree.kind(id) else {
                    continue;
                };
                if data.is_delegate {
                    continue;
                }
                let fqn = resolve_callee(tree, id, data);
                let Some(callee) = registry.basic_template(fqn) else {
                    continue;
                };
                let callee_file = tree.containing_file(callee);
                if tree.file_data(callee_file).kind == FileKind::IndirectDep {
                    cx.reporter
                        .report(SemanticError::IndirectDependencyCall(fqn), tree.span(id));
                }
            }
        }
        PassResult::Continue
    }
}
