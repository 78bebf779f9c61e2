//! Name resolution: assigns every variable reference to its declaration.
//!
//! Scopes nest by command containment. A `{let}` binding is visible to
//! subsequent siblings in its enclosing block; a `{for}` binding covers
//! the loop body. Either shadows an outer binding of the same name
//! within its subtree only. Unresolved references are reported and left
//! unannotated so later passes can degrade instead of cascading.

use hashbrown::HashMap;
use log::debug;

use crate::ast::exprs::{Expr, ExprKind, VarDefn};
use crate::ast::{FileSetNode, NodeId, NodeKind, Symbol};
use crate::diagnostic::{ErrorReporter, SemanticError};
use crate::passes::{CompilerFilePass, PassCx};

pub struct ResolveNamesPass;

impl CompilerFilePass for ResolveNamesPass {
    fn name(&self) -> &'static str {
        "ResolveNames"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let tree = &*tree;
        for template in tree.templates_of(file) {
            debug!("resolving names in {}", tree.template_data(template).name);
            let mut scopes = ScopeStack::new();
            scopes.push_scope();

            let data = tree.template_data(template);
            for (index, param) in data.params.iter().enumerate() {
                scopes.define(
                    param.name,
                    VarDefn::Param {
                        template,
                        index: index as u32,
                    },
                );
            }
            for (index, prop) in data.prop_vars.iter().enumerate() {
                scopes.define(
                    prop.name,
                    VarDefn::Prop {
                        template,
                        index: index as u32,
                    },
                );
            }

            for &child in tree.children(template) {
                visit(tree, child, &mut scopes, cx.reporter);
            }
        }
    }
}

struct ScopeStack {
    scopes: Vec<HashMap<Symbol, VarDefn>>,
}

impl ScopeStack {
    fn new() -> Self {
        ScopeStack { scopes: Vec::new() }
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Define in the current scope, shadowing any outer binding.
    fn define(&mut self, name: Symbol, defn: VarDefn) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, defn);
        }
    }

    /// Look up starting from the current scope and moving outwards.
    fn lookup(&self, name: Symbol) -> Option<VarDefn> {
        for scope in self.scopes.iter().rev() {
            if let Some(defn) = scope.get(&name) {
                return Some(*defn);
            }
        }
        None
    }
}

fn visit(tree: &FileSetNode, node: NodeId, scopes: &mut ScopeStack, reporter: &mut ErrorReporter) {
    match tree.kind(node) {
        NodeKind::Let(data) => {
            if let Some(value) = &data.value {
                resolve_expr(value, scopes, reporter);
            }
            scopes.push_scope();
            for &child in tree.children(node) {
                visit(tree, child, scopes, reporter);
            }
            scopes.pop_scope();
            // Visible to subsequent siblings of the let.
            scopes.define(data.var, VarDefn::LetVar(node));
        }
        NodeKind::For(data) => {
            // The iterated expression sees the outer scope only.
            resolve_expr(&data.expr, scopes, reporter);
            scopes.push_scope();
            scopes.define(data.var, VarDefn::ForVar(node));
            for &child in tree.children(node) {
                visit(tree, child, scopes, reporter);
            }
            scopes.pop_scope();
        }
        kind => {
            for expr in kind.exprs() {
                resolve_expr(expr, scopes, reporter);
            }
            scopes.push_scope();
            for &child in tree.children(node) {
                visit(tree, child, scopes, reporter);
            }
            scopes.pop_scope();
        }
    }
}

fn resolve_expr(expr: &Expr, scopes: &ScopeStack, reporter: &mut ErrorReporter) {
    expr.for_each(&mut |e| {
        if let ExprKind::VarRef { name, defn } = &e.kind {
            match scopes.lookup(*name) {
                Some(found) => defn.set(Some(found)),
                None => reporter.report(SemanticError::UndefinedVariable(*name), e.span),
            }
        }
    });
}
