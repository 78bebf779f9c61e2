//! Compile-time global handling.
//!
//! `RewriteGlobals` substitutes configured globals with constant
//! literals in place; it must precede `CheckGlobals`, which rejects any
//! reference that survived substitution. `V1Expression` is the
//! compatibility gate for legacy expressions.

use hashbrown::HashMap;

use crate::ast::exprs::{Expr, ExprKind};
use crate::ast::{FileSetNode, NodeId, Symbol};
use crate::diagnostic::SemanticError;
use crate::options::GlobalValue;
use crate::passes::{CompilerFilePass, PassCx};

pub struct RewriteGlobalsPass {
    pub globals: HashMap<Symbol, GlobalValue>,
}

impl CompilerFilePass for RewriteGlobalsPass {
    fn name(&self) -> &'static str {
        "RewriteGlobals"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, _cx: &mut PassCx<'_>) {
        for id in tree.walk(file) {
            for expr in tree.node_mut(id).kind.exprs_mut() {
                rewrite(expr, &self.globals);
            }
        }
    }
}

fn rewrite(expr: &mut Expr, globals: &HashMap<Symbol, GlobalValue>) {
    let replacement = match &expr.kind {
        ExprKind::Global { name } => globals.get(name).map(|value| match value {
            GlobalValue::Bool(b) => ExprKind::Bool(*b),
            GlobalValue::Int(i) => ExprKind::Int(*i),
            GlobalValue::Float(x) => ExprKind::Float(*x),
            GlobalValue::Str(s) => ExprKind::Str(s.clone()),
        }),
        _ => None,
    };
    if let Some(kind) = replacement {
        // In-place substitution keeps the node id and span.
        expr.kind = kind;
        return;
    }
    match &mut expr.kind {
        ExprKind::Not(e) | ExprKind::Neg(e) => rewrite(e, globals),
        ExprKind::Binary { left, right, .. } => {
            rewrite(left, globals);
            rewrite(right, globals);
        }
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            rewrite(cond, globals);
            rewrite(then_branch, globals);
            rewrite(else_branch, globals);
        }
        _ => {}
    }
}

/// Rejects every global reference still present after rewriting.
pub struct CheckGlobalsPass;

impl CompilerFilePass for CheckGlobalsPass {
    fn name(&self) -> &'static str {
        "CheckGlobals"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let tree = &*tree;
        for id in tree.walk(file) {
            for expr in tree.kind(id).exprs() {
                expr.for_each(&mut |e| {
                    if let ExprKind::Global { name } = &e.kind {
                        cx.reporter.report(SemanticError::UnknownGlobal(*name), e.span);
                    }
                });
            }
        }
    }
}

/// Rejects legacy v1 expressions unless the compatibility option is on.
pub struct V1ExpressionPass {
    pub allowed: bool,
}

impl CompilerFilePass for V1ExpressionPass {
    fn name(&self) -> &'static str {
        "V1Expression"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        if self.allowed {
            return;
        }
        let tree = &*tree;
        for id in tree.walk(file) {
            for expr in tree.kind(id).exprs() {
                expr.for_each(&mut |e| {
                    if let ExprKind::V1Expression(text) = &e.kind {
                        cx.reporter
                            .report(SemanticError::V1ExpressionNotAllowed(text.clone()), e.span);
                    }
                });
            }
        }
    }
}
