//! Declared-type checking and bottom-up expression type resolution.
//!
//! A subexpression whose operands are already unknown stays silent and
//! resolves to unknown, so one reported error does not cascade through
//! every enclosing expression.

use crate::ast::exprs::{BinaryOp, Expr, ExprKind, VarDefn};
use crate::ast::{FileSetNode, NodeId};
use crate::diagnostic::{ErrorReporter, SemanticError};
use crate::passes::{CompilerFilePass, PassCx};
use crate::types::{SoyType, TypeRegistry};

/// Checks that every declared header type name resolves in the type
/// registry.
pub struct CheckDeclaredTypesPass {
    pub types: TypeRegistry,
}

impl CompilerFilePass for CheckDeclaredTypesPass {
    fn name(&self) -> &'static str {
        "CheckDeclaredTypes"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let tree = &*tree;
        for template in tree.templates_of(file) {
            let data = tree.template_data(template);
            for var in data.params.iter().chain(data.prop_vars.iter()) {
                if self.types.resolve(var.type_name).is_none() {
                    cx.reporter.report(SemanticError::UnknownType(var.type_name), var.name_span);
                }
            }
        }
    }
}

/// Propagates types bottom-up across every expression subtree.
pub struct ResolveExpressionTypesPass {
    pub types: TypeRegistry,
}

impl CompilerFilePass for ResolveExpressionTypesPass {
    fn name(&self) -> &'static str {
        "ResolveExpressionTypes"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let tree = &*tree;
        for id in tree.walk(file) {
            for expr in tree.kind(id).exprs() {
                resolve(expr, tree, &self.types, cx.reporter);
            }
        }
    }
}

fn declared_type(tree: &FileSetNode, types: &TypeRegistry, defn: VarDefn) -> SoyType {
    match defn {
        VarDefn::Param { template, index } => {
            let var = &tree.template_data(template).params[index as usize];
            types.resolve(var.type_name).unwrap_or(SoyType::Unknown)
        }
        VarDefn::Prop { template, index } => {
            let var = &tree.template_data(template).prop_vars[index as usize];
            types.resolve(var.type_name).unwrap_or(SoyType::Unknown)
        }
        VarDefn::LetVar(let_node) => match tree.kind(let_node) {
            crate::ast::NodeKind::Let(data) => data
                .value
                .as_ref()
                .map(|value| value.ty.get())
                .unwrap_or(SoyType::Unknown),
            _ => SoyType::Unknown,
        },
        // Element types of iterated collections are not modeled.
        VarDefn::ForVar(_) => SoyType::Unknown,
    }
}

fn resolve(expr: &Expr, tree: &FileSetNode, types: &TypeRegistry, reporter: &mut ErrorReporter) -> SoyType {
    let ty = match &expr.kind {
        ExprKind::Null => SoyType::Null,
        ExprKind::Bool(_) => SoyType::Bool,
        ExprKind::Int(_) => SoyType::Int,
        ExprKind::Float(_) => SoyType::Float,
        ExprKind::Str(_) => SoyType::String,
        ExprKind::VarRef { defn, .. } => match defn.get() {
            Some(found) => declared_type(tree, types, found),
            // Unresolved reference: already reported by resolve-names.
            None => SoyType::Unknown,
        },
        ExprKind::Global { .. } => SoyType::Unknown,
        ExprKind::V1Expression(_) => SoyType::Unknown,
        ExprKind::Not(operand) => {
            resolve(operand, tree, types, reporter);
            SoyType::Bool
        }
        ExprKind::Neg(operand) => {
            let operand_ty = resolve(operand, tree, types, reporter);
            if operand_ty.is_numeric() {
                operand_ty
            } else if operand_ty.is_unknown() {
                SoyType::Unknown
            } else {
                reporter.report(
                    SemanticError::IncompatibleOperands {
                        op: "-",
                        left: operand_ty,
                        right: operand_ty,
                    },
                    expr.span,
                );
                SoyType::Unknown
            }
        }
        ExprKind::Binary { op, left, right } => {
            let left_ty = resolve(left, tree, types, reporter);
            let right_ty = resolve(right, tree, types, reporter);
            binary_type(*op, left_ty, right_ty, expr, reporter)
        }
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            resolve(cond, tree, types, reporter);
            let then_ty = resolve(then_branch, tree, types, reporter);
            let else_ty = resolve(else_branch, tree, types, reporter);
            if then_ty == else_ty { then_ty } else { SoyType::Unknown }
        }
    };
    expr.ty.set(ty);
    ty
}

fn binary_type(
    op: BinaryOp,
    left: SoyType,
    right: SoyType,
    expr: &Expr,
    reporter: &mut ErrorReporter,
) -> SoyType {
    // Unknown operands short-circuit silently.
    if left.is_unknown() || right.is_unknown() {
        return match op {
            BinaryOp::And | BinaryOp::Or => SoyType::Bool,
            op if op.is_comparison() => SoyType::Bool,
            _ => SoyType::Unknown,
        };
    }

    let mismatch = |reporter: &mut ErrorReporter| {
        reporter.report(
            SemanticError::IncompatibleOperands {
                op: op.symbol(),
                left,
                right,
            },
            expr.span,
        );
    };

    match op {
        BinaryOp::Plus => {
            if left == SoyType::String || right == SoyType::String {
                SoyType::String
            } else if left.is_numeric() && right.is_numeric() {
                if left == SoyType::Float || right == SoyType::Float {
                    SoyType::Float
                } else {
                    SoyType::Int
                }
            } else {
                mismatch(reporter);
                SoyType::Unknown
            }
        }
        BinaryOp::Minus | BinaryOp::Times | BinaryOp::Div | BinaryOp::Mod => {
            if left.is_numeric() && right.is_numeric() {
                if left == SoyType::Float || right == SoyType::Float {
                    SoyType::Float
                } else {
                    SoyType::Int
                }
            } else {
                mismatch(reporter);
                SoyType::Unknown
            }
        }
        BinaryOp::And | BinaryOp::Or => SoyType::Bool,
        BinaryOp::Equal | BinaryOp::NotEqual => SoyType::Bool,
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let comparable = (left.is_numeric() && right.is_numeric())
                || (left == SoyType::String && right == SoyType::String);
            if !comparable {
                mismatch(reporter);
            }
            SoyType::Bool
        }
    }
}
