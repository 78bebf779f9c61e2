//! Tree simplification: constant folding over expression subtrees and
//! dead-branch elimination for `{if}` and `{switch}`.
//!
//! The pass is a pure rewrite and idempotent: applying it twice yields
//! the tree of a single application.

use crate::ast::exprs::{BinaryOp, Expr, ExprKind};
use crate::ast::{FileSetNode, NodeId, NodeKind};
use crate::passes::{CompilerFileSetPass, PassCx, PassResult};
use crate::registry::TemplateRegistry;

pub struct OptimizationPass;

impl CompilerFileSetPass for OptimizationPass {
    fn name(&self) -> &'static str {
        "Optimization"
    }

    fn run(&self, tree: &mut FileSetNode, _registry: &mut TemplateRegistry, _cx: &mut PassCx<'_>) -> PassResult {
        for file in tree.source_files() {
            for id in tree.walk(file) {
                if !tree.contains(id) {
                    continue;
                }
                for expr in tree.node_mut(id).kind.exprs_mut() {
                    fold_expr(expr);
                }
            }
            for id in tree.walk(file) {
                if !tree.contains(id) {
                    continue;
                }
                match tree.kind(id) {
                    NodeKind::If => optimize_if(tree, id),
                    NodeKind::Switch(_) => optimize_switch(tree, id),
                    _ => {}
                }
            }
        }
        PassResult::Continue
    }
}

fn fold_expr(expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Not(e) | ExprKind::Neg(e) => fold_expr(e),
        ExprKind::Binary { left, right, .. } => {
            fold_expr(left);
            fold_expr(right);
        }
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            fold_expr(cond);
            fold_expr(then_branch);
            fold_expr(else_branch);
        }
        _ => {}
    }

    // A constant ternary condition collapses to the taken branch, which
    // keeps its own node identity.
    if matches!(expr.kind, ExprKind::Ternary { .. }) {
        let kind = std::mem::replace(&mut expr.kind, ExprKind::Null);
        if let ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } = kind
        {
            match cond.as_bool_lit() {
                Some(true) => *expr = *then_branch,
                Some(false) => *expr = *else_branch,
                None => {
                    expr.kind = ExprKind::Ternary {
                        cond,
                        then_branch,
                        else_branch,
                    }
                }
            }
        }
        return;
    }

    let folded = match &expr.kind {
        ExprKind::Not(e) => e.as_bool_lit().map(|b| ExprKind::Bool(!b)),
        ExprKind::Neg(e) => match e.kind {
            ExprKind::Int(i) => Some(ExprKind::Int(-i)),
            ExprKind::Float(x) => Some(ExprKind::Float(-x)),
            _ => None,
        },
        ExprKind::Binary { op, left, right } => fold_binary(*op, left, right),
        _ => None,
    };
    if let Some(kind) = folded {
        expr.kind = kind;
    }
}

fn fold_binary(op: BinaryOp, left: &Expr, right: &Expr) -> Option<ExprKind> {
    match (op, &left.kind, &right.kind) {
        (BinaryOp::Plus, ExprKind::Int(a), ExprKind::Int(b)) => Some(ExprKind::Int(a.wrapping_add(*b))),
        (BinaryOp::Minus, ExprKind::Int(a), ExprKind::Int(b)) => Some(ExprKind::Int(a.wrapping_sub(*b))),
        (BinaryOp::Times, ExprKind::Int(a), ExprKind::Int(b)) => Some(ExprKind::Int(a.wrapping_mul(*b))),
        (BinaryOp::Div, ExprKind::Int(a), ExprKind::Int(b)) if *b != 0 => Some(ExprKind::Int(a / b)),
        (BinaryOp::Mod, ExprKind::Int(a), ExprKind::Int(b)) if *b != 0 => Some(ExprKind::Int(a % b)),
        (BinaryOp::Plus, ExprKind::Str(a), ExprKind::Str(b)) => Some(ExprKind::Str(format!("{}{}", a, b))),
        (BinaryOp::Plus, ExprKind::Str(a), ExprKind::Int(b)) => Some(ExprKind::Str(format!("{}{}", a, b))),
        (BinaryOp::Plus, ExprKind::Int(a), ExprKind::Str(b)) => Some(ExprKind::Str(format!("{}{}", a, b))),
        (BinaryOp::And, ExprKind::Bool(a), ExprKind::Bool(b)) => Some(ExprKind::Bool(*a && *b)),
        (BinaryOp::Or, ExprKind::Bool(a), ExprKind::Bool(b)) => Some(ExprKind::Bool(*a || *b)),
        (BinaryOp::Equal, _, _) if left.is_literal() && right.is_literal() => {
            Some(ExprKind::Bool(left.literal_eq(right)))
        }
        (BinaryOp::NotEqual, _, _) if left.is_literal() && right.is_literal() => {
            Some(ExprKind::Bool(!left.literal_eq(right)))
        }
        (BinaryOp::Less, ExprKind::Int(a), ExprKind::Int(b)) => Some(ExprKind::Bool(a < b)),
        (BinaryOp::LessEqual, ExprKind::Int(a), ExprKind::Int(b)) => Some(ExprKind::Bool(a <= b)),
        (BinaryOp::Greater, ExprKind::Int(a), ExprKind::Int(b)) => Some(ExprKind::Bool(a > b)),
        (BinaryOp::GreaterEqual, ExprKind::Int(a), ExprKind::Int(b)) => Some(ExprKind::Bool(a >= b)),
        _ => None,
    }
}

/// Drop always-false conditions; take an always-true leading branch.
fn optimize_if(tree: &mut FileSetNode, if_id: NodeId) {
    for child in tree.children(if_id).to_vec() {
        if let NodeKind::IfCond(data) = tree.kind(child) {
            if data.cond.as_bool_lit() == Some(false) {
                tree.release_subtree(child);
            }
        }
    }

    let children = tree.children(if_id).to_vec();
    let Some(&first) = children.first() else {
        // Every branch was provably dead.
        tree.release_subtree(if_id);
        return;
    };

    let first_is_true_cond = matches!(tree.kind(first), NodeKind::IfCond(data) if data.cond.as_bool_lit() == Some(true));
    let first_is_else = matches!(tree.kind(first), NodeKind::IfElse);

    if first_is_true_cond || first_is_else {
        splice_branch_body(tree, if_id, first);
        return;
    }

    // A true condition in the middle still kills everything after it.
    if let Some(position) = children
        .iter()
        .position(|&c| matches!(tree.kind(c), NodeKind::IfCond(data) if data.cond.as_bool_lit() == Some(true)))
    {
        for &dead in &children[position + 1..] {
            if tree.contains(dead) {
                tree.release_subtree(dead);
            }
        }
    }
}

/// Select the arm of a constant switch expression.
fn optimize_switch(tree: &mut FileSetNode, switch_id: NodeId) {
    let is_const = match tree.kind(switch_id) {
        NodeKind::Switch(data) => data.expr.is_literal(),
        _ => false,
    };
    if !is_const {
        return;
    }

    let children = tree.children(switch_id).to_vec();
    let mut chosen = None;
    for &child in &children {
        if let NodeKind::SwitchCase(case) = tree.kind(child) {
            let matches_arm = match tree.kind(switch_id) {
                NodeKind::Switch(data) => case.exprs.iter().any(|e| e.literal_eq(&data.expr)),
                _ => false,
            };
            if matches_arm {
                chosen = Some(child);
                break;
            }
        }
    }
    if chosen.is_none() {
        chosen = children
            .iter()
            .copied()
            .find(|&c| matches!(tree.kind(c), NodeKind::SwitchDefault));
    }

    match chosen {
        Some(arm) => splice_branch_body(tree, switch_id, arm),
        None => tree.release_subtree(switch_id),
    }
}

/// Replace a branching node by the body of the chosen arm.
fn splice_branch_body(tree: &mut FileSetNode, branch_node: NodeId, arm: NodeId) {
    let parent = tree
        .parent(branch_node)
        .expect("ICE: branch node is not attached");
    let index = tree
        .child_index(parent, branch_node)
        .expect("ICE: node is not a child of its parent");

    let body = tree.children(arm).to_vec();
    for &child in &body {
        tree.remove_child(arm, child);
    }
    tree.insert_children(parent, index, &body);
    tree.release_subtree(branch_node);
}
