//! Expression subtrees embedded in command nodes.
//!
//! Expressions are owned box trees rather than arena entries: a command
//! holds its expression roots directly and passes rewrite them in place.
//! Every expression node still draws its id from the shared fileset id
//! generator and carries interior-mutable annotations (`Cell`) so that
//! resolution passes can work over shared references.

use std::cell::Cell;

use crate::ast::{NodeId, NodeIdGen, Symbol};
use crate::source_manager::SourceSpan;
use crate::types::SoyType;

/// Where a variable reference resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDefn {
    /// Declared `@param` of the enclosing template (header index).
    Param { template: NodeId, index: u32 },
    /// Declared `@prop` of the enclosing template (header index).
    Prop { template: NodeId, index: u32 },
    /// Bound by a `{let}` node.
    LetVar(NodeId),
    /// Bound by a `{for}` node.
    ForVar(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Div,
    Mod,
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    VarRef {
        name: Symbol,
        defn: Cell<Option<VarDefn>>,
    },
    Global {
        name: Symbol,
    },
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Legacy v1 expression carried as opaque text.
    V1Expression(String),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub span: SourceSpan,
    /// Resolved value type, written by the type resolution pass.
    pub ty: Cell<SoyType>,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(kind: ExprKind, span: SourceSpan, id_gen: &mut NodeIdGen) -> Expr {
        Expr {
            id: id_gen.gen_id(),
            span,
            ty: Cell::new(SoyType::Unknown),
            kind,
        }
    }

    pub fn var_ref(name: Symbol, span: SourceSpan, id_gen: &mut NodeIdGen) -> Expr {
        Expr::new(
            ExprKind::VarRef {
                name,
                defn: Cell::new(None),
            },
            span,
            id_gen,
        )
    }

    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Null
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::VarRef { .. }
            | ExprKind::Global { .. }
            | ExprKind::V1Expression(_) => Vec::new(),
            ExprKind::Not(e) | ExprKind::Neg(e) => vec![e],
            ExprKind::Binary { left, right, .. } => vec![left, right],
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => vec![cond, then_branch, else_branch],
        }
    }

    /// Preorder visit of this expression tree.
    pub fn for_each(&self, f: &mut dyn FnMut(&Expr)) {
        f(self);
        for child in self.children() {
            child.for_each(f);
        }
    }

    /// Deep copy with a fresh id for every node in the clone.
    pub fn clone_with_fresh_ids(&self, id_gen: &mut NodeIdGen) -> Expr {
        let kind = match &self.kind {
            ExprKind::Null => ExprKind::Null,
            ExprKind::Bool(b) => ExprKind::Bool(*b),
            ExprKind::Int(i) => ExprKind::Int(*i),
            ExprKind::Float(x) => ExprKind::Float(*x),
            ExprKind::Str(s) => ExprKind::Str(s.clone()),
            ExprKind::VarRef { name, defn } => ExprKind::VarRef {
                name: *name,
                defn: defn.clone(),
            },
            ExprKind::Global { name } => ExprKind::Global { name: *name },
            ExprKind::Not(e) => ExprKind::Not(Box::new(e.clone_with_fresh_ids(id_gen))),
            ExprKind::Neg(e) => ExprKind::Neg(Box::new(e.clone_with_fresh_ids(id_gen))),
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: Box::new(left.clone_with_fresh_ids(id_gen)),
                right: Box::new(right.clone_with_fresh_ids(id_gen)),
            },
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => ExprKind::Ternary {
                cond: Box::new(cond.clone_with_fresh_ids(id_gen)),
                then_branch: Box::new(then_branch.clone_with_fresh_ids(id_gen)),
                else_branch: Box::new(else_branch.clone_with_fresh_ids(id_gen)),
            },
            ExprKind::V1Expression(s) => ExprKind::V1Expression(s.clone()),
        };
        Expr {
            id: id_gen.gen_id(),
            span: self.span,
            ty: self.ty.clone(),
            kind,
        }
    }

    pub fn as_bool_lit(&self) -> Option<bool> {
        match self.kind {
            ExprKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Null | ExprKind::Bool(_) | ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str(_)
        )
    }

    /// Literal equality, used for constant switch arm selection.
    pub fn literal_eq(&self, other: &Expr) -> bool {
        match (&self.kind, &other.kind) {
            (ExprKind::Null, ExprKind::Null) => true,
            (ExprKind::Bool(a), ExprKind::Bool(b)) => a == b,
            (ExprKind::Int(a), ExprKind::Int(b)) => a == b,
            (ExprKind::Float(a), ExprKind::Float(b)) => a == b,
            (ExprKind::Str(a), ExprKind::Str(b)) => a == b,
            _ => false,
        }
    }

    /// Render the expression in template source syntax, for dumps.
    pub fn to_source_string(&self) -> String {
        match &self.kind {
            ExprKind::Null => "null".to_string(),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Int(i) => i.to_string(),
            ExprKind::Float(x) => format!("{:?}", x),
            ExprKind::Str(s) => format!("'{}'", s),
            ExprKind::VarRef { name, .. } => format!("${}", name),
            ExprKind::Global { name } => name.to_string(),
            ExprKind::Not(e) => format!("not {}", e.to_source_string()),
            ExprKind::Neg(e) => format!("-{}", e.to_source_string()),
            ExprKind::Binary { op, left, right } => format!(
                "({} {} {})",
                left.to_source_string(),
                op.symbol(),
                right.to_source_string()
            ),
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => format!(
                "({} ? {} : {})",
                cond.to_source_string(),
                then_branch.to_source_string(),
                else_branch.to_source_string()
            ),
            ExprKind::V1Expression(s) => format!("v1Expression('{}')", s),
        }
    }
}
