//! AST node kind definitions and their payload structs.
//!
//! Node kind is a closed tagged union; passes dispatch with exhaustive
//! matches. Payload structs keep the enum variants small and give the
//! larger headers (files, templates, calls) named fields.

use std::cell::Cell;
use thin_vec::ThinVec;

use crate::ast::exprs::Expr;
use crate::ast::Symbol;
use crate::source_manager::SourceSpan;

/// The role of a file inside one compile invocation. Only `Src` files
/// are rewritten; dependency files exist for the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Src,
    Dep,
    IndirectDep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoescapeMode {
    Strict,
    Contextual,
    NonContextual,
}

/// Declared content kind of a template body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Text,
    Js,
    Css,
    Uri,
    Attributes,
}

/// A declared `@param` or `@prop` header variable.
#[derive(Debug, Clone)]
pub struct HeaderVar {
    pub name: Symbol,
    pub name_span: SourceSpan,
    /// Declared type name, resolved through the type registry.
    pub type_name: Symbol,
    pub required: bool,
}

/// A raw command tag attribute as written in the template header.
#[derive(Debug, Clone)]
pub struct CommandAttr {
    pub name: Symbol,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct FileData {
    pub path: String,
    pub kind: FileKind,
    pub namespace: Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateKind {
    Regular,
    Delegate {
        del_name: Symbol,
        variant: Option<Symbol>,
        priority: u32,
    },
    Element,
}

#[derive(Debug, Clone)]
pub struct TemplateData {
    pub kind: TemplateKind,
    /// Fully-qualified name (namespace + partial name).
    pub name: Symbol,
    /// Partial name as written, with the leading dot.
    pub partial_name: Symbol,
    pub visibility: Visibility,
    pub autoescape_mode: AutoescapeMode,
    pub content_kind: ContentKind,
    pub params: ThinVec<HeaderVar>,
    pub prop_vars: ThinVec<HeaderVar>,
    pub required_css: ThinVec<Symbol>,
    pub command_attrs: ThinVec<CommandAttr>,
}

impl TemplateData {
    /// A minimal regular template header; tests and synthetic templates
    /// start from this.
    pub fn basic(name: Symbol, partial_name: Symbol) -> TemplateData {
        TemplateData {
            kind: TemplateKind::Regular,
            name,
            partial_name,
            visibility: Visibility::Public,
            autoescape_mode: AutoescapeMode::Strict,
            content_kind: ContentKind::Html,
            params: ThinVec::new(),
            prop_vars: ThinVec::new(),
            required_css: ThinVec::new(),
            command_attrs: ThinVec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawTextData {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PrintData {
    pub expr: Expr,
    /// Print directive chain, in application order.
    pub directives: ThinVec<Symbol>,
}

#[derive(Debug, Clone)]
pub struct MsgData {
    pub desc: String,
}

#[derive(Debug, Clone)]
pub struct PlaceholderData {
    /// Stable generated placeholder identifier, unique within the msg.
    pub name: Symbol,
}

#[derive(Debug, Clone)]
pub struct CallParam {
    pub name: Symbol,
    pub name_span: SourceSpan,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct CallData {
    /// Callee as written: either a fully-qualified name or a partial
    /// name starting with a dot.
    pub callee: Symbol,
    pub is_partial: bool,
    pub is_delegate: bool,
    pub variant: Option<Symbol>,
    /// `data="all"` passes the caller's params through.
    pub data_all: bool,
    pub params: ThinVec<CallParam>,
    /// Fully-qualified callee, cached by the first cross-template pass
    /// that resolves it.
    pub resolved: Cell<Option<Symbol>>,
}

#[derive(Debug, Clone)]
pub struct LetData {
    pub var: Symbol,
    /// Value expression; a `{let}` with children is a block-form let.
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ForData {
    pub var: Symbol,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct IfCondData {
    pub cond: Expr,
}

#[derive(Debug, Clone)]
pub struct SwitchData {
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct SwitchCaseData {
    pub exprs: ThinVec<Expr>,
}

#[derive(Debug, Clone)]
pub struct VeLogData {
    pub name: Symbol,
}

#[derive(Debug, Clone)]
pub struct HtmlTagData {
    pub tag: Symbol,
    /// True for void elements and explicit `/>` tags.
    pub self_closing: bool,
}

#[derive(Debug, Clone)]
pub struct HtmlAttributeData {
    pub name: Symbol,
}

/// The closed set of node kinds. Children live in the owning
/// [`Node`](crate::ast::Node); payloads here carry everything else.
#[derive(Debug, Clone)]
pub enum NodeKind {
    File(FileData),
    Template(TemplateData),
    RawText(RawTextData),
    Print(PrintData),
    Msg(MsgData),
    Placeholder(PlaceholderData),
    Call(CallData),
    Let(LetData),
    For(ForData),
    If,
    IfCond(IfCondData),
    IfElse,
    Switch(SwitchData),
    SwitchCase(SwitchCaseData),
    SwitchDefault,
    VeLog(VeLogData),
    HtmlOpenTag(HtmlTagData),
    HtmlCloseTag(HtmlTagData),
    HtmlAttribute(HtmlAttributeData),
    HtmlAttributeValue,
}

impl NodeKind {
    /// Command name for conformance matching; structural and text nodes
    /// have none.
    pub fn command_name(&self) -> Option<&'static str> {
        match self {
            NodeKind::Print(_) => Some("print"),
            NodeKind::Msg(_) => Some("msg"),
            NodeKind::Call(_) => Some("call"),
            NodeKind::Let(_) => Some("let"),
            NodeKind::For(_) => Some("for"),
            NodeKind::If => Some("if"),
            NodeKind::Switch(_) => Some("switch"),
            NodeKind::VeLog(_) => Some("velog"),
            _ => None,
        }
    }

    pub fn is_raw_text(&self) -> bool {
        matches!(self, NodeKind::RawText(_))
    }

    pub fn is_html(&self) -> bool {
        matches!(
            self,
            NodeKind::HtmlOpenTag(_)
                | NodeKind::HtmlCloseTag(_)
                | NodeKind::HtmlAttribute(_)
                | NodeKind::HtmlAttributeValue
        )
    }

    /// Shared references to the expression roots held by this node.
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            NodeKind::Print(data) => vec![&data.expr],
            NodeKind::Call(data) => data.params.iter().map(|p| &p.value).collect(),
            NodeKind::Let(data) => data.value.iter().collect(),
            NodeKind::For(data) => vec![&data.expr],
            NodeKind::IfCond(data) => vec![&data.cond],
            NodeKind::Switch(data) => vec![&data.expr],
            NodeKind::SwitchCase(data) => data.exprs.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Mutable references to the expression roots held by this node.
    pub fn exprs_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            NodeKind::Print(data) => vec![&mut data.expr],
            NodeKind::Call(data) => data.params.iter_mut().map(|p| &mut p.value).collect(),
            NodeKind::Let(data) => data.value.iter_mut().collect(),
            NodeKind::For(data) => vec![&mut data.expr],
            NodeKind::IfCond(data) => vec![&mut data.cond],
            NodeKind::Switch(data) => vec![&mut data.expr],
            NodeKind::SwitchCase(data) => data.exprs.iter_mut().collect(),
            _ => Vec::new(),
        }
    }
}
