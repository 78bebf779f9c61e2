//! Renders a fileset to a stable indented text form.
//!
//! Used by snapshot tests and for debugging; the output format is part
//! of the test surface, so keep changes deliberate.

use crate::ast::{FileSetNode, NodeId, NodeKind, TemplateKind};

pub struct AstDumper;

impl AstDumper {
    /// Dump every file in the fileset.
    pub fn dump(tree: &FileSetNode) -> String {
        let mut out = String::new();
        for &file in tree.files() {
            Self::dump_node(tree, file, 0, &mut out);
        }
        out
    }

    /// Dump a single subtree.
    pub fn dump_subtree(tree: &FileSetNode, root: NodeId) -> String {
        let mut out = String::new();
        Self::dump_node(tree, root, 0, &mut out);
        out
    }

    fn dump_node(tree: &FileSetNode, id: NodeId, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&Self::describe(tree, id));
        out.push('\n');
        for &child in tree.children(id) {
            Self::dump_node(tree, child, depth + 1, out);
        }
    }

    fn describe(tree: &FileSetNode, id: NodeId) -> String {
        match tree.kind(id) {
            NodeKind::File(data) => format!("File {} ns={} kind={:?}", data.path, data.namespace, data.kind),
            NodeKind::Template(data) => match &data.kind {
                TemplateKind::Regular => format!("Template {}", data.name),
                TemplateKind::Element => format!("Element {}", data.name),
                TemplateKind::Delegate {
                    del_name,
                    variant,
                    priority,
                } => {
                    let variant = variant.map(|v| format!(" variant={}", v)).unwrap_or_default();
                    format!("DelTemplate {}{} priority={}", del_name, variant, priority)
                }
            },
            NodeKind::RawText(data) => format!("RawText {:?}", data.text),
            NodeKind::Print(data) => {
                let mut s = format!("Print {}", data.expr.to_source_string());
                for directive in &data.directives {
                    s.push_str(&format!(" |{}", directive));
                }
                s
            }
            NodeKind::Msg(data) => format!("Msg desc={:?}", data.desc),
            NodeKind::Placeholder(data) => format!("Placeholder {}", data.name),
            NodeKind::Call(data) => {
                let delegate = if data.is_delegate { "DelCall" } else { "Call" };
                format!("{} {}", delegate, data.callee)
            }
            NodeKind::Let(data) => match &data.value {
                Some(value) => format!("Let ${} = {}", data.var, value.to_source_string()),
                None => format!("Let ${}", data.var),
            },
            NodeKind::For(data) => format!("For ${} in {}", data.var, data.expr.to_source_string()),
            NodeKind::If => "If".to_string(),
            NodeKind::IfCond(data) => format!("IfCond {}", data.cond.to_source_string()),
            NodeKind::IfElse => "IfElse".to_string(),
            NodeKind::Switch(data) => format!("Switch {}", data.expr.to_source_string()),
            NodeKind::SwitchCase(data) => {
                let exprs: Vec<String> = data.exprs.iter().map(|e| e.to_source_string()).collect();
                format!("SwitchCase {}", exprs.join(", "))
            }
            NodeKind::SwitchDefault => "SwitchDefault".to_string(),
            NodeKind::VeLog(data) => format!("VeLog {}", data.name),
            NodeKind::HtmlOpenTag(data) => {
                if data.self_closing {
                    format!("HtmlOpenTag <{}/>", data.tag)
                } else {
                    format!("HtmlOpenTag <{}>", data.tag)
                }
            }
            NodeKind::HtmlCloseTag(data) => format!("HtmlCloseTag </{}>", data.tag),
            NodeKind::HtmlAttribute(data) => format!("HtmlAttribute {}", data.name),
            NodeKind::HtmlAttributeValue => "HtmlAttributeValue".to_string(),
        }
    }
}
