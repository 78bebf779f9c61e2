//! Placeholder insertion for translatable messages.
//!
//! Inside a `{msg}` subtree, every non-text child is wrapped in a
//! placeholder node with a stable generated name. Names derive from the
//! wrapped node's content (`NAME` for `{$name}`, `START_LINK`/`END_LINK`
//! for anchor tags) and get `_1`, `_2` suffixes on collision, so they
//! are collision-free within the enclosing msg.

use hashbrown::HashMap;

use crate::ast::exprs::ExprKind;
use crate::ast::{intern, FileSetNode, NodeId, NodeKind, PlaceholderData};
use crate::passes::{CompilerFilePass, PassCx};

pub struct InsertMsgPlaceholdersPass;

impl CompilerFilePass for InsertMsgPlaceholdersPass {
    fn name(&self) -> &'static str {
        "InsertMsgPlaceholders"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        for id in tree.walk(file) {
            if matches!(tree.kind(id), NodeKind::Msg(_)) {
                insert_placeholders(tree, id, cx);
            }
        }
    }
}

fn insert_placeholders(tree: &mut FileSetNode, msg: NodeId, cx: &mut PassCx<'_>) {
    let mut name_counts: HashMap<String, u32> = HashMap::new();
    for child in tree.children(msg).to_vec() {
        if tree.kind(child).is_raw_text() {
            continue;
        }
        let base = placeholder_base(tree, child);
        let count = name_counts.entry(base.clone()).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            base
        } else {
            format!("{}_{}", base, *count - 1)
        };

        let span = tree.span(child);
        let placeholder = tree.new_node(
            NodeKind::Placeholder(PlaceholderData { name: intern(&name) }),
            span,
            cx.id_gen,
        );
        tree.replace_child(msg, child, placeholder);
        tree.append_child(placeholder, child);
    }
}

/// Base placeholder name from the wrapped node's structural content.
fn placeholder_base(tree: &FileSetNode, node: NodeId) -> String {
    match tree.kind(node) {
        NodeKind::Print(data) => match &data.expr.kind {
            ExprKind::VarRef { name, .. } => upper_name(&name.to_string()),
            ExprKind::Global { name } => upper_name(&name.to_string()),
            _ => "XXX".to_string(),
        },
        NodeKind::HtmlOpenTag(data) => {
            let tag = data.tag.to_string();
            if data.self_closing {
                if tag == "br" {
                    "BREAK".to_string()
                } else {
                    upper_name(&tag)
                }
            } else if tag == "a" {
                "START_LINK".to_string()
            } else {
                format!("START_{}", upper_name(&tag))
            }
        }
        NodeKind::HtmlCloseTag(data) => {
            let tag = data.tag.to_string();
            if tag == "a" {
                "END_LINK".to_string()
            } else {
                format!("END_{}", upper_name(&tag))
            }
        }
        _ => "XXX".to_string(),
    }
}

fn upper_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}
