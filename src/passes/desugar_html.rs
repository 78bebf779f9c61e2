//! Desugars HTML structural nodes back into raw text, the inverse of
//! HTML rewriting, for backends that cannot consume HTML nodes.
//!
//! Commands nested inside attribute values are lifted out as siblings
//! of the surrounding text. The raw-text combine pass that follows
//! stitches the fragments back together.

use crate::ast::{FileSetNode, NodeId, NodeIdGen, NodeKind, RawTextData, SourceSpan};
use crate::passes::{CompilerFileSetPass, PassCx, PassResult};
use crate::registry::TemplateRegistry;

pub struct DesugarHtmlNodesPass;

impl CompilerFileSetPass for DesugarHtmlNodesPass {
    fn name(&self) -> &'static str {
        "DesugarHtmlNodes"
    }

    fn run(&self, tree: &mut FileSetNode, _registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult {
        for file in tree.source_files() {
            for parent in tree.walk(file) {
                if !tree.contains(parent) {
                    continue;
                }
                desugar_children(tree, parent, cx.id_gen);
            }
        }
        PassResult::Continue
    }
}

fn desugar_children(tree: &mut FileSetNode, parent: NodeId, id_gen: &mut NodeIdGen) {
    for child in tree.children(parent).to_vec() {
        if !tree.contains(child) {
            continue;
        }
        match tree.kind(child) {
            NodeKind::HtmlOpenTag(_) => {
                let sequence = render_open_tag(tree, child, id_gen);
                let index = tree
                    .child_index(parent, child)
                    .expect("ICE: node is not a child of its parent");
                tree.insert_children(parent, index, &sequence);
                tree.release_subtree(child);
            }
            NodeKind::HtmlCloseTag(data) => {
                let text = format!("</{}>", data.tag);
                let span = tree.span(child);
                let raw = tree.new_node(NodeKind::RawText(RawTextData { text }), span, id_gen);
                let index = tree
                    .child_index(parent, child)
                    .expect("ICE: node is not a child of its parent");
                tree.insert_child(parent, index, raw);
                tree.release_subtree(child);
            }
            _ => {}
        }
    }
}

/// Render an open tag (with its attribute subtree) into a sequence of
/// raw-text nodes, lifting non-text attribute content out as siblings.
fn render_open_tag(tree: &mut FileSetNode, tag_id: NodeId, id_gen: &mut NodeIdGen) -> Vec<NodeId> {
    let (tag, self_closing) = match tree.kind(tag_id) {
        NodeKind::HtmlOpenTag(data) => (data.tag, data.self_closing),
        _ => panic!("ICE: node is not an open tag"),
    };
    let span = tree.span(tag_id);

    let mut out = Vec::new();
    let mut buffer = format!("<{}", tag);

    for attr_id in tree.children(tag_id).to_vec() {
        let attr_name = match tree.kind(attr_id) {
            NodeKind::HtmlAttribute(data) => data.name,
            _ => continue,
        };
        buffer.push(' ');
        buffer.push_str(&attr_name.to_string());

        let value_id = tree.children(attr_id).first().copied();
        if let Some(value_id) = value_id {
            buffer.push_str("=\"");
            for value_child in tree.children(value_id).to_vec() {
                match tree.kind(value_child) {
                    NodeKind::RawText(data) => buffer.push_str(&data.text),
                    _ => {
                        flush(&mut buffer, span, tree, id_gen, &mut out);
                        tree.remove_child(value_id, value_child);
                        out.push(value_child);
                    }
                }
            }
            buffer.push('"');
        }
    }

    buffer.push_str(if self_closing { "/>" } else { ">" });
    flush(&mut buffer, span, tree, id_gen, &mut out);
    out
}

fn flush(
    buffer: &mut String,
    span: SourceSpan,
    tree: &mut FileSetNode,
    id_gen: &mut NodeIdGen,
    out: &mut Vec<NodeId>,
) {
    if buffer.is_empty() {
        return;
    }
    let text = std::mem::take(buffer);
    out.push(tree.new_node(NodeKind::RawText(RawTextData { text }), span, id_gen));
}
