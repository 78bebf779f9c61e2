//! Debug attribute injection: tags each template's root element with a
//! `data-debug-soy` attribute naming the template and its file, so
//! rendered output can be traced back to its source.
//!
//! Runs after placeholder insertion (so generated names are unaffected)
//! and before type resolution.

use crate::ast::{
    intern, ContentKind, FileSetNode, HtmlAttributeData, NodeId, NodeKind, RawTextData,
};
use crate::passes::{CompilerFilePass, PassCx};

pub struct AddDebugAttributesPass;

impl CompilerFilePass for AddDebugAttributesPass {
    fn name(&self) -> &'static str {
        "AddDebugAttributes"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let path = tree.file_data(file).path.clone();
        for template in tree.templates_of(file) {
            if tree.template_data(template).content_kind != ContentKind::Html {
                continue;
            }
            let root_tag = tree
                .walk(template)
                .into_iter()
                .find(|&id| matches!(tree.kind(id), NodeKind::HtmlOpenTag(_)));
            let Some(root_tag) = root_tag else {
                continue;
            };

            let name = tree.template_data(template).name;
            let span = tree.span(root_tag);
            let attr = tree.new_node(
                NodeKind::HtmlAttribute(HtmlAttributeData {
                    name: intern("data-debug-soy"),
                }),
                span,
                cx.id_gen,
            );
            let value = tree.new_node(NodeKind::HtmlAttributeValue, span, cx.id_gen);
            let text = tree.new_node(
                NodeKind::RawText(RawTextData {
                    text: format!("{} {}", name, path),
                }),
                span,
                cx.id_gen,
            );
            tree.append_child(root_tag, attr);
            tree.append_child(attr, value);
            tree.append_child(value, text);
        }
    }
}
