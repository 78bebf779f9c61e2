//! Element template checks.
//!
//! Element templates may not carry the command attributes that their
//! header fixes (`autoescape`, `kind`, `stricthtml`, `visibility`), and
//! a `@param` may not duplicate a `@prop` name. The duplicate is
//! reported at the param's name location.

use hashbrown::HashSet;

use crate::ast::{FileSetNode, NodeId, Symbol, TemplateKind};
use crate::diagnostic::SemanticError;
use crate::passes::{CompilerFilePass, PassCx};

const BANNED_ATTRIBUTE_NAMES: [&str; 4] = ["autoescape", "kind", "stricthtml", "visibility"];

pub struct SoyElementPass;

impl CompilerFilePass for SoyElementPass {
    fn name(&self) -> &'static str {
        "SoyElement"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let tree = &*tree;
        for template in tree.templates_of(file) {
            let data = tree.template_data(template);
            if data.kind != TemplateKind::Element {
                continue;
            }

            for attr in &data.command_attrs {
                let name = attr.name.to_string();
                if BANNED_ATTRIBUTE_NAMES.contains(&name.as_str()) {
                    cx.reporter.report(SemanticError::BannedAttribute(attr.name), attr.span);
                }
            }

            let prop_names: HashSet<Symbol> = data.prop_vars.iter().map(|p| p.name).collect();
            for param in &data.params {
                if prop_names.contains(&param.name) {
                    cx.reporter
                        .report(SemanticError::DuplicateDeclaration(param.name), param.name_span);
                }
            }
        }
    }
}
