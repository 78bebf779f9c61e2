//! Conformance checking: a pure inspector over a pre-validated policy.

use crate::ast::{FileSetNode, NodeId, NodeKind};
use crate::diagnostic::SemanticError;
use crate::options::{Requirement, ValidatedConformanceConfig};
use crate::passes::{CompilerFilePass, PassCx};

pub struct SoyConformancePass {
    pub config: ValidatedConformanceConfig,
}

impl CompilerFilePass for SoyConformancePass {
    fn name(&self) -> &'static str {
        "SoyConformance"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        if self.config.rules.is_empty() {
            return;
        }
        let tree = &*tree;
        for id in tree.walk(file) {
            for rule in &self.config.rules {
                if violates(tree.kind(id), &rule.requirement) {
                    cx.reporter.report(
                        SemanticError::Conformance(rule.error_message.clone()),
                        tree.span(id),
                    );
                }
            }
        }
    }
}

fn violates(kind: &NodeKind, requirement: &Requirement) -> bool {
    match requirement {
        Requirement::BannedCommand(name) => kind.command_name() == Some(name.as_str()),
        Requirement::BannedRawTextContent(substring) => match kind {
            NodeKind::RawText(data) => data.text.contains(substring.as_str()),
            _ => false,
        },
        Requirement::BannedHtmlAttribute(name) => match kind {
            NodeKind::HtmlAttribute(data) => data.name == *name,
            _ => false,
        },
    }
}
