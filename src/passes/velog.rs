//! `{velog}` validation against the logging configuration.

use crate::ast::{FileSetNode, NodeId, NodeKind};
use crate::diagnostic::SemanticError;
use crate::options::ValidatedLoggingConfig;
use crate::passes::{CompilerFilePass, PassCx};

pub struct VeLogValidationPass {
    pub config: ValidatedLoggingConfig,
}

impl CompilerFilePass for VeLogValidationPass {
    fn name(&self) -> &'static str {
        "VeLogValidation"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let tree = &*tree;
        for id in tree.walk(file) {
            if let NodeKind::VeLog(data) = tree.kind(id) {
                if self.config.element(data.name).is_none() {
                    cx.reporter
                        .report(SemanticError::UnknownLoggingElement(data.name), tree.span(id));
                }
            }
        }
    }
}
