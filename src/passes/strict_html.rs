//! Strict HTML validation: open and close tags must balance within one
//! template. Two variants exist; the new matcher is selected by the
//! `new_html_matcher` experimental feature and additionally rejects
//! close tags for void elements.

use crate::ast::{ContentKind, FileSetNode, NodeId, NodeKind, Symbol, SourceSpan};
use crate::diagnostic::{ErrorReporter, SemanticError};
use crate::passes::html_rewrite::is_void_tag;
use crate::passes::{CompilerFilePass, PassCx};

pub struct StrictHtmlValidationPass;

impl CompilerFilePass for StrictHtmlValidationPass {
    fn name(&self) -> &'static str {
        "StrictHtmlValidation"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        validate_file(tree, file, cx.reporter, false);
    }
}

pub struct StrictHtmlValidationNewMatcherPass;

impl CompilerFilePass for StrictHtmlValidationNewMatcherPass {
    fn name(&self) -> &'static str {
        "StrictHtmlValidationNewMatcher"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        validate_file(tree, file, cx.reporter, true);
    }
}

fn validate_file(tree: &FileSetNode, file: NodeId, reporter: &mut ErrorReporter, check_void: bool) {
    for template in tree.templates_of(file) {
        if tree.template_data(template).content_kind != ContentKind::Html {
            continue;
        }
        validate_template(tree, template, reporter, check_void);
    }
}

fn validate_template(tree: &FileSetNode, template: NodeId, reporter: &mut ErrorReporter, check_void: bool) {
    let mut stack: Vec<(Symbol, SourceSpan)> = Vec::new();
    for id in tree.walk(template) {
        match tree.kind(id) {
            NodeKind::HtmlOpenTag(data) => {
                if !data.self_closing {
                    stack.push((data.tag, tree.span(id)));
                }
            }
            NodeKind::HtmlCloseTag(data) => {
                if check_void && is_void_tag(&data.tag.to_string()) {
                    reporter.report(SemanticError::CloseTagForVoidElement(data.tag), tree.span(id));
                    continue;
                }
                match stack.last() {
                    Some((open_tag, _)) if *open_tag == data.tag => {
                        stack.pop();
                    }
                    _ => {
                        reporter.report(SemanticError::UnexpectedCloseTag(data.tag), tree.span(id));
                    }
                }
            }
            _ => {}
        }
    }
    for (tag, span) in stack {
        reporter.report(SemanticError::UnclosedTag(tag), span);
    }
}
