//! The autoescaper and its companions.
//!
//! The autoescaper rewrites every print directive chain to be
//! context-appropriate for where the print lands in the output. It
//! requires that HTML rewriting has run, and it is the one pass allowed
//! to observe previously-reported diagnostics: when the sink already
//! holds errors (e.g. from type checking) it declines to rewrite.
//!
//! It also owns the registry's synthetic-template channel: any template
//! it fabricates is queued with `add_synthetic` and published with
//! `reindex` before the pass returns.

use crate::ast::{intern, ContentKind, FileSetNode, NodeId, NodeKind, Symbol};
use crate::diagnostic::SemanticError;
use crate::passes::{CompilerFilePass, CompilerFileSetPass, PassCx, PassResult};
use crate::registry::TemplateRegistry;
use crate::types::SoyType;

pub struct AutoescaperPass;

impl CompilerFileSetPass for AutoescaperPass {
    fn name(&self) -> &'static str {
        "Autoescaper"
    }

    fn synthesizes_templates(&self) -> bool {
        true
    }

    fn run(&self, tree: &mut FileSetNode, registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult {
        // Escaping decisions need valid earlier analysis; decline when
        // anything upstream already failed.
        if cx.reporter.has_errors() {
            return PassResult::Continue;
        }

        for file in tree.source_files() {
            for template in tree.templates_of(file) {
                let content_kind = tree.template_data(template).content_kind;
                for &child in &tree.children(template).to_vec() {
                    escape_node(tree, child, content_kind, false);
                }
            }
        }

        // Publish anything queued through the synthetic channel before
        // dependent passes run.
        registry.reindex(tree, cx.reporter);
        PassResult::Continue
    }
}

fn escape_node(tree: &mut FileSetNode, id: NodeId, content_kind: ContentKind, in_attribute: bool) {
    let enters_attribute = matches!(tree.kind(id), NodeKind::HtmlAttributeValue);
    if let NodeKind::Print(data) = &mut tree.node_mut(id).kind {
        if !has_escaping_directive(&data.directives) {
            if let Some(directive) = escaping_directive(content_kind, in_attribute) {
                data.directives.push(intern(directive));
            }
        }
    }
    for child in tree.children(id).to_vec() {
        escape_node(tree, child, content_kind, in_attribute || enters_attribute);
    }
}

fn escaping_directive(content_kind: ContentKind, in_attribute: bool) -> Option<&'static str> {
    match content_kind {
        ContentKind::Html => {
            if in_attribute {
                Some("escapeHtmlAttribute")
            } else {
                Some("escapeHtml")
            }
        }
        ContentKind::Attributes => Some("escapeHtmlAttribute"),
        ContentKind::Js => Some("escapeJsValue"),
        ContentKind::Css => Some("filterCssValue"),
        ContentKind::Uri => Some("normalizeUri"),
        ContentKind::Text => None,
    }
}

fn has_escaping_directive(directives: &[Symbol]) -> bool {
    directives.iter().any(|d| {
        let name = d.to_string();
        name.starts_with("escape")
            || name.starts_with("filter")
            || name.starts_with("normalize")
            || name == "noAutoescape"
    })
}

/// Enforces strict autoescaping when the configuration requires it.
pub struct AssertStrictAutoescapingPass;

impl CompilerFilePass for AssertStrictAutoescapingPass {
    fn name(&self) -> &'static str {
        "AssertStrictAutoescaping"
    }

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>) {
        let tree = &*tree;
        for template in tree.templates_of(file) {
            let data = tree.template_data(template);
            if data.autoescape_mode != crate::ast::AutoescapeMode::Strict {
                cx.reporter
                    .report(SemanticError::NonStrictTemplate, tree.span(template));
            }
        }
    }
}

/// Flags HTML-typed values printed into attribute-value context, where
/// markup cannot be emitted. Relies on the autoescaper's directive
/// rewriting and on resolved expression types.
pub struct CheckBadContextualUsagePass;

impl CompilerFileSetPass for CheckBadContextualUsagePass {
    fn name(&self) -> &'static str {
        "CheckBadContextualUsage"
    }

    fn run(&self, tree: &mut FileSetNode, _registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult {
        let escape_attribute = intern("escapeHtmlAttribute");
        for file in tree.source_files() {
            for id in tree.walk(file) {
                if let NodeKind::Print(data) = tree.kind(id) {
                    if data.directives.contains(&escape_attribute) && data.expr.ty.get() == SoyType::Html {
                        cx.reporter.report(SemanticError::BadContextualUsage, tree.span(id));
                    }
                }
            }
        }
        PassResult::Continue
    }
}
