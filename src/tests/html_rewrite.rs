//! HTML rewriting, strict validation and desugaring.

use crate::ast::dumper::AstDumper;
use crate::ast::{ContentKind, NodeId, NodeKind, TemplateData};
use crate::passes::desugar_html::DesugarHtmlNodesPass;
use crate::passes::html_rewrite::HtmlRewritePass;
use crate::passes::raw_text::CombineConsecutiveRawTextNodesPass;
use crate::passes::strict_html::{StrictHtmlValidationNewMatcherPass, StrictHtmlValidationPass};
use crate::passes::{CompilerFilePass, CompilerFileSetPass, PassCx};
use crate::registry::TemplateRegistry;
use crate::tests::test_utils::Fixture;

fn run_rewrite(f: &mut Fixture, file: NodeId) {
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    HtmlRewritePass.run(&mut f.tree, file, &mut cx);
}

#[test]
fn partitions_raw_text_into_structural_nodes() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    f.raw_text(template, "<div class=\"x\">hi</div>");

    run_rewrite(&mut f, file);
    f.assert_no_errors();

    let dump = AstDumper::dump_subtree(&f.tree, template);
    assert_eq!(
        dump,
        "Template ns.foo\n\
         \x20 HtmlOpenTag <div>\n\
         \x20   HtmlAttribute class\n\
         \x20     HtmlAttributeValue\n\
         \x20       RawText \"x\"\n\
         \x20 RawText \"hi\"\n\
         \x20 HtmlCloseTag </div>\n"
    );
}

#[test]
fn void_tags_are_self_contained() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    f.raw_text(template, "a<br>b");

    run_rewrite(&mut f, file);

    let kinds: Vec<bool> = f
        .tree
        .children(template)
        .iter()
        .map(|&c| matches!(f.tree.kind(c), NodeKind::HtmlOpenTag(data) if data.self_closing))
        .collect();
    assert_eq!(kinds, vec![false, true, false]);
}

#[test]
fn pure_text_is_left_alone() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let raw = f.raw_text(template, "no markup, just 1 < 2 maybe");

    run_rewrite(&mut f, file);

    // "< 2" does not scan as a tag, so the node is untouched.
    assert_eq!(f.tree.children(template).to_vec(), vec![raw]);
    assert!(f.tree.kind(raw).is_raw_text());
}

#[test]
fn non_html_templates_are_skipped() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let namespace = f.tree.file_data(file).namespace;
    let name = TemplateRegistry::resolve_partial(namespace, crate::ast::intern(".txt"));
    let mut data = TemplateData::basic(name, crate::ast::intern(".txt"));
    data.content_kind = ContentKind::Text;
    let template = f.template_with(file, data);
    let raw = f.raw_text(template, "<div>not parsed</div>");

    run_rewrite(&mut f, file);
    assert_eq!(f.tree.children(template).to_vec(), vec![raw]);
}

#[test]
fn strict_validation_reports_unbalanced_tags() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let unclosed = f.template(file, ".a");
    f.raw_text(unclosed, "<div>");
    let unopened = f.template(file, ".b");
    f.raw_text(unopened, "</div>");

    run_rewrite(&mut f, file);
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    StrictHtmlValidationPass.run(&mut f.tree, file, &mut cx);

    let errors = f.error_messages();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.contains("Unclosed tag '<div>'")));
    assert!(errors.iter().any(|e| e.contains("Unexpected close tag '</div>'")));
}

#[test]
fn new_matcher_rejects_close_tags_for_void_elements() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    f.raw_text(template, "<br></br>");

    run_rewrite(&mut f, file);
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    StrictHtmlValidationNewMatcherPass.run(&mut f.tree, file, &mut cx);

    let errors = f.error_messages();
    assert_eq!(errors, vec!["Close tag for void element 'br'.".to_string()]);
}

#[test]
fn desugar_is_the_inverse_of_rewrite() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    f.raw_text(template, "<div class=\"x\">hi</div>");

    run_rewrite(&mut f, file);

    let mut registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    DesugarHtmlNodesPass.run(&mut f.tree, &mut registry, &mut cx);
    CombineConsecutiveRawTextNodesPass.run(&mut f.tree, &mut registry, &mut cx);

    let children = f.tree.children(template).to_vec();
    assert_eq!(children.len(), 1);
    match f.tree.kind(children[0]) {
        NodeKind::RawText(data) => assert_eq!(data.text, "<div class=\"x\">hi</div>"),
        other => panic!("expected raw text, got {:?}", other),
    }
}

#[test]
fn desugar_lifts_commands_out_of_attribute_values() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let tag = f.html_open_tag(template, "a", false);
    let attr = f.html_attribute(tag, "href");
    let value = f.html_attribute_value(attr);
    let print = f.print_var(value, "url");
    f.html_close_tag(template, "a");

    let mut registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    DesugarHtmlNodesPass.run(&mut f.tree, &mut registry, &mut cx);
    CombineConsecutiveRawTextNodesPass.run(&mut f.tree, &mut registry, &mut cx);

    let children = f.tree.children(template).to_vec();
    assert_eq!(children.len(), 3);
    match f.tree.kind(children[0]) {
        NodeKind::RawText(data) => assert_eq!(data.text, "<a href=\""),
        other => panic!("expected raw text, got {:?}", other),
    }
    assert_eq!(children[1], print);
    match f.tree.kind(children[2]) {
        NodeKind::RawText(data) => assert_eq!(data.text, "\"></a>"),
        other => panic!("expected raw text, got {:?}", other),
    }
}

/// Desugaring twice is the same as desugaring once: there is nothing
/// left to rewrite.
#[test]
fn desugar_is_idempotent() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    f.raw_text(template, "<div>hi</div>");

    run_rewrite(&mut f, file);

    let mut registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    DesugarHtmlNodesPass.run(&mut f.tree, &mut registry, &mut cx);
    CombineConsecutiveRawTextNodesPass.run(&mut f.tree, &mut registry, &mut cx);
    let once = AstDumper::dump_subtree(&f.tree, template);

    DesugarHtmlNodesPass.run(&mut f.tree, &mut registry, &mut cx);
    CombineConsecutiveRawTextNodesPass.run(&mut f.tree, &mut registry, &mut cx);
    let twice = AstDumper::dump_subtree(&f.tree, template);

    assert_eq!(once, twice);
}
