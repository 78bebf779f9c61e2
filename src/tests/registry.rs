//! Template registry construction, lookups and the synthetic channel.

use crate::ast::{intern, NodeKind, TemplateData};
use crate::registry::TemplateRegistry;
use crate::tests::test_utils::Fixture;

#[test]
fn registers_templates_by_fully_qualified_name() {
    let mut f = Fixture::new();
    let file = f.file("a.soy", "ns");
    let foo = f.template(file, ".foo");
    let bar = f.template(file, ".bar");

    let registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    f.assert_no_errors();
    assert_eq!(registry.basic_template(intern("ns.foo")), Some(foo));
    assert_eq!(registry.basic_template(intern("ns.bar")), Some(bar));
    assert_eq!(registry.basic_template(intern("ns.missing")), None);

    // Iteration follows file order, then in-file order.
    let names: Vec<String> = registry.basic_templates().map(|(n, _)| n.to_string()).collect();
    assert_eq!(names, vec!["ns.foo".to_string(), "ns.bar".to_string()]);
}

#[test]
fn duplicate_fully_qualified_name_first_wins() {
    let mut f = Fixture::new();
    let a = f.file("a.soy", "ns");
    let first = f.template(a, ".foo");
    let b = f.file("b.soy", "ns");
    let second = f.template(b, ".foo");
    let second_span = f.tree.span(second);

    let registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    assert_eq!(registry.basic_template(intern("ns.foo")), Some(first));
    let diags = f.reporter.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].location, second_span);
}

#[test]
fn delegate_candidates_sort_by_priority() {
    let mut f = Fixture::new();
    let file = f.file("a.soy", "ns");
    let low = f.deltemplate(file, "group", None, 0);
    let high = f.deltemplate(file, "group", None, 10);
    let mid = f.deltemplate(file, "group", None, 5);
    let variant = f.deltemplate(file, "group", Some("v"), 0);

    let registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    f.assert_no_errors();

    let candidates: Vec<_> = registry
        .delegate_candidates(intern("group"), None)
        .iter()
        .map(|e| e.template)
        .collect();
    assert_eq!(candidates, vec![high, mid, low]);

    let with_variant: Vec<_> = registry
        .delegate_candidates(intern("group"), Some(intern("v")))
        .iter()
        .map(|e| e.template)
        .collect();
    assert_eq!(with_variant, vec![variant]);

    // The raw set spans every variant.
    assert_eq!(registry.delegates_by_name(intern("group")).len(), 4);
}

#[test]
fn resolves_partial_names_through_the_namespace() {
    assert_eq!(
        TemplateRegistry::resolve_partial(intern("my.ns"), intern(".foo")),
        intern("my.ns.foo")
    );
}

#[test]
fn synthetic_templates_appear_after_reindex() {
    let mut f = Fixture::new();
    let file = f.file("a.soy", "ns");
    f.template(file, ".foo");

    let mut registry = TemplateRegistry::new(&f.tree, &mut f.reporter);

    let span = f.span();
    let synthetic = f.tree.new_node(
        NodeKind::Template(TemplateData::basic(intern("ns.synth"), intern(".synth"))),
        span,
        &mut f.id_gen,
    );
    f.tree.append_child(file, synthetic);

    registry.add_synthetic(synthetic);
    assert_eq!(registry.basic_template(intern("ns.synth")), None);

    registry.reindex(&f.tree, &mut f.reporter);
    assert_eq!(registry.basic_template(intern("ns.synth")), Some(synthetic));
    f.assert_no_errors();
}

#[test]
fn every_template_is_reachable_exactly_once() {
    let mut f = Fixture::new();
    let file = f.file("a.soy", "ns");
    let templates = vec![
        f.template(file, ".a"),
        f.template(file, ".b"),
        f.template(file, ".c"),
    ];

    let registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    let mut seen = Vec::new();
    for (_, id) in registry.basic_templates() {
        assert!(!seen.contains(&id));
        seen.push(id);
    }
    assert_eq!(seen, templates);
}
