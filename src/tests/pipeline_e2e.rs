//! End-to-end pipeline scenarios: literal inputs through the default
//! configuration, plus the cross-cutting invariants (determinism,
//! parent links, id uniqueness).

use std::collections::HashSet;

use crate::ast::dumper::AstDumper;
use crate::ast::{NodeKind, TemplateKind};
use crate::passes::manager::PassManagerBuilder;
use crate::passes::{CompilerFileSetPass, PassCx, PassContinuationRule};
use crate::registry::TemplateRegistry;
use crate::tests::test_utils::Fixture;
use crate::types::SoyType;

/// One template `{if true}hi{/if}`: after optimization the body is a
/// single raw text node and there are no diagnostics.
#[test]
fn if_true_collapses_to_raw_text() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let if_node = f.if_node(template);
    let cond = f.bool_lit(true);
    let if_cond = f.if_cond(if_node, cond);
    f.raw_text(if_cond, "hi");

    let registry = f.run_default();

    f.assert_no_errors();
    assert_eq!(registry.basic_template(crate::ast::intern("ns.foo")), Some(template));

    let dump = AstDumper::dump_subtree(&f.tree, template);
    insta::assert_snapshot!(dump.trim_end(), @r#"
Template ns.foo
  RawText "hi"
"#);
}

/// An undefined variable produces exactly one diagnostic at the
/// reference's location; type resolution still runs and assigns the
/// unknown type without cascading.
#[test]
fn undefined_variable_reports_once_and_degrades() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let var = f.var("x");
    let var_span = var.span;
    let print = f.print_expr(template, var);

    f.run_default();

    let errors = f.error_messages();
    assert_eq!(errors, vec!["Unknown variable '$x'.".to_string()]);
    assert_eq!(f.reporter.diagnostics()[0].location, var_span);

    match f.tree.kind(print) {
        NodeKind::Print(data) => assert_eq!(data.expr.ty.get(), SoyType::Unknown),
        other => panic!("expected print node, got {:?}", other),
    }
}

/// STOP_AFTER on ResolveNames skips everything after it: the undefined
/// variable is still reported, the type error is not.
#[test]
fn stop_after_resolve_names_skips_later_passes() {
    let build = |f: &mut Fixture| {
        let file = f.file("test.soy", "ns");
        let template = f.template(file, ".foo");
        f.print_var(template, "x");
        let one = f.int_lit(1);
        let letter = f.str_lit("a");
        let cmp = f.binary(crate::ast::BinaryOp::Less, one, letter);
        f.print_expr(template, cmp);
    };

    let mut full = Fixture::new();
    build(&mut full);
    full.run_default();
    assert_eq!(full.error_messages().len(), 2, "full run reports name and type errors");

    let mut stopped = Fixture::new();
    build(&mut stopped);
    let registry = stopped.run_with(
        PassManagerBuilder::new()
            .add_pass_continuation_rule("ResolveNames", PassContinuationRule::StopAfterPass),
    );
    let errors = stopped.error_messages();
    assert_eq!(errors, vec!["Unknown variable '$x'.".to_string()]);
    // The registry is still built from the parsed templates.
    assert!(registry.basic_template(crate::ast::intern("ns.foo")).is_some());
}

/// Two templates with the same fully-qualified name: one diagnostic at
/// the second occurrence, the first wins.
#[test]
fn duplicate_template_reports_second_keeps_first() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let first = f.template(file, ".foo");
    let second = f.template(file, ".foo");
    let second_span = f.tree.span(second);

    let registry = f.run_default();

    let errors = f.error_messages();
    assert_eq!(errors, vec!["Template 'ns.foo' already defined.".to_string()]);
    assert_eq!(f.reporter.diagnostics()[0].location, second_span);
    assert_eq!(registry.basic_template(crate::ast::intern("ns.foo")), Some(first));
}

/// An element template declaring `@param s` and `@prop s`: exactly one
/// duplicate-declaration diagnostic at the param's name location.
#[test]
fn element_param_duplicating_prop_is_reported() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.element_template(file, ".el");
    f.prop(template, "s", "bool");
    f.param(template, "s", "bool");
    let param_span = f.tree.template_data(template).params[0].name_span;

    f.run_default();

    let errors = f.error_messages();
    assert_eq!(errors, vec!["Param 's' is a duplicate of prop var 's'.".to_string()]);
    assert_eq!(f.reporter.diagnostics()[0].location, param_span);
}

/// `{msg desc="x"}Hello {$name}{/msg}`: the print is wrapped in a
/// placeholder with a stable generated name, the text prefix stays one
/// node, and the placeholder survives the optimizer.
#[test]
fn msg_placeholder_is_stable_through_pipeline() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    f.param(template, "name", "string");
    let msg = f.msg(template, "x");
    f.raw_text(msg, "Hello ");
    f.print_var(msg, "name");

    f.run_default();
    f.assert_no_errors();

    let children = f.tree.children(msg).to_vec();
    assert_eq!(children.len(), 2);
    match f.tree.kind(children[0]) {
        NodeKind::RawText(data) => assert_eq!(data.text, "Hello "),
        other => panic!("expected raw text, got {:?}", other),
    }
    let placeholder = children[1];
    match f.tree.kind(placeholder) {
        NodeKind::Placeholder(data) => assert_eq!(data.name.to_string(), "NAME"),
        other => panic!("expected placeholder, got {:?}", other),
    }

    // The placeholder's identity is preserved across another optimizer
    // run.
    let mut registry = TemplateRegistry::new(&f.tree, &mut f.reporter);
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    crate::passes::optimize::OptimizationPass.run(&mut f.tree, &mut registry, &mut cx);
    assert!(f.tree.contains(placeholder));
    match f.tree.kind(placeholder) {
        NodeKind::Placeholder(data) => assert_eq!(data.name.to_string(), "NAME"),
        other => panic!("expected placeholder, got {:?}", other),
    }
}

fn build_rich_fileset(f: &mut Fixture) {
    let file = f.file("a.soy", "ns");
    let callee = f.template(file, ".callee");
    f.optional_param(callee, "p", "string");
    f.raw_text(callee, "<b>bold</b>");

    let caller = f.template(file, ".caller");
    f.param(caller, "name", "string");
    let msg = f.msg(caller, "greeting");
    f.raw_text(msg, "Hello ");
    f.print_var(msg, "name");
    let call = f.call(caller, ".callee", true);
    let arg = f.str_lit("v");
    f.call_param(call, "p", arg);
    let if_node = f.if_node(caller);
    let cond = f.bool_lit(false);
    let if_cond = f.if_cond(if_node, cond);
    f.raw_text(if_cond, "dead");
    let else_node = f.if_else(if_node);
    f.raw_text(else_node, "live");
}

/// Running the pipeline twice on structurally-equal inputs yields
/// structurally-equal outputs and the same diagnostic list.
#[test]
fn pipeline_is_deterministic() {
    let mut first = Fixture::new();
    build_rich_fileset(&mut first);
    first.run_default();

    let mut second = Fixture::new();
    build_rich_fileset(&mut second);
    second.run_default();

    assert_eq!(AstDumper::dump(&first.tree), AstDumper::dump(&second.tree));
    assert_eq!(first.error_messages(), second.error_messages());
}

/// After the pipeline, every reachable node has a consistent parent
/// link and every id (arena and expression) is unique.
#[test]
fn parent_links_and_id_uniqueness_hold_after_pipeline() {
    let mut f = Fixture::new();
    build_rich_fileset(&mut f);
    f.run_default();

    f.tree.check_parent_links();

    let ids = f.tree.all_ids();
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len(), "node ids must be unique across the fileset");
}

/// Cloning a subtree allocates a fresh id for every node in the clone.
#[test]
fn clone_subtree_uses_fresh_ids() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let if_node = f.if_node(template);
    let cond = f.bool_lit(true);
    let if_cond = f.if_cond(if_node, cond);
    f.raw_text(if_cond, "hi");

    let original_ids: HashSet<_> = f
        .tree
        .walk(if_node)
        .into_iter()
        .flat_map(|id| {
            let mut ids = vec![id];
            for expr in f.tree.kind(id).exprs() {
                expr.for_each(&mut |e| ids.push(e.id));
            }
            ids
        })
        .collect();

    let clone = f.tree.clone_subtree(if_node, &mut f.id_gen);
    let mut clone_ids = Vec::new();
    for id in f.tree.walk(clone) {
        clone_ids.push(id);
        for expr in f.tree.kind(id).exprs() {
            expr.for_each(&mut |e| clone_ids.push(e.id));
        }
    }

    assert_eq!(clone_ids.len(), original_ids.len());
    for id in clone_ids {
        assert!(!original_ids.contains(&id), "clone reused id {}", id);
    }
}

/// Dependency files are registry-only: single-file passes never rewrite
/// them.
#[test]
fn dependency_files_are_not_rewritten() {
    let mut f = Fixture::new();
    let dep = f.file_of_kind("dep.soy", "dep", crate::ast::FileKind::Dep);
    let dep_template = f.template(dep, ".t");
    let if_node = f.if_node(dep_template);
    let cond = f.bool_lit(true);
    let if_cond = f.if_cond(if_node, cond);
    f.raw_text(if_cond, "hi");

    let src = f.file("src.soy", "ns");
    f.template(src, ".main");

    f.run_default();
    f.assert_no_errors();

    // The dep file keeps its unoptimized shape.
    assert!(matches!(f.tree.kind(if_node), NodeKind::If));
    assert!(matches!(
        f.tree.template_data(dep_template).kind,
        TemplateKind::Regular
    ));
}
