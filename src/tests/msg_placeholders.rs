//! Placeholder insertion inside `{msg}` subtrees.

use crate::ast::{NodeId, NodeKind};
use crate::passes::html_rewrite::HtmlRewritePass;
use crate::passes::msg_placeholders::InsertMsgPlaceholdersPass;
use crate::passes::{CompilerFilePass, PassCx};
use crate::tests::test_utils::Fixture;

fn run_placeholders(f: &mut Fixture, file: NodeId) {
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    InsertMsgPlaceholdersPass.run(&mut f.tree, file, &mut cx);
}

fn placeholder_names(f: &Fixture, msg: NodeId) -> Vec<String> {
    f.tree
        .children(msg)
        .iter()
        .filter_map(|&c| match f.tree.kind(c) {
            NodeKind::Placeholder(data) => Some(data.name.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn print_of_variable_becomes_named_placeholder() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let msg = f.msg(template, "greeting");
    f.raw_text(msg, "Hello ");
    let print = f.print_var(msg, "name");

    run_placeholders(&mut f, file);
    f.assert_no_errors();

    assert_eq!(placeholder_names(&f, msg), vec!["NAME".to_string()]);

    // The raw text is untouched; the print moved under the placeholder.
    let children = f.tree.children(msg).to_vec();
    assert!(matches!(f.tree.kind(children[0]), NodeKind::RawText(_)));
    let placeholder = children[1];
    assert_eq!(f.tree.children(placeholder).to_vec(), vec![print]);
    assert_eq!(f.tree.parent(print), Some(placeholder));
}

#[test]
fn colliding_names_get_numeric_suffixes() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let msg = f.msg(template, "d");
    f.print_var(msg, "name");
    f.print_var(msg, "name");
    f.print_var(msg, "name");

    run_placeholders(&mut f, file);

    assert_eq!(
        placeholder_names(&f, msg),
        vec!["NAME".to_string(), "NAME_1".to_string(), "NAME_2".to_string()]
    );
}

#[test]
fn html_tags_get_start_and_end_names() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let msg = f.msg(template, "d");
    f.raw_text(msg, "Click <a href=\"#\">here</a> now");

    // Placeholder naming depends on the html tag nodes, so the rewrite
    // runs first, as in the assembled pipeline.
    let mut cx = PassCx {
        id_gen: &mut f.id_gen,
        reporter: &mut f.reporter,
    };
    HtmlRewritePass.run(&mut f.tree, file, &mut cx);
    run_placeholders(&mut f, file);
    f.assert_no_errors();

    assert_eq!(
        placeholder_names(&f, msg),
        vec!["START_LINK".to_string(), "END_LINK".to_string()]
    );
}

#[test]
fn nested_commands_fall_back_to_generic_names() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let msg = f.msg(template, "d");
    f.call(msg, ".other", true);

    run_placeholders(&mut f, file);

    assert_eq!(placeholder_names(&f, msg), vec!["XXX".to_string()]);
}
