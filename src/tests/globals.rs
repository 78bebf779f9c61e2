//! Compile-time global rewriting, the unknown-globals check, and the
//! v1 expression compatibility gate.

use hashbrown::HashMap;

use crate::ast::dumper::AstDumper;
use crate::ast::intern;
use crate::options::{CompilerOptions, GlobalValue};
use crate::passes::manager::PassManagerBuilder;
use crate::tests::test_utils::Fixture;

#[test]
fn configured_globals_are_substituted_in_place() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let global = f.global("app.DEBUG");
    let print = f.print_expr(template, global);

    let mut globals = HashMap::new();
    globals.insert(intern("app.DEBUG"), GlobalValue::Int(42));
    let options = CompilerOptions {
        compile_time_globals: globals,
        ..CompilerOptions::default()
    };
    f.run_with(PassManagerBuilder::new().options(options));

    f.assert_no_errors();
    let dump = AstDumper::dump_subtree(&f.tree, print);
    assert!(dump.starts_with("Print 42"), "got: {}", dump);
}

#[test]
fn unknown_globals_are_reported() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let global = f.global("app.MISSING");
    let global_span = global.span;
    f.print_expr(template, global);

    f.run_default();

    assert_eq!(f.error_messages(), vec!["Unknown global 'app.MISSING'.".to_string()]);
    assert_eq!(f.reporter.diagnostics()[0].location, global_span);
}

#[test]
fn unknown_globals_may_be_allowed() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let global = f.global("app.MISSING");
    f.print_expr(template, global);

    let options = CompilerOptions {
        allow_unknown_globals: true,
        ..CompilerOptions::default()
    };
    f.run_with(PassManagerBuilder::new().options(options));
    f.assert_no_errors();
}

#[test]
fn v1_expressions_are_rejected_by_default() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let legacy = f.v1_expr("$a.b.c");
    f.print_expr(template, legacy);

    f.run_default();

    let errors = f.error_messages();
    assert_eq!(errors, vec!["v1 expression support is disabled: $a.b.c.".to_string()]);
}

#[test]
fn v1_expressions_pass_when_allowed() {
    let mut f = Fixture::new();
    let file = f.file("test.soy", "ns");
    let template = f.template(file, ".foo");
    let legacy = f.v1_expr("$a.b.c");
    f.print_expr(template, legacy);

    let options = CompilerOptions {
        allow_v1_expression: true,
        ..CompilerOptions::default()
    };
    f.run_with(PassManagerBuilder::new().options(options));
    f.assert_no_errors();
}
