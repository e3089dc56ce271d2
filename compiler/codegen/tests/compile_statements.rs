//! Jasmin-level integration tests for statements built with the syntax
//! tree shorthands.

mod common;

use common::{compile_tree, method_text};
use jmmc_analyzer::{stages::analyze, type_resolution::MemberPolicy};
use jmmc_codegen::{compile, CodegenError};
use jmmc_optimizer::{generate, GeneratorOptions};
use jmmc_test::ast::*;

#[test]
fn compile_when_if_else_then_else_branch_first() {
    let tree = program(
        &["io"],
        class(
            "Simple",
            None,
            vec![main_method(vec![
                var_decl("int", "x"),
                assign("x", int(3)),
                if_else(
                    bin_op("Less", id("x"), int(4)),
                    expr_stmt(call(id("io"), "println", vec![int(1)])),
                    expr_stmt(call(id("io"), "println", vec![int(2)])),
                ),
            ])],
        ),
    );

    let output = compile_tree(tree, true);

    let main = method_text(&output.code, "main");
    let then_at = main.find("\ticonst_1\n\tinvokestatic io/println(I)V").unwrap();
    let else_at = main.find("\ticonst_2\n\tinvokestatic io/println(I)V").unwrap();
    assert!(else_at < then_at, "{}", main);
    assert!(main.contains("\ticonst_4\n\tif_icmplt Then"), "{}", main);
    assert!(main.contains("\tgoto After"), "{}", main);
}

#[test]
fn compile_when_not_condition_optimized_then_ifeq() {
    let tree = program(
        &["io"],
        class(
            "Simple",
            None,
            vec![main_method(vec![
                var_decl("boolean", "done"),
                assign("done", boolean(false)),
                while_loop(not(id("done")), scope(vec![assign("done", boolean(true))])),
            ])],
        ),
    );

    let output = compile_tree(tree, true);

    let main = method_text(&output.code, "main");
    assert!(main.contains("\tiload_1\n\tifeq Body"), "{}", main);
}

#[test]
fn compile_when_and_condition_optimized_then_short_circuit() {
    let tree = program(
        &[],
        class(
            "Simple",
            None,
            vec![main_method(vec![
                var_decl("boolean", "a"),
                var_decl("int", "x"),
                assign("a", boolean(true)),
                assign("x", int(0)),
                while_loop(
                    bin_op("And", id("a"), bin_op("Less", id("x"), int(10))),
                    scope(vec![assign("x", bin_op("Add", id("x"), int(1)))]),
                ),
            ])],
        ),
    );

    let output = compile_tree(tree, true);

    let main = method_text(&output.code, "main");
    assert!(main.contains("\tifeq Condition_"), "{}", main);
    assert!(main.contains("\tiinc 2 1\n"), "{}", main);
}

#[test]
fn compile_when_length_then_arraylength() {
    let tree = program(
        &[],
        class(
            "Simple",
            None,
            vec![
                method(
                    "int",
                    "size",
                    &[("int[]", "values")],
                    vec![],
                    Some(length(id("values"))),
                ),
                main_method(vec![]),
            ],
        ),
    );

    let output = compile_tree(tree, false);

    let size = method_text(&output.code, "size");
    assert!(size.starts_with(".method public size([I)I\n"), "{}", size);
    assert!(size.contains("\taload_1\n\tarraylength\n"), "{}", size);
}

#[test]
fn compile_when_boolean_index_then_invalid_type_error() {
    let mut tree = program(
        &[],
        class(
            "Simple",
            None,
            vec![main_method(vec![
                var_decl("int[]", "a"),
                var_decl("int", "x"),
                assign("a", new_array(int(2))),
                assign("x", index(id("a"), boolean(true))),
            ])],
        ),
    );
    let analysis = analyze(&mut tree, MemberPolicy::Permissive).unwrap();
    assert!(analysis.has_errors());

    let program = generate(&tree, &analysis.value, &GeneratorOptions::default());
    let result = compile(&program.value);

    assert!(matches!(result, Err(CodegenError::InvalidType(_))), "{:?}", result);
}

#[test]
fn compile_when_this_passed_as_superclass_then_declared_descriptor() {
    let tree = program(
        &["Base"],
        class(
            "Simple",
            Some("Base"),
            vec![
                method("int", "take", &[("Base", "x")], vec![], Some(int(1))),
                method(
                    "int",
                    "run",
                    &[],
                    vec![var_decl("int", "r"), assign("r", call(this(), "take", vec![this()]))],
                    Some(id("r")),
                ),
                main_method(vec![]),
            ],
        ),
    );

    let output = compile_tree(tree, false);

    let take = method_text(&output.code, "take");
    assert!(take.starts_with(".method public take(LBase;)I\n"), "{}", take);
    let run = method_text(&output.code, "run");
    assert!(run.contains("\taload_0\n\taload_0\n\tinvokevirtual Simple/take(LBase;)I\n"), "{}", run);
}

#[test]
fn compile_when_int_passed_as_int_array_then_declared_descriptor() {
    let tree = program(
        &[],
        class(
            "Simple",
            None,
            vec![
                method("int", "first", &[("int[]", "values")], vec![], Some(int(0))),
                method(
                    "int",
                    "run",
                    &[],
                    vec![var_decl("int", "r"), assign("r", call(this(), "first", vec![int(3)]))],
                    Some(id("r")),
                ),
                main_method(vec![]),
            ],
        ),
    );

    let output = compile_tree(tree, false);

    let run = method_text(&output.code, "run");
    assert!(run.contains("\tinvokevirtual Simple/first([I)I\n"), "{}", run);
}

#[test]
fn compile_when_inherited_result_is_argument_then_int_temporary() {
    let tree = program(
        &["io", "Base"],
        class(
            "Simple",
            Some("Base"),
            vec![
                method(
                    "int",
                    "bar",
                    &[],
                    vec![expr_stmt(call(id("io"), "println", vec![call(this(), "foo", vec![])]))],
                    Some(int(0)),
                ),
                main_method(vec![]),
            ],
        ),
    );

    let output = compile_tree(tree, false);

    let bar = method_text(&output.code, "bar");
    assert!(bar.contains("\tinvokevirtual Simple/foo()I\n\tistore_1\n"), "{}", bar);
    assert!(bar.contains("\tiload_1\n\tinvokestatic io/println(I)V\n"), "{}", bar);
    assert!(!bar.contains("astore"), "{}", bar);
}
