//! Jasmin-level integration tests for the shared syntax tree fixtures.

mod common;

use common::{compile_fixture, method_text};

#[test]
fn compile_when_simple_then_stores_and_returns_local() {
    let output = compile_fixture("simple.json", false);

    assert_eq!(output.class_name, "Simple");
    let main = method_text(&output.code, "main");
    assert!(main.starts_with(".method public main([Ljava/lang/String;)I\n"), "{}", main);
    // this=0, a=1, x=2
    assert!(main.contains("\ticonst_1\n\tistore_2\n\tiload_2\n\tireturn\n"), "{}", main);
    assert!(main.contains("\t.limit stack 1\n"), "{}", main);
    assert!(main.contains("\t.limit locals 3\n"), "{}", main);
}

#[test]
fn compile_when_simple_then_class_header_and_constructor() {
    let output = compile_fixture("simple.json", false);

    assert!(output.code.starts_with(".class public Simple\n.super java/lang/Object\n\n"));
    let init = method_text(&output.code, "<init>");
    assert!(init.contains("\taload_0\n\tinvokespecial java/lang/Object/<init>()V\n\treturn\n"), "{}", init);
}

#[test]
fn compile_when_loops_then_fields_and_calls() {
    let output = compile_fixture("loops.json", false);

    let code = &output.code;
    assert!(code.contains(".field values [I\n"), "{}", code);
    assert!(code.contains("\tputfield Loops/values [I\n"), "{}", code);
    assert!(code.contains("\tgetfield Loops/values [I\n"), "{}", code);
    assert!(code.contains("\tnewarray int\n"), "{}", code);

    let main = method_text(code, "main");
    assert!(main.starts_with(".method public static main([Ljava/lang/String;)V\n"), "{}", main);
    assert!(main.contains("\tnew Loops\n\tdup\n\tinvokespecial Loops/<init>()V\n\tastore"), "{}", main);
    assert!(main.contains("\tinvokevirtual Loops/sum(I)I\n"), "{}", main);
    assert!(main.contains("\tinvokestatic io/println(I)V\n"), "{}", main);
    assert!(main.trim_end().ends_with("\treturn"), "{}", main);
}

#[test]
fn compile_when_loops_then_increment_and_back_edge() {
    let output = compile_fixture("loops.json", false);

    let sum = method_text(&output.code, "sum");
    assert!(sum.contains("Loop1:\n"), "{}", sum);
    assert!(sum.contains("\tgoto Loop1\n"), "{}", sum);
    assert!(sum.contains("\tgoto End3\n"), "{}", sum);
    assert!(sum.contains("\tiinc "), "{}", sum);
    assert!(sum.contains("\tiaload\n"), "{}", sum);
    assert!(sum.contains("\tiastore\n"), "{}", sum);
    assert!(sum.contains("\tireturn\n"), "{}", sum);
}

#[test]
fn compile_when_loops_not_optimized_then_condition_materialized() {
    let output = compile_fixture("loops.json", false);

    let sum = method_text(&output.code, "sum");
    assert!(sum.contains("\tif_icmplt True_"), "{}", sum);
    assert!(sum.contains("\tifne Body2\n"), "{}", sum);
}

#[test]
fn compile_when_loops_optimized_then_compare_and_branch() {
    let output = compile_fixture("loops.json", true);

    let sum = method_text(&output.code, "sum");
    assert!(sum.contains("\tif_icmplt Body2\n"), "{}", sum);
    assert!(sum.contains("\tif_icmplt Then"), "{}", sum);
    assert!(!sum.contains("True_"), "{}", sum);
}
