//! Integration tests against the public `sprig::run` entry point, covering
//! the scenarios the unit tests in `eval.rs` exercise at the `execute`
//! level but driven here through a full parse-and-run pass.

use sprig::{Data, InterpreterLimits, RunError};

fn run_long(src: &str) -> i64 {
    let (_gc, result) = sprig::run("t.fl", src, InterpreterLimits::default());
    match result.expect("expected a successful run") {
        Data::Long(v) => v,
        other => panic!("expected a Long, got {other:?}"),
    }
}

macro_rules! long_result_tests {
    ($($name:ident: $code:expr, $expected:expr;)*) => {
        $(
            paste::item! {
                #[test]
                fn [< $name >]() {
                    assert_eq!(run_long($code), $expected);
                }
            }
        )*
    }
}

long_result_tests! {
    operator_precedence_nests_tighter_operators_first: "2 + 3 * 4 - 1", 13;
    overload_dispatch_picks_by_arity:
        "area := (side) |-> side * side; area := (w, h) |-> w * h; area(4) + area(3, 5)", 31;
    guarded_overload_falls_through_to_the_general_case:
        "sign := (x) |-> 0; sign := (x) \\ x > 0 |-> 1; sign := (x) \\ x < 0 |-> -1; \
         sign(-4) + sign(0) + sign(7)", 0;
    tuple_destructuring_binds_each_element: "(a, (b, c)) := (10, (1, 2)); a + b + c", 13;
    try_catch_recovers_and_continues:
        "result := try { throw 1; 0 } catch ((e) |-> e + 100); result + 1", 102;
    while_loop_accumulates_through_repeated_assignment:
        "total := 0; i := 1; while (i <= 5) { total := total + i; i := i + 1 }; total", 15;
    copy_of_a_copy_of_a_primitive_is_identity: "$ ($ 5)", 5;
    method_definition_prepends_a_higher_priority_overload:
        "f := (x) |-> x + 1; f : (x, y) |-> x + y; f(10) + f(10, 5)", 26;
    multi_branch_if_picks_the_first_true_else_branch:
        "if (1 > 2, 10, else, 3 > 2, 20, else, 30)", 20;
    multi_branch_if_falls_through_to_the_bare_trailing_else:
        "if (1 > 2, 10, else, 2 > 3, 20, else, 30)", 30;
}

#[test]
fn exceptions_propagate_out_of_an_unhandled_throw() {
    let (_gc, result) = sprig::run("t.fl", "throw 99", InterpreterLimits::default());
    match result {
        Err(RunError::Exception(exc)) => assert_eq!(exc.value, Data::Long(99)),
        other => panic!("expected an unhandled exception, got {other:?}"),
    }
}

#[test]
fn a_raising_catch_handler_propagates_the_original_exception() {
    let src = "try { throw 1 } catch ((e) |-> throw 2)";
    let (_gc, result) = sprig::run("t.fl", src, InterpreterLimits::default());
    match result {
        Err(RunError::Exception(exc)) => assert_eq!(exc.value, Data::Long(1)),
        other => panic!("expected the original exception to propagate, got {other:?}"),
    }
}

#[test]
fn empty_source_runs_to_the_unit_value() {
    let (_gc, result) = sprig::run("t.fl", "", InterpreterLimits::default());
    match result.expect("empty program should not error") {
        Data::Object(_) => {}
        other => panic!("expected the unit object, got {other:?}"),
    }
}

#[test]
fn deeply_recursive_definitions_are_stopped_at_the_limit() {
    let limits = InterpreterLimits { max_recursion_depth: 50, include_paths: Vec::new() };
    let (_gc, result) = sprig::run("t.fl", "count := (n) |-> count(n + 1); count(0)", limits);
    assert!(matches!(result, Err(RunError::RecursionLimitExceeded)));
}
