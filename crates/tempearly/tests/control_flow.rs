//! Control flow semantics: short-circuiting, null-safe selection, loops,
//! try/catch/finally ordering, closures and destructuring.

mod common;

use common::{eval, eval_err, eval_ok, render};

#[test]
fn and_returns_decisive_operand() {
    // The result is the decisive operand, not its boolean coercion.
    assert_eq!(eval_ok("1 && 2"), "2");
    assert_eq!(eval_ok("0 && 2"), "0");
    assert_eq!(eval_ok("0 || \"x\""), "x");
    assert_eq!(eval_ok("3 || \"x\""), "3");
}

#[test]
fn short_circuit_skips_right_operand() {
    // The right operand would raise; short-circuiting must skip it.
    assert_eq!(eval_ok("false && missing_name"), "false");
    assert_eq!(eval_ok("true || missing_name"), "true");
    assert_eq!(eval_err("true && missing_name").class_name, "NameError");
}

#[test]
fn null_safe_selection() {
    assert_eq!(eval("x = null; x?.y").unwrap(), None);
    assert_eq!(eval("x = null; x?.y()").unwrap(), None);
    // A null-safe miss skips evaluation entirely instead of raising.
    assert_eq!(eval_err("x = null; x.y").class_name, "AttributeError");
}

#[test]
fn ternary_expression() {
    assert_eq!(eval_ok("1 < 2 ? \"yes\" : \"no\""), "yes");
    assert_eq!(eval_ok("1 > 2 ? \"yes\" : \"no\""), "no");
}

#[test]
fn while_loop_with_break_and_continue() {
    assert_eq!(
        eval_ok(
            "total = 0; i = 0; \
             while i < 10 : i = i + 1; \
               if i % 2 == 0 : continue; end if; \
               if i > 7 : break; end if; \
               total = total + i; \
             end while; total"
        ),
        "16" // 1 + 3 + 5 + 7
    );
}

#[test]
fn for_else_runs_exactly_on_empty_iteration() {
    assert_eq!(render("{% for x : [] : %}body{% else : %}empty{% end for %}"), "empty");
    assert_eq!(render("{% for x : [1] : %}body{% else : %}empty{% end for %}"), "body");
}

#[test]
fn for_assigns_loop_variable_locally() {
    assert_eq!(render("{% for x : [1,2,3] : %}{{ x }}{% end for %}"), "123");
}

#[test]
fn try_catch_finally_ordering() {
    assert_eq!(
        render(
            "{% try : %}a{% throw ValueError(\"boom\"); %}never\
             {% catch ValueError e : %}b\
             {% finally : %}c{% end try %}"
        ),
        "abc"
    );
}

#[test]
fn finally_runs_when_catch_rethrows() {
    let (mut interp, output) = common::interpreter();
    let error = interp
        .execute_template(
            "{% try : throw ValueError(\"first\"); \
             catch ValueError e : %}caught{% throw TypeError(\"second\"); \
             finally : %}finally{% end try %}",
        )
        .unwrap_err();
    assert_eq!(output.to_string_lossy(), "caughtfinally");
    assert_eq!(error.class_name, "TypeError");
    assert_eq!(error.message, "second");
}

#[test]
fn catch_type_hints_select_clause() {
    assert_eq!(
        eval_ok(
            "try: throw TypeError(\"t\"); \
             catch ValueError e: \"value\"; \
             catch TypeError e: \"type\"; \
             end try"
        ),
        "type"
    );
    // An untyped catch accepts everything.
    assert_eq!(eval_ok("try: throw TypeError(\"t\"); catch: \"any\"; end try"), "any");
    // The Exception base class catches subclasses.
    assert_eq!(
        eval_ok("try: throw TypeError(\"t\"); catch Exception e: \"base\"; end try"),
        "base"
    );
    // Nullable and disjunctive hints.
    assert_eq!(
        eval_ok("try: throw KeyError(\"k\"); catch TypeError | KeyError e: \"either\"; end try"),
        "either"
    );
}

#[test]
fn else_clause_runs_without_error() {
    assert_eq!(eval_ok("try: 1; catch: \"caught\"; else: \"clean\"; end try"), "clean");
}

#[test]
fn bare_throw_rethrows_caught_exception() {
    let error = eval_err("try: throw ValueError(\"again\"); catch ValueError e: throw; end try");
    assert_eq!(error.class_name, "ValueError");
    assert_eq!(error.message, "again");
    // Without a caught exception it is a StateError.
    assert_eq!(eval_err("throw").class_name, "StateError");
}

#[test]
fn throwing_non_exception_is_type_error() {
    let error = eval_err("throw 42");
    assert_eq!(error.class_name, "TypeError");
    assert!(error.message.contains("Cannot throw instance of"));
}

#[test]
fn closures_capture_defining_frame() {
    assert_eq!(
        eval_ok(
            "make = function() : n = 0; \
               return function() : n = n + 1; return n; end function; \
             end function; \
             c = make(); c(); c(); c()"
        ),
        "3"
    );
}

#[test]
fn destructuring_assignment() {
    assert_eq!(eval_ok("[a, b] = [1, 2]; a + b"), "3");
    // Extra right-hand values are discarded; short right-hand sides leave
    // remaining targets untouched.
    assert_eq!(eval_ok("[a, b] = [1, 2, 3]; a + b"), "3");
    assert_eq!(eval_ok("a = 9; b = 9; [a, b] = [1]; a + b"), "10");
    assert_eq!(eval_ok("[a, [b, c]] = [1, [2, 3]]; a + b + c"), "6");
}

#[test]
fn compound_assignment_desugars_through_magic_methods() {
    assert_eq!(eval_ok("x = 2; x += 3; x"), "5");
    assert_eq!(eval_ok("x = 2; x *= 3; x"), "6");
    assert_eq!(eval_ok("x = 8; x >>= 2; x"), "2");
    assert_eq!(eval_ok("x = false; x ||= 7; x"), "7");
    assert_eq!(eval_ok("x = 1; x &&= 7; x"), "7");
}

#[test]
fn prefix_and_postfix_update() {
    assert_eq!(eval_ok("x = 1; [x++, x]"), "1, 2");
    assert_eq!(eval_ok("x = 1; [++x, x]"), "2, 2");
    assert_eq!(eval_ok("x = 1; [x--, x]"), "1, 0");
}

#[test]
fn identifier_assignment_hunts_outward() {
    // Assignment inside a function finds the enclosing binding.
    assert_eq!(
        eval_ok("x = 1; bump = function() : x = x + 1; end function; bump(); bump(); x"),
        "3"
    );
}

#[test]
fn function_parameters_defaults_and_rest() {
    assert_eq!(eval_ok("f = function(a, b = 10) => a + b; f(1)"), "11");
    assert_eq!(eval_ok("f = function(a, b = 10) => a + b; f(1, 2)"), "3");
    assert_eq!(eval_ok("f = function(...rest) => rest.size(); f(1, 2, 3)"), "3");
    assert_eq!(eval_err("f = function(a) => a; f()").class_name, "ValueError");
    assert_eq!(eval_err("f = function(a) => a; f(1, 2)").class_name, "ValueError");
}

#[test]
fn parameter_type_hints_are_enforced() {
    assert_eq!(eval_ok("f = function(n : Int) => n + 1; f(1)"), "2");
    assert_eq!(eval_err("f = function(n : Int) => n + 1; f(\"x\")").class_name, "ValueError");
    assert_eq!(eval_ok("f = function(n : Int?) => 1; f(null)"), "1");
}

#[test]
fn arrow_throw_form() {
    let error = eval_err("f = function(msg) => throw ValueError(msg); f(\"bad\")");
    assert_eq!(error.class_name, "ValueError");
    assert_eq!(error.message, "bad");
}

#[test]
fn stray_loop_control_is_a_syntax_error() {
    assert_eq!(eval_err("break;").class_name, "SyntaxError");
    assert_eq!(eval_err("continue;").class_name, "SyntaxError");
}

#[test]
fn curry_prefixes_arguments() {
    assert_eq!(eval_ok("add = function(a, b) => a + b; add3 = add.curry(3); add3(4)"), "7");
}

#[test]
fn spaceship_operator_dispatches_cmp() {
    assert_eq!(eval_ok("1 <=> 2"), "-1");
    assert_eq!(eval_ok("2 <=> 2"), "0");
    assert_eq!(eval_ok("3 <=> 2"), "1");
}
