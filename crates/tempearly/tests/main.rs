//! Basic end-to-end checks of the public interpreter API.

mod common;

use common::{eval_err, eval_ok, interpreter, render};
use tempearly::HostValue;

#[test]
fn renders_plain_text() {
    assert_eq!(render("hello world"), "hello world");
}

#[test]
fn interpolates_globals() {
    let (mut interp, output) = interpreter();
    interp.set_global("name", HostValue::Str("world".to_owned()));
    interp.execute_template("hello {{ name }}!").unwrap();
    assert_eq!(output.to_string_lossy(), "hello world!");
}

#[test]
fn map_and_sum_chain() {
    assert_eq!(render("{% x = [1,2,3]; %}{{ x.map(function(i)=>i*i).sum() }}"), "14");
}

#[test]
fn for_loop_over_list_literal() {
    assert_eq!(
        render("{% for w in [\"ant\",\"bear\",\"cat\"] : %}[{{w}}]{% end for %}"),
        "[ant][bear][cat]"
    );
}

#[test]
fn division_by_zero() {
    let exception = eval_err("1/0");
    assert_eq!(exception.class_name, "ZeroDivisionError");
    assert!(!exception.message.is_empty());
}

#[test]
fn try_catch_binds_message() {
    assert_eq!(
        eval_ok("try: throw ValueError(\"x\"); catch ValueError e: e.message; end try"),
        "x"
    );
}

#[test]
fn string_rand_rejects_zero_length() {
    let exception = eval_err("String.rand(0)");
    assert_eq!(exception.class_name, "ValueError");
    assert_eq!(eval_ok("String.rand(8).length()"), "8");
}

#[test]
fn repl_session_keeps_state_between_inputs() {
    let (mut interp, _output) = interpreter();
    assert_eq!(interp.eval_expression("x = 20").unwrap(), Some("20".to_owned()));
    assert_eq!(interp.eval_expression("x + 22").unwrap(), Some("42".to_owned()));
    // Null results are suppressed, the way the REPL skips them.
    assert_eq!(interp.eval_expression("null").unwrap(), None);
}

#[test]
fn escaped_and_raw_interpolation() {
    let (mut interp, output) = interpreter();
    interp.set_global("markup", HostValue::Str("<b>&\"hi\"</b>".to_owned()));
    interp.execute_template("{{ markup }}|{! markup !}").unwrap();
    assert_eq!(
        output.to_string_lossy(),
        "&lt;b&gt;&amp;&quot;hi&quot;&lt;/b&gt;|<b>&\"hi\"</b>"
    );
}

#[test]
fn template_comments_produce_nothing() {
    assert_eq!(render("a{# discarded #}b"), "ab");
}

#[test]
fn backslash_escapes_open_brace() {
    assert_eq!(render("\\{% literal"), "{% literal");
}

#[test]
fn stringification_of_primitives() {
    assert_eq!(eval_ok("true"), "true");
    assert_eq!(eval_ok("1.5"), "1.5");
    assert_eq!(eval_ok("\"s\""), "s");
    assert_eq!(eval_ok("1..3"), "1..3");
}

#[test]
fn exception_surfaces_class_and_trace() {
    let exception = eval_err("f = function() : 1/0; end function; f()");
    assert_eq!(exception.class_name, "ZeroDivisionError");
    assert!(!exception.traceback.is_empty());
}
