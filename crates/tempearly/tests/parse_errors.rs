//! Parser totality: every malformed input produces a SyntaxError with a
//! non-empty message and a source position, never a truncated tree.

mod common;

use common::{interpreter, render_err};

#[test]
fn reports_message_and_position() {
    for source in [
        "{% if x %}",
        "{% while true : ; %}",
        "{% x = ; %}",
        "{{ }}",
        "{{ x !}",
        "{! x }}",
        "{% for 1 : xs : ; end for %}",
        "{% try: ; end try %}",
        "{% x = [1, 2; %}",
        "{% x = {1: 2; %}",
        "{% f = function(a : return 0; end function %}",
        "{% x = 'unterminated %}",
        "{% x = 0b2; %}",
        "{% x = 99999999999999999999; %}",
        "{% x /* %}",
        "{# never closed",
    ] {
        let error = render_err(source);
        assert_eq!(error.class_name, "SyntaxError", "{source}");
        assert!(!error.message.is_empty(), "{source}");
        assert!(error.position.is_some(), "{source}");
    }
}

#[test]
fn error_messages_name_the_tokens() {
    let error = render_err("{% if x %}");
    assert_eq!(error.message, "Unexpected `%}'; Missing `:'");

    let error = render_err("{% x = 1 2; %}");
    assert_eq!(error.message, "Unexpected number literal; Missing `;'");

    let error = render_err("{% return; %}{% break; %}");
    // Stray control flow at the top level surfaces at run time instead.
    assert_eq!(error.class_name, "SyntaxError");
}

#[test]
fn runtime_stray_control_flow() {
    let (mut interp, _output) = interpreter();
    let error = interp.execute_template("{% break; %}").unwrap_err();
    assert_eq!(error.class_name, "SyntaxError");
    assert_eq!(error.message, "Unexpected `break'");
}

#[test]
fn eval_expression_requires_separators() {
    let (mut interp, _output) = interpreter();
    let error = interp.eval_expression("1 2").unwrap_err();
    assert_eq!(error.class_name, "SyntaxError");
    assert_eq!(error.message, "Unexpected number literal; Missing `;'");
}

#[test]
fn positions_point_at_the_failing_line() {
    let error = render_err("line\nline\n{% ? %}");
    assert_eq!(error.position.unwrap().line, 3);
}
