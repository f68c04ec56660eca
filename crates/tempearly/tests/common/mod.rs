use tempearly::{BufferResponse, Exception, Interpreter, NullRequest, SharedBuffer};

pub fn interpreter() -> (Interpreter, SharedBuffer) {
    let response = BufferResponse::new();
    let buffer = response.buffer();
    let interp = Interpreter::new(Box::new(NullRequest), Box::new(response));
    (interp, buffer)
}

/// Renders a template and returns the produced output.
pub fn render(source: &str) -> String {
    let (mut interp, output) = interpreter();
    interp.execute_template(source).expect("template should render");
    output.to_string_lossy()
}

/// Renders a template expected to fail, returning the escaped exception.
#[allow(dead_code)]
pub fn render_err(source: &str) -> Exception {
    let (mut interp, _output) = interpreter();
    interp.execute_template(source).expect_err("template should fail")
}

/// Evaluates bare script source, returning the REPL-style representation of
/// its result.
#[allow(dead_code)]
pub fn eval(source: &str) -> Result<Option<String>, Exception> {
    let (mut interp, _output) = interpreter();
    interp.eval_expression(source)
}

#[allow(dead_code)]
pub fn eval_ok(source: &str) -> String {
    eval(source).expect("script should evaluate").unwrap_or_default()
}

#[allow(dead_code)]
pub fn eval_err(source: &str) -> Exception {
    eval(source).expect_err("script should fail")
}
