//! Template filter functions.

use crate::{
    interp::{Interpreter, Raised},
    json,
    object,
    value::Value,
};

/// escape(value) => String
///
/// Stringifies the value and escapes it for XML output, as the `{{ … }}`
/// form does implicitly.
fn filter_escape(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let text = object::to_string(interp, &args[0])?;
    Ok(Value::Str(text.escape_xml()))
}

/// json(value) => String
///
/// Serializes the value through its `as_json` method.
fn filter_json(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    json::value_to_json(interp, &args[0]).map(Value::Str)
}

pub(crate) fn init(i: &mut Interpreter) {
    i.add_function("escape", 1, filter_escape);
    i.add_function("json", 1, filter_json);
}
