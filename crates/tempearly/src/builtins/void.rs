//! Methods of the `Void` class, the class of the null value.

use crate::{
    interp::{Interpreter, Raised},
    value::Value,
};

/// Void#__str__() => String
///
/// Null renders as nothing so that interpolating a missing value leaves no
/// trace in template output.
fn void_str(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(""))
}

/// Void#__bool__() => Bool
fn void_bool(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(false))
}

/// Void#__hash__() => Int
fn void_hash(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(0))
}

/// Void#as_json() => String
fn void_as_json(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from("null"))
}

pub(crate) fn init(i: &mut Interpreter) {
    let void = i.registry.void;

    i.add_method(void, "__str__", 0, void_str);
    i.add_method(void, "__bool__", 0, void_bool);
    i.add_method(void, "__hash__", 0, void_hash);
    i.add_method(void, "as_json", 0, void_as_json);
}
