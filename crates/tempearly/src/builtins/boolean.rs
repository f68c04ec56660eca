//! Methods of the `Bool` class.

use crate::{
    interp::{Interpreter, Raised},
    value::Value,
};

fn bool_receiver(args: &[Value]) -> bool {
    match args[0] {
        Value::Bool(b) => b,
        _ => unreachable!("receiver checked by method dispatch"),
    }
}

/// Bool#__str__() => String
fn bool_str(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(if bool_receiver(args) { "true" } else { "false" }))
}

/// Bool#__hash__() => Int
fn bool_hash(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(i64::from(bool_receiver(args))))
}

/// Bool#as_json() => String
fn bool_as_json(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(if bool_receiver(args) { "true" } else { "false" }))
}

pub(crate) fn init(i: &mut Interpreter) {
    let boolean = i.registry.boolean;

    i.add_method(boolean, "__str__", 0, bool_str);
    i.add_method(boolean, "__hash__", 0, bool_hash);
    i.add_method(boolean, "as_json", 0, bool_as_json);
}
