//! Core global functions.

use std::path::PathBuf;

use crate::{
    interp::{Interpreter, Raised},
    object,
    value::Value,
};

/// include(filename) => Bool
///
/// Parses the file and executes its top level in the current scope.
///
/// Throws: ImportError - If the file cannot be included.
fn func_include(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let path = object::as_string(interp, &args[0])?;
    let path = PathBuf::from(path.to_string());
    interp.include_file(&path)?;
    Ok(Value::Bool(true))
}

/// import(filename) => Map
///
/// Executes the file in a fresh top-level scope and returns its locals as a
/// map. Repeated imports of the same canonical path are memoized.
///
/// Throws: ImportError - If the file cannot be imported.
fn func_import(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let path = object::as_string(interp, &args[0])?;
    let path = PathBuf::from(path.to_string());
    interp.import_file(&path)
}

fn write_values(interp: &mut Interpreter, args: &[Value]) -> Result<(), Raised> {
    for value in args {
        let text = object::to_string(interp, value)?;
        let bytes = text.encode();
        interp.write_output(&bytes);
    }
    Ok(())
}

/// print(value...)
///
/// Writes the stringified values to the response.
fn func_print(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    write_values(interp, args)?;
    Ok(Value::Null)
}

/// println(value...)
///
/// Like `print`, with a trailing newline.
fn func_println(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    write_values(interp, args)?;
    interp.write_output(b"\n");
    Ok(Value::Null)
}

pub(crate) fn init(i: &mut Interpreter) {
    i.add_function("include", 1, func_include);
    i.add_function("import", 1, func_import);
    i.add_function("print", -1, func_print);
    i.add_function("println", -1, func_println);
}
