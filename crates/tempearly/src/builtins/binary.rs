//! Methods of the `Binary` class.

use crate::{
    bytestring::ByteString,
    interp::{Interpreter, Raised},
    object,
    types::Allocator,
    value::Value,
};

fn binary_receiver<'a>(args: &'a [Value]) -> &'a ByteString {
    match &args[0] {
        Value::Binary(bytes) => bytes,
        _ => unreachable!("receiver checked by method dispatch"),
    }
}

/// Binary#length() => Int
///
/// Number of bytes.
fn binary_length(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(binary_receiver(args).len() as i64))
}

/// Binary#decode() => String
///
/// Decodes the bytes as UTF-8, mapping malformed sequences to U+FFFD.
fn binary_decode(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Str(binary_receiver(args).decode()))
}

/// Binary#__getitem__(index) => Int
///
/// Throws: IndexError - If the index is out of range.
fn binary_getitem(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let index = object::as_int(interp, &args[1])?;
    let bytes = binary_receiver(args);
    if index < 0 || index as usize >= bytes.len() {
        let index_error = interp.registry.index_error;
        return Err(interp.throw(index_error, "Binary index out of range"));
    }
    Ok(Value::Int(i64::from(bytes.byte_at(index as usize))))
}

/// Binary#__add__(other) => Binary
///
/// Throws: ValueError - If the operand is not a binary value.
fn binary_add(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    match &args[1] {
        Value::Binary(other) => Ok(Value::Binary(binary_receiver(args).concat(other))),
        _ => {
            let value_error = interp.registry.value_error;
            Err(interp.throw(value_error, "Binary value required"))
        }
    }
}

/// Binary#__eq__(other) => Bool
fn binary_eq(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(match &args[1] {
        Value::Binary(other) => binary_receiver(args) == other,
        _ => false,
    }))
}

/// Binary#__hash__() => Int
fn binary_hash(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(binary_receiver(args).hash_code() as i64))
}

/// Binary#__bool__() => Bool
///
/// Binaries evaluate as true when they are not empty.
fn binary_bool(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(!binary_receiver(args).is_empty()))
}

/// Binary#__str__() => String
fn binary_str(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Str(binary_receiver(args).decode()))
}

pub(crate) fn init(i: &mut Interpreter) {
    let binary = i.registry.binary;

    i.set_allocator(binary, Allocator::None);

    i.add_method(binary, "length", 0, binary_length);
    i.add_method(binary, "decode", 0, binary_decode);

    i.add_method(binary, "__getitem__", 1, binary_getitem);

    // Operators
    i.add_method(binary, "__add__", 1, binary_add);
    i.add_method(binary, "__eq__", 1, binary_eq);
    i.add_method(binary, "__hash__", 0, binary_hash);

    // Conversion methods
    i.add_method(binary, "__bool__", 0, binary_bool);
    i.add_method(binary, "__str__", 0, binary_str);
}
