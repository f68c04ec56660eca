//! The `response` global, bridging to the host's response trait.

use crate::{
    heap::HeapData,
    interp::{Interpreter, Raised},
    object,
    types::{Allocator, InstanceObj},
    unistr::UniString,
    value::Value,
};

/// Response#write(value...) => self
///
/// Writes stringified values, or raw bytes for Binary arguments, to the
/// response sink.
fn resp_write(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    for value in &args[1..] {
        let bytes = match value {
            Value::Binary(bytes) => bytes.as_bytes().to_vec(),
            other => object::to_string(interp, other)?.encode(),
        };
        interp.write_output(&bytes);
    }
    Ok(args[0].clone())
}

/// Response#set_status(status)
///
/// Sets the HTTP status code of the response.
fn resp_set_status(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let status = object::as_int(interp, &args[1])?;
    if !(100..=599).contains(&status) {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Invalid HTTP status code"));
    }
    interp.response.set_status(status as u16);
    Ok(Value::Null)
}

/// Response#set_header(name, value)
///
/// Sets a response header, replacing any existing value.
fn resp_set_header(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let name = object::as_string(interp, &args[1])?;
    let value = object::as_string(interp, &args[2])?;
    interp.response.set_header(&name.to_string(), &value.to_string());
    Ok(Value::Null)
}

/// Response#add_header(name, value)
///
/// Appends to a response header, joining multiple values with a comma.
fn resp_add_header(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let name = object::as_string(interp, &args[1])?;
    let value = object::as_string(interp, &args[2])?;
    interp.response.add_header(&name.to_string(), &value.to_string());
    Ok(Value::Null)
}

pub(crate) fn init(i: &mut Interpreter) {
    let response = i.add_class("Response", Some(i.registry.object));

    i.set_allocator(response, Allocator::None);

    i.add_method(response, "write", -1, resp_write);
    i.add_method(response, "set_status", 1, resp_set_status);
    i.add_method(response, "set_header", 2, resp_set_header);
    i.add_method(response, "add_header", 2, resp_add_header);

    let instance = InstanceObj::new(response);
    let id = i.heap.allocate(HeapData::Instance(instance));
    i.set_global_value(UniString::from("response"), Value::Ref(id));
}
