//! Methods of the `Exception` class and its subclasses.
//!
//! All exception classes share the same allocator and methods; subclasses
//! differ only in identity, which is what try/catch type hints test.

use crate::{
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    object,
    types::{Allocator, ExceptionObj},
    unistr::UniString,
    value::Value,
};

fn exception_alloc(interp: &mut Interpreter, class: HeapId) -> Result<Value, Raised> {
    let exception = ExceptionObj::new(class, interp.frame);
    let id = interp.heap.allocate(HeapData::Exception(exception));
    Ok(Value::Ref(id))
}

/// Exception#__init__(message = null)
///
/// Stores the stringified message under the `message` attribute.
fn exception_init(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let message = match args.get(1) {
        None | Some(Value::Null) => UniString::new(),
        Some(value) => object::to_string(interp, value)?,
    };
    object::set_attr(interp, &args[0], UniString::from("message"), Value::Str(message))?;
    Ok(Value::Null)
}

/// Exception#__str__() => String
///
/// The exception message.
fn exception_str(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = args[0].as_ref_id().expect("receiver checked by method dispatch");
    Ok(Value::Str(interp.heap.exception(id).message()))
}

pub(crate) fn init(i: &mut Interpreter) {
    let exception = i.registry.exception;

    i.set_allocator(exception, Allocator::Native(exception_alloc));
    for subclass in [
        i.registry.type_error,
        i.registry.value_error,
        i.registry.name_error,
        i.registry.key_error,
        i.registry.index_error,
        i.registry.state_error,
        i.registry.syntax_error,
        i.registry.import_error,
        i.registry.attribute_error,
        i.registry.zero_division_error,
        i.registry.overflow_error,
        i.registry.io_error,
    ] {
        i.set_allocator(subclass, Allocator::Native(exception_alloc));
    }

    i.add_method(exception, "__init__", -1, exception_init);
    i.add_method(exception, "__str__", 0, exception_str);
}
