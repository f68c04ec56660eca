//! Methods of the `Range` class.

use crate::{
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    types::{Allocator, IterObj, IterState},
    value::Value,
};

fn range_receiver(args: &[Value]) -> HeapId {
    args[0].as_ref_id().expect("receiver checked by method dispatch")
}

/// Range#begin() => Int
fn range_begin(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(interp.heap.range(range_receiver(args)).begin))
}

/// Range#end() => Int
fn range_end(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(interp.heap.range(range_receiver(args)).end))
}

/// Range#is_exclusive() => Bool
fn range_is_exclusive(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(interp.heap.range(range_receiver(args)).exclusive))
}

/// Range#__iter__() => Iterator
///
/// Ascending iteration over the contained integers.
fn range_iter(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let range = *interp.heap.range(range_receiver(args));
    if range.is_empty() {
        let empty = interp.empty_iterator();
        return Ok(Value::Ref(empty));
    }
    let iter = IterObj::new(IterState::Range {
        current: range.begin,
        end: range.end,
        exclusive: range.exclusive,
    });
    Ok(Value::Ref(interp.heap.allocate(HeapData::Iter(iter))))
}

/// Range#__case__(value) => Bool
///
/// Membership test used by `grep` and the match protocol.
fn range_case(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let range = *interp.heap.range(range_receiver(args));
    Ok(Value::Bool(match &args[1] {
        Value::Int(value) => range.contains(*value),
        _ => false,
    }))
}

/// Range#__eq__(other) => Bool
fn range_eq(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let range = *interp.heap.range(range_receiver(args));
    Ok(Value::Bool(match args[1].as_ref_id() {
        Some(other) => match interp.heap.get(other) {
            HeapData::Range(other) => range == *other,
            _ => false,
        },
        None => false,
    }))
}

/// Range#__bool__() => Bool
///
/// Ranges evaluate as true when they contain at least one integer.
fn range_bool(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(!interp.heap.range(range_receiver(args)).is_empty()))
}

/// Range#__str__() => String
///
/// ```text
///     (1..5).__str__()   #=> "1..5"
///     (1...5).__str__()  #=> "1...5"
/// ```
fn range_str(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let range = *interp.heap.range(range_receiver(args));
    let dots = if range.exclusive { "..." } else { ".." };
    Ok(Value::from(format!("{}{}{}", range.begin, dots, range.end).as_str()))
}

pub(crate) fn init(i: &mut Interpreter) {
    let range = i.registry.range;

    i.set_allocator(range, Allocator::None);

    i.add_method(range, "begin", 0, range_begin);
    i.add_method(range, "end", 0, range_end);
    i.add_method(range, "is_exclusive", 0, range_is_exclusive);

    i.add_method(range, "__iter__", 0, range_iter);
    i.add_method(range, "__case__", 1, range_case);
    i.add_method(range, "__eq__", 1, range_eq);

    // Conversion methods
    i.add_method(range, "__bool__", 0, range_bool);
    i.add_method(range, "__str__", 0, range_str);
}
