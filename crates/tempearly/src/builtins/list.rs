//! Methods of the `List` class.

use crate::{
    builtins::iterable::InspectGuard,
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    object,
    types::{Allocator, IterObj, IterState, ListObj},
    value::Value,
};

fn list_receiver(args: &[Value]) -> HeapId {
    args[0].as_ref_id().expect("receiver checked by method dispatch")
}

fn list_alloc(interp: &mut Interpreter, _class: HeapId) -> Result<Value, Raised> {
    let id = interp.heap.allocate(HeapData::List(ListObj::new()));
    Ok(Value::Ref(id))
}

/// List#__init__(object...)
///
/// Initializes the list with the given elements.
fn list_init(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    let list = interp.heap.list_mut(id);
    list.clear();
    for value in &args[1..] {
        list.append(value.clone());
    }
    Ok(Value::Null)
}

/// List#size() => Int
fn list_size(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(interp.heap.list(list_receiver(args)).len() as i64))
}

/// List#append(object...) => self
fn list_append(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    for value in &args[1..] {
        interp.heap.list_mut(id).append(value.clone());
    }
    Ok(args[0].clone())
}

/// List#prepend(object...) => self
///
/// Inserts the arguments at the front, preserving their order.
fn list_prepend(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    for value in args[1..].iter().rev() {
        interp.heap.list_mut(id).prepend(value.clone());
    }
    Ok(args[0].clone())
}

/// List#clear() => self
fn list_clear(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    interp.heap.list_mut(list_receiver(args)).clear();
    Ok(args[0].clone())
}

/// List#concat(iterable) => self
///
/// Appends every element of the given iteration.
fn list_concat(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    let iterator = object::iterator_of(interp, &args[1])?;
    while let Some(element) = object::get_next(interp, &iterator)? {
        interp.heap.list_mut(id).append(element);
    }
    Ok(args[0].clone())
}

fn check_index(interp: &mut Interpreter, index: i64, len: usize) -> Result<usize, Raised> {
    if index < 0 || index as usize >= len {
        let index_error = interp.registry.index_error;
        return Err(interp.throw(index_error, "List index out of range"));
    }
    Ok(index as usize)
}

/// List#__getitem__(index) => Object
///
/// Throws: IndexError - If the index is out of range.
fn list_getitem(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    let index = object::as_int(interp, &args[1])?;
    let len = interp.heap.list(id).len();
    let index = check_index(interp, index, len)?;
    Ok(interp.heap.list(id).elements[index].clone())
}

/// List#__setitem__(index, value) => self
///
/// Throws: IndexError - If the index is out of range.
fn list_setitem(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    let index = object::as_int(interp, &args[1])?;
    let len = interp.heap.list(id).len();
    let index = check_index(interp, index, len)?;
    interp.heap.list_mut(id).elements[index] = args[2].clone();
    Ok(args[0].clone())
}

/// List#__iter__() => Iterator
fn list_iter(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    if interp.heap.list(id).is_empty() {
        let empty = interp.empty_iterator();
        return Ok(Value::Ref(empty));
    }
    let iter = IterObj::new(IterState::List { list: id, index: 0 });
    Ok(Value::Ref(interp.heap.allocate(HeapData::Iter(iter))))
}

/// List#__add__(iterable) => List
///
/// Concatenation into a new list.
fn list_add(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    let mut result = ListObj::from_elements(interp.heap.list(id).elements.clone());
    let iterator = object::iterator_of(interp, &args[1])?;
    while let Some(element) = object::get_next(interp, &iterator)? {
        result.append(element);
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(result))))
}

/// List#__eq__(other) => Bool
///
/// Element-wise equality with `__eq__`.
fn list_eq(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    let Some(other) = args[1].as_ref_id() else {
        return Ok(Value::Bool(false));
    };
    if !matches!(interp.heap.get(other), HeapData::List(_)) {
        return Ok(Value::Bool(false));
    }
    if id == other {
        return Ok(Value::Bool(true));
    }
    let len = interp.heap.list(id).len();
    if len != interp.heap.list(other).len() {
        return Ok(Value::Bool(false));
    }
    for index in 0..len {
        let a = interp.heap.list(id).elements[index].clone();
        let b = interp.heap.list(other).elements[index].clone();
        if !object::equals(interp, &a, &b)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// List#__hash__() => Int
///
/// Combined from the element hashes in order; self-referential lists hash
/// their cycle as empty content.
fn list_hash(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = list_receiver(args);
    let mut hash: i64 = 5381;
    if let Some(guard) = InspectGuard::enter(interp, &args[0]) {
        let result = (|| {
            let len = interp.heap.list(id).len();
            for index in 0..len {
                let element = interp.heap.list(id).elements.get(index).cloned();
                let Some(element) = element else { break };
                let element_hash = object::get_hash(interp, &element)?;
                hash = hash.wrapping_mul(33).wrapping_add(element_hash);
            }
            Ok(())
        })();
        guard.exit(interp);
        result?;
    }
    Ok(Value::Int(hash))
}

/// List#__bool__() => Bool
///
/// Lists evaluate as true when they are not empty.
fn list_bool(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(!interp.heap.list(list_receiver(args)).is_empty()))
}

pub(crate) fn init(i: &mut Interpreter) {
    let list = i.registry.list;

    i.set_allocator(list, Allocator::Native(list_alloc));

    i.add_method(list, "__init__", -1, list_init);

    i.add_method(list, "size", 0, list_size);
    i.add_method(list, "append", -1, list_append);
    i.add_method(list, "prepend", -1, list_prepend);
    i.add_method(list, "clear", 0, list_clear);
    i.add_method(list, "concat", 1, list_concat);

    i.add_method(list, "__getitem__", 1, list_getitem);
    i.add_method(list, "__setitem__", 2, list_setitem);
    i.add_method(list, "__iter__", 0, list_iter);

    // Operators
    i.add_method(list, "__add__", 1, list_add);
    i.add_method(list, "__eq__", 1, list_eq);
    i.add_method(list, "__hash__", 0, list_hash);

    // Conversion methods
    i.add_method(list, "__bool__", 0, list_bool);
    i.add_method_alias(list, "__str__", "join");
}
