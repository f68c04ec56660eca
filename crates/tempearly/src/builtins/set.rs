//! Methods of the `Set` class.

use crate::{
    builtins::iterable::InspectGuard,
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    object,
    types::{Allocator, IterObj, IterState, SetObj},
    value::Value,
};

fn set_receiver(args: &[Value]) -> HeapId {
    args[0].as_ref_id().expect("receiver checked by method dispatch")
}

fn set_alloc(interp: &mut Interpreter, _class: HeapId) -> Result<Value, Raised> {
    let id = interp.heap.allocate(HeapData::Set(SetObj::new()));
    Ok(Value::Ref(id))
}

/// Set#__init__(object...)
///
/// Initializes the set with the given elements.
fn set_init(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = set_receiver(args);
    if !interp.heap.set(id).is_empty() {
        interp.heap.set_mut(id).clear();
    }
    for value in &args[1..] {
        let hash = object::get_hash(interp, value)?;
        interp.heap.set_mut(id).add(hash, value.clone());
    }
    Ok(Value::Null)
}

/// Set#size() => Int
fn set_size(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(interp.heap.set(set_receiver(args)).len() as i64))
}

/// Set#__iter__() => Iterator
///
/// Iterates elements in insertion order.
fn set_iter(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = set_receiver(args);
    if interp.heap.set(id).is_empty() {
        let empty = interp.empty_iterator();
        return Ok(Value::Ref(empty));
    }
    let iter = IterObj::new(IterState::SetEntries { set: id, index: 0 });
    Ok(Value::Ref(interp.heap.allocate(HeapData::Iter(iter))))
}

/// Set#__hash__() => Int
///
/// Sum of the element hashes; two sets with identical contents produce the
/// same hash code.
fn set_hash(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = set_receiver(args);
    let mut hash: i64 = 0;
    if let Some(guard) = InspectGuard::enter(interp, &args[0]) {
        for entry_hash in interp.heap.set(id).hashes() {
            hash = hash.wrapping_add(entry_hash);
        }
        guard.exit(interp);
    }
    Ok(Value::Int(hash))
}

/// Set#has(object) => Bool
///
/// Membership by hash code.
fn set_has(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let hash = object::get_hash(interp, &args[1])?;
    Ok(Value::Bool(interp.heap.set(set_receiver(args)).has(hash)))
}

/// Set#add(object...) => self
fn set_add(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = set_receiver(args);
    for value in &args[1..] {
        let hash = object::get_hash(interp, value)?;
        interp.heap.set_mut(id).add(hash, value.clone());
    }
    Ok(args[0].clone())
}

/// Set#clear() => self
fn set_clear(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    interp.heap.set_mut(set_receiver(args)).clear();
    Ok(args[0].clone())
}

/// Set#__add__(iterable) => Set
///
/// Union of the set with the elements of the iteration.
///
/// ```text
///     Set(1, 2, 3) + [4, 5]  #=> {1, 2, 3, 4, 5}
/// ```
fn set_add_oper(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = set_receiver(args);
    let mut result = SetObj::new();
    let mut index = 0;
    while let Some((hash, value)) = interp.heap.set(id).get_index(index) {
        let value = value.clone();
        result.add(hash, value);
        index += 1;
    }
    let iterator = object::iterator_of(interp, &args[1])?;
    while let Some(element) = object::get_next(interp, &iterator)? {
        let hash = object::get_hash(interp, &element)?;
        result.add(hash, element);
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::Set(result))))
}

/// Set#__bool__() => Bool
///
/// Sets evaluate as true when they are not empty.
fn set_bool(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(!interp.heap.set(set_receiver(args)).is_empty()))
}

pub(crate) fn init(i: &mut Interpreter) {
    let set = i.registry.set;

    i.set_allocator(set, Allocator::Native(set_alloc));

    i.add_method(set, "__init__", -1, set_init);

    i.add_method(set, "size", 0, set_size);

    i.add_method(set, "__iter__", 0, set_iter);
    i.add_method(set, "__hash__", 0, set_hash);

    i.add_method(set, "has", 1, set_has);
    i.add_method(set, "add", -1, set_add);
    i.add_method(set, "clear", 0, set_clear);

    // Operators
    i.add_method(set, "__add__", 1, set_add_oper);
    i.add_method(set, "__lsh__", -1, set_add);

    // Conversion methods
    i.add_method(set, "__bool__", 0, set_bool);
    i.add_method_alias(set, "__str__", "join");
}
