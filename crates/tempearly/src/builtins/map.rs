//! Methods of the `Map` class.

use crate::{
    builtins::iterable::InspectGuard,
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    json,
    object,
    types::{Allocator, IterObj, IterState, ListObj, MapObj, SetObj},
    unistr::UniString,
    value::Value,
};

fn map_receiver(args: &[Value]) -> HeapId {
    args[0].as_ref_id().expect("receiver checked by method dispatch")
}

fn map_alloc(interp: &mut Interpreter, _class: HeapId) -> Result<Value, Raised> {
    let id = interp.heap.allocate(HeapData::Map(MapObj::new()));
    Ok(Value::Ref(id))
}

/// Map#size() => Int
///
/// Number of key-value entries stored in the map.
fn map_size(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(interp.heap.map(map_receiver(args)).len() as i64))
}

/// Map#keys() => Set
///
/// ```text
///     {"foo": "bar"}.keys()  #=> {"foo"}
/// ```
fn map_keys(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    let mut set = SetObj::new();
    let mut index = 0;
    while let Some((hash, (key, _))) = interp.heap.map(id).get_index(index) {
        let key = key.clone();
        set.add(hash, key);
        index += 1;
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::Set(set))))
}

/// Map#values() => List
///
/// ```text
///     {"foo": "bar"}.values()  #=> ["bar"]
/// ```
fn map_values(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    let mut list = ListObj::new();
    let mut index = 0;
    while let Some((_, (_, value))) = interp.heap.map(id).get_index(index) {
        let value = value.clone();
        list.append(value);
        index += 1;
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// Map#has(key) => Bool
fn map_has(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let hash = object::get_hash(interp, &args[1])?;
    Ok(Value::Bool(interp.heap.map(map_receiver(args)).find(hash).is_some()))
}

/// Map#get(key, default_value = null) => Object
///
/// The value stored under the key, or the default.
fn map_get(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let hash = object::get_hash(interp, &args[1])?;
    match interp.heap.map(map_receiver(args)).find(hash) {
        Some((_, value)) => Ok(value.clone()),
        None => Ok(args.get(2).cloned().unwrap_or(Value::Null)),
    }
}

/// Map#clear() => self
fn map_clear(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    interp.heap.map_mut(map_receiver(args)).clear();
    Ok(args[0].clone())
}

/// Map#join(separator1 = ": ", separator2 = ", ") => String
///
/// Key-value pairs joined with `separator1` between key and value and
/// `separator2` between entries.
fn map_join(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    let sep1 = match args.get(1) {
        None | Some(Value::Null) => UniString::from(": "),
        Some(value) => object::as_string(interp, value)?,
    };
    let sep2 = match args.get(2) {
        None | Some(Value::Null) => UniString::from(", "),
        Some(value) => object::as_string(interp, value)?,
    };
    let mut buffer = UniString::new();
    if let Some(guard) = InspectGuard::enter(interp, &args[0]) {
        let result = (|| {
            let mut index = 0;
            loop {
                let Some((_, (key, value))) = interp.heap.map(id).get_index(index) else {
                    return Ok(());
                };
                let (key, value) = (key.clone(), value.clone());
                if index > 0 {
                    buffer = buffer.concat(&sep2);
                }
                let key_repr = object::to_string(interp, &key)?;
                buffer = buffer.concat(&key_repr).concat(&sep1);
                let value_repr = object::to_string(interp, &value)?;
                buffer = buffer.concat(&value_repr);
                index += 1;
            }
        })();
        guard.exit(interp);
        result?;
    }
    Ok(Value::Str(buffer))
}

/// Map#update(other_map) => self
///
/// Copies entries from another map into this one.
fn map_update(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    let Some(other) = args[1].as_ref_id().filter(|&o| matches!(interp.heap.get(o), HeapData::Map(_))) else {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Map required"));
    };
    let mut index = 0;
    while let Some((hash, (key, value))) = interp.heap.map(other).get_index(index) {
        let (key, value) = (key.clone(), value.clone());
        interp.heap.map_mut(id).insert(hash, key, value);
        index += 1;
    }
    Ok(args[0].clone())
}

/// Map#__iter__() => Iterator
///
/// Traverses key-value entries in insertion order, yielding each as a
/// two-element list.
fn map_iter(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    if interp.heap.map(id).is_empty() {
        let empty = interp.empty_iterator();
        return Ok(Value::Ref(empty));
    }
    let iter = IterObj::new(IterState::MapEntries { map: id, index: 0 });
    Ok(Value::Ref(interp.heap.allocate(HeapData::Iter(iter))))
}

/// Map#__getitem__(key) => Object
///
/// The value for the key; misses dispatch to `__missing__`.
fn map_getitem(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let hash = object::get_hash(interp, &args[1])?;
    match interp.heap.map(map_receiver(args)).find(hash) {
        Some((_, value)) => Ok(value.clone()),
        None => object::call_method(interp, &args[0], &UniString::from("__missing__"), vec![args[1].clone()]),
    }
}

/// Map#__setitem__(key, value) => self
fn map_setitem(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let hash = object::get_hash(interp, &args[1])?;
    interp
        .heap
        .map_mut(map_receiver(args))
        .insert(hash, args[1].clone(), args[2].clone());
    Ok(args[0].clone())
}

/// Map#__missing__(key)
///
/// Invoked on a key miss; the default implementation throws KeyError.
fn map_missing(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let repr = object::to_string(interp, &args[1])?;
    let key_error = interp.registry.key_error;
    Err(interp.throw(key_error, repr.to_string()))
}

/// Map#__bool__() => Bool
///
/// Maps evaluate as true when they are not empty.
fn map_bool(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(!interp.heap.map(map_receiver(args)).is_empty()))
}

/// Map#__hash__() => Int
///
/// Combined from the entry hashes in iteration order.
fn map_hash(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    let mut hash: i64 = 0;
    if let Some(guard) = InspectGuard::enter(interp, &args[0]) {
        let result = (|| {
            let mut index = 0;
            loop {
                let Some((entry_hash, (_, value))) = interp.heap.map(id).get_index(index) else {
                    return Ok(());
                };
                let value = value.clone();
                let value_hash = object::get_hash(interp, &value)?;
                hash = hash.wrapping_add(entry_hash).wrapping_add(value_hash);
                index += 1;
            }
        })();
        guard.exit(interp);
        result?;
    }
    Ok(Value::Int(hash))
}

/// Map#as_json() => String
///
/// JSON object literal; keys are stringified and escaped.
fn map_as_json(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    let mut buffer = String::from("{");
    if let Some(guard) = InspectGuard::enter(interp, &args[0]) {
        let result = (|| {
            let mut index = 0;
            loop {
                let Some((_, (key, value))) = interp.heap.map(id).get_index(index) else {
                    return Ok(());
                };
                let (key, value) = (key.clone(), value.clone());
                let key_repr = object::to_string(interp, &key)?;
                let serialized = json::value_to_json(interp, &value)?;
                if index > 0 {
                    buffer.push(',');
                }
                buffer.push('"');
                buffer.push_str(&key_repr.escape_js().to_string());
                buffer.push_str("\":");
                buffer.push_str(&serialized.to_string());
                index += 1;
            }
        })();
        guard.exit(interp);
        result?;
    }
    buffer.push('}');
    Ok(Value::from(buffer.as_str()))
}

/// Map#__add__(other_map) => Map
///
/// Concatenates two maps into a new one.
fn map_add(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = map_receiver(args);
    let Some(other) = args[1].as_ref_id().filter(|&o| matches!(interp.heap.get(o), HeapData::Map(_))) else {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Map required"));
    };
    let mut result = MapObj::new();
    for source in [id, other] {
        let mut index = 0;
        while let Some((hash, (key, value))) = interp.heap.map(source).get_index(index) {
            let (key, value) = (key.clone(), value.clone());
            result.insert(hash, key, value);
            index += 1;
        }
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::Map(result))))
}

pub(crate) fn init(i: &mut Interpreter) {
    let map = i.registry.map;

    i.set_allocator(map, Allocator::Native(map_alloc));

    i.add_method(map, "size", 0, map_size);
    i.add_method(map, "keys", 0, map_keys);
    i.add_method(map, "values", 0, map_values);

    i.add_method(map, "clear", 0, map_clear);
    i.add_method(map, "has", 1, map_has);
    i.add_method(map, "get", -2, map_get);
    i.add_method(map, "join", -1, map_join);
    i.add_method(map, "update", 1, map_update);

    i.add_method(map, "__iter__", 0, map_iter);

    i.add_method(map, "__getitem__", 1, map_getitem);
    i.add_method(map, "__setitem__", 2, map_setitem);

    i.add_method(map, "__missing__", 1, map_missing);

    // Conversion methods
    i.add_method(map, "__bool__", 0, map_bool);
    i.add_method(map, "__hash__", 0, map_hash);
    i.add_method(map, "as_json", 0, map_as_json);
    i.add_method_alias(map, "__str__", "join");

    i.add_method(map, "__add__", 1, map_add);
}
