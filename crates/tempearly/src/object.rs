//! The object model: class resolution, attribute lookup, the call protocol
//! and the value-level protocol helpers built on magic methods.

use crate::{
    heap::{Heap, HeapData, HeapId},
    interp::{Interpreter, Raised},
    types::{FunctionKind, iter},
    unistr::UniString,
    value::Value,
};

/// Resolves the class of any value.
pub(crate) fn class_of(interp: &Interpreter, value: &Value) -> HeapId {
    let registry = &interp.registry;
    match value {
        Value::Null => registry.void,
        Value::Bool(_) => registry.boolean,
        Value::Int(_) => registry.int,
        Value::Float(_) => registry.float,
        Value::Str(_) => registry.string,
        Value::Binary(_) => registry.binary,
        Value::Ref(id) => match interp.heap.get(*id) {
            HeapData::List(_) => registry.list,
            HeapData::Map(_) => registry.map,
            HeapData::Set(_) => registry.set,
            HeapData::Range(_) => registry.range,
            HeapData::Iter(_) => registry.iterator,
            HeapData::Function(_) => registry.function,
            HeapData::Class(_) => registry.class,
            HeapData::Instance(instance) => instance.class,
            HeapData::Exception(exception) => exception.class,
            HeapData::File(_) => registry.file,
            HeapData::Frame(_) => registry.object,
        },
    }
}

/// Walks the parent chain testing the subclass relation.
pub(crate) fn is_subclass(heap: &Heap, class: HeapId, of: HeapId) -> bool {
    let mut current = Some(class);
    while let Some(id) = current {
        if id == of {
            return true;
        }
        current = heap.class(id).base;
    }
    false
}

pub(crate) fn is_instance(interp: &Interpreter, value: &Value, class: HeapId) -> bool {
    is_subclass(&interp.heap, class_of(interp, value), class)
}

/// Name of the value's class, for diagnostics.
pub(crate) fn type_name(interp: &Interpreter, value: &Value) -> String {
    interp.heap.class(class_of(interp, value)).name()
}

fn own_attr(interp: &Interpreter, value: &Value, name: &UniString) -> Option<Value> {
    let Value::Ref(id) = value else {
        return None;
    };
    match interp.heap.get(*id) {
        HeapData::Instance(instance) => instance.attributes.get(name).cloned(),
        HeapData::Exception(exception) => exception.attributes.get(name).cloned(),
        HeapData::Function(function) => function.attributes.get(name).cloned(),
        HeapData::File(file) => file.attributes.get(name).cloned(),
        // A class's own attributes are its direct table; `alloc`, `__call__`
        // and the like come from the Class class chain below.
        HeapData::Class(class) => class.attributes.get(name).cloned(),
        _ => None,
    }
}

fn class_chain_attr(heap: &Heap, class: HeapId, name: &UniString) -> Option<Value> {
    let mut current = Some(class);
    while let Some(id) = current {
        let class_obj = heap.class(id);
        if let Some(value) = class_obj.attributes.get(name) {
            return Some(value.clone());
        }
        current = class_obj.base;
    }
    None
}

/// Attribute lookup without raising; instance attributes shadow the class
/// chain.
pub(crate) fn get_attr_opt(interp: &Interpreter, value: &Value, name: &UniString) -> Option<Value> {
    own_attr(interp, value, name).or_else(|| class_chain_attr(&interp.heap, class_of(interp, value), name))
}

pub(crate) fn get_attr(interp: &mut Interpreter, value: &Value, name: &UniString) -> Result<Value, Raised> {
    if let Some(found) = get_attr_opt(interp, value, name) {
        return Ok(found);
    }
    let attribute_error = interp.registry.attribute_error;
    let message = format!("'{}' has no attribute '{}'", type_name(interp, value), name);
    Err(interp.throw(attribute_error, message))
}

/// Writes an attribute directly on the receiver.
pub(crate) fn set_attr(interp: &mut Interpreter, value: &Value, name: UniString, attribute: Value) -> Result<(), Raised> {
    if let Value::Ref(id) = value {
        match interp.heap.get_mut(*id) {
            HeapData::Instance(instance) => {
                instance.attributes.insert(name, attribute);
                return Ok(());
            }
            HeapData::Exception(exception) => {
                exception.attributes.insert(name, attribute);
                return Ok(());
            }
            HeapData::Function(function) => {
                function.attributes.insert(name, attribute);
                return Ok(());
            }
            HeapData::File(file) => {
                file.attributes.insert(name, attribute);
                return Ok(());
            }
            HeapData::Class(class) => {
                class.attributes.insert(name, attribute);
                return Ok(());
            }
            _ => {}
        }
    }
    let type_error = interp.registry.type_error;
    let message = format!("Cannot set attribute of '{}'", type_name(interp, value));
    Err(interp.throw(type_error, message))
}

/// Looks up `name` on the receiver and invokes it, binding the receiver as
/// the first argument for everything except static methods and global
/// functions.
pub(crate) fn call_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &UniString,
    args: Vec<Value>,
) -> Result<Value, Raised> {
    let attribute = get_attr(interp, receiver, name)?;
    let function_id = match &attribute {
        Value::Ref(id) if matches!(interp.heap.get(*id), HeapData::Function(_)) => *id,
        other => {
            let type_error = interp.registry.type_error;
            let message = format!("'{}' is not callable", type_name(interp, other));
            return Err(interp.throw(type_error, message));
        }
    };
    if matches!(
        interp.heap.function(function_id).kind,
        FunctionKind::NativeStatic { .. } | FunctionKind::Global { .. }
    ) {
        invoke(interp, function_id, args)
    } else {
        let mut bound = Vec::with_capacity(args.len() + 1);
        bound.push(receiver.clone());
        bound.extend(args);
        invoke(interp, function_id, bound)
    }
}

/// Invokes a function value with the given argument vector, enforcing the
/// signed arity convention for native callables.
pub(crate) fn invoke(interp: &mut Interpreter, function_id: HeapId, args: Vec<Value>) -> Result<Value, Raised> {
    enum Plan {
        Scripted,
        Native { class: HeapId, arity: i32, callback: crate::types::NativeFn },
        NativeStatic { class: HeapId, arity: i32, callback: crate::types::NativeFn },
        Global { arity: i32, callback: crate::types::NativeFn },
        Alias(UniString),
        Curry { base: HeapId, prefix: Vec<Value> },
    }

    let plan = match &interp.heap.function(function_id).kind {
        FunctionKind::Scripted { .. } => Plan::Scripted,
        FunctionKind::Native { class, arity, callback } => Plan::Native {
            class: *class,
            arity: *arity,
            callback: *callback,
        },
        FunctionKind::NativeStatic { class, arity, callback } => Plan::NativeStatic {
            class: *class,
            arity: *arity,
            callback: *callback,
        },
        FunctionKind::Global { arity, callback } => Plan::Global {
            arity: *arity,
            callback: *callback,
        },
        FunctionKind::Alias { name } => Plan::Alias(name.clone()),
        FunctionKind::Curry { base, args: prefix } => Plan::Curry {
            base: *base,
            prefix: prefix.clone(),
        },
    };

    match plan {
        Plan::Scripted => crate::eval::invoke_scripted(interp, function_id, args),

        Plan::Native { class, arity, callback } => {
            let type_error = interp.registry.type_error;
            if args.is_empty() {
                return Err(interp.throw(type_error, "Missing method receiver"));
            }
            interp.push_frame(None, Some(Value::Ref(function_id)), args[0].clone(), args[1..].to_vec());
            if !is_instance(interp, &args[0], class) {
                let message = format!(
                    "Method requires a '{}' object but received a '{}'",
                    interp.heap.class(class).name(),
                    type_name(interp, &args[0])
                );
                interp.pop_frame();
                return Err(interp.throw(type_error, message));
            }
            let given = args.len() - 1;
            if let Some(message) = arity_mismatch("Method", arity, given) {
                interp.pop_frame();
                return Err(interp.throw(type_error, message));
            }
            let result = callback(interp, &args);
            interp.pop_frame();
            result
        }

        Plan::NativeStatic { class, arity, callback } => {
            let type_error = interp.registry.type_error;
            interp.push_frame(None, Some(Value::Ref(function_id)), Value::Ref(class), args.clone());
            if let Some(message) = arity_mismatch("Method", arity, args.len()) {
                interp.pop_frame();
                return Err(interp.throw(type_error, message));
            }
            let result = callback(interp, &args);
            interp.pop_frame();
            result
        }

        Plan::Global { arity, callback } => {
            let type_error = interp.registry.type_error;
            interp.push_frame(None, Some(Value::Ref(function_id)), Value::Null, args.clone());
            if let Some(message) = arity_mismatch("Function", arity, args.len()) {
                interp.pop_frame();
                return Err(interp.throw(type_error, message));
            }
            let result = callback(interp, &args);
            interp.pop_frame();
            result
        }

        Plan::Alias(name) => {
            if args.is_empty() {
                let type_error = interp.registry.type_error;
                return Err(interp.throw(type_error, "Missing method receiver"));
            }
            call_method(interp, &args[0].clone(), &name, args[1..].to_vec())
        }

        Plan::Curry { base, prefix } => {
            let mut combined = prefix;
            combined.extend(args);
            invoke(interp, base, combined)
        }
    }
}

fn arity_mismatch(what: &str, arity: i32, given: usize) -> Option<String> {
    if arity < 0 {
        let minimum = (-(arity + 1)) as usize;
        if given < minimum {
            return Some(format!("{what} expected at least {minimum} arguments, got {given}"));
        }
    } else if given != arity as usize {
        return Some(format!("{what} expected {arity} arguments, got {given}"));
    }
    None
}

// --- Protocol helpers built on magic methods ---------------------------

/// Strict boolean extraction.
pub(crate) fn as_bool(interp: &mut Interpreter, value: &Value) -> Result<bool, Raised> {
    match value {
        Value::Bool(b) => Ok(*b),
        _ => {
            let type_error = interp.registry.type_error;
            Err(interp.throw(type_error, "Boolean value required"))
        }
    }
}

pub(crate) fn as_int(interp: &mut Interpreter, value: &Value) -> Result<i64, Raised> {
    match value {
        Value::Int(i) => Ok(*i),
        _ => {
            let type_error = interp.registry.type_error;
            Err(interp.throw(type_error, "Integer value required"))
        }
    }
}

pub(crate) fn as_float(interp: &mut Interpreter, value: &Value) -> Result<f64, Raised> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        _ => {
            let type_error = interp.registry.type_error;
            Err(interp.throw(type_error, "Float value required"))
        }
    }
}

pub(crate) fn as_string(interp: &mut Interpreter, value: &Value) -> Result<UniString, Raised> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        _ => {
            let type_error = interp.registry.type_error;
            Err(interp.throw(type_error, "String value required"))
        }
    }
}

/// Truthiness via `__bool__`.
pub(crate) fn to_bool(interp: &mut Interpreter, value: &Value) -> Result<bool, Raised> {
    if let Value::Bool(b) = value {
        return Ok(*b);
    }
    let result = call_method(interp, value, &UniString::from("__bool__"), Vec::new())?;
    as_bool(interp, &result)
}

/// Stringification via `__str__`.
pub(crate) fn to_string(interp: &mut Interpreter, value: &Value) -> Result<UniString, Raised> {
    if let Value::Str(s) = value {
        return Ok(s.clone());
    }
    let result = call_method(interp, value, &UniString::from("__str__"), Vec::new())?;
    as_string(interp, &result)
}

/// Equality via `__eq__`.
pub(crate) fn equals(interp: &mut Interpreter, left: &Value, right: &Value) -> Result<bool, Raised> {
    let result = call_method(interp, left, &UniString::from("__eq__"), vec![right.clone()])?;
    as_bool(interp, &result)
}

/// Ordering via `__lt__`.
pub(crate) fn is_less_than(interp: &mut Interpreter, left: &Value, right: &Value) -> Result<bool, Raised> {
    let result = call_method(interp, left, &UniString::from("__lt__"), vec![right.clone()])?;
    as_bool(interp, &result)
}

/// Hashing via `__hash__`.
pub(crate) fn get_hash(interp: &mut Interpreter, value: &Value) -> Result<i64, Raised> {
    let result = call_method(interp, value, &UniString::from("__hash__"), Vec::new())?;
    as_int(interp, &result)
}

/// Calls `__iter__` and checks that the result is an iterator object.
pub(crate) fn iterator_of(interp: &mut Interpreter, value: &Value) -> Result<Value, Raised> {
    let iterator = call_method(interp, value, &UniString::from("__iter__"), Vec::new())?;
    match &iterator {
        Value::Ref(id) if matches!(interp.heap.get(*id), HeapData::Iter(_)) => Ok(iterator),
        other => {
            let type_error = interp.registry.type_error;
            let message = format!("'{}' is not an iterator", type_name(interp, other));
            Err(interp.throw(type_error, message))
        }
    }
}

/// Advances an iterator value; `None` marks exhaustion.
pub(crate) fn get_next(interp: &mut Interpreter, iterator: &Value) -> Result<Option<Value>, Raised> {
    match iterator {
        Value::Ref(id) if matches!(interp.heap.get(*id), HeapData::Iter(_)) => iter::advance(interp, *id),
        other => {
            let type_error = interp.registry.type_error;
            let message = format!("'{}' is not an iterator", type_name(interp, other));
            Err(interp.throw(type_error, message))
        }
    }
}
