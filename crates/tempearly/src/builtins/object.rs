//! Methods of the root `Object` class.

use crate::{
    heap::{FLAG_INSPECTING, HeapData},
    interp::{Interpreter, Raised},
    json,
    object,
    types::AttrMap,
    unistr::UniString,
    value::Value,
};

/// Object#__init__()
///
/// Works as constructor or initializer for the object.
fn obj_init(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Null)
}

/// Object#__hash__() => Int
///
/// Default hash code: heap identity for objects, the value itself for
/// immediate values.
fn obj_hash(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let hash = match &args[0] {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Int(i) => *i,
        Value::Float(f) => f.to_bits() as i64,
        Value::Str(s) => s.hash_code() as i64,
        Value::Binary(b) => b.hash_code() as i64,
        Value::Ref(id) => id.index() as i64,
    };
    Ok(Value::Int(hash))
}

/// Object#__bool__() => Bool
///
/// Null evaluates as false, booleans as themselves, everything else as true.
fn obj_bool(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(match &args[0] {
        Value::Bool(b) => Value::Bool(*b),
        value => Value::Bool(!value.is_null()),
    })
}

/// Object#__str__() => String
fn obj_str(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(match &args[0] {
        value @ Value::Str(_) => value.clone(),
        _ => Value::from("<object>"),
    })
}

/// Object#as_json() => String
///
/// Serializes the object's own attributes as a JSON object literal.
fn obj_as_json(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let mut buffer = String::from("{");
    let receiver = &args[0];
    let id = receiver.as_ref_id();

    if let Some(id) = id
        && !interp.heap.has_flag(id, FLAG_INSPECTING)
    {
        interp.heap.set_flag(id, FLAG_INSPECTING);
        let result = (|| {
            let attributes: Vec<(UniString, Value)> = own_attributes(interp, receiver)
                .map(|attrs| attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            let mut first = true;
            for (name, value) in attributes {
                let serialized = json::value_to_json(interp, &value)?;
                if first {
                    first = false;
                } else {
                    buffer.push(',');
                }
                buffer.push('"');
                buffer.push_str(&name.escape_js().to_string());
                buffer.push_str("\":");
                buffer.push_str(&serialized.to_string());
            }
            Ok(())
        })();
        interp.heap.clear_flag(id, FLAG_INSPECTING);
        result?;
    }
    buffer.push('}');
    Ok(Value::from(buffer.as_str()))
}

fn own_attributes<'a>(interp: &'a Interpreter, value: &Value) -> Option<&'a AttrMap> {
    let id = value.as_ref_id()?;
    match interp.heap.get(id) {
        HeapData::Instance(instance) => Some(&instance.attributes),
        HeapData::Exception(exception) => Some(&exception.attributes),
        HeapData::Function(function) => Some(&function.attributes),
        HeapData::File(file) => Some(&file.attributes),
        HeapData::Class(class) => Some(&class.attributes),
        _ => None,
    }
}

/// Object#__eq__(other) => Bool
///
/// Identity comparison, with value semantics for null and booleans.
fn obj_eq(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let result = match (&args[0], &args[1]) {
        (Value::Null, other) => other.is_null(),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Bool(_), _) => false,
        (Value::Ref(a), Value::Ref(b)) => a == b,
        _ => false,
    };
    Ok(Value::Bool(result))
}

/// Object#__gt__(other) => Bool
///
/// Derived from `__lt__` and `__eq__`.
fn obj_gt(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    if object::is_less_than(interp, &args[0], &args[1])? {
        return Ok(Value::Bool(false));
    }
    let equal = object::equals(interp, &args[0], &args[1])?;
    Ok(Value::Bool(!equal))
}

/// Object#__lte__(other) => Bool
fn obj_lte(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    if object::is_less_than(interp, &args[0], &args[1])? {
        return Ok(Value::Bool(true));
    }
    object::equals(interp, &args[0], &args[1]).map(Value::Bool)
}

/// Object#__gte__(other) => Bool
fn obj_gte(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let less = object::is_less_than(interp, &args[0], &args[1])?;
    Ok(Value::Bool(!less))
}

/// Object#__cmp__(other) => Int
///
/// Three-way comparison derived from `__lt__` and `__eq__`.
fn obj_cmp(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    if object::is_less_than(interp, &args[0], &args[1])? {
        return Ok(Value::Int(-1));
    }
    if object::equals(interp, &args[0], &args[1])? {
        return Ok(Value::Int(0));
    }
    Ok(Value::Int(1))
}

pub(crate) fn init(i: &mut Interpreter) {
    let object = i.registry.object;

    i.add_method(object, "__init__", 0, obj_init);
    i.add_method(object, "__hash__", 0, obj_hash);

    // Conversion methods
    i.add_method(object, "__bool__", 0, obj_bool);
    i.add_method(object, "__str__", 0, obj_str);
    i.add_method(object, "as_json", 0, obj_as_json);

    // Comparison operators.
    i.add_method(object, "__eq__", 1, obj_eq);
    i.add_method(object, "__gt__", 1, obj_gt);
    i.add_method(object, "__lte__", 1, obj_lte);
    i.add_method(object, "__gte__", 1, obj_gte);
    i.add_method(object, "__cmp__", 1, obj_cmp);
    i.add_method_alias(object, "__case__", "__eq__");
}
