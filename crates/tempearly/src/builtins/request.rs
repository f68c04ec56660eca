//! The `request` global, bridging to the host's request trait.

use crate::{
    heap::HeapData,
    interp::{Interpreter, Raised},
    json,
    object,
    stream::MemoryStream,
    types::{Allocator, InstanceObj, ListObj, SetObj},
    unistr::UniString,
    value::Value,
};

/// Request#method() => String
///
/// The HTTP request method (GET, POST, ...).
fn req_method(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(interp.request.method().to_owned().as_str()))
}

/// Request#path() => String
///
/// The path the client requested.
fn req_path(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(interp.request.path().to_owned().as_str()))
}

/// Request#content_type() => String
///
/// The request's Content-Type header, or null when absent.
fn req_content_type(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(match interp.request.content_type() {
        Some(content_type) => Value::from(content_type.as_str()),
        None => Value::Null,
    })
}

/// Request#is_get() => Bool
fn req_is_get(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(interp.request.method() == "GET"))
}

/// Request#is_post() => Bool
fn req_is_post(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(interp.request.method() == "POST"))
}

/// Request#is_secure() => Bool
///
/// Whether the request was made through a secure channel such as HTTPS.
fn req_is_secure(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(interp.request.is_secure()))
}

/// Request#is_ajax() => Bool
///
/// Whether the request was made with XMLHttpRequest.
fn req_is_ajax(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(interp.request.is_ajax()))
}

/// Request#body() => Binary
///
/// The request body, or null when the request did not carry one.
fn req_body(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    Ok(match interp.request.body() {
        Some(body) if !body.is_empty() => Value::Binary(body),
        _ => Value::Null,
    })
}

/// Request#json() => Object
///
/// The request body parsed as JSON.
///
/// Throws: ValueError - If there is no body or it is malformed.
fn req_json(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, Raised> {
    let Some(body) = interp.request.body().filter(|body| !body.is_empty()) else {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Missing request body"));
    };
    let stream = MemoryStream::from(&body);
    match json::parse_value(interp, Box::new(stream)) {
        Ok(value) => Ok(value),
        Err(message) => {
            let value_error = interp.registry.value_error;
            Err(interp.throw(value_error, message))
        }
    }
}

fn parameter_values(interp: &mut Interpreter, name: &Value) -> Result<Option<Vec<String>>, Raised> {
    let name = object::as_string(interp, name)?;
    Ok(interp.request.parameters(&name.to_string()))
}

/// Request#__getitem__(name) => String
///
/// First value of the named request parameter, or null.
fn req_getitem(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(match parameter_values(interp, &args[1])? {
        Some(values) if !values.is_empty() => Value::from(values[0].as_str()),
        _ => Value::Null,
    })
}

/// Request#int(name, default = 0) => Int
///
/// The named parameter parsed as an integer, or the default.
fn req_int(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let fallback = match args.get(2) {
        Some(value) => object::as_int(interp, value)?,
        None => 0,
    };
    Ok(match parameter_values(interp, &args[1])? {
        Some(values) if !values.is_empty() => {
            let text = UniString::from(values[0].as_str());
            Value::Int(crate::unistr::parse_int(&text, 10).unwrap_or(fallback))
        }
        _ => Value::Int(fallback),
    })
}

/// Request#float(name, default = 0.0) => Float
fn req_float(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let fallback = match args.get(2) {
        Some(value) => object::as_float(interp, value)?,
        None => 0.0,
    };
    Ok(match parameter_values(interp, &args[1])? {
        Some(values) if !values.is_empty() => {
            let text = UniString::from(values[0].as_str());
            Value::Float(crate::unistr::parse_float(&text).unwrap_or(fallback))
        }
        _ => Value::Float(fallback),
    })
}

/// Request#list(name) => List
///
/// All values of the named parameter as strings.
fn req_list(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let values = parameter_values(interp, &args[1])?.unwrap_or_default();
    let list = ListObj::from_elements(values.iter().map(|v| Value::from(v.as_str())).collect());
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// Request#set(name) => Set
///
/// Distinct values of the named parameter.
fn req_set(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let values = parameter_values(interp, &args[1])?.unwrap_or_default();
    let mut set = SetObj::new();
    for value in values {
        let value = UniString::from(value.as_str());
        let hash = value.hash_code() as i64;
        set.add(hash, Value::Str(value));
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::Set(set))))
}

pub(crate) fn init(i: &mut Interpreter) {
    let request = i.add_class("Request", Some(i.registry.object));

    i.set_allocator(request, Allocator::None);

    i.add_method(request, "method", 0, req_method);
    i.add_method(request, "path", 0, req_path);
    i.add_method(request, "content_type", 0, req_content_type);
    i.add_method(request, "is_get", 0, req_is_get);
    i.add_method(request, "is_post", 0, req_is_post);
    i.add_method(request, "is_secure", 0, req_is_secure);
    i.add_method(request, "is_ajax", 0, req_is_ajax);
    i.add_method(request, "body", 0, req_body);
    i.add_method(request, "json", 0, req_json);

    i.add_method(request, "__getitem__", 1, req_getitem);
    i.add_method(request, "int", -2, req_int);
    i.add_method(request, "float", -2, req_float);
    i.add_method(request, "list", 1, req_list);
    i.add_method(request, "set", 1, req_set);

    let instance = InstanceObj::new(request);
    let id = i.heap.allocate(HeapData::Instance(instance));
    i.set_global_value(UniString::from("request"), Value::Ref(id));
}
