//! Methods of the `Class` class.

use crate::{
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    types::{Allocator, ClassObj, InstanceObj},
    unistr::UniString,
    value::Value,
};

fn class_receiver(args: &[Value]) -> HeapId {
    args[0].as_ref_id().expect("receiver checked by method dispatch")
}

/// `Class()` produces a fresh anonymous class descending from Object.
fn class_alloc_callback(interp: &mut Interpreter, _class: HeapId) -> Result<Value, Raised> {
    let object = interp.registry.object;
    let class = ClassObj::new(Some(object), Allocator::Default);
    let id = interp.heap.allocate(HeapData::Class(class));
    Ok(Value::Ref(id))
}

/// Class#alloc() => Object
///
/// Allocates an uninitialized instance of the receiving class.
///
/// Throws: TypeError - If the class cannot be instantiated.
fn class_alloc(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let class = class_receiver(args);
    match interp.heap.class(class).allocator {
        Allocator::Default => {
            let instance = InstanceObj::new(class);
            let id = interp.heap.allocate(HeapData::Instance(instance));
            Ok(Value::Ref(id))
        }
        Allocator::Native(allocator) => allocator(interp, class),
        Allocator::None => {
            let type_error = interp.registry.type_error;
            let message = format!("Cannot allocate instance of {}", interp.heap.class(class).name());
            Err(interp.throw(type_error, message))
        }
    }
}

/// Class#__call__(arguments...) => Object
///
/// Allocates an instance and initializes it with `__init__`.
fn class_call(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let instance = crate::object::call_method(interp, &args[0], &UniString::from("alloc"), Vec::new())?;
    crate::object::call_method(interp, &instance, &UniString::from("__init__"), args[1..].to_vec())?;
    Ok(instance)
}

/// Class#__str__() => String
///
/// The class name.
fn class_str(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let class = interp.heap.class(class_receiver(args));
    match class.attributes.get(&UniString::from("__name__")) {
        Some(name @ Value::Str(_)) => Ok(name.clone()),
        _ => Ok(Value::from("<anonymous type>")),
    }
}

pub(crate) fn init(i: &mut Interpreter) {
    let class = i.registry.class;

    i.set_allocator(class, Allocator::Native(class_alloc_callback));

    i.add_method(class, "alloc", 0, class_alloc);

    i.add_method(class, "__call__", -1, class_call);

    // Conversion methods
    i.add_method(class, "__str__", 0, class_str);
}
