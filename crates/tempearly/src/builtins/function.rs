//! Methods of the `Function` class.

use crate::{
    heap::HeapData,
    interp::{Interpreter, Raised},
    object,
    types::{Allocator, FunctionKind, FunctionObj},
    value::Value,
};

/// Function#__call__(args...)
///
/// Invokes the function with the given arguments.
fn func_call(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let function_id = args[0].as_ref_id().expect("receiver checked by method dispatch");
    object::invoke(interp, function_id, args[1..].to_vec())
}

/// Function#curry(args...) => Function
///
/// A function which invokes the receiver with the given arguments prefixed
/// to its own.
///
/// ```text
///     add3 = add.curry(3);
///     add3(4)  #=> 7
/// ```
fn func_curry(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let base = args[0].as_ref_id().expect("receiver checked by method dispatch");
    let curried = FunctionObj::new(FunctionKind::Curry {
        base,
        args: args[1..].to_vec(),
    });
    let id = interp.heap.allocate(HeapData::Function(curried));
    Ok(Value::Ref(id))
}

pub(crate) fn init(i: &mut Interpreter) {
    let function = i.registry.function;

    i.set_allocator(function, Allocator::None);

    i.add_method(function, "__call__", -1, func_call);
    i.add_method(function, "curry", -1, func_curry);
}
