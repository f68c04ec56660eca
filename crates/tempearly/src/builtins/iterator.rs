//! Methods of the `Iterator` class.

use crate::{
    interp::{Interpreter, Raised},
    object,
    types::Allocator,
    value::Value,
};

/// Iterator#__iter__() => Iterator
///
/// An iterator is its own iteration.
fn iterator_iter(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(args[0].clone())
}

/// Iterator#next([default_value]) => Object
///
/// Advances the iteration.
///
/// Throws: StateError - If the iteration has ended and no default value is
/// given.
fn iterator_next(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    match object::get_next(interp, &args[0])? {
        Some(element) => Ok(element),
        None => match args.get(1) {
            Some(default) => Ok(default.clone()),
            None => {
                let state_error = interp.registry.state_error;
                Err(interp.throw(state_error, "Iteration is empty"))
            }
        },
    }
}

pub(crate) fn init(i: &mut Interpreter) {
    let iterator = i.registry.iterator;

    i.set_allocator(iterator, Allocator::None);

    i.add_method(iterator, "__iter__", 0, iterator_iter);
    i.add_method(iterator, "next", -1, iterator_next);
}
