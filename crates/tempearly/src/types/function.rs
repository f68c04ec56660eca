//! Function objects.

use std::rc::Rc;

use crate::{
    ast::{Node, Parameter},
    heap::HeapId,
    interp::{Interpreter, Raised},
    types::AttrMap,
    unistr::UniString,
    value::Value,
};

/// Native callback. Methods receive the bound receiver as `args[0]`; static
/// methods and global functions receive the bare argument vector.
pub(crate) type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, Raised>;

/// The polymorphic callable.
///
/// Arity uses the signed convention: `n >= 0` demands exactly `n` arguments,
/// `n < 0` demands at least `-(n + 1)` with a variadic tail.
#[derive(Debug)]
pub(crate) enum FunctionKind {
    /// A function written in the script language. Captures its defining
    /// frame so the body sees the same bindings as the definition site.
    Scripted {
        parameters: Rc<Vec<Parameter>>,
        body: Rc<Vec<Rc<Node>>>,
        enclosing: Option<HeapId>,
    },
    /// Native method; binds the left-hand receiver as its first argument and
    /// requires it to be an instance of the declaring class.
    Native {
        class: HeapId,
        arity: i32,
        callback: NativeFn,
    },
    /// Native method invoked through the class itself; no receiver binding.
    NativeStatic {
        class: HeapId,
        arity: i32,
        callback: NativeFn,
    },
    /// Free function registered as a global.
    Global { arity: i32, callback: NativeFn },
    /// Forwards by name dispatch through the receiver.
    Alias { name: UniString },
    /// Base function with a captured prefix argument vector.
    Curry { base: HeapId, args: Vec<Value> },
}

#[derive(Debug)]
pub(crate) struct FunctionObj {
    pub kind: FunctionKind,
    pub attributes: AttrMap,
}

impl FunctionObj {
    pub fn new(kind: FunctionKind) -> Self {
        Self {
            kind,
            attributes: AttrMap::new(),
        }
    }

    /// The function's `__name__` attribute, used by stack traces.
    pub fn name(&self) -> Option<UniString> {
        self.attributes
            .get(&UniString::from("__name__"))
            .and_then(|value| value.as_str().cloned())
    }
}
