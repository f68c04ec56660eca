//! Classes and plain instances.

use crate::{
    heap::HeapId,
    interp::{Interpreter, Raised},
    types::AttrMap,
    unistr::UniString,
    value::Value,
};

pub(crate) type NativeAllocFn = fn(&mut Interpreter, HeapId) -> Result<Value, Raised>;

/// How `Class#alloc` obtains a fresh instance.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Allocator {
    /// Allocate a plain attribute-bearing instance.
    Default,
    /// The class cannot be instantiated directly.
    None,
    /// A per-type native allocator.
    Native(NativeAllocFn),
}

/// A class: name, single parent, allocator and attribute table.
#[derive(Debug)]
pub(crate) struct ClassObj {
    pub base: Option<HeapId>,
    pub allocator: Allocator,
    pub attributes: AttrMap,
}

impl ClassObj {
    pub fn new(base: Option<HeapId>, inherited_allocator: Allocator) -> Self {
        Self {
            base,
            allocator: inherited_allocator,
            attributes: AttrMap::new(),
        }
    }

    /// The class's `__name__` attribute, or a placeholder for anonymous
    /// classes.
    pub fn name(&self) -> String {
        self.attributes
            .get(&UniString::from("__name__"))
            .and_then(|value| value.as_str().cloned())
            .map_or_else(|| "<anonymous class>".to_owned(), |name| name.to_string())
    }
}

/// An instance of a user-visible class.
#[derive(Debug)]
pub(crate) struct InstanceObj {
    pub class: HeapId,
    pub attributes: AttrMap,
}

impl InstanceObj {
    pub fn new(class: HeapId) -> Self {
        Self {
            class,
            attributes: AttrMap::new(),
        }
    }
}
