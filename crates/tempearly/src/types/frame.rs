//! Activation records.

use crate::{heap::HeapId, types::AttrMap, unistr::UniString, value::Value};

/// One activation record.
///
/// `previous` is the caller (call-stack order); `enclosing` is the lexical
/// parent used by closures and identifier resolution. Frames live on the
/// heap because scripted functions capture their defining frame.
#[derive(Debug)]
pub(crate) struct Frame {
    pub previous: Option<HeapId>,
    pub enclosing: Option<HeapId>,
    /// The invoked function, when the frame belongs to a call.
    pub function: Option<Value>,
    pub receiver: Value,
    pub arguments: Vec<Value>,
    pub locals: AttrMap,
    pub return_value: Option<Value>,
}

impl Frame {
    pub fn new(
        previous: Option<HeapId>,
        enclosing: Option<HeapId>,
        function: Option<Value>,
        receiver: Value,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            previous,
            enclosing,
            function,
            receiver,
            arguments,
            locals: AttrMap::new(),
            return_value: None,
        }
    }

    pub fn get_local(&self, name: &UniString) -> Option<Value> {
        self.locals.get(name).cloned()
    }

    /// Overwrites an existing local, returning whether the name was bound.
    pub fn replace_local(&mut self, name: &UniString, value: Value) -> bool {
        if let Some(slot) = self.locals.get_mut(name) {
            *slot = value;
            return true;
        }
        false
    }

    pub fn set_local(&mut self, name: UniString, value: Value) {
        self.locals.insert(name, value);
    }
}
