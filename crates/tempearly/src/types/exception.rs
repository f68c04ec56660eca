//! Exception instances.

use crate::{heap::HeapId, types::AttrMap, unistr::UniString, value::Value};

/// An exception: a class, a `message` attribute and the frame that was
/// current when it was thrown, for back-traces.
#[derive(Debug)]
pub(crate) struct ExceptionObj {
    pub class: HeapId,
    pub attributes: AttrMap,
    pub frame: Option<HeapId>,
}

impl ExceptionObj {
    pub fn new(class: HeapId, frame: Option<HeapId>) -> Self {
        Self {
            class,
            attributes: AttrMap::new(),
            frame,
        }
    }

    pub fn with_message(class: HeapId, message: UniString, frame: Option<HeapId>) -> Self {
        let mut exception = Self::new(class, frame);
        exception
            .attributes
            .insert(UniString::from("message"), Value::Str(message));
        exception
    }

    pub fn message(&self) -> UniString {
        self.attributes
            .get(&UniString::from("message"))
            .and_then(|value| value.as_str().cloned())
            .unwrap_or_default()
    }
}
