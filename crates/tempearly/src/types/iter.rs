//! Iterator objects.
//!
//! Iteration state is a tagged enum advanced by a single step function.
//! Index-based states avoid holding borrows into the heap across steps, and
//! exhaustion is sticky: once a step yields nothing, every later step yields
//! nothing, even if the underlying container grows.

use crate::{
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    types::ListObj,
    unistr::UniString,
    value::Value,
};

#[derive(Debug)]
pub(crate) enum IterState {
    Empty,
    Range {
        current: i64,
        end: i64,
        exclusive: bool,
    },
    List {
        list: HeapId,
        index: usize,
    },
    /// Yields `[key, value]` two-element lists in insertion order.
    MapEntries {
        map: HeapId,
        index: usize,
    },
    SetEntries {
        set: HeapId,
        index: usize,
    },
    /// Yields one-character strings; the content is snapshotted here so the
    /// iterator owns its data.
    Str {
        string: UniString,
        index: usize,
    },
    /// Wrapper yielding at most `remaining` elements of the inner iterator.
    Take {
        inner: HeapId,
        remaining: i64,
    },
}

#[derive(Debug)]
pub(crate) struct IterObj {
    pub state: IterState,
    pub done: bool,
}

impl IterObj {
    pub fn new(state: IterState) -> Self {
        Self { state, done: false }
    }
}

/// Advances the iterator, returning `None` once the sequence has ended.
pub(crate) fn advance(interp: &mut Interpreter, id: HeapId) -> Result<Option<Value>, Raised> {
    if interp.heap.iter(id).done {
        return Ok(None);
    }
    let produced = step(interp, id)?;
    if produced.is_none() {
        interp.heap.iter_mut(id).done = true;
    }
    Ok(produced)
}

fn step(interp: &mut Interpreter, id: HeapId) -> Result<Option<Value>, Raised> {
    match interp.heap.iter(id).state {
        IterState::Empty => Ok(None),

        IterState::Range { current, end, exclusive } => {
            let past_end = if exclusive { current >= end } else { current > end };
            if past_end {
                return Ok(None);
            }
            if let IterState::Range { current, .. } = &mut interp.heap.iter_mut(id).state {
                *current += 1;
            }
            Ok(Some(Value::Int(current)))
        }

        IterState::List { list, index } => {
            let element = interp.heap.list(list).elements.get(index).cloned();
            if element.is_some()
                && let IterState::List { index, .. } = &mut interp.heap.iter_mut(id).state
            {
                *index += 1;
            }
            Ok(element)
        }

        IterState::MapEntries { map, index } => {
            let Some((_, (key, value))) = interp.heap.map(map).get_index(index) else {
                return Ok(None);
            };
            let entry = ListObj::from_elements(vec![key.clone(), value.clone()]);
            if let IterState::MapEntries { index, .. } = &mut interp.heap.iter_mut(id).state {
                *index += 1;
            }
            let entry_id = interp.heap.allocate(HeapData::List(entry));
            Ok(Some(Value::Ref(entry_id)))
        }

        IterState::SetEntries { set, index } => {
            let element = interp.heap.set(set).get_index(index).map(|(_, v)| v.clone());
            if element.is_some()
                && let IterState::SetEntries { index, .. } = &mut interp.heap.iter_mut(id).state
            {
                *index += 1;
            }
            Ok(element)
        }

        IterState::Str { ref string, index } => {
            // Cheap clone: the rune buffer is shared.
            let string = string.clone();
            if index >= string.len() {
                return Ok(None);
            }
            let character = string.substring(index, 1);
            if let IterState::Str { index, .. } = &mut interp.heap.iter_mut(id).state {
                *index += 1;
            }
            Ok(Some(Value::Str(character)))
        }

        IterState::Take { inner, remaining } => {
            if remaining <= 0 {
                return Ok(None);
            }
            let element = advance(interp, inner)?;
            if element.is_some()
                && let IterState::Take { remaining, .. } = &mut interp.heap.iter_mut(id).state
            {
                *remaining -= 1;
            }
            Ok(element)
        }
    }
}
