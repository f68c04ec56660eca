//! Arena heap.
//!
//! All objects with identity live in one `Vec` of slots addressed by
//! [`HeapId`]. Slots are never recycled during a run; everything is released
//! when the interpreter is dropped. Each slot carries a small flag word whose
//! only script-observable bit is `INSPECTING`, the re-entry guard used by
//! cycle-prone stringification, hashing and JSON serialization.

use crate::types::{
    ClassObj, ExceptionObj, FileObj, Frame, FunctionObj, InstanceObj, IterObj, ListObj, MapObj, RangeObj, SetObj,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId(u32);

impl HeapId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

pub(crate) const FLAG_INSPECTING: u8 = 0x01;

#[derive(Debug)]
pub(crate) enum HeapData {
    List(ListObj),
    Map(MapObj),
    Set(SetObj),
    Range(RangeObj),
    Iter(IterObj),
    Function(FunctionObj),
    Class(ClassObj),
    Instance(InstanceObj),
    Exception(ExceptionObj),
    File(FileObj),
    Frame(Frame),
}

#[derive(Debug)]
struct Slot {
    data: HeapData,
    flags: u8,
}

#[derive(Debug, Default)]
pub(crate) struct Heap {
    slots: Vec<Slot>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        let id = HeapId(u32::try_from(self.slots.len()).expect("heap exhausted"));
        self.slots.push(Slot { data, flags: 0 });
        id
    }

    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.slots[id.index()].data
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self.slots[id.index()].data
    }

    pub fn has_flag(&self, id: HeapId, flag: u8) -> bool {
        self.slots[id.index()].flags & flag != 0
    }

    pub fn set_flag(&mut self, id: HeapId, flag: u8) {
        self.slots[id.index()].flags |= flag;
    }

    pub fn clear_flag(&mut self, id: HeapId, flag: u8) {
        self.slots[id.index()].flags &= !flag;
    }

    // Typed accessors. The evaluator only reaches these through values whose
    // class was already checked, so a variant mismatch is an internal bug.

    pub fn list(&self, id: HeapId) -> &ListObj {
        match self.get(id) {
            HeapData::List(list) => list,
            other => panic!("expected List, found {other:?}"),
        }
    }

    pub fn list_mut(&mut self, id: HeapId) -> &mut ListObj {
        match self.get_mut(id) {
            HeapData::List(list) => list,
            other => panic!("expected List, found {other:?}"),
        }
    }

    pub fn map(&self, id: HeapId) -> &MapObj {
        match self.get(id) {
            HeapData::Map(map) => map,
            other => panic!("expected Map, found {other:?}"),
        }
    }

    pub fn map_mut(&mut self, id: HeapId) -> &mut MapObj {
        match self.get_mut(id) {
            HeapData::Map(map) => map,
            other => panic!("expected Map, found {other:?}"),
        }
    }

    pub fn set(&self, id: HeapId) -> &SetObj {
        match self.get(id) {
            HeapData::Set(set) => set,
            other => panic!("expected Set, found {other:?}"),
        }
    }

    pub fn set_mut(&mut self, id: HeapId) -> &mut SetObj {
        match self.get_mut(id) {
            HeapData::Set(set) => set,
            other => panic!("expected Set, found {other:?}"),
        }
    }

    pub fn range(&self, id: HeapId) -> &RangeObj {
        match self.get(id) {
            HeapData::Range(range) => range,
            other => panic!("expected Range, found {other:?}"),
        }
    }

    pub fn iter(&self, id: HeapId) -> &IterObj {
        match self.get(id) {
            HeapData::Iter(iter) => iter,
            other => panic!("expected Iter, found {other:?}"),
        }
    }

    pub fn iter_mut(&mut self, id: HeapId) -> &mut IterObj {
        match self.get_mut(id) {
            HeapData::Iter(iter) => iter,
            other => panic!("expected Iter, found {other:?}"),
        }
    }

    pub fn function(&self, id: HeapId) -> &FunctionObj {
        match self.get(id) {
            HeapData::Function(function) => function,
            other => panic!("expected Function, found {other:?}"),
        }
    }

    pub fn class(&self, id: HeapId) -> &ClassObj {
        match self.get(id) {
            HeapData::Class(class) => class,
            other => panic!("expected Class, found {other:?}"),
        }
    }

    pub fn class_mut(&mut self, id: HeapId) -> &mut ClassObj {
        match self.get_mut(id) {
            HeapData::Class(class) => class,
            other => panic!("expected Class, found {other:?}"),
        }
    }

    pub fn frame(&self, id: HeapId) -> &Frame {
        match self.get(id) {
            HeapData::Frame(frame) => frame,
            other => panic!("expected Frame, found {other:?}"),
        }
    }

    pub fn frame_mut(&mut self, id: HeapId) -> &mut Frame {
        match self.get_mut(id) {
            HeapData::Frame(frame) => frame,
            other => panic!("expected Frame, found {other:?}"),
        }
    }

    pub fn exception(&self, id: HeapId) -> &ExceptionObj {
        match self.get(id) {
            HeapData::Exception(exception) => exception,
            other => panic!("expected Exception, found {other:?}"),
        }
    }

    pub fn file_mut(&mut self, id: HeapId) -> &mut FileObj {
        match self.get_mut(id) {
            HeapData::File(file) => file,
            other => panic!("expected File, found {other:?}"),
        }
    }
}
