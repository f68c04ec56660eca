//! Runtime data types stored in the arena heap.

mod class;
mod exception;
mod file;
mod frame;
mod function;
pub(crate) mod iter;
mod list;
mod map;
mod range;
mod set;

pub(crate) use class::{Allocator, ClassObj, InstanceObj};
pub(crate) use exception::ExceptionObj;
pub(crate) use file::FileObj;
pub(crate) use frame::Frame;
pub(crate) use function::{FunctionKind, FunctionObj, NativeFn};
pub(crate) use iter::{IterObj, IterState};
pub(crate) use list::ListObj;
pub(crate) use map::MapObj;
pub(crate) use range::RangeObj;
pub(crate) use set::SetObj;

use indexmap::IndexMap;

use crate::{unistr::UniString, value::Value};

/// Insertion-ordered attribute table keyed by attribute name.
pub(crate) type AttrMap = IndexMap<UniString, Value>;
