//! Methods of the abstract `Iterable` class, inherited by String, List,
//! Map, Set, Range and Iterator.

use crate::{
    heap::{FLAG_INSPECTING, HeapData},
    interp::{Interpreter, Raised},
    json,
    object,
    types::{Allocator, IterObj, IterState, ListObj},
    unistr::UniString,
    value::Value,
};

fn call_function(interp: &mut Interpreter, function: &Value, args: Vec<Value>) -> Result<Value, Raised> {
    object::call_method(interp, function, &UniString::from("__call__"), args)
}

fn empty_state_error(interp: &mut Interpreter) -> Raised {
    let state_error = interp.registry.state_error;
    interp.throw(state_error, "Iteration is empty")
}

/// Iterable#first([default_value]) => Object
///
/// Returns the first element of the iteration.
///
/// Throws: StateError - If the iteration is empty and no default value is
/// given.
fn iterable_first(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    match object::get_next(interp, &iterator)? {
        Some(element) => Ok(element),
        None => match args.get(1) {
            Some(default) => Ok(default.clone()),
            None => Err(empty_state_error(interp)),
        },
    }
}

/// Iterable#last([default_value]) => Object
///
/// Returns the last element of the iteration.
///
/// Throws: StateError - If the iteration is empty and no default value is
/// given.
fn iterable_last(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let mut last = None;
    while let Some(element) = object::get_next(interp, &iterator)? {
        last = Some(element);
    }
    match last {
        Some(element) => Ok(element),
        None => match args.get(1) {
            Some(default) => Ok(default.clone()),
            None => Err(empty_state_error(interp)),
        },
    }
}

/// Iterable#single([default_value]) => Object
///
/// Returns the only element of the iteration.
///
/// Throws: StateError - If the iteration is empty and no default value is
/// given, or if the iteration contains more than one element.
fn iterable_single(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    match object::get_next(interp, &iterator)? {
        Some(element) => {
            if object::get_next(interp, &iterator)?.is_some() {
                let state_error = interp.registry.state_error;
                return Err(interp.throw(state_error, "Iteration contains more than one element"));
            }
            Ok(element)
        }
        None => match args.get(1) {
            Some(default) => Ok(default.clone()),
            None => Err(empty_state_error(interp)),
        },
    }
}

/// Iterable#max([function(max, element)]) => Object
///
/// Maximum element, determined with `__gt__` or the given comparator.
///
/// ```text
///     [3, 9, 6].max()  #=> 9
/// ```
///
/// Throws: StateError - If the iteration is empty.
fn iterable_max(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    fold_extreme(interp, args, Extreme::Max)
}

/// Iterable#min([function(min, element)]) => Object
///
/// Minimum element, determined with `__lt__` or the given comparator.
///
/// ```text
///     [6, 3, 9].min()  #=> 3
/// ```
///
/// Throws: StateError - If the iteration is empty.
fn iterable_min(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    fold_extreme(interp, args, Extreme::Min)
}

#[derive(Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

fn fold_extreme(interp: &mut Interpreter, args: &[Value], kind: Extreme) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let Some(mut best) = object::get_next(interp, &iterator)? else {
        return Err(empty_state_error(interp));
    };
    while let Some(element) = object::get_next(interp, &iterator)? {
        let replace = match args.get(1) {
            None => {
                let method = match kind {
                    Extreme::Max => "__gt__",
                    Extreme::Min => "__lt__",
                };
                let result = object::call_method(interp, &element, &UniString::from(method), vec![best.clone()])?;
                object::as_bool(interp, &result)?
            }
            Some(function) => {
                let result = call_function(interp, function, vec![best.clone(), element.clone()])?;
                let ordering = object::as_int(interp, &result)?;
                match kind {
                    Extreme::Max => ordering > 0,
                    Extreme::Min => ordering < 0,
                }
            }
        };
        if replace {
            best = element;
        }
    }
    Ok(best)
}

/// Iterable#sum([function(sum, element)]) => Object
///
/// Folds the iteration with `__add__`, or with the given function.
///
/// ```text
///     [3, 6, 9].sum()                         #=> 18
///     [3, 6, 9].sum(function(a, b) => a * b)  #=> 162
/// ```
///
/// Throws: StateError - If the iteration is empty.
fn iterable_sum(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let Some(mut sum) = object::get_next(interp, &iterator)? else {
        return Err(empty_state_error(interp));
    };
    while let Some(element) = object::get_next(interp, &iterator)? {
        sum = match args.get(1) {
            None => object::call_method(interp, &sum, &UniString::from("__add__"), vec![element])?,
            Some(function) => call_function(interp, function, vec![sum.clone(), element])?,
        };
    }
    Ok(sum)
}

/// Iterable#avg([function(sum, element)]) => Object
///
/// Sum of the elements divided by their count via `__div__`.
///
/// Throws: StateError - If the iteration is empty.
fn iterable_avg(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let Some(mut sum) = object::get_next(interp, &iterator)? else {
        return Err(empty_state_error(interp));
    };
    let mut count: i64 = 1;
    while let Some(element) = object::get_next(interp, &iterator)? {
        sum = match args.get(1) {
            None => object::call_method(interp, &sum, &UniString::from("__add__"), vec![element])?,
            Some(function) => call_function(interp, function, vec![sum.clone(), element])?,
        };
        count += 1;
    }
    object::call_method(interp, &sum, &UniString::from("__div__"), vec![Value::Int(count)])
}

/// Iterable#all(function(element)) => Bool
///
/// True when the function holds for every element; an empty iteration is
/// vacuously true.
///
/// ```text
///     ["ant", "bear", "cat"].all(function(w) => w.length() >= 3)  #=> true
///     ["ant", "bear", "cat"].all(function(w) => w.length() >= 4)  #=> false
/// ```
fn iterable_all(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    while let Some(element) = object::get_next(interp, &iterator)? {
        let result = call_function(interp, &args[1], vec![element])?;
        if !object::as_bool(interp, &result)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Iterable#any(function(element)) => Bool
///
/// True when the function holds for at least one element.
fn iterable_any(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    while let Some(element) = object::get_next(interp, &iterator)? {
        let result = call_function(interp, &args[1], vec![element])?;
        if object::as_bool(interp, &result)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// Iterable#each(function(element)) => self
///
/// Applies the function to every element and returns the receiver for
/// chaining.
fn iterable_each(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    while let Some(element) = object::get_next(interp, &iterator)? {
        call_function(interp, &args[1], vec![element])?;
    }
    Ok(args[0].clone())
}

/// Iterable#filter(function(element)) => List
///
/// ```text
///     (1..4).filter(function(i) => i % 2 == 0)  #=> [2, 4]
/// ```
fn iterable_filter(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let mut list = ListObj::new();
    while let Some(element) = object::get_next(interp, &iterator)? {
        let result = call_function(interp, &args[1], vec![element.clone()])?;
        if object::as_bool(interp, &result)? {
            list.append(element);
        }
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// Iterable#map(function(element)) => List
///
/// ```text
///     [1, 2, 3].map(function(i) => i * i)  #=> [1, 4, 9]
/// ```
fn iterable_map(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let mut list = ListObj::new();
    while let Some(element) = object::get_next(interp, &iterator)? {
        list.append(call_function(interp, &args[1], vec![element])?);
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// Iterable#grep(pattern) => List
///
/// Elements for which the pattern's `__case__` method holds.
///
/// ```text
///     (1..100).grep(38..44)  #=> [38, 39, 40, 41, 42, 43, 44]
/// ```
fn iterable_grep(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let mut list = ListObj::new();
    while let Some(element) = object::get_next(interp, &iterator)? {
        let result = object::call_method(interp, &args[1], &UniString::from("__case__"), vec![element.clone()])?;
        if object::as_bool(interp, &result)? {
            list.append(element);
        }
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// Iterable#has(object) => Bool
///
/// Membership test with `__eq__`.
///
/// ```text
///     [1, 2, 3, 4].has(3)  #=> true
/// ```
fn iterable_has(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    while let Some(element) = object::get_next(interp, &iterator)? {
        if object::equals(interp, &args[1], &element)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// Iterable#join(separator = ", ") => String
///
/// ```text
///     ["a", "b", "c"].join()     #=> "a, b, c"
///     ["a", "b", "c"].join("-")  #=> "a-b-c"
/// ```
fn iterable_join(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let separator = match args.get(1) {
        None => UniString::from(", "),
        Some(value) => object::as_string(interp, value)?,
    };
    if args.len() > 2 {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Too many arguments"));
    }
    let mut buffer = UniString::new();
    if let Some(guard) = InspectGuard::enter(interp, &args[0]) {
        let result = (|| {
            let iterator = object::iterator_of(interp, &args[0])?;
            let mut first = true;
            while let Some(element) = object::get_next(interp, &iterator)? {
                let repr = object::to_string(interp, &element)?;
                if first {
                    first = false;
                } else {
                    buffer = buffer.concat(&separator);
                }
                buffer = buffer.concat(&repr);
            }
            Ok(())
        })();
        guard.exit(interp);
        result?;
    }
    Ok(Value::Str(buffer))
}

/// Iterable#sort([function(a, b)]) => List
///
/// Elements in ascending order by `__lt__`, or by a comparator returning a
/// negative, zero or positive integer.
///
/// ```text
///     [3, 2, 1].sort()  #=> [1, 2, 3]
/// ```
fn iterable_sort(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let mut elements = Vec::new();
    while let Some(element) = object::get_next(interp, &iterator)? {
        elements.push(element);
    }
    let comparator = args.get(1).cloned();
    let sorted = merge_sort(interp, elements, comparator.as_ref())?;
    let list = ListObj::from_elements(sorted);
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

fn sort_less(
    interp: &mut Interpreter,
    comparator: Option<&Value>,
    left: &Value,
    right: &Value,
) -> Result<bool, Raised> {
    match comparator {
        None => object::is_less_than(interp, left, right),
        Some(function) => {
            let result = call_function(interp, function, vec![left.clone(), right.clone()])?;
            Ok(object::as_int(interp, &result)? < 0)
        }
    }
}

fn merge_sort(interp: &mut Interpreter, items: Vec<Value>, comparator: Option<&Value>) -> Result<Vec<Value>, Raised> {
    if items.len() < 2 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort(interp, left, comparator)?;
    let right = merge_sort(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => {
                let (a, b) = (a.clone(), b.clone());
                sort_less(interp, comparator, &b, &a)?
            }
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => return Ok(merged),
        };
        if take_right {
            merged.push(right.next().unwrap());
        } else {
            merged.push(left.next().unwrap());
        }
    }
}

/// Iterable#split(function(element)) => List
///
/// Two lists: elements the function accepts, then the rest.
///
/// ```text
///     (1..6).split(function(i) => i % 2 == 0)  #=> [[2, 4, 6], [1, 3, 5]]
/// ```
fn iterable_split(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let iterator = object::iterator_of(interp, &args[0])?;
    let mut accepted = ListObj::new();
    let mut rejected = ListObj::new();
    while let Some(element) = object::get_next(interp, &iterator)? {
        let result = call_function(interp, &args[1], vec![element.clone()])?;
        if object::as_bool(interp, &result)? {
            accepted.append(element);
        } else {
            rejected.append(element);
        }
    }
    let accepted = Value::Ref(interp.heap.allocate(HeapData::List(accepted)));
    let rejected = Value::Ref(interp.heap.allocate(HeapData::List(rejected)));
    let result = ListObj::from_elements(vec![accepted, rejected]);
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(result))))
}

/// Iterable#take(count) => Iterator
///
/// An iterator over at most `count` elements of the iteration.
///
/// Throws: ValueError - If `count` is negative.
fn iterable_take(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let count = object::as_int(interp, &args[1])?;
    if count < 0 {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Negative count"));
    }
    let iterator = object::iterator_of(interp, &args[0])?;
    let inner = iterator.as_ref_id().expect("iterator is a heap object");
    let id = interp.heap.allocate(HeapData::Iter(IterObj::new(IterState::Take {
        inner,
        remaining: count,
    })));
    Ok(Value::Ref(id))
}

/// Iterable#as_json() => String
///
/// JSON array of the iteration's elements.
fn iterable_as_json(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let mut buffer = String::from("[");
    if let Some(guard) = InspectGuard::enter(interp, &args[0]) {
        let result = (|| {
            let iterator = object::iterator_of(interp, &args[0])?;
            let mut first = true;
            while let Some(element) = object::get_next(interp, &iterator)? {
                let serialized = json::value_to_json(interp, &element)?;
                if first {
                    first = false;
                } else {
                    buffer.push(',');
                }
                buffer.push_str(&serialized.to_string());
            }
            Ok(())
        })();
        guard.exit(interp);
        result?;
    }
    buffer.push(']');
    Ok(Value::from(buffer.as_str()))
}

/// Re-entry guard for cycle-prone operations.
///
/// `enter` returns `None` when the receiver is already being inspected, in
/// which case the operation emits empty content.
pub(crate) struct InspectGuard {
    id: Option<crate::heap::HeapId>,
}

impl InspectGuard {
    pub fn enter(interp: &mut Interpreter, value: &Value) -> Option<Self> {
        match value.as_ref_id() {
            Some(id) => {
                if interp.heap.has_flag(id, FLAG_INSPECTING) {
                    return None;
                }
                interp.heap.set_flag(id, FLAG_INSPECTING);
                Some(Self { id: Some(id) })
            }
            None => Some(Self { id: None }),
        }
    }

    pub fn exit(self, interp: &mut Interpreter) {
        if let Some(id) = self.id {
            interp.heap.clear_flag(id, FLAG_INSPECTING);
        }
    }
}

pub(crate) fn init(i: &mut Interpreter) {
    let iterable = i.registry.iterable;

    i.set_allocator(iterable, Allocator::None);

    i.add_method(iterable, "first", -1, iterable_first);
    i.add_method(iterable, "last", -1, iterable_last);
    i.add_method(iterable, "single", -1, iterable_single);

    i.add_method(iterable, "max", -1, iterable_max);
    i.add_method(iterable, "min", -1, iterable_min);
    i.add_method(iterable, "avg", -1, iterable_avg);
    i.add_method(iterable, "sum", -1, iterable_sum);

    i.add_method(iterable, "all", 1, iterable_all);
    i.add_method(iterable, "any", 1, iterable_any);
    i.add_method(iterable, "each", 1, iterable_each);
    i.add_method(iterable, "filter", 1, iterable_filter);
    i.add_method(iterable, "grep", 1, iterable_grep);
    i.add_method(iterable, "has", 1, iterable_has);
    i.add_method(iterable, "join", -1, iterable_join);
    i.add_method(iterable, "map", 1, iterable_map);
    i.add_method(iterable, "sort", -1, iterable_sort);

    i.add_method(iterable, "split", 1, iterable_split);
    i.add_method(iterable, "take", 1, iterable_take);

    // Conversion methods
    i.add_method(iterable, "as_json", 0, iterable_as_json);
}
