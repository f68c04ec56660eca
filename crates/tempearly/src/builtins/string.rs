//! Methods of the `String` class.

use rand::Rng;

use crate::{
    heap::HeapData,
    interp::{Interpreter, Raised},
    json,
    object,
    stream::MemoryStream,
    types::{Allocator, IterObj, IterState, ListObj},
    unistr::{self, UniString, is_space},
    value::Value,
};

fn str_receiver<'a>(args: &'a [Value]) -> &'a UniString {
    match &args[0] {
        Value::Str(s) => s,
        _ => unreachable!("receiver checked by method dispatch"),
    }
}

/// String.__call__(arguments...) => String
///
/// Constructs a string from the concatenated stringifications of its
/// arguments.
///
/// ```text
///     String(1, 2, 3)  #=> "123"
/// ```
fn str_s_call(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    if args.len() == 1
        && let Value::Str(_) = &args[0]
    {
        return Ok(args[0].clone());
    }
    let mut result = UniString::new();
    for value in args {
        let piece = object::to_string(interp, value)?;
        result = result.concat(&piece);
    }
    Ok(Value::Str(result))
}

/// String.rand(length) => String
///
/// Generates a random string of digits 0-9 and letters a-z.
///
/// Throws: ValueError - If length is zero or below zero.
fn str_s_rand(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let length = object::as_int(interp, &args[0])?;
    if length == 0 {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Length cannot be zero"));
    } else if length < 0 {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Length cannot be less than one"));
    }
    let mut rng = rand::thread_rng();
    let runes = (0..length)
        .map(|_| u32::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    Ok(Value::Str(UniString::from_runes(runes)))
}

/// String#length() => Int
///
/// ```text
///     "foo bar".length()  #=> 7
/// ```
fn str_length(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(str_receiver(args).len() as i64))
}

/// String#lines() => List
///
/// Splits the string on any newline combination.
fn str_lines(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args).clone();
    let mut list = ListObj::new();
    let mut begin = 0;
    let mut i = 0;
    while i < s.len() {
        let r = s.rune_at(i);
        if r == 0x0d && i + 1 < s.len() && s.rune_at(i + 1) == 0x0a {
            list.append(Value::Str(s.substring(begin, i - begin)));
            i += 2;
            begin = i;
        } else if r == 0x0a || r == 0x0d {
            list.append(Value::Str(s.substring(begin, i - begin)));
            i += 1;
            begin = i;
        } else {
            i += 1;
        }
    }
    if begin < s.len() {
        list.append(Value::Str(s.substring_from(begin)));
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// String#runes() => List
///
/// Unicode code points of the string as integers.
///
/// ```text
///     "foo".runes()  #=> [102, 111, 111]
/// ```
fn str_runes(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let list = ListObj::from_elements(
        str_receiver(args)
            .as_runes()
            .iter()
            .map(|&r| Value::Int(i64::from(r)))
            .collect(),
    );
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// String#words() => List
///
/// Whitespace separated words of the string.
///
/// ```text
///     "foo bar baz".words()  #=> ["foo", "bar", "baz"]
/// ```
fn str_words(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args).clone();
    let mut list = ListObj::new();
    let mut begin = 0;
    for i in 0..s.len() {
        if is_space(s.rune_at(i)) {
            if i > begin {
                list.append(Value::Str(s.substring(begin, i - begin)));
            }
            begin = i + 1;
        }
    }
    if s.len() > begin {
        list.append(Value::Str(s.substring_from(begin)));
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::List(list))))
}

/// String#capitalize() => String
///
/// ```text
///     "foo".capitalize()  #=> "Foo"
/// ```
fn str_capitalize(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args);
    if s.is_empty() {
        return Ok(args[0].clone());
    }
    let mut runes = Vec::with_capacity(s.len());
    runes.push(unistr::to_upper(s.rune_at(0)));
    for i in 1..s.len() {
        runes.push(unistr::to_lower(s.rune_at(i)));
    }
    Ok(Value::Str(UniString::from_runes(runes)))
}

/// String#chomp() => String
///
/// Removes one trailing newline combination, when present.
fn str_chomp(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args);
    let len = s.len();
    if len > 1 && s.rune_at(len - 2) == 0x0d && s.rune_at(len - 1) == 0x0a {
        return Ok(Value::Str(s.substring(0, len - 2)));
    }
    if len > 0 && (s.rune_at(len - 1) == 0x0a || s.rune_at(len - 1) == 0x0d) {
        return Ok(Value::Str(s.substring(0, len - 1)));
    }
    Ok(args[0].clone())
}

/// String#chop() => String
///
/// Removes the trailing character.
fn str_chop(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args);
    if s.is_empty() {
        Ok(args[0].clone())
    } else {
        Ok(Value::Str(s.substring(0, s.len() - 1)))
    }
}

fn fold_with(args: &[Value], fold: fn(u32) -> u32) -> Value {
    let s = str_receiver(args);
    let runes: Vec<u32> = s.as_runes().iter().map(|&r| fold(r)).collect();
    if runes == s.as_runes() {
        args[0].clone()
    } else {
        Value::Str(UniString::from_runes(runes))
    }
}

/// String#lower() => String
fn str_lower(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(fold_with(args, unistr::to_lower))
}

/// String#upper() => String
fn str_upper(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(fold_with(args, unistr::to_upper))
}

/// String#reverse() => String
///
/// ```text
///     "foobar".reverse()  #=> "raboof"
/// ```
fn str_reverse(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args);
    if s.is_empty() {
        return Ok(args[0].clone());
    }
    let runes: Vec<u32> = s.as_runes().iter().rev().copied().collect();
    Ok(Value::Str(UniString::from_runes(runes)))
}

/// String#swapcase() => String
///
/// ```text
///     "fooBAR".swapcase()  #=> "FOObar"
/// ```
fn str_swapcase(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let swap = |r: u32| {
        if unistr::is_lower(r) {
            unistr::to_upper(r)
        } else if unistr::is_upper(r) {
            unistr::to_lower(r)
        } else {
            r
        }
    };
    let s = str_receiver(args);
    let runes: Vec<u32> = s.as_runes().iter().map(|&r| swap(r)).collect();
    Ok(Value::Str(UniString::from_runes(runes)))
}

/// String#titleize() => String
///
/// Upper-cases the first character of every whitespace separated word.
///
/// ```text
///     "foo bar".titleize()  #=> "Foo Bar"
/// ```
fn str_titleize(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args);
    let mut runes = Vec::with_capacity(s.len());
    let mut at_word_start = true;
    for &r in s.as_runes() {
        if is_space(r) {
            at_word_start = true;
            runes.push(r);
        } else if at_word_start {
            at_word_start = false;
            runes.push(unistr::to_upper(r));
        } else {
            runes.push(r);
        }
    }
    Ok(Value::Str(UniString::from_runes(runes)))
}

/// String#trim() => String
///
/// ```text
///     "  foo  ".trim()  #=> "foo"
/// ```
fn str_trim(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Str(str_receiver(args).trim()))
}

/// String#index_of(needle) => Int
///
/// Index of the first occurrence of the substring, or -1.
fn str_index_of(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let needle = object::as_string(interp, &args[1])?;
    let s = str_receiver(args);
    if needle.is_empty() {
        return Ok(Value::Int(0));
    }
    if needle.len() <= s.len() {
        for start in 0..=(s.len() - needle.len()) {
            if s.substring(start, needle.len()) == needle {
                return Ok(Value::Int(start as i64));
            }
        }
    }
    Ok(Value::Int(-1))
}

/// String#starts_with(prefix) => Bool
fn str_starts_with(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let prefix = object::as_string(interp, &args[1])?;
    Ok(Value::Bool(str_receiver(args).starts_with(&prefix)))
}

/// String#__hash__() => Int
fn str_hash(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(str_receiver(args).hash_code() as i64))
}

/// String#__iter__() => Iterator
///
/// Iterates over each character as a one-character string.
fn str_iter(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let s = str_receiver(args).clone();
    if s.is_empty() {
        let id = interp.empty_iterator();
        return Ok(Value::Ref(id));
    }
    let id = interp
        .heap
        .allocate(HeapData::Iter(IterObj::new(IterState::Str { string: s, index: 0 })));
    Ok(Value::Ref(id))
}

/// String#__bool__() => Bool
///
/// Strings evaluate as true when they are not empty.
fn str_bool(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(!str_receiver(args).is_empty()))
}

/// String#as_json() => String
fn str_as_json(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let escaped = str_receiver(args).escape_js();
    let mut runes = Vec::with_capacity(escaped.len() + 2);
    runes.push(0x22);
    runes.extend_from_slice(escaped.as_runes());
    runes.push(0x22);
    Ok(Value::Str(UniString::from_runes(runes)))
}

/// String#__add__(other) => String
///
/// ```text
///     "foo" + "bar"  #=> "foobar"
/// ```
///
/// Throws: ValueError - If the operand is not a string.
fn str_add(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    match &args[1] {
        Value::Str(operand) => {
            let s = str_receiver(args);
            if s.is_empty() {
                Ok(args[1].clone())
            } else if operand.is_empty() {
                Ok(args[0].clone())
            } else {
                Ok(Value::Str(s.concat(operand)))
            }
        }
        _ => {
            let value_error = interp.registry.value_error;
            Err(interp.throw(value_error, "String value required"))
        }
    }
}

/// String#__mul__(count) => String
///
/// ```text
///     "ho! " * 3  #=> "ho! ho! ho! "
/// ```
///
/// Throws: ValueError - If count is negative.
fn str_mul(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let count = object::as_int(interp, &args[1])?;
    if count < 0 {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Negative multiplier"));
    }
    let s = str_receiver(args);
    if count == 1 || s.is_empty() {
        return Ok(args[0].clone());
    }
    let mut runes = Vec::with_capacity(s.len() * count as usize);
    for _ in 0..count {
        runes.extend_from_slice(s.as_runes());
    }
    Ok(Value::Str(UniString::from_runes(runes)))
}

/// String#__eq__(other) => Bool
fn str_eq(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(match &args[1] {
        Value::Str(operand) => str_receiver(args) == operand,
        _ => false,
    }))
}

/// String#__lt__(other) => Bool
///
/// Lexicographic comparison.
///
/// Throws: TypeError - If the operand is not a string.
fn str_lt(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    match &args[1] {
        Value::Str(operand) => Ok(Value::Bool(str_receiver(args).compare(operand) == std::cmp::Ordering::Less)),
        other => {
            let type_error = interp.registry.type_error;
            let message = format!("Cannot compare '{}' with 'String'", object::type_name(interp, other));
            Err(interp.throw(type_error, message))
        }
    }
}

/// String#parse_json() => Object
///
/// Throws: ValueError - If the string cannot be parsed as JSON.
fn str_parse_json(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let bytes = str_receiver(args).encode();
    let stream = MemoryStream::from_bytes(bytes);
    match json::parse_value(interp, Box::new(stream)) {
        Ok(value) => Ok(value),
        Err(message) => {
            let value_error = interp.registry.value_error;
            Err(interp.throw(value_error, message))
        }
    }
}

pub(crate) fn init(i: &mut Interpreter) {
    let string = i.registry.string;

    i.set_allocator(string, Allocator::None);

    i.add_static_method(string, "__call__", -1, str_s_call);
    i.add_static_method(string, "rand", 1, str_s_rand);

    i.add_method(string, "length", 0, str_length);
    i.add_method(string, "lines", 0, str_lines);
    i.add_method(string, "runes", 0, str_runes);
    i.add_method(string, "words", 0, str_words);

    // Manipulation methods.
    i.add_method(string, "capitalize", 0, str_capitalize);
    i.add_method(string, "chomp", 0, str_chomp);
    i.add_method(string, "chop", 0, str_chop);
    i.add_method(string, "lower", 0, str_lower);
    i.add_method(string, "reverse", 0, str_reverse);
    i.add_method(string, "swapcase", 0, str_swapcase);
    i.add_method(string, "titleize", 0, str_titleize);
    i.add_method(string, "trim", 0, str_trim);
    i.add_method(string, "upper", 0, str_upper);

    i.add_method(string, "index_of", 1, str_index_of);
    i.add_method(string, "starts_with", 1, str_starts_with);

    i.add_method(string, "__hash__", 0, str_hash);
    i.add_method(string, "__iter__", 0, str_iter);

    // Conversion methods.
    i.add_method(string, "__bool__", 0, str_bool);
    i.add_method(string, "as_json", 0, str_as_json);

    // Operators.
    i.add_method(string, "__add__", 1, str_add);
    i.add_method(string, "__mul__", 1, str_mul);
    i.add_method(string, "__eq__", 1, str_eq);
    i.add_method(string, "__lt__", 1, str_lt);

    i.add_method(string, "parse_json", 0, str_parse_json);
}
