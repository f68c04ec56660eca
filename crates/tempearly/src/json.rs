//! JSON parser.
//!
//! A recursive-descent parser over the rune scanner producing interpreter
//! values: objects become Maps, arrays Lists, numbers Int or Float. The
//! single entry point is [`parse_value`]; serialization is the `as_json`
//! method family on values.

use crate::{
    heap::HeapData,
    interp::{Interpreter, Raised},
    object,
    scanner::RuneScanner,
    stream::Stream,
    types::{ListObj, MapObj},
    unistr::{self, UniString, is_digit, is_hex_digit},
    value::Value,
};

/// Parses a single JSON value from the stream.
///
/// On failure the error message is returned; the caller decides which
/// exception class to wrap it in.
pub(crate) fn parse_value(interp: &mut Interpreter, stream: Box<dyn Stream>) -> Result<Value, String> {
    let mut scanner = RuneScanner::new(stream);
    parse(interp, &mut scanner)
}

fn parse(interp: &mut Interpreter, scanner: &mut RuneScanner) -> Result<Value, String> {
    scanner.skip_whitespace();
    match scanner.read_rune() {
        None => Err("Unexpected end of input; Missing JSON value".to_owned()),

        Some(0x74) => expect_word(scanner, "rue", Value::Bool(true), "Unexpected identifier; Missing 'true'"),
        Some(0x66) => expect_word(scanner, "alse", Value::Bool(false), "Unexpected identifier; Missing 'false'"),
        Some(0x6e) => expect_word(scanner, "ull", Value::Null, "Unexpected identifier; Missing 'null'"),

        Some(0x5b) => parse_array(interp, scanner),
        Some(0x7b) => parse_object(interp, scanner),
        Some(0x22) => parse_string(scanner).map(Value::Str),

        Some(initial @ (0x2d | 0x30..=0x39)) => parse_number(scanner, initial),

        Some(_) => Err("Unexpected input".to_owned()),
    }
}

fn expect_word(scanner: &mut RuneScanner, rest: &str, value: Value, error: &str) -> Result<Value, String> {
    for c in rest.chars() {
        if !scanner.read_if(c as u32) {
            return Err(error.to_owned());
        }
    }
    Ok(value)
}

fn parse_array(interp: &mut Interpreter, scanner: &mut RuneScanner) -> Result<Value, String> {
    let mut list = ListObj::new();

    loop {
        scanner.skip_whitespace();
        if scanner.read_if(0x5d) {
            break;
        }
        list.append(parse(interp, scanner)?);
        scanner.skip_whitespace();
        if scanner.read_if(0x2c) {
            continue;
        } else if !scanner.read_if(0x5d) {
            return Err("Unterminated array; Missing ']'".to_owned());
        }
        break;
    }
    let id = interp.heap.allocate(HeapData::List(list));
    Ok(Value::Ref(id))
}

fn parse_object(interp: &mut Interpreter, scanner: &mut RuneScanner) -> Result<Value, String> {
    let mut map = MapObj::new();

    loop {
        scanner.skip_whitespace();
        if scanner.read_if(0x7d) {
            break;
        }
        if !scanner.read_if(0x22) {
            return Err("Missing string literal".to_owned());
        }
        let key = parse_string(scanner)?;
        scanner.skip_whitespace();
        if !scanner.read_if(0x3a) {
            return Err("Missing ':'".to_owned());
        }
        scanner.skip_whitespace();
        let value = parse(interp, scanner)?;
        let hash = key.hash_code() as i64;
        map.insert(hash, Value::Str(key), value);
        scanner.skip_whitespace();
        if scanner.read_if(0x2c) {
            continue;
        } else if !scanner.read_if(0x7d) {
            return Err("Unterminated object; Missing '}'".to_owned());
        }
        break;
    }
    let id = interp.heap.allocate(HeapData::Map(map));
    Ok(Value::Ref(id))
}

fn parse_string(scanner: &mut RuneScanner) -> Result<UniString, String> {
    let mut buffer: Vec<u32> = Vec::new();

    loop {
        let Some(r) = scanner.read_rune() else {
            return Err("Unterminated string; Missing '\"'".to_owned());
        };
        match r {
            0x22 => return Ok(UniString::from_runes(buffer)),
            0x5c => match scanner.read_rune() {
                Some(c @ (0x22 | 0x5c | 0x2f)) => buffer.push(c),
                Some(0x62) => buffer.push(0x08),
                Some(0x66) => buffer.push(0x0c),
                Some(0x6e) => buffer.push(0x0a),
                Some(0x72) => buffer.push(0x0d),
                Some(0x74) => buffer.push(0x09),
                Some(0x75) => {
                    let mut result: u32 = 0;
                    for _ in 0..4 {
                        let Some(digit) = scanner.read_rune().filter(|&d| is_hex_digit(d)) else {
                            return Err("Malformed escape sequence".to_owned());
                        };
                        let value = match digit {
                            0x41..=0x46 => digit - 0x41 + 10,
                            0x61..=0x66 => digit - 0x61 + 10,
                            _ => digit - 0x30,
                        };
                        result = result * 16 + value;
                    }
                    buffer.push(result);
                }
                _ => return Err("Malformed escape sequence".to_owned()),
            },
            _ => buffer.push(r),
        }
    }
}

fn parse_number(scanner: &mut RuneScanner, initial: u32) -> Result<Value, String> {
    let mut buffer: Vec<u32> = vec![initial];
    let mut is_float = false;

    let first_digit = if initial == 0x2d {
        let Some(digit) = scanner.read_rune().filter(|&d| is_digit(d)) else {
            return Err("Missing number after '-'".to_owned());
        };
        buffer.push(digit);
        digit
    } else {
        initial
    };
    if first_digit != 0x30 {
        while scanner.peek_rune().is_some_and(is_digit) {
            buffer.push(scanner.read_rune().unwrap());
        }
    }
    if scanner.read_if(0x2e) {
        is_float = true;
        buffer.push(0x2e);
        while scanner.peek_rune().is_some_and(is_digit) {
            buffer.push(scanner.read_rune().unwrap());
        }
    }
    if scanner.read_if(0x65) || scanner.read_if(0x45) {
        is_float = true;
        buffer.push(0x65);
        if scanner.peek_is(0x2b) || scanner.peek_is(0x2d) {
            buffer.push(scanner.read_rune().unwrap());
        }
        let Some(digit) = scanner.read_rune().filter(|&d| is_digit(d)) else {
            return Err("Invalid exponent".to_owned());
        };
        buffer.push(digit);
        while scanner.peek_rune().is_some_and(is_digit) {
            buffer.push(scanner.read_rune().unwrap());
        }
    }
    let text = UniString::from_runes(buffer);
    if is_float {
        match unistr::parse_float(&text) {
            Some(number) => Ok(Value::Float(number)),
            None => Err("Float overflow/underflow".to_owned()),
        }
    } else {
        match unistr::parse_int(&text, 10) {
            Some(number) => Ok(Value::Int(number)),
            None => Err("Integer overflow/underflow".to_owned()),
        }
    }
}

/// Serializes a value by dispatching its `as_json` method.
pub(crate) fn value_to_json(interp: &mut Interpreter, value: &Value) -> Result<UniString, Raised> {
    let result = object::call_method(interp, value, &UniString::from("as_json"), Vec::new())?;
    object::as_string(interp, &result)
}
