//! Methods of the `Int` and `Float` classes.
//!
//! Mixed Int/Float operands promote to Float. Int addition, subtraction and
//! multiplication raise OverflowError when the result leaves the 64-bit
//! range; shifts keep two's-complement wrapping.

use crate::{
    interp::{Interpreter, Raised},
    object,
    unistr::float_to_string,
    value::Value,
};

enum Num {
    Int(i64),
    Float(f64),
}

fn int_receiver(args: &[Value]) -> i64 {
    match args[0] {
        Value::Int(i) => i,
        _ => unreachable!("receiver checked by method dispatch"),
    }
}

fn float_receiver(args: &[Value]) -> f64 {
    match args[0] {
        Value::Float(f) => f,
        _ => unreachable!("receiver checked by method dispatch"),
    }
}

fn num_operand(interp: &mut Interpreter, value: &Value) -> Result<Num, Raised> {
    match value {
        Value::Int(i) => Ok(Num::Int(*i)),
        Value::Float(f) => Ok(Num::Float(*f)),
        _ => {
            let type_error = interp.registry.type_error;
            Err(interp.throw(type_error, "Number value required"))
        }
    }
}

fn int_operand(interp: &mut Interpreter, value: &Value) -> Result<i64, Raised> {
    object::as_int(interp, value)
}

fn overflow(interp: &mut Interpreter) -> Raised {
    let overflow_error = interp.registry.overflow_error;
    interp.throw(overflow_error, "Integer overflow")
}

// --- Int ---------------------------------------------------------------

/// Int#__add__(other) => Int | Float
fn int_add(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = int_receiver(args);
    match num_operand(interp, &args[1])? {
        Num::Int(b) => a.checked_add(b).map(Value::Int).ok_or_else(|| overflow(interp)),
        Num::Float(b) => Ok(Value::Float(a as f64 + b)),
    }
}

/// Int#__sub__(other) => Int | Float
fn int_sub(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = int_receiver(args);
    match num_operand(interp, &args[1])? {
        Num::Int(b) => a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow(interp)),
        Num::Float(b) => Ok(Value::Float(a as f64 - b)),
    }
}

/// Int#__mul__(other) => Int | Float
fn int_mul(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = int_receiver(args);
    match num_operand(interp, &args[1])? {
        Num::Int(b) => a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow(interp)),
        Num::Float(b) => Ok(Value::Float(a as f64 * b)),
    }
}

/// Int#__div__(other) => Int | Float
///
/// Integer division truncates toward zero.
fn int_div(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = int_receiver(args);
    match num_operand(interp, &args[1])? {
        Num::Int(0) => {
            let zero_division = interp.registry.zero_division_error;
            Err(interp.throw(zero_division, "Division by zero"))
        }
        Num::Int(b) => a.checked_div(b).map(Value::Int).ok_or_else(|| overflow(interp)),
        Num::Float(b) => Ok(Value::Float(a as f64 / b)),
    }
}

/// Int#__mod__(other) => Int | Float
fn int_mod(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = int_receiver(args);
    match num_operand(interp, &args[1])? {
        Num::Int(0) => {
            let zero_division = interp.registry.zero_division_error;
            Err(interp.throw(zero_division, "Modulo by zero"))
        }
        Num::Int(b) => a.checked_rem(b).map(Value::Int).ok_or_else(|| overflow(interp)),
        Num::Float(b) => Ok(Value::Float((a as f64) % b)),
    }
}

/// Int#__and__(other) => Int
fn int_and(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = int_operand(interp, &args[1])?;
    Ok(Value::Int(int_receiver(args) & b))
}

/// Int#__or__(other) => Int
fn int_or(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = int_operand(interp, &args[1])?;
    Ok(Value::Int(int_receiver(args) | b))
}

/// Int#__xor__(other) => Int
fn int_xor(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = int_operand(interp, &args[1])?;
    Ok(Value::Int(int_receiver(args) ^ b))
}

/// Int#__lsh__(count) => Int
///
/// Shift counts wrap modulo the word size.
fn int_lsh(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = int_operand(interp, &args[1])?;
    if b < 0 {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Negative shift count"));
    }
    Ok(Value::Int(int_receiver(args).wrapping_shl(b as u32)))
}

/// Int#__rsh__(count) => Int
fn int_rsh(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = int_operand(interp, &args[1])?;
    if b < 0 {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Negative shift count"));
    }
    Ok(Value::Int(int_receiver(args).wrapping_shr(b as u32)))
}

/// Int#__lt__(other) => Bool
fn int_lt(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = int_receiver(args);
    let result = match num_operand(interp, &args[1]) {
        Ok(Num::Int(b)) => a < b,
        Ok(Num::Float(b)) => (a as f64) < b,
        Err(_) => {
            interp.exception = None;
            let type_error = interp.registry.type_error;
            let message = format!("Cannot compare '{}' with 'Int'", object::type_name(interp, &args[1]));
            return Err(interp.throw(type_error, message));
        }
    };
    Ok(Value::Bool(result))
}

/// Int#__eq__(other) => Bool
fn int_eq(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = int_receiver(args);
    Ok(Value::Bool(match &args[1] {
        Value::Int(b) => a == *b,
        Value::Float(b) => (a as f64) == *b,
        _ => false,
    }))
}

/// Int#__hash__() => Int
fn int_hash(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(int_receiver(args)))
}

/// Int#__bool__() => Bool
fn int_bool(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(int_receiver(args) != 0))
}

/// Int#__str__() => String
fn int_str(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(int_receiver(args).to_string().as_str()))
}

/// Int#as_json() => String
fn int_as_json(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(int_receiver(args).to_string().as_str()))
}

/// Int#__neg__() => Int
fn int_neg(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    int_receiver(args).checked_neg().map(Value::Int).ok_or_else(|| overflow(interp))
}

/// Int#__pos__() => Int
fn int_pos(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(args[0].clone())
}

/// Int#__invert__() => Int
fn int_invert(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(!int_receiver(args)))
}

/// Int#__inc__() => Int
fn int_inc(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    int_receiver(args).checked_add(1).map(Value::Int).ok_or_else(|| overflow(interp))
}

/// Int#__dec__() => Int
fn int_dec(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    int_receiver(args).checked_sub(1).map(Value::Int).ok_or_else(|| overflow(interp))
}

// --- Float -------------------------------------------------------------

fn float_operand(interp: &mut Interpreter, value: &Value) -> Result<f64, Raised> {
    match num_operand(interp, value)? {
        Num::Int(i) => Ok(i as f64),
        Num::Float(f) => Ok(f),
    }
}

/// Float#__add__(other) => Float
fn float_add(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = float_operand(interp, &args[1])?;
    Ok(Value::Float(float_receiver(args) + b))
}

/// Float#__sub__(other) => Float
fn float_sub(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = float_operand(interp, &args[1])?;
    Ok(Value::Float(float_receiver(args) - b))
}

/// Float#__mul__(other) => Float
fn float_mul(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = float_operand(interp, &args[1])?;
    Ok(Value::Float(float_receiver(args) * b))
}

/// Float#__div__(other) => Float
fn float_div(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = float_operand(interp, &args[1])?;
    Ok(Value::Float(float_receiver(args) / b))
}

/// Float#__mod__(other) => Float
fn float_mod(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let b = float_operand(interp, &args[1])?;
    Ok(Value::Float(float_receiver(args) % b))
}

/// Float#__lt__(other) => Bool
fn float_lt(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = float_receiver(args);
    match num_operand(interp, &args[1]) {
        Ok(Num::Int(b)) => Ok(Value::Bool(a < b as f64)),
        Ok(Num::Float(b)) => Ok(Value::Bool(a < b)),
        Err(_) => {
            interp.exception = None;
            let type_error = interp.registry.type_error;
            let message = format!("Cannot compare '{}' with 'Float'", object::type_name(interp, &args[1]));
            Err(interp.throw(type_error, message))
        }
    }
}

/// Float#__eq__(other) => Bool
fn float_eq(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let a = float_receiver(args);
    Ok(Value::Bool(match &args[1] {
        Value::Int(b) => a == *b as f64,
        Value::Float(b) => a == *b,
        _ => false,
    }))
}

/// Float#__hash__() => Int
fn float_hash(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Int(float_receiver(args).to_bits() as i64))
}

/// Float#__bool__() => Bool
fn float_bool(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(float_receiver(args) != 0.0))
}

/// Float#__str__() => String
fn float_str(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(float_to_string(float_receiver(args)).as_str()))
}

/// Float#as_json() => String
fn float_as_json(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::from(float_to_string(float_receiver(args)).as_str()))
}

/// Float#__neg__() => Float
fn float_neg(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Float(-float_receiver(args)))
}

/// Float#__pos__() => Float
fn float_pos(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(args[0].clone())
}

/// Float#__inc__() => Float
fn float_inc(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Float(float_receiver(args) + 1.0))
}

/// Float#__dec__() => Float
fn float_dec(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Float(float_receiver(args) - 1.0))
}

/// Float#is_nan() => Bool
fn float_is_nan(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Bool(float_receiver(args).is_nan()))
}

/// Float#floor() => Float
fn float_floor(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Float(float_receiver(args).floor()))
}

/// Float#ceil() => Float
fn float_ceil(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Float(float_receiver(args).ceil()))
}

/// Float#round() => Float
fn float_round(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    Ok(Value::Float(float_receiver(args).round()))
}

pub(crate) fn init(i: &mut Interpreter) {
    let int = i.registry.int;
    let float = i.registry.float;

    // Arithmetic operators.
    i.add_method(int, "__add__", 1, int_add);
    i.add_method(int, "__sub__", 1, int_sub);
    i.add_method(int, "__mul__", 1, int_mul);
    i.add_method(int, "__div__", 1, int_div);
    i.add_method(int, "__mod__", 1, int_mod);

    // Bitwise operators.
    i.add_method(int, "__and__", 1, int_and);
    i.add_method(int, "__or__", 1, int_or);
    i.add_method(int, "__xor__", 1, int_xor);
    i.add_method(int, "__lsh__", 1, int_lsh);
    i.add_method(int, "__rsh__", 1, int_rsh);

    i.add_method(int, "__lt__", 1, int_lt);
    i.add_method(int, "__eq__", 1, int_eq);
    i.add_method(int, "__hash__", 0, int_hash);

    i.add_method(int, "__neg__", 0, int_neg);
    i.add_method(int, "__pos__", 0, int_pos);
    i.add_method(int, "__invert__", 0, int_invert);
    i.add_method(int, "__inc__", 0, int_inc);
    i.add_method(int, "__dec__", 0, int_dec);

    // Conversion methods.
    i.add_method(int, "__bool__", 0, int_bool);
    i.add_method(int, "__str__", 0, int_str);
    i.add_method(int, "as_json", 0, int_as_json);

    i.add_method(float, "__add__", 1, float_add);
    i.add_method(float, "__sub__", 1, float_sub);
    i.add_method(float, "__mul__", 1, float_mul);
    i.add_method(float, "__div__", 1, float_div);
    i.add_method(float, "__mod__", 1, float_mod);

    i.add_method(float, "__lt__", 1, float_lt);
    i.add_method(float, "__eq__", 1, float_eq);
    i.add_method(float, "__hash__", 0, float_hash);

    i.add_method(float, "__neg__", 0, float_neg);
    i.add_method(float, "__pos__", 0, float_pos);
    i.add_method(float, "__inc__", 0, float_inc);
    i.add_method(float, "__dec__", 0, float_dec);

    i.add_method(float, "is_nan", 0, float_is_nan);
    i.add_method(float, "floor", 0, float_floor);
    i.add_method(float, "ceil", 0, float_ceil);
    i.add_method(float, "round", 0, float_round);

    // Conversion methods.
    i.add_method(float, "__bool__", 0, float_bool);
    i.add_method(float, "__str__", 0, float_str);
    i.add_method(float, "as_json", 0, float_as_json);
}
