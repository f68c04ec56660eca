//! Tree-walking evaluator.
//!
//! Every statement node executes to a [`Flow`]; expression evaluation is
//! execution that demands a value. Errors are the `Raised` marker with the
//! exception parked in the interpreter, so `?` propagates unwinding exactly
//! as the pending-exception discipline requires.

use std::rc::Rc;

use crate::{
    ast::{IncDec, Node, Parameter, Script, TypeHint},
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    object,
    types::{FunctionKind, FunctionObj, ListObj, MapObj, RangeObj},
    unistr::UniString,
    value::Value,
};

/// Outcome of executing a statement node.
#[derive(Debug)]
pub(crate) enum Flow {
    Normal(Option<Value>),
    Break,
    Continue,
    Return(Option<Value>),
}

/// Executes a script's top-level nodes, returning the value of the last
/// value-producing statement (the REPL echoes it).
pub(crate) fn run_script(interp: &mut Interpreter, script: &Script) -> Result<Value, Raised> {
    let mut last = Value::Null;
    for node in &script.nodes {
        match execute(interp, node)? {
            Flow::Normal(Some(value)) => last = value,
            Flow::Normal(None) => {}
            Flow::Break => return Err(stray(interp, "break")),
            Flow::Continue => return Err(stray(interp, "continue")),
            Flow::Return(_) => return Err(stray(interp, "return")),
        }
    }
    Ok(last)
}

fn stray(interp: &mut Interpreter, what: &str) -> Raised {
    let syntax_error = interp.registry.syntax_error;
    interp.throw(syntax_error, format!("Unexpected `{what}'"))
}

/// Evaluates a node for its value; loop and return control flow is a syntax
/// error in expression position.
pub(crate) fn evaluate(interp: &mut Interpreter, node: &Node) -> Result<Value, Raised> {
    match execute(interp, node)? {
        Flow::Normal(value) => Ok(value.unwrap_or(Value::Null)),
        Flow::Break => Err(stray(interp, "break")),
        Flow::Continue => Err(stray(interp, "continue")),
        Flow::Return(_) => Err(stray(interp, "return")),
    }
}

pub(crate) fn execute(interp: &mut Interpreter, node: &Node) -> Result<Flow, Raised> {
    match node {
        Node::Empty => Ok(Flow::Normal(None)),

        Node::Text(content) => {
            let bytes = content.encode();
            interp.write_output(&bytes);
            Ok(Flow::Normal(None))
        }

        Node::Expression { expression, escape } => {
            let value = evaluate(interp, expression)?;
            let mut text = object::to_string(interp, &value)?;
            if *escape {
                text = text.escape_xml();
            }
            let bytes = text.encode();
            interp.write_output(&bytes);
            Ok(Flow::Normal(None))
        }

        Node::Block(nodes) => {
            for node in nodes {
                let flow = execute(interp, node)?;
                if !matches!(flow, Flow::Normal(_)) {
                    return Ok(flow);
                }
            }
            Ok(Flow::Normal(None))
        }

        Node::If {
            condition,
            then_statement,
            else_statement,
        } => {
            let value = evaluate(interp, condition)?;
            if object::to_bool(interp, &value)? {
                execute(interp, then_statement)
            } else if let Some(else_statement) = else_statement {
                execute(interp, else_statement)
            } else {
                Ok(Flow::Normal(None))
            }
        }

        Node::While { condition, statement } => {
            loop {
                let value = evaluate(interp, condition)?;
                if !object::to_bool(interp, &value)? {
                    return Ok(Flow::Normal(None));
                }
                match execute(interp, statement)? {
                    Flow::Normal(_) | Flow::Continue => {}
                    Flow::Break => return Ok(Flow::Normal(None)),
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            }
        }

        Node::For {
            variable,
            collection,
            statement,
            else_statement,
        } => {
            let value = evaluate(interp, collection)?;
            let iterator = object::iterator_of(interp, &value)?;
            let Some(first) = object::get_next(interp, &iterator)? else {
                return if let Some(else_statement) = else_statement {
                    execute(interp, else_statement)
                } else {
                    Ok(Flow::Normal(None))
                };
            };
            let mut element = first;
            loop {
                assign_local(interp, variable, element)?;
                match execute(interp, statement)? {
                    Flow::Normal(_) | Flow::Continue => {}
                    Flow::Break => return Ok(Flow::Normal(None)),
                    flow @ Flow::Return(_) => return Ok(flow),
                }
                match object::get_next(interp, &iterator)? {
                    Some(next) => element = next,
                    None => return Ok(Flow::Normal(None)),
                }
            }
        }

        Node::Try {
            statement,
            catches,
            else_statement,
            finally_statement,
        } => {
            let mut result = execute(interp, statement);
            if result.is_err() {
                let exception = interp.exception.clone().expect("pending exception");
                for clause in catches {
                    let caught = match &clause.type_hint {
                        Some(hint) => match accepts(interp, hint, &exception) {
                            Ok(caught) => caught,
                            Err(raised) => {
                                result = Err(raised);
                                break;
                            }
                        },
                        None => true,
                    };
                    if caught {
                        interp.caught_exception = Some(exception.clone());
                        interp.exception = None;
                        result = run_catch_clause(interp, clause, &exception);
                        interp.caught_exception = None;
                        break;
                    }
                }
            } else if matches!(result, Ok(Flow::Normal(_))) {
                if let Some(else_statement) = else_statement {
                    result = execute(interp, else_statement);
                }
            }
            if let Some(finally_statement) = finally_statement {
                // A failing finally clause shadows whatever came before it.
                execute(interp, finally_statement)?;
            }
            result
        }

        Node::Break => Ok(Flow::Break),
        Node::Continue => Ok(Flow::Continue),

        Node::Return(value) => {
            let value = match value {
                Some(node) => Some(evaluate(interp, node)?),
                None => None,
            };
            Ok(Flow::Return(value))
        }

        Node::Throw(exception) => match exception {
            Some(node) => {
                let value = evaluate(interp, node)?;
                if !object::is_instance(interp, &value, interp.registry.exception) {
                    let type_error = interp.registry.type_error;
                    let message = format!("Cannot throw instance of '{}'", object::type_name(interp, &value));
                    return Err(interp.throw(type_error, message));
                }
                Err(interp.set_exception(value))
            }
            None => match interp.caught_exception.take() {
                Some(caught) => Err(interp.set_exception(caught)),
                None => {
                    let state_error = interp.registry.state_error;
                    Err(interp.throw(state_error, "No previously caught exception"))
                }
            },
        },

        Node::Value(value) => Ok(Flow::Normal(Some(value.clone()))),

        Node::And { left, right } => {
            let value = evaluate(interp, left)?;
            if object::to_bool(interp, &value)? {
                execute(interp, right)
            } else {
                Ok(Flow::Normal(Some(value)))
            }
        }

        Node::Or { left, right } => {
            let value = evaluate(interp, left)?;
            if object::to_bool(interp, &value)? {
                Ok(Flow::Normal(Some(value)))
            } else {
                execute(interp, right)
            }
        }

        Node::Not(condition) => {
            let value = evaluate(interp, condition)?;
            let b = object::to_bool(interp, &value)?;
            Ok(Flow::Normal(Some(Value::Bool(!b))))
        }

        Node::Identifier(name) => {
            let mut frame = interp.frame;
            while let Some(frame_id) = frame {
                let record = interp.heap.frame(frame_id);
                if let Some(value) = record.get_local(name) {
                    return Ok(Flow::Normal(Some(value)));
                }
                frame = record.enclosing;
            }
            if let Some(value) = interp.get_global(name) {
                return Ok(Flow::Normal(Some(value)));
            }
            let name_error = interp.registry.name_error;
            Err(interp.throw(name_error, format!("Name '{name}' is not defined")))
        }

        Node::Attribute { receiver, id, null_safe } => {
            let value = evaluate(interp, receiver)?;
            if *null_safe && value.is_null() {
                return Ok(Flow::Normal(None));
            }
            let attribute = object::get_attr(interp, &value, id)?;
            Ok(Flow::Normal(Some(attribute)))
        }

        Node::Call {
            receiver,
            id,
            args,
            null_safe,
        } => {
            let value = evaluate(interp, receiver)?;
            if *null_safe && value.is_null() {
                return Ok(Flow::Normal(None));
            }
            let mut arguments = Vec::with_capacity(args.len());
            for arg in args {
                arguments.push(evaluate(interp, arg)?);
            }
            let result = object::call_method(interp, &value, id, arguments)?;
            Ok(Flow::Normal(Some(result)))
        }

        Node::Subscript { container, index } => {
            let container = evaluate(interp, container)?;
            let index = evaluate(interp, index)?;
            let result = object::call_method(interp, &container, &UniString::from("__getitem__"), vec![index])?;
            Ok(Flow::Normal(Some(result)))
        }

        Node::Prefix { variable, kind } => {
            let value = evaluate(interp, variable)?;
            let result = object::call_method(interp, &value, &inc_dec_name(*kind), Vec::new())?;
            assign(interp, variable, result.clone())?;
            Ok(Flow::Normal(Some(result)))
        }

        Node::Postfix { variable, kind } => {
            let value = evaluate(interp, variable)?;
            let result = object::call_method(interp, &value, &inc_dec_name(*kind), Vec::new())?;
            assign(interp, variable, result)?;
            Ok(Flow::Normal(Some(value)))
        }

        Node::Assign { variable, value } => {
            let value = evaluate(interp, value)?;
            assign(interp, variable, value.clone())?;
            Ok(Flow::Normal(Some(value)))
        }

        Node::List(elements) => {
            let mut list = ListObj::new();
            for element in elements {
                list.append(evaluate(interp, element)?);
            }
            let id = interp.heap.allocate(HeapData::List(list));
            Ok(Flow::Normal(Some(Value::Ref(id))))
        }

        Node::Map(entries) => {
            let mut map = MapObj::new();
            for (key_node, value_node) in entries {
                let key = evaluate(interp, key_node)?;
                let value = evaluate(interp, value_node)?;
                let hash = object::get_hash(interp, &key)?;
                map.insert(hash, key, value);
            }
            let id = interp.heap.allocate(HeapData::Map(map));
            Ok(Flow::Normal(Some(Value::Ref(id))))
        }

        Node::Range { begin, end, exclusive } => {
            let begin = evaluate(interp, begin)?;
            let end = evaluate(interp, end)?;
            let begin = object::as_int(interp, &begin)?;
            let end = object::as_int(interp, &end)?;
            let id = interp.heap.allocate(HeapData::Range(RangeObj {
                begin,
                end,
                exclusive: *exclusive,
            }));
            Ok(Flow::Normal(Some(Value::Ref(id))))
        }

        Node::Function { parameters, body } => {
            let function = FunctionObj::new(FunctionKind::Scripted {
                parameters: Rc::clone(parameters),
                body: Rc::clone(body),
                enclosing: interp.frame,
            });
            let id = interp.heap.allocate(HeapData::Function(function));
            Ok(Flow::Normal(Some(Value::Ref(id))))
        }
    }
}

fn run_catch_clause(
    interp: &mut Interpreter,
    clause: &crate::ast::CatchClause,
    exception: &Value,
) -> Result<Flow, Raised> {
    if let Some(variable) = &clause.variable {
        assign(interp, variable, exception.clone())?;
    }
    execute(interp, &clause.statement)
}

fn inc_dec_name(kind: IncDec) -> UniString {
    UniString::from(match kind {
        IncDec::Increment => "__inc__",
        IncDec::Decrement => "__dec__",
    })
}

/// Assignment through the lvalue protocol: identifiers hunt outward through
/// the lexical chain, attributes write through the receiver, subscripts call
/// `__setitem__` and list literals destructure by iteration.
pub(crate) fn assign(interp: &mut Interpreter, node: &Node, value: Value) -> Result<(), Raised> {
    match node {
        Node::Identifier(name) => {
            let mut frame = interp.frame;
            while let Some(frame_id) = frame {
                let enclosing = interp.heap.frame(frame_id).enclosing;
                if interp.heap.frame_mut(frame_id).replace_local(name, value.clone()) {
                    return Ok(());
                }
                frame = enclosing;
            }
            if let Some(frame_id) = interp.frame {
                interp.heap.frame_mut(frame_id).set_local(name.clone(), value);
                return Ok(());
            }
            let name_error = interp.registry.name_error;
            Err(interp.throw(name_error, format!("Name '{name}' is not defined")))
        }

        Node::Attribute { receiver, id, null_safe } => {
            let receiver = evaluate(interp, receiver)?;
            if *null_safe && receiver.is_null() {
                return Ok(());
            }
            object::set_attr(interp, &receiver, id.clone(), value)
        }

        Node::Subscript { container, index } => {
            let container = evaluate(interp, container)?;
            let index = evaluate(interp, index)?;
            object::call_method(interp, &container, &UniString::from("__setitem__"), vec![index, value])?;
            Ok(())
        }

        Node::List(elements) => {
            let iterator = object::iterator_of(interp, &value)?;
            let mut index = 0;
            while let Some(element) = object::get_next(interp, &iterator)? {
                if index >= elements.len() {
                    // Values past the pattern length are discarded.
                    return Ok(());
                }
                assign(interp, &elements[index], element)?;
                index += 1;
            }
            Ok(())
        }

        _ => {
            let syntax_error = interp.registry.syntax_error;
            Err(interp.throw(syntax_error, "Node is not assignable"))
        }
    }
}

/// Binds a loop variable in the innermost frame without hunting outward.
fn assign_local(interp: &mut Interpreter, node: &Node, value: Value) -> Result<(), Raised> {
    if let Node::Identifier(name) = node {
        if let Some(frame_id) = interp.frame {
            interp.heap.frame_mut(frame_id).set_local(name.clone(), value);
            return Ok(());
        }
        let name_error = interp.registry.name_error;
        return Err(interp.throw(name_error, format!("Name '{name}' is not defined")));
    }
    assign(interp, node, value)
}

/// Type-hint acceptance: the hint expression must evaluate to a class, and
/// the compositions behave as subclass test, null-allowance, conjunction and
/// disjunction.
pub(crate) fn accepts(interp: &mut Interpreter, hint: &TypeHint, value: &Value) -> Result<bool, Raised> {
    match hint {
        TypeHint::Expression(node) => {
            let class_value = evaluate(interp, node)?;
            match class_value {
                Value::Ref(id) if matches!(interp.heap.get(id), HeapData::Class(_)) => {
                    Ok(object::is_instance(interp, value, id))
                }
                other => {
                    let type_error = interp.registry.type_error;
                    let message = format!("'{}' is not a class", object::type_name(interp, &other));
                    Err(interp.throw(type_error, message))
                }
            }
        }
        TypeHint::Nullable(inner) => Ok(value.is_null() || accepts(interp, inner, value)?),
        TypeHint::And(left, right) => Ok(accepts(interp, left, value)? && accepts(interp, right, value)?),
        TypeHint::Or(left, right) => Ok(accepts(interp, left, value)? || accepts(interp, right, value)?),
    }
}

/// Invokes a scripted function: pushes a frame linked to the captured
/// enclosing frame, binds parameters and runs the body.
pub(crate) fn invoke_scripted(interp: &mut Interpreter, function_id: HeapId, args: Vec<Value>) -> Result<Value, Raised> {
    let FunctionKind::Scripted {
        parameters,
        body,
        enclosing,
    } = &interp.heap.function(function_id).kind
    else {
        unreachable!("invoke_scripted on non-scripted function");
    };
    let parameters = Rc::clone(parameters);
    let body = Rc::clone(body);
    let enclosing = *enclosing;

    interp.push_frame(enclosing, Some(Value::Ref(function_id)), Value::Null, args.clone());
    let result = run_scripted_body(interp, &parameters, &body, &args);
    interp.pop_frame();
    result
}

fn run_scripted_body(
    interp: &mut Interpreter,
    parameters: &[Parameter],
    body: &[Rc<Node>],
    args: &[Value],
) -> Result<Value, Raised> {
    apply_parameters(interp, parameters, args)?;
    for node in body {
        match execute(interp, node)? {
            Flow::Normal(_) => {}
            Flow::Return(value) => return Ok(value.unwrap_or(Value::Null)),
            Flow::Break => return Err(stray(interp, "break")),
            Flow::Continue => return Err(stray(interp, "continue")),
        }
    }
    Ok(Value::Null)
}

/// Binds call arguments to declared parameters in the current frame:
/// positionally, then defaults, with a trailing rest parameter absorbing the
/// remainder into a List.
fn apply_parameters(interp: &mut Interpreter, parameters: &[Parameter], args: &[Value]) -> Result<(), Raised> {
    let frame_id = interp.frame.expect("call frame");
    for (index, parameter) in parameters.iter().enumerate() {
        if parameter.rest {
            let mut rest = ListObj::new();
            for arg in args.iter().skip(index) {
                check_hint(interp, parameter, arg)?;
                rest.append(arg.clone());
            }
            let rest_id = interp.heap.allocate(HeapData::List(rest));
            interp
                .heap
                .frame_mut(frame_id)
                .set_local(parameter.name.clone(), Value::Ref(rest_id));
            return Ok(());
        } else if let Some(arg) = args.get(index) {
            check_hint(interp, parameter, arg)?;
            let arg = arg.clone();
            interp.heap.frame_mut(frame_id).set_local(parameter.name.clone(), arg);
        } else if let Some(default) = &parameter.default_value {
            let value = evaluate(interp, default)?;
            interp.heap.frame_mut(frame_id).set_local(parameter.name.clone(), value);
        } else {
            let value_error = interp.registry.value_error;
            return Err(interp.throw(value_error, "Too few arguments"));
        }
    }
    if args.len() > parameters.len() {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Too many arguments"));
    }
    Ok(())
}

fn check_hint(interp: &mut Interpreter, parameter: &Parameter, value: &Value) -> Result<(), Raised> {
    if let Some(hint) = &parameter.type_hint
        && !accepts(interp, hint, value)?
    {
        let value_error = interp.registry.value_error;
        return Err(interp.throw(value_error, "Argument is not expected type"));
    }
    Ok(())
}
