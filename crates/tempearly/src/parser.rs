//! Template and script parser.
//!
//! The top level alternates between template text (emitted literally) and
//! script fragments opened by `{%`, `{{`, `{!` or `{#`. Script code is parsed
//! by recursive descent with one precedence function per operator level;
//! binary operators desugar into magic-method calls at parse time so that the
//! evaluator has a single dispatch path.

use std::rc::Rc;

use crate::{
    ast::{CatchClause, IncDec, Node, Parameter, Script, TypeHint},
    lexer::{Lexer, TokenKind},
    scanner::Position,
    stream::Stream,
    unistr::{UniString, parse_float, parse_int},
    value::Value,
};

/// A lexing or parsing failure with a non-empty message and source position.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

pub(crate) struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(stream: Box<dyn Stream>) -> Self {
        Self {
            lexer: Lexer::new(stream),
        }
    }

    /// Compiles a complete template.
    pub fn compile(mut self) -> Result<Script, ParseError> {
        let mut nodes = Vec::new();

        self.lexer.skip_shebang();
        let result = (|| {
            loop {
                if !self.parse_text_block(&mut nodes)? {
                    return Some(());
                }
                if !self.parse_script_block(&mut nodes)? {
                    return Some(());
                }
            }
        })();
        self.finish(result, nodes)
    }

    /// Compiles bare script source, as fed to the REPL.
    ///
    /// The trailing statement may omit its semicolon; its value becomes the
    /// script's result.
    pub fn compile_expression(mut self) -> Result<Script, ParseError> {
        let mut nodes = Vec::new();

        self.lexer.skip_shebang();
        let result = (|| {
            loop {
                match self.lexer.peek_token().kind {
                    TokenKind::EndOfInput => return Some(()),
                    TokenKind::Error => return None,
                    TokenKind::Semicolon => self.lexer.skip_token(),
                    TokenKind::KwIf
                    | TokenKind::KwWhile
                    | TokenKind::KwFor
                    | TokenKind::KwTry
                    | TokenKind::KwBreak
                    | TokenKind::KwContinue
                    | TokenKind::KwReturn
                    | TokenKind::KwThrow => nodes.push(self.parse_stmt()?),
                    _ => {
                        let expression = self.parse_expr()?;

                        nodes.push(expression);
                        if self.lexer.read_token_if(TokenKind::Semicolon) {
                            continue;
                        }
                        if !self.lexer.peek_is(TokenKind::EndOfInput) {
                            let what = self.lexer.peek_token().kind.what();
                            self.lexer
                                .set_error_message(format!("Unexpected {what}; Missing `;'"));
                            return None;
                        }
                    }
                }
            }
        })();
        self.finish(result, nodes)
    }

    fn finish(mut self, result: Option<()>, nodes: Vec<Rc<Node>>) -> Result<Script, ParseError> {
        let position = self.lexer.position();
        let message = self.lexer.error_message().to_owned();
        self.lexer.close();
        match result {
            Some(()) => Ok(Script { nodes }),
            None => Err(ParseError {
                message: if message.is_empty() {
                    "Syntax error".to_owned()
                } else {
                    message
                },
                position,
            }),
        }
    }

    fn expect_token(&mut self, expected: TokenKind) -> Option<()> {
        let token = self.lexer.read_token();

        if token.kind == expected {
            Some(())
        } else {
            if token.kind != TokenKind::Error {
                self.lexer.set_error_message(format!(
                    "Unexpected {}; Missing {}",
                    token.kind.what(),
                    expected.what()
                ));
            }
            None
        }
    }

    /// Scans template text until a tag opens or input ends.
    ///
    /// Returns `Some(true)` when a `{%` tag switched to script mode and
    /// `Some(false)` at end of input.
    fn parse_text_block(&mut self, nodes: &mut Vec<Rc<Node>>) -> Option<bool> {
        let mut text: Vec<u32> = Vec::new();
        let mut current = self.lexer.read_rune();

        while let Some(c) = current {
            if c == 0x7b {
                // '{'
                current = self.lexer.read_rune();
                match current {
                    Some(0x25) => {
                        // "{%"
                        flush_text(&mut text, nodes);
                        return Some(true);
                    }
                    Some(open @ (0x7b | 0x21)) => {
                        // "{{" or "{!"
                        let escape = open != 0x21;

                        flush_text(&mut text, nodes);
                        let expression = self.parse_expr()?;
                        let closer = if escape { TokenKind::RightBrace } else { TokenKind::Not };
                        if !(self.lexer.read_token_if(closer) && self.lexer.read_rune_if(0x7d)) {
                            let missing = if escape { "'}}'" } else { "'!}'" };
                            self.lexer
                                .set_error_message(format!("Unterminated expression: Missing {missing}"));
                            return None;
                        }
                        nodes.push(Rc::new(Node::Expression { expression, escape }));
                        current = self.lexer.read_rune();
                    }
                    Some(0x23) => {
                        // "{#" comment, discarded
                        loop {
                            match self.lexer.read_rune() {
                                None => {
                                    self.lexer
                                        .set_error_message("Unterminated comment: Missing '#}'");
                                    return None;
                                }
                                Some(0x23) => {
                                    if self.lexer.read_rune_if(0x7d) {
                                        break;
                                    }
                                }
                                Some(_) => {}
                            }
                        }
                        current = self.lexer.read_rune();
                    }
                    other => {
                        text.push(0x7b);
                        current = other;
                    }
                }
            } else if c == 0x5c {
                // Backslash escapes a brace; a backslash-newline pair is a
                // line continuation. Anything else keeps the backslash.
                current = self.lexer.read_rune();
                match current {
                    Some(0x0d) => {
                        self.lexer.read_rune_if(0x0a);
                        current = self.lexer.read_rune();
                    }
                    Some(0x0a) => {
                        current = self.lexer.read_rune();
                    }
                    Some(0x7b) => {
                        text.push(0x7b);
                        current = self.lexer.read_rune();
                    }
                    _ => {
                        text.push(0x5c);
                    }
                }
            } else {
                text.push(c);
                current = self.lexer.read_rune();
            }
        }
        flush_text(&mut text, nodes);
        Some(false)
    }

    /// Parses statements until the closing `%}` tag or end of input.
    ///
    /// Returns `Some(true)` when template mode should resume.
    fn parse_script_block(&mut self, nodes: &mut Vec<Rc<Node>>) -> Option<bool> {
        loop {
            match self.lexer.peek_token().kind {
                TokenKind::EndOfInput => return Some(false),
                TokenKind::CloseTag => {
                    self.lexer.skip_token();
                    return Some(true);
                }
                TokenKind::Semicolon => self.lexer.skip_token(),
                _ => nodes.push(self.parse_stmt()?),
            }
        }
    }

    /// Parses a block body, which may be written inline or straddle a `%}`
    /// close tag so that template text contributes output statements.
    fn parse_block(&mut self) -> Option<Rc<Node>> {
        let mut nodes = Vec::new();

        if self.lexer.read_token_if(TokenKind::CloseTag) {
            loop {
                if !self.parse_text_block(&mut nodes)? {
                    break;
                }
                if matches!(
                    self.lexer.peek_token().kind,
                    TokenKind::KwEnd | TokenKind::KwElse | TokenKind::KwCatch | TokenKind::KwFinally
                ) {
                    break;
                }
                if !self.parse_script_block(&mut nodes)? {
                    break;
                }
            }
        } else {
            while !matches!(
                self.lexer.peek_token().kind,
                TokenKind::KwEnd | TokenKind::KwElse | TokenKind::KwCatch | TokenKind::KwFinally
            ) {
                nodes.push(self.parse_stmt()?);
            }
        }
        Some(match nodes.len() {
            0 => Rc::new(Node::Empty),
            1 => nodes.pop().unwrap(),
            _ => Rc::new(Node::Block(nodes)),
        })
    }

    fn parse_if(&mut self) -> Option<Rc<Node>> {
        self.expect_token(TokenKind::KwIf)?;
        let condition = self.parse_expr()?;
        self.expect_token(TokenKind::Colon)?;
        let then_statement = self.parse_block()?;
        let else_statement = if self.lexer.read_token_if(TokenKind::KwElse) {
            if self.lexer.peek_is(TokenKind::KwIf) {
                Some(self.parse_if()?)
            } else {
                self.expect_token(TokenKind::Colon)?;
                let statement = self.parse_block()?;
                self.expect_token(TokenKind::KwEnd)?;
                self.expect_token(TokenKind::KwIf)?;
                Some(statement)
            }
        } else {
            self.expect_token(TokenKind::KwEnd)?;
            self.expect_token(TokenKind::KwIf)?;
            None
        };
        self.lexer.read_token_if(TokenKind::Semicolon);
        Some(Rc::new(Node::If {
            condition,
            then_statement,
            else_statement,
        }))
    }

    fn parse_while(&mut self) -> Option<Rc<Node>> {
        self.expect_token(TokenKind::KwWhile)?;
        let condition = self.parse_expr()?;
        self.expect_token(TokenKind::Colon)?;
        let statement = self.parse_block()?;
        self.expect_token(TokenKind::KwEnd)?;
        self.expect_token(TokenKind::KwWhile)?;
        self.lexer.read_token_if(TokenKind::Semicolon);
        Some(Rc::new(Node::While { condition, statement }))
    }

    fn parse_for(&mut self) -> Option<Rc<Node>> {
        self.expect_token(TokenKind::KwFor)?;
        let variable = self.parse_expr()?;
        if !variable.is_variable() {
            self.lexer.set_error_message("'for' loop requires variable");
            return None;
        }
        // Both `for x : xs` and `for x in xs` spellings are accepted.
        if self.lexer.peek_is(TokenKind::Identifier) && self.lexer.peek_token().text == UniString::from("in") {
            self.lexer.skip_token();
        } else {
            self.expect_token(TokenKind::Colon)?;
        }
        let collection = self.parse_expr()?;
        self.expect_token(TokenKind::Colon)?;
        let statement = self.parse_block()?;
        let else_statement = if self.lexer.read_token_if(TokenKind::KwElse) {
            self.expect_token(TokenKind::Colon)?;
            Some(self.parse_block()?)
        } else {
            None
        };
        self.expect_token(TokenKind::KwEnd)?;
        self.expect_token(TokenKind::KwFor)?;
        self.lexer.read_token_if(TokenKind::Semicolon);
        Some(Rc::new(Node::For {
            variable,
            collection,
            statement,
            else_statement,
        }))
    }

    fn parse_catch(&mut self) -> Option<CatchClause> {
        self.expect_token(TokenKind::KwCatch)?;
        let mut type_hint = None;
        let mut variable = None;
        if !self.lexer.peek_is(TokenKind::Colon) {
            type_hint = Some(self.parse_typehint()?);
            if !self.lexer.peek_is(TokenKind::Colon) {
                let node = self.parse_expr()?;
                if !node.is_variable() {
                    self.lexer.set_error_message("'catch' requires variable");
                    return None;
                }
                variable = Some(node);
            }
        }
        self.expect_token(TokenKind::Colon)?;
        let statement = self.parse_block()?;
        Some(CatchClause {
            type_hint,
            variable,
            statement,
        })
    }

    fn parse_try(&mut self) -> Option<Rc<Node>> {
        self.expect_token(TokenKind::KwTry)?;
        self.expect_token(TokenKind::Colon)?;
        let statement = self.parse_block()?;
        let mut catches = Vec::new();
        while self.lexer.peek_is(TokenKind::KwCatch) {
            catches.push(self.parse_catch()?);
        }
        let else_statement = if self.lexer.read_token_if(TokenKind::KwElse) {
            self.expect_token(TokenKind::Colon)?;
            Some(self.parse_block()?)
        } else {
            None
        };
        let finally_statement = if self.lexer.read_token_if(TokenKind::KwFinally) {
            self.expect_token(TokenKind::Colon)?;
            Some(self.parse_block()?)
        } else {
            None
        };
        self.expect_token(TokenKind::KwEnd)?;
        self.expect_token(TokenKind::KwTry)?;
        self.lexer.read_token_if(TokenKind::Semicolon);
        if catches.is_empty() && else_statement.is_none() && finally_statement.is_none() {
            self.lexer
                .set_error_message("'try' statement requires at least one 'catch', 'else' or 'finally'");
            return None;
        }
        Some(Rc::new(Node::Try {
            statement,
            catches,
            else_statement,
            finally_statement,
        }))
    }

    fn parse_stmt(&mut self) -> Option<Rc<Node>> {
        let node = match self.lexer.peek_token().kind {
            TokenKind::Error => return None,

            TokenKind::EndOfInput => {
                self.lexer
                    .set_error_message("Unexpected end of input; Missing statement");
                return None;
            }

            TokenKind::Semicolon => {
                self.lexer.skip_token();
                return Some(Rc::new(Node::Empty));
            }

            TokenKind::KwIf => return self.parse_if(),
            TokenKind::KwWhile => return self.parse_while(),
            TokenKind::KwFor => return self.parse_for(),
            TokenKind::KwTry => return self.parse_try(),

            TokenKind::KwBreak => {
                self.lexer.skip_token();
                Rc::new(Node::Break)
            }

            TokenKind::KwContinue => {
                self.lexer.skip_token();
                Rc::new(Node::Continue)
            }

            TokenKind::KwReturn => {
                self.lexer.skip_token();
                let value = if self.lexer.peek_is(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Rc::new(Node::Return(value))
            }

            TokenKind::KwThrow => {
                self.lexer.skip_token();
                let exception = if self.lexer.peek_is(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Rc::new(Node::Throw(exception))
            }

            _ => self.parse_expr()?,
        };
        self.expect_token(TokenKind::Semicolon)?;
        Some(node)
    }

    fn parse_list(&mut self) -> Option<Rc<Node>> {
        let mut elements = Vec::new();

        if !self.lexer.read_token_if(TokenKind::RightBracket) {
            loop {
                elements.push(self.parse_expr()?);
                if self.lexer.read_token_if(TokenKind::Comma) {
                    continue;
                } else if self.lexer.read_token_if(TokenKind::RightBracket) {
                    break;
                }
                self.lexer.set_error_message("Unterminated list literal");
                return None;
            }
        }
        Some(Rc::new(Node::List(elements)))
    }

    fn parse_map(&mut self) -> Option<Rc<Node>> {
        let mut entries = Vec::new();

        if !self.lexer.read_token_if(TokenKind::RightBrace) {
            loop {
                let key = self.parse_expr()?;
                self.expect_token(TokenKind::Colon)?;
                let value = self.parse_expr()?;
                entries.push((key, value));
                if self.lexer.read_token_if(TokenKind::Comma) {
                    continue;
                } else if self.lexer.read_token_if(TokenKind::RightBrace) {
                    break;
                }
                self.lexer.set_error_message("Unterminated map literal");
                return None;
            }
        }
        Some(Rc::new(Node::Map(entries)))
    }

    fn parse_typehint(&mut self) -> Option<TypeHint> {
        let node = self.parse_postfix()?;
        let mut hint = TypeHint::Expression(node);

        if self.lexer.read_token_if(TokenKind::Conditional) {
            hint = TypeHint::Nullable(Box::new(hint));
        }
        if self.lexer.read_token_if(TokenKind::BitAnd) {
            let other = self.parse_typehint()?;
            hint = TypeHint::And(Box::new(hint), Box::new(other));
        } else if self.lexer.read_token_if(TokenKind::BitOr) {
            let other = self.parse_typehint()?;
            hint = TypeHint::Or(Box::new(hint), Box::new(other));
        }
        Some(hint)
    }

    fn parse_parameters(&mut self) -> Option<Vec<Parameter>> {
        let mut parameters = Vec::new();

        self.expect_token(TokenKind::LeftParen)?;
        if self.lexer.read_token_if(TokenKind::RightParen) {
            return Some(parameters);
        }
        loop {
            let rest = self.lexer.read_token_if(TokenKind::DotDotDot);
            let token = self.lexer.read_token();

            if token.kind != TokenKind::Identifier {
                self.lexer.set_error_message(format!(
                    "Unexpected {}; Missing identifier",
                    token.kind.what()
                ));
                return None;
            }
            let name = token.text;
            let type_hint = if self.lexer.read_token_if(TokenKind::Colon) {
                Some(self.parse_typehint()?)
            } else {
                None
            };
            let default_value = if self.lexer.read_token_if(TokenKind::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            parameters.push(Parameter {
                name,
                type_hint,
                default_value,
                rest,
            });
            if !rest && self.lexer.read_token_if(TokenKind::Comma) {
                continue;
            } else if self.lexer.read_token_if(TokenKind::RightParen) {
                return Some(parameters);
            }
            self.lexer.set_error_message("Unterminated parameter list");
            return None;
        }
    }

    fn parse_function(&mut self) -> Option<Rc<Node>> {
        let parameters = if self.lexer.peek_is(TokenKind::LeftParen) {
            self.parse_parameters()?
        } else {
            Vec::new()
        };
        let mut nodes: Vec<Rc<Node>> = Vec::new();

        if self.lexer.read_token_if(TokenKind::Arrow) {
            if self.lexer.read_token_if(TokenKind::KwThrow) {
                let exception = self.parse_expr()?;
                nodes.push(Rc::new(Node::Throw(Some(exception))));
            } else {
                let value = self.parse_expr()?;
                nodes.push(Rc::new(Node::Return(Some(value))));
            }
        } else {
            self.expect_token(TokenKind::Colon)?;
            if self.lexer.read_token_if(TokenKind::CloseTag) {
                loop {
                    if !self.parse_text_block(&mut nodes)? {
                        break;
                    }
                    if self.lexer.peek_is(TokenKind::KwEnd) {
                        break;
                    }
                    if !self.parse_script_block(&mut nodes)? {
                        break;
                    }
                }
            } else {
                while !self.lexer.peek_is(TokenKind::KwEnd) {
                    if self.lexer.peek_is(TokenKind::EndOfInput) || self.lexer.peek_is(TokenKind::Error) {
                        self.lexer
                            .set_error_message("Unexpected end of input; Missing `end function'");
                        return None;
                    }
                    nodes.push(self.parse_stmt()?);
                }
            }
            self.expect_token(TokenKind::KwEnd)?;
            self.expect_token(TokenKind::KwFunction)?;
        }
        Some(Rc::new(Node::Function {
            parameters: Rc::new(parameters),
            body: Rc::new(nodes),
        }))
    }

    fn parse_primary(&mut self) -> Option<Rc<Node>> {
        let token = self.lexer.read_token();

        match token.kind {
            TokenKind::Error => None,

            TokenKind::EndOfInput => {
                self.lexer
                    .set_error_message("Unexpected end of input; Missing expression");
                None
            }

            TokenKind::KwTrue => Some(Rc::new(Node::Value(Value::Bool(true)))),
            TokenKind::KwFalse => Some(Rc::new(Node::Value(Value::Bool(false)))),
            TokenKind::KwNull => Some(Rc::new(Node::Value(Value::Null))),

            TokenKind::Str => Some(Rc::new(Node::Value(Value::Str(token.text)))),

            TokenKind::Int => match parse_int(&token.text, 0) {
                Some(value) => Some(Rc::new(Node::Value(Value::Int(value)))),
                None => {
                    self.lexer.set_error_message("Integer overflow");
                    None
                }
            },

            TokenKind::Float => match parse_float(&token.text) {
                Some(value) => Some(Rc::new(Node::Value(Value::Float(value)))),
                None => {
                    self.lexer.set_error_message("Float overflow");
                    None
                }
            },

            TokenKind::LeftParen => {
                let node = self.parse_expr()?;
                self.expect_token(TokenKind::RightParen)?;
                Some(node)
            }

            TokenKind::LeftBracket => self.parse_list(),
            TokenKind::LeftBrace => self.parse_map(),

            TokenKind::Identifier => Some(Rc::new(Node::Identifier(token.text))),

            TokenKind::KwFunction => self.parse_function(),

            kind => {
                self.lexer
                    .set_error_message(format!("Unexpected {}; Missing expression", kind.what()));
                None
            }
        }
    }

    fn parse_args(&mut self) -> Option<Vec<Rc<Node>>> {
        let mut args = Vec::new();

        self.expect_token(TokenKind::LeftParen)?;
        if self.lexer.read_token_if(TokenKind::RightParen) {
            return Some(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.lexer.read_token_if(TokenKind::Comma) {
                continue;
            } else if self.lexer.read_token_if(TokenKind::RightParen) {
                return Some(args);
            }
            self.lexer.set_error_message("Unterminated argument list");
            return None;
        }
    }

    /// `.name`, `.name(args)` and their null-safe `?.` forms.
    fn parse_selection(&mut self, receiver: Rc<Node>, null_safe: bool) -> Option<Rc<Node>> {
        let token = self.lexer.read_token();

        if token.kind != TokenKind::Identifier {
            self.lexer.set_error_message(format!(
                "Unexpected {}; Missing identifier",
                token.kind.what()
            ));
            return None;
        }
        if self.lexer.peek_is(TokenKind::LeftParen) {
            let args = self.parse_args()?;
            Some(Rc::new(Node::Call {
                receiver,
                id: token.text,
                args,
                null_safe,
            }))
        } else {
            Some(Rc::new(Node::Attribute {
                receiver,
                id: token.text,
                null_safe,
            }))
        }
    }

    fn parse_postfix(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_primary()?;

        loop {
            match self.lexer.peek_token().kind {
                TokenKind::LeftParen => {
                    let args = self.parse_args()?;
                    node = Rc::new(Node::Call {
                        receiver: node,
                        id: UniString::from("__call__"),
                        args,
                        null_safe: false,
                    });
                }
                TokenKind::LeftBracket => {
                    self.lexer.skip_token();
                    let index = self.parse_expr()?;
                    self.expect_token(TokenKind::RightBracket)?;
                    node = Rc::new(Node::Subscript { container: node, index });
                }
                kind @ (TokenKind::Dot | TokenKind::DotConditional) => {
                    self.lexer.skip_token();
                    node = self.parse_selection(node, kind == TokenKind::DotConditional)?;
                }
                kind @ (TokenKind::Increment | TokenKind::Decrement) => {
                    self.lexer.skip_token();
                    if !node.is_variable() {
                        self.lexer.set_error_message("Node is not assignable");
                        return None;
                    }
                    node = Rc::new(Node::Postfix {
                        variable: node,
                        kind: if kind == TokenKind::Increment {
                            IncDec::Increment
                        } else {
                            IncDec::Decrement
                        },
                    });
                }
                _ => return Some(node),
            }
        }
    }

    fn parse_unary(&mut self) -> Option<Rc<Node>> {
        match self.lexer.peek_token().kind {
            kind @ (TokenKind::Add | TokenKind::Sub | TokenKind::BitNot) => {
                self.lexer.skip_token();
                let receiver = self.parse_unary()?;
                let id = match kind {
                    TokenKind::Add => "__pos__",
                    TokenKind::Sub => "__neg__",
                    _ => "__invert__",
                };
                Some(Rc::new(Node::Call {
                    receiver,
                    id: UniString::from(id),
                    args: Vec::new(),
                    null_safe: false,
                }))
            }

            TokenKind::Not => {
                self.lexer.skip_token();
                let condition = self.parse_unary()?;
                Some(Rc::new(Node::Not(condition)))
            }

            kind @ (TokenKind::Increment | TokenKind::Decrement) => {
                self.lexer.skip_token();
                let variable = self.parse_unary()?;
                if !variable.is_variable() {
                    self.lexer.set_error_message("Node is not assignable");
                    return None;
                }
                Some(Rc::new(Node::Prefix {
                    variable,
                    kind: if kind == TokenKind::Increment {
                        IncDec::Increment
                    } else {
                        IncDec::Decrement
                    },
                }))
            }

            _ => self.parse_postfix(),
        }
    }

    fn binary_call(receiver: Rc<Node>, id: &str, operand: Rc<Node>) -> Rc<Node> {
        Rc::new(Node::Call {
            receiver,
            id: UniString::from(id),
            args: vec![operand],
            null_safe: false,
        })
    }

    fn parse_multiplicative(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_unary()?;

        loop {
            let kind = self.lexer.peek_token().kind;
            let id = match kind {
                TokenKind::Mul => "__mul__",
                TokenKind::Div => "__div__",
                TokenKind::Mod => "__mod__",
                _ => return Some(node),
            };
            self.lexer.skip_token();
            let operand = self.parse_unary()?;
            node = Self::binary_call(node, id, operand);
        }
    }

    fn parse_additive(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_multiplicative()?;

        loop {
            let id = match self.lexer.peek_token().kind {
                TokenKind::Add => "__add__",
                TokenKind::Sub => "__sub__",
                _ => return Some(node),
            };
            self.lexer.skip_token();
            let operand = self.parse_multiplicative()?;
            node = Self::binary_call(node, id, operand);
        }
    }

    fn parse_shift(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_additive()?;

        loop {
            let id = match self.lexer.peek_token().kind {
                TokenKind::Lsh => "__lsh__",
                TokenKind::Rsh => "__rsh__",
                _ => return Some(node),
            };
            self.lexer.skip_token();
            let operand = self.parse_additive()?;
            node = Self::binary_call(node, id, operand);
        }
    }

    fn parse_bit_and(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_shift()?;

        while self.lexer.read_token_if(TokenKind::BitAnd) {
            let operand = self.parse_shift()?;
            node = Self::binary_call(node, "__and__", operand);
        }
        Some(node)
    }

    fn parse_bit_xor(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_bit_and()?;

        while self.lexer.read_token_if(TokenKind::BitXor) {
            let operand = self.parse_bit_and()?;
            node = Self::binary_call(node, "__xor__", operand);
        }
        Some(node)
    }

    fn parse_bit_or(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_bit_xor()?;

        while self.lexer.read_token_if(TokenKind::BitOr) {
            let operand = self.parse_bit_xor()?;
            node = Self::binary_call(node, "__or__", operand);
        }
        Some(node)
    }

    fn parse_relational(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_bit_or()?;

        loop {
            let id = match self.lexer.peek_token().kind {
                TokenKind::Lt => "__lt__",
                TokenKind::Gt => "__gt__",
                TokenKind::Lte => "__lte__",
                TokenKind::Gte => "__gte__",
                _ => return Some(node),
            };
            self.lexer.skip_token();
            let operand = self.parse_bit_or()?;
            node = Self::binary_call(node, id, operand);
        }
    }

    fn parse_equality(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_relational()?;

        loop {
            match self.lexer.peek_token().kind {
                kind @ (TokenKind::Eq | TokenKind::Match) => {
                    self.lexer.skip_token();
                    let operand = self.parse_relational()?;
                    let id = if kind == TokenKind::Eq { "__eq__" } else { "__match__" };
                    node = Self::binary_call(node, id, operand);
                }

                kind @ (TokenKind::Ne | TokenKind::NoMatch) => {
                    self.lexer.skip_token();
                    let operand = self.parse_relational()?;
                    let id = if kind == TokenKind::Ne { "__eq__" } else { "__match__" };
                    node = Rc::new(Node::Not(Self::binary_call(node, id, operand)));
                }

                TokenKind::Cmp => {
                    self.lexer.skip_token();
                    let operand = self.parse_relational()?;
                    node = Self::binary_call(node, "__cmp__", operand);
                }

                _ => return Some(node),
            }
        }
    }

    fn parse_logical_and(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_equality()?;

        while self.lexer.read_token_if(TokenKind::And) {
            let right = self.parse_equality()?;
            node = Rc::new(Node::And { left: node, right });
        }
        Some(node)
    }

    fn parse_logical_or(&mut self) -> Option<Rc<Node>> {
        let mut node = self.parse_logical_and()?;

        while self.lexer.read_token_if(TokenKind::Or) {
            let right = self.parse_logical_and()?;
            node = Rc::new(Node::Or { left: node, right });
        }
        Some(node)
    }

    fn parse_range(&mut self) -> Option<Rc<Node>> {
        let node = self.parse_logical_or()?;

        if self.lexer.peek_is(TokenKind::DotDot) || self.lexer.peek_is(TokenKind::DotDotDot) {
            let exclusive = self.lexer.read_token().kind == TokenKind::DotDotDot;
            let end = self.parse_logical_or()?;
            return Some(Rc::new(Node::Range {
                begin: node,
                end,
                exclusive,
            }));
        }
        Some(node)
    }

    fn parse_ternary(&mut self) -> Option<Rc<Node>> {
        let node = self.parse_range()?;

        if self.lexer.read_token_if(TokenKind::Conditional) {
            let then_statement = self.parse_expr()?;
            self.expect_token(TokenKind::Colon)?;
            let else_statement = self.parse_expr()?;
            return Some(Rc::new(Node::If {
                condition: node,
                then_statement,
                else_statement: Some(else_statement),
            }));
        }
        Some(node)
    }

    fn parse_expr(&mut self) -> Option<Rc<Node>> {
        let node = self.parse_ternary()?;

        let kind = self.lexer.peek_token().kind;
        match kind {
            TokenKind::Error => None,

            TokenKind::Assign => {
                self.lexer.skip_token();
                let value = self.parse_expr()?;
                if !node.is_variable() {
                    self.lexer
                        .set_error_message("Missing variable expression before `='");
                    return None;
                }
                Some(Rc::new(Node::Assign { variable: node, value }))
            }

            TokenKind::AssignAnd | TokenKind::AssignOr => {
                self.lexer.skip_token();
                let operand = self.parse_expr()?;
                if !node.is_variable() {
                    self.lexer.set_error_message(format!(
                        "Missing variable expression before {}",
                        kind.what()
                    ));
                    return None;
                }
                let value = if kind == TokenKind::AssignAnd {
                    Rc::new(Node::And {
                        left: Rc::clone(&node),
                        right: operand,
                    })
                } else {
                    Rc::new(Node::Or {
                        left: Rc::clone(&node),
                        right: operand,
                    })
                };
                Some(Rc::new(Node::Assign { variable: node, value }))
            }

            TokenKind::AssignBitAnd
            | TokenKind::AssignBitOr
            | TokenKind::AssignBitXor
            | TokenKind::AssignLsh
            | TokenKind::AssignRsh
            | TokenKind::AssignAdd
            | TokenKind::AssignSub
            | TokenKind::AssignMul
            | TokenKind::AssignDiv
            | TokenKind::AssignMod => {
                self.lexer.skip_token();
                let operand = self.parse_expr()?;
                if !node.is_variable() {
                    self.lexer.set_error_message(format!(
                        "Missing variable expression before {}",
                        kind.what()
                    ));
                    return None;
                }
                let id = match kind {
                    TokenKind::AssignBitAnd => "__and__",
                    TokenKind::AssignBitOr => "__or__",
                    TokenKind::AssignBitXor => "__xor__",
                    TokenKind::AssignLsh => "__lsh__",
                    TokenKind::AssignRsh => "__rsh__",
                    TokenKind::AssignAdd => "__add__",
                    TokenKind::AssignSub => "__sub__",
                    TokenKind::AssignMul => "__mul__",
                    TokenKind::AssignDiv => "__div__",
                    _ => "__mod__",
                };
                let value = Self::binary_call(Rc::clone(&node), id, operand);
                Some(Rc::new(Node::Assign { variable: node, value }))
            }

            _ => Some(node),
        }
    }
}

fn flush_text(text: &mut Vec<u32>, nodes: &mut Vec<Rc<Node>>) {
    if !text.is_empty() {
        nodes.push(Rc::new(Node::Text(UniString::from_runes(std::mem::take(text)))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    fn compile(source: &str) -> Result<Script, ParseError> {
        Parser::new(Box::new(MemoryStream::from(source))).compile()
    }

    fn compile_expr(source: &str) -> Result<Script, ParseError> {
        Parser::new(Box::new(MemoryStream::from(source))).compile_expression()
    }

    #[test]
    fn plain_text_is_one_node() {
        let script = compile("hello world").unwrap();
        assert_eq!(script.nodes.len(), 1);
        assert!(matches!(&*script.nodes[0], Node::Text(t) if t.to_string() == "hello world"));
    }

    #[test]
    fn template_tags() {
        let script = compile("a{{ x }}b{! y !}c{# note #}d").unwrap();
        let kinds: Vec<bool> = script
            .nodes
            .iter()
            .filter_map(|n| match &**n {
                Node::Expression { escape, .. } => Some(*escape),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![true, false]);
        // "c" and "d" around the discarded comment merge into one text node.
        assert_eq!(script.nodes.len(), 5);
    }

    #[test]
    fn escaped_brace_is_literal() {
        let script = compile(r"\{% not a tag").unwrap();
        assert!(matches!(&*script.nodes[0], Node::Text(t) if t.to_string() == "{% not a tag"));
    }

    #[test]
    fn statement_requires_semicolon() {
        let err = compile("{% x = 1 %}").unwrap_err();
        assert_eq!(err.message, "Unexpected `%}'; Missing `;'");
        assert!(compile("{% x = 1; %}").is_ok());
    }

    #[test]
    fn unterminated_expression_tag() {
        let err = compile("{{ x !}").unwrap_err();
        assert_eq!(err.message, "Unterminated expression: Missing '}}'");
        let err = compile("{! x }}").unwrap_err();
        assert_eq!(err.message, "Unterminated expression: Missing '!}'");
    }

    #[test]
    fn if_else_chain() {
        assert!(compile("{% if a: b(); else if c: d(); else: e(); end if %}").is_ok());
        assert!(compile("{% if a: b(); end while %}").is_err());
    }

    #[test]
    fn for_with_and_without_else() {
        assert!(compile("{% for x : xs : x(); end for %}").is_ok());
        assert!(compile("{% for x : xs : x(); else: y(); end for %}").is_ok());
        let err = compile("{% for 1 : xs : x(); end for %}").unwrap_err();
        assert_eq!(err.message, "'for' loop requires variable");
    }

    #[test]
    fn try_requires_some_clause() {
        let err = compile("{% try: a(); end try %}").unwrap_err();
        assert_eq!(
            err.message,
            "'try' statement requires at least one 'catch', 'else' or 'finally'"
        );
        assert!(compile("{% try: a(); finally: b(); end try %}").is_ok());
        assert!(compile("{% try: a(); catch TypeError e: b(); catch: c(); else: d(); end try %}").is_ok());
    }

    #[test]
    fn block_straddles_close_tag() {
        assert!(compile("{% for w in_ : ws : %}[{{ w }}]{% end for %}").is_err());
        assert!(compile("{% for w : ws : %}[{{ w }}]{% end for %}").is_ok());
        assert!(compile("{% for w in ws : %}[{{ w }}]{% end for %}").is_ok());
    }

    #[test]
    fn assignment_targets_must_be_variables() {
        let err = compile_expr("1 = 2").unwrap_err();
        assert_eq!(err.message, "Missing variable expression before `='");
        assert!(compile_expr("[a, b] = [1, 2]").is_ok());
        let err = compile_expr("[a, 1] = [1, 2]").unwrap_err();
        assert_eq!(err.message, "Missing variable expression before `='");
    }

    #[test]
    fn arrow_functions() {
        assert!(compile_expr("f = function(i) => i * i").is_ok());
        assert!(compile_expr("f = function(msg) => throw ValueError(msg)").is_ok());
        assert!(compile_expr("f = function(a, ...rest) : return rest; end function").is_ok());
        let err = compile_expr("f = function(...rest, a) : return 0; end function").unwrap_err();
        assert_eq!(err.message, "Unterminated parameter list");
    }

    #[test]
    fn integer_overflow_is_syntax_error() {
        let err = compile_expr("99999999999999999999").unwrap_err();
        assert_eq!(err.message, "Integer overflow");
    }

    #[test]
    fn positions_are_reported() {
        let err = compile("line one\nline two {% ? %}").unwrap_err();
        assert_eq!(err.position.line, 2);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn expression_compile_returns_last_expression() {
        assert!(compile_expr("1 + 2").is_ok());
        assert!(compile_expr("x = 1; x + 2").is_ok());
        let err = compile_expr("1 2").unwrap_err();
        assert_eq!(err.message, "Unexpected number literal; Missing `;'");
    }
}
