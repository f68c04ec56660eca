//! Script-mode tokenizer.
//!
//! Template text is scanned rune-by-rune by the parser; once a `{%`, `{{` or
//! `{!` tag opens, tokens are drawn from here. Supports one-token lookahead.

use std::collections::VecDeque;

use ahash::AHashMap;
use strum::IntoStaticStr;

use crate::{
    scanner::{Position, RuneScanner},
    stream::Stream,
    unistr::{Rune, UniString, is_digit, is_hex_digit, is_letter, is_letter_or_digit},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub(crate) enum TokenKind {
    // Punctuators
    #[strum(serialize = "`('")]
    LeftParen,
    #[strum(serialize = "`)'")]
    RightParen,
    #[strum(serialize = "`['")]
    LeftBracket,
    #[strum(serialize = "`]'")]
    RightBracket,
    #[strum(serialize = "`{'")]
    LeftBrace,
    #[strum(serialize = "`}'")]
    RightBrace,
    #[strum(serialize = "`:'")]
    Colon,
    #[strum(serialize = "`;'")]
    Semicolon,
    #[strum(serialize = "`.'")]
    Dot,
    #[strum(serialize = "`..'")]
    DotDot,
    #[strum(serialize = "`...'")]
    DotDotDot,
    #[strum(serialize = "`?.'")]
    DotConditional,
    #[strum(serialize = "`?'")]
    Conditional,
    #[strum(serialize = "`++'")]
    Increment,
    #[strum(serialize = "`--'")]
    Decrement,
    #[strum(serialize = "`=>'")]
    Arrow,

    // Assignment operators
    #[strum(serialize = "`='")]
    Assign,
    #[strum(serialize = "`&&='")]
    AssignAnd,
    #[strum(serialize = "`||='")]
    AssignOr,
    #[strum(serialize = "`&='")]
    AssignBitAnd,
    #[strum(serialize = "`|='")]
    AssignBitOr,
    #[strum(serialize = "`^='")]
    AssignBitXor,
    #[strum(serialize = "`<<='")]
    AssignLsh,
    #[strum(serialize = "`>>='")]
    AssignRsh,
    #[strum(serialize = "`+='")]
    AssignAdd,
    #[strum(serialize = "`-='")]
    AssignSub,
    #[strum(serialize = "`*='")]
    AssignMul,
    #[strum(serialize = "`/='")]
    AssignDiv,
    #[strum(serialize = "`%='")]
    AssignMod,

    // Operators
    #[strum(serialize = "`,'")]
    Comma,
    #[strum(serialize = "`&&'")]
    And,
    #[strum(serialize = "`||'")]
    Or,
    #[strum(serialize = "`&'")]
    BitAnd,
    #[strum(serialize = "`|'")]
    BitOr,
    #[strum(serialize = "`^'")]
    BitXor,
    #[strum(serialize = "`<<'")]
    Lsh,
    #[strum(serialize = "`>>'")]
    Rsh,
    #[strum(serialize = "`+'")]
    Add,
    #[strum(serialize = "`-'")]
    Sub,
    #[strum(serialize = "`*'")]
    Mul,
    #[strum(serialize = "`/'")]
    Div,
    #[strum(serialize = "`%'")]
    Mod,

    // Comparison operators
    #[strum(serialize = "`=='")]
    Eq,
    #[strum(serialize = "`!='")]
    Ne,
    #[strum(serialize = "`<'")]
    Lt,
    #[strum(serialize = "`>'")]
    Gt,
    #[strum(serialize = "`<='")]
    Lte,
    #[strum(serialize = "`>='")]
    Gte,
    #[strum(serialize = "`<=>'")]
    Cmp,
    #[strum(serialize = "`=~'")]
    Match,
    #[strum(serialize = "`!~'")]
    NoMatch,

    // Unary operators
    #[strum(serialize = "`!'")]
    Not,
    #[strum(serialize = "`~'")]
    BitNot,

    // Keywords
    #[strum(serialize = "`break'")]
    KwBreak,
    #[strum(serialize = "`catch'")]
    KwCatch,
    #[strum(serialize = "`continue'")]
    KwContinue,
    #[strum(serialize = "`do'")]
    KwDo,
    #[strum(serialize = "`else'")]
    KwElse,
    #[strum(serialize = "`end'")]
    KwEnd,
    #[strum(serialize = "`false'")]
    KwFalse,
    #[strum(serialize = "`finally'")]
    KwFinally,
    #[strum(serialize = "`for'")]
    KwFor,
    #[strum(serialize = "`function'")]
    KwFunction,
    #[strum(serialize = "`if'")]
    KwIf,
    #[strum(serialize = "`null'")]
    KwNull,
    #[strum(serialize = "`return'")]
    KwReturn,
    #[strum(serialize = "`throw'")]
    KwThrow,
    #[strum(serialize = "`true'")]
    KwTrue,
    #[strum(serialize = "`try'")]
    KwTry,
    #[strum(serialize = "`while'")]
    KwWhile,

    #[strum(serialize = "identifier")]
    Identifier,
    #[strum(serialize = "string literal")]
    Str,
    #[strum(serialize = "number literal")]
    Int,
    #[strum(serialize = "number literal")]
    Float,
    #[strum(serialize = "`%}'")]
    CloseTag,
    #[strum(serialize = "error")]
    Error,
    #[strum(serialize = "end of input")]
    EndOfInput,
}

impl TokenKind {
    /// Human readable token name used in diagnostics.
    pub fn what(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub position: Position,
    /// Identifier, number or string literal payload.
    pub text: UniString,
}

impl Token {
    fn bare(kind: TokenKind, position: Position) -> Self {
        Self {
            kind,
            position,
            text: UniString::new(),
        }
    }
}

pub(crate) struct Lexer {
    scanner: RuneScanner,
    keywords: AHashMap<&'static str, TokenKind>,
    pushback: VecDeque<Token>,
}

impl Lexer {
    pub fn new(stream: Box<dyn Stream>) -> Self {
        let keywords = AHashMap::from_iter([
            ("break", TokenKind::KwBreak),
            ("catch", TokenKind::KwCatch),
            ("continue", TokenKind::KwContinue),
            ("do", TokenKind::KwDo),
            ("else", TokenKind::KwElse),
            ("end", TokenKind::KwEnd),
            ("false", TokenKind::KwFalse),
            ("finally", TokenKind::KwFinally),
            ("for", TokenKind::KwFor),
            ("function", TokenKind::KwFunction),
            ("if", TokenKind::KwIf),
            ("null", TokenKind::KwNull),
            ("return", TokenKind::KwReturn),
            ("throw", TokenKind::KwThrow),
            ("true", TokenKind::KwTrue),
            ("try", TokenKind::KwTry),
            ("while", TokenKind::KwWhile),
        ]);
        Self {
            scanner: RuneScanner::new(stream),
            keywords,
            pushback: VecDeque::new(),
        }
    }

    // Rune-level access for the template parser.

    pub fn read_rune(&mut self) -> Option<Rune> {
        self.scanner.read_rune()
    }

    pub fn read_rune_if(&mut self, r: Rune) -> bool {
        self.scanner.read_if(r)
    }

    pub fn position(&self) -> Position {
        self.scanner.position()
    }

    pub fn error_message(&self) -> &str {
        self.scanner.error_message()
    }

    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.scanner.set_error_message(message);
    }

    pub fn close(&mut self) {
        self.scanner.close();
    }

    /// Skips a leading `#!…` shebang line, if present.
    pub fn skip_shebang(&mut self) {
        if self.scanner.read_if(0x23) {
            if self.scanner.read_if(0x21) {
                while let Some(c) = self.scanner.read_rune() {
                    if c == 0x0a || c == 0x0d {
                        return;
                    }
                }
            } else {
                self.scanner.unread(0x23);
            }
        }
    }

    // Token-level access.

    pub fn peek_token(&mut self) -> &Token {
        if self.pushback.is_empty() {
            let token = self.scan_token();
            self.pushback.push_back(token);
        }
        self.pushback.front().unwrap()
    }

    pub fn peek_is(&mut self, kind: TokenKind) -> bool {
        self.peek_token().kind == kind
    }

    pub fn read_token(&mut self) -> Token {
        if let Some(token) = self.pushback.pop_front() {
            return token;
        }
        self.scan_token()
    }

    /// Consumes the next token when it matches `expected`.
    pub fn read_token_if(&mut self, expected: TokenKind) -> bool {
        if self.peek_token().kind == expected {
            self.pushback.pop_front();
            return true;
        }
        false
    }

    pub fn skip_token(&mut self) {
        if self.pushback.pop_front().is_none() {
            self.scan_token();
        }
    }

    fn scan_token(&mut self) -> Token {
        loop {
            let position = self.scanner.position();
            let Some(c) = self.scanner.read_rune() else {
                return Token::bare(TokenKind::EndOfInput, position);
            };
            let kind = match c {
                // End of input markers (EOT, SUB).
                0x04 | 0x1a => TokenKind::EndOfInput,

                // Whitespace.
                0x20 | 0x09 | 0x0d | 0x0a | 0x0c => continue,

                0xfffd => {
                    self.scanner.set_error_message("Malformed UTF-8 input");
                    TokenKind::Error
                }

                // Single line comment.
                0x23 => {
                    loop {
                        match self.scanner.read_rune() {
                            None => return Token::bare(TokenKind::EndOfInput, position),
                            Some(0x0a | 0x0d) => break,
                            Some(_) => {}
                        }
                    }
                    continue;
                }

                0x28 => TokenKind::LeftParen,
                0x29 => TokenKind::RightParen,
                0x5b => TokenKind::LeftBracket,
                0x5d => TokenKind::RightBracket,
                0x7b => TokenKind::LeftBrace,
                0x7d => TokenKind::RightBrace,
                0x3a => TokenKind::Colon,
                0x3b => TokenKind::Semicolon,
                0x2c => TokenKind::Comma,
                0x7e => TokenKind::BitNot,

                0x2b => {
                    if self.scanner.read_if(0x2b) {
                        TokenKind::Increment
                    } else if self.scanner.read_if(0x3d) {
                        TokenKind::AssignAdd
                    } else {
                        TokenKind::Add
                    }
                }

                0x2d => {
                    if self.scanner.read_if(0x2d) {
                        TokenKind::Decrement
                    } else if self.scanner.read_if(0x3d) {
                        TokenKind::AssignSub
                    } else {
                        TokenKind::Sub
                    }
                }

                0x2a => {
                    if self.scanner.read_if(0x3d) {
                        TokenKind::AssignMul
                    } else {
                        TokenKind::Mul
                    }
                }

                0x25 => {
                    if self.scanner.read_if(0x3d) {
                        TokenKind::AssignMod
                    } else if self.scanner.read_if(0x7d) {
                        // Eat a possible new line following the close tag.
                        self.scanner.read_if(0x0d);
                        self.scanner.read_if(0x0a);
                        TokenKind::CloseTag
                    } else {
                        TokenKind::Mod
                    }
                }

                0x2f => {
                    if self.scanner.read_if(0x2f) {
                        loop {
                            match self.scanner.read_rune() {
                                None => return Token::bare(TokenKind::EndOfInput, position),
                                Some(0x0a | 0x0d) => break,
                                Some(_) => {}
                            }
                        }
                        continue;
                    } else if self.scanner.read_if(0x2a) {
                        if let Some(token) = self.skip_multiline_comment(position) {
                            return token;
                        }
                        continue;
                    } else if self.scanner.read_if(0x3d) {
                        TokenKind::AssignDiv
                    } else {
                        TokenKind::Div
                    }
                }

                0x26 => {
                    if self.scanner.read_if(0x26) {
                        if self.scanner.read_if(0x3d) {
                            TokenKind::AssignAnd
                        } else {
                            TokenKind::And
                        }
                    } else if self.scanner.read_if(0x3d) {
                        TokenKind::AssignBitAnd
                    } else {
                        TokenKind::BitAnd
                    }
                }

                0x7c => {
                    if self.scanner.read_if(0x7c) {
                        if self.scanner.read_if(0x3d) {
                            TokenKind::AssignOr
                        } else {
                            TokenKind::Or
                        }
                    } else if self.scanner.read_if(0x3d) {
                        TokenKind::AssignBitOr
                    } else {
                        TokenKind::BitOr
                    }
                }

                0x5e => {
                    if self.scanner.read_if(0x3d) {
                        TokenKind::AssignBitXor
                    } else {
                        TokenKind::BitXor
                    }
                }

                0x3c => {
                    if self.scanner.read_if(0x3c) {
                        if self.scanner.read_if(0x3d) {
                            TokenKind::AssignLsh
                        } else {
                            TokenKind::Lsh
                        }
                    } else if self.scanner.read_if(0x3d) {
                        if self.scanner.read_if(0x3e) {
                            TokenKind::Cmp
                        } else {
                            TokenKind::Lte
                        }
                    } else {
                        TokenKind::Lt
                    }
                }

                0x3e => {
                    if self.scanner.read_if(0x3e) {
                        if self.scanner.read_if(0x3d) {
                            TokenKind::AssignRsh
                        } else {
                            TokenKind::Rsh
                        }
                    } else if self.scanner.read_if(0x3d) {
                        TokenKind::Gte
                    } else {
                        TokenKind::Gt
                    }
                }

                0x21 => {
                    if self.scanner.read_if(0x3d) {
                        TokenKind::Ne
                    } else if self.scanner.read_if(0x7e) {
                        TokenKind::NoMatch
                    } else {
                        TokenKind::Not
                    }
                }

                0x3d => {
                    if self.scanner.read_if(0x3d) {
                        TokenKind::Eq
                    } else if self.scanner.read_if(0x7e) {
                        TokenKind::Match
                    } else if self.scanner.read_if(0x3e) {
                        TokenKind::Arrow
                    } else {
                        TokenKind::Assign
                    }
                }

                0x2e => {
                    if self.scanner.read_if(0x2e) {
                        if self.scanner.read_if(0x2e) {
                            TokenKind::DotDotDot
                        } else {
                            TokenKind::DotDot
                        }
                    } else {
                        TokenKind::Dot
                    }
                }

                0x3f => {
                    if self.scanner.read_if(0x2e) {
                        TokenKind::DotConditional
                    } else {
                        TokenKind::Conditional
                    }
                }

                0x27 | 0x22 => return self.scan_string(c, position),

                0x30 => return self.scan_zero(position),

                0x31..=0x39 => return self.scan_number(c, position),

                _ => {
                    if c == 0x5f || is_letter(c) {
                        return self.scan_identifier(c, position);
                    }
                    self.scanner.set_error_message("Unexpected input");
                    TokenKind::Error
                }
            };
            return Token::bare(kind, position);
        }
    }

    /// Consumes a `/* … */` comment, honoring nesting. Returns an error
    /// token when the comment never terminates.
    fn skip_multiline_comment(&mut self, position: Position) -> Option<Token> {
        let mut depth = 1u32;
        loop {
            match self.scanner.read_rune() {
                None => {
                    self.scanner.set_error_message(format!(
                        "Unterminated multi-line comment at {}; Missing `*/'",
                        position.line
                    ));
                    return Some(Token::bare(TokenKind::Error, position));
                }
                Some(0x2a) => {
                    if self.scanner.read_if(0x2f) {
                        depth -= 1;
                        if depth == 0 {
                            return None;
                        }
                    }
                }
                Some(0x2f) => {
                    if self.scanner.read_if(0x2a) {
                        depth += 1;
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn scan_string(&mut self, separator: Rune, position: Position) -> Token {
        let mut buffer: Vec<Rune> = Vec::new();
        loop {
            let Some(c) = self.scanner.read_rune() else {
                let quote = char::from_u32(separator).unwrap_or('\'');
                self.scanner.set_error_message(format!(
                    "Unterminated string literal at {}; missing `{}'",
                    position.line, quote
                ));
                return Token::bare(TokenKind::Error, position);
            };
            if c == separator {
                break;
            } else if c == 0x5c {
                if !self.scan_escape_sequence(&mut buffer) {
                    return Token::bare(TokenKind::Error, position);
                }
            } else {
                buffer.push(c);
            }
        }
        Token {
            kind: TokenKind::Str,
            position,
            text: UniString::from_runes(buffer),
        }
    }

    fn scan_escape_sequence(&mut self, buffer: &mut Vec<Rune>) -> bool {
        let Some(r) = self.scanner.read_rune() else {
            self.scanner.set_error_message("Malformed escape sequence");
            return false;
        };
        match r {
            0x5c | 0x22 | 0x27 => buffer.push(r),

            // Escaped new lines are line continuations and emit nothing.
            0x0a => {}
            0x0d => {
                self.scanner.read_if(0x0a);
            }

            0x61 => buffer.push(0x07), // bell
            0x62 => buffer.push(0x08), // backspace
            0x66 => buffer.push(0x0c), // formfeed
            0x6e => buffer.push(0x0a),
            0x72 => buffer.push(0x0d),
            0x74 => buffer.push(0x09),
            0x76 => buffer.push(0x0b), // vertical tab

            0x75 => {
                let mut result: Rune = 0;
                for _ in 0..4 {
                    let Some(digit) = self.scanner.read_rune().filter(|&d| is_hex_digit(d)) else {
                        self.scanner.set_error_message("Malformed escape sequence");
                        return false;
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

            _ => {
                self.scanner.set_error_message("Malformed escape sequence");
                return false;
            }
        }
        true
    }

    /// Scans a numeric literal starting with `0`: radix prefixes, bare octal,
    /// or a plain zero with optional fraction/exponent/`f` suffix.
    fn scan_zero(&mut self, position: Position) -> Token {
        let mut buffer: Vec<Rune> = vec![0x30];
        match self.scanner.read_rune() {
            Some(0x62 | 0x42) => {
                buffer.push(0x62);
                while self.scanner.peek_is(0x5f) || self.scanner.peek_rune().is_some_and(is_digit) {
                    let d = self.scanner.read_rune().unwrap();
                    if d == 0x5f {
                        continue;
                    } else if d != 0x30 && d != 0x31 {
                        self.scanner
                            .set_error_message(format!("Invalid binary digit: {}", rune_display(d)));
                        return Token::bare(TokenKind::Error, position);
                    }
                    buffer.push(d);
                }
                self.literal(TokenKind::Int, buffer, position)
            }

            Some(0x78 | 0x58) => {
                buffer.push(0x78);
                while self.scanner.peek_is(0x5f) || self.scanner.peek_rune().is_some_and(is_hex_digit) {
                    let d = self.scanner.read_rune().unwrap();
                    if d != 0x5f {
                        buffer.push(d);
                    }
                }
                self.literal(TokenKind::Int, buffer, position)
            }

            Some(c @ (0x6f | 0x4f | 0x30..=0x37)) => {
                buffer.push(c);
                while self.scanner.peek_is(0x5f) || self.scanner.peek_rune().is_some_and(is_digit) {
                    let d = self.scanner.read_rune().unwrap();
                    if d == 0x5f {
                        continue;
                    } else if d > 0x37 {
                        self.scanner
                            .set_error_message(format!("Invalid octal digit: {}", rune_display(d)));
                        return Token::bare(TokenKind::Error, position);
                    }
                    buffer.push(d);
                }
                self.literal(TokenKind::Int, buffer, position)
            }

            Some(c @ (0x38 | 0x39)) => {
                self.scanner
                    .set_error_message(format!("Invalid octal digit: {}", rune_display(c)));
                Token::bare(TokenKind::Error, position)
            }

            Some(0x65 | 0x45) => self.scan_exponent(buffer, position),

            Some(0x2e) => self.scan_fraction(buffer, position),

            Some(0x66 | 0x46) => self.literal(TokenKind::Float, buffer, position),

            Some(other) => {
                self.scanner.unread(other);
                self.literal(TokenKind::Int, buffer, position)
            }
            None => self.literal(TokenKind::Int, buffer, position),
        }
    }

    fn scan_number(&mut self, first: Rune, position: Position) -> Token {
        let mut buffer: Vec<Rune> = vec![first];
        while self.scanner.peek_is(0x5f) || self.scanner.peek_rune().is_some_and(is_digit) {
            let d = self.scanner.read_rune().unwrap();
            if d != 0x5f {
                buffer.push(d);
            }
        }
        if self.scanner.peek_is(0x2e) {
            self.scanner.skip_rune();
            self.scan_fraction(buffer, position)
        } else if self.scanner.read_if(0x65) || self.scanner.read_if(0x45) {
            self.scan_exponent(buffer, position)
        } else {
            if self.scanner.read_if(0x66) || self.scanner.read_if(0x46) {
                return self.literal(TokenKind::Float, buffer, position);
            }
            self.literal(TokenKind::Int, buffer, position)
        }
    }

    /// Continues after a consumed `.`; when no digit follows, the dot is
    /// pushed back and the integer part stands alone.
    fn scan_fraction(&mut self, mut buffer: Vec<Rune>, position: Position) -> Token {
        if self.scanner.peek_rune().is_some_and(is_digit) {
            buffer.push(0x2e);
            buffer.push(self.scanner.read_rune().unwrap());
            while self.scanner.peek_is(0x5f) || self.scanner.peek_rune().is_some_and(is_digit) {
                let d = self.scanner.read_rune().unwrap();
                if d != 0x5f {
                    buffer.push(d);
                }
            }
            if self.scanner.read_if(0x65) || self.scanner.read_if(0x45) {
                return self.scan_exponent(buffer, position);
            }
            self.literal(TokenKind::Float, buffer, position)
        } else {
            self.scanner.unread(0x2e);
            self.literal(TokenKind::Int, buffer, position)
        }
    }

    fn scan_exponent(&mut self, mut buffer: Vec<Rune>, position: Position) -> Token {
        buffer.push(0x65);
        if self.scanner.peek_is(0x2b) || self.scanner.peek_is(0x2d) {
            buffer.push(self.scanner.read_rune().unwrap());
            match self.scanner.read_rune() {
                Some(d) if is_digit(d) => buffer.push(d),
                _ => {
                    self.scanner.set_error_message("Invalid exponent");
                    return Token::bare(TokenKind::Error, position);
                }
            }
        } else if self.scanner.peek_rune().is_some_and(is_digit) {
            buffer.push(self.scanner.read_rune().unwrap());
        } else {
            self.scanner.set_error_message("Invalid exponent");
            return Token::bare(TokenKind::Error, position);
        }
        while self.scanner.peek_rune().is_some_and(is_digit) {
            buffer.push(self.scanner.read_rune().unwrap());
        }
        self.literal(TokenKind::Float, buffer, position)
    }

    fn scan_identifier(&mut self, first: Rune, position: Position) -> Token {
        let mut name = String::new();
        name.push(char::from_u32(first).unwrap_or('_'));
        loop {
            match self.scanner.read_rune() {
                Some(c) if c == 0x5f || is_letter_or_digit(c) => {
                    name.push(char::from_u32(c).unwrap_or('_'));
                }
                Some(c) => {
                    self.scanner.unread(c);
                    break;
                }
                None => break,
            }
        }
        if let Some(&kind) = self.keywords.get(name.as_str()) {
            return Token::bare(kind, position);
        }
        Token {
            kind: TokenKind::Identifier,
            position,
            text: UniString::from(name),
        }
    }

    fn literal(&self, kind: TokenKind, buffer: Vec<Rune>, position: Position) -> Token {
        Token {
            kind,
            position,
            text: UniString::from_runes(buffer),
        }
    }
}

fn rune_display(r: Rune) -> char {
    char::from_u32(r).unwrap_or('\u{fffd}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    fn lex(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(Box::new(MemoryStream::from(source)));
        let mut kinds = Vec::new();
        loop {
            let token = lexer.read_token();
            let kind = token.kind;
            kinds.push(kind);
            if kind == TokenKind::EndOfInput || kind == TokenKind::Error {
                return kinds;
            }
        }
    }

    #[test]
    fn punctuation_and_operators() {
        assert_eq!(
            lex("?. ?. ++ -- => <=> =~ !~ .. ... <<= ||="),
            vec![
                TokenKind::DotConditional,
                TokenKind::DotConditional,
                TokenKind::Increment,
                TokenKind::Decrement,
                TokenKind::Arrow,
                TokenKind::Cmp,
                TokenKind::Match,
                TokenKind::NoMatch,
                TokenKind::DotDot,
                TokenKind::DotDotDot,
                TokenKind::AssignLsh,
                TokenKind::AssignOr,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            lex("while foo _bar break"),
            vec![
                TokenKind::KwWhile,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::KwBreak,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        let mut lexer = Lexer::new(Box::new(MemoryStream::from("0x1F 0b1_0 017 1_000 3.25 1e3 2.5e-1 4f 0")));
        let expected = [
            (TokenKind::Int, "0x1F"),
            (TokenKind::Int, "0b10"),
            (TokenKind::Int, "017"),
            (TokenKind::Int, "1000"),
            (TokenKind::Float, "3.25"),
            (TokenKind::Float, "1e3"),
            (TokenKind::Float, "2.5e-1"),
            (TokenKind::Float, "4"),
            (TokenKind::Int, "0"),
        ];
        for (kind, text) in expected {
            let token = lexer.read_token();
            assert_eq!(token.kind, kind, "{text}");
            assert_eq!(token.text.to_string(), text);
        }
        assert_eq!(lexer.read_token().kind, TokenKind::EndOfInput);
    }

    #[test]
    fn invalid_digits_are_errors() {
        let mut lexer = Lexer::new(Box::new(MemoryStream::from("0b12")));
        assert_eq!(lexer.read_token().kind, TokenKind::Error);
        assert_eq!(lexer.error_message(), "Invalid binary digit: 2");

        let mut lexer = Lexer::new(Box::new(MemoryStream::from("09")));
        assert_eq!(lexer.read_token().kind, TokenKind::Error);
        assert_eq!(lexer.error_message(), "Invalid octal digit: 9");
    }

    #[test]
    fn string_escapes() {
        let mut lexer = Lexer::new(Box::new(MemoryStream::from(r#""a\n\tA\\" 'it''s'"#)));
        let token = lexer.read_token();
        assert_eq!(token.kind, TokenKind::Str);
        assert_eq!(token.text.to_string(), "a\n\tA\\");
        assert_eq!(lexer.read_token().text.to_string(), "it");
        assert_eq!(lexer.read_token().text.to_string(), "s");
    }

    #[test]
    fn unterminated_string_reports_line() {
        let mut lexer = Lexer::new(Box::new(MemoryStream::from("\n'oops")));
        assert_eq!(lexer.read_token().kind, TokenKind::Error);
        assert_eq!(lexer.error_message(), "Unterminated string literal at 2; missing `''");
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            lex("1 // line\n/* multi /* nested */ */ 2 # rest\n3"),
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::EndOfInput,
            ]
        );
        let mut lexer = Lexer::new(Box::new(MemoryStream::from("/* open")));
        assert_eq!(lexer.read_token().kind, TokenKind::Error);
        assert!(lexer.error_message().starts_with("Unterminated multi-line comment"));
    }

    #[test]
    fn close_tag_eats_one_newline() {
        let mut lexer = Lexer::new(Box::new(MemoryStream::from("%}\nx")));
        assert_eq!(lexer.read_token().kind, TokenKind::CloseTag);
        assert_eq!(lexer.read_rune(), Some(0x78));
    }

    #[test]
    fn token_spellings_round_trip() {
        // Re-spelling the token stream reproduces canonically written source
        // up to whitespace and comments.
        let source = "x = a.b?.c(1, 2.5) + y[0] <=> z && !w || p ++ ;";
        let mut lexer = Lexer::new(Box::new(MemoryStream::from(source)));
        let mut rebuilt = String::new();
        loop {
            let token = lexer.read_token();
            if token.kind == TokenKind::EndOfInput {
                break;
            }
            let spelled = match token.kind {
                TokenKind::Identifier | TokenKind::Int | TokenKind::Float => token.text.to_string(),
                kind => {
                    let name = kind.what();
                    name.trim_start_matches('`').trim_end_matches('\'').to_owned()
                }
            };
            rebuilt.push_str(&spelled);
            rebuilt.push(' ');
        }
        let normalize = |s: &str| s.split_whitespace().collect::<String>();
        assert_eq!(normalize(&rebuilt), normalize(source));
    }

    #[test]
    fn one_token_lookahead() {
        let mut lexer = Lexer::new(Box::new(MemoryStream::from("a b")));
        assert_eq!(lexer.peek_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.peek_token().text.to_string(), "a");
        assert_eq!(lexer.read_token().text.to_string(), "a");
        assert!(lexer.read_token_if(TokenKind::Identifier));
        assert_eq!(lexer.read_token().kind, TokenKind::EndOfInput);
    }
}
