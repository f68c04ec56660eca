//! Rune-level scanner shared by the template/script lexer and the JSON
//! parser: pushback, source position tracking and an error-message slot.

use std::collections::VecDeque;

use crate::{
    stream::{ReadStatus, Stream},
    unistr::{Rune, is_space},
};

/// Line/column position in source text. Lines start at 1, columns at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 0 }
    }
}

pub struct RuneScanner {
    stream: Option<Box<dyn Stream>>,
    pushback: VecDeque<Rune>,
    position: Position,
    seen_cr: bool,
    error_message: String,
}

impl RuneScanner {
    pub fn new(stream: Box<dyn Stream>) -> Self {
        Self {
            stream: Some(stream),
            pushback: VecDeque::new(),
            position: Position::default(),
            seen_cr: false,
            error_message: String::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.error_message = message.into();
    }

    pub fn close(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.close();
        }
        self.stream = None;
    }

    /// Returns the next rune without consuming it, or `None` at end of input.
    pub fn peek_rune(&mut self) -> Option<Rune> {
        if self.pushback.is_empty() {
            let r = self.read_rune()?;
            self.pushback.push_back(r);
            return Some(r);
        }
        self.pushback.front().copied()
    }

    pub fn peek_is(&mut self, r: Rune) -> bool {
        self.peek_rune() == Some(r)
    }

    /// Reads the next rune, updating the source position. A CR, LF or CRLF
    /// pair each advance the line counter exactly once.
    pub fn read_rune(&mut self) -> Option<Rune> {
        if let Some(r) = self.pushback.pop_front() {
            return Some(r);
        }
        let stream = self.stream.as_mut()?;
        let (rune, status) = stream.read_rune();
        if status == ReadStatus::EndOfInput {
            self.close();
            return None;
        }
        match rune {
            0x0d => {
                self.position.line += 1;
                self.position.column = 0;
                self.seen_cr = true;
            }
            0x0a => {
                if self.seen_cr {
                    self.seen_cr = false;
                } else {
                    self.position.line += 1;
                    self.position.column = 0;
                }
            }
            _ => {
                self.position.column += 1;
                self.seen_cr = false;
            }
        }
        Some(rune)
    }

    /// Consumes the next rune when it matches `expected`.
    pub fn read_if(&mut self, expected: Rune) -> bool {
        match self.read_rune() {
            Some(r) if r == expected => true,
            Some(r) => {
                self.pushback.push_back(r);
                false
            }
            None => false,
        }
    }

    pub fn unread(&mut self, r: Rune) {
        self.pushback.push_back(r);
    }

    pub fn skip_rune(&mut self) {
        if self.pushback.pop_front().is_none() {
            self.read_rune();
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(r) = self.peek_rune() {
            if is_space(r) {
                self.skip_rune();
            } else {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    #[test]
    fn tracks_positions_across_newline_styles() {
        let mut scanner = RuneScanner::new(Box::new(MemoryStream::from("a\nb\r\nc\rd")));
        assert_eq!(scanner.read_rune(), Some(0x61));
        assert_eq!(scanner.position(), Position { line: 1, column: 1 });
        scanner.read_rune(); // \n
        assert_eq!(scanner.position().line, 2);
        scanner.read_rune(); // b
        scanner.read_rune(); // \r
        scanner.read_rune(); // \n of the CRLF pair
        assert_eq!(scanner.position().line, 3);
        scanner.read_rune(); // c
        scanner.read_rune(); // \r
        assert_eq!(scanner.position().line, 4);
        assert_eq!(scanner.read_rune(), Some(0x64));
        assert_eq!(scanner.read_rune(), None);
    }

    #[test]
    fn pushback_is_first_in_first_out() {
        let mut scanner = RuneScanner::new(Box::new(MemoryStream::from("xyz")));
        assert!(scanner.read_if(0x78));
        assert!(!scanner.read_if(0x7a)); // 'y' pushed back
        assert_eq!(scanner.peek_rune(), Some(0x79));
        assert_eq!(scanner.read_rune(), Some(0x79));
    }
}
