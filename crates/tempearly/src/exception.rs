//! Host-facing exception type.

use std::fmt;

use crate::{parser::ParseError, scanner::Position};

/// An exception that escaped to the host: the exception class name, the
/// message and a back-trace of function names, innermost first.
#[derive(Debug, Clone)]
pub struct Exception {
    pub class_name: String,
    pub message: String,
    pub traceback: Vec<String>,
    /// Source position, for syntax errors surfaced by the parser.
    pub position: Option<Position>,
}

impl Exception {
    pub(crate) fn from_parse_error(error: ParseError) -> Self {
        Self {
            class_name: "SyntaxError".to_owned(),
            message: error.message,
            traceback: Vec::new(),
            position: Some(error.position),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class_name, self.message)
    }
}

impl std::error::Error for Exception {}
