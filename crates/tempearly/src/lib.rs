//! Tempearly is a small dynamically-typed scripting language embedded in
//! HTML-like templates: text is emitted literally, while `{% … %}`,
//! `{{ … }}`, `{! … !}` and `{# … #}` fragments execute script, interpolate
//! escaped or raw expressions, or hold comments.
//!
//! The crate hosts the language core: the two-mode lexer, the recursive
//! descent parser, the class-based object model with magic-method dispatch
//! and the tree-walking evaluator. Gateways (CGI, HTTP, REPL) live outside;
//! they talk to the core through [`Request`], [`Response`] and the
//! [`Interpreter`] entry points.
//!
//! ```
//! use tempearly::{BufferResponse, Interpreter, NullRequest};
//!
//! let response = BufferResponse::new();
//! let output = response.buffer();
//! let mut interp = Interpreter::new(Box::new(NullRequest), Box::new(response));
//! interp.set_global("name", tempearly::HostValue::Str("world".to_owned()));
//! interp.execute_template("hello {{ name }}!").unwrap();
//! assert_eq!(output.to_string_lossy(), "hello world!");
//! ```
#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing is checked at call sites")]
#![expect(clippy::cast_sign_loss, reason = "sign-changing casts are intentional")]
#![expect(clippy::cast_possible_wrap, reason = "hash and identity values wrap by design")]
#![expect(clippy::unnecessary_wraps, reason = "native callback signatures are uniform")]

mod ast;
mod builtins;
mod bytestring;
mod eval;
mod exception;
mod heap;
mod host;
mod interp;
mod json;
mod lexer;
mod object;
mod parser;
mod scanner;
mod stream;
mod types;
mod unistr;
mod value;

pub use crate::{
    exception::Exception,
    host::{BufferResponse, NullRequest, Request, Response, SharedBuffer, StdoutResponse},
    interp::{HostValue, Interpreter},
    parser::ParseError,
    scanner::Position,
    stream::{FileStream, MemoryStream, ReadStatus, Stream},
};
