//! Host interface: the narrow contracts through which the core sees the
//! gateway it runs under.

use std::{
    cell::RefCell,
    io::Write,
    rc::Rc,
};

use crate::bytestring::ByteString;

/// The incoming HTTP request, as the `request` global sees it.
pub trait Request {
    fn method(&self) -> &str;

    fn path(&self) -> &str;

    fn content_type(&self) -> Option<String>;

    fn is_secure(&self) -> bool;

    fn is_ajax(&self) -> bool;

    fn body(&self) -> Option<ByteString>;

    /// All values submitted under the given GET/POST parameter name.
    fn parameters(&self, name: &str) -> Option<Vec<String>>;
}

/// The outgoing response: a byte sink plus status and header manipulation.
pub trait Response {
    fn write(&mut self, data: &[u8]) -> bool;

    fn set_status(&mut self, status: u16);

    fn set_header(&mut self, name: &str, value: &str);

    fn add_header(&mut self, name: &str, value: &str);
}

/// A request with no method, path or parameters; used by the REPL and tests.
#[derive(Debug, Default)]
pub struct NullRequest;

impl Request for NullRequest {
    fn method(&self) -> &str {
        "GET"
    }

    fn path(&self) -> &str {
        "/"
    }

    fn content_type(&self) -> Option<String> {
        None
    }

    fn is_secure(&self) -> bool {
        false
    }

    fn is_ajax(&self) -> bool {
        false
    }

    fn body(&self) -> Option<ByteString> {
        None
    }

    fn parameters(&self, _name: &str) -> Option<Vec<String>> {
        None
    }
}

/// Shared view of a [`BufferResponse`]'s accumulated output.
#[derive(Debug, Clone)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Response that accumulates everything in memory.
#[derive(Debug)]
pub struct BufferResponse {
    buffer: Rc<RefCell<Vec<u8>>>,
    status: u16,
    headers: Vec<(String, String)>,
}

impl BufferResponse {
    pub fn new() -> Self {
        Self {
            buffer: Rc::new(RefCell::new(Vec::new())),
            status: 200,
            headers: vec![("Content-Type".to_owned(), "text/html; charset=utf-8".to_owned())],
        }
    }

    pub fn buffer(&self) -> SharedBuffer {
        SharedBuffer(Rc::clone(&self.buffer))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl Default for BufferResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl Response for BufferResponse {
    fn write(&mut self, data: &[u8]) -> bool {
        self.buffer.borrow_mut().extend_from_slice(data);
        true
    }

    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            entry.1 = value.to_owned();
        } else {
            self.headers.push((name.to_owned(), value.to_owned()));
        }
    }

    fn add_header(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            entry.1 = format!("{}, {}", entry.1, value);
        } else {
            self.headers.push((name.to_owned(), value.to_owned()));
        }
    }
}

/// Response that writes straight through to standard output; status and
/// headers are discarded. Used by the REPL and the file runner.
#[derive(Debug, Default)]
pub struct StdoutResponse;

impl Response for StdoutResponse {
    fn write(&mut self, data: &[u8]) -> bool {
        std::io::stdout().write_all(data).is_ok()
    }

    fn set_status(&mut self, _status: u16) {}

    fn set_header(&mut self, _name: &str, _value: &str) {}

    fn add_header(&mut self, _name: &str, _value: &str) {}
}
