//! File objects wrapping an operating system stream.

use std::path::PathBuf;

use crate::{
    stream::{FileStream, Stream},
    types::AttrMap,
};

#[derive(Debug)]
pub(crate) struct FileObj {
    pub path: PathBuf,
    pub stream: Option<FileStream>,
    pub attributes: AttrMap,
}

impl FileObj {
    pub fn new(path: PathBuf, stream: FileStream) -> Self {
        Self {
            path,
            stream: Some(stream),
            attributes: AttrMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.as_ref().is_some_and(|stream| stream.is_open())
    }

    pub fn close(&mut self) {
        self.stream = None;
    }
}
