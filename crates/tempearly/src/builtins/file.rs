//! Methods of the `File` class.

use std::path::PathBuf;

use crate::{
    bytestring::ByteString,
    heap::{HeapData, HeapId},
    interp::{Interpreter, Raised},
    object,
    stream::{FileStream, Stream},
    types::{Allocator, FileObj},
    value::Value,
};

fn file_receiver(args: &[Value]) -> HeapId {
    args[0].as_ref_id().expect("receiver checked by method dispatch")
}

/// File.open(path, mode = "r") => File
///
/// Opens a file for reading (`"r"`), writing (`"w"`) or appending (`"a"`).
///
/// Throws: IOError - If the file cannot be opened.
fn file_s_open(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let path = object::as_string(interp, &args[0])?;
    let mode = match args.get(1) {
        None => "r".to_owned(),
        Some(value) => object::as_string(interp, value)?.to_string(),
    };
    let path = PathBuf::from(path.to_string());
    let stream = match mode.as_str() {
        "r" => FileStream::open_read(&path),
        "w" => FileStream::open_write(&path),
        "a" => FileStream::open_append(&path),
        _ => {
            let value_error = interp.registry.value_error;
            return Err(interp.throw(value_error, format!("Unsupported file mode '{mode}'")));
        }
    };
    match stream {
        Ok(stream) => {
            let file = FileObj::new(path, stream);
            let id = interp.heap.allocate(HeapData::File(file));
            Ok(Value::Ref(id))
        }
        Err(_) => {
            let io_error = interp.registry.io_error;
            Err(interp.throw(io_error, format!("Unable to open file '{}'", path.display())))
        }
    }
}

fn read_all(interp: &mut Interpreter, id: HeapId) -> Result<Vec<u8>, Raised> {
    let readable = match interp.heap.get(id) {
        HeapData::File(file) => file.stream.as_ref().is_some_and(|stream| stream.is_readable()),
        _ => false,
    };
    if !readable {
        let io_error = interp.registry.io_error;
        return Err(interp.throw(io_error, "File is not open for reading"));
    }
    let mut contents = Vec::new();
    let mut buffer = [0u8; 4096];
    loop {
        let read = {
            let file = interp.heap.file_mut(id);
            file.stream.as_mut().and_then(|stream| stream.read(&mut buffer))
        };
        match read {
            Some(0) => return Ok(contents),
            Some(n) => contents.extend_from_slice(&buffer[..n]),
            None => {
                let io_error = interp.registry.io_error;
                return Err(interp.throw(io_error, "Read failed"));
            }
        }
    }
}

/// File#read() => String
///
/// Remaining contents of the file decoded as UTF-8.
///
/// Throws: IOError - If the file is not open for reading.
fn file_read(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let bytes = read_all(interp, file_receiver(args))?;
    Ok(Value::Str(ByteString::from_bytes(bytes).decode()))
}

/// File#read_bytes() => Binary
///
/// Remaining contents of the file as raw bytes.
fn file_read_bytes(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let bytes = read_all(interp, file_receiver(args))?;
    Ok(Value::Binary(ByteString::from_bytes(bytes)))
}

/// File#write(value...) => self
///
/// Writes the stringified values, or raw bytes for Binary arguments.
///
/// Throws: IOError - If the file is not open for writing.
fn file_write(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = file_receiver(args);
    for value in &args[1..] {
        let bytes = match value {
            Value::Binary(bytes) => bytes.as_bytes().to_vec(),
            other => object::to_string(interp, other)?.encode(),
        };
        let file = interp.heap.file_mut(id);
        let written = file
            .stream
            .as_mut()
            .filter(|stream| stream.is_writable())
            .is_some_and(|stream| stream.write(&bytes));
        if !written {
            let io_error = interp.registry.io_error;
            return Err(interp.throw(io_error, "File is not open for writing"));
        }
    }
    Ok(args[0].clone())
}

/// File#close()
fn file_close(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    interp.heap.file_mut(file_receiver(args)).close();
    Ok(Value::Null)
}

/// File#is_open() => Bool
fn file_is_open(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    let id = file_receiver(args);
    Ok(Value::Bool(match interp.heap.get(id) {
        HeapData::File(file) => file.is_open(),
        _ => false,
    }))
}

/// File#__bool__() => Bool
fn file_bool(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Raised> {
    file_is_open(interp, args)
}

pub(crate) fn init(i: &mut Interpreter) {
    let file = i.registry.file;

    i.set_allocator(file, Allocator::None);

    i.add_static_method(file, "open", -2, file_s_open);

    i.add_method(file, "read", 0, file_read);
    i.add_method(file, "read_bytes", 0, file_read_bytes);
    i.add_method(file, "write", -1, file_write);
    i.add_method(file, "close", 0, file_close);
    i.add_method(file, "is_open", 0, file_is_open);

    // Conversion methods
    i.add_method(file, "__bool__", 0, file_bool);
}
