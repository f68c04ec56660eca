//! The interpreter shell: class registry, globals, frame stack, pending and
//! caught exception slots, include/import, and the host-facing entry points.

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    ast::Script,
    builtins,
    exception::Exception,
    eval,
    heap::{Heap, HeapData, HeapId},
    host::{Request, Response},
    object,
    parser::Parser,
    stream::{FileStream, MemoryStream},
    types::{Allocator, ClassObj, ExceptionObj, Frame, FunctionKind, FunctionObj, IterObj, IterState, MapObj, NativeFn},
    unistr::UniString,
    value::Value,
};

/// Marker error: the interpreter's pending-exception slot has been set.
///
/// Pending exceptions and successful results are mutually exclusive, so this
/// carries no payload; the exception itself lives in [`Interpreter`].
#[derive(Debug)]
pub(crate) struct Raised;

/// Well-known classes, cached at initialization.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Registry {
    pub object: HeapId,
    pub iterable: HeapId,
    pub boolean: HeapId,
    pub int: HeapId,
    pub float: HeapId,
    pub string: HeapId,
    pub binary: HeapId,
    pub void: HeapId,
    pub iterator: HeapId,
    pub list: HeapId,
    pub map: HeapId,
    pub set: HeapId,
    pub range: HeapId,
    pub exception: HeapId,
    pub class: HeapId,
    pub function: HeapId,
    pub file: HeapId,

    pub type_error: HeapId,
    pub value_error: HeapId,
    pub name_error: HeapId,
    pub key_error: HeapId,
    pub index_error: HeapId,
    pub state_error: HeapId,
    pub syntax_error: HeapId,
    pub import_error: HeapId,
    pub attribute_error: HeapId,
    pub zero_division_error: HeapId,
    pub overflow_error: HeapId,
    pub io_error: HeapId,
}

/// Host value used to seed interpreter globals.
#[derive(Debug, Clone)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) registry: Registry,
    pub(crate) globals: IndexMap<UniString, Value>,
    pub(crate) frame: Option<HeapId>,
    pub(crate) exception: Option<Value>,
    pub(crate) caught_exception: Option<Value>,
    empty_iterator: Option<HeapId>,
    imported_files: AHashMap<PathBuf, Value>,
    pub(crate) request: Box<dyn Request>,
    pub(crate) response: Box<dyn Response>,
}

impl Interpreter {
    /// Creates an interpreter with all built-in classes, functions and the
    /// `request`/`response` globals registered, and a top-level frame
    /// pushed.
    pub fn new(request: Box<dyn Request>, response: Box<dyn Response>) -> Self {
        let mut heap = Heap::new();
        let mut globals = IndexMap::new();
        let registry = Registry::bootstrap(&mut heap, &mut globals);
        let mut interp = Self {
            heap,
            registry,
            globals,
            frame: None,
            exception: None,
            caught_exception: None,
            empty_iterator: None,
            imported_files: AHashMap::new(),
            request,
            response,
        };
        builtins::register(&mut interp);
        interp.push_frame(None, None, Value::Null, Vec::new());
        interp
    }

    // --- Class and function registration -------------------------------

    pub(crate) fn add_class(&mut self, name: &str, base: Option<HeapId>) -> HeapId {
        Registry::add_class(&mut self.heap, &mut self.globals, name, base)
    }

    pub(crate) fn set_allocator(&mut self, class: HeapId, allocator: Allocator) {
        self.heap.class_mut(class).allocator = allocator;
    }

    pub(crate) fn add_method(&mut self, class: HeapId, name: &str, arity: i32, callback: NativeFn) {
        let mut function = FunctionObj::new(FunctionKind::Native { class, arity, callback });
        function
            .attributes
            .insert(UniString::from("__name__"), Value::from(name));
        let id = self.heap.allocate(HeapData::Function(function));
        self.heap
            .class_mut(class)
            .attributes
            .insert(UniString::from(name), Value::Ref(id));
    }

    pub(crate) fn add_static_method(&mut self, class: HeapId, name: &str, arity: i32, callback: NativeFn) {
        let mut function = FunctionObj::new(FunctionKind::NativeStatic { class, arity, callback });
        function
            .attributes
            .insert(UniString::from("__name__"), Value::from(name));
        let id = self.heap.allocate(HeapData::Function(function));
        self.heap
            .class_mut(class)
            .attributes
            .insert(UniString::from(name), Value::Ref(id));
    }

    pub(crate) fn add_method_alias(&mut self, class: HeapId, alias_name: &str, aliased_name: &str) {
        let function = FunctionObj::new(FunctionKind::Alias {
            name: UniString::from(aliased_name),
        });
        let id = self.heap.allocate(HeapData::Function(function));
        self.heap
            .class_mut(class)
            .attributes
            .insert(UniString::from(alias_name), Value::Ref(id));
    }

    pub(crate) fn add_function(&mut self, name: &str, arity: i32, callback: NativeFn) {
        let mut function = FunctionObj::new(FunctionKind::Global { arity, callback });
        function
            .attributes
            .insert(UniString::from("__name__"), Value::from(name));
        let id = self.heap.allocate(HeapData::Function(function));
        self.globals.insert(UniString::from(name), Value::Ref(id));
    }

    // --- Exceptions -----------------------------------------------------

    /// Constructs an exception of the given class, captures the current
    /// frame and parks it in the pending slot.
    pub(crate) fn throw(&mut self, class: HeapId, message: impl Into<String>) -> Raised {
        let message = UniString::from(message.into());
        let exception = ExceptionObj::with_message(class, message, self.frame);
        let id = self.heap.allocate(HeapData::Exception(exception));
        self.exception = Some(Value::Ref(id));
        Raised
    }

    pub(crate) fn set_exception(&mut self, exception: Value) -> Raised {
        self.exception = Some(exception);
        Raised
    }

    pub(crate) fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// Converts the pending exception into the host-facing form, clearing
    /// the slot.
    pub(crate) fn take_exception(&mut self) -> Exception {
        let Some(value) = self.exception.take() else {
            return Exception {
                class_name: "Exception".to_owned(),
                message: String::new(),
                traceback: Vec::new(),
                position: None,
            };
        };
        let Some(id) = value.as_ref_id() else {
            return Exception {
                class_name: "Exception".to_owned(),
                message: String::new(),
                traceback: Vec::new(),
                position: None,
            };
        };
        let exception = self.heap.exception(id);
        let class_name = self.heap.class(exception.class).name();
        let message = exception.message().to_string();
        let mut traceback = Vec::new();
        let mut frame = exception.frame;
        while let Some(frame_id) = frame {
            let record = self.heap.frame(frame_id);
            let name = record
                .function
                .as_ref()
                .and_then(Value::as_ref_id)
                .and_then(|function_id| self.heap.function(function_id).name())
                .map_or_else(|| "<eval>".to_owned(), |name| name.to_string());
            traceback.push(name);
            frame = record.previous;
        }
        Exception {
            class_name,
            message,
            traceback,
            position: None,
        }
    }

    // --- Frames and variables -------------------------------------------

    pub(crate) fn push_frame(
        &mut self,
        enclosing: Option<HeapId>,
        function: Option<Value>,
        receiver: Value,
        arguments: Vec<Value>,
    ) -> HeapId {
        let frame = Frame::new(self.frame, enclosing, function, receiver, arguments);
        let id = self.heap.allocate(HeapData::Frame(frame));
        self.frame = Some(id);
        id
    }

    pub(crate) fn pop_frame(&mut self) {
        if let Some(id) = self.frame {
            self.frame = self.heap.frame(id).previous;
        }
    }

    pub(crate) fn get_global(&self, name: &UniString) -> Option<Value> {
        self.globals.get(name).cloned()
    }

    pub(crate) fn set_global_value(&mut self, name: UniString, value: Value) {
        self.globals.insert(name, value);
    }

    /// Seeds a global from the host.
    pub fn set_global(&mut self, name: &str, value: HostValue) {
        let value = match value {
            HostValue::Null => Value::Null,
            HostValue::Bool(b) => Value::Bool(b),
            HostValue::Int(i) => Value::Int(i),
            HostValue::Float(f) => Value::Float(f),
            HostValue::Str(s) => Value::from(s.as_str()),
        };
        self.globals.insert(UniString::from(name), value);
    }

    /// The shared iterator that is always exhausted.
    pub(crate) fn empty_iterator(&mut self) -> HeapId {
        if let Some(id) = self.empty_iterator {
            return id;
        }
        let id = self.heap.allocate(HeapData::Iter(IterObj::new(IterState::Empty)));
        self.empty_iterator = Some(id);
        id
    }

    pub(crate) fn write_output(&mut self, bytes: &[u8]) {
        self.response.write(bytes);
    }

    // --- Include and import ---------------------------------------------

    /// Parses and executes the file's top level in the current scope.
    pub(crate) fn include_file(&mut self, path: &Path) -> Result<(), Raised> {
        let import_error = self.registry.import_error;
        let Ok(stream) = FileStream::open_read(path) else {
            return Err(self.throw(import_error, "Unable to include file"));
        };
        let script = self.compile_stream(Box::new(stream))?;
        self.run_nodes(&script)
    }

    /// Executes the file in a fresh top-level frame, memoizes the resulting
    /// locals by canonical path and returns them as a Map.
    pub(crate) fn import_file(&mut self, path: &Path) -> Result<Value, Raised> {
        let import_error = self.registry.import_error;
        let Ok(canonical) = path.canonicalize() else {
            return Err(self.throw(import_error, "Unable to import file"));
        };
        if let Some(module) = self.imported_files.get(&canonical) {
            return Ok(module.clone());
        }
        let Ok(stream) = FileStream::open_read(&canonical) else {
            return Err(self.throw(import_error, "Unable to import file"));
        };
        let script = self.compile_stream(Box::new(stream))?;
        let frame_id = self.push_frame(None, None, Value::Null, Vec::new());
        let result = self.run_nodes(&script);
        self.pop_frame();
        result?;

        let mut module = MapObj::new();
        let locals: Vec<(UniString, Value)> = self
            .heap
            .frame(frame_id)
            .locals
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        for (name, value) in locals {
            let hash = name.hash_code() as i64;
            module.insert(hash, Value::Str(name), value);
        }
        let module = Value::Ref(self.heap.allocate(HeapData::Map(module)));
        self.imported_files.insert(canonical, module.clone());
        Ok(module)
    }

    fn compile_stream(&mut self, stream: Box<dyn crate::stream::Stream>) -> Result<Script, Raised> {
        let syntax_error = self.registry.syntax_error;
        Parser::new(stream)
            .compile()
            .map_err(|error| self.throw(syntax_error, error.message))
    }

    fn run_nodes(&mut self, script: &Script) -> Result<(), Raised> {
        eval::run_script(self, script).map(|_| ())
    }

    // --- Host entry points ----------------------------------------------

    /// Renders a template, writing output to the response sink.
    pub fn execute_template(&mut self, source: &str) -> Result<(), Exception> {
        match Parser::new(Box::new(MemoryStream::from(source))).compile() {
            Ok(script) => self.run_nodes(&script).map_err(|_raised| self.take_exception()),
            Err(error) => Err(Exception::from_parse_error(error)),
        }
    }

    /// Renders a template file, as the CGI and HTTP gateways do.
    pub fn execute_file(&mut self, path: &Path) -> Result<(), Exception> {
        self.include_file(path).map_err(|_raised| self.take_exception())
    }

    /// Evaluates bare script source and returns the string representation of
    /// its result, or `None` when the result is null. Used by the REPL.
    pub fn eval_expression(&mut self, source: &str) -> Result<Option<String>, Exception> {
        let script = Parser::new(Box::new(MemoryStream::from(source)))
            .compile_expression()
            .map_err(Exception::from_parse_error)?;
        let value = eval::run_script(self, &script).map_err(|_raised| self.take_exception())?;
        match value {
            Value::Null => Ok(None),
            value => {
                let repr = object::to_string(self, &value).map_err(|_raised| self.take_exception())?;
                Ok(Some(repr.to_string()))
            }
        }
    }
}

impl Registry {
    fn add_class(
        heap: &mut Heap,
        globals: &mut IndexMap<UniString, Value>,
        name: &str,
        base: Option<HeapId>,
    ) -> HeapId {
        let allocator = base.map_or(Allocator::Default, |base_id| heap.class(base_id).allocator);
        let id = heap.allocate(HeapData::Class(ClassObj::new(base, allocator)));
        heap.class_mut(id)
            .attributes
            .insert(UniString::from("__name__"), Value::from(name));
        globals.insert(UniString::from(name), Value::Ref(id));
        id
    }

    /// Creates every well-known class in registration order; methods are
    /// attached afterwards by the builtin modules.
    fn bootstrap(heap: &mut Heap, globals: &mut IndexMap<UniString, Value>) -> Self {
        let object = Self::add_class(heap, globals, "Object", None);
        let iterable = Self::add_class(heap, globals, "Iterable", Some(object));
        let boolean = Self::add_class(heap, globals, "Bool", Some(object));
        let int = Self::add_class(heap, globals, "Int", Some(object));
        let float = Self::add_class(heap, globals, "Float", Some(object));
        let string = Self::add_class(heap, globals, "String", Some(iterable));
        let binary = Self::add_class(heap, globals, "Binary", Some(object));
        let void = Self::add_class(heap, globals, "Void", Some(object));
        let iterator = Self::add_class(heap, globals, "Iterator", Some(iterable));
        let list = Self::add_class(heap, globals, "List", Some(iterable));
        let map = Self::add_class(heap, globals, "Map", Some(iterable));
        let set = Self::add_class(heap, globals, "Set", Some(iterable));
        let range = Self::add_class(heap, globals, "Range", Some(iterable));
        let exception = Self::add_class(heap, globals, "Exception", Some(object));
        let type_error = Self::add_class(heap, globals, "TypeError", Some(exception));
        let value_error = Self::add_class(heap, globals, "ValueError", Some(exception));
        let name_error = Self::add_class(heap, globals, "NameError", Some(exception));
        let key_error = Self::add_class(heap, globals, "KeyError", Some(exception));
        let index_error = Self::add_class(heap, globals, "IndexError", Some(exception));
        let state_error = Self::add_class(heap, globals, "StateError", Some(exception));
        let syntax_error = Self::add_class(heap, globals, "SyntaxError", Some(exception));
        let import_error = Self::add_class(heap, globals, "ImportError", Some(exception));
        let attribute_error = Self::add_class(heap, globals, "AttributeError", Some(exception));
        let zero_division_error = Self::add_class(heap, globals, "ZeroDivisionError", Some(exception));
        let overflow_error = Self::add_class(heap, globals, "OverflowError", Some(exception));
        let io_error = Self::add_class(heap, globals, "IOError", Some(exception));
        let class = Self::add_class(heap, globals, "Class", Some(object));
        let function = Self::add_class(heap, globals, "Function", Some(object));
        let file = Self::add_class(heap, globals, "File", Some(object));

        Self {
            object,
            iterable,
            boolean,
            int,
            float,
            string,
            binary,
            void,
            iterator,
            list,
            map,
            set,
            range,
            exception,
            class,
            function,
            file,
            type_error,
            value_error,
            name_error,
            key_error,
            index_error,
            state_error,
            syntax_error,
            import_error,
            attribute_error,
            zero_division_error,
            overflow_error,
            io_error,
        }
    }
}
