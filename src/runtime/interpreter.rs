//! Tree-walking evaluator.
//!
//! Statements evaluate to a [`Completion`]; script exceptions travel on the
//! `Err` side of [`JsResult`] as a [`Throw`] carrying the thrown value, so `?`
//! propagates them until a `try` statement or the engine boundary.
//!
//! Member calls are resolved before the callee is evaluated as a value, so a
//! failure names the member being invoked: `foo.bar.foobar()` with `foo.bar`
//! undefined throws `TypeError: Cannot call method 'foobar' of undefined`.

use super::builtins::regexp::translate_pattern;
use super::environment::{EnvRef, Environment};
use super::global;
use super::object::{
    ArrayStorage, Closure, NativeFn, NativeFunction, ObjectKind, ObjectRef, Property, RegExpData,
};
use super::value::{number_key, strict_equals, to_int32, to_uint32, utf16_len, Value};
use crate::ast::{
    BinaryOp, Expr, ForInTarget, ForInit, FunctionDef, LogicalOp, MemberKey, Program, Stmt,
    UnaryOp, VarDeclarations,
};
use crate::config::Config;
use crate::error::{ErrorKind, ThrownError};
use crate::harness::HarnessState;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// A thrown script value.
#[derive(Debug, Clone)]
pub struct Throw(pub Value);

/// Result of evaluating script code.
pub type JsResult<T> = std::result::Result<T, Throw>;

/// How a statement finished, apart from throwing.
#[derive(Debug, Clone)]
pub enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Preferred type for `ToPrimitive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Number,
    String,
}

/// Prototypes the runtime needs direct access to.
pub struct Intrinsics {
    pub object_prototype: ObjectRef,
    pub function_prototype: ObjectRef,
    pub array_prototype: ObjectRef,
    pub string_prototype: ObjectRef,
    pub number_prototype: ObjectRef,
    pub boolean_prototype: ObjectRef,
    pub regexp_prototype: ObjectRef,
    pub error_prototypes: HashMap<ErrorKind, ObjectRef>,
}

/// Evaluation context: the current scope and `this` binding.
#[derive(Clone)]
struct Context {
    env: EnvRef,
    this: Value,
}

/// An assignable location.
enum Reference {
    Binding(Rc<str>),
    Property(Value, Rc<str>),
}

pub struct Interpreter {
    pub(crate) global: ObjectRef,
    pub(crate) intrinsics: Intrinsics,
    pub(crate) config: Config,
    pub(crate) harness: HarnessState,
    pub(crate) output: Vec<String>,
    global_env: EnvRef,
    call_depth: usize,
    last_value: Value,
}

impl Interpreter {
    /// Creates an interpreter with a fully populated global object.
    pub fn new(config: Config) -> Self {
        let (global, intrinsics) = global::create_realm();
        let mut interpreter = Self {
            global,
            intrinsics,
            config,
            harness: HarnessState::default(),
            output: Vec::new(),
            global_env: Environment::global(),
            call_depth: 0,
            last_value: Value::Undefined,
        };
        global::initialize(&mut interpreter);
        interpreter
    }

    pub fn global_object(&self) -> &ObjectRef {
        &self.global
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a program in the global scope; returns the value of the last
    /// expression statement evaluated at top level.
    pub fn eval_program(&mut self, program: &Program) -> JsResult<Value> {
        let ctx = Context {
            env: self.global_env.clone(),
            this: Value::Object(self.global.clone()),
        };
        self.last_value = Value::Undefined;
        self.hoist(&program.body, &ctx);
        match self.exec_block(&program.body, &ctx)? {
            Completion::Return(_) | Completion::Break | Completion::Continue => {
                debug!("abrupt completion at top level ignored");
            }
            Completion::Normal => {}
        }
        Ok(std::mem::take(&mut self.last_value))
    }

    // --- Object construction helpers used by the builtins ---

    pub fn new_object(&self) -> ObjectRef {
        ObjectRef::new(
            ObjectKind::Ordinary,
            Some(self.intrinsics.object_prototype.clone()),
        )
    }

    pub fn new_array(&self, elements: Vec<Value>) -> ObjectRef {
        ObjectRef::new(
            ObjectKind::Array(ArrayStorage::from(elements)),
            Some(self.intrinsics.array_prototype.clone()),
        )
    }

    /// Creates a builtin function object.
    pub fn new_native_function(
        &self,
        name: &'static str,
        arity: usize,
        call: NativeFn,
        construct: Option<NativeFn>,
    ) -> ObjectRef {
        let function = ObjectRef::new(
            ObjectKind::Native(NativeFunction {
                name,
                call,
                construct,
            }),
            Some(self.intrinsics.function_prototype.clone()),
        );
        function.define("length", Property::frozen(Value::Number(arity as f64)));
        function.define("name", Property::frozen(Value::from(name)));
        function
    }

    pub fn error_prototype(&self, kind: ErrorKind) -> ObjectRef {
        self.intrinsics
            .error_prototypes
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| self.intrinsics.object_prototype.clone())
    }

    /// Creates an error object of `kind` with an own `message` property.
    pub fn create_error(&self, kind: ErrorKind, message: &str) -> ObjectRef {
        let error = ObjectRef::new(ObjectKind::Error, Some(self.error_prototype(kind)));
        error.define_hidden("message", Value::from(message));
        error
    }

    /// Builds a [`Throw`] carrying a fresh error object.
    pub fn throw_error(&self, kind: ErrorKind, message: impl AsRef<str>) -> Throw {
        Throw(Value::Object(self.create_error(kind, message.as_ref())))
    }

    /// Compiles a regular expression object. Invalid patterns or flags throw `SyntaxError`.
    pub fn new_regexp(&self, source: &str, flags: &str) -> JsResult<ObjectRef> {
        let mut seen = String::new();
        for flag in flags.chars() {
            if !matches!(flag, 'g' | 'i' | 'm') || seen.contains(flag) {
                return Err(self.throw_error(
                    ErrorKind::SyntaxError,
                    format!("Invalid flags supplied to RegExp constructor '{}'", flags),
                ));
            }
            seen.push(flag);
        }
        let translated = translate_pattern(source);
        let regex = regex::RegexBuilder::new(&translated)
            .case_insensitive(seen.contains('i'))
            .multi_line(seen.contains('m'))
            .build()
            .map_err(|e| {
                let detail = e.to_string();
                let summary = detail.lines().last().unwrap_or("invalid pattern").trim();
                self.throw_error(
                    ErrorKind::SyntaxError,
                    format!("Invalid regular expression: /{}/: {}", source, summary),
                )
            })?;
        let data = RegExpData {
            source: Rc::from(source),
            flags: Rc::from(seen.as_str()),
            regex,
        };
        let object = ObjectRef::new(
            ObjectKind::RegExp(Rc::new(data)),
            Some(self.intrinsics.regexp_prototype.clone()),
        );
        object.define("source", Property::frozen(Value::from(source)));
        object.define("global", Property::frozen(Value::Boolean(seen.contains('g'))));
        object.define(
            "ignoreCase",
            Property::frozen(Value::Boolean(seen.contains('i'))),
        );
        object.define(
            "multiline",
            Property::frozen(Value::Boolean(seen.contains('m'))),
        );
        object.define_hidden("lastIndex", Value::Number(0.0));
        Ok(object)
    }

    fn create_function(&self, def: &Rc<FunctionDef>, scope: EnvRef) -> ObjectRef {
        let function = ObjectRef::new(
            ObjectKind::Function(Rc::new(Closure {
                def: def.clone(),
                scope,
            })),
            Some(self.intrinsics.function_prototype.clone()),
        );
        let name = def.name.as_deref().unwrap_or("");
        function.define("length", Property::frozen(Value::Number(def.params.len() as f64)));
        function.define("name", Property::frozen(Value::from(name)));
        let prototype = self.new_object();
        prototype.define_hidden("constructor", Value::Object(function.clone()));
        function.define(
            "prototype",
            Property {
                value: Value::Object(prototype),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        function
    }

    // --- Conversions that may run script code ---

    /// ToPrimitive (ES5 9.1) via `valueOf`/`toString`.
    pub fn to_primitive(&mut self, value: &Value, hint: Hint) -> JsResult<Value> {
        let object = match value {
            Value::Object(o) => o.clone(),
            primitive => return Ok(primitive.clone()),
        };
        let order = match hint {
            Hint::Number => ["valueOf", "toString"],
            Hint::String => ["toString", "valueOf"],
        };
        for method in order {
            let function = object.get(method);
            if function.is_callable() {
                let result = self.call(&function, value.clone(), &[])?;
                if !matches!(result, Value::Object(_)) {
                    return Ok(result);
                }
            }
        }
        Err(self.throw_error(
            ErrorKind::TypeError,
            "Cannot convert object to primitive value",
        ))
    }

    pub fn to_string(&mut self, value: &Value) -> JsResult<Rc<str>> {
        if let Some(s) = value.primitive_to_string() {
            return Ok(s);
        }
        let primitive = self.to_primitive(value, Hint::String)?;
        Ok(primitive
            .primitive_to_string()
            .unwrap_or_else(|| Rc::from("")))
    }

    pub fn to_number(&mut self, value: &Value) -> JsResult<f64> {
        if let Some(n) = value.primitive_to_number() {
            return Ok(n);
        }
        let primitive = self.to_primitive(value, Hint::Number)?;
        Ok(primitive.primitive_to_number().unwrap_or(f64::NAN))
    }

    /// ToObject (ES5 9.9): wraps primitives, rejects `undefined`/`null`.
    pub fn to_object(&self, value: &Value) -> JsResult<ObjectRef> {
        let (kind, prototype) = match value {
            Value::Object(o) => return Ok(o.clone()),
            Value::Undefined | Value::Null => {
                return Err(self.throw_error(
                    ErrorKind::TypeError,
                    format!("Cannot convert {} to object", self.nullish_name(value)),
                ))
            }
            Value::Boolean(b) => (
                ObjectKind::Boolean(*b),
                &self.intrinsics.boolean_prototype,
            ),
            Value::Number(n) => (ObjectKind::Number(*n), &self.intrinsics.number_prototype),
            Value::String(s) => (
                ObjectKind::String(s.clone()),
                &self.intrinsics.string_prototype,
            ),
        };
        Ok(ObjectRef::new(kind, Some(prototype.clone())))
    }

    /// String conversion that never fails, for diagnostics and host output.
    pub fn display(&mut self, value: &Value) -> String {
        match self.to_string(value) {
            Ok(s) => s.to_string(),
            Err(_) => match value {
                Value::Object(o) => format!("[object {}]", o.class_name()),
                other => format!("{:?}", other),
            },
        }
    }

    /// Describes a thrown value for the host.
    pub fn thrown_error(&mut self, throw: &Throw) -> ThrownError {
        let value = &throw.0;
        let text = self.display(value);
        match value {
            Value::Object(o) if o.is_error() => {
                let name = o.get("name");
                let name = self.display(&name);
                let message = o.get("message");
                let message = if message.is_undefined() {
                    String::new()
                } else {
                    self.display(&message)
                };
                ThrownError {
                    kind: ErrorKind::from_name(&name),
                    message,
                    text,
                }
            }
            _ => ThrownError {
                kind: None,
                message: text.clone(),
                text,
            },
        }
    }

    fn nullish_name(&self, value: &Value) -> &'static str {
        if matches!(value, Value::Null) {
            "null"
        } else {
            "undefined"
        }
    }

    // --- Property access on arbitrary values ---

    /// Reads `base[key]`, including properties of primitives via their prototypes.
    pub fn get_property(&mut self, base: &Value, key: &str) -> JsResult<Value> {
        match base {
            Value::Undefined | Value::Null => Err(self.throw_error(
                ErrorKind::TypeError,
                format!(
                    "Cannot read property '{}' of {}",
                    key,
                    self.nullish_name(base)
                ),
            )),
            Value::Object(o) => Ok(o.get(key)),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(utf16_len(s) as f64));
                }
                if let Some(index) = super::value::array_index(key) {
                    if let Some(unit) = s.encode_utf16().nth(index) {
                        return Ok(Value::from(String::from_utf16_lossy(&[unit])));
                    }
                }
                Ok(self.intrinsics.string_prototype.get(key))
            }
            Value::Number(_) => Ok(self.intrinsics.number_prototype.get(key)),
            Value::Boolean(_) => Ok(self.intrinsics.boolean_prototype.get(key)),
        }
    }

    /// Writes `base[key] = value`. Writes to primitives are dropped.
    pub fn put_property(&mut self, base: &Value, key: &str, value: Value) -> JsResult<()> {
        match base {
            Value::Undefined | Value::Null => Err(self.throw_error(
                ErrorKind::TypeError,
                format!(
                    "Cannot set property '{}' of {}",
                    key,
                    self.nullish_name(base)
                ),
            )),
            Value::Object(o) => {
                o.put(key, value);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // --- Calls ---

    /// Calls `callee` with the given `this` and arguments.
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> JsResult<Value> {
        let function = match callee {
            Value::Object(o) if o.is_callable() => o.clone(),
            other => {
                let shown = self.display(other);
                return Err(self.throw_error(
                    ErrorKind::TypeError,
                    format!("{} is not a function", shown),
                ));
            }
        };
        self.enter_call()?;
        let result = self.call_function(&function, this, args);
        self.call_depth -= 1;
        result
    }

    fn enter_call(&mut self) -> JsResult<()> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(self.throw_error(
                ErrorKind::RangeError,
                "Maximum call stack size exceeded",
            ));
        }
        self.call_depth += 1;
        Ok(())
    }

    fn call_function(&mut self, function: &ObjectRef, this: Value, args: &[Value]) -> JsResult<Value> {
        let closure = match &function.borrow().kind {
            ObjectKind::Native(native) => Err(native.call),
            ObjectKind::Function(closure) => Ok(closure.clone()),
            _ => return Ok(Value::Undefined),
        };
        match closure {
            Err(native) => native(self, &this, args),
            Ok(closure) => self.call_closure(&closure, this, args),
        }
    }

    fn call_closure(&mut self, closure: &Closure, this: Value, args: &[Value]) -> JsResult<Value> {
        let def = &closure.def;
        trace!(
            function = def.name.as_deref().unwrap_or("<anonymous>"),
            args = args.len(),
            depth = self.call_depth,
            "call"
        );
        let env = Environment::child(&closure.scope);
        let arguments = self.new_array(args.to_vec());
        env.declare(&Rc::from("arguments"), Value::Object(arguments));
        for (i, param) in def.params.iter().enumerate() {
            env.declare(param, args.get(i).cloned().unwrap_or_default());
        }
        // Non-strict functions see the global object for an undefined/null receiver.
        let this = if this.is_nullish() {
            Value::Object(self.global.clone())
        } else {
            this
        };
        let ctx = Context { env, this };
        self.hoist(&def.body, &ctx);

        let saved_last_value = std::mem::take(&mut self.last_value);
        let completion = self.exec_block(&def.body, &ctx);
        self.last_value = saved_last_value;

        match completion? {
            Completion::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    /// `new callee(...args)`.
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> JsResult<Value> {
        let function = match callee {
            Value::Object(o) if o.is_callable() => o.clone(),
            other => {
                let shown = self.display(other);
                return Err(self.throw_error(
                    ErrorKind::TypeError,
                    format!("{} is not a constructor", shown),
                ));
            }
        };
        let native = match &function.borrow().kind {
            ObjectKind::Native(native) => Some(*native),
            _ => None,
        };
        if let Some(native) = native {
            let construct = native.construct.ok_or_else(|| {
                self.throw_error(
                    ErrorKind::TypeError,
                    format!("{} is not a constructor", native.name),
                )
            })?;
            self.enter_call()?;
            let result = construct(self, &Value::Undefined, args);
            self.call_depth -= 1;
            return result;
        }

        let prototype = match function.get("prototype") {
            Value::Object(p) => p,
            _ => self.intrinsics.object_prototype.clone(),
        };
        let instance = ObjectRef::new(ObjectKind::Ordinary, Some(prototype));
        let result = self.call(callee, Value::Object(instance.clone()), args)?;
        Ok(match result {
            Value::Object(o) => Value::Object(o),
            _ => Value::Object(instance),
        })
    }

    // --- Declarations ---

    /// Declaration binding instantiation: `var` names become `undefined`,
    /// function declarations are bound to fresh closures.
    fn hoist(&mut self, body: &[Stmt], ctx: &Context) {
        let mut vars = Vec::new();
        let mut functions = Vec::new();
        collect_declarations(body, &mut vars, &mut functions);
        for name in vars {
            self.declare_var(&ctx.env, &name, None);
        }
        for def in functions {
            if let Some(name) = def.name.clone() {
                let function = self.create_function(&def, ctx.env.clone());
                self.declare_var(&ctx.env, &name, Some(Value::Object(function)));
            }
        }
    }

    fn declare_var(&mut self, env: &EnvRef, name: &Rc<str>, value: Option<Value>) {
        if env.is_global() {
            match value {
                Some(value) => self.global.put(name, value),
                None if !self.global.has_property(name) => {
                    self.global.define(
                        name,
                        Property {
                            value: Value::Undefined,
                            writable: true,
                            enumerable: true,
                            configurable: false,
                        },
                    );
                }
                None => {}
            }
        } else {
            match value {
                Some(value) => env.declare(name, value),
                None if !env.has_own(name) => env.declare(name, Value::Undefined),
                None => {}
            }
        }
    }

    fn lookup_identifier(&mut self, name: &str, env: &EnvRef) -> JsResult<Value> {
        if let Some(value) = env.lookup(name) {
            return Ok(value);
        }
        match self.global.get_property(name) {
            Some(property) => Ok(property.value),
            None => Err(self.throw_error(
                ErrorKind::ReferenceError,
                format!("{} is not defined", name),
            )),
        }
    }

    fn assign_identifier(&mut self, name: &str, value: Value, env: &EnvRef) {
        if !env.assign(name, value.clone()) {
            self.global.put(name, value);
        }
    }

    // --- Statements ---

    fn exec_block(&mut self, body: &[Stmt], ctx: &Context) -> JsResult<Completion> {
        for stmt in body {
            match self.exec(stmt, ctx)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, ctx: &Context) -> JsResult<Completion> {
        match stmt {
            Stmt::Empty | Stmt::FunctionDecl(_) => Ok(Completion::Normal),
            Stmt::Expr(expr) => {
                let value = self.eval(expr, ctx)?;
                self.last_value = value;
                Ok(Completion::Normal)
            }
            Stmt::Var(declarations) => {
                self.exec_var(declarations, ctx)?;
                Ok(Completion::Normal)
            }
            Stmt::Block(body) => self.exec_block(body, ctx),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, ctx)?.to_boolean() {
                    self.exec(consequent, ctx)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, ctx)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Stmt::While { test, body } => {
                while self.eval(test, ctx)?.to_boolean() {
                    match self.exec(body, ctx)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::DoWhile { body, test } => {
                loop {
                    match self.exec(body, ctx)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if !self.eval(test, ctx)?.to_boolean() {
                        break;
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                match init {
                    Some(ForInit::Var(declarations)) => self.exec_var(declarations, ctx)?,
                    Some(ForInit::Expr(expr)) => {
                        self.eval(expr, ctx)?;
                    }
                    None => {}
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, ctx)?.to_boolean() {
                            break;
                        }
                    }
                    match self.exec(body, ctx)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval(update, ctx)?;
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::ForIn {
                target,
                object,
                body,
            } => self.exec_for_in(target, object, body, ctx),
            Stmt::Break => Ok(Completion::Break),
            Stmt::Continue => Ok(Completion::Continue),
            Stmt::Return(argument) => {
                let value = match argument {
                    Some(expr) => self.eval(expr, ctx)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::Throw(argument) => {
                let value = self.eval(argument, ctx)?;
                Err(Throw(value))
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => {
                let mut result = self.exec_block(block, ctx);
                if let Some(handler) = handler {
                    if let Err(Throw(thrown)) = result {
                        let env = Environment::child(&ctx.env);
                        env.declare(&handler.param, thrown);
                        let catch_ctx = Context {
                            env,
                            this: ctx.this.clone(),
                        };
                        result = self.exec_block(&handler.body, &catch_ctx);
                    }
                }
                if let Some(finalizer) = finalizer {
                    match self.exec_block(finalizer, ctx)? {
                        Completion::Normal => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                result
            }
        }
    }

    fn exec_var(&mut self, declarations: &VarDeclarations, ctx: &Context) -> JsResult<()> {
        for (name, init) in declarations {
            if let Some(init) = init {
                let value = self.eval(init, ctx)?;
                self.assign_identifier(name, value, &ctx.env);
            }
        }
        Ok(())
    }

    fn exec_for_in(
        &mut self,
        target: &ForInTarget,
        object: &Expr,
        body: &Stmt,
        ctx: &Context,
    ) -> JsResult<Completion> {
        let value = self.eval(object, ctx)?;
        if value.is_nullish() {
            return Ok(Completion::Normal);
        }
        let object = self.to_object(&value)?;
        for key in object.enumerable_keys_in_chain() {
            // Properties deleted during iteration are skipped.
            if !object.has_property(&key) {
                continue;
            }
            let key_value = Value::String(key);
            match target {
                ForInTarget::Var(name) => self.assign_identifier(name, key_value, &ctx.env),
                ForInTarget::Expr(expr) => {
                    let reference = self.reference(expr, ctx)?;
                    self.put_reference(&reference, key_value, ctx)?;
                }
            }
            match self.exec(body, ctx)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
        }
        Ok(Completion::Normal)
    }

    // --- Expressions ---

    fn member_key(&mut self, property: &MemberKey, ctx: &Context) -> JsResult<Rc<str>> {
        match property {
            MemberKey::Static(name) => Ok(name.clone()),
            MemberKey::Computed(expr) => {
                let key = self.eval(expr, ctx)?;
                self.to_string(&key)
            }
        }
    }

    fn reference(&mut self, expr: &Expr, ctx: &Context) -> JsResult<Reference> {
        match expr {
            Expr::Identifier(name) => Ok(Reference::Binding(name.clone())),
            Expr::Member { object, property } => {
                let base = self.eval(object, ctx)?;
                let key = self.member_key(property, ctx)?;
                Ok(Reference::Property(base, key))
            }
            _ => Err(self.throw_error(
                ErrorKind::ReferenceError,
                "Invalid left-hand side in assignment",
            )),
        }
    }

    fn get_reference(&mut self, reference: &Reference, ctx: &Context) -> JsResult<Value> {
        match reference {
            Reference::Binding(name) => self.lookup_identifier(name, &ctx.env),
            Reference::Property(base, key) => self.get_property(base, key),
        }
    }

    fn put_reference(&mut self, reference: &Reference, value: Value, ctx: &Context) -> JsResult<()> {
        match reference {
            Reference::Binding(name) => {
                self.assign_identifier(name, value, &ctx.env);
                Ok(())
            }
            Reference::Property(base, key) => self.put_property(base, key, value),
        }
    }

    fn eval_arguments(&mut self, arguments: &[Expr], ctx: &Context) -> JsResult<Vec<Value>> {
        arguments.iter().map(|arg| self.eval(arg, ctx)).collect()
    }

    fn eval(&mut self, expr: &Expr, ctx: &Context) -> JsResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::This => Ok(ctx.this.clone()),
            Expr::Identifier(name) => self.lookup_identifier(name, &ctx.env),
            Expr::Regex { pattern, flags } => Ok(Value::Object(self.new_regexp(pattern, flags)?)),
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(match element {
                        Some(expr) => self.eval(expr, ctx)?,
                        None => Value::Undefined,
                    });
                }
                Ok(Value::Object(self.new_array(values)))
            }
            Expr::Object(properties) => {
                let object = self.new_object();
                for (key, value) in properties {
                    let value = self.eval(value, ctx)?;
                    object.define(key, Property::data(value));
                }
                Ok(Value::Object(object))
            }
            Expr::Function(def) => Ok(Value::Object(self.function_expression(def, ctx))),
            Expr::Unary { op, argument } => self.eval_unary(*op, argument, ctx),
            Expr::Update {
                increment,
                prefix,
                argument,
            } => {
                let reference = self.reference(argument, ctx)?;
                let old = self.get_reference(&reference, ctx)?;
                let old = self.to_number(&old)?;
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.put_reference(&reference, Value::Number(new), ctx)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, ctx)?;
                let right = self.eval(right, ctx)?;
                self.binary(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, ctx)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, ctx)
                }
            }
            Expr::Assign { op, target, value } => {
                let reference = self.reference(target, ctx)?;
                let result = match op {
                    None => self.eval(value, ctx)?,
                    Some(op) => {
                        let current = self.get_reference(&reference, ctx)?;
                        let operand = self.eval(value, ctx)?;
                        self.binary(*op, &current, &operand)?
                    }
                };
                self.put_reference(&reference, result.clone(), ctx)?;
                Ok(result)
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, ctx)?.to_boolean() {
                    self.eval(consequent, ctx)
                } else {
                    self.eval(alternate, ctx)
                }
            }
            Expr::Member { object, property } => {
                let base = self.eval(object, ctx)?;
                let key = self.member_key(property, ctx)?;
                self.get_property(&base, &key)
            }
            Expr::Call { callee, arguments } => self.eval_call(callee, arguments, ctx),
            Expr::New { callee, arguments } => {
                let constructor = self.eval(callee, ctx)?;
                let args = self.eval_arguments(arguments, ctx)?;
                if !constructor.is_callable() {
                    return Err(self.throw_error(
                        ErrorKind::TypeError,
                        format!("{} is not a constructor", callee.describe()),
                    ));
                }
                self.construct(&constructor, &args)
            }
            Expr::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval(item, ctx)?;
                }
                Ok(last)
            }
        }
    }

    fn function_expression(&mut self, def: &Rc<FunctionDef>, ctx: &Context) -> ObjectRef {
        match &def.name {
            // A named function expression can refer to itself by name.
            Some(name) => {
                let scope = Environment::child(&ctx.env);
                let function = self.create_function(def, scope.clone());
                scope.declare(name, Value::Object(function.clone()));
                function
            }
            None => self.create_function(def, ctx.env.clone()),
        }
    }

    fn eval_call(&mut self, callee: &Expr, arguments: &[Expr], ctx: &Context) -> JsResult<Value> {
        let (function, this) = match callee {
            Expr::Member { object, property } => {
                let base = self.eval(object, ctx)?;
                let key = self.member_key(property, ctx)?;
                if base.is_nullish() {
                    return Err(self.throw_error(
                        ErrorKind::TypeError,
                        format!(
                            "Cannot call method '{}' of {}",
                            key,
                            self.nullish_name(&base)
                        ),
                    ));
                }
                let function = self.get_property(&base, &key)?;
                (function, base)
            }
            other => (self.eval(other, ctx)?, Value::Undefined),
        };
        let args = self.eval_arguments(arguments, ctx)?;
        if !function.is_callable() {
            return Err(self.throw_error(
                ErrorKind::TypeError,
                format!("{} is not a function", callee.describe()),
            ));
        }
        self.call(&function, this, &args)
    }

    fn eval_unary(&mut self, op: UnaryOp, argument: &Expr, ctx: &Context) -> JsResult<Value> {
        match op {
            UnaryOp::Typeof => {
                // typeof tolerates unresolvable references.
                if let Expr::Identifier(name) = argument {
                    if ctx.env.lookup(name).is_none() && !self.global.has_property(name) {
                        return Ok(Value::from("undefined"));
                    }
                }
                let value = self.eval(argument, ctx)?;
                Ok(Value::from(value.type_of()))
            }
            UnaryOp::Delete => match argument {
                Expr::Member { object, property } => {
                    let base = self.eval(object, ctx)?;
                    let key = self.member_key(property, ctx)?;
                    let object = self.to_object(&base)?;
                    Ok(Value::Boolean(object.delete(&key)))
                }
                Expr::Identifier(name) => {
                    if ctx.env.lookup(name).is_some() {
                        Ok(Value::Boolean(false))
                    } else {
                        Ok(Value::Boolean(self.global.delete(name)))
                    }
                }
                other => {
                    self.eval(other, ctx)?;
                    Ok(Value::Boolean(true))
                }
            },
            UnaryOp::Void => {
                self.eval(argument, ctx)?;
                Ok(Value::Undefined)
            }
            UnaryOp::Not => Ok(Value::Boolean(!self.eval(argument, ctx)?.to_boolean())),
            UnaryOp::Minus => {
                let value = self.eval(argument, ctx)?;
                Ok(Value::Number(-self.to_number(&value)?))
            }
            UnaryOp::Plus => {
                let value = self.eval(argument, ctx)?;
                Ok(Value::Number(self.to_number(&value)?))
            }
            UnaryOp::BitNot => {
                let value = self.eval(argument, ctx)?;
                let n = to_int32(self.to_number(&value)?);
                Ok(Value::Number(f64::from(!n)))
            }
        }
    }

    /// Applies a binary operator to already-evaluated operands.
    pub fn binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> JsResult<Value> {
        use BinaryOp::*;
        Ok(match op {
            Add => {
                let l = self.to_primitive(left, Hint::Number)?;
                let r = self.to_primitive(right, Hint::Number)?;
                if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                    let l = self.to_string(&l)?;
                    let r = self.to_string(&r)?;
                    Value::from(format!("{}{}", l, r))
                } else {
                    Value::Number(self.to_number(&l)? + self.to_number(&r)?)
                }
            }
            Sub | Mul | Div | Mod => {
                let l = self.to_number(left)?;
                let r = self.to_number(right)?;
                Value::Number(match op {
                    Sub => l - r,
                    Mul => l * r,
                    Div => l / r,
                    _ => l % r,
                })
            }
            Eq => Value::Boolean(self.loose_equals(left, right)?),
            NotEq => Value::Boolean(!self.loose_equals(left, right)?),
            StrictEq => Value::Boolean(strict_equals(left, right)),
            StrictNotEq => Value::Boolean(!strict_equals(left, right)),
            Lt => Value::Boolean(self.compare(left, right, false)? == Some(true)),
            Gt => Value::Boolean(self.compare(right, left, true)? == Some(true)),
            LtEq => Value::Boolean(self.compare(right, left, true)? == Some(false)),
            GtEq => Value::Boolean(self.compare(left, right, false)? == Some(false)),
            BitAnd | BitOr | BitXor => {
                let l = to_int32(self.to_number(left)?);
                let r = to_int32(self.to_number(right)?);
                Value::Number(f64::from(match op {
                    BitAnd => l & r,
                    BitOr => l | r,
                    _ => l ^ r,
                }))
            }
            Shl | Shr => {
                let l = to_int32(self.to_number(left)?);
                let shift = to_uint32(self.to_number(right)?) & 31;
                Value::Number(f64::from(if op == Shl {
                    l.wrapping_shl(shift)
                } else {
                    l >> shift
                }))
            }
            UShr => {
                let l = to_uint32(self.to_number(left)?);
                let shift = to_uint32(self.to_number(right)?) & 31;
                Value::Number(f64::from(l >> shift))
            }
            InstanceOf => Value::Boolean(self.instance_of(left, right)?),
            In => {
                let object = match right {
                    Value::Object(o) => o.clone(),
                    other => {
                        let key = self.display(left);
                        let shown = self.display(other);
                        return Err(self.throw_error(
                            ErrorKind::TypeError,
                            format!("Cannot use 'in' operator to search for '{}' in {}", key, shown),
                        ));
                    }
                };
                let key = self.to_string(left)?;
                Value::Boolean(object.has_property(&key))
            }
        })
    }

    /// Abstract relational comparison (ES5 11.8.5): `Some(left < right)`, or
    /// `None` when either side is `NaN`. When `swapped` is set, `right` is
    /// converted to a primitive before `left`.
    fn compare(&mut self, left: &Value, right: &Value, swapped: bool) -> JsResult<Option<bool>> {
        let (l, r) = if swapped {
            let r = self.to_primitive(right, Hint::Number)?;
            let l = self.to_primitive(left, Hint::Number)?;
            (l, r)
        } else {
            let l = self.to_primitive(left, Hint::Number)?;
            let r = self.to_primitive(right, Hint::Number)?;
            (l, r)
        };
        if let (Value::String(a), Value::String(b)) = (&l, &r) {
            return Ok(Some(a.encode_utf16().lt(b.encode_utf16())));
        }
        let a = self.to_number(&l)?;
        let b = self.to_number(&r)?;
        if a.is_nan() || b.is_nan() {
            return Ok(None);
        }
        Ok(Some(a < b))
    }

    /// Abstract equality (`==`, ES5 11.9.3).
    pub fn loose_equals(&mut self, left: &Value, right: &Value) -> JsResult<bool> {
        Ok(match (left, right) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(_), Value::String(s)) => strict_equals(
                left,
                &Value::Number(super::value::string_to_number(s)),
            ),
            (Value::String(s), Value::Number(_)) => strict_equals(
                &Value::Number(super::value::string_to_number(s)),
                right,
            ),
            (Value::Boolean(b), _) => {
                let n = Value::Number(f64::from(u8::from(*b)));
                return self.loose_equals(&n, right);
            }
            (_, Value::Boolean(b)) => {
                let n = Value::Number(f64::from(u8::from(*b)));
                return self.loose_equals(left, &n);
            }
            (Value::Object(_), Value::Object(_)) => strict_equals(left, right),
            (Value::Object(_), _) => {
                let primitive = self.to_primitive(left, Hint::Number)?;
                return self.loose_equals(&primitive, right);
            }
            (_, Value::Object(_)) => {
                let primitive = self.to_primitive(right, Hint::Number)?;
                return self.loose_equals(left, &primitive);
            }
            _ => strict_equals(left, right),
        })
    }

    /// `instanceof` (ES5 15.3.5.3).
    pub fn instance_of(&mut self, value: &Value, constructor: &Value) -> JsResult<bool> {
        let constructor = match constructor {
            Value::Object(o) if o.is_callable() => o.clone(),
            _ => {
                return Err(self.throw_error(
                    ErrorKind::TypeError,
                    "Expecting a function in instanceof check",
                ))
            }
        };
        let object = match value {
            Value::Object(o) => o.clone(),
            _ => return Ok(false),
        };
        let prototype = match constructor.get("prototype") {
            Value::Object(p) => p,
            _ => {
                return Err(self.throw_error(
                    ErrorKind::TypeError,
                    "Function has non-object prototype in instanceof check",
                ))
            }
        };
        let mut current = object.prototype();
        while let Some(candidate) = current {
            if candidate.ptr_eq(&prototype) {
                return Ok(true);
            }
            current = candidate.prototype();
        }
        Ok(false)
    }

    /// Key conversion helper for builtins that index arrays.
    pub fn index_key(index: usize) -> Rc<str> {
        number_key(index as f64)
    }
}

/// Collects `var` names and function declarations of a function body,
/// descending into nested statements but not into nested functions.
fn collect_declarations(
    body: &[Stmt],
    vars: &mut Vec<Rc<str>>,
    functions: &mut Vec<Rc<FunctionDef>>,
) {
    for stmt in body {
        collect_from(stmt, vars, functions);
    }
}

fn collect_from(stmt: &Stmt, vars: &mut Vec<Rc<str>>, functions: &mut Vec<Rc<FunctionDef>>) {
    match stmt {
        Stmt::Var(declarations) => vars.extend(declarations.iter().map(|(name, _)| name.clone())),
        Stmt::FunctionDecl(def) => functions.push(def.clone()),
        Stmt::Block(body) => collect_declarations(body, vars, functions),
        Stmt::If {
            consequent,
            alternate,
            ..
        } => {
            collect_from(consequent, vars, functions);
            if let Some(alternate) = alternate {
                collect_from(alternate, vars, functions);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
            collect_from(body, vars, functions)
        }
        Stmt::For { init, body, .. } => {
            if let Some(ForInit::Var(declarations)) = init {
                vars.extend(declarations.iter().map(|(name, _)| name.clone()));
            }
            collect_from(body, vars, functions);
        }
        Stmt::ForIn { target, body, .. } => {
            if let ForInTarget::Var(name) = target {
                vars.push(name.clone());
            }
            collect_from(body, vars, functions);
        }
        Stmt::Try {
            block,
            handler,
            finalizer,
        } => {
            collect_declarations(block, vars, functions);
            if let Some(handler) = handler {
                collect_declarations(&handler.body, vars, functions);
            }
            if let Some(finalizer) = finalizer {
                collect_declarations(finalizer, vars, functions);
            }
        }
        Stmt::Expr(_)
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Return(_)
        | Stmt::Throw(_)
        | Stmt::Empty => {}
    }
}
