//! Tree-walking interpreter over the script AST.

use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::rc::Rc;

use tracing::debug;

use super::ast::{DeclKind, Expr, ExprKind, FunctionDecl, LogicalOp, Program, Stmt, UnaryOp, UpdateOp};
use super::builtins::{self, Native};
use super::error::{ScriptError, ScriptErrorKind};
use super::parser::parse;
use super::value::{Value, binary};
use crate::environment::Environment;
use crate::runner::{Evaluator, OUTPUT};
use crate::token::Span;

/// Default limit on nested script function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// The built-in evaluator.
///
/// Parses a fragment and runs it with the environment as global scope.
///
/// ```
/// use ecogen::{Engine, Environment, Evaluator, Value};
///
/// let mut env = Environment::new();
/// Engine::new().execute("let x = 2 ** 3;", &mut env).unwrap();
/// assert_eq!(env.get("x"), Some(&Value::from(8)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    max_call_depth: usize,
}

impl Engine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Set how deeply script functions may call each other.
    #[must_use]
    pub const fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Run an already parsed program against `env`.
    pub fn run(&self, program: &Program, env: &mut Environment) -> Result<(), ScriptError> {
        let mut interp = Interpreter::new(env, self.max_call_depth);
        interp.hoist(&program.body);
        interp.exec_statements(&program.body)?;
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for Engine {
    fn execute(&self, code: &str, env: &mut Environment) -> Result<(), ScriptError> {
        let program = parse(code)?;
        debug!(statements = program.body.len(), "script parsed");
        self.run(&program, env)
    }
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    constant: bool,
}

impl Binding {
    const fn new(value: Value, constant: bool) -> Self {
        Self { value, constant }
    }
}

type Scope = HashMap<String, Binding>;

/// How a statement finished.
#[derive(Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Index of the parameter frame while a function runs. Scope 0 only
/// holds the function's own name so the body may shadow it.
const FRAME: usize = 1;

struct Interpreter<'e> {
    env: &'e mut Environment,
    /// `let`/`const` names declared directly in the environment during
    /// this run, and whether they are constant.
    lexical: HashMap<String, bool>,
    scopes: Vec<Scope>,
    in_function: bool,
    depth: usize,
    max_depth: usize,
}

impl<'e> Interpreter<'e> {
    fn new(env: &'e mut Environment, max_depth: usize) -> Self {
        Self {
            env,
            lexical: HashMap::new(),
            scopes: Vec::new(),
            in_function: false,
            depth: 0,
            max_depth,
        }
    }

    // -- Bindings --

    fn lookup(&self, name: &str, span: Span) -> Result<Value, ScriptError> {
        if let Some(binding) = self.scopes.iter().rev().find_map(|s| s.get(name)) {
            return Ok(binding.value.clone());
        }
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }
        builtins::global(name).ok_or_else(|| {
            ScriptError::new(ScriptErrorKind::UndefinedVariable(name.to_string()), span)
        })
    }

    fn declare(
        &mut self,
        kind: DeclKind,
        name: &str,
        value: Value,
        span: Span,
    ) -> Result<(), ScriptError> {
        let redeclared = || ScriptError::new(ScriptErrorKind::Redeclaration(name.to_string()), span);

        match kind {
            DeclKind::Var if self.in_function => {
                self.scopes[FRAME].insert(name.to_string(), Binding::new(value, false));
            }
            DeclKind::Var => self.env.set(name, value),
            DeclKind::Let | DeclKind::Const => {
                let constant = kind == DeclKind::Const;
                if let Some(scope) = self.scopes.last_mut() {
                    if scope.contains_key(name) {
                        return Err(redeclared());
                    }
                    scope.insert(name.to_string(), Binding::new(value, constant));
                } else {
                    if self.lexical.contains_key(name) {
                        return Err(redeclared());
                    }
                    self.lexical.insert(name.to_string(), constant);
                    self.env.set(name, value);
                }
            }
        }
        Ok(())
    }

    fn assign_variable(&mut self, name: &str, value: Value, span: Span) -> Result<(), ScriptError> {
        let const_error =
            || ScriptError::new(ScriptErrorKind::ConstAssignment(name.to_string()), span);

        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.get_mut(name) {
                if binding.constant {
                    return Err(const_error());
                }
                binding.value = value;
                return Ok(());
            }
        }
        if self.lexical.get(name) == Some(&true) {
            return Err(const_error());
        }
        // undeclared names become environment variables
        self.env.set(name, value);
        Ok(())
    }

    fn variable_mut(&mut self, name: &str, span: Span) -> Result<&mut Value, ScriptError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.get_mut(name) {
                return Ok(&mut binding.value);
            }
        }
        self.env.get_mut(name).ok_or_else(|| {
            ScriptError::new(ScriptErrorKind::UndefinedVariable(name.to_string()), span)
        })
    }

    fn hoist(&mut self, body: &[Stmt]) {
        for stmt in body {
            if let Stmt::Function(decl) = stmt {
                let value = Value::Function(decl.clone());
                match self.scopes.last_mut() {
                    Some(scope) => {
                        scope.insert(decl.name.clone(), Binding::new(value, false));
                    }
                    None => self.env.set(decl.name.as_str(), value),
                }
            }
        }
    }

    // -- Places --

    /// Split an assignable expression into its root variable and the
    /// member keys below it, evaluating index expressions on the way.
    fn resolve_place(&mut self, expr: &Expr) -> Result<(String, Vec<Value>), ScriptError> {
        match &expr.kind {
            ExprKind::Ident(name) => Ok((name.clone(), Vec::new())),
            ExprKind::Member { object, property } => {
                let (root, mut keys) = self.resolve_place(object)?;
                keys.push(Value::Str(property.clone()));
                Ok((root, keys))
            }
            ExprKind::Index { object, index } => {
                let (root, mut keys) = self.resolve_place(object)?;
                keys.push(self.eval(index)?);
                Ok((root, keys))
            }
            _ => Err(ScriptError::new(
                ScriptErrorKind::InvalidAssignmentTarget,
                expr.span,
            )),
        }
    }

    fn read_place(&self, root: &str, keys: &[Value], span: Span) -> Result<Value, ScriptError> {
        let mut value = self.lookup(root, span)?;
        for key in keys {
            value = builtins::get_index(&value, key).map_err(|kind| ScriptError::new(kind, span))?;
        }
        Ok(value)
    }

    fn place_mut(
        &mut self,
        root: &str,
        keys: &[Value],
        span: Span,
    ) -> Result<&mut Value, ScriptError> {
        let mut slot = self.variable_mut(root, span)?;
        for key in keys {
            slot = builtins::index_mut(slot, key).map_err(|kind| ScriptError::new(kind, span))?;
        }
        Ok(slot)
    }

    fn write_place(
        &mut self,
        root: &str,
        keys: &[Value],
        value: Value,
        span: Span,
    ) -> Result<(), ScriptError> {
        let Some((last, path)) = keys.split_last() else {
            return self.assign_variable(root, value, span);
        };
        let slot = self.place_mut(root, path, span)?;
        builtins::set_index(slot, last, value).map_err(|kind| ScriptError::new(kind, span))
    }

    // -- Statements --

    fn exec_statements(&mut self, body: &[Stmt]) -> Result<Flow, ScriptError> {
        for stmt in body {
            let flow = self.exec(stmt)?;
            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, ScriptError> {
        self.scopes.push(Scope::new());
        self.hoist(body);
        let flow = self.exec_statements(body);
        self.scopes.pop();
        flow
    }

    /// Run a statement in its own scope, as loop bodies do.
    fn exec_scoped(&mut self, stmt: &Stmt) -> Result<Flow, ScriptError> {
        match stmt {
            Stmt::Block(body) => self.exec_block(body),
            other => {
                self.scopes.push(Scope::new());
                let flow = self.exec(other);
                self.scopes.pop();
                flow
            }
        }
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, ScriptError> {
        match stmt {
            Stmt::Decl { kind, declarators } => {
                for decl in declarators {
                    let value = match &decl.init {
                        Some(init) => self.eval(init)?,
                        None => Value::Undefined,
                    };
                    self.declare(*kind, &decl.name, value, decl.span)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.exec_scoped(then)
                } else if let Some(otherwise) = otherwise {
                    self.exec_scoped(otherwise)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval(cond)?.is_truthy() {
                    match self.exec_scoped(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { body, cond } => {
                loop {
                    match self.exec_scoped(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.eval(cond)?.is_truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                self.scopes.push(Scope::new());
                let flow = self.exec_for(init.as_deref(), cond.as_ref(), update.as_ref(), body);
                self.scopes.pop();
                flow
            }
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            } => self.exec_for_of(*kind, name, iterable, body),
            Stmt::Block(body) => self.exec_block(body),
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<Flow, ScriptError> {
        if let Some(init) = init {
            self.exec(init)?;
        }
        loop {
            if let Some(cond) = cond
                && !self.eval(cond)?.is_truthy()
            {
                break;
            }
            match self.exec_scoped(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(update) = update {
                self.eval(update)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for_of(
        &mut self,
        kind: DeclKind,
        name: &str,
        iterable: &Expr,
        body: &Stmt,
    ) -> Result<Flow, ScriptError> {
        let items = match self.eval(iterable)? {
            Value::Array(items) => items,
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            other => {
                return Err(ScriptError::new(
                    ScriptErrorKind::Type(format!("{} is not iterable", other.type_name())),
                    iterable.span,
                ));
            }
        };

        for item in items {
            self.scopes.push(Scope::new());
            let flow = self
                .declare(kind, name, item, iterable.span)
                .and_then(|()| self.exec_scoped(body));
            self.scopes.pop();
            match flow? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    // -- Expressions --

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        let span = expr.span;
        let fail = |kind| ScriptError::new(kind, span);

        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Undefined => Ok(Value::Undefined),
            ExprKind::Ident(name) => self.lookup(name, span),
            ExprKind::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?;
                Ok(Value::Array(items))
            }
            ExprKind::Object(fields) => {
                let mut map = BTreeMap::new();
                for (key, value) in fields {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::Object(map))
            }
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Ok(binary(*op, &lhs, &rhs))
            }
            ExprKind::Logical { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let short_circuit = match op {
                    LogicalOp::And => !lhs.is_truthy(),
                    LogicalOp::Or => lhs.is_truthy(),
                    LogicalOp::Nullish => !lhs.is_nullish(),
                };
                if short_circuit { Ok(lhs) } else { self.eval(rhs) }
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            ExprKind::Assign { op, target, value } => {
                let (root, keys) = self.resolve_place(target)?;
                let value = match op {
                    None => self.eval(value)?,
                    Some(op) => {
                        let current = self.read_place(&root, &keys, span)?;
                        let rhs = self.eval(value)?;
                        binary(*op, &current, &rhs)
                    }
                };
                self.write_place(&root, &keys, value.clone(), span)?;
                Ok(value)
            }
            ExprKind::Update { op, prefix, target } => {
                let (root, keys) = self.resolve_place(target)?;
                let old = self.read_place(&root, &keys, span)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.write_place(&root, &keys, Value::Number(new), span)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            ExprKind::Member { object, property } => {
                let object = self.eval(object)?;
                builtins::get_member(&object, property).map_err(fail)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                builtins::get_index(&object, &index).map_err(fail)
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, span),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Value, ScriptError> {
        if op == UnaryOp::Typeof {
            let value = match &operand.kind {
                ExprKind::Ident(name) => match self.lookup(name, operand.span) {
                    Err(ScriptError {
                        kind: ScriptErrorKind::UndefinedVariable(_),
                        ..
                    }) => Value::Undefined,
                    other => other?,
                },
                _ => self.eval(operand)?,
            };
            return Ok(Value::Str(value.type_name().to_string()));
        }

        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus | UnaryOp::Typeof => Value::Number(value.to_number()),
        })
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, ScriptError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Result<Value, ScriptError> {
        let ExprKind::Member { object, property } = &callee.kind else {
            let function = self.eval(callee)?;
            let args = self.eval_args(args)?;
            return self.call_value(function, &args, callee, span);
        };

        // array mutators write back into the variable they were read from
        if matches!(property.as_str(), "push" | "pop") && object.is_place() {
            let (root, keys) = self.resolve_place(object)?;
            let args = self.eval_args(args)?;
            let slot = self.place_mut(&root, &keys, span)?;
            if let Value::Array(items) = &mut *slot {
                if property == "pop" {
                    return Ok(items.pop().unwrap_or_default());
                }
                items.extend(args);
                #[allow(clippy::cast_precision_loss)]
                let len = items.len() as f64;
                return Ok(Value::Number(len));
            }
            let receiver = slot.clone();
            return self.call_method(&receiver, property, &args, callee, span);
        }

        let receiver = self.eval(object)?;
        let args = self.eval_args(args)?;
        self.call_method(&receiver, property, &args, callee, span)
    }

    fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Value],
        callee: &Expr,
        span: Span,
    ) -> Result<Value, ScriptError> {
        if let Value::Object(members) = receiver
            && let Some(function) = members.get(name)
        {
            return self.call_value(function.clone(), args, callee, span);
        }
        builtins::call_method(receiver, name, args).map_err(|kind| ScriptError::new(kind, span))
    }

    fn call_value(
        &mut self,
        function: Value,
        args: &[Value],
        callee: &Expr,
        span: Span,
    ) -> Result<Value, ScriptError> {
        match function {
            Value::Function(decl) => self.call_function(&decl, args, span),
            Value::Native(Native::Append) => self.append(args, span),
            Value::Native(native) => {
                builtins::call_native(native, args).map_err(|kind| ScriptError::new(kind, span))
            }
            _ => Err(ScriptError::new(
                ScriptErrorKind::NotCallable(describe(callee)),
                callee.span,
            )),
        }
    }

    fn call_function(
        &mut self,
        decl: &Rc<FunctionDecl>,
        args: &[Value],
        span: Span,
    ) -> Result<Value, ScriptError> {
        if self.depth >= self.max_depth {
            return Err(ScriptError::new(
                ScriptErrorKind::CallDepthExceeded(self.max_depth),
                span,
            ));
        }

        let mut own_name = Scope::new();
        own_name.insert(
            decl.name.clone(),
            Binding::new(Value::Function(decl.clone()), false),
        );
        let frame: Scope = decl
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let value = args.get(i).cloned().unwrap_or_default();
                (param.clone(), Binding::new(value, false))
            })
            .collect();

        let saved_scopes = mem::replace(&mut self.scopes, vec![own_name, frame]);
        let saved_in_function = mem::replace(&mut self.in_function, true);
        self.depth += 1;

        self.hoist(&decl.body);
        let flow = self.exec_statements(&decl.body);

        self.depth -= 1;
        self.in_function = saved_in_function;
        self.scopes = saved_scopes;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Undefined),
        }
    }

    fn append(&mut self, args: &[Value], span: Span) -> Result<Value, ScriptError> {
        match self.env.get_mut(OUTPUT) {
            Some(Value::Str(out)) => {
                for arg in args {
                    out.push_str(&arg.to_display());
                }
                Ok(Value::Undefined)
            }
            _ => Err(ScriptError::new(
                ScriptErrorKind::Type(format!("{OUTPUT} is not a string")),
                span,
            )),
        }
    }
}

/// Name of a callee for error messages: `foo`, `Math.floor`.
fn describe(callee: &Expr) -> String {
    match &callee.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Member { object, property } => format!("{}.{property}", describe(object)),
        ExprKind::Index { object, .. } => format!("{}[...]", describe(object)),
        _ => "expression".to_string(),
    }
}
