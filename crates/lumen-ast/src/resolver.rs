//! Semantic resolution: name binding, expression typing and validation.

use std::collections::{BTreeSet, HashMap};

use crate::arena::Handle;
use crate::attr::{AttributeKind, PipelineStage};
use crate::decl::{Function, GlobalDecl, Variable, VariableKind};
use crate::diagnostic::{Diagnostics, System};
use crate::expr::{BinaryOp, Expression, ExpressionKind, Literal, UnaryOp};
use crate::program::Ast;
use crate::sem::{FunctionInfo, Resolved, SemInfo};
use crate::source::Span;
use crate::stmt::{Statement, StatementKind};
use crate::symbol::{Symbol, SymbolTable};
use crate::types::{AddressSpace, Scalar, TextureKind, Type, TypeStore, VectorSize};

#[derive(Clone, Copy, Debug)]
enum Binding {
    Value(Resolved),
    Type,
}

/// How a builtin function derives its result type.
#[derive(Clone, Copy, Debug)]
enum Returns {
    Nothing,
    FirstArg,
    Scalar(Scalar),
    ElementOfFirst,
    Bool,
    Vec4F32,
    Texel,
    TextureDims,
    AtomicValue,
}

fn builtin_signature(name: &str) -> Option<(usize, usize, Returns)> {
    use Returns::{AtomicValue, Bool, ElementOfFirst, FirstArg, Nothing, Texel, TextureDims, Vec4F32};
    Some(match name {
        "workgroupBarrier" | "storageBarrier" => (0, 0, Nothing),
        "arrayLength" | "textureNumLayers" | "textureNumLevels" | "textureNumSamples" => {
            (1, 1, Returns::Scalar(Scalar::U32))
        }
        "all" | "any" => (1, 1, Bool),
        "abs" | "acos" | "asin" | "atan" | "ceil" | "cos" | "cosh" | "degrees" | "exp"
        | "exp2" | "floor" | "fract" | "inverseSqrt" | "log" | "log2" | "normalize"
        | "radians" | "round" | "saturate" | "sign" | "sin" | "sinh" | "sqrt" | "tan"
        | "tanh" | "trunc" | "countOneBits" | "reverseBits" => (1, 1, FirstArg),
        "atan2" | "max" | "min" | "pow" | "step" | "reflect" | "cross" => (2, 2, FirstArg),
        "clamp" | "mix" | "smoothstep" | "fma" | "faceForward" | "select" => (3, 3, FirstArg),
        "dot" | "distance" => (2, 2, ElementOfFirst),
        "length" | "determinant" => (1, 1, ElementOfFirst),
        "textureSample" => (3, 4, Vec4F32),
        "textureSampleLevel" => (4, 5, Vec4F32),
        "textureLoad" => (2, 4, Texel),
        "textureStore" => (3, 4, Nothing),
        "textureDimensions" => (1, 2, TextureDims),
        "atomicLoad" => (1, 1, AtomicValue),
        "atomicStore" => (2, 2, Nothing),
        "atomicAdd" | "atomicSub" | "atomicMax" | "atomicMin" | "atomicAnd" | "atomicOr"
        | "atomicXor" | "atomicExchange" => (2, 2, AtomicValue),
        _ => return None,
    })
}

struct FunctionState {
    return_type: Option<Handle<Type>>,
    globals: BTreeSet<Handle<Variable>>,
    callees: BTreeSet<Handle<Function>>,
}

pub(crate) struct Resolver<'a> {
    ast: &'a Ast,
    symbols: &'a SymbolTable,
    types: &'a mut TypeStore,
    diagnostics: &'a mut Diagnostics,
    info: SemInfo,
    scopes: Vec<HashMap<Symbol, Binding>>,
    current: Option<FunctionState>,
    loop_depth: u32,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        ast: &'a Ast,
        symbols: &'a SymbolTable,
        types: &'a mut TypeStore,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            ast,
            symbols,
            types,
            diagnostics,
            info: SemInfo::default(),
            scopes: Vec::new(),
            current: None,
            loop_depth: 0,
        }
    }

    pub(crate) fn resolve(mut self) -> SemInfo {
        let ast = self.ast;
        self.scopes.push(HashMap::new());

        // Module-scope names are visible everywhere regardless of order.
        for &decl in &ast.globals {
            let (name, span, binding) = match decl {
                GlobalDecl::Variable(v) => {
                    let var = &ast.variables[v];
                    (var.name, var.span, Binding::Value(Resolved::Variable(v)))
                }
                GlobalDecl::Function(f) => {
                    let func = &ast.functions[f];
                    (func.name, func.span, Binding::Value(Resolved::Function(f)))
                }
                GlobalDecl::Type(t) => {
                    let decl = &ast.type_decls[t];
                    (decl.name, decl.span, Binding::Type)
                }
            };
            self.declare(name, span, binding);
        }

        for &decl in &ast.globals {
            if let GlobalDecl::Variable(v) = decl {
                self.info.module_vars.insert(v);
                self.resolve_variable(v, true);
            }
        }
        for &decl in &ast.globals {
            if let GlobalDecl::Function(f) = decl {
                self.resolve_function(f);
            }
        }

        self.close_call_graph();
        self.info
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.add_error(System::Resolver, span, message);
    }

    fn name(&self, symbol: Symbol) -> &'a str {
        self.symbols.name_for(symbol)
    }

    fn type_name(&self, ty: Handle<Type>) -> String {
        self.types.friendly_name(ty, self.symbols)
    }

    fn declare(&mut self, name: Symbol, span: Span, binding: Binding) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.contains_key(&name) {
            let text = self.symbols.name_for(name);
            self.error(span, format!("redeclaration of '{text}'"));
        } else {
            scope.insert(name, binding);
        }
    }

    fn lookup(&self, name: Symbol) -> Option<Binding> {
        self.scopes.iter().rev().find_map(|s| s.get(&name).copied())
    }

    fn resolve_variable(&mut self, v: Handle<Variable>, module_scope: bool) {
        let ast = self.ast;
        let var = &ast.variables[v];
        let name = self.name(var.name);
        let errors_before = self.diagnostics.error_count();
        let init_ty = var.init.and_then(|e| self.resolve_expr(e));

        let ty = match (var.ty, init_ty) {
            (Some(declared), Some(init)) => {
                if declared != init {
                    let msg = format!(
                        "cannot initialize {} of type '{}' with value of type '{}'",
                        var.kind.keyword(),
                        self.type_name(declared),
                        self.type_name(init)
                    );
                    self.error(var.span, msg);
                }
                Some(declared)
            }
            (Some(declared), None) => Some(declared),
            (None, Some(init)) => Some(init),
            (None, None) => {
                if self.diagnostics.error_count() == errors_before {
                    self.error(var.span, format!("unable to determine type of '{name}'"));
                }
                None
            }
        };

        if let Some(ty) = ty {
            self.info.var_types.insert(v, ty);
            if var.kind == VariableKind::Var {
                let space = match var.space {
                    Some(space) => space,
                    None if matches!(self.types[ty], Type::Sampler(_) | Type::Texture(_)) => {
                        AddressSpace::Handle
                    }
                    None if module_scope => AddressSpace::Private,
                    None => AddressSpace::Function,
                };
                self.info.var_spaces.insert(v, space);
            }
        }

        if !module_scope {
            self.declare(var.name, var.span, Binding::Value(Resolved::Variable(v)));
        }
    }

    fn resolve_function(&mut self, f: Handle<Function>) {
        let ast = self.ast;
        let func = &ast.functions[f];
        let name = self.name(func.name);

        let stage = ast.stage_of(f);
        let workgroup_size = ast.find_attribute(&func.attributes, |k| match k {
            AttributeKind::WorkgroupSize(size) => Some(*size),
            _ => None,
        });
        match (stage, workgroup_size) {
            (Some(PipelineStage::Compute), None) => self.error(
                func.span,
                format!("compute entry point '{name}' must have a @workgroup_size attribute"),
            ),
            (Some(PipelineStage::Vertex | PipelineStage::Fragment) | None, Some(_)) => {
                self.error(func.span, "@workgroup_size is only valid for compute stages")
            }
            _ => {}
        }

        self.current = Some(FunctionState {
            return_type: func.return_type,
            globals: BTreeSet::new(),
            callees: BTreeSet::new(),
        });
        self.scopes.push(HashMap::new());

        for &p in &func.params {
            let param = &ast.variables[p];
            self.declare(param.name, param.span, Binding::Value(Resolved::Variable(p)));
            if let Some(ty) = param.ty {
                self.info.var_types.insert(p, ty);
            }
            if stage.is_some() {
                self.check_io(&param.attributes, param.ty, param.span);
            }
        }
        if stage.is_some() && func.return_type.is_some() {
            self.check_io(&func.return_attributes, func.return_type, func.span);
        }

        for &s in ast.statements[func.body].kind.block_statements() {
            self.resolve_stmt(s);
        }

        self.scopes.pop();
        let state = self.current.take();
        let (globals, callees) = state
            .map(|s| (s.globals, s.callees))
            .unwrap_or_default();
        self.info.functions.insert(
            f,
            FunctionInfo {
                stage,
                workgroup_size,
                callees,
                referenced_globals: globals,
            },
        );
    }

    /// Entry-point inputs and outputs need a `@builtin` or `@location`
    /// unless they are structures.
    fn check_io(&mut self, attrs: &[Handle<crate::attr::Attribute>], ty: Option<Handle<Type>>, span: Span) {
        let Some(ty) = ty else {
            return;
        };
        if matches!(self.types[ty], Type::Struct(_)) {
            return;
        }
        let ast = self.ast;
        let mut has_io = false;
        for &a in attrs {
            match ast.attributes[a].kind {
                AttributeKind::Builtin(builtin) => {
                    has_io = true;
                    let (scalar, size) = builtin.value_shape();
                    let expected = match size {
                        Some(size) => self.types.vector(size, scalar),
                        None => self.types.scalar(scalar),
                    };
                    if expected != ty {
                        let msg = format!(
                            "store type of @builtin({builtin}) must be '{}'",
                            self.type_name(expected)
                        );
                        self.error(ast.attributes[a].span, msg);
                    }
                }
                AttributeKind::Location(_) => has_io = true,
                _ => {}
            }
        }
        if !has_io {
            self.error(span, "missing entry point IO attribute");
        }
    }

    fn close_call_graph(&mut self) {
        let mut handles: Vec<Handle<Function>> = self.info.functions.keys().copied().collect();
        handles.sort();

        loop {
            let mut changed = false;
            for &f in &handles {
                let callees: Vec<_> = self.info.functions[&f].callees.iter().copied().collect();
                let mut globals = BTreeSet::new();
                let mut indirect = BTreeSet::new();
                for c in callees {
                    if let Some(info) = self.info.functions.get(&c) {
                        globals.extend(info.referenced_globals.iter().copied());
                        indirect.extend(info.callees.iter().copied());
                    }
                }
                if let Some(info) = self.info.functions.get_mut(&f) {
                    let before = info.referenced_globals.len() + info.callees.len();
                    info.referenced_globals.extend(globals);
                    info.callees.extend(indirect);
                    changed |= info.referenced_globals.len() + info.callees.len() != before;
                }
            }
            if !changed {
                break;
            }
        }

        let ast = self.ast;
        for &decl in &ast.globals {
            let GlobalDecl::Function(f) = decl else {
                continue;
            };
            if self.info.functions.get(&f).is_some_and(|i| i.callees.contains(&f)) {
                let func = &ast.functions[f];
                let msg = format!("recursion is not permitted: '{}'", self.name(func.name));
                self.error(func.span, msg);
            }
        }
    }

    fn resolve_stmt(&mut self, s: Handle<Statement>) {
        let ast = self.ast;
        let stmt = &ast.statements[s];
        match &stmt.kind {
            StatementKind::Block(stmts) => {
                self.scopes.push(HashMap::new());
                for &inner in stmts {
                    self.resolve_stmt(inner);
                }
                self.scopes.pop();
            }
            StatementKind::Variable(v) => self.resolve_variable(*v, false),
            StatementKind::Assign { lhs, rhs } => self.resolve_assign(*lhs, *rhs),
            StatementKind::Call(e) => {
                self.resolve_expr(*e);
            }
            StatementKind::If {
                condition,
                accept,
                reject,
            } => {
                self.expect_bool(*condition, "if statement");
                self.resolve_stmt(*accept);
                if let Some(reject) = reject {
                    self.resolve_stmt(*reject);
                }
            }
            StatementKind::Loop { body, continuing } => {
                self.loop_depth += 1;
                // `continuing` sees the declarations of the loop body.
                self.scopes.push(HashMap::new());
                for &inner in ast.statements[*body].kind.block_statements() {
                    self.resolve_stmt(inner);
                }
                if let Some(continuing) = continuing {
                    self.resolve_stmt(*continuing);
                }
                self.scopes.pop();
                self.loop_depth -= 1;
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.resolve_stmt(*init);
                }
                if let Some(condition) = condition {
                    self.expect_bool(*condition, "for-loop");
                }
                self.loop_depth += 1;
                if let Some(update) = update {
                    self.resolve_stmt(*update);
                }
                self.resolve_stmt(*body);
                self.loop_depth -= 1;
                self.scopes.pop();
            }
            StatementKind::Break | StatementKind::Continue => {
                if self.loop_depth == 0 {
                    let what = if matches!(stmt.kind, StatementKind::Break) {
                        "break"
                    } else {
                        "continue"
                    };
                    self.error(stmt.span, format!("{what} statement must be in a loop"));
                }
            }
            StatementKind::Discard => {}
            StatementKind::Return(value) => {
                let got = value.and_then(|e| self.resolve_expr(e));
                let expected = self.current.as_ref().and_then(|c| c.return_type);
                let mismatch = match (expected, value) {
                    (None, Some(_)) => true,
                    (Some(_), None) => true,
                    (Some(expected), Some(_)) => got.is_some_and(|g| g != expected),
                    (None, None) => false,
                };
                if mismatch {
                    let got = got.map_or_else(|| "void".to_owned(), |t| self.type_name(t));
                    let expected = expected.map_or_else(|| "void".to_owned(), |t| self.type_name(t));
                    self.error(
                        stmt.span,
                        format!(
                            "return statement type must match its function return type, returned '{got}', expected '{expected}'"
                        ),
                    );
                }
            }
        }
    }

    fn expect_bool(&mut self, condition: Handle<Expression>, construct: &str) {
        let Some(ty) = self.resolve_expr(condition) else {
            return;
        };
        if self.types[ty] != Type::Scalar(Scalar::Bool) {
            let msg = format!("{construct} condition must be bool, got '{}'", self.type_name(ty));
            self.error(self.ast.expressions[condition].span, msg);
        }
    }

    /// The variable an lvalue is rooted at, unless it goes through a
    /// pointer dereference.
    fn root_variable(&self, expr: Handle<Expression>) -> Option<Handle<Variable>> {
        match &self.ast.expressions[expr].kind {
            ExpressionKind::Identifier(_) => self.info.resolved_variable(expr),
            ExpressionKind::Index { base, .. } | ExpressionKind::Member { base, .. } => {
                self.root_variable(*base)
            }
            _ => None,
        }
    }

    fn resolve_assign(&mut self, lhs: Handle<Expression>, rhs: Handle<Expression>) {
        let ast = self.ast;
        if matches!(ast.expressions[lhs].kind, ExpressionKind::Phony) {
            self.resolve_expr(rhs);
            return;
        }
        let lhs_ty = self.resolve_expr(lhs);
        let rhs_ty = self.resolve_expr(rhs);
        let span = ast.expressions[lhs].span;

        if let Some(root) = self.root_variable(lhs) {
            let var = &ast.variables[root];
            match var.kind {
                VariableKind::Let => {
                    self.error(span, format!("cannot assign to let '{}'", self.name(var.name)));
                    return;
                }
                VariableKind::Param => {
                    self.error(span, format!("cannot assign to parameter '{}'", self.name(var.name)));
                    return;
                }
                VariableKind::Var => {}
            }
        }

        if let (Some(l), Some(r)) = (lhs_ty, rhs_ty)
            && l != r
        {
            let msg = format!(
                "cannot assign value of type '{}' to '{}'",
                self.type_name(r),
                self.type_name(l)
            );
            self.error(span, msg);
        }
    }

    fn resolve_expr(&mut self, e: Handle<Expression>) -> Option<Handle<Type>> {
        let ast = self.ast;
        let expr = &ast.expressions[e];
        let span = expr.span;
        let ty = match &expr.kind {
            ExpressionKind::Literal(lit) => Some(self.types.scalar(match lit {
                Literal::Bool(_) => Scalar::Bool,
                Literal::I32(_) => Scalar::I32,
                Literal::U32(_) => Scalar::U32,
                Literal::F32(_) => Scalar::F32,
            })),
            ExpressionKind::Identifier(name) => self.resolve_identifier(e, *name, span),
            ExpressionKind::Phony => {
                self.error(span, "'_' can only be used on the left of an assignment");
                None
            }
            ExpressionKind::Unary { op, expr: inner } => {
                let operand = self.resolve_expr(*inner);
                operand.and_then(|t| self.unary(*op, *inner, t, span))
            }
            ExpressionKind::Binary { op, left, right } => {
                let l = self.resolve_expr(*left);
                let r = self.resolve_expr(*right);
                match (l, r) {
                    (Some(l), Some(r)) => self.binary(*op, l, r, span),
                    _ => None,
                }
            }
            ExpressionKind::Index { base, index } => self.resolve_index(*base, *index),
            ExpressionKind::Member { base, member } => self.resolve_member(*base, *member, span),
            ExpressionKind::Call {
                function,
                arguments,
            } => self.resolve_call(e, *function, arguments, span),
            ExpressionKind::Construct { ty, arguments } => {
                for &arg in arguments {
                    self.resolve_expr(arg);
                }
                Some(*ty)
            }
            ExpressionKind::Bitcast { ty, expr: inner } => {
                if let Some(from) = self.resolve_expr(*inner)
                    && !self.bitcast_compatible(from, *ty)
                {
                    let msg = format!(
                        "cannot bitcast from '{}' to '{}'",
                        self.type_name(from),
                        self.type_name(*ty)
                    );
                    self.error(span, msg);
                }
                Some(*ty)
            }
        };
        if let Some(ty) = ty {
            self.info.expr_types.insert(e, ty);
        }
        ty
    }

    fn resolve_identifier(&mut self, e: Handle<Expression>, name: Symbol, span: Span) -> Option<Handle<Type>> {
        let text = self.name(name);
        match self.lookup(name) {
            Some(Binding::Value(Resolved::Variable(v))) => {
                self.info.resolved.insert(e, Resolved::Variable(v));
                if self.info.module_vars.contains(&v)
                    && let Some(state) = self.current.as_mut()
                {
                    state.globals.insert(v);
                }
                self.info.var_types.get(&v).copied()
            }
            Some(Binding::Value(Resolved::Function(_))) => {
                self.error(span, format!("function '{text}' cannot be used as a value"));
                None
            }
            Some(Binding::Type) => {
                self.error(span, format!("type '{text}' cannot be used as a value"));
                None
            }
            None => {
                self.error(span, format!("unknown identifier '{text}'"));
                None
            }
        }
    }

    fn is_scalar_or_vector(&self, ty: Handle<Type>) -> bool {
        matches!(self.types[ty], Type::Scalar(_) | Type::Vector { .. })
    }

    fn unary(&mut self, op: UnaryOp, operand: Handle<Expression>, ty: Handle<Type>, span: Span) -> Option<Handle<Type>> {
        let scalar = self.types.scalar_of(ty);
        let shaped = self.is_scalar_or_vector(ty);
        let result = match op {
            UnaryOp::Negate if shaped && matches!(scalar, Some(Scalar::I32 | Scalar::F32)) => Some(ty),
            UnaryOp::Not if shaped && scalar == Some(Scalar::Bool) => Some(ty),
            UnaryOp::Complement if shaped && scalar.is_some_and(Scalar::is_integer) => Some(ty),
            UnaryOp::Deref => match self.types[ty] {
                Type::Pointer { pointee, .. } => Some(pointee),
                _ => {
                    let msg = format!("cannot dereference expression of type '{}'", self.type_name(ty));
                    self.error(span, msg);
                    return None;
                }
            },
            UnaryOp::AddressOf => {
                let space = self
                    .root_variable(operand)
                    .filter(|&v| self.ast.variables[v].kind == VariableKind::Var)
                    .and_then(|v| self.info.var_space(v));
                match space {
                    Some(space) => Some(self.types.pointer(ty, space, space.default_access())),
                    None => {
                        self.error(span, "cannot take the address of expression");
                        return None;
                    }
                }
            }
            _ => None,
        };
        if result.is_none() {
            let msg = format!(
                "no matching operator for '{op}' with operand of type '{}'",
                self.type_name(ty)
            );
            self.error(span, msg);
        }
        result
    }

    fn binary(&mut self, op: BinaryOp, l: Handle<Type>, r: Handle<Type>, span: Span) -> Option<Handle<Type>> {
        let same_shape = l == r && self.is_scalar_or_vector(l);
        let scalar = self.types.scalar_of(l);
        let result = match op {
            BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Modulo => self.arithmetic(op, l, r),
            BinaryOp::Equal | BinaryOp::NotEqual if same_shape => Some(self.bool_like(l)),
            _ if op.is_comparison() && same_shape && scalar.is_some_and(Scalar::is_numeric) => {
                Some(self.bool_like(l))
            }
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr
                if l == r && self.types[l] == Type::Scalar(Scalar::Bool) =>
            {
                Some(l)
            }
            _ if op.is_bitwise()
                && same_shape
                && scalar.is_some_and(|s| s.is_integer() || s == Scalar::Bool) =>
            {
                Some(l)
            }
            _ if op.is_shift() && self.shift_compatible(l, r) => Some(l),
            _ => None,
        };
        if result.is_none() {
            let msg = format!(
                "no matching operator for '{op}' with operands of type '{}' and '{}'",
                self.type_name(l),
                self.type_name(r)
            );
            self.error(span, msg);
        }
        result
    }

    fn bool_like(&mut self, ty: Handle<Type>) -> Handle<Type> {
        match self.types[ty] {
            Type::Vector { size, .. } => self.types.vector(size, Scalar::Bool),
            _ => self.types.scalar(Scalar::Bool),
        }
    }

    fn shift_compatible(&self, l: Handle<Type>, r: Handle<Type>) -> bool {
        match (&self.types[l], &self.types[r]) {
            (Type::Scalar(s), Type::Scalar(Scalar::U32)) => s.is_integer(),
            (
                Type::Vector { size: ls, scalar },
                Type::Vector {
                    size: rs,
                    scalar: Scalar::U32,
                },
            ) => ls == rs && scalar.is_integer(),
            _ => false,
        }
    }

    fn arithmetic(&mut self, op: BinaryOp, l: Handle<Type>, r: Handle<Type>) -> Option<Handle<Type>> {
        let lt = self.types[l].clone();
        let rt = self.types[r].clone();
        match (lt, rt) {
            (Type::Scalar(a), Type::Scalar(b)) if a == b && a.is_numeric() => Some(l),
            (Type::Vector { size: a, scalar: sa }, Type::Vector { size: b, scalar: sb })
                if a == b && sa == sb && sa.is_numeric() =>
            {
                Some(l)
            }
            (Type::Vector { scalar: sv, .. }, Type::Scalar(s)) if sv == s && s.is_numeric() => Some(l),
            (Type::Scalar(s), Type::Vector { scalar: sv, .. }) if sv == s && s.is_numeric() => Some(r),
            (Type::Matrix { .. }, Type::Matrix { .. })
                if l == r && matches!(op, BinaryOp::Add | BinaryOp::Subtract) =>
            {
                Some(l)
            }
            _ if op != BinaryOp::Multiply => None,
            (Type::Matrix { columns, rows, scalar }, Type::Vector { size, scalar: sv })
                if size == columns && sv == scalar =>
            {
                Some(self.types.vector(rows, scalar))
            }
            (Type::Vector { size, scalar: sv }, Type::Matrix { columns, rows, scalar })
                if size == rows && sv == scalar =>
            {
                Some(self.types.vector(columns, scalar))
            }
            (
                Type::Matrix {
                    columns: c1,
                    rows: r1,
                    scalar: s1,
                },
                Type::Matrix {
                    columns: c2,
                    rows: r2,
                    scalar: s2,
                },
            ) if r2 == c1 && s1 == s2 => Some(self.types.matrix(c2, r1, s1)),
            (Type::Matrix { scalar, .. }, Type::Scalar(s)) if s == scalar => Some(l),
            (Type::Scalar(s), Type::Matrix { scalar, .. }) if s == scalar => Some(r),
            _ => None,
        }
    }

    fn bitcast_compatible(&self, from: Handle<Type>, to: Handle<Type>) -> bool {
        let width = |t: &Type| match t {
            Type::Scalar(s) if s.is_numeric() => Some(1),
            Type::Vector { size, scalar } if scalar.is_numeric() => Some(size.count()),
            _ => None,
        };
        match (width(&self.types[from]), width(&self.types[to])) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn resolve_index(&mut self, base: Handle<Expression>, index: Handle<Expression>) -> Option<Handle<Type>> {
        let base_ty = self.resolve_expr(base);
        if let Some(index_ty) = self.resolve_expr(index)
            && !matches!(self.types[index_ty], Type::Scalar(Scalar::I32 | Scalar::U32))
        {
            let msg = format!(
                "index must be of type 'i32' or 'u32', found '{}'",
                self.type_name(index_ty)
            );
            self.error(self.ast.expressions[index].span, msg);
        }
        let base_ty = base_ty?;
        let inner = self.types.unwrap_pointer(base_ty);
        match self.types[inner].clone() {
            Type::Array(array) => Some(array.elem),
            Type::Vector { scalar, .. } => Some(self.types.scalar(scalar)),
            Type::Matrix { rows, scalar, .. } => Some(self.types.vector(rows, scalar)),
            _ => {
                let msg = format!("cannot index type '{}'", self.type_name(base_ty));
                self.error(self.ast.expressions[base].span, msg);
                None
            }
        }
    }

    fn resolve_member(&mut self, base: Handle<Expression>, member: Symbol, span: Span) -> Option<Handle<Type>> {
        let base_ty = self.resolve_expr(base)?;
        let inner = self.types.unwrap_pointer(base_ty);
        let text = self.name(member);
        match self.types[inner].clone() {
            Type::Struct(st) => match st.member(member) {
                Some((_, m)) => Some(m.ty),
                None => {
                    self.error(span, format!("struct member '{text}' not found"));
                    None
                }
            },
            Type::Vector { size, scalar } => match swizzle_len(text, size) {
                Some(1) => Some(self.types.scalar(scalar)),
                Some(n) => VectorSize::from_count(n).map(|s| self.types.vector(s, scalar)),
                None => {
                    self.error(span, format!("invalid vector swizzle member '{text}'"));
                    None
                }
            },
            _ => {
                let msg = format!("type '{}' has no member '{text}'", self.type_name(base_ty));
                self.error(span, msg);
                None
            }
        }
    }

    fn resolve_call(
        &mut self,
        e: Handle<Expression>,
        function: Symbol,
        arguments: &[Handle<Expression>],
        span: Span,
    ) -> Option<Handle<Type>> {
        let arg_types: Vec<Option<Handle<Type>>> =
            arguments.iter().map(|&a| self.resolve_expr(a)).collect();
        let name = self.name(function);
        let ast = self.ast;

        match self.lookup(function) {
            Some(Binding::Value(Resolved::Function(f))) => {
                self.info.resolved.insert(e, Resolved::Function(f));
                if let Some(state) = self.current.as_mut() {
                    state.callees.insert(f);
                }
                let callee = &ast.functions[f];
                if !self.check_arity(name, callee.params.len(), callee.params.len(), arguments.len(), span) {
                    return callee.return_type;
                }
                for (i, (&param, arg_ty)) in callee.params.iter().zip(&arg_types).enumerate() {
                    let expected = ast.variables[param].ty;
                    if let (Some(expected), Some(got)) = (expected, *arg_ty)
                        && expected != got
                    {
                        let msg = format!(
                            "type mismatch for argument {} in call to '{name}', expected '{}', got '{}'",
                            i + 1,
                            self.type_name(expected),
                            self.type_name(got)
                        );
                        self.error(ast.expressions[arguments[i]].span, msg);
                    }
                }
                callee.return_type
            }
            Some(_) => {
                self.error(span, format!("cannot call '{name}': it is not a function"));
                None
            }
            None => self.builtin_call(name, &arg_types, span),
        }
    }

    fn check_arity(&mut self, name: &str, min: usize, max: usize, got: usize, span: Span) -> bool {
        if got < min {
            self.error(
                span,
                format!("too few arguments in call to '{name}', expected {min}, got {got}"),
            );
            false
        } else if got > max {
            self.error(
                span,
                format!("too many arguments in call to '{name}', expected {max}, got {got}"),
            );
            false
        } else {
            true
        }
    }

    fn builtin_call(&mut self, name: &str, args: &[Option<Handle<Type>>], span: Span) -> Option<Handle<Type>> {
        let Some((min, max, returns)) = builtin_signature(name) else {
            self.error(span, format!("unknown function '{name}'"));
            return None;
        };
        if !self.check_arity(name, min, max, args.len(), span) {
            return None;
        }
        let first = args.first().copied().flatten();
        match returns {
            Returns::Nothing => None,
            Returns::FirstArg => first,
            Returns::Scalar(s) => Some(self.types.scalar(s)),
            Returns::Bool => Some(self.types.scalar(Scalar::Bool)),
            Returns::ElementOfFirst => {
                let scalar = self.types.scalar_of(first?)?;
                Some(self.types.scalar(scalar))
            }
            Returns::Vec4F32 => Some(self.types.vector(VectorSize::Quad, Scalar::F32)),
            Returns::Texel => {
                let scalar = match self.types[first?] {
                    Type::Texture(tex) => match tex.kind {
                        TextureKind::Sampled(elem) | TextureKind::Multisampled(elem) => {
                            self.types.scalar_of(elem).unwrap_or(Scalar::F32)
                        }
                        TextureKind::Depth => return Some(self.types.scalar(Scalar::F32)),
                        TextureKind::Storage { format, .. } => {
                            let text = format.as_str();
                            if text.ends_with("uint") {
                                Scalar::U32
                            } else if text.ends_with("sint") {
                                Scalar::I32
                            } else {
                                Scalar::F32
                            }
                        }
                    },
                    _ => Scalar::F32,
                };
                Some(self.types.vector(VectorSize::Quad, scalar))
            }
            Returns::TextureDims => {
                use crate::types::TextureDimension as Dim;
                match self.types[first?] {
                    Type::Texture(tex) => Some(match tex.dim {
                        Dim::D1 => self.types.scalar(Scalar::U32),
                        Dim::D3 => self.types.vector(VectorSize::Tri, Scalar::U32),
                        _ => self.types.vector(VectorSize::Bi, Scalar::U32),
                    }),
                    _ => None,
                }
            }
            Returns::AtomicValue => {
                let atomic = first.and_then(|t| match self.types[self.types.unwrap_pointer(t)] {
                    Type::Atomic(s) => Some(s),
                    _ => None,
                });
                match atomic {
                    Some(s) => Some(self.types.scalar(s)),
                    None => {
                        self.error(span, format!("'{name}' expects a pointer to an atomic"));
                        None
                    }
                }
            }
        }
    }
}

/// Number of components selected by a swizzle such as `xy` or `rgba`, if
/// it is valid for a vector of `size`.
fn swizzle_len(text: &str, size: VectorSize) -> Option<u32> {
    let len = text.len();
    if !(1..=4).contains(&len) {
        return None;
    }
    let limit = size.count() as usize;
    let fits = |set: &str| {
        text.chars()
            .all(|c| set.find(c).is_some_and(|i| i < limit))
    };
    if fits("xyzw") || fits("rgba") {
        Some(len as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Function;
    use crate::program::ProgramBuilder;

    fn let_then_assign() -> ProgramBuilder {
        let mut b = ProgramBuilder::new();
        let x = b.sym("x");
        let main = b.sym("main");
        let one = b.expr(Span::default(), ExpressionKind::Literal(Literal::I32(1)));
        let var = b.var(Variable {
            span: Span::default(),
            name: x,
            kind: VariableKind::Let,
            space: None,
            access: None,
            ty: None,
            init: Some(one),
            attributes: vec![],
        });
        let decl = b.stmt(Span::default(), StatementKind::Variable(var));
        let lhs = b.expr(Span::default(), ExpressionKind::Identifier(x));
        let two = b.expr(Span::default(), ExpressionKind::Literal(Literal::I32(2)));
        let assign = b.stmt(Span::default(), StatementKind::Assign { lhs, rhs: two });
        let body = b.stmt(Span::default(), StatementKind::Block(vec![decl, assign]));
        let f = b.function(Function {
            span: Span::default(),
            name: main,
            params: vec![],
            return_type: None,
            return_attributes: vec![],
            body,
            attributes: vec![],
        });
        b.push_global(GlobalDecl::Function(f));
        b
    }

    #[test]
    fn assignment_to_let_is_rejected() {
        let program = let_then_assign().build();
        assert!(!program.is_valid());
        assert_eq!(program.diagnostics().to_string(), "1:1: cannot assign to let 'x'");
    }

    #[test]
    fn swizzles() {
        assert_eq!(swizzle_len("xy", VectorSize::Bi), Some(2));
        assert_eq!(swizzle_len("rgba", VectorSize::Quad), Some(4));
        assert_eq!(swizzle_len("z", VectorSize::Bi), None);
        assert_eq!(swizzle_len("xg", VectorSize::Quad), None);
        assert_eq!(swizzle_len("xxxxx", VectorSize::Quad), None);
    }

    #[test]
    fn unknown_identifier() {
        let mut b = ProgramBuilder::new();
        let name = b.sym("f");
        let missing = b.sym("nope");
        let id = b.expr(Span::default(), ExpressionKind::Identifier(missing));
        let ret = b.stmt(Span::default(), StatementKind::Return(Some(id)));
        let body = b.stmt(Span::default(), StatementKind::Block(vec![ret]));
        let i32_ty = b.types_mut().scalar(Scalar::I32);
        let f = b.function(Function {
            span: Span::default(),
            name,
            params: vec![],
            return_type: Some(i32_ty),
            return_attributes: vec![],
            body,
            attributes: vec![],
        });
        b.push_global(GlobalDecl::Function(f));
        let program = b.build();
        assert_eq!(
            program.diagnostics().first_error().map(|d| d.message.as_str()),
            Some("unknown identifier 'nope'")
        );
    }
}
