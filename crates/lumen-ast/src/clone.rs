//! Structural copy of a [`Program`] with selective rewrites.
//!
//! A [`CloneContext`] pairs a read-only source program with a destination
//! [`ProgramBuilder`]. Transforms register edits (replace, remove, insert,
//! rename) and then clone; every node reached is copied exactly once, with
//! its children cloned in field order before the node itself is appended,
//! so the destination arenas fill in a reproducible order.

use std::collections::HashMap;
use std::hash::Hash;

use crate::arena::Handle;
use crate::attr::Attribute;
use crate::decl::{Function, GlobalDecl, StructMemberDecl, TypeDecl, TypeDeclKind, Variable};
use crate::diagnostic::System;
use crate::expr::{Expression, ExpressionKind};
use crate::program::{Program, ProgramBuilder};
use crate::source::Span;
use crate::stmt::{Statement, StatementKind};
use crate::symbol::Symbol;
use crate::types::{ArrayType, StructMember, StructType, TextureKind, TextureType, Type};

enum Replacement<T> {
    With(Handle<T>),
    Remove,
}

/// Replacement table and clone memo for one node category.
struct Edits<T> {
    cloned: HashMap<Handle<T>, Handle<T>>,
    replaced: HashMap<Handle<T>, Replacement<T>>,
}

impl<T> Default for Edits<T> {
    fn default() -> Self {
        Self {
            cloned: HashMap::new(),
            replaced: HashMap::new(),
        }
    }
}

enum Lookup<T> {
    Replaced(Handle<T>),
    Removed,
    Cloned(Handle<T>),
    Fresh,
}

impl<T> Edits<T> {
    fn lookup(&self, src: Handle<T>) -> Lookup<T> {
        match self.replaced.get(&src) {
            Some(Replacement::With(dst)) => Lookup::Replaced(*dst),
            Some(Replacement::Remove) => Lookup::Removed,
            None => match self.cloned.get(&src) {
                Some(&dst) => Lookup::Cloned(dst),
                None => Lookup::Fresh,
            },
        }
    }
}

/// Insertions into one kind of list, anchored at a source element or at
/// the front/back of an owner.
struct Splices<A, O, T> {
    before: HashMap<A, Vec<T>>,
    after: HashMap<A, Vec<T>>,
    front: HashMap<O, Vec<T>>,
    back: HashMap<O, Vec<T>>,
}

impl<A, O, T> Default for Splices<A, O, T> {
    fn default() -> Self {
        Self {
            before: HashMap::new(),
            after: HashMap::new(),
            front: HashMap::new(),
            back: HashMap::new(),
        }
    }
}

fn entries<K: Hash + Eq, T: Copy>(map: &HashMap<K, Vec<T>>, key: &K) -> Vec<T> {
    map.get(key).cloned().unwrap_or_default()
}

/// Mediates one clone traversal from a source [`Program`] into a
/// [`ProgramBuilder`].
pub struct CloneContext<'a> {
    src: &'a Program,
    dst: &'a mut ProgramBuilder,
    symbols: HashMap<Symbol, Symbol>,
    renames: HashMap<Symbol, String>,
    types: HashMap<Handle<Type>, Handle<Type>>,
    exprs: Edits<Expression>,
    stmts: Edits<Statement>,
    vars: Edits<Variable>,
    functions: Edits<Function>,
    type_decls: Edits<TypeDecl>,
    attrs: Edits<Attribute>,
    stmt_lists: Splices<Handle<Statement>, Handle<Statement>, Handle<Statement>>,
    param_lists: Splices<Handle<Variable>, Handle<Function>, Handle<Variable>>,
    global_list: Splices<GlobalDecl, (), GlobalDecl>,
}

macro_rules! edit_methods {
    ($($field:ident: $node:ty => $replace:ident, $remove:ident;)*) => {
        $(
            pub fn $replace(&mut self, src: Handle<$node>, dst: Handle<$node>) {
                self.$field.replaced.insert(src, Replacement::With(dst));
            }

            pub fn $remove(&mut self, src: Handle<$node>) {
                self.$field.replaced.insert(src, Replacement::Remove);
            }
        )*
    };
}

impl<'a> CloneContext<'a> {
    pub fn new(src: &'a Program, dst: &'a mut ProgramBuilder) -> Self {
        Self {
            src,
            dst,
            symbols: HashMap::new(),
            renames: HashMap::new(),
            types: HashMap::new(),
            exprs: Edits::default(),
            stmts: Edits::default(),
            vars: Edits::default(),
            functions: Edits::default(),
            type_decls: Edits::default(),
            attrs: Edits::default(),
            stmt_lists: Splices::default(),
            param_lists: Splices::default(),
            global_list: Splices::default(),
        }
    }

    pub fn src(&self) -> &'a Program {
        self.src
    }

    pub fn dst(&mut self) -> &mut ProgramBuilder {
        self.dst
    }

    edit_methods! {
        exprs: Expression => replace_expr, remove_expr;
        stmts: Statement => replace_stmt, remove_stmt;
        vars: Variable => replace_var, remove_var;
        functions: Function => replace_function, remove_function;
        type_decls: TypeDecl => replace_type_decl, remove_type_decl;
        attrs: Attribute => replace_attr, remove_attr;
    }

    pub fn insert_stmt_before(&mut self, anchor: Handle<Statement>, stmt: Handle<Statement>) {
        self.stmt_lists.before.entry(anchor).or_default().push(stmt);
    }

    pub fn insert_stmt_after(&mut self, anchor: Handle<Statement>, stmt: Handle<Statement>) {
        self.stmt_lists.after.entry(anchor).or_default().push(stmt);
    }

    /// Prepends `stmt` to the source block `block`. Repeated calls keep
    /// their call order.
    pub fn insert_block_front(&mut self, block: Handle<Statement>, stmt: Handle<Statement>) {
        self.stmt_lists.front.entry(block).or_default().push(stmt);
    }

    pub fn insert_block_back(&mut self, block: Handle<Statement>, stmt: Handle<Statement>) {
        self.stmt_lists.back.entry(block).or_default().push(stmt);
    }

    pub fn insert_param_before(&mut self, anchor: Handle<Variable>, param: Handle<Variable>) {
        self.param_lists.before.entry(anchor).or_default().push(param);
    }

    pub fn insert_param_after(&mut self, anchor: Handle<Variable>, param: Handle<Variable>) {
        self.param_lists.after.entry(anchor).or_default().push(param);
    }

    pub fn insert_param_front(&mut self, function: Handle<Function>, param: Handle<Variable>) {
        self.param_lists.front.entry(function).or_default().push(param);
    }

    pub fn insert_param_back(&mut self, function: Handle<Function>, param: Handle<Variable>) {
        self.param_lists.back.entry(function).or_default().push(param);
    }

    pub fn insert_global_before(&mut self, anchor: GlobalDecl, decl: GlobalDecl) {
        self.global_list.before.entry(anchor).or_default().push(decl);
    }

    pub fn insert_global_after(&mut self, anchor: GlobalDecl, decl: GlobalDecl) {
        self.global_list.after.entry(anchor).or_default().push(decl);
    }

    pub fn insert_global_front(&mut self, decl: GlobalDecl) {
        self.global_list.front.entry(()).or_default().push(decl);
    }

    pub fn insert_global_back(&mut self, decl: GlobalDecl) {
        self.global_list.back.entry(()).or_default().push(decl);
    }

    /// Every reference to `symbol` cloned from now on uses `name`.
    pub fn rename(&mut self, symbol: Symbol, name: impl Into<String>) {
        self.renames.insert(symbol, name.into());
        self.symbols.remove(&symbol);
    }

    /// Interns a name free in both the source and the destination.
    pub fn unique_symbol(&mut self, prefix: &str) -> Symbol {
        let taken = |ctx: &Self, name: &str| {
            ctx.src.symbols().get(name).is_some() || ctx.dst.symbols().get(name).is_some()
        };
        if !taken(self, prefix) {
            return self.dst.sym(prefix);
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{prefix}_{n}");
            if !taken(self, &candidate) {
                return self.dst.sym(&candidate);
            }
            n += 1;
        }
    }

    pub fn clone_symbol(&mut self, symbol: Symbol) -> Symbol {
        if let Some(&dst) = self.symbols.get(&symbol) {
            return dst;
        }
        let text = match self.renames.get(&symbol) {
            Some(name) => name.clone(),
            None => self.src.symbols().name_for(symbol).to_owned(),
        };
        let dst = self.dst.sym(&text);
        self.symbols.insert(symbol, dst);
        dst
    }

    pub fn clone_type(&mut self, ty: Handle<Type>) -> Handle<Type> {
        if let Some(&dst) = self.types.get(&ty) {
            return dst;
        }
        let src = self.src;
        let cloned = match &src.types()[ty] {
            Type::Pointer {
                pointee,
                space,
                access,
            } => Type::Pointer {
                pointee: self.clone_type(*pointee),
                space: *space,
                access: *access,
            },
            Type::Array(array) => Type::Array(ArrayType {
                elem: self.clone_type(array.elem),
                ..*array
            }),
            Type::Texture(TextureType { dim, kind }) => Type::Texture(TextureType {
                dim: *dim,
                kind: match *kind {
                    TextureKind::Sampled(elem) => TextureKind::Sampled(self.clone_type(elem)),
                    TextureKind::Multisampled(elem) => {
                        TextureKind::Multisampled(self.clone_type(elem))
                    }
                    other => other,
                },
            }),
            Type::Struct(st) => {
                let name = self.clone_symbol(st.name);
                let members = st
                    .members
                    .iter()
                    .map(|m| {
                        let name = self.clone_symbol(m.name);
                        let ty = self.clone_type(m.ty);
                        StructMember {
                            name,
                            ty,
                            offset: m.offset,
                            size: m.size,
                            align: m.align,
                        }
                    })
                    .collect();
                Type::Struct(StructType {
                    name,
                    members,
                    size: st.size,
                    align: st.align,
                })
            }
            other => other.clone(),
        };
        let dst = self.dst.types_mut().intern(cloned);
        self.types.insert(ty, dst);
        dst
    }

    fn removed_in_required_position(&mut self, span: Span, what: &str) {
        self.dst.diagnostics_mut().add_error(
            System::Transform,
            span,
            format!("cannot remove {what} from a required position"),
        );
    }

    /// Clones an expression that must exist. Removing it is an error; the
    /// original is copied regardless so the tree stays well formed.
    pub fn clone_expr(&mut self, expr: Handle<Expression>) -> Handle<Expression> {
        match self.map_expr(expr) {
            Some(dst) => dst,
            None => {
                self.removed_in_required_position(self.src[expr].span, "an expression");
                self.copy_expr(expr)
            }
        }
    }

    fn map_expr(&mut self, expr: Handle<Expression>) -> Option<Handle<Expression>> {
        match self.exprs.lookup(expr) {
            Lookup::Replaced(dst) | Lookup::Cloned(dst) => Some(dst),
            Lookup::Removed => None,
            Lookup::Fresh => Some(self.copy_expr(expr)),
        }
    }

    fn map_exprs(&mut self, exprs: &[Handle<Expression>]) -> Vec<Handle<Expression>> {
        exprs.iter().filter_map(|&e| self.map_expr(e)).collect()
    }

    fn copy_expr(&mut self, expr: Handle<Expression>) -> Handle<Expression> {
        if let Some(&dst) = self.exprs.cloned.get(&expr) {
            return dst;
        }
        let src = self.src;
        let node = &src[expr];
        let kind = match &node.kind {
            ExpressionKind::Literal(lit) => ExpressionKind::Literal(*lit),
            ExpressionKind::Identifier(name) => ExpressionKind::Identifier(self.clone_symbol(*name)),
            ExpressionKind::Phony => ExpressionKind::Phony,
            ExpressionKind::Unary { op, expr } => {
                let expr = self.clone_expr(*expr);
                ExpressionKind::Unary { op: *op, expr }
            }
            ExpressionKind::Binary { op, left, right } => {
                let left = self.clone_expr(*left);
                let right = self.clone_expr(*right);
                ExpressionKind::Binary {
                    op: *op,
                    left,
                    right,
                }
            }
            ExpressionKind::Index { base, index } => {
                let base = self.clone_expr(*base);
                let index = self.clone_expr(*index);
                ExpressionKind::Index { base, index }
            }
            ExpressionKind::Member { base, member } => {
                let base = self.clone_expr(*base);
                let member = self.clone_symbol(*member);
                ExpressionKind::Member { base, member }
            }
            ExpressionKind::Call {
                function,
                arguments,
            } => {
                let function = self.clone_symbol(*function);
                let arguments = self.map_exprs(arguments);
                ExpressionKind::Call {
                    function,
                    arguments,
                }
            }
            ExpressionKind::Construct { ty, arguments } => {
                let ty = self.clone_type(*ty);
                let arguments = self.map_exprs(arguments);
                ExpressionKind::Construct { ty, arguments }
            }
            ExpressionKind::Bitcast { ty, expr } => {
                let ty = self.clone_type(*ty);
                let expr = self.clone_expr(*expr);
                ExpressionKind::Bitcast { ty, expr }
            }
        };
        let dst = self.dst.expr(node.span, kind);
        self.exprs.cloned.insert(expr, dst);
        dst
    }

    pub fn clone_stmt(&mut self, stmt: Handle<Statement>) -> Handle<Statement> {
        match self.map_stmt(stmt) {
            Some(dst) => dst,
            None => {
                let span = self.src[stmt].span;
                self.removed_in_required_position(span, "a statement");
                match self.copy_stmt(stmt, true) {
                    Some(dst) => dst,
                    None => self.dst.stmt(span, StatementKind::Block(Vec::new())),
                }
            }
        }
    }

    fn map_stmt(&mut self, stmt: Handle<Statement>) -> Option<Handle<Statement>> {
        match self.stmts.lookup(stmt) {
            Lookup::Replaced(dst) | Lookup::Cloned(dst) => Some(dst),
            Lookup::Removed => None,
            Lookup::Fresh => self.copy_stmt(stmt, false),
        }
    }

    /// Copies a statement. A declaration statement whose variable was
    /// removed, or a call statement whose call was removed, vanishes with
    /// it unless `force` is set.
    fn copy_stmt(&mut self, stmt: Handle<Statement>, force: bool) -> Option<Handle<Statement>> {
        if let Some(&dst) = self.stmts.cloned.get(&stmt) {
            return Some(dst);
        }
        let src = self.src;
        let node = &src[stmt];
        let kind = match &node.kind {
            StatementKind::Block(stmts) => StatementKind::Block(self.clone_block(stmt, stmts)),
            StatementKind::Variable(var) => match self.map_var(*var) {
                Some(var) => StatementKind::Variable(var),
                None if force => StatementKind::Variable(self.clone_var(*var)),
                None => return None,
            },
            StatementKind::Assign { lhs, rhs } => {
                let lhs = self.clone_expr(*lhs);
                let rhs = self.clone_expr(*rhs);
                StatementKind::Assign { lhs, rhs }
            }
            StatementKind::Call(call) => match self.map_expr(*call) {
                Some(call) => StatementKind::Call(call),
                None if force => StatementKind::Call(self.clone_expr(*call)),
                None => return None,
            },
            StatementKind::If {
                condition,
                accept,
                reject,
            } => {
                let condition = self.clone_expr(*condition);
                let accept = self.clone_stmt(*accept);
                let reject = reject.and_then(|r| self.map_stmt(r));
                StatementKind::If {
                    condition,
                    accept,
                    reject,
                }
            }
            StatementKind::Loop { body, continuing } => {
                let body = self.clone_stmt(*body);
                let continuing = continuing.and_then(|c| self.map_stmt(c));
                StatementKind::Loop { body, continuing }
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let init = init.and_then(|s| self.map_stmt(s));
                let condition = condition.and_then(|e| self.map_expr(e));
                let update = update.and_then(|s| self.map_stmt(s));
                let body = self.clone_stmt(*body);
                StatementKind::For {
                    init,
                    condition,
                    update,
                    body,
                }
            }
            StatementKind::Break => StatementKind::Break,
            StatementKind::Continue => StatementKind::Continue,
            StatementKind::Discard => StatementKind::Discard,
            StatementKind::Return(value) => StatementKind::Return(value.and_then(|e| self.map_expr(e))),
        };
        let dst = self.dst.stmt(node.span, kind);
        self.stmts.cloned.insert(stmt, dst);
        Some(dst)
    }

    fn clone_block(&mut self, block: Handle<Statement>, stmts: &[Handle<Statement>]) -> Vec<Handle<Statement>> {
        let mut out = entries(&self.stmt_lists.front, &block);
        for &stmt in stmts {
            out.extend(entries(&self.stmt_lists.before, &stmt));
            out.extend(self.map_stmt(stmt));
            out.extend(entries(&self.stmt_lists.after, &stmt));
        }
        out.extend(entries(&self.stmt_lists.back, &block));
        out
    }

    pub fn clone_var(&mut self, var: Handle<Variable>) -> Handle<Variable> {
        match self.map_var(var) {
            Some(dst) => dst,
            None => {
                self.removed_in_required_position(self.src[var].span, "a variable");
                self.copy_var(var)
            }
        }
    }

    fn map_var(&mut self, var: Handle<Variable>) -> Option<Handle<Variable>> {
        match self.vars.lookup(var) {
            Lookup::Replaced(dst) | Lookup::Cloned(dst) => Some(dst),
            Lookup::Removed => None,
            Lookup::Fresh => Some(self.copy_var(var)),
        }
    }

    fn copy_var(&mut self, var: Handle<Variable>) -> Handle<Variable> {
        if let Some(&dst) = self.vars.cloned.get(&var) {
            return dst;
        }
        let src = self.src;
        let node = &src[var];
        let name = self.clone_symbol(node.name);
        let ty = node.ty.map(|t| self.clone_type(t));
        let init = node.init.and_then(|e| self.map_expr(e));
        let attributes = self.map_attrs(&node.attributes);
        let dst = self.dst.var(Variable {
            span: node.span,
            name,
            kind: node.kind,
            space: node.space,
            access: node.access,
            ty,
            init,
            attributes,
        });
        self.vars.cloned.insert(var, dst);
        dst
    }

    pub fn clone_attr(&mut self, attr: Handle<Attribute>) -> Handle<Attribute> {
        match self.map_attr(attr) {
            Some(dst) => dst,
            None => {
                self.removed_in_required_position(self.src[attr].span, "an attribute");
                self.copy_attr(attr)
            }
        }
    }

    fn map_attr(&mut self, attr: Handle<Attribute>) -> Option<Handle<Attribute>> {
        match self.attrs.lookup(attr) {
            Lookup::Replaced(dst) | Lookup::Cloned(dst) => Some(dst),
            Lookup::Removed => None,
            Lookup::Fresh => Some(self.copy_attr(attr)),
        }
    }

    fn map_attrs(&mut self, attrs: &[Handle<Attribute>]) -> Vec<Handle<Attribute>> {
        attrs.iter().filter_map(|&a| self.map_attr(a)).collect()
    }

    fn copy_attr(&mut self, attr: Handle<Attribute>) -> Handle<Attribute> {
        if let Some(&dst) = self.attrs.cloned.get(&attr) {
            return dst;
        }
        let node = &self.src[attr];
        let dst = self.dst.attr(node.span, node.kind);
        self.attrs.cloned.insert(attr, dst);
        dst
    }

    pub fn clone_function(&mut self, function: Handle<Function>) -> Handle<Function> {
        match self.map_function(function) {
            Some(dst) => dst,
            None => {
                self.removed_in_required_position(self.src[function].span, "a function");
                self.copy_function(function)
            }
        }
    }

    fn map_function(&mut self, function: Handle<Function>) -> Option<Handle<Function>> {
        match self.functions.lookup(function) {
            Lookup::Replaced(dst) | Lookup::Cloned(dst) => Some(dst),
            Lookup::Removed => None,
            Lookup::Fresh => Some(self.copy_function(function)),
        }
    }

    fn copy_function(&mut self, function: Handle<Function>) -> Handle<Function> {
        if let Some(&dst) = self.functions.cloned.get(&function) {
            return dst;
        }
        let src = self.src;
        let node = &src[function];
        let name = self.clone_symbol(node.name);

        let mut params = entries(&self.param_lists.front, &function);
        for &param in &node.params {
            params.extend(entries(&self.param_lists.before, &param));
            params.extend(self.map_var(param));
            params.extend(entries(&self.param_lists.after, &param));
        }
        params.extend(entries(&self.param_lists.back, &function));

        let return_type = node.return_type.map(|t| self.clone_type(t));
        let return_attributes = self.map_attrs(&node.return_attributes);
        let body = self.clone_stmt(node.body);
        let attributes = self.map_attrs(&node.attributes);
        let dst = self.dst.function(Function {
            span: node.span,
            name,
            params,
            return_type,
            return_attributes,
            body,
            attributes,
        });
        self.functions.cloned.insert(function, dst);
        dst
    }

    pub fn clone_type_decl(&mut self, decl: Handle<TypeDecl>) -> Handle<TypeDecl> {
        match self.map_type_decl(decl) {
            Some(dst) => dst,
            None => {
                self.removed_in_required_position(self.src[decl].span, "a type declaration");
                self.copy_type_decl(decl)
            }
        }
    }

    fn map_type_decl(&mut self, decl: Handle<TypeDecl>) -> Option<Handle<TypeDecl>> {
        match self.type_decls.lookup(decl) {
            Lookup::Replaced(dst) | Lookup::Cloned(dst) => Some(dst),
            Lookup::Removed => None,
            Lookup::Fresh => Some(self.copy_type_decl(decl)),
        }
    }

    fn copy_type_decl(&mut self, decl: Handle<TypeDecl>) -> Handle<TypeDecl> {
        if let Some(&dst) = self.type_decls.cloned.get(&decl) {
            return dst;
        }
        let src = self.src;
        let node = &src[decl];
        let name = self.clone_symbol(node.name);
        let ty = self.clone_type(node.ty);
        let kind = match &node.kind {
            TypeDeclKind::Alias => TypeDeclKind::Alias,
            TypeDeclKind::Struct { members } => TypeDeclKind::Struct {
                members: members
                    .iter()
                    .map(|m| {
                        let name = self.clone_symbol(m.name);
                        let ty = self.clone_type(m.ty);
                        let attributes = self.map_attrs(&m.attributes);
                        StructMemberDecl {
                            span: m.span,
                            name,
                            ty,
                            attributes,
                        }
                    })
                    .collect(),
            },
        };
        let dst = self.dst.type_decl(TypeDecl {
            span: node.span,
            name,
            ty,
            kind,
        });
        self.type_decls.cloned.insert(decl, dst);
        dst
    }

    fn map_global(&mut self, decl: GlobalDecl) -> Option<GlobalDecl> {
        Some(match decl {
            GlobalDecl::Variable(v) => GlobalDecl::Variable(self.map_var(v)?),
            GlobalDecl::Function(f) => GlobalDecl::Function(self.map_function(f)?),
            GlobalDecl::Type(t) => GlobalDecl::Type(self.map_type_decl(t)?),
        })
    }

    /// Clones every module-scope declaration of the source, applying the
    /// registered edits, and carries over the source's transform history
    /// and diagnostics.
    pub fn clone_program(&mut self) {
        let src = self.src;
        self.dst.inherit(src);

        let mut decls = entries(&self.global_list.front, &());
        for &decl in src.globals() {
            decls.extend(entries(&self.global_list.before, &decl));
            decls.extend(self.map_global(decl));
            decls.extend(entries(&self.global_list.after, &decl));
        }
        decls.extend(entries(&self.global_list.back, &()));

        for decl in decls {
            self.dst.push_global(decl);
        }
    }
}

/// Identity clone of `src`, re-resolved.
pub fn clone_program(src: &Program) -> Program {
    let mut builder = ProgramBuilder::new();
    CloneContext::new(src, &mut builder).clone_program();
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::VariableKind;
    use crate::expr::Literal;
    use crate::types::{AddressSpace, Scalar};

    /// `var<private> g: i32 = 1; fn f() { let a = g; let b = a; }`
    fn sample() -> Program {
        let mut b = ProgramBuilder::new();
        let i32_ty = b.types_mut().scalar(Scalar::I32);
        let names = ["g", "f", "a", "b"].map(|n| b.sym(n));

        let one = b.expr(Span::default(), ExpressionKind::Literal(Literal::I32(1)));
        let g = b.var(Variable {
            span: Span::default(),
            name: names[0],
            kind: VariableKind::Var,
            space: Some(AddressSpace::Private),
            access: None,
            ty: Some(i32_ty),
            init: Some(one),
            attributes: vec![],
        });
        b.push_global(GlobalDecl::Variable(g));

        let mut body = Vec::new();
        for (name, init_name) in [(names[2], names[0]), (names[3], names[2])] {
            let init = b.expr(Span::default(), ExpressionKind::Identifier(init_name));
            let var = b.var(Variable {
                span: Span::default(),
                name,
                kind: VariableKind::Let,
                space: None,
                access: None,
                ty: None,
                init: Some(init),
                attributes: vec![],
            });
            body.push(b.stmt(Span::default(), StatementKind::Variable(var)));
        }
        let body = b.stmt(Span::default(), StatementKind::Block(body));
        let f = b.function(Function {
            span: Span::default(),
            name: names[1],
            params: vec![],
            return_type: None,
            return_attributes: vec![],
            body,
            attributes: vec![],
        });
        b.push_global(GlobalDecl::Function(f));
        b.build()
    }

    #[test]
    fn identity_clone_matches_source() {
        let src = sample();
        assert!(src.is_valid(), "{}", src.diagnostics());
        let copy = clone_program(&src);
        assert!(copy.is_valid());
        assert_eq!(copy.ast().expressions.len(), src.ast().expressions.len());
        assert_eq!(copy.ast().statements.len(), src.ast().statements.len());
        assert_eq!(copy.ast().variables.len(), src.ast().variables.len());
        assert_eq!(copy.globals().len(), 2);
        assert_eq!(crate::dump_program(&copy), crate::dump_program(&src));

        let expr_types = |p: &Program| {
            let mut types: Vec<(&'static str, String)> = p
                .ast()
                .expressions
                .iter()
                .map(|(h, e)| {
                    let ty = p.sem().expr_type(h).expect("expression is resolved");
                    (e.kind.name(), p.types().friendly_name(ty, p.symbols()))
                })
                .collect();
            types.sort();
            types
        };
        let var_types = |p: &Program| {
            let mut types: Vec<(String, String)> = p
                .ast()
                .variables
                .iter()
                .map(|(h, v)| {
                    let ty = p.sem().var_type(h).expect("variable is resolved");
                    (p.name_of(v.name).to_owned(), p.types().friendly_name(ty, p.symbols()))
                })
                .collect();
            types.sort();
            types
        };
        assert!(!expr_types(&src).is_empty());
        assert_eq!(expr_types(&copy), expr_types(&src));
        assert_eq!(var_types(&copy), var_types(&src));
    }

    #[test]
    fn clone_is_memoized() {
        let src = sample();
        let mut dst = ProgramBuilder::new();
        let mut ctx = CloneContext::new(&src, &mut dst);
        let (first, _) = src.ast().expressions.iter().next().unwrap();
        let a = ctx.clone_expr(first);
        let b = ctx.clone_expr(first);
        assert_eq!(a, b);
        assert_eq!(ctx.dst().ast().expressions.len(), 1);
    }

    #[test]
    fn removing_a_declaration_drops_its_statement() {
        let src = sample();
        let f = src.find_function("f").unwrap();
        let body = src[f].body;
        let first = src[body].kind.block_statements()[0];
        let StatementKind::Variable(a) = src[first].kind else {
            panic!("expected Variable");
        };
        let mut dst = ProgramBuilder::new();
        let mut ctx = CloneContext::new(&src, &mut dst);
        ctx.remove_var(a);
        ctx.clone_program();
        let out = dst.build();
        let f = out.find_function("f").unwrap();
        assert_eq!(out[out[f].body].kind.block_statements().len(), 1);
        // `let b = a;` now refers to nothing.
        assert!(!out.is_valid());
        assert_eq!(
            out.diagnostics().first_error().map(|d| d.message.as_str()),
            Some("unknown identifier 'a'")
        );
    }

    #[test]
    fn rename_applies_to_every_reference() {
        let src = sample();
        let g = src.symbols().get("g").unwrap();
        let mut dst = ProgramBuilder::new();
        let mut ctx = CloneContext::new(&src, &mut dst);
        ctx.rename(g, "global_value");
        ctx.clone_program();
        let out = dst.build();
        assert!(out.is_valid(), "{}", out.diagnostics());
        let text = crate::dump_program(&out);
        assert!(text.contains("var<private> global_value: i32 = 1i;"));
        assert!(text.contains("let a = global_value;"));
        assert!(!text.contains("= g;"));
    }

    #[test]
    fn insertions_keep_call_order() {
        let src = sample();
        let f = src.find_function("f").unwrap();
        let body = src[f].body;
        let mut dst = ProgramBuilder::new();
        let mut ctx = CloneContext::new(&src, &mut dst);
        let first = ctx.dst().stmt(Span::default(), StatementKind::Discard);
        let second = ctx.dst().stmt(Span::default(), StatementKind::Return(None));
        ctx.insert_block_front(body, first);
        ctx.insert_block_back(body, second);
        ctx.clone_program();
        let out = dst.build();
        let f = out.find_function("f").unwrap();
        let stmts = out[out[f].body].kind.block_statements();
        assert_eq!(stmts.len(), 4);
        assert_eq!(stmts[0], first);
        assert_eq!(stmts[3], second);
    }

    #[test]
    fn removing_a_required_expression_is_reported() {
        let src = sample();
        let (operand, _) = src
            .ast()
            .expressions
            .iter()
            .find(|(_, e)| matches!(e.kind, ExpressionKind::Identifier(_)))
            .unwrap();
        let mut dst = ProgramBuilder::new();
        let mut ctx = CloneContext::new(&src, &mut dst);
        ctx.remove_expr(operand);
        let kept = ctx.clone_expr(operand);
        assert!(dst.diagnostics().contains_errors());
        assert_eq!(dst.ast().expressions.len(), 1);
        assert_eq!(
            dst[kept].kind,
            ExpressionKind::Identifier(dst.symbols().get("g").unwrap())
        );
    }
}
