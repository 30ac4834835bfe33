//! Recursive-descent parser producing a [`ProgramBuilder`].
//!
//! Every production returns either [`Maybe`] (optional) or [`Expect`]
//! (required). A production that fails reports exactly one diagnostic at
//! the offending token and returns [`Errored`]; callers propagate it with
//! `?` until the translation-unit loop resynchronizes.

use std::collections::HashMap;

use lumen_ast::{
    Access, AddressSpace, Attribute, AttributeKind, BinaryOp, BuiltIn, Expression, ExpressionKind,
    Function, GlobalDecl, Handle, ImageFormat, Literal, Location, PipelineStage, ProgramBuilder,
    SamplerKind, Scalar, Span, Statement, StatementKind, StructMemberDecl, Symbol, System,
    TextureDimension, TextureKind, TextureType, Type, TypeDecl, TypeDeclKind, UnaryOp, Variable,
    VariableKind, VectorSize,
};

use crate::lexer::tokenize;
use crate::token::{Keyword, Token, TokenKind};

/// Parsing stops once this many errors have been reported.
pub const MAX_ERRORS: usize = 25;

/// Deepest nesting of expressions, types and blocks the parser descends
/// into before giving up on a declaration.
pub const MAX_DEPTH: usize = 128;

/// A production failed and has already reported why.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Errored;

/// Result of an optional production.
///
/// `Ok(Some(_))` matched, `Ok(None)` did not apply and consumed nothing,
/// `Err(Errored)` failed after reporting a diagnostic.
pub type Maybe<T> = Result<Option<T>, Errored>;

/// Result of a required production.
pub type Expect<T> = Result<T, Errored>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// End of the most recently consumed token.
    last_end: Location,
    builder: ProgramBuilder,
    /// Type aliases and structs declared so far.
    named_types: HashMap<Symbol, Handle<Type>>,
    depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut builder = ProgramBuilder::new();
        let tokens = tokenize(source, builder.diagnostics_mut());
        Self {
            tokens,
            pos: 0,
            last_end: Location::default(),
            builder,
            named_types: HashMap::new(),
            depth: 0,
        }
    }

    /// `translation_unit : global_decl* EOF`
    pub fn translation_unit(mut self) -> ProgramBuilder {
        while !matches!(self.peek_kind(), TokenKind::Eof | TokenKind::Error) {
            let start = self.pos;
            match self.global_decl() {
                Ok(Some(())) => {}
                Ok(None) => {
                    let _ = self.error_here("unexpected token");
                    self.resync(start);
                }
                Err(Errored) => self.resync(start),
            }
            if self.builder.diagnostics().error_count() >= MAX_ERRORS {
                log::warn!("giving up after {MAX_ERRORS} errors");
                break;
            }
        }
        self.builder
    }

    /// Parses a single type, then returns the builder holding it.
    pub fn standalone_type(mut self) -> (Option<Handle<Type>>, ProgramBuilder) {
        let ty = self.type_decl().ok().flatten();
        (ty, self.builder)
    }

    // ---- token helpers ----

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek_kind() {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    fn begin(&self) -> Location {
        self.peek().span.begin
    }

    fn span_from(&self, begin: Location) -> Span {
        Span::new(begin, self.last_end)
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        self.last_end = token.span.end;
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.at(&TokenKind::Keyword(keyword))
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let matched = self.at(kind);
        if matched {
            self.bump();
        }
        matched
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(&TokenKind::Keyword(keyword))
    }

    fn error_at(&mut self, span: Span, message: impl Into<String>) -> Errored {
        self.builder
            .diagnostics_mut()
            .add_error(System::Parser, span, message);
        Errored
    }

    /// Reports at the current token. A lexer error token was already
    /// reported, so nothing is added for it.
    fn error_here(&mut self, message: impl Into<String>) -> Errored {
        if self.at(&TokenKind::Error) {
            return Errored;
        }
        let span = self.peek().span;
        self.error_at(span, message)
    }

    /// Runs a recursive production one level deeper, failing once
    /// [`MAX_DEPTH`] is reached.
    fn nested<T>(&mut self, production: impl FnOnce(&mut Self) -> Expect<T>) -> Expect<T> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error_here("maximum parser recursive depth reached"));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    fn expect(&mut self, kind: TokenKind, construct: &str) -> Expect<Span> {
        if self.at(&kind) {
            Ok(self.bump().span)
        } else {
            Err(self.error_here(format!("expected '{kind}' for {construct}")))
        }
    }

    fn expect_ident(&mut self, construct: &str) -> Expect<(Symbol, Span)> {
        match self.peek_ident().map(str::to_owned) {
            Some(name) => {
                let span = self.bump().span;
                Ok((self.builder.sym(&name), span))
            }
            None => Err(self.error_here(format!("expected identifier for {construct}"))),
        }
    }

    /// Consumes the `>` closing a template list, splitting `>>` and `>=`.
    fn expect_template_close(&mut self, construct: &str) -> Expect<()> {
        let rest = match self.peek_kind() {
            TokenKind::GreaterThan => {
                self.bump();
                return Ok(());
            }
            TokenKind::ShiftRight => TokenKind::GreaterThan,
            TokenKind::GreaterThanEqual => TokenKind::Equal,
            _ => return Err(self.error_here(format!("expected '>' for {construct}"))),
        };
        let token = &mut self.tokens[self.pos];
        let split = Location::new(token.span.begin.line, token.span.begin.column + 1);
        token.kind = rest;
        token.span.begin = split;
        self.last_end = split;
        Ok(())
    }

    fn int_literal(&mut self, construct: &str) -> Expect<u32> {
        let value = match self.peek_kind() {
            TokenKind::IntI32(v) => u32::try_from(*v).ok(),
            TokenKind::IntU32(v) => Some(*v),
            _ => None,
        };
        match value {
            Some(v) => {
                self.bump();
                Ok(v)
            }
            None => Err(self.error_here(format!(
                "expected non-negative integer literal for {construct}"
            ))),
        }
    }

    /// Skips to the next module-scope declaration keyword at brace depth 0.
    fn resync(&mut self, start: usize) {
        if self.pos == start {
            self.bump();
        }
        let mut depth = self.tokens[..self.pos]
            .iter()
            .fold(0u32, |depth, token| match token.kind {
                TokenKind::BraceLeft => depth + 1,
                TokenKind::BraceRight => depth.saturating_sub(1),
                _ => depth,
            });
        loop {
            match self.peek_kind() {
                TokenKind::Eof | TokenKind::Error => return,
                TokenKind::BraceLeft => depth += 1,
                TokenKind::BraceRight => depth = depth.saturating_sub(1),
                TokenKind::At
                | TokenKind::Keyword(
                    Keyword::Fn | Keyword::Var | Keyword::Let | Keyword::Type | Keyword::Struct,
                ) if depth == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }

    // ---- declarations ----

    fn global_decl(&mut self) -> Maybe<()> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(Some(()));
        }
        let begin = self.begin();
        let attributes = self.attribute_list()?;
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Var) => {
                let var = self.var_decl(begin, attributes)?;
                self.expect(TokenKind::Semicolon, "variable declaration")?;
                self.builder.push_global(GlobalDecl::Variable(var));
            }
            TokenKind::Keyword(Keyword::Fn) => {
                let function = self.function_decl(begin, attributes)?;
                self.builder.push_global(GlobalDecl::Function(function));
            }
            _ if !attributes.is_empty() => {
                return Err(self.error_here("expected declaration after attributes"));
            }
            TokenKind::Keyword(Keyword::Let) => {
                let var = self.let_decl(begin)?;
                self.expect(TokenKind::Semicolon, "let declaration")?;
                self.builder.push_global(GlobalDecl::Variable(var));
            }
            TokenKind::Keyword(Keyword::Type) => self.type_alias(begin)?,
            TokenKind::Keyword(Keyword::Struct) => self.struct_decl(begin)?,
            _ => return Ok(None),
        }
        Ok(Some(()))
    }

    /// `'var' ('<' space (',' access)? '>')? ident (':' type)? ('=' expr)?`
    fn var_decl(
        &mut self,
        begin: Location,
        attributes: Vec<Handle<Attribute>>,
    ) -> Expect<Handle<Variable>> {
        self.bump();
        let (space, access) = if self.eat(&TokenKind::LessThan) {
            let Some(space) = self.peek_ident().and_then(AddressSpace::parse) else {
                return Err(self.error_here("invalid storage class for variable declaration"));
            };
            self.bump();
            let access = if self.eat(&TokenKind::Comma) {
                let Some(access) = self.peek_ident().and_then(Access::parse) else {
                    return Err(
                        self.error_here("invalid access control for variable declaration")
                    );
                };
                self.bump();
                Some(access)
            } else {
                None
            };
            self.expect_template_close("variable declaration")?;
            (Some(space), access)
        } else {
            (None, None)
        };

        let (name, _) = self.expect_ident("variable declaration")?;
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.expect_type("variable declaration")?)
        } else {
            None
        };
        let init = if self.eat(&TokenKind::Equal) {
            Some(self.expect_expression()?)
        } else {
            None
        };
        let span = self.span_from(begin);
        Ok(self.builder.var(Variable {
            span,
            name,
            kind: VariableKind::Var,
            space,
            access,
            ty,
            init,
            attributes,
        }))
    }

    /// `'let' ident (':' type)? '=' expr`
    fn let_decl(&mut self, begin: Location) -> Expect<Handle<Variable>> {
        self.bump();
        let (name, _) = self.expect_ident("let declaration")?;
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.expect_type("let declaration")?)
        } else {
            None
        };
        self.expect(TokenKind::Equal, "let declaration")?;
        let init = self.expect_expression()?;
        let span = self.span_from(begin);
        Ok(self.builder.var(Variable {
            span,
            name,
            kind: VariableKind::Let,
            space: None,
            access: None,
            ty,
            init: Some(init),
            attributes: Vec::new(),
        }))
    }

    /// `'type' ident '=' type ';'`
    fn type_alias(&mut self, begin: Location) -> Expect<()> {
        self.bump();
        let (name, _) = self.expect_ident("type alias")?;
        self.expect(TokenKind::Equal, "type alias")?;
        let ty = self.expect_type("type alias")?;
        self.expect(TokenKind::Semicolon, "type alias")?;

        self.named_types.entry(name).or_insert(ty);
        let span = self.span_from(begin);
        let decl = self.builder.type_decl(TypeDecl {
            span,
            name,
            ty,
            kind: TypeDeclKind::Alias,
        });
        self.builder.push_global(GlobalDecl::Type(decl));
        Ok(())
    }

    /// `'struct' ident '{' (attribute* ident ':' type (',' | ';'))* '}' ';'?`
    fn struct_decl(&mut self, begin: Location) -> Expect<()> {
        self.bump();
        let (name, _) = self.expect_ident("struct declaration")?;
        self.expect(TokenKind::BraceLeft, "struct declaration")?;

        let mut members = Vec::new();
        while !self.eat(&TokenKind::BraceRight) {
            if self.at(&TokenKind::Eof) {
                return Err(self.error_here("expected '}' for struct declaration"));
            }
            let member_begin = self.begin();
            let attributes = self.attribute_list()?;
            let (member_name, _) = self.expect_ident("struct member")?;
            self.expect(TokenKind::Colon, "struct member")?;
            let ty = self.expect_type("struct member")?;
            members.push(StructMemberDecl {
                span: self.span_from(member_begin),
                name: member_name,
                ty,
                attributes,
            });
            if !self.eat(&TokenKind::Comma)
                && !self.eat(&TokenKind::Semicolon)
                && !self.at(&TokenKind::BraceRight)
            {
                return Err(self.error_here("expected ',' for struct member"));
            }
        }
        self.eat(&TokenKind::Semicolon);

        let layout: Vec<(Symbol, Handle<Type>)> = members.iter().map(|m| (m.name, m.ty)).collect();
        let ty = self.builder.types_mut().structure(name, &layout);
        self.named_types.entry(name).or_insert(ty);
        let span = self.span_from(begin);
        let decl = self.builder.type_decl(TypeDecl {
            span,
            name,
            ty,
            kind: TypeDeclKind::Struct { members },
        });
        self.builder.push_global(GlobalDecl::Type(decl));
        Ok(())
    }

    /// `'fn' ident '(' params ')' ('->' attribute* type)? block`
    fn function_decl(
        &mut self,
        begin: Location,
        attributes: Vec<Handle<Attribute>>,
    ) -> Expect<Handle<Function>> {
        self.bump();
        let (name, _) = self.expect_ident("function declaration")?;
        self.expect(TokenKind::ParenLeft, "function declaration")?;

        let mut params = Vec::new();
        while !self.at(&TokenKind::ParenRight) {
            let param_begin = self.begin();
            let param_attributes = self.attribute_list()?;
            let (param_name, _) = self.expect_ident("parameter")?;
            self.expect(TokenKind::Colon, "parameter")?;
            let ty = self.expect_type("parameter")?;
            let span = self.span_from(param_begin);
            params.push(self.builder.var(Variable {
                span,
                name: param_name,
                kind: VariableKind::Param,
                space: None,
                access: None,
                ty: Some(ty),
                init: None,
                attributes: param_attributes,
            }));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::ParenRight, "function declaration")?;

        let (return_type, return_attributes) = if self.eat(&TokenKind::Arrow) {
            let attrs = self.attribute_list()?;
            (Some(self.expect_type("function return type")?), attrs)
        } else {
            (None, Vec::new())
        };
        let body = self.block("function body")?;

        let span = self.span_from(begin);
        Ok(self.builder.function(Function {
            span,
            name,
            params,
            return_type,
            return_attributes,
            body,
            attributes,
        }))
    }

    // ---- attributes ----

    fn attribute_list(&mut self) -> Expect<Vec<Handle<Attribute>>> {
        let mut attrs = Vec::new();
        while self.at(&TokenKind::At) {
            if let Some(attr) = self.attribute()? {
                attrs.push(attr);
            }
        }
        Ok(attrs)
    }

    /// `'@' ident ('(' args ')')?`
    ///
    /// Returns `Ok(None)` for a `@builtin` naming an unknown value: that is
    /// reported as a resolution error and parsing carries on.
    fn attribute(&mut self) -> Expect<Option<Handle<Attribute>>> {
        let begin = self.begin();
        self.bump();
        let Some(name) = self.peek_ident().map(str::to_owned) else {
            return Err(self.error_here("expected identifier for attribute"));
        };
        let name_span = self.bump().span;
        let construct = format!("{name} attribute");

        let kind = if let Some(stage) = PipelineStage::parse(&name) {
            AttributeKind::Stage(stage)
        } else {
            match name.as_str() {
                "group" => AttributeKind::Group(self.attribute_int(&construct)?),
                "binding" => AttributeKind::Binding(self.attribute_int(&construct)?),
                "location" => AttributeKind::Location(self.attribute_int(&construct)?),
                "stride" => AttributeKind::Stride(self.attribute_int(&construct)?),
                "invariant" => AttributeKind::Invariant,
                "builtin" => {
                    let (value, span) = self.attribute_ident(&construct)?;
                    match BuiltIn::parse(&value) {
                        Some(builtin) => AttributeKind::Builtin(builtin),
                        None => {
                            self.builder.diagnostics_mut().add_error(
                                System::Resolver,
                                span,
                                format!("unknown builtin '{value}'"),
                            );
                            return Ok(None);
                        }
                    }
                }
                "stage" => {
                    let (value, span) = self.attribute_ident(&construct)?;
                    match PipelineStage::parse(&value) {
                        Some(stage) => AttributeKind::Stage(stage),
                        None => {
                            return Err(
                                self.error_at(span, format!("invalid value for {construct}"))
                            );
                        }
                    }
                }
                "workgroup_size" => AttributeKind::WorkgroupSize(self.workgroup_size()?),
                _ => return Err(self.error_at(name_span, format!("invalid attribute '{name}'"))),
            }
        };
        let span = self.span_from(begin);
        Ok(Some(self.builder.attr(span, kind)))
    }

    fn attribute_int(&mut self, construct: &str) -> Expect<u32> {
        self.expect(TokenKind::ParenLeft, construct)?;
        let value = self.int_literal(construct)?;
        self.eat(&TokenKind::Comma);
        self.expect(TokenKind::ParenRight, construct)?;
        Ok(value)
    }

    fn attribute_ident(&mut self, construct: &str) -> Expect<(String, Span)> {
        self.expect(TokenKind::ParenLeft, construct)?;
        let Some(value) = self.peek_ident().map(str::to_owned) else {
            return Err(self.error_here(format!("expected identifier for {construct}")));
        };
        let span = self.bump().span;
        self.eat(&TokenKind::Comma);
        self.expect(TokenKind::ParenRight, construct)?;
        Ok((value, span))
    }

    /// `'(' x (',' y (',' z)?)? ','? ')'`; omitted dimensions are 1.
    fn workgroup_size(&mut self) -> Expect<[u32; 3]> {
        const CONSTRUCT: &str = "workgroup_size attribute";
        self.expect(TokenKind::ParenLeft, CONSTRUCT)?;
        let mut size = [1u32; 3];
        for (i, dim) in size.iter_mut().enumerate() {
            if i > 0 && (!self.eat(&TokenKind::Comma) || self.at(&TokenKind::ParenRight)) {
                break;
            }
            let span = self.peek().span;
            let value = self.int_literal(CONSTRUCT)?;
            if value == 0 {
                return Err(self.error_at(span, "workgroup_size argument must be at least 1"));
            }
            *dim = value;
        }
        self.eat(&TokenKind::Comma);
        self.expect(TokenKind::ParenRight, CONSTRUCT)?;
        Ok(size)
    }

    // ---- types ----

    fn expect_type(&mut self, construct: &str) -> Expect<Handle<Type>> {
        match self.type_decl()? {
            Some(ty) => Ok(ty),
            None => Err(self.error_here(format!("missing type for {construct}"))),
        }
    }

    /// `attribute* type_body`, where only `@stride` is accepted.
    fn type_decl(&mut self) -> Maybe<Handle<Type>> {
        self.nested(Self::attributed_type)
    }

    fn attributed_type(&mut self) -> Maybe<Handle<Type>> {
        let mut stride = None;
        for attr in self.attribute_list()? {
            let Attribute { span, kind } = self.builder[attr].clone();
            match kind {
                AttributeKind::Stride(value) => stride = Some((value, span)),
                other => {
                    return Err(self.error_at(span, format!("invalid attribute '{}'", other.name())));
                }
            }
        }

        let Some(ty) = self.type_body(stride.map(|(value, _)| value))? else {
            if stride.is_some() {
                return Err(self.error_here("missing type for stride attribute"));
            }
            return Ok(None);
        };
        if let Some((_, span)) = stride
            && !matches!(self.builder.types()[ty], Type::Array(_))
        {
            return Err(self.error_at(span, "@stride is only valid for array types"));
        }
        Ok(Some(ty))
    }

    fn type_body(&mut self, stride: Option<u32>) -> Maybe<Handle<Type>> {
        let Some(name) = self.peek_ident().map(str::to_owned) else {
            return Ok(None);
        };
        let name_span = self.bump().span;

        if let Some(scalar) = scalar_named(&name) {
            return Ok(Some(self.builder.types_mut().scalar(scalar)));
        }
        if let Some(size) = vector_named(&name) {
            let scalar = self.template_scalar("vector", |_| true)?;
            return Ok(Some(self.builder.types_mut().vector(size, scalar)));
        }
        if let Some((columns, rows)) = matrix_named(&name) {
            let scalar = self.template_scalar("matrix", Scalar::is_float)?;
            return Ok(Some(self.builder.types_mut().matrix(columns, rows, scalar)));
        }
        let ty = match name.as_str() {
            "array" => self.array_type(stride)?,
            "ptr" => self.ptr_type()?,
            "atomic" => {
                let scalar = self.template_scalar("atomic declaration", Scalar::is_integer)?;
                self.builder.types_mut().intern(Type::Atomic(scalar))
            }
            "sampler" => self
                .builder
                .types_mut()
                .intern(Type::Sampler(SamplerKind::Sampler)),
            "sampler_comparison" => self
                .builder
                .types_mut()
                .intern(Type::Sampler(SamplerKind::Comparison)),
            _ => match self.texture_type(&name)? {
                Some(ty) => ty,
                None => match self.named_type(&name) {
                    Some(ty) => ty,
                    None => {
                        return Err(self.error_at(
                            name_span,
                            format!("unknown constructed type '{name}'"),
                        ));
                    }
                },
            },
        };
        Ok(Some(ty))
    }

    fn named_type(&self, name: &str) -> Option<Handle<Type>> {
        let symbol = self.builder.symbols().get(name)?;
        self.named_types.get(&symbol).copied()
    }

    fn is_type_name(&self, name: &str) -> bool {
        is_builtin_type_name(name) || self.named_type(name).is_some()
    }

    /// `'<' T '>'` where `T` must be a scalar accepted by `allowed`.
    fn template_scalar(
        &mut self,
        construct: &str,
        allowed: impl Fn(Scalar) -> bool,
    ) -> Expect<Scalar> {
        self.expect(TokenKind::LessThan, construct)?;
        let span = self.peek().span;
        let elem = self.expect_type(construct)?;
        let scalar = match &self.builder.types()[elem] {
            Type::Scalar(scalar) => Some(*scalar).filter(|s| allowed(*s)),
            _ => None,
        };
        let Some(scalar) = scalar else {
            let name = self
                .builder
                .types()
                .friendly_name(elem, self.builder.symbols());
            return Err(self.error_at(span, format!("invalid element type '{name}' for {construct}")));
        };
        self.expect_template_close(construct)?;
        Ok(scalar)
    }

    /// `array '<' T (',' N)? '>'`; a missing count is a runtime-sized array.
    fn array_type(&mut self, stride: Option<u32>) -> Expect<Handle<Type>> {
        const CONSTRUCT: &str = "array declaration";
        self.expect(TokenKind::LessThan, CONSTRUCT)?;
        let elem = self.expect_type(CONSTRUCT)?;
        let count = if self.eat(&TokenKind::Comma) {
            let span = self.peek().span;
            let count = self.int_literal("array size")?;
            if count == 0 {
                return Err(self.error_at(span, "array size must be greater than 0"));
            }
            count
        } else {
            0
        };
        self.expect_template_close(CONSTRUCT)?;
        Ok(self.builder.types_mut().array(elem, count, stride))
    }

    /// `ptr '<' space ',' T (',' access)? '>'`
    fn ptr_type(&mut self) -> Expect<Handle<Type>> {
        const CONSTRUCT: &str = "ptr declaration";
        self.expect(TokenKind::LessThan, CONSTRUCT)?;
        let Some(space) = self.peek_ident().and_then(AddressSpace::parse) else {
            return Err(self.error_here("invalid storage class for ptr declaration"));
        };
        self.bump();
        self.expect(TokenKind::Comma, CONSTRUCT)?;
        let pointee = self.expect_type(CONSTRUCT)?;
        let access = if self.eat(&TokenKind::Comma) {
            let Some(access) = self.peek_ident().and_then(Access::parse) else {
                return Err(self.error_here("invalid access control for ptr declaration"));
            };
            self.bump();
            access
        } else {
            space.default_access()
        };
        self.expect_template_close(CONSTRUCT)?;
        Ok(self.builder.types_mut().pointer(pointee, space, access))
    }

    /// Sampled, multisampled, depth and storage textures. `Ok(None)` when
    /// `name` is not a texture type.
    fn texture_type(&mut self, name: &str) -> Maybe<Handle<Type>> {
        let (dim, kind) = if let Some(dim) = sampled_texture_dim(name) {
            (dim, TextureKind::Sampled(self.texture_sample_type("sampled")?))
        } else if name == "texture_multisampled_2d" {
            let elem = self.texture_sample_type("multisampled")?;
            (TextureDimension::D2, TextureKind::Multisampled(elem))
        } else if let Some(dim) = depth_texture_dim(name) {
            (dim, TextureKind::Depth)
        } else if let Some(dim) = storage_texture_dim(name) {
            (dim, self.storage_texture_kind()?)
        } else {
            return Ok(None);
        };
        let ty = Type::Texture(TextureType { dim, kind });
        Ok(Some(self.builder.types_mut().intern(ty)))
    }

    /// `'<' T '>'` with `T` one of `f32`, `i32`, `u32`.
    fn texture_sample_type(&mut self, kind: &str) -> Expect<Handle<Type>> {
        let construct = format!("{kind} texture type");
        self.expect(TokenKind::LessThan, &construct)?;
        let span = self.peek().span;
        let Some(elem) = self.type_decl()? else {
            return Err(self.error_here(format!("invalid type for {construct}")));
        };
        if !matches!(
            self.builder.types()[elem],
            Type::Scalar(Scalar::F32 | Scalar::I32 | Scalar::U32)
        ) {
            return Err(self.error_at(span, format!("invalid type for {construct}")));
        }
        self.expect_template_close(&construct)?;
        Ok(elem)
    }

    /// `'<' format (',' access)? '>'`; access defaults to `write`.
    fn storage_texture_kind(&mut self) -> Expect<TextureKind> {
        const CONSTRUCT: &str = "storage texture type";
        self.expect(TokenKind::LessThan, CONSTRUCT)?;
        let Some(format) = self.peek_ident().and_then(ImageFormat::parse) else {
            return Err(self.error_here("invalid format for storage texture type"));
        };
        self.bump();
        let access = if self.eat(&TokenKind::Comma) {
            let Some(access) = self.peek_ident().and_then(Access::parse) else {
                return Err(self.error_here("invalid access control for storage texture type"));
            };
            self.bump();
            access
        } else {
            Access::Write
        };
        self.expect_template_close(CONSTRUCT)?;
        Ok(TextureKind::Storage { format, access })
    }

    // ---- statements ----

    fn block(&mut self, construct: &str) -> Expect<Handle<Statement>> {
        self.nested(|p| {
            let begin = p.begin();
            p.expect(TokenKind::BraceLeft, construct)?;
            let statements = p.statements_until_brace(construct)?;
            let span = p.span_from(begin);
            Ok(p.builder.stmt(span, StatementKind::Block(statements)))
        })
    }

    /// Statements up to and including the closing `}`.
    fn statements_until_brace(&mut self, construct: &str) -> Expect<Vec<Handle<Statement>>> {
        let mut statements = Vec::new();
        loop {
            if self.eat(&TokenKind::BraceRight) {
                return Ok(statements);
            }
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            match self.statement()? {
                Some(stmt) => statements.push(stmt),
                None => return Err(self.error_here(format!("expected '}}' for {construct}"))),
            }
        }
    }

    fn statement(&mut self) -> Maybe<Handle<Statement>> {
        let begin = self.begin();
        let stmt = match self.peek_kind() {
            TokenKind::BraceLeft => self.block("block")?,
            TokenKind::Keyword(Keyword::Return) => {
                self.bump();
                let value = if self.at(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expect_expression()?)
                };
                self.expect(TokenKind::Semicolon, "return statement")?;
                let span = self.span_from(begin);
                self.builder.stmt(span, StatementKind::Return(value))
            }
            TokenKind::Keyword(Keyword::If) => self.if_stmt(begin)?,
            TokenKind::Keyword(Keyword::Loop) => self.loop_stmt(begin)?,
            TokenKind::Keyword(Keyword::For) => self.for_stmt(begin)?,
            TokenKind::Keyword(Keyword::Break) => {
                self.keyword_stmt(begin, StatementKind::Break, "break statement")?
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.keyword_stmt(begin, StatementKind::Continue, "continue statement")?
            }
            TokenKind::Keyword(Keyword::Discard) => {
                self.keyword_stmt(begin, StatementKind::Discard, "discard statement")?
            }
            _ => {
                let Some(stmt) = self.simple_statement()? else {
                    return Ok(None);
                };
                let construct = match self.builder[stmt].kind {
                    StatementKind::Variable(v) if self.builder[v].kind == VariableKind::Let => {
                        "let declaration"
                    }
                    StatementKind::Variable(_) => "variable declaration",
                    StatementKind::Call(_) => "function call",
                    _ => "assignment statement",
                };
                self.expect(TokenKind::Semicolon, construct)?;
                stmt
            }
        };
        Ok(Some(stmt))
    }

    fn keyword_stmt(
        &mut self,
        begin: Location,
        kind: StatementKind,
        construct: &str,
    ) -> Expect<Handle<Statement>> {
        self.bump();
        self.expect(TokenKind::Semicolon, construct)?;
        let span = self.span_from(begin);
        Ok(self.builder.stmt(span, kind))
    }

    /// A declaration, assignment or call, without the trailing `;`.
    fn simple_statement(&mut self) -> Maybe<Handle<Statement>> {
        let begin = self.begin();
        let declared = match self.peek_kind() {
            TokenKind::Keyword(Keyword::Var) => Some(self.var_decl(begin, Vec::new())?),
            TokenKind::Keyword(Keyword::Let) => Some(self.let_decl(begin)?),
            _ => None,
        };
        if let Some(var) = declared {
            let span = self.span_from(begin);
            return Ok(Some(self.builder.stmt(span, StatementKind::Variable(var))));
        }

        let lhs = if self.at(&TokenKind::Underscore) {
            let span = self.bump().span;
            self.builder.expr(span, ExpressionKind::Phony)
        } else {
            match self.unary_expression()? {
                Some(expr) => expr,
                None => return Ok(None),
            }
        };

        let kind = if self.eat(&TokenKind::Equal) {
            let rhs = self.expect_expression()?;
            StatementKind::Assign { lhs, rhs }
        } else if matches!(self.builder[lhs].kind, ExpressionKind::Call { .. }) {
            StatementKind::Call(lhs)
        } else {
            return Err(self.error_here("expected '=' for assignment"));
        };
        let span = self.span_from(begin);
        Ok(Some(self.builder.stmt(span, kind)))
    }

    /// `'if' expr block ('else' (if | block))?`
    fn if_stmt(&mut self, begin: Location) -> Expect<Handle<Statement>> {
        self.bump();
        let condition = self.expect_expression()?;
        let accept = self.block("if statement")?;
        let reject = if self.eat_keyword(Keyword::Else) {
            if self.at_keyword(Keyword::If) {
                let else_if = self.begin();
                Some(self.if_stmt(else_if)?)
            } else {
                Some(self.block("else statement")?)
            }
        } else {
            None
        };
        let span = self.span_from(begin);
        Ok(self.builder.stmt(
            span,
            StatementKind::If {
                condition,
                accept,
                reject,
            },
        ))
    }

    /// `'loop' '{' statement* ('continuing' block)? '}'`
    fn loop_stmt(&mut self, begin: Location) -> Expect<Handle<Statement>> {
        self.bump();
        let body_begin = self.begin();
        self.expect(TokenKind::BraceLeft, "loop")?;
        let mut statements = Vec::new();
        let mut continuing = None;
        loop {
            if self.eat(&TokenKind::BraceRight) {
                break;
            }
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            if self.eat_keyword(Keyword::Continuing) {
                continuing = Some(self.block("continuing statement")?);
                self.expect(TokenKind::BraceRight, "loop")?;
                break;
            }
            match self.statement()? {
                Some(stmt) => statements.push(stmt),
                None => return Err(self.error_here("expected '}' for loop")),
            }
        }
        let body_span = self.span_from(body_begin);
        let body = self.builder.stmt(body_span, StatementKind::Block(statements));
        let span = self.span_from(begin);
        Ok(self
            .builder
            .stmt(span, StatementKind::Loop { body, continuing }))
    }

    /// `'for' '(' init? ';' expr? ';' update? ')' block`
    fn for_stmt(&mut self, begin: Location) -> Expect<Handle<Statement>> {
        self.bump();
        self.expect(TokenKind::ParenLeft, "for loop")?;
        let init = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expect_simple_statement("initializer in for loop")?)
        };
        self.expect(TokenKind::Semicolon, "initializer in for loop")?;
        let condition = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expect_expression()?)
        };
        self.expect(TokenKind::Semicolon, "condition in for loop")?;
        let update = if self.at(&TokenKind::ParenRight) {
            None
        } else {
            Some(self.expect_simple_statement("update in for loop")?)
        };
        self.expect(TokenKind::ParenRight, "for loop")?;
        let body = self.block("for loop")?;
        let span = self.span_from(begin);
        Ok(self.builder.stmt(
            span,
            StatementKind::For {
                init,
                condition,
                update,
                body,
            },
        ))
    }

    fn expect_simple_statement(&mut self, construct: &str) -> Expect<Handle<Statement>> {
        match self.simple_statement()? {
            Some(stmt) => Ok(stmt),
            None => Err(self.error_here(format!("expected statement for {construct}"))),
        }
    }

    // ---- expressions ----

    fn expect_expression(&mut self) -> Expect<Handle<Expression>> {
        match self.expression()? {
            Some(expr) => Ok(expr),
            None => Err(self.error_here("unable to parse expression")),
        }
    }

    fn expression(&mut self) -> Maybe<Handle<Expression>> {
        self.nested(|p| {
            let Some(lhs) = p.unary_expression()? else {
                return Ok(None);
            };
            p.binary_rhs(lhs, 0).map(Some)
        })
    }

    /// Precedence climbing over the binary operators.
    fn binary_rhs(
        &mut self,
        mut lhs: Handle<Expression>,
        min_precedence: u8,
    ) -> Expect<Handle<Expression>> {
        while let Some((op, precedence)) = binary_op(self.peek_kind())
            && precedence >= min_precedence
        {
            self.bump();
            let Some(mut rhs) = self.unary_expression()? else {
                return Err(self.error_here(format!("unable to parse right side of {op} expression")));
            };
            while let Some((_, next)) = binary_op(self.peek_kind())
                && next > precedence
            {
                rhs = self.binary_rhs(rhs, precedence + 1)?;
            }
            let span = self.builder[lhs].span.join(self.builder[rhs].span);
            lhs = self.builder.expr(
                span,
                ExpressionKind::Binary {
                    op,
                    left: lhs,
                    right: rhs,
                },
            );
        }
        Ok(lhs)
    }

    fn unary_expression(&mut self) -> Maybe<Handle<Expression>> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::Complement,
            TokenKind::Star => UnaryOp::Deref,
            TokenKind::And => UnaryOp::AddressOf,
            _ => return self.postfix_expression(),
        };
        let begin = self.begin();
        self.bump();
        if op == UnaryOp::Negate && self.at(&TokenKind::I32MinMagnitude) {
            self.bump();
            let span = self.span_from(begin);
            let min = ExpressionKind::Literal(Literal::I32(i32::MIN));
            return Ok(Some(self.builder.expr(span, min)));
        }
        let Some(expr) = self.nested(Self::unary_expression)? else {
            return Err(self.error_here(format!("unable to parse right side of {op} expression")));
        };
        let span = self.span_from(begin);
        Ok(Some(self.builder.expr(span, ExpressionKind::Unary { op, expr })))
    }

    /// `primary ('[' expr ']' | '.' ident)*`
    fn postfix_expression(&mut self) -> Maybe<Handle<Expression>> {
        let begin = self.begin();
        let Some(mut expr) = self.primary_expression()? else {
            return Ok(None);
        };
        loop {
            let kind = if self.eat(&TokenKind::BracketLeft) {
                let index = self.expect_expression()?;
                self.expect(TokenKind::BracketRight, "index accessor")?;
                ExpressionKind::Index { base: expr, index }
            } else if self.eat(&TokenKind::Period) {
                let (member, _) = self.expect_ident("member accessor")?;
                ExpressionKind::Member { base: expr, member }
            } else {
                return Ok(Some(expr));
            };
            let span = self.span_from(begin);
            expr = self.builder.expr(span, kind);
        }
    }

    fn primary_expression(&mut self) -> Maybe<Handle<Expression>> {
        let begin = self.begin();
        if self.at(&TokenKind::I32MinMagnitude) {
            return Err(self.error_here("integer literal (2147483648) too large"));
        }
        let literal = match self.peek_kind() {
            TokenKind::IntI32(v) => Some(Literal::I32(*v)),
            TokenKind::IntU32(v) => Some(Literal::U32(*v)),
            TokenKind::Float(v) => Some(Literal::F32(*v)),
            TokenKind::Keyword(Keyword::True) => Some(Literal::Bool(true)),
            TokenKind::Keyword(Keyword::False) => Some(Literal::Bool(false)),
            _ => None,
        };
        if let Some(literal) = literal {
            let span = self.bump().span;
            return Ok(Some(self.builder.expr(span, ExpressionKind::Literal(literal))));
        }

        let kind = match self.peek_kind() {
            TokenKind::ParenLeft => {
                self.bump();
                let expr = self.expect_expression()?;
                self.expect(TokenKind::ParenRight, "parenthesized expression")?;
                return Ok(Some(expr));
            }
            TokenKind::Keyword(Keyword::Bitcast) => {
                const CONSTRUCT: &str = "bitcast expression";
                self.bump();
                self.expect(TokenKind::LessThan, CONSTRUCT)?;
                let ty = self.expect_type(CONSTRUCT)?;
                self.expect_template_close(CONSTRUCT)?;
                self.expect(TokenKind::ParenLeft, CONSTRUCT)?;
                let expr = self.expect_expression()?;
                self.expect(TokenKind::ParenRight, CONSTRUCT)?;
                ExpressionKind::Bitcast { ty, expr }
            }
            TokenKind::Ident(name) if self.is_type_name(name) => {
                let ty = self.expect_type("type constructor")?;
                let arguments = self.argument_list("type constructor")?;
                ExpressionKind::Construct { ty, arguments }
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump();
                let symbol = self.builder.sym(&name);
                if self.at(&TokenKind::ParenLeft) {
                    let arguments = self.argument_list("function call")?;
                    ExpressionKind::Call {
                        function: symbol,
                        arguments,
                    }
                } else {
                    ExpressionKind::Identifier(symbol)
                }
            }
            _ => return Ok(None),
        };
        let span = self.span_from(begin);
        Ok(Some(self.builder.expr(span, kind)))
    }

    /// `'(' (expr (',' expr)* ','?)? ')'`
    fn argument_list(&mut self, construct: &str) -> Expect<Vec<Handle<Expression>>> {
        self.expect(TokenKind::ParenLeft, construct)?;
        let mut arguments = Vec::new();
        while !self.at(&TokenKind::ParenRight) {
            arguments.push(self.expect_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::ParenRight, construct)?;
        Ok(arguments)
    }
}

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::OrOr => (BinaryOp::LogicalOr, 1),
        TokenKind::AndAnd => (BinaryOp::LogicalAnd, 2),
        TokenKind::Or => (BinaryOp::Or, 3),
        TokenKind::Xor => (BinaryOp::Xor, 4),
        TokenKind::And => (BinaryOp::And, 5),
        TokenKind::EqualEqual => (BinaryOp::Equal, 6),
        TokenKind::NotEqual => (BinaryOp::NotEqual, 6),
        TokenKind::LessThan => (BinaryOp::Less, 6),
        TokenKind::LessThanEqual => (BinaryOp::LessEqual, 6),
        TokenKind::GreaterThan => (BinaryOp::Greater, 6),
        TokenKind::GreaterThanEqual => (BinaryOp::GreaterEqual, 6),
        TokenKind::ShiftLeft => (BinaryOp::ShiftLeft, 7),
        TokenKind::ShiftRight => (BinaryOp::ShiftRight, 7),
        TokenKind::Plus => (BinaryOp::Add, 8),
        TokenKind::Minus => (BinaryOp::Subtract, 8),
        TokenKind::Star => (BinaryOp::Multiply, 9),
        TokenKind::Slash => (BinaryOp::Divide, 9),
        TokenKind::Percent => (BinaryOp::Modulo, 9),
        _ => return None,
    })
}

fn scalar_named(name: &str) -> Option<Scalar> {
    Some(match name {
        "bool" => Scalar::Bool,
        "i32" => Scalar::I32,
        "u32" => Scalar::U32,
        "f32" => Scalar::F32,
        _ => return None,
    })
}

fn vector_named(name: &str) -> Option<VectorSize> {
    let count = name.strip_prefix("vec")?.parse().ok()?;
    VectorSize::from_count(count)
}

/// `matCxR`
fn matrix_named(name: &str) -> Option<(VectorSize, VectorSize)> {
    let (columns, rows) = name.strip_prefix("mat")?.split_once('x')?;
    let columns = VectorSize::from_count(columns.parse().ok()?)?;
    let rows = VectorSize::from_count(rows.parse().ok()?)?;
    Some((columns, rows))
}

fn sampled_texture_dim(name: &str) -> Option<TextureDimension> {
    Some(match name {
        "texture_1d" => TextureDimension::D1,
        "texture_2d" => TextureDimension::D2,
        "texture_2d_array" => TextureDimension::D2Array,
        "texture_3d" => TextureDimension::D3,
        "texture_cube" => TextureDimension::Cube,
        "texture_cube_array" => TextureDimension::CubeArray,
        _ => return None,
    })
}

fn depth_texture_dim(name: &str) -> Option<TextureDimension> {
    Some(match name {
        "texture_depth_2d" => TextureDimension::D2,
        "texture_depth_2d_array" => TextureDimension::D2Array,
        "texture_depth_cube" => TextureDimension::Cube,
        "texture_depth_cube_array" => TextureDimension::CubeArray,
        _ => return None,
    })
}

fn storage_texture_dim(name: &str) -> Option<TextureDimension> {
    Some(match name {
        "texture_storage_1d" => TextureDimension::D1,
        "texture_storage_2d" => TextureDimension::D2,
        "texture_storage_2d_array" => TextureDimension::D2Array,
        "texture_storage_3d" => TextureDimension::D3,
        _ => return None,
    })
}

fn is_builtin_type_name(name: &str) -> bool {
    matches!(
        name,
        "array" | "ptr" | "atomic" | "sampler" | "sampler_comparison" | "texture_multisampled_2d"
    ) || scalar_named(name).is_some()
        || vector_named(name).is_some()
        || matrix_named(name).is_some()
        || sampled_texture_dim(name).is_some()
        || depth_texture_dim(name).is_some()
        || storage_texture_dim(name).is_some()
}
