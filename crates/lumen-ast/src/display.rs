//! Source-like text dump of a [`Program`].

use crate::Program;
use crate::arena::Handle;
use crate::attr::Attribute;
use crate::decl::{Function, GlobalDecl, TypeDecl, TypeDeclKind, Variable, VariableKind};
use crate::expr::{Expression, ExpressionKind};
use crate::stmt::{Statement, StatementKind};
use crate::types::Type;

/// Prints the module-scope declarations of `program` in source order.
///
/// The output is stable for structurally equal programs, which makes it
/// usable for comparing transform results.
pub fn dump_program(program: &Program) -> String {
    let mut out = String::new();
    for (i, &decl) in program.globals().iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match decl {
            GlobalDecl::Type(t) => dump_type_decl(&mut out, program, &program[t]),
            GlobalDecl::Variable(v) => {
                out.push_str(&format_variable(program, v));
                out.push_str(";\n");
            }
            GlobalDecl::Function(f) => dump_function(&mut out, program, &program[f]),
        }
    }
    out
}

fn type_str(program: &Program, ty: Handle<Type>) -> String {
    program.types().friendly_name(ty, program.symbols())
}

fn attrs_str(program: &Program, attrs: &[Handle<Attribute>]) -> String {
    attrs
        .iter()
        .map(|&a| format!("{} ", program[a].kind))
        .collect()
}

fn dump_type_decl(out: &mut String, program: &Program, decl: &TypeDecl) {
    let name = program.name_of(decl.name);
    match &decl.kind {
        TypeDeclKind::Alias => {
            out.push_str(&format!("type {name} = {};\n", type_str(program, decl.ty)));
        }
        TypeDeclKind::Struct { members } => {
            out.push_str(&format!("struct {name} {{\n"));
            for m in members {
                out.push_str(&format!(
                    "  {}{}: {},\n",
                    attrs_str(program, &m.attributes),
                    program.name_of(m.name),
                    type_str(program, m.ty)
                ));
            }
            out.push_str("};\n");
        }
    }
}

fn format_variable(program: &Program, var: Handle<Variable>) -> String {
    let v = &program[var];
    let mut s = attrs_str(program, &v.attributes);
    match v.kind {
        VariableKind::Var => {
            s.push_str("var");
            match (v.space, v.access) {
                (Some(space), Some(access)) => s.push_str(&format!("<{space}, {access}>")),
                (Some(space), None) => s.push_str(&format!("<{space}>")),
                _ => {}
            }
            s.push(' ');
        }
        VariableKind::Let => s.push_str("let "),
        VariableKind::Param => {}
    }
    s.push_str(program.name_of(v.name));
    if let Some(ty) = v.ty {
        s.push_str(&format!(": {}", type_str(program, ty)));
    }
    if let Some(init) = v.init {
        s.push_str(&format!(" = {}", format_expr(program, init)));
    }
    s
}

fn dump_function(out: &mut String, program: &Program, func: &Function) {
    let attrs = attrs_str(program, &func.attributes);
    if !attrs.is_empty() {
        out.push_str(attrs.trim_end());
        out.push('\n');
    }
    let params: Vec<String> = func
        .params
        .iter()
        .map(|&p| format_variable(program, p))
        .collect();
    out.push_str(&format!(
        "fn {}({})",
        program.name_of(func.name),
        params.join(", ")
    ));
    if let Some(ret) = func.return_type {
        out.push_str(&format!(
            " -> {}{}",
            attrs_str(program, &func.return_attributes),
            type_str(program, ret)
        ));
    }
    out.push(' ');
    dump_block(out, program, func.body, 0);
    out.push('\n');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Writes `{ ... }` for a block statement, leaving the cursor after `}`.
fn dump_block(out: &mut String, program: &Program, block: Handle<Statement>, depth: usize) {
    out.push_str("{\n");
    for &s in program[block].kind.block_statements() {
        indent(out, depth + 1);
        dump_stmt(out, program, s, depth + 1);
        out.push('\n');
    }
    indent(out, depth);
    out.push('}');
}

/// A statement without its trailing `;`, as used in `for (...)` headers.
fn format_simple_stmt(program: &Program, stmt: Handle<Statement>) -> String {
    match &program[stmt].kind {
        StatementKind::Variable(v) => format_variable(program, *v),
        StatementKind::Assign { lhs, rhs } => format!(
            "{} = {}",
            format_expr(program, *lhs),
            format_expr(program, *rhs)
        ),
        StatementKind::Call(e) => format_expr(program, *e),
        other => other.name().to_owned(),
    }
}

fn dump_stmt(out: &mut String, program: &Program, stmt: Handle<Statement>, depth: usize) {
    match &program[stmt].kind {
        StatementKind::Block(_) => dump_block(out, program, stmt, depth),
        StatementKind::Variable(_) | StatementKind::Assign { .. } | StatementKind::Call(_) => {
            out.push_str(&format_simple_stmt(program, stmt));
            out.push(';');
        }
        StatementKind::If {
            condition,
            accept,
            reject,
        } => {
            out.push_str(&format!("if ({}) ", format_expr(program, *condition)));
            dump_block(out, program, *accept, depth);
            if let Some(reject) = reject {
                out.push_str(" else ");
                dump_stmt(out, program, *reject, depth);
            }
        }
        StatementKind::Loop { body, continuing } => {
            out.push_str("loop {\n");
            for &s in program[*body].kind.block_statements() {
                indent(out, depth + 1);
                dump_stmt(out, program, s, depth + 1);
                out.push('\n');
            }
            if let Some(continuing) = continuing {
                indent(out, depth + 1);
                out.push_str("continuing ");
                dump_block(out, program, *continuing, depth + 1);
                out.push('\n');
            }
            indent(out, depth);
            out.push('}');
        }
        StatementKind::For {
            init,
            condition,
            update,
            body,
        } => {
            let init = init.map(|s| format_simple_stmt(program, s)).unwrap_or_default();
            let condition = condition.map(|e| format_expr(program, e)).unwrap_or_default();
            let update = update.map(|s| format_simple_stmt(program, s)).unwrap_or_default();
            out.push_str(&format!("for ({init}; {condition}; {update}) "));
            dump_block(out, program, *body, depth);
        }
        StatementKind::Break => out.push_str("break;"),
        StatementKind::Continue => out.push_str("continue;"),
        StatementKind::Discard => out.push_str("discard;"),
        StatementKind::Return(None) => out.push_str("return;"),
        StatementKind::Return(Some(e)) => {
            out.push_str(&format!("return {};", format_expr(program, *e)));
        }
    }
}

fn format_args(program: &Program, args: &[Handle<Expression>]) -> String {
    args.iter()
        .map(|&a| format_expr(program, a))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats an expression. Binary operations are fully parenthesized.
pub fn format_expr(program: &Program, expr: Handle<Expression>) -> String {
    match &program[expr].kind {
        ExpressionKind::Literal(lit) => lit.to_string(),
        ExpressionKind::Identifier(name) => program.name_of(*name).to_owned(),
        ExpressionKind::Phony => "_".to_owned(),
        ExpressionKind::Unary { op, expr } => {
            let inner = format_expr(program, *expr);
            if matches!(program[*expr].kind, ExpressionKind::Unary { .. }) {
                format!("{op}({inner})")
            } else {
                format!("{op}{inner}")
            }
        }
        ExpressionKind::Binary { op, left, right } => format!(
            "({} {op} {})",
            format_expr(program, *left),
            format_expr(program, *right)
        ),
        ExpressionKind::Index { base, index } => format!(
            "{}[{}]",
            format_expr(program, *base),
            format_expr(program, *index)
        ),
        ExpressionKind::Member { base, member } => {
            format!("{}.{}", format_expr(program, *base), program.name_of(*member))
        }
        ExpressionKind::Call {
            function,
            arguments,
        } => format!(
            "{}({})",
            program.name_of(*function),
            format_args(program, arguments)
        ),
        ExpressionKind::Construct { ty, arguments } => format!(
            "{}({})",
            type_str(program, *ty),
            format_args(program, arguments)
        ),
        ExpressionKind::Bitcast { ty, expr } => format!(
            "bitcast<{}>({})",
            type_str(program, *ty),
            format_expr(program, *expr)
        ),
    }
}
