//! C++ output. The whole program is wrapped in the body of `int main()`;
//! functions become capturing lambdas, so they see every global declared
//! before them.

use std::fmt::Write as _;

use crate::{
    ast::{
        Ast, BinaryOperator, Call, ExprId, ExprKind, FuncDecl, IfPred, Program, ScopeId,
        ScopeStmt, Term, TopLevelStmt, VarDecl, VarInit,
    },
    codegen::{Bindings, Error, Generator, Result},
    intrinsics::Intrinsic,
    types::ValueType,
    util::intern::Interner,
};

const INDENT: &str = "    ";

pub struct TextGenerator<'a> {
    ast: &'a Ast,
    idents: &'a Interner,
    /// Partial outputs of the open scopes. The last one is being written.
    buffers: Vec<String>,
    indent: usize,
    names: Bindings<()>,
}

impl<'a> Generator<'a> for TextGenerator<'a> {
    fn new(ast: &'a Ast, idents: &'a Interner) -> Self {
        TextGenerator {
            ast,
            idents,
            buffers: vec![String::with_capacity(4096)],
            indent: 0,
            names: Bindings::new(),
        }
    }

    fn generate(mut self, program: &Program) -> Result<String> {
        self.out("#include <iostream>");
        self.out("#include <string>");
        self.out("");
        self.out("int main() {");
        self.indent += 1;
        self.out("std::cout << std::boolalpha;");

        let mut entry = None;
        for item in &program.items {
            match item {
                TopLevelStmt::VarImplicit(var) => self.g_var_init(var)?,
                TopLevelStmt::VarExplicit(var) => self.g_var_decl(var)?,
                TopLevelStmt::Func(func) => {
                    self.g_func(func)?;
                    if self.idents.get(func.name.name) == "main" {
                        entry = Some(func);
                    }
                }
            }
        }

        match entry {
            Some(main) if main.ty == ValueType::Int => self.out("return main();"),
            Some(_) => {
                self.out("main();");
                self.out("return 0;");
            }
            None => self.out("return 0;"),
        }
        self.indent -= 1;
        self.out("}");

        debug_assert_eq!(self.buffers.len(), 1, "unbalanced scope buffers");
        Ok(self.buffers.pop().unwrap_or_default())
    }
}

/// Statements.
impl TextGenerator<'_> {
    fn g_var_init(&mut self, var: &VarInit) -> Result<()> {
        let ty = self.ast.expr(var.value).ty;
        let value = self.g_expr(var.value)?;
        self.names.bind(var.name, ())?;
        let name = self.idents.get(var.name.name);
        self.out(format_args!("{} {name} = {value};", type_name(ty)));
        Ok(())
    }

    fn g_var_decl(&mut self, var: &VarDecl) -> Result<()> {
        self.names.bind(var.name, ())?;
        let name = self.idents.get(var.name.name);
        self.out(format_args!("{} {name}{{}};", type_name(var.ty)));
        Ok(())
    }

    /// A typed function may end without reaching a `return`, so its lambda
    /// gets the return type spelled out and falls back to the type's default
    /// value.
    fn g_func(&mut self, func: &FuncDecl) -> Result<()> {
        let name = self.idents.get(func.name.name);
        if func.ty == ValueType::Void {
            self.open(&format!("auto {name} = [&]()"));
        } else {
            self.open(&format!("auto {name} = [&]() -> {}", type_name(func.ty)));
        }
        self.g_stmts(func.body)?;
        if func.ty != ValueType::Void && !self.ast.scope(func.body).ends_with_return() {
            self.out(format_args!("return {}{{}};", type_name(func.ty)));
        }
        self.close(";");
        // Bound after the body: a function can't see itself.
        self.names.bind(func.name, ())
    }

    /// Writes `head {`, the scope statements and `}tail`.
    fn g_block(&mut self, head: &str, scope: ScopeId, tail: &str) -> Result<()> {
        self.open(head);
        self.g_stmts(scope)?;
        self.close(tail);
        Ok(())
    }

    /// Opens a scope. Its statements are collected in a buffer of their own
    /// which is spliced into the enclosing one by [`Self::close`].
    fn open(&mut self, head: &str) {
        if head.is_empty() {
            self.out("{");
        } else {
            self.out(format_args!("{head} {{"));
        }
        self.buffers.push(String::with_capacity(256));
        self.indent += 1;
        self.names.enter();
    }

    fn close(&mut self, tail: &str) {
        self.names.leave();
        self.indent -= 1;
        let body = self.buffers.pop().unwrap_or_default();
        self.current().push_str(&body);
        self.out(format_args!("}}{tail}"));
    }

    fn g_stmts(&mut self, scope: ScopeId) -> Result<()> {
        for stmt in &self.ast.scope(scope).stmts {
            self.g_stmt(stmt)?;
        }
        Ok(())
    }

    fn g_stmt(&mut self, stmt: &ScopeStmt) -> Result<()> {
        match stmt {
            ScopeStmt::Return(expr) => {
                let value = self.g_expr(*expr)?;
                self.out(format_args!("return {value};"));
            }
            ScopeStmt::VarImplicit(var) => self.g_var_init(var)?,
            ScopeStmt::VarExplicit(var) => self.g_var_decl(var)?,
            ScopeStmt::Assign(assign) => {
                self.names.get(assign.target)?;
                let value = self.g_expr(assign.value)?;
                let name = self.idents.get(assign.target.name);
                self.out(format_args!("{name} = {value};"));
            }
            ScopeStmt::Call(call) => {
                let call = self.g_call(call)?;
                self.out(format_args!("{call};"));
            }
            ScopeStmt::Scope(scope) => self.g_block("", *scope, "")?,
            ScopeStmt::Increment(ident) | ScopeStmt::Decrement(ident) => {
                self.names.get(*ident)?;
                let op = if matches!(stmt, ScopeStmt::Increment(_)) {
                    "++"
                } else {
                    "--"
                };
                self.out(format_args!("{}{op};", self.idents.get(ident.name)));
            }
            ScopeStmt::While(stmt) => {
                let cond = self.g_expr(stmt.cond)?;
                self.g_block(&format!("while ({cond})"), stmt.body, "")?;
            }
            ScopeStmt::If(stmt) => {
                let cond = self.g_expr(stmt.cond)?;
                self.g_block(&format!("if ({cond})"), stmt.then, "")?;
                let mut pred = stmt.chain.as_deref();
                while let Some(current) = pred {
                    match current {
                        IfPred::Elif { cond, scope, next } => {
                            let cond = self.g_expr(*cond)?;
                            self.g_block(&format!("else if ({cond})"), *scope, "")?;
                            pred = next.as_deref();
                        }
                        IfPred::Else { scope } => {
                            self.g_block("else", *scope, "")?;
                            pred = None;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Expressions. These are rendered into strings rather than written out.
impl TextGenerator<'_> {
    fn g_expr(&self, id: ExprId) -> Result<String> {
        let expr = self.ast.expr(id);
        let out = match &expr.kind {
            ExprKind::Term(term) => self.g_term(term)?,
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.g_operand(*op, *lhs, false)?;
                let rhs = self.g_operand(*op, *rhs, true)?;
                format!("{lhs} {} {rhs}", op.symbol())
            }
            ExprKind::Not(operand) => {
                let rendered = self.g_expr(*operand)?;
                if self.binary_op(*operand).is_some() {
                    format!("!({rendered})")
                } else {
                    format!("!{rendered}")
                }
            }
            ExprKind::Increment(ident) => {
                self.names.get(*ident)?;
                format!("{}++", self.idents.get(ident.name))
            }
            ExprKind::Decrement(ident) => {
                self.names.get(*ident)?;
                format!("{}--", self.idents.get(ident.name))
            }
        };
        Ok(out)
    }

    /// Renders a binary operand, parenthesized where C++ would otherwise
    /// group it differently.
    fn g_operand(&self, parent: BinaryOperator, child: ExprId, is_rhs: bool) -> Result<String> {
        let out = self.g_expr(child)?;
        let Some(op) = self.binary_op(child) else {
            return Ok(out);
        };
        let needs_parens = op.precedence() < parent.precedence()
            || (is_rhs && op.precedence() == parent.precedence())
            || (op.is_comparison() && parent.is_comparison());
        Ok(if needs_parens { format!("({out})") } else { out })
    }

    fn g_term(&self, term: &Term) -> Result<String> {
        let out = match term {
            Term::Bool(value) => value.to_string(),
            Term::Int(value) => value.to_string(),
            Term::Char(value) => char_literal(*value),
            Term::String(value) => format!("std::string({})", string_literal(value)),
            Term::Ident(ident) => {
                self.names.get(*ident)?;
                self.idents.get(ident.name).to_owned()
            }
            Term::Call(call) => self.g_call(call)?,
            Term::Paren(inner) => self.g_expr(*inner)?,
        };
        Ok(out)
    }

    /// Calls to built-ins are expanded in place; anything else must be a
    /// function bound earlier.
    fn g_call(&self, call: &Call) -> Result<String> {
        let name = self.idents.get(call.name.name);
        let arg_types: Vec<_> = call.args.iter().map(|a| self.ast.expr(*a).ty).collect();
        let intrinsic = Intrinsic::resolve(name, &arg_types)
            .map_err(|e| call.name.line.wrap(Error::Intrinsic(e)))?;

        let Some(intrinsic) = intrinsic else {
            self.names.get(call.name)?;
            return Ok(format!("{name}()"));
        };

        let out = match intrinsic {
            Intrinsic::Print | Intrinsic::Println => {
                let mut out = String::from("std::cout");
                for arg in &call.args {
                    let rendered = self.g_expr(*arg)?;
                    // `<<` binds tighter than comparisons and logical operators.
                    match self.binary_op(*arg) {
                        Some(op) if op.precedence() <= 2 => {
                            out.push_str(&format!(" << ({rendered})"));
                        }
                        _ => out.push_str(&format!(" << {rendered}")),
                    }
                }
                if intrinsic == Intrinsic::Println {
                    out.push_str(" << std::endl");
                }
                out
            }
            Intrinsic::Itoc => format!("(char)({} + '0')", self.g_expr(call.args[0])?),
            Intrinsic::Ctoi => format!("({} - '0')", self.g_expr(call.args[0])?),
        };
        Ok(out)
    }

    /// The operator of a binary expression, looking through parentheses.
    fn binary_op(&self, mut id: ExprId) -> Option<BinaryOperator> {
        loop {
            match &self.ast.expr(id).kind {
                ExprKind::Binary { op, .. } => return Some(*op),
                ExprKind::Term(Term::Paren(inner)) => id = *inner,
                _ => return None,
            }
        }
    }
}

/// Utility functions.
impl TextGenerator<'_> {
    fn current(&mut self) -> &mut String {
        let last = self.buffers.len() - 1;
        &mut self.buffers[last]
    }

    /// Writes an indented line to the current buffer.
    fn out(&mut self, line: impl std::fmt::Display) {
        let indent = INDENT.repeat(self.indent);
        let buf = self.current();
        // Writing into a `String` can't fail.
        let _ = writeln!(buf, "{indent}{line}");
    }
}

const fn type_name(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Void => "void",
        ValueType::Bool => "bool",
        ValueType::Int => "int",
        ValueType::Char => "char",
        ValueType::String => "std::string",
    }
}

fn escape(c: char, quote: char, out: &mut String) {
    match c {
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\0' => out.push_str("\\0"),
        '\\' => out.push_str("\\\\"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_ascii_control() => {
            let _ = write!(out, "\\x{:02x}", c as u32);
        }
        c => out.push(c),
    }
}

fn char_literal(c: char) -> String {
    let mut out = String::from("'");
    escape(c, '\'', &mut out);
    out.push('\'');
    out
}

fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        escape(c, '"', &mut out);
    }
    out.push('"');
    out
}
