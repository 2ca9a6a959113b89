use std::io::Write;

use crate::{ast::*, util::intern::Interner};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(idents: &Interner, ast: &Ast, program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, idents, ast, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_expr_string(idents: &Interner, ast: &Ast, expr: ExprId) -> String {
    let mut buf = Vec::with_capacity(512);
    Printer { w: &mut buf, idents, ast }.expr(0, expr).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(
    w: &mut impl Write,
    idents: &Interner,
    ast: &Ast,
    program: &Program,
) -> std::io::Result<()> {
    let mut p = Printer { w, idents, ast };
    for item in &program.items {
        match item {
            TopLevelStmt::VarImplicit(var) => p.var_init(0, var)?,
            TopLevelStmt::VarExplicit(var) => p.var_decl(0, var)?,
            TopLevelStmt::Func(func) => {
                p.sp(0)?;
                write!(p.w, "func {}: {}", p.name(func.name), func.ty)?;
                if func.declared_ty.is_some() {
                    write!(p.w, " (declared)")?;
                }
                writeln!(p.w)?;
                p.scope(1, func.body)?;
            }
        }
    }
    Ok(())
}

struct Printer<'w, 'a, W> {
    w: &'w mut W,
    idents: &'a Interner,
    ast: &'a Ast,
}

impl<'a, W: Write> Printer<'_, 'a, W> {
    fn var_init(&mut self, i: usize, var: &VarInit) -> std::io::Result<()> {
        self.sp(i)?;
        let ty = self.ast.expr(var.value).ty;
        write!(self.w, "var {}: {ty}", self.name(var.name))?;
        if var.annotation.is_some() {
            write!(self.w, " (annotated)")?;
        }
        writeln!(self.w)?;
        self.expr(i + 1, var.value)
    }

    fn var_decl(&mut self, i: usize, var: &VarDecl) -> std::io::Result<()> {
        self.sp(i)?;
        writeln!(self.w, "var {}: {} (uninitialized)", self.name(var.name), var.ty)
    }

    fn scope(&mut self, i: usize, scope: ScopeId) -> std::io::Result<()> {
        let scope = self.ast.scope(scope);
        self.sp(i)?;
        match scope.ty {
            Some(ty) => writeln!(self.w, "scope: {ty}")?,
            None => writeln!(self.w, "scope: none")?,
        }
        for stmt in &scope.stmts {
            self.stmt(i + 1, stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, i: usize, stmt: &ScopeStmt) -> std::io::Result<()> {
        match stmt {
            ScopeStmt::Return(expr) => {
                self.sp(i)?;
                writeln!(self.w, "return")?;
                self.expr(i + 1, *expr)?;
            }
            ScopeStmt::VarImplicit(var) => self.var_init(i, var)?,
            ScopeStmt::VarExplicit(var) => self.var_decl(i, var)?,
            ScopeStmt::Assign(assign) => {
                self.sp(i)?;
                writeln!(self.w, "assign {}", self.name(assign.target))?;
                self.expr(i + 1, assign.value)?;
            }
            ScopeStmt::Call(call) => {
                self.sp(i)?;
                writeln!(self.w, "call {}", self.name(call.name))?;
                self.args(i + 1, call)?;
            }
            ScopeStmt::Scope(scope) => self.scope(i, *scope)?,
            ScopeStmt::Increment(ident) => {
                self.sp(i)?;
                writeln!(self.w, "increment {}", self.name(*ident))?;
            }
            ScopeStmt::Decrement(ident) => {
                self.sp(i)?;
                writeln!(self.w, "decrement {}", self.name(*ident))?;
            }
            ScopeStmt::While(stmt) => {
                self.sp(i)?;
                writeln!(self.w, "while")?;
                self.expr(i + 1, stmt.cond)?;
                self.scope(i + 1, stmt.body)?;
            }
            ScopeStmt::If(stmt) => {
                self.sp(i)?;
                writeln!(self.w, "if")?;
                self.expr(i + 1, stmt.cond)?;
                self.scope(i + 1, stmt.then)?;
                if let Some(pred) = &stmt.chain {
                    self.if_pred(i + 1, pred)?;
                }
            }
        }
        Ok(())
    }

    fn if_pred(&mut self, i: usize, pred: &IfPred) -> std::io::Result<()> {
        match pred {
            IfPred::Elif { cond, scope, next } => {
                self.sp(i)?;
                writeln!(self.w, "elif")?;
                self.expr(i + 1, *cond)?;
                self.scope(i + 1, *scope)?;
                if let Some(next) = next {
                    self.if_pred(i + 1, next)?;
                }
            }
            IfPred::Else { scope } => {
                self.sp(i)?;
                writeln!(self.w, "else")?;
                self.scope(i + 1, *scope)?;
            }
        }
        Ok(())
    }

    fn expr(&mut self, i: usize, id: ExprId) -> std::io::Result<()> {
        let expr = self.ast.expr(id);
        let ty = expr.ty;
        self.sp(i)?;
        match &expr.kind {
            ExprKind::Term(term) => match term {
                Term::Bool(val) => writeln!(self.w, "bool {val} : {ty}")?,
                Term::Int(val) => writeln!(self.w, "int {val} : {ty}")?,
                Term::Char(val) => writeln!(self.w, "char {val:?} : {ty}")?,
                Term::String(val) => writeln!(self.w, "string {val:?} : {ty}")?,
                Term::Ident(ident) => writeln!(self.w, "ident {} : {ty}", self.name(*ident))?,
                Term::Call(call) => {
                    writeln!(self.w, "call {} : {ty}", self.name(call.name))?;
                    self.args(i + 1, call)?;
                }
                Term::Paren(inner) => {
                    writeln!(self.w, "paren : {ty}")?;
                    self.expr(i + 1, *inner)?;
                }
            },
            ExprKind::Binary { op, lhs, rhs } => {
                writeln!(self.w, "binary {op:?} : {ty}")?;
                self.expr(i + 1, *lhs)?;
                self.expr(i + 1, *rhs)?;
            }
            ExprKind::Not(operand) => {
                writeln!(self.w, "not : {ty}")?;
                self.expr(i + 1, *operand)?;
            }
            ExprKind::Increment(ident) => {
                writeln!(self.w, "increment {} : {ty}", self.name(*ident))?;
            }
            ExprKind::Decrement(ident) => {
                writeln!(self.w, "decrement {} : {ty}", self.name(*ident))?;
            }
        }
        Ok(())
    }

    fn args(&mut self, i: usize, call: &Call) -> std::io::Result<()> {
        for arg in &call.args {
            self.expr(i, *arg)?;
        }
        Ok(())
    }

    fn name(&self, ident: Ident) -> &'a str {
        self.idents.get(ident.name)
    }

    fn sp(&mut self, i: usize) -> std::io::Result<()> {
        write!(self.w, "{:width$}", "", width = i * INDENT_WIDTH)
    }
}
