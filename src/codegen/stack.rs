//! x86-64 NASM output for Linux.
//!
//! Every value is one 8-byte word living on the machine stack, which doubles
//! as the operand stack: operands are pushed, operators pop their inputs and
//! push the result. Variables are stack slots addressed relative to `rsp`, so
//! the generator tracks the current stack depth (in words) at every point.

use std::fmt::Write as _;

use crate::{
    ast::{
        Ast, BinaryOperator, Call, ExprId, ExprKind, Ident, IfPred, IfStmt, Program, ScopeId,
        ScopeStmt, Term, TopLevelStmt, WhileStmt,
    },
    codegen::{Bindings, Error, Generator, Result},
    intrinsics::Intrinsic,
    types::ValueType,
    util::intern::Interner,
};

const WORD: usize = 8;

const SYS_WRITE: u32 = 1;
const SYS_EXIT: u32 = 60;
const STDOUT: u32 = 1;

pub struct StackGenerator<'a> {
    ast: &'a Ast,
    idents: &'a Interner,
    out: String,
    /// Words currently pushed.
    depth: usize,
    /// Next unique label number.
    labels: usize,
    names: Bindings<Binding>,
    /// Where a `return` jumps to, for each call being inlined. Innermost last.
    returns: Vec<ReturnTarget>,
}

struct ReturnTarget {
    end: String,
    /// Stack depth at the call site.
    base: usize,
}

#[derive(Copy, Clone, Debug)]
enum Binding {
    /// Stack depth right before the variable was pushed.
    Slot(usize),
    /// Functions are inlined at their call sites.
    Func(ScopeId),
}

impl<'a> Generator<'a> for StackGenerator<'a> {
    fn new(ast: &'a Ast, idents: &'a Interner) -> Self {
        StackGenerator {
            ast,
            idents,
            out: String::with_capacity(4096),
            depth: 0,
            labels: 0,
            names: Bindings::new(),
            returns: Vec::new(),
        }
    }

    fn generate(mut self, program: &Program) -> Result<String> {
        self.label("global _start");
        self.label("_start:");

        let mut entry = None;
        for item in &program.items {
            match item {
                TopLevelStmt::VarImplicit(var) => self.g_var(var.name, Some(var.value))?,
                TopLevelStmt::VarExplicit(var) => self.g_var(var.name, None)?,
                TopLevelStmt::Func(func) => {
                    self.names.bind(func.name, Binding::Func(func.body))?;
                    if self.idents.get(func.name.name) == "main" {
                        entry = Some(func.body);
                    }
                }
            }
        }

        if let Some(body) = entry {
            self.g_inlined(body)?;
        }
        self.exit(Some(0));

        Ok(self.out)
    }
}

/// Statements.
impl StackGenerator<'_> {
    /// Pushes the initial value (zero if there is none) and binds the slot.
    fn g_var(&mut self, name: Ident, value: Option<ExprId>) -> Result<()> {
        let slot = self.depth;
        match value {
            Some(value) => self.g_expr(value)?,
            None => {
                self.out("mov rax, 0");
                self.push("rax");
            }
        }
        self.names.bind(name, Binding::Slot(slot))
    }

    /// Generates a scope, then reclaims the slots of the variables it declared.
    fn g_scope(&mut self, scope: ScopeId) -> Result<()> {
        self.names.enter();
        self.g_stmts(scope)?;
        let bound = self.names.leave();
        self.reclaim(&bound);
        Ok(())
    }

    /// Inlines a function body. It sees the globals but not the locals of
    /// the call site.
    fn g_inlined(&mut self, body: ScopeId) -> Result<()> {
        self.names.enter_isolated();
        self.g_stmts(body)?;
        let bound = self.names.leave();
        self.reclaim(&bound);
        Ok(())
    }

    fn g_stmts(&mut self, scope: ScopeId) -> Result<()> {
        for stmt in &self.ast.scope(scope).stmts {
            self.g_stmt(stmt)?;
        }
        Ok(())
    }

    fn reclaim(&mut self, bound: &[Binding]) {
        let words = bound
            .iter()
            .filter(|binding| matches!(binding, Binding::Slot(_)))
            .count();
        if words > 0 {
            self.out(format_args!("add rsp, {}", words * WORD));
            self.depth -= words;
        }
    }

    fn g_stmt(&mut self, stmt: &ScopeStmt) -> Result<()> {
        match stmt {
            ScopeStmt::Return(expr) => {
                self.g_expr(*expr)?;
                self.g_return();
            }
            ScopeStmt::VarImplicit(var) => self.g_var(var.name, Some(var.value))?,
            ScopeStmt::VarExplicit(var) => self.g_var(var.name, None)?,
            ScopeStmt::Assign(assign) => {
                self.g_expr(assign.value)?;
                self.pop("rax");
                let slot = self.slot(assign.target)?;
                self.out(format_args!("mov {slot}, rax"));
            }
            ScopeStmt::Call(call) => self.g_call(call, false)?,
            ScopeStmt::Scope(scope) => self.g_scope(*scope)?,
            ScopeStmt::Increment(ident) => {
                let slot = self.slot(*ident)?;
                self.out(format_args!("inc {slot}"));
            }
            ScopeStmt::Decrement(ident) => {
                let slot = self.slot(*ident)?;
                self.out(format_args!("dec {slot}"));
            }
            ScopeStmt::While(stmt) => self.g_while(stmt)?,
            ScopeStmt::If(stmt) => self.g_if(stmt)?,
        }
        Ok(())
    }

    /// Returns the value on top of the stack. Inside an inlined call the
    /// value goes to `rax` and the call's locals are dropped before jumping
    /// past the body; anywhere else the process exits with it.
    fn g_return(&mut self) {
        let target = self.returns.last().map(|t| (t.end.clone(), t.base));
        let Some((end, base)) = target else {
            self.pop("rdi");
            return self.exit(None);
        };

        self.pop("rax");
        // The code following the jump still runs at the current depth, so
        // it's left untouched.
        let words = self.depth - base;
        if words > 0 {
            self.out(format_args!("add rsp, {}", words * WORD));
        }
        self.out(format_args!("jmp {end}"));
    }

    fn g_while(&mut self, stmt: &WhileStmt) -> Result<()> {
        let start = self.new_label();
        let end = self.new_label();

        self.label(format_args!("{start}:"));
        self.g_cond(stmt.cond, &end)?;
        self.g_scope(stmt.body)?;
        self.out(format_args!("jmp {start}"));
        self.label(format_args!("{end}:"));
        Ok(())
    }

    /// Each arm jumps to the shared end label once its body is done, so only
    /// the first arm whose condition holds runs.
    fn g_if(&mut self, stmt: &IfStmt) -> Result<()> {
        let end = self.new_label();

        let mut next = self.new_label();
        self.g_cond(stmt.cond, &next)?;
        self.g_scope(stmt.then)?;
        self.out(format_args!("jmp {end}"));

        let mut pred = stmt.chain.as_deref();
        while let Some(current) = pred {
            self.label(format_args!("{next}:"));
            match current {
                IfPred::Elif {
                    cond,
                    scope,
                    next: rest,
                } => {
                    next = self.new_label();
                    self.g_cond(*cond, &next)?;
                    self.g_scope(*scope)?;
                    self.out(format_args!("jmp {end}"));
                    pred = rest.as_deref();
                }
                IfPred::Else { scope } => {
                    self.g_scope(*scope)?;
                    next = end.clone();
                    pred = None;
                }
            }
        }

        if next != end {
            self.label(format_args!("{next}:"));
        }
        self.label(format_args!("{end}:"));
        Ok(())
    }

    /// Evaluates a condition and jumps to `otherwise` if it's false.
    fn g_cond(&mut self, cond: ExprId, otherwise: &str) -> Result<()> {
        self.g_expr(cond)?;
        self.pop("rax");
        self.out("test rax, rax");
        self.out(format_args!("jz {otherwise}"));
        Ok(())
    }

    /// Generates a call. In expression position the call must leave exactly
    /// one word on the stack.
    fn g_call(&mut self, call: &Call, as_value: bool) -> Result<()> {
        let arg_types: Vec<_> = call.args.iter().map(|a| self.ast.expr(*a).ty).collect();
        let intrinsic = Intrinsic::resolve(self.idents.get(call.name.name), &arg_types)
            .map_err(|e| call.name.line.wrap(Error::Intrinsic(e)))?;

        match intrinsic {
            Some(Intrinsic::Print | Intrinsic::Println) => {
                for (arg, ty) in call.args.iter().zip(&arg_types) {
                    if *ty != ValueType::Char {
                        let error = Error::Unsupported("printing values other than chars");
                        return Err(self.ast.expr(*arg).line.wrap(error));
                    }
                    self.g_expr(*arg)?;
                    self.write_top();
                }
                if intrinsic == Some(Intrinsic::Println) {
                    self.out("mov rax, 10");
                    self.push("rax");
                    self.write_top();
                }
                if as_value {
                    self.push_zero();
                }
            }
            Some(Intrinsic::Itoc | Intrinsic::Ctoi) => {
                self.g_expr(call.args[0])?;
                self.pop("rax");
                let op = if intrinsic == Some(Intrinsic::Itoc) {
                    "add"
                } else {
                    "sub"
                };
                self.out(format_args!("{op} rax, '0'"));
                if as_value {
                    self.push("rax");
                }
            }
            None => {
                let Binding::Func(body) = self.names.get(call.name)? else {
                    let name = call.name.name;
                    return Err(call.name.line.wrap(Error::UnknownIdentifier(name)));
                };
                let end = self.new_label();
                self.returns.push(ReturnTarget {
                    end: end.clone(),
                    base: self.depth,
                });
                self.g_inlined(body)?;
                self.returns.pop();

                // Falling off the end of the body yields zero.
                if as_value && !self.ast.scope(body).ends_with_return() {
                    self.out("mov rax, 0");
                }
                self.label(format_args!("{end}:"));
                if as_value {
                    self.push("rax");
                }
            }
        }
        Ok(())
    }

    /// Writes the char on top of the stack to stdout and pops it.
    fn write_top(&mut self) {
        self.out(format_args!("mov rax, {SYS_WRITE}"));
        self.out(format_args!("mov rdi, {STDOUT}"));
        self.out("mov rsi, rsp");
        self.out("mov rdx, 1");
        self.out("syscall");
        self.out(format_args!("add rsp, {WORD}"));
        self.depth -= 1;
    }
}

/// Expressions. Each one leaves its value on top of the stack.
impl StackGenerator<'_> {
    fn g_expr(&mut self, id: ExprId) -> Result<()> {
        let expr = self.ast.expr(id);
        match &expr.kind {
            ExprKind::Term(term) => self.g_term(term, id)?,
            ExprKind::Binary { op, lhs, rhs } => {
                self.g_expr(*lhs)?;
                self.g_expr(*rhs)?;
                self.pop("rbx");
                self.pop("rax");
                self.g_binary(*op);
                self.push("rax");
            }
            ExprKind::Not(operand) => {
                self.g_expr(*operand)?;
                self.pop("rax");
                self.out("xor rax, 1");
                self.push("rax");
            }
            ExprKind::Increment(ident) | ExprKind::Decrement(ident) => {
                let slot = self.slot(*ident)?;
                let op = if matches!(expr.kind, ExprKind::Increment(_)) {
                    "inc"
                } else {
                    "dec"
                };
                self.out(format_args!("mov rax, {slot}"));
                self.out(format_args!("{op} {slot}"));
                self.push("rax");
            }
        }
        Ok(())
    }

    fn g_term(&mut self, term: &Term, id: ExprId) -> Result<()> {
        match term {
            Term::Bool(value) => self.push_immediate(i64::from(*value)),
            Term::Int(value) => self.push_immediate(*value),
            Term::Char(value) => self.push_immediate(i64::from(u32::from(*value))),
            Term::String(_) => {
                let error = Error::Unsupported("string values");
                return Err(self.ast.expr(id).line.wrap(error));
            }
            Term::Ident(ident) => {
                let slot = self.slot(*ident)?;
                self.out(format_args!("push {slot}"));
                self.depth += 1;
            }
            Term::Call(call) => self.g_call(call, true)?,
            Term::Paren(inner) => self.g_expr(*inner)?,
        }
        Ok(())
    }

    /// Combines `rax` and `rbx` into `rax`.
    fn g_binary(&mut self, op: BinaryOperator) {
        use BinaryOperator::*;
        let set = match op {
            Add => return self.out("add rax, rbx"),
            Sub => return self.out("sub rax, rbx"),
            Mul => return self.out("imul rax, rbx"),
            Div => {
                self.out("cqo");
                return self.out("idiv rbx");
            }
            // Both operands are already evaluated; there is no short circuit.
            And => return self.out("and rax, rbx"),
            Or => return self.out("or rax, rbx"),
            Eq => "sete",
            NotEq => "setne",
            GreaterEq => "setge",
            Greater => "setg",
            LessEq => "setle",
            Less => "setl",
        };
        self.out("cmp rax, rbx");
        self.out(format_args!("{set} al"));
        self.out("movzx rax, al");
    }
}

/// Utility functions.
impl StackGenerator<'_> {
    /// Writes an indented instruction.
    fn out(&mut self, instruction: impl std::fmt::Display) {
        // Writing into a `String` can't fail.
        let _ = writeln!(self.out, "    {instruction}");
    }

    /// Writes a label or directive, unindented.
    fn label(&mut self, label: impl std::fmt::Display) {
        let _ = writeln!(self.out, "{label}");
    }

    fn new_label(&mut self) -> String {
        let label = format!(".L{}", self.labels);
        self.labels += 1;
        label
    }

    fn push(&mut self, reg: &str) {
        self.out(format_args!("push {reg}"));
        self.depth += 1;
    }

    fn pop(&mut self, reg: &str) {
        self.out(format_args!("pop {reg}"));
        self.depth -= 1;
    }

    fn push_immediate(&mut self, value: i64) {
        self.out(format_args!("mov rax, {value}"));
        self.push("rax");
    }

    fn push_zero(&mut self) {
        self.push_immediate(0);
    }

    /// Exits the process with `code`, or with whatever is in `rdi`.
    fn exit(&mut self, code: Option<i64>) {
        self.out(format_args!("mov rax, {SYS_EXIT}"));
        if let Some(code) = code {
            self.out(format_args!("mov rdi, {code}"));
        }
        self.out("syscall");
    }

    /// Memory operand of a variable's slot at the current depth.
    fn slot(&self, ident: Ident) -> Result<String> {
        match self.names.get(ident)? {
            Binding::Slot(slot) => {
                let offset = (self.depth - slot - 1) * WORD;
                Ok(format!("QWORD [rsp + {offset}]"))
            }
            Binding::Func(_) => {
                let error = Error::Unsupported("functions as values");
                Err(ident.line.wrap(error))
            }
        }
    }
}
