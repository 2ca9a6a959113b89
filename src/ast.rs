// program    ::= (var_decl | func)*
// func       ::= 'func' IDENT '(' ')' [':' TYPE] scope
// var_decl   ::= 'var' IDENT '=' expr
//              | 'var' IDENT ':' TYPE '=' expr
//              | 'var' IDENT ':' TYPE
// scope      ::= '{' stmt* '}'
// stmt       ::= IDENT '++' | IDENT '--'
//              | 'return' expr
//              | var_decl
//              | IDENT '=' expr
//              | IDENT '(' [expr (',' expr)*] ')'
//              | scope
//              | 'while' '(' expr ')' scope
//              | 'if' '(' expr ')' scope ('elif' '(' expr ')' scope)* ['else' scope]
// expr       ::= unary (BINOP unary)*
// unary      ::= '!' unary | IDENT '++' | IDENT '--' | term
// term       ::= 'true' | 'false' | INT | CHAR | STRING
//              | IDENT | IDENT '(' [expr (',' expr)*] ')' | '(' expr ')'

// Precedence
//
// ! ++ --
// * /
// + -
// == != >= > <= <
// &&
// ||

use crate::{
    arena::{Arena, Exhausted, Idx},
    token::{Line, TokenKind},
    types::ValueType,
    util::intern::Name,
};

pub type ExprId = Idx<Expr>;
pub type ScopeId = Idx<Scope>;

/// Owns every expression and scope node of one compilation.
#[derive(Debug, Default)]
pub struct Ast {
    pub exprs: Arena<Expr>,
    pub scopes: Arena<Scope>,
}

impl Ast {
    pub fn with_limit(max_nodes: usize) -> Ast {
        Ast {
            exprs: Arena::with_limit(max_nodes),
            scopes: Arena::with_limit(max_nodes),
        }
    }

    pub fn add_expr(&mut self, expr: Expr) -> Result<ExprId, Exhausted> {
        self.exprs.alloc(expr)
    }

    pub fn add_scope(&mut self, scope: Scope) -> Result<ScopeId, Exhausted> {
        self.scopes.alloc(scope)
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }
}

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub items: Vec<TopLevelStmt>,
}

#[derive(Debug, PartialEq)]
pub enum TopLevelStmt {
    VarImplicit(VarInit),
    VarExplicit(VarDecl),
    Func(FuncDecl),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Name,
    pub line: Line,
}

/// `var name = value` or `var name: annotation = value`.
#[derive(Debug, PartialEq)]
pub struct VarInit {
    pub name: Ident,
    pub annotation: Option<ValueType>,
    pub value: ExprId,
}

/// `var name: ty`, without initializer.
#[derive(Debug, PartialEq)]
pub struct VarDecl {
    pub name: Ident,
    pub ty: ValueType,
}

#[derive(Debug, PartialEq)]
pub struct FuncDecl {
    pub name: Ident,
    pub body: ScopeId,
    pub declared_ty: Option<ValueType>,
    /// Effective type: the body's synthesized type, or void.
    pub ty: ValueType,
}

#[derive(Debug, PartialEq, Default)]
pub struct Scope {
    pub stmts: Vec<ScopeStmt>,
    /// Type of the last statement which carries one.
    pub ty: Option<ValueType>,
}

impl Scope {
    pub fn ends_with_return(&self) -> bool {
        matches!(self.stmts.last(), Some(ScopeStmt::Return(_)))
    }
}

#[derive(Debug, PartialEq)]
pub enum ScopeStmt {
    Return(ExprId),
    VarImplicit(VarInit),
    VarExplicit(VarDecl),
    Assign(Assign),
    Call(Call),
    Scope(ScopeId),
    Increment(Ident),
    Decrement(Ident),
    While(WhileStmt),
    If(IfStmt),
}

impl ScopeStmt {
    /// The synthesized type of this statement, if it carries one.
    pub fn ty(&self, ast: &Ast) -> Option<ValueType> {
        match self {
            ScopeStmt::Return(expr) => Some(ast.expr(*expr).ty),
            ScopeStmt::VarImplicit(var) => Some(ast.expr(var.value).ty),
            ScopeStmt::VarExplicit(var) => Some(var.ty),
            ScopeStmt::Increment(_) | ScopeStmt::Decrement(_) => Some(ValueType::Int),
            ScopeStmt::Scope(scope) => ast.scope(*scope).ty,
            ScopeStmt::If(stmt) => ast.scope(stmt.then).ty,
            ScopeStmt::Assign(_) | ScopeStmt::Call(_) | ScopeStmt::While(_) => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Assign {
    pub target: Ident,
    pub value: ExprId,
}

#[derive(Debug, PartialEq)]
pub struct Call {
    pub name: Ident,
    pub args: Vec<ExprId>,
}

#[derive(Debug, PartialEq)]
pub struct WhileStmt {
    pub cond: ExprId,
    pub body: ScopeId,
}

#[derive(Debug, PartialEq)]
pub struct IfStmt {
    pub cond: ExprId,
    pub then: ScopeId,
    pub chain: Option<Box<IfPred>>,
}

/// The `elif`/`else` continuation of an `if` statement.
#[derive(Debug, PartialEq)]
pub enum IfPred {
    Elif {
        cond: ExprId,
        scope: ScopeId,
        next: Option<Box<IfPred>>,
    },
    Else {
        scope: ScopeId,
    },
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: ValueType,
    pub line: Line,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Term(Term),
    Binary {
        op: BinaryOperator,
        lhs: ExprId,
        rhs: ExprId,
    },
    Not(ExprId),
    /// Postfix `ident++`, evaluates to the previous value.
    Increment(Ident),
    /// Postfix `ident--`, evaluates to the previous value.
    Decrement(Ident),
}

#[derive(Debug, PartialEq)]
pub enum Term {
    Bool(bool),
    Int(i64),
    Char(char),
    String(Box<str>),
    Ident(Ident),
    Call(Call),
    Paren(ExprId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    NotEq,
    GreaterEq,
    Greater,
    LessEq,
    Less,
}

impl BinaryOperator {
    pub fn from_token(kind: &TokenKind) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        let op = match kind {
            TokenKind::Plus => Add,
            TokenKind::Minus => Sub,
            TokenKind::Star => Mul,
            TokenKind::Slash => Div,
            TokenKind::And => And,
            TokenKind::Or => Or,
            TokenKind::EqEq => Eq,
            TokenKind::NotEq => NotEq,
            TokenKind::GreaterEq => GreaterEq,
            TokenKind::Greater => Greater,
            TokenKind::LessEq => LessEq,
            TokenKind::Less => Less,
            _ => return None,
        };
        Some(op)
    }

    /// Binding power of the operator. Higher binds tighter; every operator is
    /// left-associative.
    pub const fn precedence(self) -> u8 {
        use BinaryOperator::*;
        match self {
            Or => 0,
            And => 1,
            Eq | NotEq | GreaterEq | Greater | LessEq | Less => 2,
            Add | Sub => 3,
            Mul | Div => 4,
        }
    }

    pub const fn is_comparison(self) -> bool {
        self.precedence() == 2
    }

    pub const fn symbol(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            And => "&&",
            Or => "||",
            Eq => "==",
            NotEq => "!=",
            GreaterEq => ">=",
            Greater => ">",
            LessEq => "<=",
            Less => "<",
        }
    }
}
