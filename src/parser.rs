use crate::{
    arena::Exhausted,
    ast::{
        Assign, Ast, BinaryOperator, Call, Expr, ExprId, ExprKind, FuncDecl, Ident, IfPred,
        IfStmt, Program, Scope, ScopeId, ScopeStmt, Term, TopLevelStmt, VarDecl, VarInit,
        WhileStmt,
    },
    intrinsics::{self, Intrinsic},
    symbols::{Symbol, SymbolKind, SymbolTable},
    token::{Line, Spanned, Token, TokenKind},
    types::ValueType,
    util::intern::{Interner, Name},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Parses and type checks a whole program.
///
/// Nodes are allocated in `ast`, identifiers interned in `idents` and every
/// global declaration is left in `symbols`. The first error aborts the parse.
pub fn parse_program(
    tokens: &[Token],
    ast: &mut Ast,
    idents: &mut Interner,
    symbols: &mut SymbolTable,
) -> Result<Program> {
    let mut p = Parser::new(tokens, ast, idents, symbols);
    let program = p.parse_program()?;
    log::debug!(
        "parsed {} top-level statements ({} expressions, {} scopes)",
        program.items.len(),
        p.ast.exprs.len(),
        p.ast.scopes.len(),
    );
    Ok(program)
}

/// Parses and type checks a single expression against the declarations
/// already in `symbols`. All tokens must be consumed.
pub fn parse_expr(
    tokens: &[Token],
    ast: &mut Ast,
    idents: &mut Interner,
    symbols: &mut SymbolTable,
) -> Result<ExprId> {
    let mut p = Parser::new(tokens, ast, idents, symbols);
    let expr = p.expect_expr("expression")?;
    if let Some(token) = p.peek(0) {
        let error = Error::Unexpected(token.kind.describe());
        return Err(token.line.wrap(error));
    }
    Ok(expr)
}

struct Parser<'tok, 'ctx> {
    tokens: &'tok [Token],
    cursor: usize,
    ast: &'ctx mut Ast,
    idents: &'ctx mut Interner,
    symbols: &'ctx mut SymbolTable,
}

/// A parsed `var` declaration, before it's placed at top or scope level.
enum VarStmt {
    Init(VarInit),
    Decl(VarDecl),
}

impl Parser<'_, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let mut items = Vec::with_capacity(8);
        while !self.is_eof() {
            items.push(self.parse_top_level_stmt()?);
        }
        Ok(Program { items })
    }

    fn parse_top_level_stmt(&mut self) -> Result<TopLevelStmt> {
        match self.peek_kind() {
            Some(TokenKind::Var) => match self.parse_var()? {
                VarStmt::Init(var) => Ok(TopLevelStmt::VarImplicit(var)),
                VarStmt::Decl(var) => Ok(TopLevelStmt::VarExplicit(var)),
            },
            Some(TokenKind::Func) => self.parse_func().map(TopLevelStmt::Func),
            _ => Err(self.error(Error::Missing("statement"))),
        }
    }

    /// `var IDENT = expr`, `var IDENT : TYPE = expr` or `var IDENT : TYPE`.
    fn parse_var(&mut self) -> Result<VarStmt> {
        self.consume(&TokenKind::Var)?;
        let name = self.consume_ident()?;
        self.ensure_undeclared(name)?;

        if self.take(&TokenKind::Assign) {
            let value = self.expect_expr("expression")?;
            let ty = self.ast.expr(value).ty;
            self.declare(name, ty, SymbolKind::Variable)?;
            return Ok(VarStmt::Init(VarInit {
                name,
                annotation: None,
                value,
            }));
        }

        if !self.take(&TokenKind::Colon) {
            return Err(self.error(Error::Missing("type declaration")));
        }
        let annotation = self.parse_type()?;

        if self.take(&TokenKind::Assign) {
            let value = self.expect_expr("expression")?;
            let actual = self.ast.expr(value).ty;
            if actual != annotation {
                let error = Error::TypeMismatch {
                    expected: annotation,
                    actual,
                };
                return Err(self.ast.expr(value).line.wrap(error));
            }
            self.declare(name, annotation, SymbolKind::Variable)?;
            Ok(VarStmt::Init(VarInit {
                name,
                annotation: Some(annotation),
                value,
            }))
        } else {
            self.declare(name, annotation, SymbolKind::Variable)?;
            Ok(VarStmt::Decl(VarDecl {
                name,
                ty: annotation,
            }))
        }
    }

    /// `func IDENT() [: TYPE] { ... }`
    fn parse_func(&mut self) -> Result<FuncDecl> {
        self.consume(&TokenKind::Func)?;
        let name = self.consume_ident()?;
        self.ensure_undeclared(name)?;
        self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::RParen)?;

        let declared_ty = if self.take(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_scope()?;
        let ty = self.ast.scope(body).ty.unwrap_or(ValueType::Void);
        if let Some(expected) = declared_ty {
            if expected != ty {
                let error = Error::TypeMismatch {
                    expected,
                    actual: ty,
                };
                return Err(name.line.wrap(error));
            }
        }
        self.check_returns(body, ty)?;

        // Declared only now, so the body can't refer to the function itself.
        self.declare(name, ty, SymbolKind::Function)?;
        Ok(FuncDecl {
            name,
            body,
            declared_ty,
            ty,
        })
    }

    /// Every `return` of a function body, nested blocks included, must
    /// produce the function's type.
    fn check_returns(&self, scope: ScopeId, ty: ValueType) -> Result<()> {
        for stmt in &self.ast.scope(scope).stmts {
            match stmt {
                ScopeStmt::Return(value) => {
                    let value = self.ast.expr(*value);
                    if value.ty != ty {
                        let error = Error::TypeMismatch {
                            expected: ty,
                            actual: value.ty,
                        };
                        return Err(value.line.wrap(error));
                    }
                }
                ScopeStmt::Scope(inner) => self.check_returns(*inner, ty)?,
                ScopeStmt::While(stmt) => self.check_returns(stmt.body, ty)?,
                ScopeStmt::If(stmt) => {
                    self.check_returns(stmt.then, ty)?;
                    let mut pred = stmt.chain.as_deref();
                    while let Some(current) = pred {
                        match current {
                            IfPred::Elif { scope, next, .. } => {
                                self.check_returns(*scope, ty)?;
                                pred = next.as_deref();
                            }
                            IfPred::Else { scope } => {
                                self.check_returns(*scope, ty)?;
                                pred = None;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<ValueType> {
        let ty = self.peek_kind().and_then(ValueType::from_keyword);
        match ty {
            Some(ty) => {
                self.advance();
                Ok(ty)
            }
            None => Err(self.error(Error::Missing("type"))),
        }
    }

    /// `{ stmt* }`. The scope gets the type of its last typed statement.
    fn parse_scope(&mut self) -> Result<ScopeId> {
        if !self.take(&TokenKind::LBrace) {
            return Err(self.error(Error::Missing("scope")));
        }
        self.symbols.enter();

        let mut scope = Scope::default();
        while let Some(stmt) = self.parse_scope_stmt()? {
            if let Some(ty) = stmt.ty(self.ast) {
                scope.ty = Some(ty);
            }
            scope.stmts.push(stmt);
        }
        self.consume(&TokenKind::RBrace)?;

        self.symbols.leave();
        self.ast.add_scope(scope).map_err(|e| self.error(e.into()))
    }

    fn parse_scope_stmt(&mut self) -> Result<Option<ScopeStmt>> {
        let Some(kind) = self.peek_kind() else {
            return Ok(None);
        };

        let stmt = match kind {
            TokenKind::Identifier(_) => match self.peek(1).map(|t| &t.kind) {
                Some(TokenKind::Increment) => ScopeStmt::Increment(self.parse_step()?),
                Some(TokenKind::Decrement) => ScopeStmt::Decrement(self.parse_step()?),
                Some(TokenKind::Assign) => ScopeStmt::Assign(self.parse_assign()?),
                Some(TokenKind::LParen) => ScopeStmt::Call(self.parse_call()?.0),
                _ => return Ok(None),
            },
            TokenKind::Return => {
                self.advance();
                ScopeStmt::Return(self.expect_expr("return value")?)
            }
            TokenKind::Var => match self.parse_var()? {
                VarStmt::Init(var) => ScopeStmt::VarImplicit(var),
                VarStmt::Decl(var) => ScopeStmt::VarExplicit(var),
            },
            TokenKind::LBrace => ScopeStmt::Scope(self.parse_scope()?),
            TokenKind::While => {
                self.advance();
                let cond = self.parse_condition()?;
                let body = self.parse_scope()?;
                ScopeStmt::While(WhileStmt { cond, body })
            }
            TokenKind::If => {
                self.advance();
                let cond = self.parse_condition()?;
                let then = self.parse_scope()?;
                let chain = self.parse_if_pred()?;
                ScopeStmt::If(IfStmt { cond, then, chain })
            }
            _ => return Ok(None),
        };
        Ok(Some(stmt))
    }

    /// `IDENT = expr`. The value must have exactly the declared type.
    fn parse_assign(&mut self) -> Result<Assign> {
        let target = self.consume_ident()?;
        let symbol = self.resolve_value(target)?;
        self.consume(&TokenKind::Assign)?;

        let value = self.expect_expr("expression")?;
        let actual = self.ast.expr(value).ty;
        if actual != symbol.ty {
            let error = Error::TypeMismatch {
                expected: symbol.ty,
                actual,
            };
            return Err(self.ast.expr(value).line.wrap(error));
        }
        Ok(Assign { target, value })
    }

    /// `IDENT ++` or `IDENT --`, on an int variable. Returns the identifier.
    fn parse_step(&mut self) -> Result<Ident> {
        let ident = self.consume_ident()?;
        let symbol = self.resolve_value(ident)?;
        if symbol.ty != ValueType::Int {
            let error = Error::TypeMismatch {
                expected: ValueType::Int,
                actual: symbol.ty,
            };
            return Err(ident.line.wrap(error));
        }
        self.advance(); // ++ or --
        Ok(ident)
    }

    /// `( expr )`, where the expression must be a bool.
    fn parse_condition(&mut self) -> Result<ExprId> {
        self.consume(&TokenKind::LParen)?;
        let cond = self.expect_expr("expression")?;
        self.consume(&TokenKind::RParen)?;

        let (ty, line) = (self.ast.expr(cond).ty, self.ast.expr(cond).line);
        if ty != ValueType::Bool {
            let error = Error::TypeMismatch {
                expected: ValueType::Bool,
                actual: ty,
            };
            return Err(line.wrap(error));
        }
        Ok(cond)
    }

    fn parse_if_pred(&mut self) -> Result<Option<Box<IfPred>>> {
        if self.take(&TokenKind::Elif) {
            let cond = self.parse_condition()?;
            let scope = self.parse_scope()?;
            let next = self.parse_if_pred()?;
            return Ok(Some(Box::new(IfPred::Elif { cond, scope, next })));
        }
        if self.take(&TokenKind::Else) {
            let scope = self.parse_scope()?;
            return Ok(Some(Box::new(IfPred::Else { scope })));
        }
        Ok(None)
    }

    /// `IDENT ( args )`. Built-ins are resolved first, then the symbol table.
    ///
    /// Returns the call with its result type.
    fn parse_call(&mut self) -> Result<(Call, ValueType)> {
        let name = self.consume_ident()?;
        self.consume(&TokenKind::LParen)?;
        let args = self.parse_args()?;
        self.consume(&TokenKind::RParen)?;

        let arg_types: Vec<_> = args.iter().map(|arg| self.ast.expr(*arg).ty).collect();
        let intrinsic = Intrinsic::resolve(self.idents.get(name.name), &arg_types)
            .map_err(|e| name.line.wrap(Error::Intrinsic(e)))?;

        let ty = match intrinsic {
            Some(intrinsic) => intrinsic.return_type(),
            None => {
                let symbol = self.resolve(name)?;
                if symbol.kind != SymbolKind::Function {
                    return Err(name.line.wrap(Error::NotAFunction(name.name)));
                }
                if !args.is_empty() {
                    let error = Error::UnexpectedArguments {
                        name: name.name,
                        count: args.len(),
                    };
                    return Err(name.line.wrap(error));
                }
                symbol.ty
            }
        };
        Ok((Call { name, args }, ty))
    }

    /// Zero or more comma separated expressions.
    fn parse_args(&mut self) -> Result<Vec<ExprId>> {
        let mut args = Vec::new();
        if let Some(first) = self.parse_expr(0)? {
            args.push(first);
            while self.take(&TokenKind::Comma) {
                args.push(self.expect_expr("expression")?);
            }
        }
        Ok(args)
    }

    fn expect_expr(&mut self, what: &'static str) -> Result<ExprId> {
        match self.parse_expr(0)? {
            Some(expr) => Ok(expr),
            None => Err(self.error(Error::Missing(what))),
        }
    }

    /// Precedence climbing. Parses operators whose precedence is at least
    /// `min_prec`; the right operand is parsed one level higher, which makes
    /// every operator left-associative.
    fn parse_expr(&mut self, min_prec: u8) -> Result<Option<ExprId>> {
        let Some(mut lhs) = self.parse_unary()? else {
            return Ok(None);
        };

        loop {
            let Some(op) = self.peek_kind().and_then(BinaryOperator::from_token) else {
                break;
            };
            if op.precedence() < min_prec {
                break;
            }
            let op_line = self.advance().line;

            let Some(rhs) = self.parse_expr(op.precedence() + 1)? else {
                return Err(self.error(Error::Missing("expression")));
            };

            let lhs_ty = self.ast.expr(lhs).ty;
            let rhs_ty = self.ast.expr(rhs).ty;
            let Some(ty) = ValueType::binary_result(lhs_ty, op, rhs_ty) else {
                let error = Error::WrongOperation {
                    lhs: lhs_ty,
                    op,
                    rhs: rhs_ty,
                };
                return Err(op_line.wrap(error));
            };

            let line = self.ast.expr(lhs).line;
            lhs = self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, ty, line)?;
        }

        Ok(Some(lhs))
    }

    /// `! unary`, `IDENT ++`, `IDENT --` or a term.
    fn parse_unary(&mut self) -> Result<Option<ExprId>> {
        let Some(token) = self.peek(0) else {
            return Ok(None);
        };
        let line = token.line;

        match (&token.kind, self.peek(1).map(|t| &t.kind)) {
            (TokenKind::Not, _) => {
                self.advance();
                let Some(operand) = self.parse_unary()? else {
                    return Err(self.error(Error::Missing("boolean expression")));
                };
                let ty = self.ast.expr(operand).ty;
                if ty != ValueType::Bool {
                    let error = Error::TypeMismatch {
                        expected: ValueType::Bool,
                        actual: ty,
                    };
                    return Err(self.ast.expr(operand).line.wrap(error));
                }
                self.alloc_expr(ExprKind::Not(operand), ValueType::Bool, line)
                    .map(Some)
            }
            (TokenKind::Identifier(_), Some(TokenKind::Increment)) => {
                let ident = self.parse_step()?;
                self.alloc_expr(ExprKind::Increment(ident), ValueType::Int, line)
                    .map(Some)
            }
            (TokenKind::Identifier(_), Some(TokenKind::Decrement)) => {
                let ident = self.parse_step()?;
                self.alloc_expr(ExprKind::Decrement(ident), ValueType::Int, line)
                    .map(Some)
            }
            _ => self.parse_term(),
        }
    }

    fn parse_term(&mut self) -> Result<Option<ExprId>> {
        let Some(token) = self.peek(0) else {
            return Ok(None);
        };
        let line = token.line;

        let (term, ty) = match &token.kind {
            TokenKind::Identifier(_) if self.is_at(1, &TokenKind::LParen) => {
                let (call, ty) = self.parse_call()?;
                (Term::Call(call), ty)
            }
            TokenKind::Identifier(_) => {
                let ident = self.consume_ident()?;
                let symbol = self.resolve_value(ident)?;
                (Term::Ident(ident), symbol.ty)
            }
            TokenKind::True => self.advance_with((Term::Bool(true), ValueType::Bool)),
            TokenKind::False => self.advance_with((Term::Bool(false), ValueType::Bool)),
            TokenKind::Int(value) => {
                let term = Term::Int(*value);
                self.advance_with((term, ValueType::Int))
            }
            TokenKind::Char(value) => {
                let term = Term::Char(*value);
                self.advance_with((term, ValueType::Char))
            }
            TokenKind::String(value) => {
                let term = Term::String(value.clone());
                self.advance_with((term, ValueType::String))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expect_expr("expression")?;
                self.consume(&TokenKind::RParen)?;
                (Term::Paren(inner), self.ast.expr(inner).ty)
            }
            _ => return Ok(None),
        };

        self.alloc_expr(ExprKind::Term(term), ty, line).map(Some)
    }
}

/// Symbol table helpers.
impl Parser<'_, '_> {
    fn resolve(&self, ident: Ident) -> Result<Symbol> {
        self.symbols
            .get(ident.name)
            .ok_or_else(|| ident.line.wrap(Error::UnknownIdentifier(ident.name)))
    }

    /// Resolves an identifier used as a value (not called).
    fn resolve_value(&self, ident: Ident) -> Result<Symbol> {
        let symbol = self.resolve(ident)?;
        if symbol.kind == SymbolKind::Function {
            return Err(ident.line.wrap(Error::NotAValue(ident.name)));
        }
        Ok(symbol)
    }

    fn ensure_undeclared(&self, ident: Ident) -> Result<()> {
        match self.symbols.get(ident.name) {
            Some(previous) => Err(ident.line.wrap(Error::Redeclaration {
                name: ident.name,
                previous: previous.line,
            })),
            None => Ok(()),
        }
    }

    fn declare(&mut self, ident: Ident, ty: ValueType, kind: SymbolKind) -> Result<()> {
        if ty == ValueType::Void && kind == SymbolKind::Variable {
            return Err(ident.line.wrap(Error::VoidVariable(ident.name)));
        }
        let symbol = Symbol {
            ty,
            kind,
            line: ident.line,
        };
        self.symbols
            .declare(ident.name, symbol)
            .map_err(|previous| {
                ident.line.wrap(Error::Redeclaration {
                    name: ident.name,
                    previous: previous.line,
                })
            })?;
        log::trace!("declared {:?} {} : {ty}", kind, self.idents.get(ident.name));
        Ok(())
    }

    fn alloc_expr(&mut self, kind: ExprKind, ty: ValueType, line: Line) -> Result<ExprId> {
        self.ast
            .add_expr(Expr { kind, ty, line })
            .map_err(|e| self.error(e.into()))
    }
}

impl<'tok, 'ctx> Parser<'tok, 'ctx> {
    fn new(
        tokens: &'tok [Token],
        ast: &'ctx mut Ast,
        idents: &'ctx mut Interner,
        symbols: &'ctx mut SymbolTable,
    ) -> Self {
        Parser {
            tokens,
            cursor: 0,
            ast,
            idents,
            symbols,
        }
    }
}

/// Token cursor.
impl<'tok> Parser<'tok, '_> {
    /// Returns the token `offset` positions ahead of the cursor.
    fn peek(&self, offset: usize) -> Option<&'tok Token> {
        self.tokens.get(self.cursor + offset)
    }

    fn peek_kind(&self) -> Option<&'tok TokenKind> {
        self.peek(0).map(|t| &t.kind)
    }

    fn is_eof(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Checks the kind of the token `offset` positions ahead. Only meaningful
    /// for kinds without payload.
    fn is_at(&self, offset: usize, expect: &TokenKind) -> bool {
        self.peek(offset).is_some_and(|t| t.kind == *expect)
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.cursor].clone();
        self.cursor += 1;
        token
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: &TokenKind) -> bool {
        if self.is_at(0, expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not, fails
    /// with a "missing" error.
    fn consume(&mut self, expect: &TokenKind) -> Result<Token> {
        if self.is_at(0, expect) {
            Ok(self.advance())
        } else {
            Err(self.error(Error::Missing(expect.describe())))
        }
    }

    fn consume_ident(&mut self) -> Result<Ident> {
        match self.peek(0) {
            Some(Token {
                kind: TokenKind::Identifier(name),
                line,
            }) => {
                let ident = Ident {
                    name: self.idents.intern(name),
                    line: *line,
                };
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error(Error::Missing("identifier"))),
        }
    }

    /// Anchors an error at the current token, or at the last one when the
    /// input is exhausted.
    fn error(&self, error: Error) -> Spanned<Error> {
        let line = self
            .peek(0)
            .or_else(|| self.tokens.last())
            .map_or(Line::FIRST, |t| t.line);
        line.wrap(error)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An expected construct wasn't found.
    Missing(&'static str),
    /// A token was left over after a complete construct.
    Unexpected(&'static str),
    UnknownIdentifier(Name),
    Redeclaration {
        name: Name,
        previous: Line,
    },
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },
    WrongOperation {
        lhs: ValueType,
        op: BinaryOperator,
        rhs: ValueType,
    },
    VoidVariable(Name),
    NotAFunction(Name),
    NotAValue(Name),
    UnexpectedArguments {
        name: Name,
        count: usize,
    },
    Intrinsic(intrinsics::Error),
    Arena(Exhausted),
}

impl From<Exhausted> for Error {
    fn from(value: Exhausted) -> Self {
        Error::Arena(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer, util::test_utils::tree_tests};

    tree_tests!(
        use parser;

        fn test_precedence() {
            let program = "var x = 1 + 2 * 3";
            let tree_ok = "
                var x: int
                  binary Add : int
                    int 1 : int
                    binary Mul : int
                      int 2 : int
                      int 3 : int
            ";
        }

        fn test_left_associativity() {
            let program = "var x = 10 - 3 - 2";
            let tree_ok = "
                var x: int
                  binary Sub : int
                    binary Sub : int
                      int 10 : int
                      int 3 : int
                    int 2 : int
            ";
        }

        fn test_logical_precedence() {
            let program = "var a = 1 < 2 && 3 >= 4 || !false";
            let tree_ok = "
                var a: bool
                  binary Or : bool
                    binary And : bool
                      binary Less : bool
                        int 1 : int
                        int 2 : int
                      binary GreaterEq : bool
                        int 3 : int
                        int 4 : int
                    not : bool
                      bool false : bool
            ";
        }

        fn test_parenthesized() {
            let program = "var x = (1 + 2) * 3";
            let tree_ok = "
                var x: int
                  binary Mul : int
                    paren : int
                      binary Add : int
                        int 1 : int
                        int 2 : int
                    int 3 : int
            ";
        }

        fn test_literals() {
            let program = r#"
                var b = true
                var i: int = 42
                var c = 'z'
                var s: string = "hi"
                var d: char
            "#;
            let tree_ok = r#"
                var b: bool
                  bool true : bool
                var i: int (annotated)
                  int 42 : int
                var c: char
                  char 'z' : char
                var s: string (annotated)
                  string "hi" : string
                var d: char (uninitialized)
            "#;
        }

        fn test_identifier_types() {
            let program = "var a = 'q' var b = a == 'r'";
            let tree_ok = "
                var a: char
                  char 'q' : char
                var b: bool
                  binary Eq : bool
                    ident a : char
                    char 'r' : char
            ";
        }

        fn test_function_type_from_return() {
            let program = "
                func answer(): int {
                    var x = 40
                    x++
                    return x + 1
                }
            ";
            let tree_ok = "
                func answer: int (declared)
                  scope: int
                    var x: int
                      int 40 : int
                    increment x
                    return
                      binary Add : int
                        ident x : int
                        int 1 : int
            ";
        }

        fn test_function_without_typed_statements_is_void() {
            let program = "
                var n = 0
                func bump() { n = n + 1 }
            ";
            let tree_ok = "
                var n: int
                  int 0 : int
                func bump: void
                  scope: none
                    assign n
                      binary Add : int
                        ident n : int
                        int 1 : int
            ";
        }

        fn test_intrinsic_calls() {
            let program = "
                func main() {
                    var c = itoc(5)
                    println(c, ctoi(c), \"!\")
                }
            ";
            let tree_ok = r#"
                func main: char
                  scope: char
                    var c: char
                      call itoc : char
                        int 5 : int
                    call println
                      ident c : char
                      call ctoi : int
                        ident c : char
                      string "!" : string
            "#;
        }

        fn test_user_function_call() {
            let program = "
                func seven(): int { return 7 }
                func main(): int { return seven() * 2 }
            ";
            let tree_ok = "
                func seven: int (declared)
                  scope: int
                    return
                      int 7 : int
                func main: int (declared)
                  scope: int
                    return
                      binary Mul : int
                        call seven : int
                        int 2 : int
            ";
        }

        fn test_if_elif_else_chain() {
            let program = "
                func main() {
                    var x = 3
                    if (x == 1) { x = 10 }
                    elif (x == 2) { x = 20 }
                    else { x-- }
                }
            ";
            let tree_ok = "
                func main: int
                  scope: int
                    var x: int
                      int 3 : int
                    if
                      binary Eq : bool
                        ident x : int
                        int 1 : int
                      scope: none
                        assign x
                          int 10 : int
                      elif
                        binary Eq : bool
                          ident x : int
                          int 2 : int
                        scope: none
                          assign x
                            int 20 : int
                        else
                          scope: int
                            decrement x
            ";
        }

        fn test_while_and_nested_scope() {
            let program = "
                func main() {
                    var i = 0
                    while (i < 3) {
                        { var j = i++ }
                    }
                }
            ";
            let tree_ok = "
                func main: int
                  scope: int
                    var i: int
                      int 0 : int
                    while
                      binary Less : bool
                        ident i : int
                        int 3 : int
                      scope: int
                        scope: int
                          var j: int
                            increment i : int
            ";
        }

        fn test_sibling_scopes_may_reuse_names() {
            let program = "
                func a() { var t = 1 }
                func b() { var t = 'c' }
            ";
            let tree_ok = "
                func a: int
                  scope: int
                    var t: int
                      int 1 : int
                func b: char
                  scope: char
                    var t: char
                      char 'c' : char
            ";
        }

        fn test_redeclaration() {
            let program = "var x = 1 var x = 2";
            let expected_errors = &["[Error] line 1: identifier 'x' already used (declared on line 1)"];
        }

        fn test_redeclaration_in_inner_scope() {
            let program = "
                var x = 1
                func f() {
                    var x = 2
                }
            ";
            let expected_errors = &["[Error] line 4: identifier 'x' already used (declared on line 2)"];
        }

        fn test_scoped_names_are_not_visible_outside() {
            let program = "
                func a() { var t = 1 }
                func b(): int { return t }
            ";
            let expected_errors = &["[Error] line 3: unknown identifier 't'"];
        }

        fn test_unknown_identifier_in_assignment() {
            let program = "func main() { y = 5 }";
            let expected_errors = &["[Error] line 1: unknown identifier 'y'"];
        }

        fn test_declared_type_mismatch() {
            let program = "var x: int = 'a'";
            let expected_errors = &["[Error] line 1: type mismatch: expected int, but got char"];
        }

        fn test_assignment_type_mismatch() {
            let program = "var x = 1 func f() { x = true }";
            let expected_errors = &["[Error] line 1: type mismatch: expected int, but got bool"];
        }

        fn test_function_type_mismatch() {
            let program = "func f(): bool { return 1 }";
            let expected_errors = &["[Error] line 1: type mismatch: expected bool, but got int"];
        }

        fn test_returns_must_match_function_type() {
            let program = "
                func f() {
                    if (true) { return 1 }
                    var c = 'a'
                }
            ";
            let expected_errors = &["[Error] line 3: type mismatch: expected char, but got int"];
        }

        fn test_wrong_operation() {
            let program = "var x = \"a\" + 'b'";
            let expected_errors = &["[Error] line 1: wrong operation: string + char"];
        }

        fn test_not_requires_bool() {
            let program = "var x = !1";
            let expected_errors = &["[Error] line 1: type mismatch: expected bool, but got int"];
        }

        fn test_increment_requires_int() {
            let program = "var c = 'a' func f() { c++ }";
            let expected_errors = &["[Error] line 1: type mismatch: expected int, but got char"];
        }

        fn test_condition_must_be_bool() {
            let program = "func f() { while (1) { } }";
            let expected_errors = &["[Error] line 1: type mismatch: expected bool, but got int"];
        }

        fn test_itoc_rejects_char() {
            let program = "var c = itoc('a')";
            let expected_errors = &["[Error] line 1: `itoc` expects an argument of type int, but got char"];
        }

        fn test_ctoi_argument_count() {
            let program = "var c = ctoi()";
            let expected_errors = &["[Error] line 1: `ctoi` takes 1 argument(s), but got 0"];
        }

        fn test_calling_a_variable() {
            let program = "var x = 1 var y = x()";
            let expected_errors = &["[Error] line 1: 'x' is not a function"];
        }

        fn test_function_as_value() {
            let program = "func f(): int { return 1 } var y = f";
            let expected_errors = &["[Error] line 1: 'f' is a function, not a value"];
        }

        fn test_function_takes_no_arguments() {
            let program = "func f() { } func g() { f(1) }";
            let expected_errors = &["[Error] line 1: function 'f' takes no arguments, but got 1"];
        }

        fn test_function_cannot_call_itself() {
            let program = "func f() { f() }";
            let expected_errors = &["[Error] line 1: unknown identifier 'f'"];
        }

        fn test_void_variable() {
            let program = "var x = println()";
            let expected_errors = &["[Error] line 1: 'x' can't hold a void value"];
        }

        fn test_missing_closing_paren() {
            let program = "var x = (1 + 2";
            let expected_errors = &["[Error] line 1: missing `)`"];
        }

        fn test_missing_right_operand() {
            let program = "var x = 1 +\n";
            let expected_errors = &["[Error] line 1: missing expression"];
        }

        fn test_missing_scope_end() {
            let program = "func f() {\n  var x = 1\n";
            let expected_errors = &["[Error] line 2: missing `}`"];
        }

        fn test_statement_expected() {
            let program = "x = 1";
            let expected_errors = &["[Error] line 1: missing statement"];
        }

        fn test_type_declaration_expected() {
            let program = "var x int";
            let expected_errors = &["[Error] line 1: missing type declaration"];
        }
    );

    #[test]
    fn test_parse_expr_uses_existing_symbols() {
        let mut idents = Interner::with_capacity(8);
        let mut ast = Ast::default();
        let mut symbols = SymbolTable::new();
        let x = idents.intern("x");
        symbols
            .declare(
                x,
                Symbol {
                    ty: ValueType::Char,
                    kind: SymbolKind::Variable,
                    line: Line(1),
                },
            )
            .unwrap();

        let tokens = lexer::lex("x == 'a'").unwrap();
        let expr = parse_expr(&tokens, &mut ast, &mut idents, &mut symbols).unwrap();
        assert_eq!(ast.expr(expr).ty, ValueType::Bool);

        let tokens = lexer::lex("x )").unwrap();
        let error = parse_expr(&tokens, &mut ast, &mut idents, &mut symbols).unwrap_err();
        assert_eq!(error, Line(1).wrap(Error::Unexpected("`)`")));
    }

    #[test]
    fn test_arena_limit_is_a_resource_error() {
        let tokens = lexer::lex("var x = 1 + 2 + 3").unwrap();
        let mut idents = Interner::with_capacity(8);
        let mut ast = Ast::with_limit(3);
        let mut symbols = SymbolTable::new();
        let error = parse_program(&tokens, &mut ast, &mut idents, &mut symbols).unwrap_err();
        assert_eq!(error.inner, Error::Arena(Exhausted { limit: 3 }));
    }
}
