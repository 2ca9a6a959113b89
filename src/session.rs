//! One compilation run. Everything a run allocates (identifiers, tree nodes,
//! declarations) lives in a [`Session`], so separate runs never share state.

use crate::{
    arena::DEFAULT_NODE_LIMIT,
    ast::{Ast, Program},
    codegen::{self, Backend},
    lexer, parser,
    symbols::SymbolTable,
    token::{Spanned, Token},
    util::{
        fmt::{Context, Show},
        intern::Interner,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub backend: Backend,
    /// Maximum number of expression (and of scope) nodes.
    pub max_nodes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            backend: Backend::default(),
            max_nodes: DEFAULT_NODE_LIMIT,
        }
    }
}

/// Compiles `src` in a fresh session. On failure, returns the rendered
/// diagnostic.
pub fn compile(src: &str, options: &Options) -> Result<String, String> {
    let mut session = Session::new(*options);
    session
        .compile(src)
        .map_err(|error| session.render(&error))
}

pub struct Session {
    options: Options,
    idents: Interner,
    ast: Ast,
    symbols: SymbolTable,
}

impl Session {
    pub fn new(options: Options) -> Session {
        Session {
            options,
            idents: Interner::with_capacity(128),
            ast: Ast::with_limit(options.max_nodes),
            symbols: SymbolTable::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn idents(&self) -> &Interner {
        &self.idents
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn compile(&mut self, src: &str) -> Result<String, Error> {
        let tokens = self.lex(src)?;
        let program = self.parse(&tokens)?;
        self.generate(&program)
    }

    pub fn lex(&self, src: &str) -> Result<Vec<Token>, Error> {
        Ok(lexer::lex(src)?)
    }

    pub fn parse(&mut self, tokens: &[Token]) -> Result<Program, Error> {
        let program =
            parser::parse_program(tokens, &mut self.ast, &mut self.idents, &mut self.symbols)?;
        Ok(program)
    }

    pub fn generate(&self, program: &Program) -> Result<String, Error> {
        let output = codegen::generate(self.options.backend, program, &self.ast, &self.idents)?;
        Ok(output)
    }

    /// Renders an error of this session as `[Error] line N: message`.
    pub fn render(&self, error: &Error) -> String {
        let ctx = Context {
            ident_interner: &self.idents,
        };
        format!("{:#}", error.display(&ctx))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Lex(Spanned<lexer::Error>),
    Parse(Spanned<parser::Error>),
    Codegen(Spanned<codegen::Error>),
}

impl From<Spanned<lexer::Error>> for Error {
    fn from(value: Spanned<lexer::Error>) -> Self {
        Error::Lex(value)
    }
}

impl From<Spanned<parser::Error>> for Error {
    fn from(value: Spanned<parser::Error>) -> Self {
        Error::Parse(value)
    }
}

impl From<Spanned<codegen::Error>> for Error {
    fn from(value: Spanned<codegen::Error>) -> Self {
        Error::Codegen(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_with_either_backend() {
        let src = "func main(): int { return 6 * 7 }";

        let text = compile(src, &Options::default()).unwrap();
        assert!(text.contains("return 6 * 7;"));
        assert!(text.contains("return main();"));

        let options = Options {
            backend: Backend::Stack,
            ..Options::default()
        };
        let asm = compile(src, &options).unwrap();
        assert!(asm.starts_with("global _start\n_start:\n"));
        assert!(asm.contains("imul rax, rbx"));
    }

    #[test]
    fn errors_are_rendered_with_their_line() {
        let src = "var a = 1\nvar b = a + 'c'";
        let error = compile(src, &Options::default()).unwrap_err();
        assert_eq!(error, "[Error] line 2: wrong operation: int + char");

        let error = compile("var a = 1 @", &Options::default()).unwrap_err();
        assert_eq!(error, "[Error] line 1: invalid character '@'");
    }

    #[test]
    fn node_limit_is_configurable() {
        let options = Options {
            max_nodes: 4,
            ..Options::default()
        };
        let error = compile("var x = 1 + 2 + 3", &options).unwrap_err();
        assert_eq!(
            error,
            "[Error] line 1: too many nodes: the limit of 4 was reached"
        );
        assert!(compile("var x = 1 + 2", &options).is_ok());
    }

    #[test]
    fn sessions_do_not_share_declarations() {
        let src = "var x = 1";
        assert!(compile(src, &Options::default()).is_ok());
        // A leaked symbol table would report a redeclaration here.
        assert!(compile(src, &Options::default()).is_ok());
    }

    #[test]
    fn phases_can_be_driven_one_by_one() {
        let mut session = Session::new(Options::default());
        let tokens = session.lex("var x = 'a' == 'b'").unwrap();
        let program = session.parse(&tokens).unwrap();
        assert_eq!(program.items.len(), 1);
        assert_eq!(session.ast().exprs.len(), 3);
        assert!(session.idents().lookup("x").is_some());
        assert!(session.generate(&program).unwrap().contains("bool x = 'a' == 'b';"));
    }
}
