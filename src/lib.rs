/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into a typed AST. Types
/// are synthesized and checked while parsing; there is no separate pass.
pub mod parser;

/// Code generation lowers a typed AST into C++ source or into x86-64
/// assembly for a stack machine.
pub mod codegen;

/// A compilation run, tying the phases together.
pub mod session;

pub mod arena;
pub mod ast;
pub mod intrinsics;
pub mod symbols;
pub mod token;
pub mod types;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
