//! Diagnostics. The alternate form (`{:#}`) prefixes the message with
//! `[Error] line N: `, which is how errors are reported to the user.

#![allow(clippy::items_after_statements)]

use std::fmt::Formatter;

use crate::{
    codegen, lexer, parser, session,
    token::Spanned,
    util::fmt::{Context, Show},
};

fn prefix<E>(f: &mut Formatter<'_>, spanned: &Spanned<E>) -> std::fmt::Result {
    if f.alternate() {
        write!(f, "[Error] line {}: ", spanned.line)?;
    }
    Ok(())
}

impl Show for Spanned<lexer::Error> {
    fn show(&self, f: &mut Formatter<'_>, _: &Context<'_>) -> std::fmt::Result {
        prefix(f, self)?;

        use lexer::Error::*;
        match self.inner {
            InvalidCharacter(c) => write!(f, "invalid character {c:?}"),
            UnterminatedChar => write!(f, "unterminated character literal"),
            EmptyChar => write!(f, "empty character literal"),
            UnterminatedString => write!(f, "unterminated string literal"),
            UnclosedComment => write!(f, "unclosed comment"),
            LoneAmpersand => write!(f, "expected `&&`, but got a lone `&`"),
            LonePipe => write!(f, "expected `||`, but got a lone `|`"),
            IntegerOverflow => write!(f, "integer literal out of bounds"),
        }
    }
}

impl Show for Spanned<parser::Error> {
    fn show(&self, f: &mut Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        let i = ctx.ident_interner;
        prefix(f, self)?;

        use parser::Error::*;
        match self.inner {
            Missing(what) => write!(f, "missing {what}"),
            Unexpected(what) => write!(f, "unexpected {what}"),
            UnknownIdentifier(name) => write!(f, "unknown identifier '{}'", i.get(name)),
            Redeclaration { name, previous } => {
                let name = i.get(name);
                write!(f, "identifier '{name}' already used (declared on line {previous})")
            }
            TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, but got {actual}")
            }
            WrongOperation { lhs, op, rhs } => {
                write!(f, "wrong operation: {lhs} {} {rhs}", op.symbol())
            }
            VoidVariable(name) => write!(f, "'{}' can't hold a void value", i.get(name)),
            NotAFunction(name) => write!(f, "'{}' is not a function", i.get(name)),
            NotAValue(name) => write!(f, "'{}' is a function, not a value", i.get(name)),
            UnexpectedArguments { name, count } => {
                let name = i.get(name);
                write!(f, "function '{name}' takes no arguments, but got {count}")
            }
            Intrinsic(error) => write!(f, "{error}"),
            Arena(exhausted) => {
                write!(f, "too many nodes: the limit of {} was reached", exhausted.limit)
            }
        }
    }
}

impl Show for Spanned<codegen::Error> {
    fn show(&self, f: &mut Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        let i = ctx.ident_interner;
        prefix(f, self)?;

        use codegen::Error::*;
        match self.inner {
            UnknownIdentifier(name) => write!(f, "unknown identifier '{}'", i.get(name)),
            Redeclaration(name) => write!(f, "identifier '{}' already used", i.get(name)),
            Intrinsic(error) => write!(f, "{error}"),
            Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl Show for session::Error {
    fn show(&self, f: &mut Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        match self {
            session::Error::Lex(error) => error.show(f, ctx),
            session::Error::Parse(error) => error.show(f, ctx),
            session::Error::Codegen(error) => error.show(f, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        token::Line,
        types::ValueType,
        util::{intern::Interner, test_utils::format_errors},
    };

    #[test]
    fn plain_and_alternate_forms() {
        let mut i = Interner::with_capacity(2);
        let x = i.intern("x");
        let ctx = Context { ident_interner: &i };

        let error = Line(3).wrap(parser::Error::Redeclaration {
            name: x,
            previous: Line(1),
        });
        assert_eq!(
            format!("{}", error.display(&ctx)),
            "identifier 'x' already used (declared on line 1)"
        );
        assert_eq!(
            format!("{:#}", error.display(&ctx)),
            "[Error] line 3: identifier 'x' already used (declared on line 1)"
        );
    }

    #[test]
    fn errors_of_every_phase() {
        let mut i = Interner::with_capacity(2);
        let f = i.intern("f");

        let lex = [Line(2).wrap(lexer::Error::LonePipe)];
        assert_eq!(
            format_errors(&i, &lex),
            ["[Error] line 2: expected `||`, but got a lone `|`"]
        );

        let parse = [Line(1).wrap(parser::Error::TypeMismatch {
            expected: ValueType::Int,
            actual: ValueType::Char,
        })];
        assert_eq!(
            format_errors(&i, &parse),
            ["[Error] line 1: type mismatch: expected int, but got char"]
        );

        let codegen = [Line(4).wrap(codegen::Error::UnknownIdentifier(f))];
        assert_eq!(
            format_errors(&i, &codegen),
            ["[Error] line 4: unknown identifier 'f'"]
        );
    }
}
