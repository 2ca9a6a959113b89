use crate::{
    codegen::Backend,
    session::{Options, Session},
    token::Spanned,
    util::{
        self,
        fmt::{tree, Show},
        intern::Interner,
    },
};

pub fn format_errors<E>(i: &Interner, e: &[Spanned<E>]) -> Vec<String>
where
    Spanned<E>: Show,
{
    let ctx = util::fmt::Context { ident_interner: i };
    e.iter().map(|e| format!("{:#}", e.display(&ctx))).collect()
}

/// Each variant contains the input program.
pub enum Test {
    /// Parses and prints the tree.
    Parser(&'static str),
    /// Compiles with the text backend.
    Text(&'static str),
    /// Compiles with the stack backend.
    Stack(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    OutputOk(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

/// Runs the pipeline a test asks for, returning the printed tree (or the
/// generated output) and the rendered errors.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    let (src, backend) = match test {
        Test::Parser(src) => (src, None),
        Test::Text(src) => (src, Some(Backend::Text)),
        Test::Stack(src) => (src, Some(Backend::Stack)),
    };
    let mut session = Session::new(Options {
        backend: backend.unwrap_or_default(),
        ..Options::default()
    });

    let result = session.lex(src).and_then(|tokens| {
        let program = session.parse(&tokens)?;
        match backend {
            None => Ok(tree::print_program_string(
                session.idents(),
                session.ast(),
                &program,
            )),
            Some(_) => session.generate(&program),
        }
    });

    match result {
        Ok(out) => (out, vec![]),
        Err(error) => (String::new(), vec![session.render(&error)]),
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_out: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected) | Assertion::OutputOk(expected) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_out.trim(), expected.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let (formatted_actual_out, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_out, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, output_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::OutputOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::Parser($source)
    };
    (@@get_test(text, program), $source:expr) => {
        crate::util::test_utils::Test::Text($source)
    };
    (@@get_test(stack, program), $source:expr) => {
        crate::util::test_utils::Test::Stack($source)
    };
}
pub(crate) use tree_tests;
