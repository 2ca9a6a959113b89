//! Built-in calls. They are resolved before any user-defined identifier, so a
//! program can't declare a function or variable with one of these names and
//! call it.

use crate::types::ValueType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intrinsic {
    /// Writes every argument, in order.
    Print,
    /// Like [`Intrinsic::Print`], followed by a line break.
    Println,
    /// Digit to char: `itoc(7) == '7'`.
    Itoc,
    /// Char to digit: `ctoi('7') == 7`.
    Ctoi,
}

static INTRINSICS: phf::Map<&'static str, Intrinsic> = phf::phf_map! {
    "print" => Intrinsic::Print,
    "println" => Intrinsic::Println,
    "itoc" => Intrinsic::Itoc,
    "ctoi" => Intrinsic::Ctoi,
};

impl Intrinsic {
    /// Returns the intrinsic called `name`, if any.
    pub fn lookup(name: &str) -> Option<Intrinsic> {
        INTRINSICS.get(name).copied()
    }

    /// Resolves a call: `Ok(None)` if `name` isn't a built-in, otherwise the
    /// intrinsic, provided the argument types fit its contract.
    pub fn resolve(name: &str, args: &[ValueType]) -> Result<Option<Intrinsic>, Error> {
        let Some(intrinsic) = Intrinsic::lookup(name) else {
            return Ok(None);
        };
        intrinsic.validate(args)?;
        Ok(Some(intrinsic))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Intrinsic::Print => "print",
            Intrinsic::Println => "println",
            Intrinsic::Itoc => "itoc",
            Intrinsic::Ctoi => "ctoi",
        }
    }

    pub const fn return_type(self) -> ValueType {
        match self {
            Intrinsic::Print | Intrinsic::Println => ValueType::Void,
            Intrinsic::Itoc => ValueType::Char,
            Intrinsic::Ctoi => ValueType::Int,
        }
    }

    pub fn validate(self, args: &[ValueType]) -> Result<(), Error> {
        match self {
            Intrinsic::Print | Intrinsic::Println => {
                if args.contains(&ValueType::Void) {
                    return Err(Error::VoidArgument { intrinsic: self });
                }
                Ok(())
            }
            Intrinsic::Itoc => self.single(args, ValueType::Int),
            Intrinsic::Ctoi => self.single(args, ValueType::Char),
        }
    }

    fn single(self, args: &[ValueType], expected: ValueType) -> Result<(), Error> {
        let [actual] = args else {
            return Err(Error::ArgumentCount {
                intrinsic: self,
                expected: 1,
                actual: args.len(),
            });
        };
        if *actual != expected {
            return Err(Error::ArgumentType {
                intrinsic: self,
                expected,
                actual: *actual,
            });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    ArgumentCount {
        intrinsic: Intrinsic,
        expected: usize,
        actual: usize,
    },
    ArgumentType {
        intrinsic: Intrinsic,
        expected: ValueType,
        actual: ValueType,
    },
    VoidArgument {
        intrinsic: Intrinsic,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ArgumentCount {
                intrinsic,
                expected,
                actual,
            } => {
                let name = intrinsic.name();
                write!(f, "`{name}` takes {expected} argument(s), but got {actual}")
            }
            Error::ArgumentType {
                intrinsic,
                expected,
                actual,
            } => {
                let name = intrinsic.name();
                write!(f, "`{name}` expects an argument of type {expected}, but got {actual}")
            }
            Error::VoidArgument { intrinsic } => {
                write!(f, "`{}` can't take a void argument", intrinsic.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ValueType::*;

    #[test]
    fn unknown_names_are_not_builtins() {
        assert_eq!(Intrinsic::resolve("main", &[]), Ok(None));
        assert_eq!(Intrinsic::resolve("Print", &[Int]), Ok(None));
    }

    #[test]
    fn print_takes_anything() {
        assert_eq!(Intrinsic::resolve("print", &[]), Ok(Some(Intrinsic::Print)));
        assert_eq!(
            Intrinsic::resolve("println", &[Int, Char, String, Bool]),
            Ok(Some(Intrinsic::Println))
        );
        assert_eq!(
            Intrinsic::resolve("print", &[Int, Void]),
            Err(Error::VoidArgument {
                intrinsic: Intrinsic::Print
            })
        );
    }

    #[test]
    fn itoc_needs_one_int() {
        assert_eq!(Intrinsic::resolve("itoc", &[Int]), Ok(Some(Intrinsic::Itoc)));
        assert_eq!(
            Intrinsic::resolve("itoc", &[Char]),
            Err(Error::ArgumentType {
                intrinsic: Intrinsic::Itoc,
                expected: Int,
                actual: Char,
            })
        );
        assert_eq!(
            Intrinsic::resolve("itoc", &[Int, Int]),
            Err(Error::ArgumentCount {
                intrinsic: Intrinsic::Itoc,
                expected: 1,
                actual: 2,
            })
        );
    }

    #[test]
    fn ctoi_needs_one_char() {
        assert_eq!(Intrinsic::resolve("ctoi", &[Char]), Ok(Some(Intrinsic::Ctoi)));
        assert_eq!(
            Intrinsic::resolve("ctoi", &[]),
            Err(Error::ArgumentCount {
                intrinsic: Intrinsic::Ctoi,
                expected: 1,
                actual: 0,
            })
        );
    }

    #[test]
    fn return_types() {
        assert_eq!(Intrinsic::Print.return_type(), Void);
        assert_eq!(Intrinsic::Println.return_type(), Void);
        assert_eq!(Intrinsic::Itoc.return_type(), Char);
        assert_eq!(Intrinsic::Ctoi.return_type(), Int);
    }
}
