use std::fmt;

use crate::{ast::BinaryOperator, token::TokenKind};

/// The type of every value (and of every typed statement) in the language.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Void,
    Bool,
    Int,
    Char,
    String,
}

impl ValueType {
    /// Maps a type keyword to its type.
    pub fn from_keyword(kind: &TokenKind) -> Option<ValueType> {
        let ty = match kind {
            TokenKind::TypeBool => ValueType::Bool,
            TokenKind::TypeInt => ValueType::Int,
            TokenKind::TypeChar => ValueType::Char,
            TokenKind::TypeString => ValueType::String,
            _ => return None,
        };
        Some(ty)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Char => "char",
            ValueType::String => "string",
        }
    }

    /// Type-combination rule of the binary operators. Returns `None` if the
    /// operator can't be applied to the given operand types.
    pub fn binary_result(lhs: ValueType, op: BinaryOperator, rhs: ValueType) -> Option<ValueType> {
        use BinaryOperator::*;
        use ValueType::*;
        match (op, lhs, rhs) {
            (And | Or, Bool, Bool) => Some(Bool),
            (Add | Sub | Mul | Div, Int, Int) => Some(Int),
            (Eq | NotEq, l, r) if l == r && l != Void => Some(Bool),
            (GreaterEq | Greater | LessEq | Less, Int, Int)
            | (GreaterEq | Greater | LessEq | Less, Char, Char) => Some(Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BinaryOperator::*;
    use ValueType::*;

    #[test]
    fn logical_operators_need_bools() {
        assert_eq!(ValueType::binary_result(Bool, And, Bool), Some(Bool));
        assert_eq!(ValueType::binary_result(Bool, Or, Bool), Some(Bool));
        assert_eq!(ValueType::binary_result(Int, And, Bool), None);
        assert_eq!(ValueType::binary_result(Bool, Or, Char), None);
    }

    #[test]
    fn arithmetic_needs_ints() {
        for op in [Add, Sub, Mul, Div] {
            assert_eq!(ValueType::binary_result(Int, op, Int), Some(Int));
            assert_eq!(ValueType::binary_result(String, op, Char), None);
            assert_eq!(ValueType::binary_result(Int, op, Bool), None);
        }
    }

    #[test]
    fn comparisons() {
        assert_eq!(ValueType::binary_result(String, Eq, String), Some(Bool));
        assert_eq!(ValueType::binary_result(Bool, NotEq, Bool), Some(Bool));
        assert_eq!(ValueType::binary_result(Int, Eq, Char), None);
        assert_eq!(ValueType::binary_result(Void, Eq, Void), None);

        assert_eq!(ValueType::binary_result(Char, Less, Char), Some(Bool));
        assert_eq!(ValueType::binary_result(Int, GreaterEq, Int), Some(Bool));
        assert_eq!(ValueType::binary_result(Bool, Greater, Bool), None);
        assert_eq!(ValueType::binary_result(String, LessEq, String), None);
    }

    #[test]
    fn keywords() {
        assert_eq!(ValueType::from_keyword(&TokenKind::TypeInt), Some(Int));
        assert_eq!(ValueType::from_keyword(&TokenKind::TypeString), Some(String));
        assert_eq!(ValueType::from_keyword(&TokenKind::Int(1)), None);
    }
}
