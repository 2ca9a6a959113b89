use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: Line,
}

impl Token {
    pub fn new(kind: TokenKind, line: Line) -> Token {
        Token { kind, line }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.line)
    }
}

/// A 1-based source line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Line(pub u32);

impl Line {
    pub const FIRST: Line = Line(1);

    pub fn next(self) -> Line {
        Line(self.0 + 1)
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { line: self, inner }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub line: Line,
    pub inner: T,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Var,
    Func,
    Return,
    While,
    If,
    Elif,
    Else,

    TypeBool,
    TypeInt,
    TypeChar,
    TypeString,

    True,
    False,
    Int(i64),
    Char(char),
    String(Box<str>),
    Identifier(Box<str>),

    /// `=`
    Assign,
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Plus,
    Minus,
    Star,
    Slash,
    /// `++`
    Increment,
    /// `--`
    Decrement,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    GreaterEq,
    Greater,
    LessEq,
    Less,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
}

impl TokenKind {
    /// Human readable description, used in "missing ..." diagnostics.
    pub fn describe(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Var => "`var`",
            Func => "`func`",
            Return => "`return`",
            While => "`while`",
            If => "`if`",
            Elif => "`elif`",
            Else => "`else`",
            TypeBool => "`bool`",
            TypeInt => "`int`",
            TypeChar => "`char`",
            TypeString => "`string`",
            True | False => "boolean literal",
            Int(_) => "integer literal",
            Char(_) => "char literal",
            String(_) => "string literal",
            Identifier(_) => "identifier",
            Assign => "`=`",
            Colon => "`:`",
            Comma => "`,`",
            LParen => "`(`",
            RParen => "`)`",
            LBrace => "`{`",
            RBrace => "`}`",
            Plus => "`+`",
            Minus => "`-`",
            Star => "`*`",
            Slash => "`/`",
            Increment => "`++`",
            Decrement => "`--`",
            EqEq => "`==`",
            NotEq => "`!=`",
            GreaterEq => "`>=`",
            Greater => "`>`",
            LessEq => "`<=`",
            Less => "`<`",
            And => "`&&`",
            Or => "`||`",
            Not => "`!`",
        }
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "var" => TokenKind::Var,
    "func" => TokenKind::Func,
    "return" => TokenKind::Return,
    "while" => TokenKind::While,
    "if" => TokenKind::If,
    "elif" => TokenKind::Elif,
    "else" => TokenKind::Else,
    "bool" => TokenKind::TypeBool,
    "int" => TokenKind::TypeInt,
    "char" => TokenKind::TypeChar,
    "string" => TokenKind::TypeString,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
};
