use std::{iter::Peekable, str::Chars};

use crate::token::{Line, Spanned, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes the provided string into a fresh token buffer.
///
/// Comments and whitespace are dropped. The first invalid input aborts the
/// whole scan.
pub fn lex(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    Lexer::new(src).lex(&mut tokens)?;
    log::debug!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

struct Lexer<'src> {
    iter: Peekable<Chars<'src>>,
    line: Line,
    /// Line where the token being scanned started.
    current_line: Line,
}

impl Lexer<'_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self, tokens: &mut Vec<Token>) -> Result<()> {
        while let Some(kind) = self.scan_token_kind()? {
            tokens.push(Token::new(kind, self.current_line));
        }
        Ok(())
    }

    /// Scans the next token, skipping trivia. Returns `None` at the end of
    /// the input.
    fn scan_token_kind(&mut self) -> Result<Option<TokenKind>> {
        use TokenKind::*;
        loop {
            let Some(c) = self.mark_advance() else {
                return Ok(None);
            };
            let kind = match c {
                '\n' => {
                    self.line = self.line.next();
                    continue;
                }
                c if c.is_ascii_whitespace() => continue,
                '/' => match self.peek() {
                    Some('/') => {
                        self.inline_comment();
                        continue;
                    }
                    Some('*') => {
                        self.multiline_comment()?;
                        continue;
                    }
                    _ => Slash,
                },
                '=' => self.with_eq(EqEq, Assign),
                '!' => self.with_eq(NotEq, Not),
                '>' => self.with_eq(GreaterEq, Greater),
                '<' => self.with_eq(LessEq, Less),
                '+' => match self.peek() {
                    Some('+') => self.advance_with(Increment),
                    _ => Plus,
                },
                '-' => match self.peek() {
                    Some('-') => self.advance_with(Decrement),
                    _ => Minus,
                },
                '&' => match self.peek() {
                    Some('&') => self.advance_with(And),
                    _ => return Err(self.error(Error::LoneAmpersand)),
                },
                '|' => match self.peek() {
                    Some('|') => self.advance_with(Or),
                    _ => return Err(self.error(Error::LonePipe)),
                },
                '*' => Star,
                ':' => Colon,
                ',' => Comma,
                '(' => LParen,
                ')' => RParen,
                '{' => LBrace,
                '}' => RBrace,
                '\'' => self.char()?,
                '"' => self.string()?,
                c if c.is_ascii_alphabetic() => self.identifier_or_keyword(c),
                c if c.is_ascii_digit() => self.number(c)?,
                c => return Err(self.error(Error::InvalidCharacter(c))),
            };
            return Ok(Some(kind));
        }
    }

    fn identifier_or_keyword(&mut self, first: char) -> TokenKind {
        let mut buf = String::from(first);
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            buf.push(c);
            self.advance();
        }
        match KEYWORDS.get(buf.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenKind::Identifier(buf.into_boxed_str()),
        }
    }

    fn number(&mut self, first: char) -> Result<TokenKind> {
        let mut buf = String::from(first);
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            buf.push(c);
            self.advance();
        }
        buf.parse()
            .map(TokenKind::Int)
            .map_err(|_| self.error(Error::IntegerOverflow))
    }

    fn char(&mut self) -> Result<TokenKind> {
        let c = match self.advance() {
            None | Some('\n') => return Err(self.error(Error::UnterminatedChar)),
            Some('\'') => return Err(self.error(Error::EmptyChar)),
            Some('\\') => match self.advance() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('0') => '\0',
                Some('\\') => '\\',
                Some('\'') => '\'',
                _ => return Err(self.error(Error::UnterminatedChar)),
            },
            Some(c) => c,
        };
        if self.advance() != Some('\'') {
            return Err(self.error(Error::UnterminatedChar));
        }
        Ok(TokenKind::Char(c))
    }

    /// Scans a string literal, performing escapes as it goes. Strings can't
    /// contain raw line breaks.
    fn string(&mut self) -> Result<TokenKind> {
        let mut buf = String::new();
        loop {
            let c = match self.advance() {
                None | Some('\n') => return Err(self.error(Error::UnterminatedString)),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    _ => return Err(self.error(Error::UnterminatedString)),
                },
                Some(c) => c,
            };
            buf.push(c);
        }
        Ok(TokenKind::String(buf.into_boxed_str()))
    }

    fn inline_comment(&mut self) {
        while !matches!(self.peek(), Some('\n') | None) {
            self.advance();
        }
    }

    fn multiline_comment(&mut self) -> Result<()> {
        // The opening `*`.
        self.advance();
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some('\n') => self.line = self.line.next(),
                None => return Err(self.line.wrap(Error::UnclosedComment)),
                Some(_) => (),
            }
        }
    }
}

impl Lexer<'_> {
    fn new(src: &str) -> Lexer<'_> {
        Lexer {
            iter: src.chars().peekable(),
            line: Line::FIRST,
            current_line: Line::FIRST,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> Option<char> {
        self.current_line = self.line;
        self.advance()
    }

    /// Returns the next char and advances the iterator.
    fn advance(&mut self) -> Option<char> {
        self.iter.next()
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Picks `with` if the next char is `=` (consuming it), otherwise `without`.
    fn with_eq(&mut self, with: TokenKind, without: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance_with(with)
        } else {
            without
        }
    }

    /// Returns the next char without advancing the iterator.
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    fn error(&self, error: Error) -> Spanned<Error> {
        self.current_line.wrap(error)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    InvalidCharacter(char),
    UnterminatedChar,
    EmptyChar,
    UnterminatedString,
    UnclosedComment,
    LoneAmpersand,
    LonePipe,
    IntegerOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tests_with_line() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "+-*/" => [(Plus, 1), (Minus, 1), (Star, 1), (Slash, 1)],
            "++ -- + +" => [(Increment, 1), (Decrement, 1), (Plus, 1), (Plus, 1)],
            "= == != ! >= > <= < && ||" => [
                (Assign, 1),
                (EqEq, 1),
                (NotEq, 1),
                (Not, 1),
                (GreaterEq, 1),
                (Greater, 1),
                (LessEq, 1),
                (Less, 1),
                (And, 1),
                (Or, 1),
            ],
            "var x: int = 12" => [
                (Var, 1),
                (Identifier("x".into()), 1),
                (Colon, 1),
                (TypeInt, 1),
                (Assign, 1),
                (Int(12), 1),
            ],
            "func main() {\n  return 0\n}" => [
                (Func, 1),
                (Identifier("main".into()), 1),
                (LParen, 1),
                (RParen, 1),
                (LBrace, 1),
                (Return, 2),
                (Int(0), 2),
                (RBrace, 3),
            ],
            "true false truth var_1" => [
                (True, 1),
                (False, 1),
                (Identifier("truth".into()), 1),
                (Identifier("var_1".into()), 1),
            ],
            r#"'a' '\n' "hi \"there\"""# => [
                (Char('a'), 1),
                (Char('\n'), 1),
                (String("hi \"there\"".into()), 1),
            ],
            "a // comment\nb /* multi\nline */ c" => [
                (Identifier("a".into()), 1),
                (Identifier("b".into()), 2),
                (Identifier("c".into()), 3),
            ],
            "" => [],
        });

        for (input, tokens) in cases {
            let lexed = lex(input).expect("failed to lex");
            assert_eq!(lexed, tokens, "input: {input:?}");
        }
    }

    #[test]
    fn test_errors() {
        let cases = [
            ("var x = $", Line(1).wrap(Error::InvalidCharacter('$'))),
            ("var x = 1\n\0var y = 2", Line(2).wrap(Error::InvalidCharacter('\0'))),
            ("\n'a", Line(2).wrap(Error::UnterminatedChar)),
            ("''", Line(1).wrap(Error::EmptyChar)),
            ("\"abc\ndef\"", Line(1).wrap(Error::UnterminatedString)),
            ("/* never\n closed", Line(2).wrap(Error::UnclosedComment)),
            ("a & b", Line(1).wrap(Error::LoneAmpersand)),
            ("a | b", Line(1).wrap(Error::LonePipe)),
            ("99999999999999999999", Line(1).wrap(Error::IntegerOverflow)),
        ];
        for (input, error) in cases {
            assert_eq!(lex(input), Err(error), "input: {input:?}");
        }
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $line:expr)),* $(,)?]),* $(,)?
        }) => {{
            [$((
                $str,
                vec![
                    $(Token::new($kind, Line($line))),*
                ],
            )),*]
        }};
    }
    use cases;
}
