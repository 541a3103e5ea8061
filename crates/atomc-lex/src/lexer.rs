use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};
use atomc_util::LexError;

/// Char-dispatch lexer over AtomC source. `next_token` is the DFA: each
/// match arm below is a state transition that both recognizes a lexeme and
/// decides whether to consume (per the `next_state(state, ch)` contract —
/// accepting states never consume the character that ends their lexeme).
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            done: false,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek_char() == Some('/') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    while !matches!(self.cursor.current_char(), None | Some('\n') | Some('\r')) {
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments();

        let line = self.cursor.line();

        let Some(c) = self.cursor.current_char() else {
            self.done = true;
            return Ok(Token::new(TokenKind::End, line));
        };

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.lex_identifier(line));
        }
        if c.is_ascii_digit() {
            return self.lex_number(line);
        }

        match c {
            '"' => self.lex_string(line),
            '\'' => self.lex_char(line),
            ',' => self.single(TokenKind::Comma, line),
            ';' => self.single(TokenKind::Semicolon, line),
            '(' => self.single(TokenKind::Lpar, line),
            ')' => self.single(TokenKind::Rpar, line),
            '[' => self.single(TokenKind::Lbracket, line),
            ']' => self.single(TokenKind::Rbracket, line),
            '{' => self.single(TokenKind::Lacc, line),
            '}' => self.single(TokenKind::Racc, line),
            '.' => self.single(TokenKind::Dot, line),
            '+' => self.single(TokenKind::Add, line),
            '-' => self.single(TokenKind::Sub, line),
            '*' => self.single(TokenKind::Mul, line),
            '/' => self.single(TokenKind::Div, line),
            '&' => self.lex_two('&', TokenKind::And, None, line),
            '|' => self.lex_two('|', TokenKind::Or, None, line),
            '=' => self.lex_two('=', TokenKind::Equal, Some(TokenKind::Assign), line),
            '!' => self.lex_two('=', TokenKind::Noteq, Some(TokenKind::Not), line),
            '<' => self.lex_two('=', TokenKind::Lesseq, Some(TokenKind::Less), line),
            '>' => self.lex_two('=', TokenKind::Greatereq, Some(TokenKind::Greater), line),
            other => {
                self.cursor.advance();
                Err(LexError::UnrecognizedChar { line, ch: other })
            }
        }
    }

    fn single(&mut self, kind: TokenKind, line: u32) -> Result<Token, LexError> {
        self.cursor.advance();
        Ok(Token::new(kind, line))
    }

    /// Two-character lookahead: `ch` extends the single-char token into a
    /// two-char one (`==`, `!=`, `<=`, `>=`) when it follows immediately;
    /// otherwise falls back to `single_kind` if given, or errors (used for
    /// `&`/`|`, which AtomC only recognizes doubled).
    fn lex_two(
        &mut self,
        second: char,
        double_kind: TokenKind,
        single_kind: Option<TokenKind>,
        line: u32,
    ) -> Result<Token, LexError> {
        let first = self.cursor.current_char().unwrap();
        self.cursor.advance();
        if self.cursor.current_char() == Some(second) {
            self.cursor.advance();
            Ok(Token::new(double_kind, line))
        } else if let Some(kind) = single_kind {
            Ok(Token::new(kind, line))
        } else {
            Err(LexError::UnrecognizedChar { line, ch: first })
        }
    }

    fn lex_identifier(&mut self, line: u32) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.cursor.current_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        match TokenKind::keyword(&lexeme) {
            Some(kw) => Token::new(kw, line),
            None => Token::new(TokenKind::Id(lexeme), line),
        }
    }

    fn lex_number(&mut self, line: u32) -> Result<Token, LexError> {
        let mut lexeme = String::new();
        let mut is_real = false;

        while matches!(self.cursor.current_char(), Some(c) if c.is_ascii_digit()) {
            lexeme.push(self.cursor.advance().unwrap());
        }

        if self.cursor.current_char() == Some('.')
            && matches!(self.cursor.peek_char(), Some(c) if c.is_ascii_digit())
        {
            is_real = true;
            lexeme.push(self.cursor.advance().unwrap()); // '.'
            while matches!(self.cursor.current_char(), Some(c) if c.is_ascii_digit()) {
                lexeme.push(self.cursor.advance().unwrap());
            }
        }

        if matches!(self.cursor.current_char(), Some('e') | Some('E')) {
            let mut lookahead_ok = matches!(self.cursor.peek_char(), Some(c) if c.is_ascii_digit());
            let exp_snapshot = self.cursor.snapshot();
            let e = self.cursor.advance().unwrap();
            let mut sign = None;
            if matches!(self.cursor.current_char(), Some('+') | Some('-')) {
                sign = self.cursor.current_char();
                self.cursor.advance();
                lookahead_ok = matches!(self.cursor.current_char(), Some(c) if c.is_ascii_digit());
            }
            if lookahead_ok {
                is_real = true;
                lexeme.push(e);
                if let Some(s) = sign {
                    lexeme.push(s);
                }
                while matches!(self.cursor.current_char(), Some(c) if c.is_ascii_digit()) {
                    lexeme.push(self.cursor.advance().unwrap());
                }
            } else {
                self.cursor.restore(exp_snapshot);
            }
        }

        if is_real {
            lexeme
                .parse::<f64>()
                .map(|v| Token::new(TokenKind::CtReal(v), line))
                .map_err(|_| LexError::InvalidNumber { line, lexeme })
        } else {
            lexeme
                .parse::<i64>()
                .map(|v| Token::new(TokenKind::CtInt(v), line))
                .map_err(|_| LexError::InvalidNumber { line, lexeme })
        }
    }

    fn lex_char(&mut self, line: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // opening '
        let Some(c) = self.cursor.current_char() else {
            return Err(LexError::UnterminatedChar { line });
        };
        self.cursor.advance();
        if self.cursor.current_char() != Some('\'') {
            return Err(LexError::UnterminatedChar { line });
        }
        self.cursor.advance(); // closing '
        Ok(Token::new(TokenKind::CtChar(c), line))
    }

    fn lex_string(&mut self, line: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // opening "
        let mut s = String::new();
        loop {
            match self.cursor.current_char() {
                None | Some('\n') => return Err(LexError::UnterminatedString { line }),
                Some('"') => {
                    self.cursor.advance();
                    return Ok(Token::new(TokenKind::CtString(s), line));
                }
                Some(c) => {
                    s.push(c);
                    self.cursor.advance();
                }
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        Some(self.next_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .map(|t| t.unwrap().kind)
            .collect()
    }

    #[test]
    fn lexes_keyword_vs_identifier() {
        assert_eq!(
            kinds("int x"),
            vec![TokenKind::Int, TokenKind::Id("x".into()), TokenKind::End]
        );
    }

    #[test]
    fn lexes_two_char_operators_without_overreach() {
        assert_eq!(
            kinds("a<=b<c"),
            vec![
                TokenKind::Id("a".into()),
                TokenKind::Lesseq,
                TokenKind::Id("b".into()),
                TokenKind::Less,
                TokenKind::Id("c".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn lexes_real_and_int_literals() {
        assert_eq!(
            kinds("1 2.5 10"),
            vec![
                TokenKind::CtInt(1),
                TokenKind::CtReal(2.5),
                TokenKind::CtInt(10),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("int x; // trailing note\nint y;"),
            vec![
                TokenKind::Int,
                TokenKind::Id("x".into()),
                TokenKind::Semicolon,
                TokenKind::Int,
                TokenKind::Id("y".into()),
                TokenKind::Semicolon,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn counts_lines() {
        let tokens: Vec<Token> = Lexer::new("a\nb").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn rejects_unrecognized_char() {
        let mut lex = Lexer::new("$");
        assert!(lex.next_token().is_err());
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(kinds("int x; x = 2;"), kinds("int x; x = 2;"));
    }
}
