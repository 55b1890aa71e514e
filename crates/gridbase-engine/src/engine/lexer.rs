//! Formula tokenizer.

use crate::error::{FormulaError, Result};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    String(String),
    Ident(String),
    /// `{Name}` or `{uuid}`, braces stripped and trimmed.
    FieldRef(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Eof,
}

pub(crate) struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    len: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.len)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn consume_while<F>(&mut self, mut predicate: F) -> String
    where
        F: FnMut(char) -> bool,
    {
        let mut buf = String::new();
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            buf.push(ch);
            self.bump();
        }
        buf
    }

    /// Returns the next token and the byte offset where it starts.
    pub(crate) fn next_token(&mut self) -> Result<(Token, usize)> {
        self.consume_while(char::is_whitespace);
        let start = self.offset();
        let Some(ch) = self.peek() else {
            return Ok((Token::Eof, start));
        };

        let single = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '&' => Some(Token::Ampersand),
            _ => None,
        };
        if let Some(token) = single {
            self.bump();
            return Ok((token, start));
        }

        let token = match ch {
            '=' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                }
                Token::Equals
            }
            '!' => {
                self.bump();
                if self.peek() != Some('=') {
                    return Err(FormulaError::parse(start, "expected '=' after '!'"));
                }
                self.bump();
                Token::NotEquals
            }
            '<' => {
                self.bump();
                match self.peek() {
                    Some('=') => {
                        self.bump();
                        Token::LessEquals
                    }
                    Some('>') => {
                        self.bump();
                        Token::NotEquals
                    }
                    _ => Token::Less,
                }
            }
            '>' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Token::GreaterEquals
                } else {
                    Token::Greater
                }
            }
            '"' => self.string_literal(start)?,
            '{' => self.field_ref(start)?,
            c if c.is_ascii_digit() || c == '.' => self.number(start)?,
            c if is_ident_start(c) => Token::Ident(self.consume_while(is_ident_part)),
            other => {
                return Err(FormulaError::parse(
                    start,
                    format!("unexpected character {other:?}"),
                ));
            }
        };
        Ok((token, start))
    }

    fn string_literal(&mut self, start: usize) -> Result<Token> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(FormulaError::parse(start, "unterminated string")),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(FormulaError::parse(start, "unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
        Ok(Token::String(out))
    }

    fn field_ref(&mut self, start: usize) -> Result<Token> {
        self.bump();
        let name = self.consume_while(|c| c != '}' && c != '{');
        if self.bump() != Some('}') {
            return Err(FormulaError::parse(start, "unterminated field reference"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(FormulaError::parse(start, "empty field reference"));
        }
        Ok(Token::FieldRef(name.to_string()))
    }

    fn number(&mut self, start: usize) -> Result<Token> {
        let mut num_str = self.consume_while(|c| c.is_ascii_digit() || c == '.');
        if matches!(self.peek(), Some('e' | 'E')) {
            num_str.extend(self.bump());
            if matches!(self.peek(), Some('+' | '-')) {
                num_str.extend(self.bump());
            }
            let exp_digits = self.consume_while(|c| c.is_ascii_digit());
            if exp_digits.is_empty() {
                return Err(FormulaError::parse(
                    start,
                    format!("invalid number {num_str:?} (expected exponent digits)"),
                ));
            }
            num_str.push_str(&exp_digits);
        }
        let n = num_str
            .parse::<f64>()
            .map_err(|_| FormulaError::parse(start, format!("invalid number {num_str:?}")))?;
        // Literals too large for f64 parse as infinity.
        if !n.is_finite() {
            return Err(FormulaError::parse(start, "number out of range"));
        }
        Ok(Token::Number(n))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let (token, _) = lexer.next_token().unwrap();
            if token == Token::Eof {
                break;
            }
            out.push(token);
        }
        out
    }

    #[test]
    fn test_tokenizes_call_with_field_ref() {
        assert_eq!(
            tokens(r#"CONCAT({First Name}, ", ")"#),
            vec![
                Token::Ident("CONCAT".into()),
                Token::LParen,
                Token::FieldRef("First Name".into()),
                Token::Comma,
                Token::String(", ".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""say \"hi\"\n""#),
            vec![Token::String("say \"hi\"\n".into())]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("1 2.5 .5 1e3 2E-1"),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Number(1000.0),
                Token::Number(0.2),
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            tokens("= == != <> < <= > >="),
            vec![
                Token::Equals,
                Token::Equals,
                Token::NotEquals,
                Token::NotEquals,
                Token::Less,
                Token::LessEquals,
                Token::Greater,
                Token::GreaterEquals,
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("\"open").next_token().is_err());
        assert!(Lexer::new("{open").next_token().is_err());
        assert!(Lexer::new("{ }").next_token().is_err());
        assert!(Lexer::new("1.2.3").next_token().is_err());
        assert!(Lexer::new("1e").next_token().is_err());
        assert!(Lexer::new("#").next_token().is_err());
    }

    #[test]
    fn test_number_out_of_range() {
        assert_eq!(
            Lexer::new("1e309").next_token(),
            Err(FormulaError::parse(0, "number out of range"))
        );
        assert_eq!(tokens("1e308"), vec![Token::Number(1e308)]);
    }
}
