//! Restricted arithmetic expression evaluator.
//!
//! Only digits, `+ - * / ( ) .` and spaces are accepted. Expressions are
//! parsed by recursive descent with this precedence, highest first:
//!
//! 1. parentheses
//! 2. power `**` (right associative, binds tighter than a unary sign on its left)
//! 3. unary `+` / `-`
//! 4. multiplication `*`, division `/`, floor division `//`
//! 5. addition `+`, subtraction `-`

use thiserror::Error;

/// Characters an expression may contain.
pub const ALLOWED_CHARS: &str = "0123456789+-*/(). ";

/// Deepest nesting of parentheses and exponents the parser will follow.
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("expression contains disallowed characters")]
    DisallowedCharacter(char),

    #[error("empty expression")]
    Empty,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("unexpected '{token}' at position {pos}")]
    UnexpectedToken { token: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite real number")]
    NonFinite,

    #[error("expression nested too deeply (limit {MAX_DEPTH})")]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Pow,
    Slash,
    FloorSlash,
    LParen,
    RParen,
}

impl Token {
    fn symbol(&self) -> String {
        match self {
            Token::Num(n) => n.to_string(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Pow => "**".into(),
            Token::Slash => "/".into(),
            Token::FloorSlash => "//".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

/// Evaluate `input`, rejecting anything outside [`ALLOWED_CHARS`].
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
    if let Some(c) = input.chars().find(|c| !ALLOWED_CHARS.contains(*c)) {
        return Err(ExprError::DisallowedCharacter(c));
    }

    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some((tok, pos)) = parser.peek_with_pos() {
        return Err(ExprError::UnexpectedToken {
            token: tok.symbol(),
            pos,
        });
    }

    if !value.is_finite() {
        return Err(ExprError::NonFinite);
    }
    Ok(value)
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ExprError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let tok = match c {
            ' ' => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let has_digit = literal.chars().any(|c| c.is_ascii_digit());
                let value = literal
                    .parse::<f64>()
                    .ok()
                    .filter(|_| has_digit)
                    .ok_or(ExprError::InvalidNumber(literal))?;
                tokens.push((Token::Num(value), start));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Pow
            }
            '*' => Token::Star,
            '/' if chars.get(i + 1) == Some(&'/') => {
                i += 1;
                Token::FloorSlash
            }
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(ExprError::DisallowedCharacter(other)),
        };
        tokens.push((tok, start));
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn peek_with_pos(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<f64, ExprError>,
    ) -> Result<f64, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        self.depth += 1;
        let value = f(self);
        self.depth -= 1;
        value
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.bump();
            let rhs = self.term()?;
            acc = if op == Token::Plus { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    // term := unary (('*' | '/' | '//') unary)*
    fn term(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::FloorSlash)) = self.peek() {
            self.bump();
            let rhs = self.unary()?;
            acc = match op {
                Token::Star => acc * rhs,
                _ if rhs == 0.0 => return Err(ExprError::DivisionByZero),
                Token::Slash => acc / rhs,
                _ => (acc / rhs).floor(),
            };
        }
        Ok(acc)
    }

    // unary := ('+' | '-')* power
    fn unary(&mut self) -> Result<f64, ExprError> {
        let mut negate = false;
        while let Some(sign @ (Token::Plus | Token::Minus)) = self.peek() {
            self.bump();
            negate ^= sign == Token::Minus;
        }
        let value = self.power()?;
        Ok(if negate { -value } else { value })
    }

    // power := primary ('**' unary)?
    fn power(&mut self) -> Result<f64, ExprError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Pow) {
            self.bump();
            let exponent = self.nested(Self::unary)?;
            if base == 0.0 && exponent < 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64, ExprError> {
        match self.peek_with_pos() {
            Some((Token::Num(n), _)) => {
                self.bump();
                Ok(n)
            }
            Some((Token::LParen, _)) => {
                self.bump();
                let value = self.nested(Self::expr)?;
                match self.peek_with_pos() {
                    Some((Token::RParen, _)) => {
                        self.bump();
                        Ok(value)
                    }
                    Some((tok, pos)) => Err(ExprError::UnexpectedToken {
                        token: tok.symbol(),
                        pos,
                    }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some((tok, pos)) => Err(ExprError::UnexpectedToken {
                token: tok.symbol(),
                pos,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_examples() {
        assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
        assert_eq!(evaluate("2**3*4").unwrap(), 32.0);
        assert_eq!(evaluate("2 ** 3 * 4").unwrap(), 32.0);
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(evaluate("2**3**2").unwrap(), 512.0);
    }

    #[test]
    fn test_unary_sign() {
        assert_eq!(evaluate("-2**2").unwrap(), -4.0);
        assert_eq!(evaluate("(-2)**2").unwrap(), 4.0);
        assert_eq!(evaluate("2**-1").unwrap(), 0.5);
        assert_eq!(evaluate("--3").unwrap(), 3.0);
        assert_eq!(evaluate("+3 - -3").unwrap(), 6.0);
    }

    #[test]
    fn test_left_associative_operators() {
        assert_eq!(evaluate("10-4-3").unwrap(), 3.0);
        assert_eq!(evaluate("64/4/2").unwrap(), 8.0);
    }

    #[test]
    fn test_floor_division_and_decimals() {
        assert_eq!(evaluate("7//2").unwrap(), 3.0);
        assert_eq!(evaluate("-7//2").unwrap(), -4.0);
        assert_eq!(evaluate("1.5*2").unwrap(), 3.0);
        assert_eq!(evaluate(".5+3.").unwrap(), 3.5);
    }

    #[test]
    fn test_letters_are_rejected() {
        assert_eq!(
            evaluate("2+a"),
            Err(ExprError::DisallowedCharacter('a'))
        );
        assert!(evaluate("__import__('os')").is_err());
        assert!(evaluate("2^3").is_err());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(evaluate("1/0"), Err(ExprError::DivisionByZero));
        assert_eq!(evaluate("1//(2-2)"), Err(ExprError::DivisionByZero));
        assert_eq!(evaluate("0**-1"), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(evaluate(""), Err(ExprError::Empty));
        assert_eq!(evaluate("   "), Err(ExprError::Empty));
        assert_eq!(evaluate("(1+2"), Err(ExprError::UnexpectedEnd));
        assert!(matches!(
            evaluate("1+2)"),
            Err(ExprError::UnexpectedToken { pos: 3, .. })
        ));
        assert!(matches!(evaluate("1..2"), Err(ExprError::InvalidNumber(_))));
        assert!(matches!(evaluate("."), Err(ExprError::InvalidNumber(_))));
        assert!(matches!(
            evaluate("2 3"),
            Err(ExprError::UnexpectedToken { .. })
        ));
        assert_eq!(evaluate("2*"), Err(ExprError::UnexpectedEnd));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let parens = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        assert_eq!(evaluate(&parens), Err(ExprError::TooDeep));

        let powers = format!("2{}", "**1".repeat(50_000));
        assert_eq!(evaluate(&powers), Err(ExprError::TooDeep));

        let nested = format!("{}7{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(evaluate(&nested), Ok(7.0));
    }

    #[test]
    fn test_long_sign_runs_do_not_recurse() {
        let signs = format!("{}1", "-".repeat(100_000));
        assert_eq!(evaluate(&signs), Ok(1.0));
        let odd = format!("{}1", "-".repeat(100_001));
        assert_eq!(evaluate(&odd), Ok(-1.0));
    }

    #[test]
    fn test_non_finite_results() {
        assert_eq!(evaluate("(-8)**0.5"), Err(ExprError::NonFinite));
        assert_eq!(evaluate("10**400"), Err(ExprError::NonFinite));
    }
}
