//! `eval(...)` expressions
//!
//! Recipe values may be written as `eval(<expr>)` to derive them from global
//! variables, for example `end_epoch: eval(num_epochs - 2)`. The grammar is
//! plain arithmetic:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | atom
//! atom   := number | identifier | '(' expr ')'
//! ```

use super::RecipeError;

/// Extract the inner expression of an `eval(...)` string, if it is one.
pub fn as_eval(value: &str) -> Option<&str> {
    value
        .trim()
        .strip_prefix("eval(")
        .and_then(|rest| rest.strip_suffix(')'))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent: 1e-3, 2.5E4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|e| format!("bad number '{text}': {e}"))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

struct Parser<'a, F> {
    tokens: Vec<Token>,
    pos: usize,
    expr: &'a str,
    lookup: F,
}

impl<F> Parser<'_, F>
where
    F: FnMut(&str) -> Result<f64, RecipeError>,
{
    fn err(&self, reason: impl Into<String>) -> RecipeError {
        RecipeError::Expression {
            expr: self.expr.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<f64, RecipeError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, RecipeError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(self.err("division by zero"));
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, RecipeError> {
        if let Some(Token::Op('-')) = self.peek() {
            self.pos += 1;
            return Ok(-self.unary()?);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<f64, RecipeError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Ident(name)) => (self.lookup)(&name),
            Some(Token::Op('(')) => {
                let v = self.expr()?;
                match self.next() {
                    Some(Token::Op(')')) => Ok(v),
                    _ => Err(self.err("missing ')'")),
                }
            }
            Some(other) => Err(self.err(format!("unexpected token {other:?}"))),
            None => Err(self.err("unexpected end of expression")),
        }
    }
}

/// Evaluate an arithmetic expression, resolving identifiers with `lookup`.
///
/// # Errors
///
/// Syntax errors and division by zero yield [`RecipeError::Expression`];
/// identifier failures are whatever `lookup` returns.
pub fn evaluate<F>(expr: &str, lookup: F) -> Result<f64, RecipeError>
where
    F: FnMut(&str) -> Result<f64, RecipeError>,
{
    let tokens = tokenize(expr).map_err(|reason| RecipeError::Expression {
        expr: expr.to_string(),
        reason,
    })?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        expr,
        lookup,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.err("trailing input"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(name: &str) -> Result<f64, RecipeError> {
        match name {
            "num_epochs" => Ok(10.0),
            "init_lr" => Ok(0.005),
            _ => Err(RecipeError::UnresolvedVariable {
                name: name.to_string(),
                context: "test".to_string(),
            }),
        }
    }

    #[test]
    fn test_as_eval() {
        assert_eq!(as_eval("eval(num_epochs - 1)"), Some("num_epochs - 1"));
        assert_eq!(as_eval("  eval(2) "), Some("2"));
        assert_eq!(as_eval("num_epochs"), None);
        assert_eq!(as_eval("eval(2"), None);
    }

    #[test]
    fn test_precedence_and_parens() {
        assert_eq!(evaluate("1 + 2 * 3", vars).unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3", vars).unwrap(), 9.0);
        assert_eq!(evaluate("-2 * -3", vars).unwrap(), 6.0);
        assert_eq!(evaluate("10 / 4", vars).unwrap(), 2.5);
    }

    #[test]
    fn test_variables() {
        assert_eq!(evaluate("num_epochs - 2", vars).unwrap(), 8.0);
        assert!((evaluate("init_lr * 1e-1", vars).unwrap() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_unresolved_variable() {
        assert!(matches!(
            evaluate("missing + 1", vars),
            Err(RecipeError::UnresolvedVariable { .. })
        ));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["1 +", "(1 + 2", "1 2", "3 $ 4", "", "1 / 0"] {
            assert!(
                matches!(evaluate(bad, vars), Err(RecipeError::Expression { .. })),
                "expected expression error for {bad:?}"
            );
        }
    }
}
