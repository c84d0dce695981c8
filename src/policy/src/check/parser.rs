//! Check-string parser
//!
//! Grammar (`not` binds tighter than `and`, which binds tighter than `or`):
//!
//! ```text
//! expr  := term ("or" term)*
//! term  := unary ("and" unary)*
//! unary := "not" unary | atom
//! atom  := "(" expr ")" | "@" | "!" | kind ":" value
//! ```
//!
//! An empty string is the always-true check.

use super::{CheckExpression, MAX_DEPTH};
use crate::error::{PolicyError, Result};
use crate::types::ScopeType;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    And,
    Or,
    Not,
    Word(&'a str),
}

fn flush_word<'a>(text: &'a str, start: &mut Option<usize>, end: usize, tokens: &mut Vec<Token<'a>>) {
    if let Some(s) = start.take() {
        tokens.push(match &text[s..end] {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            word => Token::Word(word),
        });
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, ch) in text.char_indices() {
        match ch {
            '(' | ')' => {
                flush_word(text, &mut start, i, &mut tokens);
                tokens.push(if ch == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => flush_word(text, &mut start, i, &mut tokens),
            _ => {
                if start.is_none() {
                    start = Some(i);
                }
            }
        }
    }
    flush_word(text, &mut start, text.len(), &mut tokens);

    tokens
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,

    /// Open parentheses and `not`s around the current position
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, message: impl Into<String>) -> PolicyError {
        PolicyError::invalid_expression(self.text, message)
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error(format!(
                "expression nested too deeply (limit {})",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<CheckExpression> {
        let mut terms = vec![self.term()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            terms.push(self.term()?);
        }
        Ok(collapse(terms, CheckExpression::Or))
    }

    fn term(&mut self) -> Result<CheckExpression> {
        let mut factors = vec![self.unary()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            factors.push(self.unary()?);
        }
        Ok(collapse(factors, CheckExpression::And))
    }

    fn unary(&mut self) -> Result<CheckExpression> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            self.descend()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(CheckExpression::not(inner));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<CheckExpression> {
        match self.next() {
            Some(Token::Open) => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(self.error("unbalanced parenthesis")),
                }
            }
            Some(Token::Word(word)) => self.check(word),
            Some(Token::Close) => Err(self.error("unexpected `)`")),
            Some(token) => Err(self.error(format!("unexpected operator {:?}", token))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn check(&self, word: &str) -> Result<CheckExpression> {
        match word {
            "@" => return Ok(CheckExpression::always()),
            "!" => return Ok(CheckExpression::never()),
            _ => {}
        }

        let (kind, value) = word
            .split_once(':')
            .ok_or_else(|| self.error(format!("`{}` is not a `kind:value` check", word)))?;
        if value.is_empty() {
            return Err(self.error(format!("check `{}` has an empty value", word)));
        }

        match kind {
            "role" => Ok(CheckExpression::role(value)),
            "rule" => Ok(CheckExpression::rule(value)),
            "system_scope" if value == "all" => Ok(CheckExpression::scope(ScopeType::System)),
            "system_scope" => Err(self.error(format!("unsupported system scope `{}`", value))),
            "scope" => value
                .parse::<ScopeType>()
                .map(CheckExpression::scope)
                .map_err(|e| self.error(e.to_string())),
            other => Err(self.error(format!("unsupported check kind `{}`", other))),
        }
    }
}

fn collapse(
    mut items: Vec<CheckExpression>,
    combine: fn(Vec<CheckExpression>) -> CheckExpression,
) -> CheckExpression {
    if items.len() == 1 {
        items.remove(0)
    } else {
        combine(items)
    }
}

pub(super) fn parse(text: &str) -> Result<CheckExpression> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Ok(CheckExpression::always());
    }

    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;

    if parser.pos < parser.tokens.len() {
        return Err(parser.error(format!(
            "unexpected trailing input at token {}",
            parser.pos + 1
        )));
    }

    Ok(expr)
}
