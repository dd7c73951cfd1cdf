//! Filter expressions for [`EntityStore::find_all_by_criteria`](super::EntityStore).
//!
//! Grammar:
//!
//! ```text
//! criteria := clause ( AND clause )*
//! clause   := path op literal
//! path     := ident ( "." ident )*
//! op       := "=" | "==" | "!=" | "<>"
//! literal  := 'string' | true | false | null | number
//! ```
//!
//! `AND` is case-insensitive. Inside a string literal a quote is escaped by doubling it (`''`).
//! A missing field compares equal to `null`.

use crate::store::Record;
use crate::{CoreError, CoreResult};
use serde_json::Value;
use std::str::FromStr;

/// A parsed conjunction of field comparisons.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Criteria {
    clauses: Vec<Clause>,
}

#[derive(Clone, Debug, PartialEq)]
struct Clause {
    path: String,
    op: Op,
    literal: Literal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
}

#[derive(Clone, Debug, PartialEq)]
enum Literal {
    Str(String),
    Bool(bool),
    Number(f64),
    Null,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Op(Op),
}

impl Criteria {
    /// Parse a criteria expression.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCriteria`] on any syntax error.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let tokens = tokenize(text)?;
        let mut clauses = Vec::new();
        let mut iter = tokens.into_iter().peekable();

        while iter.peek().is_some() {
            if !clauses.is_empty() {
                match iter.next() {
                    Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => {}
                    other => {
                        return Err(CoreError::InvalidCriteria(format!(
                            "expected AND, found {other:?} in '{text}'"
                        )))
                    }
                }
            }

            let path = match iter.next() {
                Some(Token::Word(w)) if is_path(&w) => w,
                other => {
                    return Err(CoreError::InvalidCriteria(format!(
                        "expected field path, found {other:?} in '{text}'"
                    )))
                }
            };
            let op = match iter.next() {
                Some(Token::Op(op)) => op,
                other => {
                    return Err(CoreError::InvalidCriteria(format!(
                        "expected operator after '{path}', found {other:?}"
                    )))
                }
            };
            let literal = match iter.next() {
                Some(Token::Str(s)) => Literal::Str(s),
                Some(Token::Word(w)) => parse_bare_literal(&w)?,
                other => {
                    return Err(CoreError::InvalidCriteria(format!(
                        "expected value after '{path}', found {other:?}"
                    )))
                }
            };
            clauses.push(Clause { path, op, literal });
        }

        Ok(Self { clauses })
    }

    /// Returns true if `record` satisfies every clause.
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl FromStr for Criteria {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criteria::parse(s)
    }
}

impl Clause {
    fn matches(&self, record: &Record) -> bool {
        let value = record.lookup_path(&self.path).filter(|v| !v.is_null());
        let equal = match (&self.literal, value) {
            (Literal::Null, None) => true,
            (Literal::Null, Some(_)) => false,
            (_, None) => false,
            (Literal::Str(s), Some(Value::String(v))) => s == v,
            (Literal::Bool(b), Some(Value::Bool(v))) => b == v,
            (Literal::Number(n), Some(Value::Number(v))) => v.as_f64() == Some(*n),
            _ => false,
        };
        match self.op {
            Op::Eq => equal,
            Op::Ne => !equal,
        }
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn tokenize(text: &str) -> CoreResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        s.push('\'');
                    }
                    Some('\'') => break,
                    Some(ch) => s.push(ch),
                    None => {
                        return Err(CoreError::InvalidCriteria(format!(
                            "unterminated string literal in '{text}'"
                        )))
                    }
                }
            }
            tokens.push(Token::Str(s));
        } else if c == '=' {
            chars.next();
            if chars.peek() == Some(&'=') {
                chars.next();
            }
            tokens.push(Token::Op(Op::Eq));
        } else if c == '!' || c == '<' {
            chars.next();
            let expected = if c == '!' { '=' } else { '>' };
            if chars.next() != Some(expected) {
                return Err(CoreError::InvalidCriteria(format!(
                    "malformed operator in '{text}'"
                )));
            }
            tokens.push(Token::Op(Op::Ne));
        } else if c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '+') {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | '+') {
                    word.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Word(word));
        } else {
            return Err(CoreError::InvalidCriteria(format!(
                "unexpected character '{c}' in '{text}'"
            )));
        }
    }

    Ok(tokens)
}

fn is_path(word: &str) -> bool {
    !word.is_empty()
        && word
            .split('.')
            .all(|part| {
                part.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
                    && part.chars().all(|c| c.is_alphanumeric() || c == '_')
            })
}

fn parse_bare_literal(word: &str) -> CoreResult<Literal> {
    match word {
        "true" => Ok(Literal::Bool(true)),
        "false" => Ok(Literal::Bool(false)),
        "null" => Ok(Literal::Null),
        _ => word
            .parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| CoreError::InvalidCriteria(format!("unrecognised value '{word}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).expect("object record")
    }

    #[test]
    fn matches_nested_string_equality() {
        let criteria = Criteria::parse("form.uuid = 'f1'").expect("valid criteria");

        assert!(criteria.matches(&record(json!({"form": {"uuid": "f1"}}))));
        assert!(!criteria.matches(&record(json!({"form": {"uuid": "f2"}}))));
        assert!(!criteria.matches(&record(json!({}))));
    }

    #[test]
    fn conjunction_with_bool_and_null() {
        let criteria = Criteria::parse("entityName = 'Form' AND voided = false and cancelDateTime <> null")
            .expect("valid criteria");

        assert!(criteria.matches(&record(json!({
            "entityName": "Form", "voided": false, "cancelDateTime": "2024-01-01"
        }))));
        assert!(!criteria.matches(&record(json!({
            "entityName": "Form", "voided": false
        }))));
    }

    #[test]
    fn missing_field_equals_null() {
        let criteria = Criteria::parse("programExitDateTime = null").expect("valid criteria");

        assert!(criteria.matches(&record(json!({"uuid": "e1"}))));
        assert!(criteria.matches(&record(json!({"programExitDateTime": null}))));
        assert!(!criteria.matches(&record(json!({"programExitDateTime": "x"}))));
    }

    #[test]
    fn numbers_compare_numerically() {
        let criteria = Criteria::parse("level == 2 AND name != 'x'").expect("valid criteria");

        assert!(criteria.matches(&record(json!({"level": 2.0, "name": "y"}))));
        assert!(!criteria.matches(&record(json!({"level": 3, "name": "y"}))));
    }

    #[test]
    fn doubled_quote_escapes() {
        let criteria = Criteria::parse("name = 'O''Brien'").expect("valid criteria");
        assert!(criteria.matches(&record(json!({"name": "O'Brien"}))));
    }

    #[test]
    fn empty_criteria_matches_everything() {
        let criteria = Criteria::parse("  ").expect("empty criteria");
        assert!(criteria.is_empty());
        assert!(criteria.matches(&record(json!({"a": 1}))));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for text in ["uuid = ", "uuid 'x'", "uuid = 'x' OR a = 'b'", "uuid = 'x", "a = maybe"] {
            let err = Criteria::parse(text).expect_err("should reject");
            assert!(matches!(err, CoreError::InvalidCriteria(_)), "{text}");
        }
    }
}
