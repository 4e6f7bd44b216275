//! Initializer literals
//!
//! A test case is described in the generated header file by one brace
//! initializer. `Literal` is the tree such an initializer is rendered from.
//! Strings are code fragments and are emitted verbatim, so enumerators like
//! `modulation_scheme::QPSK` pass through untouched.

use crate::InterfaceError;
use serde::Serialize;
use serde_json::Value;

/// A node of an initializer expression
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Pre-formatted code fragment
    Code(String),
    /// Path of a binary data file, rendered as `{"path"}`
    File(String),
    /// Brace-enclosed list, order preserved
    List(Vec<Literal>),
}

/// Tokens that depend on the target language of the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralStyle {
    pub true_token: String,
    pub false_token: String,
}

impl Default for LiteralStyle {
    fn default() -> Self {
        Self {
            true_token: "true".to_string(),
            false_token: "false".to_string(),
        }
    }
}

impl Literal {
    /// Code fragment literal
    pub fn code(fragment: impl Into<String>) -> Self {
        Literal::Code(fragment.into())
    }

    /// Render the literal, recursing through nested lists
    pub fn render(&self, style: &LiteralStyle) -> Result<String, InterfaceError> {
        let mut out = String::new();
        self.render_into(&mut out, style)?;
        Ok(out)
    }

    fn render_into(&self, out: &mut String, style: &LiteralStyle) -> Result<(), InterfaceError> {
        match self {
            Literal::Integer(v) => out.push_str(&v.to_string()),
            Literal::Float(v) => {
                if !v.is_finite() {
                    return Err(InterfaceError::UnsupportedLiteral(format!("non-finite float {}", v)));
                }
                out.push_str(&v.to_string());
            }
            Literal::Bool(true) => out.push_str(&style.true_token),
            Literal::Bool(false) => out.push_str(&style.false_token),
            Literal::Code(fragment) => out.push_str(fragment),
            Literal::File(path) => {
                out.push_str("{\"");
                out.push_str(path);
                out.push_str("\"}");
            }
            Literal::List(items) => {
                out.push('{');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render_into(out, style)?;
                }
                out.push('}');
            }
        }
        Ok(())
    }

    /// Binary data files referenced anywhere in the tree, in order
    pub fn file_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_files(&mut refs);
        refs
    }

    fn collect_files<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Literal::File(path) => refs.push(path),
            Literal::List(items) => items.iter().for_each(|item| item.collect_files(refs)),
            _ => {}
        }
    }

    /// Convert a JSON tree. Objects become lists in field order; null and
    /// out-of-range numbers are rejected.
    pub fn from_value(value: &Value) -> Result<Self, InterfaceError> {
        match value {
            Value::Null => Err(InterfaceError::UnsupportedLiteral("null".to_string())),
            Value::Bool(b) => Ok(Literal::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Literal::Integer(i))
                } else if n.is_u64() {
                    Err(InterfaceError::UnsupportedLiteral(format!("integer {} out of range", n)))
                } else {
                    n.as_f64()
                        .map(Literal::Float)
                        .ok_or_else(|| InterfaceError::UnsupportedLiteral(n.to_string()))
                }
            }
            Value::String(s) => Ok(Literal::Code(s.clone())),
            Value::Array(items) => items.iter().map(Literal::from_value).collect::<Result<Vec<_>, _>>().map(Literal::List),
            Value::Object(fields) => fields.values().map(Literal::from_value).collect::<Result<Vec<_>, _>>().map(Literal::List),
        }
    }
}

/// Convert any serializable configuration structure into a literal
pub fn to_literal<T: Serialize>(value: &T) -> Result<Literal, InterfaceError> {
    let value = serde_json::to_value(value)?;
    Literal::from_value(&value)
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Literal::Integer(v as i64)
    }
}

impl From<usize> for Literal {
    fn from(v: usize) -> Self {
        Literal::Integer(v as i64)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}
