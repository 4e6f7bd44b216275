//! Parameter axes
//!
//! An axis is a named, ordered, finite set of values of a single kind.
//! Axes are validated before enumeration so that a badly declared axis fails
//! the run up front instead of surfacing halfway through a sweep.

use crate::HarnessError;
use std::fmt;

/// Kind of the values held by an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Integer,
    Float,
    Label,
    Flag,
    Record,
}

/// One value of a parameter axis
#[derive(Debug, Clone, PartialEq)]
pub enum AxisValue {
    Int(i64),
    Float(f64),
    Label(String),
    Flag(bool),
    /// Structured configuration, fields in declaration order
    Record(Vec<(String, AxisValue)>),
}

impl AxisValue {
    pub fn kind(&self) -> AxisKind {
        match self {
            AxisValue::Int(_) => AxisKind::Integer,
            AxisValue::Float(_) => AxisKind::Float,
            AxisValue::Label(_) => AxisKind::Label,
            AxisValue::Flag(_) => AxisKind::Flag,
            AxisValue::Record(_) => AxisKind::Record,
        }
    }

    /// Field names of a record value
    fn field_names(&self) -> Vec<&str> {
        match self {
            AxisValue::Record(fields) => fields.iter().map(|(name, _)| name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Int(v) => write!(f, "{}", v),
            AxisValue::Float(v) => write!(f, "{}", v),
            AxisValue::Label(v) => write!(f, "{}", v),
            AxisValue::Flag(v) => write!(f, "{}", v),
            AxisValue::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A named test dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAxis {
    pub name: String,
    pub kind: AxisKind,
    pub values: Vec<AxisValue>,
}

impl ParameterAxis {
    pub fn new(name: impl Into<String>, kind: AxisKind, values: Vec<AxisValue>) -> Self {
        Self { name: name.into(), kind, values }
    }

    pub fn integers(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, AxisKind::Integer, values.into_iter().map(AxisValue::Int).collect())
    }

    pub fn labels(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(name, AxisKind::Label, values.iter().map(|v| AxisValue::Label(v.to_string())).collect())
    }

    pub fn flags(name: impl Into<String>) -> Self {
        Self::new(name, AxisKind::Flag, vec![AxisValue::Flag(false), AxisValue::Flag(true)])
    }

    /// Axis of structured values, each given as integer fields
    pub fn records(name: impl Into<String>, records: &[&[(&str, i64)]]) -> Self {
        let values = records
            .iter()
            .map(|fields| {
                AxisValue::Record(fields.iter().map(|(n, v)| (n.to_string(), AxisValue::Int(*v))).collect())
            })
            .collect();
        Self::new(name, AxisKind::Record, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that the axis is non-empty, homogeneous and free of duplicates
    pub fn validate(&self) -> Result<(), HarnessError> {
        let malformed = |reason: String| HarnessError::MalformedAxis { axis: self.name.clone(), reason };

        if self.name.is_empty() {
            return Err(malformed("empty axis name".to_string()));
        }
        if self.values.is_empty() {
            return Err(malformed("no values".to_string()));
        }
        for (i, value) in self.values.iter().enumerate() {
            if value.kind() != self.kind {
                return Err(malformed(format!("value {} is {:?}, expected {:?}", value, value.kind(), self.kind)));
            }
            if let AxisValue::Float(v) = value {
                if !v.is_finite() {
                    return Err(malformed(format!("non-finite value {}", v)));
                }
            }
            if self.values[..i].contains(value) {
                return Err(malformed(format!("duplicate value {}", value)));
            }
        }
        if self.kind == AxisKind::Record {
            let shape = self.values[0].field_names();
            if let Some(odd) = self.values.iter().find(|v| v.field_names() != shape) {
                return Err(malformed(format!("record {} does not have fields {:?}", odd, shape)));
            }
        }
        Ok(())
    }
}

/// One concrete point of a parameter space, one value per axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterPoint {
    entries: Vec<(String, AxisValue)>,
}

impl ParameterPoint {
    pub fn new(entries: Vec<(String, AxisValue)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, AxisValue)] {
        &self.entries
    }

    pub fn get(&self, axis: &str) -> Result<&AxisValue, HarnessError> {
        self.entries
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value)
            .ok_or_else(|| HarnessError::MalformedAxis {
                axis: axis.to_string(),
                reason: "not part of the parameter point".to_string(),
            })
    }

    pub fn int(&self, axis: &str) -> Result<i64, HarnessError> {
        match self.get(axis)? {
            AxisValue::Int(v) => Ok(*v),
            other => Err(Self::wrong_kind(axis, other, AxisKind::Integer)),
        }
    }

    pub fn float(&self, axis: &str) -> Result<f64, HarnessError> {
        match self.get(axis)? {
            AxisValue::Float(v) => Ok(*v),
            AxisValue::Int(v) => Ok(*v as f64),
            other => Err(Self::wrong_kind(axis, other, AxisKind::Float)),
        }
    }

    pub fn label(&self, axis: &str) -> Result<&str, HarnessError> {
        match self.get(axis)? {
            AxisValue::Label(v) => Ok(v),
            other => Err(Self::wrong_kind(axis, other, AxisKind::Label)),
        }
    }

    pub fn flag(&self, axis: &str) -> Result<bool, HarnessError> {
        match self.get(axis)? {
            AxisValue::Flag(v) => Ok(*v),
            other => Err(Self::wrong_kind(axis, other, AxisKind::Flag)),
        }
    }

    /// Integer field of a record axis
    pub fn record_int(&self, axis: &str, field: &str) -> Result<i64, HarnessError> {
        match self.get(axis)? {
            AxisValue::Record(fields) => match fields.iter().find(|(name, _)| name == field) {
                Some((_, AxisValue::Int(v))) => Ok(*v),
                _ => Err(HarnessError::MalformedAxis {
                    axis: axis.to_string(),
                    reason: format!("no integer field {}", field),
                }),
            },
            other => Err(Self::wrong_kind(axis, other, AxisKind::Record)),
        }
    }

    fn wrong_kind(axis: &str, value: &AxisValue, expected: AxisKind) -> HarnessError {
        HarnessError::MalformedAxis {
            axis: axis.to_string(),
            reason: format!("value {} is {:?}, expected {:?}", value, value.kind(), expected),
        }
    }
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}
