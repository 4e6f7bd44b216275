//! Generated header file
//!
//! One header per block. It is written in a fixed order: banner, block
//! includes, the `test_case_t` record declaration, then one initializer per
//! generated case, appended and flushed as soon as the case is complete.
//! `finish` closes the initializer list; a run that dies before that leaves a
//! truncated header behind.

use crate::binary::ElementType;
use crate::literal::{Literal, LiteralStyle};
use crate::InterfaceError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Namespace of the native test suite
pub const NATIVE_NAMESPACE: &str = "srsran";

/// Include providing the file-backed vector used for data file fields
pub const FILE_VECTOR_INCLUDE: &str = "srsran/support/file_vector.h";

/// Type of one field of the test case record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Binary data file
    File(ElementType),
    Integer,
    Float,
    Flag,
    /// Enumerated label, holding the enumeration type name
    Label(String),
    /// Nested record, holding the record type name
    Record(String),
    /// Nested list, holding the element type name
    List(String),
}

impl FieldKind {
    /// Declared type in the record
    pub fn c_type(&self) -> String {
        match self {
            FieldKind::File(element) => format!("file_vector<{}>", element.c_type()),
            FieldKind::Integer => "unsigned".to_string(),
            FieldKind::Float => "float".to_string(),
            FieldKind::Flag => "bool".to_string(),
            FieldKind::Label(name) | FieldKind::Record(name) => name.clone(),
            FieldKind::List(element) => format!("std::vector<{}>", element),
        }
    }

    /// Whether a literal has the shape this field expects
    pub fn accepts(&self, literal: &Literal) -> bool {
        if let (FieldKind::Integer, Literal::Integer(value)) = (self, literal) {
            // Declared unsigned
            return *value >= 0;
        }
        matches!(
            (self, literal),
            (FieldKind::File(_), Literal::File(_))
                | (FieldKind::Float, Literal::Float(_))
                | (FieldKind::Float, Literal::Integer(_))
                | (FieldKind::Flag, Literal::Bool(_))
                | (FieldKind::Label(_), Literal::Code(_))
                | (FieldKind::Record(_), Literal::List(_))
                | (FieldKind::List(_), Literal::List(_))
        )
    }
}

/// One named field of the test case record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub name: String,
    pub kind: FieldKind,
}

impl RecordField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Includes,
    Cases,
}

/// Writer for the per-block header file
pub struct HeaderWriter {
    path: PathBuf,
    block: String,
    writer: BufWriter<File>,
    style: LiteralStyle,
    stage: Stage,
    nof_cases: usize,
}

impl HeaderWriter {
    /// Create `<dir>/<block>_test_data.h` and write the banner
    pub fn create(dir: &Path, block: &str, style: LiteralStyle) -> Result<Self, InterfaceError> {
        let path = dir.join(format!("{}_test_data.h", block));
        let file = File::create(&path).map_err(|e| InterfaceError::io(&path, e))?;
        let mut header = Self {
            path,
            block: block.to_string(),
            writer: BufWriter::new(file),
            style,
            stage: Stage::Includes,
            nof_cases: 0,
        };
        header.write_str(&format!(
            "// This file was generated by tvgen {}. Do not edit.\n\n#pragma once\n\n",
            env!("CARGO_PKG_VERSION")
        ))?;
        Ok(header)
    }

    /// Path of the header file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of case initializers written so far
    pub fn nof_cases(&self) -> usize {
        self.nof_cases
    }

    /// Add an include directive. Names in angle brackets are system includes.
    pub fn add_include(&mut self, include: &str) -> Result<(), InterfaceError> {
        if self.stage != Stage::Includes {
            return Err(InterfaceError::HeaderState(format!("include {} after the record declaration", include)));
        }
        let line = if include.starts_with('<') {
            format!("#include {}\n", include)
        } else {
            format!("#include \"{}\"\n", include)
        };
        self.write_str(&line)
    }

    /// Declare the test case record and open the test data initializer
    pub fn declare_record(&mut self, fields: &[RecordField]) -> Result<(), InterfaceError> {
        if self.stage != Stage::Includes {
            return Err(InterfaceError::HeaderState("record declared twice".to_string()));
        }

        let mut text = String::new();
        text.push_str(&format!("#include \"{}\"\n#include <vector>\n\n", FILE_VECTOR_INCLUDE));
        text.push_str(&format!("namespace {} {{\n\nstruct test_case_t {{\n", NATIVE_NAMESPACE));
        for field in fields {
            text.push_str(&format!("  {} {};\n", field.kind.c_type(), field.name));
        }
        text.push_str("};\n\n");
        text.push_str(&format!(
            "static const std::vector<test_case_t> {}_test_data = {{\n  // clang-format off\n",
            self.block
        ));

        self.write_str(&text)?;
        self.stage = Stage::Cases;
        debug!("Declared {} record fields in {}", fields.len(), self.path.display());
        Ok(())
    }

    /// Append one case initializer and flush it to disk
    pub fn append_case(&mut self, literal: &Literal) -> Result<(), InterfaceError> {
        if self.stage != Stage::Cases {
            return Err(InterfaceError::HeaderState("case appended before the record declaration".to_string()));
        }
        let line = format!("  {},\n", literal.render(&self.style)?);
        self.write_str(&line)?;
        self.writer.flush().map_err(|e| InterfaceError::io(&self.path, e))?;
        self.nof_cases += 1;
        Ok(())
    }

    /// Close the initializer list and the namespace
    pub fn finish(mut self) -> Result<PathBuf, InterfaceError> {
        if self.stage != Stage::Cases {
            return Err(InterfaceError::HeaderState("finished without a record declaration".to_string()));
        }
        self.write_str(&format!("  // clang-format on\n}};\n\n}} // namespace {}\n", NATIVE_NAMESPACE))?;
        self.writer.flush().map_err(|e| InterfaceError::io(&self.path, e))?;
        debug!("Finished {} with {} cases", self.path.display(), self.nof_cases);
        Ok(self.path)
    }

    fn write_str(&mut self, text: &str) -> Result<(), InterfaceError> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| InterfaceError::io(&self.path, e))
    }
}
