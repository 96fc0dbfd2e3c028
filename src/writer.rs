// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Output formats for extracted blueprint schemas.
//!
//! Both writers implement [`SchemaWriter`], the visitor that
//! [`Blueprint::print`](crate::model::Blueprint::print) drives. A run looks
//! like this:
//!
//! ```
//! use bpschema::model::{Blueprint, Field};
//! use bpschema::writer::{SchemaWriter, XmlWriter};
//!
//! let mut blueprint = Blueprint::new("cc_binary");
//! blueprint.add(Field::new("name").with_type("string"));
//!
//! let mut writer = XmlWriter::new(Vec::new());
//! writer.start().unwrap();
//! blueprint.print(&mut writer).unwrap();
//! writer.end().unwrap();
//!
//! let xml = String::from_utf8(writer.into_inner()).unwrap();
//! assert!(xml.contains(r#"<field name="name" type="string"/>"#));
//! ```
//!
//! # Formats
//!
//! - [`TextWriter`]: `name (type; description)` lines, `{`/`}` around children
//! - [`XmlWriter`]: a `<blueprints>` document with `<blueprint>`,
//!   `<object-field>` and `<field>` elements, types translated to
//!   [`SchemaType`] names

use crate::model::Field;
use snafu::prelude::*;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

const INDENT: usize = 4;

/// Fields of type `list of strings` that hold references to other modules.
const REFERENCE_FIELDS: &[&str] = &[
    "required",
    "overrides",
    "defaults",
    "libs",
    "export_generated_headers",
    "export_header_lib_headers",
    "export_shared_lib_headers",
    "export_static_lib_headers",
    "generated_headers",
    "generated_sources",
];

/// Any `list of strings` field with this suffix holds module references.
const REFERENCE_SUFFIX: &str = "_libs";

/// Error type for schema output.
#[derive(Debug, Snafu)]
pub enum WriteError {
    /// Writing to the destination failed.
    #[snafu(display("failed to write output: {source}"))]
    Io {
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A declared type has no schema equivalent.
    #[snafu(display("unsupported type `{type_label}` of field `{field}`"))]
    UnsupportedType {
        /// The type label as declared in the document.
        type_label: String,
        /// The field declaring it.
        field: String,
    },
}

/// Receives a blueprint tree in document order.
///
/// Every `start_*` call is matched by the corresponding `end_*` call.
pub trait SchemaWriter {
    /// Opens the output document.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn start(&mut self) -> Result<(), WriteError> {
        Ok(())
    }

    /// Closes the output document and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn end(&mut self) -> Result<(), WriteError> {
        Ok(())
    }

    /// Opens a blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn start_blueprint(&mut self, name: &str) -> Result<(), WriteError>;

    /// Closes the innermost blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn end_blueprint(&mut self) -> Result<(), WriteError>;

    /// Opens a field that has children.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the field cannot be represented.
    fn start_object(&mut self, field: &Field) -> Result<(), WriteError>;

    /// Closes the innermost field opened with [`start_object`](Self::start_object).
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn end_object(&mut self) -> Result<(), WriteError>;

    /// Emits a field without children.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the field cannot be represented.
    fn field(&mut self, field: &Field) -> Result<(), WriteError>;
}

/// Available output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented plain text.
    Text,
    /// XML schema document.
    #[default]
    Xml,
}

impl OutputFormat {
    /// Creates a writer of this format over `out`.
    pub fn writer<'a, W: Write + 'a>(self, out: W) -> Box<dyn SchemaWriter + 'a> {
        match self {
            Self::Text => Box::new(TextWriter::new(out)),
            Self::Xml => Box::new(XmlWriter::new(out)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "xml" => Ok(Self::Xml),
            other => Err(format!("unknown format `{other}` (expected text or xml)")),
        }
    }
}

/// Schema primitive a declared type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    /// A single string.
    String,
    /// A list of strings.
    StringArray,
    /// A list of references to other modules.
    BlueprintArray,
    /// A boolean.
    Bool,
    /// An integer.
    Number,
}

impl SchemaType {
    /// Maps a declared type label, or returns `None` if it has no mapping.
    ///
    /// The field name matters for `list of strings`, which becomes a
    /// reference list for the fields that name other modules.
    #[must_use]
    pub fn for_field(name: &str, type_label: &str) -> Option<Self> {
        Some(match type_label {
            "string" | "ApiToCheck" => Self::String,
            "list of strings" => {
                if REFERENCE_FIELDS.contains(&name) || name.ends_with(REFERENCE_SUFFIX) {
                    Self::BlueprintArray
                } else {
                    Self::StringArray
                }
            }
            "bool" => Self::Bool,
            "int64" => Self::Number,
            "StaticSharedLibraryProperties"
            | "TestOptions"
            | "apexMultilibProperties"
            | "codegenArchProperties"
            | "VersionProperties" => Self::StringArray,
            _ => return None,
        })
    }

    /// The name used in the XML output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::StringArray => "string[]",
            Self::BlueprintArray => "blueprint[]",
            Self::Bool => "bool",
            Self::Number => "number",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes `depth` levels of indentation.
fn indent(out: &mut impl Write, depth: usize) -> io::Result<()> {
    write!(out, "{:width$}", "", width = depth * INDENT)
}

/// Plain-text writer: `name (type; description)` per field.
///
/// Absent types and descriptions are written as empty strings.
pub struct TextWriter<W> {
    out: W,
    depth: usize,
}

impl<W: Write> TextWriter<W> {
    /// Creates a writer over `out`.
    pub const fn new(out: W) -> Self {
        Self { out, depth: 0 }
    }

    /// Returns the underlying output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, field: &Field, suffix: &str) -> io::Result<()> {
        indent(&mut self.out, self.depth)?;
        writeln!(
            self.out,
            "{} ({}; {}){suffix}",
            field.name,
            field.type_label.as_deref().unwrap_or_default(),
            field.description.as_deref().unwrap_or_default(),
        )
    }

    fn close(&mut self) -> io::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        indent(&mut self.out, self.depth)?;
        writeln!(self.out, "}}")
    }
}

impl<W: Write> SchemaWriter for TextWriter<W> {
    fn end(&mut self) -> Result<(), WriteError> {
        self.out.flush().context(IoSnafu)
    }

    fn start_blueprint(&mut self, name: &str) -> Result<(), WriteError> {
        indent(&mut self.out, self.depth).context(IoSnafu)?;
        writeln!(self.out, "{name} {{").context(IoSnafu)?;
        self.depth += 1;
        Ok(())
    }

    fn end_blueprint(&mut self) -> Result<(), WriteError> {
        self.close().context(IoSnafu)
    }

    fn start_object(&mut self, field: &Field) -> Result<(), WriteError> {
        self.line(field, " {").context(IoSnafu)?;
        self.depth += 1;
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), WriteError> {
        self.close().context(IoSnafu)
    }

    fn field(&mut self, field: &Field) -> Result<(), WriteError> {
        self.line(field, "").context(IoSnafu)
    }
}

/// Escapes an attribute value. Newlines become the two characters `\n`.
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// XML schema writer.
pub struct XmlWriter<W> {
    out: W,
    depth: usize,
}

impl<W: Write> XmlWriter<W> {
    /// Creates a writer over `out`.
    pub const fn new(out: W) -> Self {
        Self { out, depth: 0 }
    }

    /// Returns the underlying output.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Formats `name`, `type` and `descr` attributes.
    fn attributes(field: &Field) -> Result<String, WriteError> {
        let mut text = format!("name=\"{}\"", escape_attr(&field.name));
        if let Some(type_label) = &field.type_label {
            let schema_type = SchemaType::for_field(&field.name, type_label).context(
                UnsupportedTypeSnafu {
                    type_label,
                    field: &field.name,
                },
            )?;
            text.push_str(&format!(" type=\"{schema_type}\""));
        }
        if let Some(description) = &field.description {
            text.push_str(&format!(" descr=\"{}\"", escape_attr(description)));
        }
        Ok(text)
    }

    fn open(&mut self, element: &str, attributes: &str) -> Result<(), WriteError> {
        indent(&mut self.out, self.depth).context(IoSnafu)?;
        writeln!(self.out, "<{element} {attributes}>").context(IoSnafu)?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, element: &str) -> Result<(), WriteError> {
        self.depth = self.depth.saturating_sub(1);
        indent(&mut self.out, self.depth).context(IoSnafu)?;
        writeln!(self.out, "</{element}>").context(IoSnafu)
    }
}

impl<W: Write> SchemaWriter for XmlWriter<W> {
    fn start(&mut self) -> Result<(), WriteError> {
        writeln!(self.out, "<blueprints>").context(IoSnafu)?;
        self.depth += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<(), WriteError> {
        self.close("blueprints")?;
        self.out.flush().context(IoSnafu)
    }

    fn start_blueprint(&mut self, name: &str) -> Result<(), WriteError> {
        let attributes = format!("name=\"{}\"", escape_attr(name));
        self.open("blueprint", &attributes)
    }

    fn end_blueprint(&mut self) -> Result<(), WriteError> {
        self.close("blueprint")
    }

    fn start_object(&mut self, field: &Field) -> Result<(), WriteError> {
        let attributes = Self::attributes(field)?;
        self.open("object-field", &attributes)
    }

    fn end_object(&mut self) -> Result<(), WriteError> {
        self.close("object-field")
    }

    fn field(&mut self, field: &Field) -> Result<(), WriteError> {
        let attributes = Self::attributes(field)?;
        indent(&mut self.out, self.depth).context(IoSnafu)?;
        writeln!(self.out, "<field {attributes}/>").context(IoSnafu)
    }
}
