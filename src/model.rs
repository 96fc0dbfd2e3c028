// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! In-memory field tree for extracted blueprint schemas.
//!
//! A [`Blueprint`] is one documented module type (for example `cc_binary`).
//! It owns an ordered list of [`Field`]s, and a field may in turn own child
//! fields when it is a container. Order always follows the source document.
//!
//! The tree carries no validation. Writers receive whatever the parser built
//! through [`Blueprint::print`], which walks the tree depth-first.

use crate::writer::{SchemaWriter, WriteError};

/// Markup classification of the block a field was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldClass {
    /// A collapsible group header; the field is semantically a container.
    Accordion,
    /// Any other block.
    #[default]
    Simple,
}

impl FieldClass {
    /// Classifies a block from its `class` attribute.
    ///
    /// The attribute is matched token by token, so `"accordion open"` is
    /// still an accordion.
    #[must_use]
    pub fn from_class_attr(class: Option<&str>) -> Self {
        match class {
            Some(class) if class.split_whitespace().any(|c| c == "accordion") => Self::Accordion,
            _ => Self::Simple,
        }
    }
}

/// Whether a field holds a child list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// A plain value with no children.
    #[default]
    Leaf,
    /// A field owning child fields in document order.
    Container(Vec<Field>),
}

/// One documented attribute of a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    /// The field name (a single path segment, never dotted).
    pub name: String,

    /// The declared type label as written in the document (e.g. `"list of strings"`).
    pub type_label: Option<String>,

    /// Free-text description accumulated from the field's block.
    pub description: Option<String>,

    /// Classification of the declaring block.
    pub class: FieldClass,

    /// Set for intermediate containers synthesized from dotted names.
    pub is_auto_added: bool,

    /// Leaf or container.
    pub kind: FieldKind,
}

impl Field {
    /// Creates a leaf field with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a synthetic intermediate container for a dotted path segment,
    /// classified like the block that named the path.
    #[must_use]
    pub fn auto_added(name: impl Into<String>, class: FieldClass) -> Self {
        Self {
            name: name.into(),
            class,
            is_auto_added: true,
            kind: FieldKind::Container(Vec::new()),
            ..Self::default()
        }
    }

    /// Sets the declared type label.
    #[must_use]
    pub fn with_type(mut self, type_label: impl Into<String>) -> Self {
        self.type_label = Some(type_label.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the block classification.
    #[must_use]
    pub const fn with_class(mut self, class: FieldClass) -> Self {
        self.class = class;
        self
    }

    /// Returns `true` if the field was declared as a group, whether or not it
    /// has children yet.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.class == FieldClass::Accordion
    }

    /// Returns `true` if the field owns a child list.
    #[must_use]
    pub const fn has_fields(&self) -> bool {
        matches!(self.kind, FieldKind::Container(_))
    }

    /// Child fields; empty for a leaf.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            FieldKind::Container(fields) => fields,
            FieldKind::Leaf => &[],
        }
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Field] {
        match &mut self.kind {
            FieldKind::Container(fields) => fields.as_mut_slice(),
            FieldKind::Leaf => &mut [],
        }
    }

    /// Appends a child, turning a leaf into a container on first use.
    pub fn add(&mut self, field: Field) {
        match &mut self.kind {
            FieldKind::Container(fields) => fields.push(field),
            kind @ FieldKind::Leaf => *kind = FieldKind::Container(vec![field]),
        }
    }

    /// The most recently added child.
    #[must_use]
    pub fn last(&self) -> Option<&Field> {
        self.fields().last()
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Index of the first direct child with the given name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    /// Emits this field and its children to `writer`.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by the writer.
    pub fn print<W: SchemaWriter + ?Sized>(&self, writer: &mut W) -> Result<(), WriteError> {
        match &self.kind {
            FieldKind::Container(fields) => {
                writer.start_object(self)?;
                for field in fields {
                    field.print(writer)?;
                }
                writer.end_object()
            }
            FieldKind::Leaf => writer.field(self),
        }
    }
}

/// One top-level schema unit, named by a heading in the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blueprint {
    /// Module type name, e.g. `cc_binary`.
    pub name: String,

    /// Top-level fields in document order.
    pub fields: Vec<Field>,
}

impl Blueprint {
    /// Creates an empty blueprint.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a top-level field.
    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// The most recently added field.
    #[must_use]
    pub fn last(&self) -> Option<&Field> {
        self.fields.last()
    }

    /// First top-level field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Index of the first top-level field with the given name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Emits the blueprint and its whole field tree to `writer`.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by the writer.
    pub fn print<W: SchemaWriter + ?Sized>(&self, writer: &mut W) -> Result<(), WriteError> {
        writer.start_blueprint(&self.name)?;
        for field in &self.fields {
            field.print(writer)?;
        }
        writer.end_blueprint()
    }
}
