// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Reconstruction of blueprint field trees from markup events.
//!
//! Soong reference pages encode nesting only through presentation: each
//! module type starts at an `<h2>`, each property is a `<div id=...>` block
//! holding a bold name and an italic type, and the properties of a struct
//! follow their header inside a `<div class="collapsible">`. Flattened
//! properties are written as dotted names (`arch.arm.srcs`) instead.
//!
//! [`TreeBuilder`] consumes start-tag, end-tag and text events in document
//! order and keeps two stacks while doing so:
//!
//! - the tag stack, one entry per open element, which also captures the
//!   name, type and description of the property block being read;
//! - the container stack, one entry per field container that new properties
//!   are currently added to. It does not mirror the tag stack: groups only
//!   enter a container when the preceding property is an accordion, and
//!   dotted names enter the intermediate containers they create.

use crate::model::{Blueprint, Field, FieldClass};
use log::debug;
use snafu::prelude::*;

const HEADING_TAG: &str = "h2";
const ITEM_TAG: &str = "div";
const TYPE_TAG: &str = "i";
const NAME_TAG: &str = "b";
const GROUP_CLASS: &str = "collapsible";

/// Elements that are never pushed on the tag stack, start or end.
const IGNORED_TAGS: &[&str] = &["p", "br", "hr", "link", "meta", "img", "wbr"];

/// Structural errors. Any of them aborts the current document.
#[derive(Debug, Snafu)]
pub enum StructureError {
    /// An end tag arrived while no element was open.
    #[snafu(display("unexpected end tag </{tag}> with no open element"))]
    UnexpectedEndTag {
        /// The closing tag name.
        tag: String,
    },

    /// An end tag did not match the innermost open element.
    #[snafu(display("unexpected end tag </{tag}>, the open element is <{open}>"))]
    MismatchedEndTag {
        /// The closing tag name.
        tag: String,
        /// The innermost open element.
        open: String,
    },

    /// There was no field container to insert into.
    #[snafu(display("no enclosing field container for {what}"))]
    NoContainer {
        /// What was being inserted or entered.
        what: String,
    },

    /// A property block closed without a bold name.
    #[snafu(display("field block `{id}` has no name"))]
    UnnamedField {
        /// The block's `id` attribute.
        id: String,
    },
}

/// The attributes of a start tag that the builder looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    /// The `class` attribute.
    pub class: Option<String>,
    /// The `id` attribute.
    pub id: Option<String>,
}

fn has_class(class: Option<&str>, wanted: &str) -> bool {
    class.is_some_and(|class| class.split_whitespace().any(|c| c == wanted))
}

fn is_ignored(tag: &str) -> bool {
    IGNORED_TAGS.contains(&tag)
}

/// Name, type and description collected while a property block is open.
#[derive(Debug)]
struct ItemCapture {
    id: String,
    class: FieldClass,
    name: Option<String>,
    type_label: Option<String>,
    description: Option<String>,
}

impl ItemCapture {
    const fn new(id: String, class: FieldClass) -> Self {
        Self {
            id,
            class,
            name: None,
            type_label: None,
            description: None,
        }
    }

    fn push_description(&mut self, text: &str) {
        match &mut self.description {
            Some(description) => {
                description.push(' ');
                description.push_str(text);
            }
            None => self.description = Some(text.to_owned()),
        }
    }

    /// Builds the declared field.
    fn into_field(self, name: String) -> Field {
        let mut field = Field::new(name);
        self.declare(&mut field);
        field
    }

    /// Applies the block to `field`. A field auto-added for an earlier dotted
    /// name keeps its children and its auto-added flag. The page template
    /// separates type and text with `", "`, which ends up at the start of the
    /// description.
    fn declare(self, field: &mut Field) {
        let description = self.description.map(|description| {
            match description.strip_prefix(", ") {
                Some(rest) => rest.to_owned(),
                None => description,
            }
        });

        field.class = self.class;
        if self.type_label.is_some() {
            field.type_label = self.type_label;
        }
        if description.is_some() {
            field.description = description;
        }
    }
}

#[derive(Debug)]
enum Role {
    /// A property block.
    Item(ItemCapture),
    /// A collapsible group; closing it truncates the container stack back to
    /// the depth it had when the group opened.
    Group { restore_depth: usize },
    Plain,
}

#[derive(Debug)]
struct OpenTag {
    name: String,
    role: Role,
}

/// A container on the container stack: a blueprint and the child indices
/// leading down to a field. Fields are append-only while parsing, so the
/// indices stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Scope {
    blueprint: usize,
    path: Vec<usize>,
    /// Entered while resolving a dotted name rather than by a group.
    dotted: bool,
}

impl Scope {
    const fn blueprint(blueprint: usize) -> Self {
        Self {
            blueprint,
            path: Vec::new(),
            dotted: false,
        }
    }

    fn child(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            blueprint: self.blueprint,
            path,
            dotted: false,
        }
    }
}

#[derive(Clone, Copy)]
enum Container<'a> {
    Blueprint(&'a Blueprint),
    Field(&'a Field),
}

impl<'a> Container<'a> {
    fn name(self) -> &'a str {
        match self {
            Self::Blueprint(blueprint) => &blueprint.name,
            Self::Field(field) => &field.name,
        }
    }

    fn fields(self) -> &'a [Field] {
        match self {
            Self::Blueprint(blueprint) => &blueprint.fields,
            Self::Field(field) => field.fields(),
        }
    }

    fn last(self) -> Option<&'a Field> {
        match self {
            Self::Blueprint(blueprint) => blueprint.last(),
            Self::Field(field) => field.last(),
        }
    }

    fn position(self, name: &str) -> Option<usize> {
        match self {
            Self::Blueprint(blueprint) => blueprint.position(name),
            Self::Field(field) => field.position(name),
        }
    }
}

fn field_at_mut<'a>(fields: &'a mut [Field], first: usize, rest: &[usize]) -> Option<&'a mut Field> {
    let mut field = fields.get_mut(first)?;
    for &index in rest {
        field = field.fields_mut().get_mut(index)?;
    }
    Some(field)
}

#[derive(Clone, Copy)]
enum TextTarget {
    Heading,
    Type,
    Name,
    Description,
}

/// Incrementally builds [`Blueprint`]s from markup events.
///
/// # Example
///
/// ```
/// use bpschema::builder::{Attributes, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.start_tag("h2", Attributes::default()).unwrap();
/// builder.text("cc_binary");
/// builder.end_tag("h2").unwrap();
///
/// let item = Attributes { id: Some("cc_binary.name".into()), ..Default::default() };
/// builder.start_tag("div", item).unwrap();
/// builder.start_tag("b", Attributes::default()).unwrap();
/// builder.text("name");
/// builder.end_tag("b").unwrap();
/// builder.end_tag("div").unwrap();
///
/// let blueprints = builder.into_blueprints();
/// assert_eq!(blueprints[0].name, "cc_binary");
/// assert_eq!(blueprints[0].fields[0].name, "name");
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tags: Vec<OpenTag>,
    containers: Vec<Scope>,
    blueprints: Vec<Blueprint>,
    in_item: bool,
}

impl TreeBuilder {
    /// Creates a builder with empty stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blueprints found so far, including the one being filled.
    #[must_use]
    pub fn blueprints(&self) -> &[Blueprint] {
        &self.blueprints
    }

    /// Consumes the builder, returning every blueprint in document order.
    #[must_use]
    pub fn into_blueprints(self) -> Vec<Blueprint> {
        self.blueprints
    }

    /// Handles a start tag.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NoContainer`] when a collapsible group opens
    /// before any blueprint heading.
    pub fn start_tag(&mut self, tag: &str, attrs: Attributes) -> Result<(), StructureError> {
        if is_ignored(tag) {
            return Ok(());
        }

        let Attributes { class, id } = attrs;
        let role = match id {
            Some(id) if tag == ITEM_TAG => {
                self.in_item = true;
                Role::Item(ItemCapture::new(
                    id,
                    FieldClass::from_class_attr(class.as_deref()),
                ))
            }
            None if tag == ITEM_TAG && has_class(class.as_deref(), GROUP_CLASS) => {
                self.enter_group()?
            }
            _ => Role::Plain,
        };

        self.tags.push(OpenTag {
            name: tag.to_owned(),
            role,
        });
        Ok(())
    }

    /// Handles an end tag, which must close the innermost open element.
    ///
    /// # Errors
    ///
    /// Returns an error if no element is open, if the tag does not match the
    /// open element, or if a closing property block cannot be placed.
    pub fn end_tag(&mut self, tag: &str) -> Result<(), StructureError> {
        if is_ignored(tag) {
            return Ok(());
        }

        let open = self.tags.pop().context(UnexpectedEndTagSnafu { tag })?;
        ensure!(
            open.name == tag,
            MismatchedEndTagSnafu {
                tag,
                open: open.name
            }
        );

        match open.role {
            Role::Item(item) => self.close_item(item),
            Role::Group { restore_depth } => {
                self.containers.truncate(restore_depth);
                Ok(())
            }
            Role::Plain => Ok(()),
        }
    }

    /// Handles a run of character data. Whitespace-only text is ignored.
    pub fn text(&mut self, data: &str) {
        let text = data.trim();
        if text.is_empty() {
            return;
        }
        let Some(current) = self.tags.last() else {
            return;
        };

        let target = match current.name.as_str() {
            HEADING_TAG => TextTarget::Heading,
            TYPE_TAG if self.in_item => TextTarget::Type,
            NAME_TAG if self.in_item => TextTarget::Name,
            _ if matches!(current.role, Role::Item(_)) => TextTarget::Description,
            _ => return,
        };

        match target {
            TextTarget::Heading => self.open_blueprint(text),
            TextTarget::Type => {
                if let Some(item) = self.current_item() {
                    item.type_label.get_or_insert_with(|| text.to_owned());
                }
            }
            TextTarget::Name => {
                if let Some(item) = self.current_item() {
                    item.name.get_or_insert_with(|| text.to_owned());
                }
            }
            TextTarget::Description => {
                if let Some(OpenTag {
                    role: Role::Item(item),
                    ..
                }) = self.tags.last_mut()
                {
                    item.push_description(text);
                }
            }
        }
    }

    fn open_blueprint(&mut self, name: &str) {
        debug!("blueprint `{name}`");
        self.blueprints.push(Blueprint::new(name));
        self.containers
            .push(Scope::blueprint(self.blueprints.len() - 1));
    }

    /// The innermost property block on the tag stack.
    fn current_item(&mut self) -> Option<&mut ItemCapture> {
        self.tags.iter_mut().rev().find_map(|tag| match &mut tag.role {
            Role::Item(item) => Some(item),
            _ => None,
        })
    }

    /// Enters the last added field of the current container if it is an
    /// accordion, so the group's properties land inside it.
    fn enter_group(&mut self) -> Result<Role, StructureError> {
        let scope = self.containers.last().context(NoContainerSnafu {
            what: "collapsible group",
        })?;
        let restore_depth = self.containers.len();

        let entered = self.container(scope).and_then(|container| {
            let last = container.last()?;
            let index = container.fields().len() - 1;
            last.is_container().then(|| scope.child(index))
        });
        if let Some(entered) = entered {
            self.containers.push(entered);
        }

        Ok(Role::Group { restore_depth })
    }

    fn close_item(&mut self, mut item: ItemCapture) -> Result<(), StructureError> {
        self.in_item = false;
        let Some(name) = item.name.take() else {
            return UnnamedFieldSnafu { id: item.id }.fail();
        };

        self.discard_dotted_context();
        let scope = self
            .containers
            .last()
            .cloned()
            .with_context(|| NoContainerSnafu {
                what: format!("field `{name}`"),
            })?;

        match name.rsplit_once('.') {
            Some((parents, terminal)) => {
                let terminal = terminal.to_owned();
                self.insert_dotted(scope, parents, terminal, item)
            }
            None => {
                let field = item.into_field(name);
                self.add_field(&scope, field).map(drop)
            }
        }
    }

    /// Resolves `parents.terminal` below `scope`.
    ///
    /// Leading segments naming the containers already entered are skipped.
    /// Every remaining parent segment is looked up (first match) or created
    /// as an auto-added container and entered. The terminal is looked up the
    /// same way: an existing field takes the captured type, description and
    /// class, otherwise a new field is built from the block.
    ///
    /// Post-condition: the intermediate containers stay entered, so that a
    /// group that directly follows can reach the terminal field, but the
    /// terminal field itself is left again.
    fn insert_dotted(
        &mut self,
        mut scope: Scope,
        parents: &str,
        terminal: String,
        item: ItemCapture,
    ) -> Result<(), StructureError> {
        let segments: Vec<&str> = parents.split('.').collect();
        let skip = self.entered_prefix_len(&segments);

        for &segment in &segments[skip..] {
            let existing = self
                .container(&scope)
                .and_then(|container| container.position(segment));
            let mut next = match existing {
                Some(index) => scope.child(index),
                None => {
                    debug!("auto-adding `{segment}` for `{parents}.{terminal}`");
                    self.add_field(&scope, Field::auto_added(segment, item.class))?
                }
            };
            next.dotted = true;
            self.containers.push(next.clone());
            scope = next;
        }

        let existing = self
            .container(&scope)
            .and_then(|container| container.position(&terminal));
        let mut declared = match existing {
            Some(index) => {
                let declared = scope.child(index);
                let field = self
                    .field_mut(&declared)
                    .with_context(|| NoContainerSnafu {
                        what: format!("field `{terminal}`"),
                    })?;
                debug!("declaring existing field `{parents}.{terminal}`");
                item.declare(field);
                declared
            }
            None => self.add_field(&scope, item.into_field(terminal))?,
        };
        declared.dotted = true;
        self.containers.push(declared);
        self.leave_terminal_field();
        Ok(())
    }

    fn leave_terminal_field(&mut self) {
        self.containers.pop();
    }

    /// Length of the longest prefix of `segments` equal to the names of the
    /// innermost entered containers.
    fn entered_prefix_len(&self, segments: &[&str]) -> usize {
        let names: Vec<&str> = self
            .containers
            .iter()
            .filter_map(|scope| self.container(scope))
            .map(Container::name)
            .collect();

        (1..=segments.len().min(names.len()))
            .rev()
            .find(|&len| names[names.len() - len..] == segments[..len])
            .unwrap_or(0)
    }

    /// Leaves containers entered by a previous dotted name, down to the
    /// depth of the innermost open group.
    fn discard_dotted_context(&mut self) {
        let floor = self
            .tags
            .iter()
            .rev()
            .find_map(|tag| match tag.role {
                Role::Group { restore_depth } => Some(restore_depth),
                _ => None,
            })
            .unwrap_or(0);

        while self.containers.len() > floor && self.containers.last().is_some_and(|s| s.dotted) {
            self.containers.pop();
        }
    }

    fn container(&self, scope: &Scope) -> Option<Container<'_>> {
        let blueprint = self.blueprints.get(scope.blueprint)?;
        let Some((first, rest)) = scope.path.split_first() else {
            return Some(Container::Blueprint(blueprint));
        };

        let mut field = blueprint.fields.get(*first)?;
        for &index in rest {
            field = field.fields().get(index)?;
        }
        Some(Container::Field(field))
    }

    fn field_mut(&mut self, scope: &Scope) -> Option<&mut Field> {
        let (first, rest) = scope.path.split_first()?;
        let blueprint = self.blueprints.get_mut(scope.blueprint)?;
        field_at_mut(&mut blueprint.fields, *first, rest)
    }

    /// Appends `field` to the container at `scope`, returning the new
    /// field's scope.
    fn add_field(&mut self, scope: &Scope, field: Field) -> Result<Scope, StructureError> {
        let what = format!("field `{}`", field.name);

        let index = if scope.path.is_empty() {
            self.blueprints.get_mut(scope.blueprint).map(|blueprint| {
                blueprint.add(field);
                blueprint.fields.len() - 1
            })
        } else {
            self.field_mut(scope).map(|parent| {
                parent.add(field);
                parent.fields().len() - 1
            })
        };

        index
            .map(|index| scope.child(index))
            .context(NoContainerSnafu { what })
    }
}
