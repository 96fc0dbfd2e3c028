// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Extract Soong blueprint field schemas from reference HTML docs.
//!
//! The Soong build system publishes an HTML page per module family listing
//! every module type and its properties. This crate turns those pages into a
//! machine-readable schema for editors and linters.
//!
//! # Overview
//!
//! 1. [`parser`] tokenizes a page and feeds the events to a
//!    [`builder::TreeBuilder`], which reconstructs the property nesting
//! 2. The result is a list of [`model::Blueprint`] trees
//! 3. [`writer`] renders the trees as indented text or as an XML schema
//!
//! # Example
//!
//! ```
//! use bpschema::parser::parse_document;
//! use bpschema::writer::{SchemaWriter, TextWriter};
//!
//! let html = r#"<h2>cc_binary</h2>
//! <div class="simple" id="cc_binary.stl"><b>stl</b> <i>string</i></div>"#;
//!
//! let blueprints = parse_document(html).unwrap();
//!
//! let mut writer = TextWriter::new(Vec::new());
//! for blueprint in &blueprints {
//!     blueprint.print(&mut writer).unwrap();
//! }
//! let text = String::from_utf8(writer.into_inner()).unwrap();
//! assert_eq!(text, "cc_binary {\n    stl (string; )\n}\n");
//! ```
//!
//! # Modules
//!
//! - [`model`]: blueprint and field tree types
//! - [`builder`]: the event-driven tree reconstruction
//! - [`parser`]: HTML tokenization on top of `html5ever`
//! - [`writer`]: text and XML output

#![deny(missing_docs)]

pub mod builder;
pub mod model;
pub mod parser;
pub mod writer;
