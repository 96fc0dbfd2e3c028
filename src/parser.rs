// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! HTML tokenization for Soong reference pages.
//!
//! [`DocParser`] runs the `html5ever` tokenizer over input fed in arbitrary
//! chunks (the CLI feeds one line at a time) and forwards tag and text events
//! to a [`TreeBuilder`]. Character data is buffered until the next tag, so the
//! builder sees one text event per run of text regardless of how the input
//! was split.
//!
//! # Example
//!
//! ```
//! use bpschema::parser::parse_document;
//!
//! let html = r#"
//!     <h2>cc_binary</h2>
//!     <div class="simple" id="cc_binary.name">
//!         <b>name</b> <i>string</i>, The name of the module.
//!     </div>
//! "#;
//!
//! let blueprints = parse_document(html).unwrap();
//! assert_eq!(blueprints[0].name, "cc_binary");
//! assert_eq!(
//!     blueprints[0].fields[0].description.as_deref(),
//!     Some("The name of the module.")
//! );
//! ```

use crate::builder::{Attributes, StructureError, TreeBuilder};
use crate::model::Blueprint;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use log::trace;
use snafu::prelude::*;
use std::cell::RefCell;
use std::io::BufRead;

/// Error type for document parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// The markup does not describe a consistent field tree.
    #[snafu(display("line {line}: {source}"))]
    Markup {
        /// 1-based line of the offending tag.
        line: u64,
        /// The structural problem.
        source: StructureError,
    },

    /// Reading the document failed.
    #[snafu(display("failed to read document: {source}"))]
    Read {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Receives tokens from the tokenizer and drives the builder.
#[derive(Default)]
struct EventSink {
    builder: RefCell<TreeBuilder>,
    text: RefCell<String>,
    error: RefCell<Option<ParseError>>,
}

impl EventSink {
    fn flush_text(&self) {
        let text = std::mem::take(&mut *self.text.borrow_mut());
        if !text.is_empty() {
            self.builder.borrow_mut().text(&text);
        }
    }

    fn handle_tag(&self, tag: &Tag) -> Result<TokenSinkResult<()>, StructureError> {
        let mut builder = self.builder.borrow_mut();
        match tag.kind {
            TagKind::StartTag => {
                builder.start_tag(&tag.name, attributes(tag))?;
                if tag.self_closing {
                    builder.end_tag(&tag.name)?;
                    return Ok(TokenSinkResult::Continue);
                }
                Ok(match &*tag.name {
                    "script" => TokenSinkResult::RawData(RawKind::ScriptData),
                    "style" => TokenSinkResult::RawData(RawKind::Rawtext),
                    _ => TokenSinkResult::Continue,
                })
            }
            TagKind::EndTag => {
                builder.end_tag(&tag.name)?;
                Ok(TokenSinkResult::Continue)
            }
        }
    }

    fn take_error(&self) -> Result<(), ParseError> {
        self.error.borrow_mut().take().map_or(Ok(()), Err)
    }
}

impl TokenSink for EventSink {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        if self.error.borrow().is_some() {
            return TokenSinkResult::Continue;
        }

        match token {
            Token::CharacterTokens(text) => self.text.borrow_mut().push_str(&text),
            Token::TagToken(tag) => {
                self.flush_text();
                match self.handle_tag(&tag) {
                    Ok(result) => return result,
                    Err(source) => {
                        *self.error.borrow_mut() = Some(ParseError::Markup {
                            line: line_number,
                            source,
                        });
                    }
                }
            }
            Token::EOFToken => self.flush_text(),
            Token::ParseError(message) => trace!("line {line_number}: {message}"),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn attributes(tag: &Tag) -> Attributes {
    let mut attrs = Attributes::default();
    for attr in &tag.attrs {
        match &*attr.name.local {
            "class" => attrs.class = Some(attr.value.to_string()),
            "id" => attrs.id = Some(attr.value.to_string()),
            _ => {}
        }
    }
    attrs
}

/// Streaming parser for one document.
pub struct DocParser {
    tokenizer: Tokenizer<EventSink>,
    input: BufferQueue,
}

impl Default for DocParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocParser {
    /// Creates a parser for a new document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(EventSink::default(), TokenizerOpts::default()),
            input: BufferQueue::default(),
        }
    }

    /// Feeds the next chunk of the document.
    ///
    /// # Errors
    ///
    /// Returns the first structural error found so far. The parser should be
    /// discarded afterwards.
    pub fn feed(&mut self, chunk: &str) -> Result<(), ParseError> {
        self.input.push_back(StrTendril::from_slice(chunk));
        let _ = self.tokenizer.feed(&self.input);
        self.tokenizer.sink.take_error()
    }

    /// Ends the document and returns its blueprints in document order.
    ///
    /// # Errors
    ///
    /// Returns a structural error raised by the final tokens.
    pub fn finish(self) -> Result<Vec<Blueprint>, ParseError> {
        self.tokenizer.end();
        let sink = &self.tokenizer.sink;
        sink.take_error()?;
        Ok(sink.builder.take().into_blueprints())
    }
}

/// Parses a complete document held in memory.
///
/// # Errors
///
/// Returns an error if the markup does not form a consistent field tree.
pub fn parse_document(html: &str) -> Result<Vec<Blueprint>, ParseError> {
    let mut parser = DocParser::new();
    parser.feed(html)?;
    parser.finish()
}

/// Parses a document from a reader, one line at a time.
///
/// # Errors
///
/// Returns an error if reading fails or the markup does not form a
/// consistent field tree.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<Vec<Blueprint>, ParseError> {
    let mut parser = DocParser::new();
    let mut line = String::new();
    while reader.read_line(&mut line).context(ReadSnafu)? > 0 {
        parser.feed(&line)?;
        line.clear();
    }
    parser.finish()
}
