// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

use serde_yml::libyml::error::Mark;
use serde_yml::libyml::parser::{Anchor, Event, Parser, ScalarStyle};
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::errors::{Error, Result};
use super::mappings::NodeKind;
use super::types::Location;

/// Prefix of the YAML core schema tags (`!!str`, `!!int`, ...).
pub(crate) const CORE_SCHEMA: &str = "tag:yaml.org,2002:";

/// A node as it appears in the source, before any tag is constructed.
///
/// Scalars keep their text exactly as written, so a tag argument such as
/// `!GetAZs 0x10` is never reinterpreted as a number.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Scalar {
        tag: Option<String>,
        text: String,
        /// Unquoted in the source; only plain scalars resolve to non-strings.
        plain: bool,
        location: Location,
    },
    Sequence {
        tag: Option<String>,
        items: Vec<Node>,
        location: Location,
    },
    Mapping {
        tag: Option<String>,
        entries: Vec<(Node, Node)>,
        location: Location,
    },
}

impl Node {
    pub(crate) fn tag(&self) -> Option<&str> {
        match self {
            Node::Scalar { tag, .. } | Node::Sequence { tag, .. } | Node::Mapping { tag, .. } => {
                tag.as_deref()
            }
        }
    }

    pub(crate) fn location(&self) -> &Location {
        match self {
            Node::Scalar { location, .. }
            | Node::Sequence { location, .. }
            | Node::Mapping { location, .. } => location,
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Node::Scalar { .. } => NodeKind::Scalar,
            Node::Sequence { .. } => NodeKind::Sequence,
            Node::Mapping { .. } => NodeKind::Mapping,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    /// The `<<` key of a mapping.
    pub(crate) fn is_merge_key(&self) -> bool {
        matches!(self, Node::Scalar { tag: None, text, plain: true, .. } if text == "<<")
    }

    /// Text of a scalar node. Collections are handed back.
    pub(crate) fn into_scalar_text(self) -> std::result::Result<String, Node> {
        match self {
            Node::Scalar { text, .. } => Ok(text),
            other => Err(other),
        }
    }

    pub(crate) fn untagged(self) -> Node {
        match self {
            Node::Scalar {
                text,
                plain,
                location,
                ..
            } => Node::Scalar {
                tag: None,
                text,
                plain,
                location,
            },
            Node::Sequence {
                items, location, ..
            } => Node::Sequence {
                tag: None,
                items,
                location,
            },
            Node::Mapping {
                entries, location, ..
            } => Node::Mapping {
                tag: None,
                entries,
                location,
            },
        }
    }
}

/// Parses a single-document stream. An empty stream has no root.
pub(crate) fn parse_document(text: &str) -> Result<Option<Node>> {
    Composer {
        parser: Parser::new(Cow::Borrowed(text.as_bytes())),
        anchors: BTreeMap::new(),
    }
    .document()
}

/// Builds nodes out of parser events, expanding aliases in place.
struct Composer<'input> {
    parser: Parser<'input>,
    anchors: BTreeMap<Anchor, Node>,
}

impl<'input> Composer<'input> {
    fn next(&mut self) -> Result<(Event<'input>, Location)> {
        let (event, mark) = self.parser.parse_next_event()?;
        Ok((event, location(&mark)))
    }

    fn document(&mut self) -> Result<Option<Node>> {
        let mut root = None;
        loop {
            let (event, at) = self.next()?;
            match event {
                Event::StreamStart | Event::DocumentEnd => {}
                Event::StreamEnd => return Ok(root),
                Event::DocumentStart if root.is_some() => {
                    return Err(Error::Syntax {
                        location: Some(at),
                        message: "expected a single document in the stream".to_string(),
                    })
                }
                Event::DocumentStart => {
                    let (event, at) = self.next()?;
                    root = Some(self.node(event, at)?);
                }
                _ => return Err(unexpected(at)),
            }
        }
    }

    fn node(&mut self, event: Event<'input>, at: Location) -> Result<Node> {
        match event {
            Event::Alias(anchor) => {
                self.anchors
                    .get(&anchor)
                    .cloned()
                    .ok_or_else(|| Error::Syntax {
                        location: Some(at),
                        message: "unknown anchor".to_string(),
                    })
            }
            Event::Scalar(scalar) => {
                let node = Node::Scalar {
                    tag: scalar.tag.as_deref().map(tag_text),
                    text: String::from_utf8_lossy(&scalar.value).into_owned(),
                    plain: scalar.style == ScalarStyle::Plain,
                    location: at,
                };
                self.remember(scalar.anchor, &node);
                Ok(node)
            }
            Event::SequenceStart(start) => {
                let mut items = Vec::new();
                loop {
                    let (event, item_at) = self.next()?;
                    if let Event::SequenceEnd = event {
                        break;
                    }
                    items.push(self.node(event, item_at)?);
                }
                let node = Node::Sequence {
                    tag: start.tag.as_deref().map(tag_text),
                    items,
                    location: at,
                };
                self.remember(start.anchor, &node);
                Ok(node)
            }
            Event::MappingStart(start) => {
                let mut entries = Vec::new();
                loop {
                    let (event, key_at) = self.next()?;
                    if let Event::MappingEnd = event {
                        break;
                    }
                    let key = self.node(event, key_at)?;
                    let (event, value_at) = self.next()?;
                    let value = self.node(event, value_at)?;
                    entries.push((key, value));
                }
                let node = Node::Mapping {
                    tag: start.tag.as_deref().map(tag_text),
                    entries,
                    location: at,
                };
                self.remember(start.anchor, &node);
                Ok(node)
            }
            _ => Err(unexpected(at)),
        }
    }

    fn remember(&mut self, anchor: Option<Anchor>, node: &Node) {
        if let Some(anchor) = anchor {
            self.anchors.insert(anchor, node.clone());
        }
    }
}

fn tag_text(tag: &[u8]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

fn unexpected(at: Location) -> Error {
    Error::Syntax {
        location: Some(at),
        message: "unexpected event in YAML stream".to_string(),
    }
}

/// One-based position of a parser mark.
pub(crate) fn location(mark: &Mark) -> Location {
    Location::new(mark.line() as usize + 1, mark.column() as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Node {
        parse_document(text).unwrap().unwrap()
    }

    fn entries(node: Node) -> Vec<(Node, Node)> {
        match node {
            Node::Mapping { entries, .. } => entries,
            other => panic!("expected a mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_stream_has_no_root() {
        assert!(parse_document("").unwrap().is_none());
        assert!(parse_document("# only a comment\n").unwrap().is_none());
    }

    #[test]
    fn test_tagged_scalar_keeps_source_text() {
        let (_, value) = entries(parse("Def: !GetAZs 0x10\n")).remove(0);
        match value {
            Node::Scalar {
                tag, text, plain, ..
            } => {
                assert_eq!(tag.as_deref(), Some("!GetAZs"));
                assert_eq!(text, "0x10");
                assert!(plain);
            }
            other => panic!("expected a scalar, got {other:?}"),
        }
    }

    #[test]
    fn test_quoted_scalar_is_not_plain() {
        let (_, value) = entries(parse("a: '42'\n")).remove(0);
        assert!(matches!(value, Node::Scalar { plain: false, .. }));
    }

    #[test]
    fn test_core_schema_tag_is_expanded() {
        let (_, value) = entries(parse("a: !!str 42\n")).remove(0);
        assert_eq!(value.tag(), Some("tag:yaml.org,2002:str"));
    }

    #[test]
    fn test_alias_repeats_anchored_node() {
        let mut pairs = entries(parse("a: &x [1, 2]\nb: *x\n"));
        let (_, b) = pairs.remove(1);
        let (_, a) = pairs.remove(0);
        assert_eq!(a.kind(), NodeKind::Sequence);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_alias_is_syntax_error() {
        let err = parse_document("a: *nowhere\n").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn test_second_document_is_rejected() {
        let err = parse_document("a: 1\n---\nb: 2\n").unwrap_err();
        match err {
            Error::Syntax { location, message } => {
                assert!(message.contains("single document"));
                assert!(location.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_node_locations_are_one_based() {
        let (key, value) = entries(parse("Resources:\n  Bucket: x\n")).remove(0);
        assert_eq!(key.location(), &Location::new(1, 1));
        let (inner_key, _) = entries(value).remove(0);
        assert_eq!(inner_key.location(), &Location::new(2, 3));
    }

    #[test]
    fn test_merge_key_detection() {
        let (key, _) = entries(parse("<<: {a: 1}\n")).remove(0);
        assert!(key.is_merge_key());
        let (key, _) = entries(parse("'<<': {a: 1}\n")).remove(0);
        assert!(!key.is_merge_key());
    }
}
