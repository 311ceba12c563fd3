// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::constructor;
use super::errors::{Error, Result};
use super::mappings::{normalize_tag, TagRegistry, INCLUDE_FILE_TAG, TO_STRING_TAG};
use super::parser::{self, Node, CORE_SCHEMA};
use super::scalar;
use super::types::{Mapping, Template, Value};
use crate::processing::{include, stringify};

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Builds a resolved document tree out of YAML text.
///
/// Intrinsic function tags become [`Value::Tagged`] nodes. `!IncludeFile` and
/// `!ToString` are evaluated while loading and replaced by their result.
/// Construction is depth first: a nested include is fully loaded before the
/// node that requested it is finished.
pub struct Loader<'r> {
    registry: &'r TagRegistry,
    origin: Option<PathBuf>,
    ancestors: Vec<PathBuf>,
    path: Vec<Segment>,
}

impl<'r> Loader<'r> {
    pub fn new(registry: &'r TagRegistry) -> Self {
        Loader {
            registry,
            origin: None,
            ancestors: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Path of the document being loaded; relative includes resolve against its directory.
    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn registry(&self) -> &'r TagRegistry {
        self.registry
    }

    /// Loads a template. The root must be a mapping; an empty document is an empty template.
    pub fn load(&mut self, text: &str) -> Result<Template> {
        match self.load_value(text)? {
            Value::Mapping(map) => Ok(map),
            Value::Null => Ok(Mapping::new()),
            other => Err(Error::InvalidRoot {
                found: other.kind_name(),
            }),
        }
    }

    /// Reads and loads a template file, using its path as origin.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Template> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        self.origin = Some(path.to_path_buf());
        self.load(&text)
    }

    /// Loads a document with any root node.
    ///
    /// The origin counts as an include ancestor only while this call runs, so
    /// one loader can load several files in turn.
    pub fn load_value(&mut self, text: &str) -> Result<Value> {
        tracing::debug!(origin = ?self.origin, "Loading document");
        let entered = self.enter_origin();
        let result = parser::parse_document(text).and_then(|root| match root {
            Some(node) => self.construct(node),
            None => Ok(Value::Null),
        });
        if entered {
            self.ancestors.pop();
        }
        result
    }

    fn enter_origin(&mut self) -> bool {
        let Some(origin) = &self.origin else {
            return false;
        };
        match fs::canonicalize(origin) {
            Ok(canonical) if !self.ancestors.contains(&canonical) => {
                self.ancestors.push(canonical);
                true
            }
            _ => false,
        }
    }

    /// Loader for an included document, remembering every document above it.
    pub(crate) fn nested(&self, origin: PathBuf, canonical: PathBuf) -> Loader<'r> {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(canonical);
        Loader {
            registry: self.registry,
            origin: Some(origin),
            ancestors,
            path: Vec::new(),
        }
    }

    /// Canonical paths of the documents currently being loaded, outermost first.
    pub(crate) fn ancestors(&self) -> &[PathBuf] {
        &self.ancestors
    }

    /// Dotted path of the node under construction, e.g. `Resources.Bucket.Tags[0]`.
    pub(crate) fn node_path(&self) -> String {
        if self.path.is_empty() {
            return "<root>".to_string();
        }
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                Segment::Key(key) if out.is_empty() => out.push_str(key),
                Segment::Key(key) => {
                    out.push('.');
                    out.push_str(key);
                }
                Segment::Index(index) => {
                    let _ = write!(out, "[{}]", index);
                }
            }
        }
        out
    }

    pub(crate) fn construct(&mut self, node: Node) -> Result<Value> {
        let Some(tag) = node.tag().map(str::to_string) else {
            return Ok(match node {
                Node::Scalar {
                    text, plain: true, ..
                } => scalar::resolve_plain(&text),
                Node::Scalar { text, .. } => Value::String(text),
                Node::Sequence { items, .. } => Value::Sequence(self.construct_sequence(items)?),
                Node::Mapping { entries, .. } => Value::Mapping(self.construct_mapping(entries)?),
            });
        };
        match tag.strip_prefix(CORE_SCHEMA) {
            Some(name) => self.construct_core(name, node),
            None => self.construct_tagged(normalize_tag(&tag), node),
        }
    }

    pub(crate) fn construct_sequence(&mut self, items: Vec<Node>) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            self.path.push(Segment::Index(index));
            let value = self.construct(item);
            self.path.pop();
            out.push(value?);
        }
        Ok(out)
    }

    /// Builds a mapping, applying `<<` merge keys.
    ///
    /// Merged keys come first, in the order of their sources; an earlier source
    /// wins over a later one and explicit keys win over all of them.
    pub(crate) fn construct_mapping(&mut self, entries: Vec<(Node, Node)>) -> Result<Mapping> {
        let mut explicit = Mapping::with_capacity(entries.len());
        let mut merged = Mapping::new();
        for (key, value) in entries {
            if key.is_merge_key() {
                self.path.push(Segment::Key("<<".to_string()));
                let sources = self.merge_sources(value);
                self.path.pop();
                for source in sources? {
                    for (k, v) in source {
                        merged.entry(k).or_insert(v);
                    }
                }
                continue;
            }
            let key = self.mapping_key(key)?;
            self.path.push(Segment::Key(key.clone()));
            let value = self.construct(value);
            self.path.pop();
            explicit.insert(key, value?);
        }
        if merged.is_empty() {
            return Ok(explicit);
        }
        merged.extend(explicit);
        Ok(merged)
    }

    fn merge_sources(&mut self, node: Node) -> Result<Vec<Mapping>> {
        match self.construct(node)? {
            Value::Mapping(map) => Ok(vec![map]),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Mapping(map) => Ok(map),
                    other => Err(Error::InvalidMerge {
                        path: self.node_path(),
                        found: other.kind_name(),
                    }),
                })
                .collect(),
            other => Err(Error::InvalidMerge {
                path: self.node_path(),
                found: other.kind_name(),
            }),
        }
    }

    /// Keys are kept as written, so `80:` and `true:` become the strings `80` and `true`.
    fn mapping_key(&self, key: Node) -> Result<String> {
        match key {
            Node::Scalar {
                tag: None, text, ..
            } => Ok(text),
            Node::Scalar {
                tag: Some(tag),
                text,
                ..
            } if tag.starts_with(CORE_SCHEMA) => Ok(text),
            Node::Scalar { .. } => Err(Error::InvalidKey {
                path: self.node_path(),
                found: "tagged value",
            }),
            other => Err(Error::InvalidKey {
                path: self.node_path(),
                found: other.kind_name(),
            }),
        }
    }

    /// `!!str`, `!!int` and the other core schema tags.
    fn construct_core(&mut self, name: &str, node: Node) -> Result<Value> {
        match (name, node) {
            (_, Node::Scalar { text, .. }) => self.construct_core_scalar(name, text),
            ("seq", node @ Node::Sequence { .. }) | ("map", node @ Node::Mapping { .. }) => {
                self.construct(node.untagged())
            }
            _ => Err(Error::UnknownTag {
                tag: format!("!!{name}"),
                path: self.node_path(),
            }),
        }
    }

    fn construct_core_scalar(&self, name: &str, text: String) -> Result<Value> {
        let value = match name {
            "str" => Some(Value::String(text.clone())),
            "null" => scalar::is_null(&text).then_some(Value::Null),
            "bool" => scalar::parse_bool(&text).map(Value::Bool),
            "int" => scalar::parse_int(&text),
            "float" => scalar::parse_float(&text).map(Value::Float),
            _ => {
                return Err(Error::UnknownTag {
                    tag: format!("!!{name}"),
                    path: self.node_path(),
                })
            }
        };
        value.ok_or_else(|| Error::InvalidScalar {
            tag: format!("!!{name}"),
            path: self.node_path(),
            text,
        })
    }

    fn construct_tagged(&mut self, tag: String, node: Node) -> Result<Value> {
        match tag.as_str() {
            INCLUDE_FILE_TAG => include::resolve_include(self, node),
            TO_STRING_TAG => stringify::construct_to_string(self, node),
            _ => {
                let registry = self.registry;
                let descriptor = registry.lookup(&tag).ok_or_else(|| Error::UnknownTag {
                    tag: tag.clone(),
                    path: self.node_path(),
                })?;
                constructor::construct(self, descriptor, node).map(Value::from)
            }
        }
    }
}
