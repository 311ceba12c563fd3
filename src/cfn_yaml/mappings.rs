// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// CloudFormation intrinsic function tag mappings from AWS CloudFormation Guard

use indexmap::IndexMap;
use lazy_static::lazy_static;
use std::fmt;

use super::errors::{Error, Result};

/// Tag that replaces itself with the content of another file.
pub const INCLUDE_FILE_TAG: &str = "!IncludeFile";
/// Tag that replaces itself with a JSON or YAML string rendering of its argument.
pub const TO_STRING_TAG: &str = "!ToString";

const PROCESSING_TAGS: [&str; 2] = [INCLUDE_FILE_TAG, TO_STRING_TAG];

/// Structural category a tag's payload must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Scalar,
    Sequence,
    SequenceOrScalar,
    Mapping,
    MappingOrScalar,
}

/// Structural category of a raw YAML node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        }
    }
}

impl ShapeKind {
    /// Node kinds accepted by this shape, in the order they are tried.
    /// Collections always come before the scalar fallback.
    pub fn attempts(self) -> &'static [NodeKind] {
        match self {
            ShapeKind::Scalar => &[NodeKind::Scalar],
            ShapeKind::Sequence => &[NodeKind::Sequence],
            ShapeKind::SequenceOrScalar => &[NodeKind::Sequence, NodeKind::Scalar],
            ShapeKind::Mapping => &[NodeKind::Mapping],
            ShapeKind::MappingOrScalar => &[NodeKind::Mapping, NodeKind::Scalar],
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.attempts().iter().map(|k| k.name()).collect();
        f.write_str(&names.join(" or "))
    }
}

/// One supported tag: its long-form name, its short-form literal and its payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagDescriptor {
    name: String,
    tag: String,
    shape: ShapeKind,
}

impl TagDescriptor {
    pub fn new(name: impl Into<String>, tag: &str, shape: ShapeKind) -> Self {
        TagDescriptor {
            name: name.into(),
            tag: normalize_tag(tag),
            shape,
        }
    }

    /// Long-form key used in JSON, e.g. `Fn::GetAtt`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short-form literal including the leading `!`, e.g. `!GetAtt`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }
}

/// Prefixes `!` when the literal was given without it.
pub fn normalize_tag(tag: &str) -> String {
    format!("!{}", tag.trim_start_matches('!'))
}

/// Set of tags a loader constructs and a dumper represents, keyed by tag literal.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: IndexMap<String, TagDescriptor>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every CloudFormation intrinsic function plus `Ref` and `Condition`.
    pub fn cloudformation() -> Result<Self> {
        let mut registry = Self::new();
        for (name, tag, shape) in INTRINSIC_FUNCTIONS.iter().chain(REFERENCES.iter()) {
            registry.register(*name, tag, *shape)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, tag: &str, shape: ShapeKind) -> Result<()> {
        let descriptor = TagDescriptor::new(name, tag, shape);
        if self.tags.contains_key(descriptor.tag())
            || PROCESSING_TAGS.contains(&descriptor.tag())
        {
            return Err(Error::DuplicateTag(descriptor.tag));
        }
        self.tags.insert(descriptor.tag.clone(), descriptor);
        Ok(())
    }

    /// Looks a descriptor up by literal; the leading `!` is optional.
    pub fn lookup(&self, tag: &str) -> Option<&TagDescriptor> {
        if tag.starts_with('!') {
            self.tags.get(tag)
        } else {
            self.tags.get(&normalize_tag(tag))
        }
    }

    /// Looks a descriptor up by its long-form name, e.g. `Fn::Sub`.
    pub fn lookup_name(&self, name: &str) -> Option<&TagDescriptor> {
        self.tags.values().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDescriptor> {
        self.tags.values()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

const INTRINSIC_FUNCTIONS: [(&str, &str, ShapeKind); 16] = [
    ("Fn::And", "And", ShapeKind::Sequence),
    ("Fn::Base64", "Base64", ShapeKind::Scalar),
    ("Fn::Cidr", "Cidr", ShapeKind::Sequence),
    ("Fn::Equals", "Equals", ShapeKind::Sequence),
    ("Fn::FindInMap", "FindInMap", ShapeKind::Sequence),
    ("Fn::GetAtt", "GetAtt", ShapeKind::SequenceOrScalar),
    ("Fn::GetAZs", "GetAZs", ShapeKind::Scalar),
    ("Fn::If", "If", ShapeKind::Sequence),
    ("Fn::ImportValue", "ImportValue", ShapeKind::Scalar),
    ("Fn::Join", "Join", ShapeKind::Sequence),
    ("Fn::Not", "Not", ShapeKind::Sequence),
    ("Fn::Or", "Or", ShapeKind::Sequence),
    ("Fn::Select", "Select", ShapeKind::Sequence),
    ("Fn::Split", "Split", ShapeKind::Sequence),
    ("Fn::Sub", "Sub", ShapeKind::SequenceOrScalar),
    ("Fn::Transform", "Transform", ShapeKind::Mapping),
];

const REFERENCES: [(&str, &str, ShapeKind); 2] = [
    ("Ref", "Ref", ShapeKind::Scalar),
    ("Condition", "Condition", ShapeKind::Scalar),
];

lazy_static! {
    pub static ref CLOUDFORMATION_TAGS: TagRegistry =
        TagRegistry::cloudformation().expect("Duplicate CloudFormation intrinsic function tag");
}
