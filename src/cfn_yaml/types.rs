// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains types adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// Licensed under Apache-2.0

use std::fmt;

use super::mappings::TagDescriptor;

/// Ordered key/value mapping; templates keep their authored key order.
pub type Mapping = indexmap::IndexMap<String, Value>;

/// A fully resolved CloudFormation template. The root is always a mapping.
pub type Template = Mapping;

/// Location information for values in the parsed YAML
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub fn new(line: usize, col: usize) -> Self {
        Location { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// A node of a loaded document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers past `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    Tagged(Box<TaggedValue>),
}

/// Payload of a tagged value. Its shape matched the tag's `ShapeKind` when it was built.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

/// An intrinsic function written in short form, e.g. `!GetAtt Bucket.Arn`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedValue {
    name: String,
    tag: String,
    payload: Payload,
}

impl TaggedValue {
    pub fn new(descriptor: &TagDescriptor, payload: Payload) -> Self {
        TaggedValue {
            name: descriptor.name().to_string(),
            tag: descriptor.tag().to_string(),
            payload,
        }
    }

    /// Long-form name, e.g. `Fn::Sub`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short-form literal, e.g. `!Sub`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// JSON form `{ "<name>": <payload> }`.
    ///
    /// `Ref` with a dotted target and scalar `GetAtt` are both rewritten to the
    /// `Fn::GetAtt` list form. Only JSON conversion does this; the tree keeps the
    /// authored form so dumping reproduces it.
    pub fn to_json_value(&self) -> serde_json::Value {
        let (name, data) = match &self.payload {
            Payload::Scalar(s) if self.name == "Fn::GetAtt" => ("Fn::GetAtt", split_attribute(s)),
            Payload::Scalar(s) if self.name == "Ref" && s.contains('.') => {
                ("Fn::GetAtt", split_attribute(s))
            }
            Payload::Scalar(s) => (self.name.as_str(), serde_json::Value::String(s.clone())),
            Payload::Sequence(items) => (
                self.name.as_str(),
                serde_json::Value::Array(items.iter().map(Value::to_json_value).collect()),
            ),
            Payload::Mapping(map) => (self.name.as_str(), mapping_to_json(map)),
        };
        let mut obj = serde_json::Map::new();
        obj.insert(name.to_string(), data);
        serde_json::Value::Object(obj)
    }
}

/// `Resource.Attribute` becomes `["Resource", "Attribute"]`; every dot splits,
/// so `DB.Endpoint.Address` gives three parts.
fn split_attribute(s: &str) -> serde_json::Value {
    serde_json::Value::Array(
        s.split('.')
            .map(|part| serde_json::Value::String(part.to_string()))
            .collect(),
    )
}

pub(crate) fn mapping_to_json(map: &Mapping) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (key, value) in map.iter() {
        obj.insert(key.clone(), value.to_json_value());
    }
    serde_json::Value::Object(obj)
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Float(_)
            | Value::String(_) => "scalar",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Tagged(_) => "tagged value",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_tagged(&self) -> Option<&TaggedValue> {
        match self {
            Value::Tagged(tagged) => Some(tagged),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Convert Value to serde_json::Value, applying intrinsic function canonicalization
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::UInt(u) => serde_json::Value::Number((*u).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(list) => {
                serde_json::Value::Array(list.iter().map(|v| v.to_json_value()).collect())
            }
            Value::Mapping(map) => mapping_to_json(map),
            Value::Tagged(tagged) => tagged.to_json_value(),
        }
    }

    /// Builds a tree from decoded JSON, keeping object key order.
    pub fn from_json_value(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from_json_value).collect())
            }
            serde_json::Value::Object(obj) => Value::Mapping(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json_value(v)))
                    .collect(),
            ),
        }
    }

    /// Rewrites every tagged value into a plain one-key mapping `{ "!Tag": payload }`.
    ///
    /// The result holds no tags, so any JSON or YAML serializer can render it.
    pub fn to_display_form(&self) -> Value {
        match self {
            Value::Sequence(items) => {
                Value::Sequence(items.iter().map(Value::to_display_form).collect())
            }
            Value::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_display_form()))
                    .collect(),
            ),
            Value::Tagged(tagged) => {
                let payload = match tagged.payload() {
                    Payload::Scalar(s) => Value::String(s.clone()),
                    Payload::Sequence(items) => {
                        Value::Sequence(items.iter().map(Value::to_display_form).collect())
                    }
                    Payload::Mapping(map) => Value::Mapping(
                        map.iter()
                            .map(|(k, v)| (k.clone(), v.to_display_form()))
                            .collect(),
                    ),
                };
                let mut map = Mapping::new();
                map.insert(tagged.tag().to_string(), payload);
                Value::Mapping(map)
            }
            scalar => scalar.clone(),
        }
    }
}

impl From<TaggedValue> for Value {
    fn from(tagged: TaggedValue) -> Self {
        Value::Tagged(Box::new(tagged))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
