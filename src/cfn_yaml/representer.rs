// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

use super::errors::{Error, Result};
use super::mappings::TagRegistry;
use super::scalar::{format_float, is_ambiguous};
use super::types::{Mapping, Payload, TaggedValue, Value};
use super::writer::{ScalarStyle, Writer};

/// Turns values into emitter events, writing tagged values back in short form.
pub(crate) struct Representer<'r> {
    registry: &'r TagRegistry,
    sort_keys: bool,
}

impl<'r> Representer<'r> {
    pub(crate) fn new(registry: &'r TagRegistry, sort_keys: bool) -> Self {
        Representer {
            registry,
            sort_keys,
        }
    }

    pub(crate) fn represent(&self, value: &Value, out: &mut Writer) -> Result<()> {
        match value {
            Value::Null => out.scalar(None, "null", ScalarStyle::Plain),
            Value::Bool(b) => out.scalar(None, if *b { "true" } else { "false" }, ScalarStyle::Plain),
            Value::Int(i) => out.scalar(None, &i.to_string(), ScalarStyle::Plain),
            Value::UInt(u) => out.scalar(None, &u.to_string(), ScalarStyle::Plain),
            Value::Float(f) => out.scalar(None, &format_float(*f), ScalarStyle::Plain),
            Value::String(s) => out.scalar(None, s, string_style(s)),
            Value::Sequence(items) => self.represent_sequence(items, None, out),
            Value::Mapping(map) => self.represent_mapping(map, None, out),
            Value::Tagged(tagged) => self.represent_tagged(tagged, out),
        }
    }

    pub(crate) fn represent_mapping(
        &self,
        map: &Mapping,
        tag: Option<&str>,
        out: &mut Writer,
    ) -> Result<()> {
        let mut pairs: Vec<(&String, &Value)> = map.iter().collect();
        if self.sort_keys {
            pairs.sort_by(|a, b| a.0.cmp(b.0));
        }
        out.begin_mapping(tag)?;
        for (key, value) in pairs {
            out.scalar(None, key, string_style(key))?;
            self.represent(value, out)?;
        }
        out.end_mapping()
    }

    fn represent_sequence(&self, items: &[Value], tag: Option<&str>, out: &mut Writer) -> Result<()> {
        out.begin_sequence(tag)?;
        for item in items {
            self.represent(item, out)?;
        }
        out.end_sequence()
    }

    /// Scalar payloads are the text the tag was written with, so they are
    /// requested plain; libyaml quotes them only where plain text cannot be read back.
    pub(crate) fn represent_tagged(&self, tagged: &TaggedValue, out: &mut Writer) -> Result<()> {
        if self.registry.lookup(tagged.tag()).is_none() {
            return Err(Error::UnknownTag {
                tag: tagged.tag().to_string(),
                path: "<dump>".to_string(),
            });
        }
        let tag = Some(tagged.tag());
        match tagged.payload() {
            Payload::Sequence(items) => self.represent_sequence(items, tag, out),
            Payload::Mapping(map) => self.represent_mapping(map, tag, out),
            Payload::Scalar(s) if s.is_empty() => out.scalar(tag, s, ScalarStyle::SingleQuoted),
            Payload::Scalar(s) if s.contains('\n') => out.scalar(tag, s, ScalarStyle::Literal),
            Payload::Scalar(s) => out.scalar(tag, s, ScalarStyle::Plain),
        }
    }
}

/// Untagged strings that would read back as another type are single quoted.
fn string_style(s: &str) -> ScalarStyle {
    if s.contains('\n') {
        ScalarStyle::Literal
    } else if is_ambiguous(s) {
        ScalarStyle::SingleQuoted
    } else {
        ScalarStyle::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfn_yaml::dumper::DumpOptions;
    use crate::cfn_yaml::mappings::{ShapeKind, CLOUDFORMATION_TAGS};

    fn tagged(tag: &str, payload: Payload) -> TaggedValue {
        TaggedValue::new(CLOUDFORMATION_TAGS.lookup(tag).unwrap(), payload)
    }

    fn render(representer: &Representer<'_>, value: &Value) -> Result<String> {
        let mut out = Writer::new(&DumpOptions::default())?;
        representer.represent(value, &mut out)?;
        out.finish()
    }

    #[test]
    fn test_tagged_scalar_styles() {
        let representer = Representer::new(&CLOUDFORMATION_TAGS, false);
        let value = Value::from(tagged("!Ref", Payload::Scalar("AWS::Region".into())));
        assert_eq!(render(&representer, &value).unwrap(), "!Ref AWS::Region\n");

        let value = Value::from(tagged("!Ref", Payload::Scalar("True".into())));
        assert_eq!(render(&representer, &value).unwrap(), "!Ref True\n");

        let value = Value::from(tagged("!GetAZs", Payload::Scalar(String::new())));
        assert_eq!(render(&representer, &value).unwrap(), "!GetAZs ''\n");
    }

    #[test]
    fn test_ambiguous_strings_are_quoted() {
        let representer = Representer::new(&CLOUDFORMATION_TAGS, false);
        let mut map = Mapping::new();
        map.insert("Port".into(), "80".into());
        map.insert("Flag".into(), "yes".into());
        map.insert("Empty".into(), "".into());
        map.insert("Name".into(), "web".into());
        assert_eq!(
            render(&representer, &Value::Mapping(map)).unwrap(),
            "Port: '80'\nFlag: 'yes'\nEmpty: ''\nName: web\n"
        );
    }

    #[test]
    fn test_sort_keys() {
        let mut map = Mapping::new();
        map.insert("b".into(), Value::Int(1));
        map.insert("a".into(), Value::Int(2));
        let representer = Representer::new(&CLOUDFORMATION_TAGS, true);
        assert_eq!(
            render(&representer, &Value::Mapping(map)).unwrap(),
            "a: 2\nb: 1\n"
        );
    }

    #[test]
    fn test_unregistered_tag_is_rejected() {
        let mut registry = TagRegistry::new();
        registry.register("Ref", "Ref", ShapeKind::Scalar).unwrap();
        let value = Value::from(tagged("!Sub", Payload::Scalar("x".into())));
        let err = render(&Representer::new(&registry, false), &value).unwrap_err();
        assert!(matches!(err, Error::UnknownTag { .. }));
    }
}
