// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

use super::errors::{Error, Result};
use super::loader::Loader;
use super::mappings::{NodeKind, TagDescriptor};
use super::parser::Node;
use super::types::{Payload, TaggedValue};

/// Result of trying to read a node as one particular kind.
enum Extracted {
    Payload(Payload),
    Mismatch(Node),
}

/// Builds the tagged value for `descriptor` out of a raw node.
///
/// The node kinds allowed by the tag's shape are tried in order; a node that
/// fits none of them is a shape error. Scalar payloads are the source text,
/// whatever it would resolve to untagged.
pub(crate) fn construct(
    loader: &mut Loader<'_>,
    descriptor: &TagDescriptor,
    node: Node,
) -> Result<TaggedValue> {
    let mut node = node;
    for kind in descriptor.shape().attempts() {
        match extract(loader, *kind, node)? {
            Extracted::Payload(payload) => {
                tracing::trace!(tag = descriptor.tag(), path = %loader.node_path(), "Constructed tag");
                return Ok(TaggedValue::new(descriptor, payload));
            }
            Extracted::Mismatch(rejected) => node = rejected,
        }
    }
    Err(Error::TagShape {
        tag: descriptor.tag().to_string(),
        path: loader.node_path(),
        expected: descriptor.shape().to_string(),
        found: node.kind_name(),
    })
}

fn extract(loader: &mut Loader<'_>, kind: NodeKind, node: Node) -> Result<Extracted> {
    let payload = match (kind, node) {
        (NodeKind::Sequence, Node::Sequence { items, .. }) => {
            Payload::Sequence(loader.construct_sequence(items)?)
        }
        (NodeKind::Mapping, Node::Mapping { entries, .. }) => {
            Payload::Mapping(loader.construct_mapping(entries)?)
        }
        (NodeKind::Scalar, Node::Scalar { text, .. }) => Payload::Scalar(text),
        (_, node) => return Ok(Extracted::Mismatch(node)),
    };
    Ok(Extracted::Payload(payload))
}
