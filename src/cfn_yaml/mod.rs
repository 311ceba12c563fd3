// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

pub(crate) mod constructor;
pub mod dumper;
pub mod errors;
pub mod loader;
pub mod mappings;
pub(crate) mod parser;
pub(crate) mod representer;
pub(crate) mod scalar;
pub mod types;
pub(crate) mod writer;

use std::path::Path;

pub use dumper::{DumpOptions, Dumper};
pub use errors::{Error, Result};
pub use loader::Loader;
pub use mappings::{ShapeKind, TagDescriptor, TagRegistry, CLOUDFORMATION_TAGS};
pub use types::{Location, Mapping, Payload, TaggedValue, Template, Value};

/// Parse a CloudFormation YAML template, resolving `!IncludeFile` and `!ToString`.
///
/// Relative includes resolve against the directory of `origin`, or against the
/// working directory when no origin is given.
pub fn load(text: &str, origin: Option<&Path>) -> Result<Template> {
    let mut loader = Loader::new(&CLOUDFORMATION_TAGS);
    if let Some(origin) = origin {
        loader = loader.with_origin(origin);
    }
    loader.load(text)
}

/// Read and parse a template file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Template> {
    Loader::new(&CLOUDFORMATION_TAGS).load_file(path)
}

/// Serialize a template to YAML, intrinsic functions in short form.
pub fn dump(template: &Template, options: &DumpOptions) -> Result<String> {
    Dumper::new(&CLOUDFORMATION_TAGS)
        .with_options(*options)
        .dump(template)
}

/// Convert a template to JSON, intrinsic functions in long form (`Fn::GetAtt`, `Ref`)
pub fn to_json(template: &Template) -> serde_json::Value {
    types::mapping_to_json(template)
}

/// Parse CF YAML and convert to serde_json::Value
pub fn parse_yaml_to_json(yaml_str: &str) -> Result<serde_json::Value> {
    load(yaml_str, None).map(|template| to_json(&template))
}
