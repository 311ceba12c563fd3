// Copyright 2020-2022 Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//
// This module contains code adapted from AWS CloudFormation Guard
// https://github.com/aws-cloudformation/cloudformation-guard
// See readme.md for attribution details

use super::errors::Result;
use super::mappings::TagRegistry;
use super::representer::Representer;
use super::types::{Template, Value};
use super::writer::Writer;

/// Formatting of dumped YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// Sort mapping keys instead of keeping insertion order.
    pub sort_keys: bool,
    /// Write everything in flow style (`{a: [1, 2]}`).
    pub flow_style: bool,
    /// Write non-ASCII characters as is rather than as escapes in double quotes.
    pub allow_unicode: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions {
            sort_keys: false,
            flow_style: false,
            allow_unicode: true,
        }
    }
}

impl DumpOptions {
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    pub fn with_flow_style(mut self, flow_style: bool) -> Self {
        self.flow_style = flow_style;
        self
    }

    pub fn with_allow_unicode(mut self, allow_unicode: bool) -> Self {
        self.allow_unicode = allow_unicode;
        self
    }
}

/// Serializes documents back to YAML, writing intrinsic functions in short form.
pub struct Dumper<'r> {
    registry: &'r TagRegistry,
    options: DumpOptions,
}

impl<'r> Dumper<'r> {
    pub fn new(registry: &'r TagRegistry) -> Self {
        Dumper {
            registry,
            options: DumpOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DumpOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DumpOptions {
        &self.options
    }

    pub fn dump(&self, template: &Template) -> Result<String> {
        tracing::debug!(keys = template.len(), "Dumping template");
        let mut out = Writer::new(&self.options)?;
        self.representer().represent_mapping(template, None, &mut out)?;
        out.finish()
    }

    /// Dumps a value of any kind as a standalone document.
    pub fn dump_value(&self, value: &Value) -> Result<String> {
        let mut out = Writer::new(&self.options)?;
        self.representer().represent(value, &mut out)?;
        out.finish()
    }

    fn representer(&self) -> Representer<'r> {
        Representer::new(self.registry, self.options.sort_keys)
    }
}
